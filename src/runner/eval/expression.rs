//! Expression evaluation.
//!
//! Every expression evaluates straight to a [`JsValue`]. Member and call chains go
//! through [`evaluate_chain_element`], which also yields the `this` value a call
//! should receive and reports an optional-chain short circuit as `None`.
//!
//! Expressions that evaluate more than one child keep the operands they already
//! have in a [`Frame`] when an `await` suspends, so a resumed body never
//! evaluates a child twice.

use crate::parser::ast::{
    AssignmentOperator, BinaryOperator, ExpressionOrSpreadElement, ExpressionType, LiteralData,
    LiteralType, LogicalOperator, MemberExpressionType, NumberLiteralType, PatternOrExpression,
    PropertyData, PropertyKey, TemplateLiteralData, UnaryOperator, UpdateOperator,
};
use crate::runner::ds::error::JErrorType;
use crate::runner::ds::object::{has_property, inherits_from, JsObjectType, ObjectKind};
use crate::runner::ds::operations::object::{
    delete_value_property, get_object_property, get_value_property, iterate_to_vec, set_value_property,
};
use crate::runner::ds::operations::test_and_comparison::{compare_values, is_loosely_equal, is_strictly_equal};
use crate::runner::ds::operations::type_conversion::{
    get_type, to_boolean, to_int32, to_number, to_primitive, to_property_key, to_string, to_uint32,
};
use crate::runner::ds::value::JsValue;
use crate::runner::plugin::types::EvalContext;

use super::function::{call_function, construct, instantiate_function_expression, instantiate_function_object};
use super::pattern::{bind_pattern, BindingInit};
use super::promise::await_value;
use super::suspend::{Frame, OnSuspend};
use super::types::ValueResult;

/// Evaluate an expression and return its value.
pub fn evaluate_expression(expr: &ExpressionType, ctx: &mut EvalContext) -> ValueResult {
    match expr {
        ExpressionType::Literal(lit) => Ok(evaluate_literal(lit)),

        ExpressionType::Identifier(id) => ctx.resolve_identifier(&id.name),

        ExpressionType::ThisExpression { .. } => Ok(ctx.this_value()),

        ExpressionType::ArrayExpression { elements, .. } => {
            let (start, mut values) = match ctx.suspension.resume_frame(expr) {
                Some(frame) => (frame.index, frame.values),
                None => (0, vec![]),
            };
            for (i, element) in elements.iter().enumerate().skip(start) {
                let (e, spread) = match element {
                    None => {
                        values.push(JsValue::Undefined);
                        continue;
                    }
                    Some(ExpressionOrSpreadElement::Expression(e)) => (e, false),
                    Some(ExpressionOrSpreadElement::SpreadElement(e)) => (e, true),
                };
                let v = evaluate_expression(e, ctx)
                    .on_suspend(ctx, |_| Frame::at(expr, 0).with_index(i).with_values(values.clone()))?;
                if spread {
                    values.extend(iterate_to_vec(&v, None)?);
                } else {
                    values.push(v);
                }
            }
            Ok(ctx.new_array(values))
        }

        ExpressionType::ObjectExpression { properties, .. } => evaluate_object_expression(expr, properties, ctx),

        ExpressionType::FunctionExpression(data) => Ok(instantiate_function_expression(data, "", ctx)),

        ExpressionType::ArrowFunctionExpression(data) => {
            let env = ctx.lex_env();
            Ok(instantiate_function_object(data, env, "", ctx))
        }

        ExpressionType::UnaryExpression { operator, argument, .. } => {
            evaluate_unary_expression(*operator, argument, ctx)
        }

        ExpressionType::AwaitExpression { argument, .. } => {
            if !ctx.is_in_async_function() {
                return Err(JErrorType::SyntaxError(
                    "await is only valid in async functions and the top level bodies of modules".to_string(),
                ));
            }
            // The `await` a resumed body stopped at gets the settled outcome.
            if ctx.suspension.resume_frame(expr).is_none() {
                if let Some(outcome) = ctx.suspension.take_outcome() {
                    return outcome.map_err(JErrorType::Thrown);
                }
            }
            let value = evaluate_expression(argument, ctx).on_suspend(ctx, |_| Frame::at(expr, 0))?;
            await_value(ctx, value)
        }

        ExpressionType::UpdateExpression {
            operator,
            argument,
            prefix,
            ..
        } => evaluate_update_expression(*operator, argument, *prefix, ctx),

        ExpressionType::BinaryExpression {
            operator, left, right, ..
        } => {
            let l = match ctx.suspension.resume_frame(expr) {
                Some(frame) if frame.step == 1 => frame.value_at(0),
                _ => evaluate_expression(left, ctx).on_suspend(ctx, |_| Frame::at(expr, 0))?,
            };
            let r = evaluate_expression(right, ctx).on_suspend(ctx, |_| Frame::at(expr, 1).with_values(vec![l.clone()]))?;
            apply_binary_operator(ctx, *operator, &l, &r)
        }

        ExpressionType::AssignmentExpression {
            operator, left, right, ..
        } => evaluate_assignment_expression(expr, *operator, left, right, ctx),

        ExpressionType::LogicalExpression {
            operator, left, right, ..
        } => {
            if !matches!(ctx.suspension.resume_frame(expr), Some(frame) if frame.step == 1) {
                let l = evaluate_expression(left, ctx).on_suspend(ctx, |_| Frame::at(expr, 0))?;
                let short_circuit = match operator {
                    LogicalOperator::And => !to_boolean(&l),
                    LogicalOperator::Or => to_boolean(&l),
                    LogicalOperator::NullishCoalescing => !l.is_nullish(),
                };
                if short_circuit {
                    return Ok(l);
                }
            }
            evaluate_expression(right, ctx).on_suspend(ctx, |_| Frame::at(expr, 1))
        }

        ExpressionType::ConditionalExpression {
            test,
            consequent,
            alternate,
            ..
        } => {
            let mut branch = ctx.suspension.resume_frame(expr).map_or(0, |f| f.step);
            if branch == 0 {
                let t = evaluate_expression(test, ctx).on_suspend(ctx, |_| Frame::at(expr, 0))?;
                branch = if to_boolean(&t) { 1 } else { 2 };
            }
            let chosen = if branch == 1 { consequent } else { alternate };
            evaluate_expression(chosen, ctx).on_suspend(ctx, |_| Frame::at(expr, branch))
        }

        ExpressionType::CallExpression { .. } | ExpressionType::MemberExpression(_) => {
            Ok(evaluate_chain_element(expr, ctx)?.map_or(JsValue::Undefined, |(v, _)| v))
        }

        ExpressionType::ChainExpression { expression, .. } => {
            Ok(evaluate_chain_element(expression, ctx)?.map_or(JsValue::Undefined, |(v, _)| v))
        }

        ExpressionType::NewExpression { callee, arguments, .. } => {
            let f = match ctx.suspension.resume_frame(expr) {
                Some(frame) if frame.step == 1 => frame.value_at(0),
                _ => evaluate_expression(callee, ctx).on_suspend(ctx, |_| Frame::at(expr, 0))?,
            };
            let args =
                evaluate_arguments(arguments, ctx).on_suspend(ctx, |_| Frame::at(expr, 1).with_values(vec![f.clone()]))?;
            construct(ctx, &f, args, &callee_label(callee))
        }

        ExpressionType::SequenceExpression { expressions, .. } => {
            let start = ctx.suspension.resume_frame(expr).map_or(0, |f| f.index);
            let mut value = JsValue::Undefined;
            for (i, e) in expressions.iter().enumerate().skip(start) {
                value = evaluate_expression(e, ctx).on_suspend(ctx, |_| Frame::at(expr, 0).with_index(i))?;
            }
            Ok(value)
        }

        ExpressionType::TemplateLiteral(data) => evaluate_template_literal(data, ctx),
    }
}

/// Evaluates `expr`, naming it `name` if it is an anonymous function (`const f = () => {}`).
pub fn evaluate_named_expression(expr: &ExpressionType, name: &str, ctx: &mut EvalContext) -> ValueResult {
    match expr {
        ExpressionType::FunctionExpression(data) if data.id.is_none() => {
            Ok(instantiate_function_expression(data, name, ctx))
        }
        ExpressionType::ArrowFunctionExpression(data) => {
            let env = ctx.lex_env();
            Ok(instantiate_function_object(data, env, name, ctx))
        }
        _ => evaluate_expression(expr, ctx),
    }
}

fn evaluate_literal(lit: &LiteralData) -> JsValue {
    match &lit.value {
        LiteralType::NullLiteral => JsValue::Null,
        LiteralType::BooleanLiteral(b) => JsValue::Boolean(*b),
        LiteralType::StringLiteral(s) => JsValue::String(s.to_string()),
        LiteralType::NumberLiteral(NumberLiteralType::IntegerLiteral(i)) => JsValue::from_i64(*i),
        LiteralType::NumberLiteral(NumberLiteralType::FloatLiteral(f)) => JsValue::from_f64(*f),
    }
}

fn evaluate_template_literal(data: &TemplateLiteralData, ctx: &mut EvalContext) -> ValueResult {
    // A frame holds the text up to and including the quasi before expression `index`.
    let (start, mut result, mut resumed) = match ctx.suspension.resume_frame(data) {
        Some(frame) => (frame.index, to_string(&frame.value_at(0)), true),
        None => (0, String::new(), false),
    };
    for (i, quasi) in data.quasis.iter().enumerate().skip(start) {
        if !resumed {
            result.push_str(&quasi.cooked_value);
        }
        resumed = false;
        if let Some(e) = data.expressions.get(i) {
            let v = evaluate_expression(e, ctx).on_suspend(ctx, |_| {
                Frame::at(data, 0).with_index(i).with_values(vec![JsValue::String(result.clone())])
            })?;
            result.push_str(&to_string(&v));
        }
    }
    Ok(JsValue::String(result))
}

fn evaluate_property_key(key: &PropertyKey, ctx: &mut EvalContext) -> Result<String, JErrorType> {
    match key {
        PropertyKey::Static(s) => Ok(s.to_string()),
        PropertyKey::Computed(e) => {
            let k = evaluate_expression(e, ctx)?;
            Ok(to_property_key(&k))
        }
    }
}

fn evaluate_object_expression(expr: &ExpressionType, properties: &[PropertyData], ctx: &mut EvalContext) -> ValueResult {
    // Frames keep the object under construction and, once computed, the key of property `index`.
    let (start, object, mut computed_key) = match ctx.suspension.resume_frame(expr) {
        Some(frame) => {
            let object = match frame.value_at(0) {
                JsValue::Object(o) => o,
                _ => ctx.new_object(),
            };
            (frame.index, object, frame.keys.into_iter().next())
        }
        None => (0, ctx.new_object(), None),
    };
    let at = |i: usize, key: Option<&String>| {
        Frame::at(expr, 0)
            .with_index(i)
            .with_values(vec![JsValue::Object(object.clone())])
            .with_keys(key.cloned().into_iter().collect())
    };
    for (i, property) in properties.iter().enumerate().skip(start) {
        match property {
            PropertyData::Property { key, value, .. } => {
                let key = match computed_key.take() {
                    Some(key) => key,
                    None => evaluate_property_key(key, ctx).on_suspend(ctx, |_| at(i, None))?,
                };
                let v = evaluate_named_expression(value, &key, ctx).on_suspend(ctx, |_| at(i, Some(&key)))?;
                object.borrow_mut().set_own_property(&key, v);
            }
            PropertyData::Method { key, value, .. } => {
                let key = evaluate_property_key(key, ctx).on_suspend(ctx, |_| at(i, None))?;
                let env = ctx.lex_env();
                let f = instantiate_function_object(value, env, &key, ctx);
                object.borrow_mut().set_own_property(&key, f);
            }
            PropertyData::Spread { argument, .. } => {
                let source = evaluate_expression(argument, ctx).on_suspend(ctx, |_| at(i, None))?;
                copy_data_properties(ctx, &source, &object)?;
            }
            PropertyData::CoverInitializedName { .. } => {
                return Err(JErrorType::SyntaxError(
                    "Invalid shorthand property initializer".to_string(),
                ))
            }
        }
    }
    Ok(JsValue::Object(object))
}

/// `{...source}`: copies own enumerable properties. Nullish sources copy nothing.
fn copy_data_properties(
    ctx: &mut EvalContext,
    source: &JsValue,
    target: &JsObjectType,
) -> Result<(), JErrorType> {
    match source {
        JsValue::Object(o) => {
            let keys = o.borrow().own_enumerable_keys();
            for key in keys {
                let v = get_value_property(ctx, source, &key)?;
                target.borrow_mut().set_own_property(&key, v);
            }
        }
        JsValue::String(s) => {
            for (i, c) in s.chars().enumerate() {
                target
                    .borrow_mut()
                    .set_own_property(&i.to_string(), JsValue::String(c.to_string()));
            }
        }
        _ => {}
    }
    Ok(())
}

/// Evaluates call arguments, expanding spread elements.
pub fn evaluate_arguments(
    arguments: &[ExpressionOrSpreadElement],
    ctx: &mut EvalContext,
) -> Result<Vec<JsValue>, JErrorType> {
    let (start, mut args) = match ctx.suspension.resume_frame(arguments) {
        Some(frame) => (frame.index, frame.values),
        None => (0, vec![]),
    };
    for (i, a) in arguments.iter().enumerate().skip(start) {
        let (e, spread) = match a {
            ExpressionOrSpreadElement::Expression(e) => (e, false),
            ExpressionOrSpreadElement::SpreadElement(e) => (e, true),
        };
        let v = evaluate_expression(e, ctx)
            .on_suspend(ctx, |_| Frame::at(arguments, 0).with_index(i).with_values(args.clone()))?;
        if spread {
            args.extend(iterate_to_vec(&v, None)?);
        } else {
            args.push(v);
        }
    }
    Ok(args)
}

/// Evaluates a link of a member/call chain to `(value, this)`.
///
/// Returns `Ok(None)` when an optional link (`a?.b`, `f?.()`) met a nullish base,
/// which short-circuits the rest of the chain.
pub fn evaluate_chain_element(
    expr: &ExpressionType,
    ctx: &mut EvalContext,
) -> Result<Option<(JsValue, JsValue)>, JErrorType> {
    match expr {
        ExpressionType::MemberExpression(m) => {
            let (object, optional) = match m {
                MemberExpressionType::SimpleMemberExpression { object, optional, .. } => (object, *optional),
                MemberExpressionType::ComputedMemberExpression { object, optional, .. } => (object, *optional),
            };
            let base = match ctx.suspension.resume_frame(expr) {
                Some(frame) if frame.step == 1 => frame.value_at(0),
                _ => match evaluate_chain_element(object, ctx).on_suspend(ctx, |_| Frame::at(expr, 0))? {
                    Some((v, _)) => v,
                    None => return Ok(None),
                },
            };
            if optional && base.is_nullish() {
                return Ok(None);
            }
            let key = member_key(m, ctx).on_suspend(ctx, |_| Frame::at(expr, 1).with_values(vec![base.clone()]))?;
            let value = get_value_property(ctx, &base, &key)?;
            Ok(Some((value, base)))
        }
        ExpressionType::CallExpression {
            callee,
            arguments,
            optional,
            ..
        } => {
            let (f, this) = match ctx.suspension.resume_frame(expr) {
                Some(frame) if frame.step == 1 => (frame.value_at(0), frame.value_at(1)),
                _ => match evaluate_chain_element(callee, ctx).on_suspend(ctx, |_| Frame::at(expr, 0))? {
                    Some(pair) => pair,
                    None => return Ok(None),
                },
            };
            if *optional && f.is_nullish() {
                return Ok(None);
            }
            let args = evaluate_arguments(arguments, ctx)
                .on_suspend(ctx, |_| Frame::at(expr, 1).with_values(vec![f.clone(), this.clone()]))?;
            if !f.is_callable() {
                return Err(JErrorType::TypeError(format!(
                    "{} is not a function",
                    callee_label(callee)
                )));
            }
            let value = call_function(ctx, &f, this, args)?;
            Ok(Some((value, JsValue::Undefined)))
        }
        _ => Ok(Some((evaluate_expression(expr, ctx)?, JsValue::Undefined))),
    }
}

fn member_key(m: &MemberExpressionType, ctx: &mut EvalContext) -> Result<String, JErrorType> {
    match m {
        MemberExpressionType::SimpleMemberExpression { property, .. } => Ok(property.name.to_string()),
        MemberExpressionType::ComputedMemberExpression { property, .. } => {
            let k = evaluate_expression(property, ctx)?;
            Ok(to_property_key(&k))
        }
    }
}

/// Base value and property key of an assignment target such as `a.b` or `a[i]`.
pub fn evaluate_member_target(
    m: &MemberExpressionType,
    ctx: &mut EvalContext,
) -> Result<(JsValue, String), JErrorType> {
    let object = match m {
        MemberExpressionType::SimpleMemberExpression { object, .. } => object,
        MemberExpressionType::ComputedMemberExpression { object, .. } => object,
    };
    let base = match ctx.suspension.resume_frame(m) {
        Some(frame) if frame.step == 1 => frame.value_at(0),
        _ => evaluate_expression(object, ctx).on_suspend(ctx, |_| Frame::at(m, 0))?,
    };
    let key = member_key(m, ctx).on_suspend(ctx, |_| Frame::at(m, 1).with_values(vec![base.clone()]))?;
    Ok((base, key))
}

/// How a callee is named in "is not a function" messages: `obj.method`, `list[0]`, `f(...)`.
pub fn callee_label(expr: &ExpressionType) -> String {
    match expr {
        ExpressionType::Identifier(id) => id.name.to_string(),
        ExpressionType::ThisExpression { .. } => "this".to_string(),
        ExpressionType::MemberExpression(MemberExpressionType::SimpleMemberExpression {
            object, property, ..
        }) => format!("{}.{}", callee_label(object), property.name),
        ExpressionType::MemberExpression(MemberExpressionType::ComputedMemberExpression {
            object,
            property,
            ..
        }) => {
            let object = callee_label(object);
            match property.as_ref() {
                ExpressionType::Literal(LiteralData {
                    value: LiteralType::StringLiteral(s),
                    ..
                }) => format!("{}.{}", object, s),
                ExpressionType::Literal(lit) => format!("{}[{}]", object, to_string(&evaluate_literal(lit))),
                ExpressionType::Identifier(id) => format!("{}[{}]", object, id.name),
                _ => "(intermediate value)".to_string(),
            }
        }
        ExpressionType::CallExpression { callee, .. } => format!("{}(...)", callee_label(callee)),
        ExpressionType::ChainExpression { expression, .. } => callee_label(expression),
        _ => "(intermediate value)".to_string(),
    }
}

fn evaluate_unary_expression(
    operator: UnaryOperator,
    argument: &ExpressionType,
    ctx: &mut EvalContext,
) -> ValueResult {
    match operator {
        UnaryOperator::TypeOf => {
            let v = match argument {
                ExpressionType::Identifier(id) => ctx.lookup_identifier(&id.name)?.unwrap_or(JsValue::Undefined),
                _ => evaluate_expression(argument, ctx)?,
            };
            Ok(JsValue::String(get_type(&v).to_string()))
        }
        UnaryOperator::Delete => match argument {
            ExpressionType::MemberExpression(m) => {
                let (base, key) = evaluate_member_target(m, ctx)?;
                Ok(JsValue::Boolean(delete_value_property(&base, &key)?))
            }
            ExpressionType::Identifier(id) => {
                let deleted = ctx.global_object.borrow_mut().delete_own_property(&id.name);
                Ok(JsValue::Boolean(deleted))
            }
            _ => {
                evaluate_expression(argument, ctx)?;
                Ok(JsValue::Boolean(true))
            }
        },
        _ => {
            let v = evaluate_expression(argument, ctx)?;
            Ok(match operator {
                UnaryOperator::Minus => JsValue::from_f64(-to_number(&v)),
                UnaryOperator::Plus => JsValue::from_f64(to_number(&v)),
                UnaryOperator::LogicalNot => JsValue::Boolean(!to_boolean(&v)),
                UnaryOperator::BitwiseNot => JsValue::from_i64(!to_int32(&v) as i64),
                _ => JsValue::Undefined,
            })
        }
    }
}

fn evaluate_update_expression(
    operator: UpdateOperator,
    argument: &ExpressionType,
    prefix: bool,
    ctx: &mut EvalContext,
) -> ValueResult {
    let delta = match operator {
        UpdateOperator::PlusPlus => 1.0,
        UpdateOperator::MinusMinus => -1.0,
    };
    match argument {
        ExpressionType::Identifier(id) => {
            let old = to_number(&ctx.resolve_identifier(&id.name)?);
            let new = old + delta;
            ctx.assign_identifier(&id.name, JsValue::from_f64(new))?;
            Ok(JsValue::from_f64(if prefix { new } else { old }))
        }
        ExpressionType::MemberExpression(m) => {
            let (base, key) = evaluate_member_target(m, ctx)?;
            let old = to_number(&get_value_property(ctx, &base, &key)?);
            let new = old + delta;
            set_value_property(ctx, &base, &key, JsValue::from_f64(new))?;
            Ok(JsValue::from_f64(if prefix { new } else { old }))
        }
        _ => Err(JErrorType::SyntaxError(
            "Invalid left-hand side expression in postfix operation".to_string(),
        )),
    }
}

fn evaluate_assignment_expression(
    expr: &ExpressionType,
    operator: AssignmentOperator,
    left: &PatternOrExpression,
    right: &ExpressionType,
    ctx: &mut EvalContext,
) -> ValueResult {
    // Step 0 evaluates the target, step 1 the right-hand side (or, for patterns, the binding).
    let frame = ctx.suspension.resume_frame(expr);
    let target = match left {
        PatternOrExpression::Pattern(p) => {
            let value = match frame {
                Some(f) if f.step == 1 => f.value_at(0),
                _ => evaluate_expression(right, ctx).on_suspend(ctx, |_| Frame::at(expr, 0))?,
            };
            bind_pattern(p, value.clone(), BindingInit::Assignment, ctx)
                .on_suspend(ctx, |_| Frame::at(expr, 1).with_values(vec![value.clone()]))?;
            return Ok(value);
        }
        PatternOrExpression::Expression(e) => e.as_ref(),
    };
    match target {
        ExpressionType::Identifier(id) => {
            let value = if operator == AssignmentOperator::Equals {
                evaluate_named_expression(right, &id.name, ctx).on_suspend(ctx, |_| Frame::at(expr, 1))?
            } else {
                let current = match frame {
                    Some(f) => f.value_at(0),
                    None => ctx.resolve_identifier(&id.name)?,
                };
                let combined = combine(operator, current.clone(), right, ctx)
                    .on_suspend(ctx, |_| Frame::at(expr, 1).with_values(vec![current.clone()]))?;
                match combined {
                    Some(v) => v,
                    None => return ctx.resolve_identifier(&id.name),
                }
            };
            ctx.assign_identifier(&id.name, value.clone())?;
            Ok(value)
        }
        ExpressionType::MemberExpression(m) => {
            let (base, key, current) = match frame {
                Some(f) if f.step == 1 => (f.value_at(0), f.keys.first().cloned().unwrap_or_default(), f.value_at(1)),
                _ => {
                    let (base, key) = evaluate_member_target(m, ctx).on_suspend(ctx, |_| Frame::at(expr, 0))?;
                    let current = if operator == AssignmentOperator::Equals {
                        JsValue::Undefined
                    } else {
                        get_value_property(ctx, &base, &key)?
                    };
                    (base, key, current)
                }
            };
            let at = || {
                Frame::at(expr, 1)
                    .with_values(vec![base.clone(), current.clone()])
                    .with_keys(vec![key.clone()])
            };
            let value = if operator == AssignmentOperator::Equals {
                evaluate_expression(right, ctx).on_suspend(ctx, |_| at())?
            } else {
                match combine(operator, current.clone(), right, ctx).on_suspend(ctx, |_| at())? {
                    Some(v) => v,
                    None => return Ok(current),
                }
            };
            set_value_property(ctx, &base, &key, value.clone())?;
            Ok(value)
        }
        _ => Err(JErrorType::SyntaxError(
            "Invalid left-hand side in assignment".to_string(),
        )),
    }
}

/// New value for a compound assignment, or `None` when a logical assignment short-circuits.
fn combine(
    operator: AssignmentOperator,
    current: JsValue,
    right: &ExpressionType,
    ctx: &mut EvalContext,
) -> Result<Option<JsValue>, JErrorType> {
    let binary = match operator {
        AssignmentOperator::LogicalAndEquals => {
            return if to_boolean(&current) {
                evaluate_expression(right, ctx).map(Some)
            } else {
                Ok(None)
            }
        }
        AssignmentOperator::LogicalOrEquals => {
            return if to_boolean(&current) {
                Ok(None)
            } else {
                evaluate_expression(right, ctx).map(Some)
            }
        }
        AssignmentOperator::NullishCoalescingEquals => {
            return if current.is_nullish() {
                evaluate_expression(right, ctx).map(Some)
            } else {
                Ok(None)
            }
        }
        AssignmentOperator::Equals => return evaluate_expression(right, ctx).map(Some),
        AssignmentOperator::AddEquals => BinaryOperator::Add,
        AssignmentOperator::SubtractEquals => BinaryOperator::Subtract,
        AssignmentOperator::MultiplyEquals => BinaryOperator::Multiply,
        AssignmentOperator::DivideEquals => BinaryOperator::Divide,
        AssignmentOperator::ModuloEquals => BinaryOperator::Modulo,
        AssignmentOperator::ExponentiationEquals => BinaryOperator::Exponentiation,
        AssignmentOperator::BitwiseLeftShiftEquals => BinaryOperator::BitwiseLeftShift,
        AssignmentOperator::BitwiseRightShiftEquals => BinaryOperator::BitwiseRightShift,
        AssignmentOperator::BitwiseUnsignedRightShiftEquals => BinaryOperator::BitwiseUnsignedRightShift,
        AssignmentOperator::BitwiseOrEquals => BinaryOperator::BitwiseOr,
        AssignmentOperator::BitwiseAndEquals => BinaryOperator::BitwiseAnd,
        AssignmentOperator::BitwiseXorEquals => BinaryOperator::BitwiseXor,
    };
    let r = evaluate_expression(right, ctx)?;
    apply_binary_operator(ctx, binary, &current, &r).map(Some)
}

/// Applies a binary operator to two already evaluated operands.
pub fn apply_binary_operator(
    ctx: &mut EvalContext,
    operator: BinaryOperator,
    l: &JsValue,
    r: &JsValue,
) -> ValueResult {
    Ok(match operator {
        BinaryOperator::LooselyEqual => JsValue::Boolean(is_loosely_equal(l, r)),
        BinaryOperator::LooselyUnequal => JsValue::Boolean(!is_loosely_equal(l, r)),
        BinaryOperator::StrictlyEqual => JsValue::Boolean(is_strictly_equal(l, r)),
        BinaryOperator::StrictlyUnequal => JsValue::Boolean(!is_strictly_equal(l, r)),
        BinaryOperator::LessThan => JsValue::Boolean(compare_values(l, r).map_or(false, |o| o.is_lt())),
        BinaryOperator::LessThanEqual => JsValue::Boolean(compare_values(l, r).map_or(false, |o| o.is_le())),
        BinaryOperator::GreaterThan => JsValue::Boolean(compare_values(l, r).map_or(false, |o| o.is_gt())),
        BinaryOperator::GreaterThanEqual => JsValue::Boolean(compare_values(l, r).map_or(false, |o| o.is_ge())),
        BinaryOperator::Add => {
            let (pl, pr) = (to_primitive(l), to_primitive(r));
            if matches!(pl, JsValue::String(_)) || matches!(pr, JsValue::String(_)) {
                JsValue::String(format!("{}{}", to_string(&pl), to_string(&pr)))
            } else {
                JsValue::from_f64(to_number(&pl) + to_number(&pr))
            }
        }
        BinaryOperator::Subtract => JsValue::from_f64(to_number(l) - to_number(r)),
        BinaryOperator::Multiply => JsValue::from_f64(to_number(l) * to_number(r)),
        BinaryOperator::Divide => JsValue::from_f64(to_number(l) / to_number(r)),
        BinaryOperator::Modulo => JsValue::from_f64(to_number(l) % to_number(r)),
        BinaryOperator::Exponentiation => JsValue::from_f64(exponentiate(to_number(l), to_number(r))),
        BinaryOperator::BitwiseLeftShift => {
            JsValue::from_i64(to_int32(l).wrapping_shl(to_uint32(r) & 31) as i64)
        }
        BinaryOperator::BitwiseRightShift => {
            JsValue::from_i64(to_int32(l).wrapping_shr(to_uint32(r) & 31) as i64)
        }
        BinaryOperator::BitwiseUnsignedRightShift => {
            JsValue::from_i64(to_uint32(l).wrapping_shr(to_uint32(r) & 31) as i64)
        }
        BinaryOperator::BitwiseOr => JsValue::from_i64((to_int32(l) | to_int32(r)) as i64),
        BinaryOperator::BitwiseAnd => JsValue::from_i64((to_int32(l) & to_int32(r)) as i64),
        BinaryOperator::BitwiseXor => JsValue::from_i64((to_int32(l) ^ to_int32(r)) as i64),
        BinaryOperator::In => {
            let key = to_property_key(l);
            match r {
                JsValue::Object(o) => {
                    let found = has_property(o, &key)
                        || (matches!(o.borrow().kind, ObjectKind::Global) && ctx.super_global.has_name(&key));
                    JsValue::Boolean(found)
                }
                _ => {
                    return Err(JErrorType::TypeError(format!(
                        "Cannot use 'in' operator to search for '{}' in {}",
                        key,
                        to_string(r)
                    )))
                }
            }
        }
        BinaryOperator::InstanceOf => JsValue::Boolean(instance_of(ctx, l, r)?),
    })
}

fn exponentiate(base: f64, exponent: f64) -> f64 {
    if exponent.is_nan() || (base.abs() == 1.0 && exponent.is_infinite()) {
        f64::NAN
    } else {
        base.powf(exponent)
    }
}

fn instance_of(ctx: &mut EvalContext, v: &JsValue, target: &JsValue) -> Result<bool, JErrorType> {
    let f = match target {
        JsValue::Object(o) if o.borrow().is_callable() => o.clone(),
        _ => {
            return Err(JErrorType::TypeError(
                "Right-hand side of 'instanceof' is not callable".to_string(),
            ))
        }
    };
    let o = match v {
        JsValue::Object(o) => o,
        _ => return Ok(false),
    };
    match get_object_property(ctx, &f, "prototype") {
        JsValue::Object(proto) => Ok(inherits_from(o, &proto)),
        _ => Err(JErrorType::TypeError(
            "Function has non-object prototype 'undefined' in instanceof check".to_string(),
        )),
    }
}
