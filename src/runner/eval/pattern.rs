//! Binding values to identifiers and destructuring patterns.
//!
//! A pattern that suspends on an `await` in a default value is re-entered with
//! the same `value` its caller passed the first time.

use crate::parser::ast::{PatternType, PropertyKey};
use crate::runner::ds::env_record::EnvRef;
use crate::runner::ds::error::JErrorType;
use crate::runner::ds::operations::object::{get_value_property, iterate_to_vec, set_value_property};
use crate::runner::ds::operations::type_conversion::to_property_key;
use crate::runner::ds::value::JsValue;
use crate::runner::plugin::types::EvalContext;

use super::expression::{evaluate_expression, evaluate_member_target, evaluate_named_expression};
use super::suspend::{Frame, OnSuspend};

/// How a bound name receives its value.
#[derive(Clone, Copy)]
pub enum BindingInit<'a> {
    /// `PutValue` through the scope chain: assignments and `var` declarations.
    Assignment,
    /// `InitializeBinding` in a specific scope: `let`, `const`, parameters, `catch`.
    Environment(&'a EnvRef),
}

pub fn bind_pattern(
    pattern: &PatternType,
    value: JsValue,
    init: BindingInit,
    ctx: &mut EvalContext,
) -> Result<(), JErrorType> {
    match pattern {
        PatternType::Identifier(id) => bind_identifier(&id.name, value, init, ctx),
        PatternType::MemberExpression(m) => {
            let (base, key) = evaluate_member_target(m, ctx)?;
            set_value_property(ctx, &base, &key, value)
        }
        PatternType::AssignmentPattern { left, right, .. } => {
            let value = match (ctx.suspension.resume_frame(pattern), value) {
                (Some(frame), _) if frame.step == 1 => frame.value_at(0),
                (_, JsValue::Undefined) => {
                    let default = match left.as_ref() {
                        PatternType::Identifier(id) => evaluate_named_expression(right, &id.name, ctx),
                        _ => evaluate_expression(right, ctx),
                    };
                    default.on_suspend(ctx, |_| Frame::at(pattern, 0))?
                }
                (_, v) => v,
            };
            bind_pattern(left, value.clone(), init, ctx)
                .on_suspend(ctx, |_| Frame::at(pattern, 1).with_values(vec![value.clone()]))
        }
        PatternType::ArrayPattern { elements, .. } => {
            let (start, values) = match ctx.suspension.resume_frame(pattern) {
                Some(frame) => (frame.index, frame.values),
                None => (0, iterate_to_vec(&value, None)?),
            };
            for (i, element) in elements.iter().enumerate().skip(start) {
                let bound = match element {
                    None => continue,
                    Some(PatternType::RestElement { argument, .. }) => {
                        let rest = ctx.new_array(values.iter().skip(i).cloned().collect());
                        bind_pattern(argument, rest, init, ctx)
                    }
                    Some(p) => {
                        let v = values.get(i).cloned().unwrap_or(JsValue::Undefined);
                        bind_pattern(p, v, init, ctx)
                    }
                };
                bound.on_suspend(ctx, |_| Frame::at(pattern, 0).with_index(i).with_values(values.clone()))?;
            }
            Ok(())
        }
        PatternType::ObjectPattern { properties, rest, .. } => {
            // Step 0 reads property `index`, step 1 binds it, step 2 binds the rest object.
            let frame = ctx.suspension.resume_frame(pattern);
            if frame.is_none() && value.is_nullish() {
                return Err(JErrorType::TypeError(format!(
                    "Cannot destructure '{}' as it is {}.",
                    value_label(&value),
                    value_label(&value)
                )));
            }
            let (start, step, mut used_keys, mut saved) = match frame {
                Some(f) => (f.index, f.step, f.keys, f.values.into_iter().next()),
                None => (0, 0, vec![], None),
            };
            for (i, property) in properties.iter().enumerate().skip(start) {
                let v = match saved.take().filter(|_| step == 1) {
                    Some(v) => v,
                    None => {
                        let key = match &property.key {
                            PropertyKey::Static(s) => s.to_string(),
                            PropertyKey::Computed(e) => {
                                let k = evaluate_expression(e, ctx)
                                    .on_suspend(ctx, |_| Frame::at(pattern, 0).with_index(i).with_keys(used_keys.clone()))?;
                                to_property_key(&k)
                            }
                        };
                        let v = get_value_property(ctx, &value, &key)?;
                        used_keys.push(key);
                        v
                    }
                };
                bind_pattern(&property.value, v.clone(), init, ctx).on_suspend(ctx, |_| {
                    Frame::at(pattern, 1)
                        .with_index(i)
                        .with_keys(used_keys.clone())
                        .with_values(vec![v.clone()])
                })?;
            }
            if let Some(rest_target) = rest {
                let rest_value = match saved.take().filter(|_| step == 2) {
                    Some(v) => v,
                    None => {
                        let rest_object = ctx.new_object();
                        if let JsValue::Object(source) = &value {
                            let keys = source.borrow().own_enumerable_keys();
                            for key in keys {
                                if used_keys.contains(&key) {
                                    continue;
                                }
                                let v = get_value_property(ctx, &value, &key)?;
                                rest_object.borrow_mut().set_own_property(&key, v);
                            }
                        }
                        JsValue::Object(rest_object)
                    }
                };
                bind_pattern(rest_target, rest_value.clone(), init, ctx).on_suspend(ctx, |_| {
                    Frame::at(pattern, 2)
                        .with_index(properties.len())
                        .with_keys(used_keys.clone())
                        .with_values(vec![rest_value.clone()])
                })?;
            }
            Ok(())
        }
        PatternType::RestElement { argument, .. } => bind_pattern(argument, value, init, ctx),
    }
}

fn bind_identifier(name: &str, value: JsValue, init: BindingInit, ctx: &mut EvalContext) -> Result<(), JErrorType> {
    match init {
        BindingInit::Assignment => ctx.assign_identifier(name, value),
        BindingInit::Environment(env) => {
            env.borrow_mut().initialize_binding(name, value);
            Ok(())
        }
    }
}

fn value_label(v: &JsValue) -> &'static str {
    match v {
        JsValue::Null => "null",
        _ => "undefined",
    }
}

