//! Statement execution.
//!
//! Statements produce completion records; a thrown value travels as `Err`.
//! Statements with more than one step record a [`Frame`] when an `await` below
//! them suspends, and pick up from it when the body resumes.

use crate::parser::ast::{
    BlockStatementData, CatchClauseData, DeclarationType, ExpressionType, ForBinding, ForIteratorData,
    PatternType, StatementType, SwitchCaseData, VariableDeclarationData, VariableDeclarationKind,
    VariableDeclarationOrExpression,
};
use crate::parser::static_semantics::{
    get_bound_names_from_pattern, get_bound_names_from_variable_declaration_data, lexically_scoped_declarations,
    LexicallyScopedDeclaration,
};
use crate::runner::ds::env_record::{EnvRef, EnvironmentRecord};
use crate::runner::ds::error::JErrorType;
use crate::runner::ds::object::has_property;
use crate::runner::ds::operations::object::{enumerable_keys_with_inherited, not_iterable};
use crate::runner::ds::operations::test_and_comparison::is_strictly_equal;
use crate::runner::ds::operations::type_conversion::to_boolean;
use crate::runner::ds::value::JsValue;
use crate::runner::plugin::types::EvalContext;

use super::expression::{callee_label, evaluate_expression, evaluate_named_expression};
use super::function::instantiate_function_object;
use super::pattern::{bind_pattern, BindingInit};
use super::suspend::{is_suspended, Frame, OnSuspend};
use super::types::{Completion, CompletionType, EvalResult};

/// Execute a statement and return its completion.
pub fn execute_statement(stmt: &StatementType, ctx: &mut EvalContext) -> EvalResult {
    match stmt {
        StatementType::EmptyStatement { .. } | StatementType::DebuggerStatement { .. } => Ok(Completion::empty()),

        StatementType::ExpressionStatement { expression, .. } => {
            let value = evaluate_expression(expression, ctx)?;
            Ok(Completion::with_value(value))
        }

        StatementType::BlockStatement(block) => execute_block_statement(block, ctx),

        StatementType::DeclarationStatement(decl) => match decl {
            // Hoisted when the enclosing scope was entered.
            DeclarationType::FunctionDeclaration(_) => Ok(Completion::empty()),
            DeclarationType::VariableDeclaration(v) => {
                execute_variable_declaration(v, ctx)?;
                Ok(Completion::empty())
            }
        },

        StatementType::IfStatement {
            test,
            consequent,
            alternate,
            ..
        } => {
            let mut branch = ctx.suspension.resume_frame(stmt).map_or(0, |f| f.step);
            if branch == 0 {
                let t = evaluate_expression(test, ctx).on_suspend(ctx, |_| Frame::at(stmt, 0))?;
                branch = if to_boolean(&t) { 1 } else { 2 };
            }
            let completion = match (branch, alternate) {
                (1, _) => execute_statement(consequent, ctx).on_suspend(ctx, |_| Frame::at(stmt, 1))?,
                (_, Some(alternate)) => execute_statement(alternate, ctx).on_suspend(ctx, |_| Frame::at(stmt, 2))?,
                (_, None) => Completion::empty(),
            };
            Ok(completion.update_empty(Some(JsValue::Undefined)))
        }

        StatementType::WhileStatement { test, body, .. } => {
            let (mut step, mut value) = match ctx.suspension.resume_frame(stmt) {
                Some(frame) => (frame.step, frame.value),
                None => (0, None),
            };
            loop {
                if step == 0 {
                    let t = evaluate_expression(test, ctx)
                        .on_suspend(ctx, |_| Frame::at(stmt, 0).with_value(value.clone()))?;
                    if !to_boolean(&t) {
                        break;
                    }
                }
                step = 0;
                let completion = execute_statement(body, ctx)
                    .on_suspend(ctx, |_| Frame::at(stmt, 1).with_value(value.clone()))?;
                if let Some(exit) = loop_continues(completion, &mut value) {
                    return Ok(exit);
                }
            }
            Ok(Completion::of(CompletionType::Normal, value))
        }

        StatementType::DoWhileStatement { test, body, .. } => {
            let (mut step, mut value) = match ctx.suspension.resume_frame(stmt) {
                Some(frame) => (frame.step, frame.value),
                None => (0, None),
            };
            loop {
                if step == 0 {
                    let completion = execute_statement(body, ctx)
                        .on_suspend(ctx, |_| Frame::at(stmt, 0).with_value(value.clone()))?;
                    if let Some(exit) = loop_continues(completion, &mut value) {
                        return Ok(exit);
                    }
                }
                step = 0;
                let t = evaluate_expression(test, ctx).on_suspend(ctx, |_| Frame::at(stmt, 1).with_value(value.clone()))?;
                if !to_boolean(&t) {
                    break;
                }
            }
            Ok(Completion::of(CompletionType::Normal, value))
        }

        StatementType::ForStatement {
            init,
            test,
            update,
            body,
            ..
        } => in_scope(ctx, |ctx| {
            execute_for_statement(stmt, init.as_ref(), test.as_deref(), update.as_deref(), body, ctx)
        }),

        StatementType::ForInStatement(data) => execute_for_in_statement(data, ctx),

        StatementType::ForOfStatement(data) => execute_for_of_statement(data, ctx),

        StatementType::SwitchStatement {
            discriminant, cases, ..
        } => execute_switch_statement(stmt, discriminant, cases, ctx),

        StatementType::BreakStatement { .. } => Ok(Completion::jump(CompletionType::Break)),

        StatementType::ContinueStatement { .. } => Ok(Completion::jump(CompletionType::Continue)),

        StatementType::ReturnStatement { argument, .. } => {
            let value = match argument {
                Some(arg) => evaluate_expression(arg, ctx)?,
                None => JsValue::Undefined,
            };
            Ok(Completion::returning(value))
        }

        StatementType::ThrowStatement { argument, .. } => {
            let value = evaluate_expression(argument, ctx)?;
            Err(JErrorType::Thrown(value))
        }

        StatementType::TryStatement {
            block,
            handler,
            finalizer,
            ..
        } => execute_try_statement(stmt, block, handler.as_ref(), finalizer.as_ref(), ctx),
    }
}

/// Runs statements in order. The completion value is that of the last statement that produced one.
pub fn execute_statement_list(statements: &[StatementType], ctx: &mut EvalContext) -> EvalResult {
    let (start, mut value) = match ctx.suspension.resume_frame(statements) {
        Some(frame) => (frame.index, frame.value),
        None => (0, None),
    };
    for (i, stmt) in statements.iter().enumerate().skip(start) {
        let completion = execute_statement(stmt, ctx)
            .on_suspend(ctx, |_| Frame::at(statements, 0).with_index(i).with_value(value.clone()))?;
        if completion.is_abrupt() {
            return Ok(completion.update_empty(value));
        }
        if completion.value.is_some() {
            value = completion.value;
        }
    }
    Ok(Completion::of(CompletionType::Normal, value))
}

/// Declares the `let`/`const` bindings of `statements` in `env` and binds their function declarations.
pub fn instantiate_declarations(statements: &[StatementType], env: &EnvRef, ctx: &mut EvalContext) {
    for declaration in lexically_scoped_declarations(statements) {
        match declaration {
            LexicallyScopedDeclaration::Binding { name, is_const } => {
                if is_const {
                    env.borrow_mut().create_immutable_binding(&name);
                } else {
                    env.borrow_mut().create_mutable_binding(&name);
                }
            }
            LexicallyScopedDeclaration::Function(f) => {
                let name = f.name().unwrap_or_default().to_string();
                let function = instantiate_function_object(f, env.clone(), &name, ctx);
                env.borrow_mut().initialize_binding(&name, function);
            }
        }
    }
}

/// Runs `f` and puts the lexical environment back afterwards, whatever the outcome.
fn in_scope<F>(ctx: &mut EvalContext, f: F) -> EvalResult
where
    F: FnOnce(&mut EvalContext) -> EvalResult,
{
    let saved = ctx.lex_env();
    let result = f(ctx);
    ctx.set_lex_env(saved);
    result
}

/// Re-enters the scope a resumed step had open, or opens a fresh one with `enter`.
fn enter_scope<F>(frame: Option<&Frame>, ctx: &mut EvalContext, enter: F)
where
    F: FnOnce(&mut EvalContext),
{
    match frame.and_then(|f| f.env.clone()) {
        Some(env) => ctx.set_lex_env(env),
        None => enter(ctx),
    }
}

fn execute_block_statement(block: &BlockStatementData, ctx: &mut EvalContext) -> EvalResult {
    in_scope(ctx, |ctx| {
        let frame = ctx.suspension.resume_frame(block);
        enter_scope(frame.as_ref(), ctx, |ctx| {
            let env = ctx.push_block_scope();
            instantiate_declarations(&block.body, &env, ctx);
        });
        execute_statement_list(&block.body, ctx).on_suspend(ctx, |c| Frame::at(block, 0).with_env(c.lex_env()))
    })
}

fn execute_variable_declaration(v: &VariableDeclarationData, ctx: &mut EvalContext) -> Result<(), JErrorType> {
    // Step 0 evaluates the initializer of declarator `index`, step 1 binds it.
    let (start, mut initialized) = match ctx.suspension.resume_frame(v) {
        Some(frame) => (frame.index, (frame.step == 1).then(|| frame.value_at(0))),
        None => (0, None),
    };
    for (i, declarator) in v.declarations.iter().enumerate().skip(start) {
        let value = match (initialized.take(), &declarator.init) {
            (Some(value), _) => value,
            (None, Some(init)) => {
                let result = match &declarator.id {
                    PatternType::Identifier(id) => evaluate_named_expression(init, &id.name, ctx),
                    _ => evaluate_expression(init, ctx),
                };
                result.on_suspend(ctx, |_| Frame::at(v, 0).with_index(i))?
            }
            // `var x;` leaves an existing value alone.
            (None, None) if v.kind == VariableDeclarationKind::Var => continue,
            (None, None) => JsValue::Undefined,
        };
        let bound = match v.kind {
            VariableDeclarationKind::Var => bind_pattern(&declarator.id, value.clone(), BindingInit::Assignment, ctx),
            _ => {
                let env = ctx.lex_env();
                bind_pattern(&declarator.id, value.clone(), BindingInit::Environment(&env), ctx)
            }
        };
        bound.on_suspend(ctx, |_| Frame::at(v, 1).with_index(i).with_values(vec![value.clone()]))?;
    }
    Ok(())
}

/// Folds one loop-body completion into the loop's state.
/// Returns the completion that ends the loop early, if any.
fn loop_continues(completion: Completion, value: &mut Option<JsValue>) -> Option<Completion> {
    if completion.value.is_some() {
        *value = completion.value.clone();
    }
    match completion.completion_type {
        CompletionType::Normal | CompletionType::Continue => None,
        CompletionType::Break => Some(Completion {
            completion_type: CompletionType::Normal,
            value: value.clone(),
        }),
        CompletionType::Return => Some(completion),
    }
}

/// Gives the next iteration its own copy of the loop's `let` bindings, so closures
/// created in one iteration keep that iteration's values.
fn copy_iteration_env(ctx: &mut EvalContext) {
    let last = ctx.lex_env();
    let outer = last.borrow().outer.clone();
    let next = EnvironmentRecord::new(outer);
    for (name, value, mutable) in last.borrow().copy_bindings() {
        if !mutable {
            next.borrow_mut().create_immutable_binding(&name);
        }
        next.borrow_mut().initialize_binding(&name, value);
    }
    ctx.set_lex_env(next);
}

/// Steps of a `for (init; test; update) body` loop, as recorded in its frame.
const FOR_INIT: usize = 0;
const FOR_TEST: usize = 1;
const FOR_BODY: usize = 2;
const FOR_UPDATE: usize = 3;

fn execute_for_statement(
    stmt: &StatementType,
    init: Option<&VariableDeclarationOrExpression>,
    test: Option<&ExpressionType>,
    update: Option<&ExpressionType>,
    body: &StatementType,
    ctx: &mut EvalContext,
) -> EvalResult {
    let per_iteration = matches!(
        init,
        Some(VariableDeclarationOrExpression::VariableDeclaration(d)) if d.kind == VariableDeclarationKind::Let
    );
    let frame = ctx.suspension.resume_frame(stmt);
    let resumed = frame.is_some();
    enter_scope(frame.as_ref(), ctx, |_| {});
    let (mut step, mut value) = frame.map_or((FOR_INIT, None), |f| (f.step, f.value));
    let at = |step: usize, c: &EvalContext, value: &Option<JsValue>| {
        Frame::at(stmt, step).with_env(c.lex_env()).with_value(value.clone())
    };

    if step == FOR_INIT {
        match init {
            Some(VariableDeclarationOrExpression::VariableDeclaration(d)) => {
                if d.kind != VariableDeclarationKind::Var && !resumed {
                    let env = ctx.push_block_scope();
                    for name in get_bound_names_from_variable_declaration_data(d) {
                        if d.kind == VariableDeclarationKind::Const {
                            env.borrow_mut().create_immutable_binding(&name);
                        } else {
                            env.borrow_mut().create_mutable_binding(&name);
                        }
                    }
                }
                execute_variable_declaration(d, ctx).on_suspend(ctx, |c| at(FOR_INIT, c, &value))?;
            }
            Some(VariableDeclarationOrExpression::Expression(e)) => {
                evaluate_expression(e, ctx).on_suspend(ctx, |c| at(FOR_INIT, c, &value))?;
            }
            None => {}
        }
        if per_iteration {
            copy_iteration_env(ctx);
        }
        step = FOR_TEST;
    }
    loop {
        if step <= FOR_TEST {
            if let Some(test) = test {
                let t = evaluate_expression(test, ctx).on_suspend(ctx, |c| at(FOR_TEST, c, &value))?;
                if !to_boolean(&t) {
                    break;
                }
            }
        }
        if step <= FOR_BODY {
            let completion = execute_statement(body, ctx).on_suspend(ctx, |c| at(FOR_BODY, c, &value))?;
            if let Some(exit) = loop_continues(completion, &mut value) {
                return Ok(exit);
            }
            if per_iteration {
                copy_iteration_env(ctx);
            }
        }
        if let Some(update) = update {
            evaluate_expression(update, ctx).on_suspend(ctx, |c| at(FOR_UPDATE, c, &value))?;
        }
        step = FOR_TEST;
    }
    Ok(Completion::of(CompletionType::Normal, value))
}

/// Declares the loop variable of a `for...in`/`for...of` iteration in a fresh scope
/// when it is a `let` or `const`.
fn enter_for_binding_scope(left: &ForBinding, ctx: &mut EvalContext) {
    if let ForBinding::Declaration { kind, target } = left {
        if *kind == VariableDeclarationKind::Var {
            return;
        }
        let env = ctx.push_block_scope();
        for name in get_bound_names_from_pattern(target) {
            if *kind == VariableDeclarationKind::Const {
                env.borrow_mut().create_immutable_binding(&name);
            } else {
                env.borrow_mut().create_mutable_binding(&name);
            }
        }
    }
}

/// Binds the loop variable of a `for...in`/`for...of` for one iteration.
fn bind_for_binding(left: &ForBinding, value: JsValue, ctx: &mut EvalContext) -> Result<(), JErrorType> {
    match left {
        ForBinding::Declaration {
            kind: VariableDeclarationKind::Var,
            target,
        }
        | ForBinding::Pattern(target) => bind_pattern(target, value, BindingInit::Assignment, ctx),
        ForBinding::Declaration { target, .. } => {
            let env = ctx.lex_env();
            bind_pattern(target, value, BindingInit::Environment(&env), ctx)
        }
    }
}

fn run_iteration(data: &ForIteratorData, value: JsValue, ctx: &mut EvalContext) -> EvalResult {
    in_scope(ctx, |ctx| {
        let frame = ctx.suspension.resume_frame(&data.left);
        enter_scope(frame.as_ref(), ctx, |ctx| enter_for_binding_scope(&data.left, ctx));
        let (step, value) = match frame {
            Some(frame) => (frame.step, frame.value_at(0)),
            None => (0, value),
        };
        if step == 0 {
            bind_for_binding(&data.left, value.clone(), ctx)
                .on_suspend(ctx, |c| Frame::at(&data.left, 0).with_env(c.lex_env()).with_values(vec![value.clone()]))?;
        }
        execute_statement(&data.body, ctx).on_suspend(ctx, |c| Frame::at(&data.left, 1).with_env(c.lex_env()))
    })
}

/// Where a `for...in`/`for...of` loop stands: what it walks and how far it got.
struct Iteration {
    subject: JsValue,
    index: usize,
    keys: Vec<String>,
    value: Option<JsValue>,
    /// Iteration `index` is the one being resumed and must run even if the subject shrank.
    resumed: bool,
}

impl Iteration {
    /// Evaluates the loop's right-hand side, or restores the loop from its frame.
    fn begin(data: &ForIteratorData, ctx: &mut EvalContext) -> Result<Iteration, JErrorType> {
        match ctx.suspension.resume_frame(data) {
            Some(frame) if frame.step == 1 => Ok(Iteration {
                subject: frame.value_at(0),
                index: frame.index,
                keys: frame.keys,
                value: frame.value,
                resumed: true,
            }),
            _ => {
                let subject = evaluate_expression(&data.right, ctx).on_suspend(ctx, |_| Frame::at(data, 0))?;
                Ok(Iteration {
                    subject,
                    index: 0,
                    keys: Vec::new(),
                    value: None,
                    resumed: false,
                })
            }
        }
    }

    /// Runs the body once with `item`. Returns the completion that ends the loop early, if any.
    fn step(
        &mut self,
        data: &ForIteratorData,
        item: JsValue,
        ctx: &mut EvalContext,
    ) -> Result<Option<Completion>, JErrorType> {
        self.resumed = false;
        let completion = run_iteration(data, item, ctx).on_suspend(ctx, |_| {
            Frame::at(data, 1)
                .with_index(self.index)
                .with_values(vec![self.subject.clone()])
                .with_keys(self.keys.clone())
                .with_value(self.value.clone())
        })?;
        self.index += 1;
        Ok(loop_continues(completion, &mut self.value))
    }

    fn finish(self) -> EvalResult {
        Ok(Completion::of(CompletionType::Normal, self.value))
    }
}

fn execute_for_of_statement(data: &ForIteratorData, ctx: &mut EvalContext) -> EvalResult {
    let mut iteration = Iteration::begin(data, ctx)?;
    let subject = iteration.subject.clone();
    match &subject {
        // Arrays are walked live, so elements pushed inside the loop are visited.
        JsValue::Object(o) if o.borrow().is_array() => loop {
            let element = match o.borrow().as_array() {
                Some(values) if iteration.index < values.len() => values[iteration.index].clone(),
                _ if iteration.resumed => JsValue::Undefined,
                _ => break,
            };
            if let Some(exit) = iteration.step(data, element, ctx)? {
                return Ok(exit);
            }
        },
        JsValue::String(s) => {
            let chars: Vec<char> = s.chars().collect();
            while iteration.index < chars.len() || iteration.resumed {
                let c = chars.get(iteration.index).map(|c| c.to_string()).unwrap_or_default();
                if let Some(exit) = iteration.step(data, JsValue::String(c), ctx)? {
                    return Ok(exit);
                }
            }
        }
        _ => {
            let label = match data.right.as_ref() {
                ExpressionType::Identifier(_) | ExpressionType::MemberExpression(_) => {
                    Some(callee_label(&data.right))
                }
                _ => None,
            };
            return Err(not_iterable(&subject, label.as_deref()));
        }
    }
    iteration.finish()
}

fn execute_for_in_statement(data: &ForIteratorData, ctx: &mut EvalContext) -> EvalResult {
    let mut iteration = Iteration::begin(data, ctx)?;
    let subject = iteration.subject.clone();
    match &subject {
        JsValue::Object(o) => {
            if !iteration.resumed {
                iteration.keys = enumerable_keys_with_inherited(o);
            }
            while iteration.index < iteration.keys.len() {
                let key = iteration.keys[iteration.index].clone();
                // Properties deleted by an earlier iteration are skipped.
                if !iteration.resumed && !has_property(o, &key) {
                    iteration.index += 1;
                    continue;
                }
                if let Some(exit) = iteration.step(data, JsValue::String(key), ctx)? {
                    return Ok(exit);
                }
            }
        }
        JsValue::String(s) => {
            let len = s.chars().count();
            while iteration.index < len {
                let key = JsValue::String(iteration.index.to_string());
                if let Some(exit) = iteration.step(data, key, ctx)? {
                    return Ok(exit);
                }
            }
        }
        _ => {}
    }
    iteration.finish()
}

/// Steps of a `switch`: the discriminant, the case tests, then the case bodies.
const SWITCH_DISCRIMINANT: usize = 0;
const SWITCH_MATCH: usize = 1;
const SWITCH_BODY: usize = 2;

fn execute_switch_statement(
    stmt: &StatementType,
    discriminant: &ExpressionType,
    cases: &[SwitchCaseData],
    ctx: &mut EvalContext,
) -> EvalResult {
    let frame = ctx.suspension.resume_frame(stmt);
    let (step, index, value, saved) = match &frame {
        Some(f) if f.step != SWITCH_DISCRIMINANT => (f.step, f.index, f.value.clone(), f.value_at(0)),
        _ => {
            let v = evaluate_expression(discriminant, ctx).on_suspend(ctx, |_| Frame::at(stmt, SWITCH_DISCRIMINANT))?;
            (SWITCH_MATCH, 0, None, v)
        }
    };
    in_scope(ctx, |ctx| {
        // A frame recorded while evaluating the discriminant carries no scope yet.
        enter_scope(frame.as_ref(), ctx, |ctx| {
            let env = ctx.push_block_scope();
            for case in cases {
                instantiate_declarations(&case.consequent, &env, ctx);
            }
        });
        let at = |step: usize, i: usize, c: &EvalContext, value: &Option<JsValue>| {
            Frame::at(stmt, step)
                .with_index(i)
                .with_values(vec![saved.clone()])
                .with_env(c.lex_env())
                .with_value(value.clone())
        };
        let mut value = value;
        let start = if step == SWITCH_MATCH {
            let mut found = None;
            for (i, case) in cases.iter().enumerate().skip(index) {
                if let Some(test) = &case.test {
                    let v = evaluate_expression(test, ctx).on_suspend(ctx, |c| at(SWITCH_MATCH, i, c, &value))?;
                    if is_strictly_equal(&saved, &v) {
                        found = Some(i);
                        break;
                    }
                }
            }
            match found.or_else(|| cases.iter().position(|c| c.test.is_none())) {
                Some(i) => i,
                None => return Ok(Completion::empty()),
            }
        } else {
            index
        };
        for (i, case) in cases.iter().enumerate().skip(start) {
            let completion = execute_statement_list(&case.consequent, ctx)
                .on_suspend(ctx, |c| at(SWITCH_BODY, i, c, &value))?;
            if completion.value.is_some() {
                value = completion.value.clone();
            }
            match completion.completion_type {
                CompletionType::Normal => {}
                CompletionType::Break => break,
                _ => return Ok(completion.update_empty(value)),
            }
        }
        Ok(Completion::of(CompletionType::Normal, value))
    })
}

fn execute_try_statement(
    stmt: &StatementType,
    block: &BlockStatementData,
    handler: Option<&CatchClauseData>,
    finalizer: Option<&BlockStatementData>,
    ctx: &mut EvalContext,
) -> EvalResult {
    // Step 0 runs the block, step 1 the catch clause, step 2 the finally block.
    let (mut step, mut result) = match ctx.suspension.resume_frame(stmt) {
        Some(frame) => (frame.step, frame.pending.unwrap_or_else(|| Ok(Completion::empty()))),
        None => (0, Ok(Completion::empty())),
    };
    if step == 0 {
        result = execute_block_statement(block, ctx);
        // A suspension is not an exception: neither catch nor finally sees it.
        if is_suspended(&result) {
            ctx.suspension.record(Frame::at(stmt, 0));
            return result;
        }
        step = if result.is_err() && handler.is_some() { 1 } else { 2 };
    }
    if step == 1 {
        if let Some(handler) = handler {
            result = execute_catch_clause(result.err(), handler, ctx);
            if is_suspended(&result) {
                ctx.suspension.record(Frame::at(stmt, 1));
                return result;
            }
        }
    }
    if let Some(finalizer) = finalizer {
        let completion = match execute_block_statement(finalizer, ctx) {
            Err(JErrorType::Suspended) => {
                ctx.suspension.record(Frame::at(stmt, 2).with_pending(result));
                return Err(JErrorType::Suspended);
            }
            other => other?,
        };
        if completion.is_abrupt() {
            return Ok(completion);
        }
    }
    result.map(|c| c.update_empty(Some(JsValue::Undefined)))
}

/// Runs a `catch` clause for `error`. On resume the error comes from the clause's frame.
fn execute_catch_clause(error: Option<JErrorType>, handler: &CatchClauseData, ctx: &mut EvalContext) -> EvalResult {
    in_scope(ctx, |ctx| {
        let frame = ctx.suspension.resume_frame(handler);
        let (step, thrown) = match &frame {
            Some(f) => (f.step, f.value_at(0)),
            None => (0, error.map_or(JsValue::Undefined, |e| ctx.error_to_value(e))),
        };
        enter_scope(frame.as_ref(), ctx, |ctx| {
            let env = ctx.push_block_scope();
            if let Some(param) = &handler.param {
                for name in get_bound_names_from_pattern(param) {
                    env.borrow_mut().create_mutable_binding(&name);
                }
            }
        });
        if step == 0 {
            if let Some(param) = &handler.param {
                let env = ctx.lex_env();
                bind_pattern(param, thrown.clone(), BindingInit::Environment(&env), ctx).on_suspend(ctx, |c| {
                    Frame::at(handler, 0).with_env(c.lex_env()).with_values(vec![thrown.clone()])
                })?;
            }
        }
        execute_block_statement(&handler.body, ctx).on_suspend(ctx, |c| Frame::at(handler, 1).with_env(c.lex_env()))
    })
}
