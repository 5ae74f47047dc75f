//! Function objects: creation, calls and construction.

use std::cell::Cell;
use std::rc::Rc;

use log::debug;

use crate::parser::ast::{FunctionBodyOrExpression, FunctionData, PatternType};
use crate::runner::ds::env_record::{EnvRef, EnvironmentRecord};
use crate::runner::ds::error::JErrorType;
use crate::runner::ds::execution_context::ExecutionContext;
use crate::runner::ds::function_object::{FunctionKind, FunctionObject};
use crate::runner::ds::object::{JsObject, JsObjectType, ObjectKind};
use crate::runner::ds::operations::object::get_object_property;
use crate::runner::ds::operations::type_conversion::to_string;
use crate::runner::ds::value::JsValue;
use crate::runner::plugin::types::{EvalContext, NativeFn};

use super::expression::evaluate_expression;
use super::pattern::{bind_pattern, BindingInit};
use super::promise::{new_promise, reject_promise, resolve_promise, subscribe_activation};
use super::statement::{execute_statement_list, instantiate_declarations};
use super::suspend::{Activation, AwaitOutcome};
use super::types::{CompletionType, ValueResult};

/// Creates a closure over `env`. Arrow functions capture the current `this`.
pub fn instantiate_function_object(
    data: &Rc<FunctionData>,
    env: EnvRef,
    name: &str,
    ctx: &mut EvalContext,
) -> JsValue {
    let lexical_this = if data.is_arrow {
        Some(ctx.this_value())
    } else {
        None
    };
    let function = FunctionObject::new_script(data.clone(), env, lexical_this, name.to_string());
    JsValue::Object(ctx.new_function_object(function))
}

/// A function expression's own name is visible inside its body only.
pub fn instantiate_function_expression(data: &Rc<FunctionData>, name: &str, ctx: &mut EvalContext) -> JsValue {
    match data.name() {
        Some(own_name) if !data.is_arrow => {
            let closure_env = EnvironmentRecord::new(Some(ctx.lex_env()));
            let f = instantiate_function_object(data, closure_env.clone(), own_name, ctx);
            closure_env.borrow_mut().create_immutable_binding(own_name);
            closure_env.borrow_mut().initialize_binding(own_name, f.clone());
            f
        }
        _ => {
            let env = ctx.lex_env();
            instantiate_function_object(data, env, name, ctx)
        }
    }
}

enum CallTarget {
    Script {
        data: Rc<FunctionData>,
        environment: EnvRef,
        lexical_this: Option<JsValue>,
    },
    Native {
        func: NativeFn,
        is_constructor: bool,
    },
    Bound {
        target: JsValue,
        this_value: JsValue,
        args: Vec<JsValue>,
    },
    PromiseResolver {
        promise: JsObjectType,
        reject: bool,
        already_resolved: Rc<Cell<bool>>,
    },
}

fn call_target(o: &JsObjectType) -> Option<CallTarget> {
    let o_ref = o.borrow();
    let f = o_ref.as_function()?;
    Some(match &f.kind {
        FunctionKind::Script {
            data,
            environment,
            lexical_this,
        } => CallTarget::Script {
            data: data.clone(),
            environment: environment.clone(),
            lexical_this: lexical_this.clone(),
        },
        FunctionKind::Native { func, constructor } => CallTarget::Native {
            func: *func,
            is_constructor: constructor.is_some(),
        },
        FunctionKind::Bound {
            target,
            this_value,
            args,
        } => CallTarget::Bound {
            target: target.clone(),
            this_value: this_value.clone(),
            args: args.clone(),
        },
        FunctionKind::PromiseResolver {
            promise,
            reject,
            already_resolved,
        } => CallTarget::PromiseResolver {
            promise: promise.clone(),
            reject: *reject,
            already_resolved: already_resolved.clone(),
        },
    })
}

/// `Call(F, thisArgument, args)`.
pub fn call_function(ctx: &mut EvalContext, callee: &JsValue, this: JsValue, args: Vec<JsValue>) -> ValueResult {
    let o = match callee {
        JsValue::Object(o) if o.borrow().is_callable() => o.clone(),
        _ => {
            return Err(JErrorType::TypeError(format!(
                "{} is not a function",
                describe_value(callee)
            )))
        }
    };
    if ctx.call_depth >= ctx.max_call_depth {
        return Err(JErrorType::RangeError("Maximum call stack size exceeded".to_string()));
    }
    ctx.call_depth += 1;
    let result = call_function_object(ctx, &o, this, args);
    ctx.call_depth -= 1;
    result
}

fn call_function_object(ctx: &mut EvalContext, o: &JsObjectType, this: JsValue, args: Vec<JsValue>) -> ValueResult {
    match call_target(o) {
        Some(CallTarget::Script {
            data,
            environment,
            lexical_this,
        }) => {
            let this_value = match lexical_this {
                Some(t) => t,
                None if this.is_nullish() => JsValue::Object(ctx.global_object.clone()),
                None => this,
            };
            call_script_function(ctx, o, &data, environment, this_value, args)
        }
        // A native constructor only sees a real `this` when reached through `new`.
        Some(CallTarget::Native { func, is_constructor }) => {
            let this = if is_constructor { JsValue::Undefined } else { this };
            func(ctx, this, args)
        }
        Some(CallTarget::Bound {
            target,
            this_value,
            args: bound_args,
        }) => {
            let mut all_args = bound_args;
            all_args.extend(args);
            call_function(ctx, &target, this_value, all_args)
        }
        Some(CallTarget::PromiseResolver {
            promise,
            reject,
            already_resolved,
        }) => {
            if already_resolved.get() {
                return Ok(JsValue::Undefined);
            }
            already_resolved.set(true);
            let value = args.into_iter().next().unwrap_or(JsValue::Undefined);
            if reject {
                reject_promise(ctx, &promise, value);
            } else {
                resolve_promise(ctx, &promise, value);
            }
            Ok(JsValue::Undefined)
        }
        None => Err(JErrorType::TypeError("object is not a function".to_string())),
    }
}

fn call_script_function(
    ctx: &mut EvalContext,
    function: &JsObjectType,
    data: &Rc<FunctionData>,
    environment: EnvRef,
    this_value: JsValue,
    args: Vec<JsValue>,
) -> ValueResult {
    let func_env = EnvironmentRecord::new(Some(environment));
    ctx.ctx_stack.push_execution_ctx(ExecutionContext {
        function: Some(function.clone()),
        this_value: this_value.clone(),
        lex_env: func_env.clone(),
        var_env: func_env.clone(),
        is_async: data.is_async,
    });
    let result = if data.is_async {
        let mark = ctx.suspension.mark();
        let result = execute_function_body(ctx, data, &func_env, args);
        let promise = new_promise(ctx);
        let activation = Activation {
            function: function.clone(),
            data: data.clone(),
            this_value,
            func_env,
            promise: promise.clone(),
            frames: Vec::new(),
        };
        settle_async_call(ctx, activation, mark, result);
        Ok(JsValue::Object(promise))
    } else {
        execute_function_body(ctx, data, &func_env, args)
    };
    ctx.ctx_stack.pop_running_execution_ctx();
    result
}

/// Continues a suspended async call with the outcome of the promise it awaited.
pub fn resume_async_function(ctx: &mut EvalContext, activation: Activation, outcome: AwaitOutcome) {
    let Activation {
        function,
        data,
        this_value,
        func_env,
        promise,
        frames,
    } = activation;
    debug!("resuming async function {} at depth {}", data.name().unwrap_or("<anonymous>"), frames.len());
    ctx.ctx_stack.push_execution_ctx(ExecutionContext {
        function: Some(function.clone()),
        this_value: this_value.clone(),
        lex_env: func_env.clone(),
        var_env: func_env.clone(),
        is_async: true,
    });
    let mark = ctx.suspension.mark();
    ctx.suspension.begin_resume(frames, outcome);
    ctx.call_depth += 1;
    let result = evaluate_function_body(ctx, &data);
    ctx.call_depth -= 1;
    ctx.suspension.end_resume();
    let activation = Activation {
        function,
        data,
        this_value,
        func_env,
        promise,
        frames: Vec::new(),
    };
    settle_async_call(ctx, activation, mark, result);
    ctx.ctx_stack.pop_running_execution_ctx();
}

/// Settles the promise of an async call, or parks the call on the promise it now awaits.
fn settle_async_call(ctx: &mut EvalContext, mut activation: Activation, mark: usize, result: ValueResult) {
    let promise = activation.promise.clone();
    match result {
        Ok(v) => resolve_promise(ctx, &promise, v),
        Err(JErrorType::Suspended) => {
            let (frames, awaiting) = ctx.suspension.take_suspension(mark);
            match awaiting {
                Some(awaited) => {
                    activation.frames = frames;
                    subscribe_activation(ctx, &awaited, activation);
                }
                None => {
                    let reason = ctx.create_error("Error", &JErrorType::Suspended.to_string());
                    reject_promise(ctx, &promise, reason);
                }
            }
        }
        Err(e) => {
            let reason = ctx.error_to_value(e);
            reject_promise(ctx, &promise, reason);
        }
    }
}

fn execute_function_body(
    ctx: &mut EvalContext,
    data: &Rc<FunctionData>,
    func_env: &EnvRef,
    args: Vec<JsValue>,
) -> ValueResult {
    if data.uses_arguments && !data.is_arrow {
        let arguments = ctx.new_array(args.clone());
        func_env.borrow_mut().initialize_binding("arguments", arguments);
    }
    let mark = ctx.suspension.mark();
    if let Err(e) = bind_parameters(ctx, &data.params, func_env, args) {
        return Err(match e {
            JErrorType::Suspended => {
                ctx.suspension.take_suspension(mark);
                JErrorType::SyntaxError("Illegal await-expression in formal parameters of async function".to_string())
            }
            e => e,
        });
    }
    for name in &data.var_names {
        if !func_env.borrow().has_binding(name) {
            func_env.borrow_mut().initialize_binding(name, JsValue::Undefined);
        }
    }
    if let FunctionBodyOrExpression::FunctionBody(body) = &data.body {
        instantiate_declarations(&body.body, func_env, ctx);
    }
    evaluate_function_body(ctx, data)
}

/// Runs the statements (or the expression) of a body whose scope is already set up.
fn evaluate_function_body(ctx: &mut EvalContext, data: &Rc<FunctionData>) -> ValueResult {
    match &data.body {
        FunctionBodyOrExpression::Expression(e) => evaluate_expression(e, ctx),
        FunctionBodyOrExpression::FunctionBody(body) => {
            let completion = execute_statement_list(&body.body, ctx)?;
            match completion.completion_type {
                CompletionType::Return => Ok(completion.get_value()),
                CompletionType::Normal => Ok(JsValue::Undefined),
                CompletionType::Break => Err(JErrorType::SyntaxError("Illegal break statement".to_string())),
                CompletionType::Continue => Err(JErrorType::SyntaxError(
                    "Illegal continue statement: no surrounding iteration statement".to_string(),
                )),
            }
        }
    }
}

fn bind_parameters(
    ctx: &mut EvalContext,
    params: &[PatternType],
    env: &EnvRef,
    args: Vec<JsValue>,
) -> Result<(), JErrorType> {
    let mut args = args.into_iter();
    for param in params {
        match param {
            PatternType::RestElement { argument, .. } => {
                let rest = ctx.new_array(args.by_ref().collect());
                bind_pattern(argument, rest, BindingInit::Environment(env), ctx)?;
            }
            _ => {
                let value = args.next().unwrap_or(JsValue::Undefined);
                bind_pattern(param, value, BindingInit::Environment(env), ctx)?;
            }
        }
    }
    Ok(())
}

/// `Construct(F, args)`. `label` names the callee in the error message.
pub fn construct(ctx: &mut EvalContext, callee: &JsValue, args: Vec<JsValue>, label: &str) -> ValueResult {
    let o = match callee {
        JsValue::Object(o) if o.borrow().as_function().map_or(false, |f| f.is_constructor()) => o.clone(),
        _ => return Err(JErrorType::TypeError(format!("{} is not a constructor", label))),
    };
    if let Some(CallTarget::Bound {
        target,
        args: bound_args,
        ..
    }) = call_target(&o)
    {
        let mut all_args = bound_args;
        all_args.extend(args);
        return construct(ctx, &target, all_args, label);
    }
    let proto = match get_object_property(ctx, &o, "prototype") {
        JsValue::Object(p) => p,
        _ => ctx.prototype_of("Object"),
    };
    let instance = JsObject::new(ObjectKind::Ordinary, Some(proto));
    let this = JsValue::Object(instance.clone());
    let result = match call_target(&o) {
        Some(CallTarget::Native { func, .. }) => {
            if ctx.call_depth >= ctx.max_call_depth {
                return Err(JErrorType::RangeError("Maximum call stack size exceeded".to_string()));
            }
            ctx.call_depth += 1;
            let r = func(ctx, this, args);
            ctx.call_depth -= 1;
            r?
        }
        _ => call_function(ctx, callee, this, args)?,
    };
    match result {
        JsValue::Object(_) => Ok(result),
        _ => Ok(JsValue::Object(instance)),
    }
}

/// Short form of a value for error messages such as "x is not a function".
pub fn describe_value(v: &JsValue) -> String {
    match v {
        JsValue::String(s) => format!("\"{}\"", s),
        JsValue::Object(o) => {
            let o_ref = o.borrow();
            match o_ref.as_function() {
                Some(f) if !f.name.is_empty() => f.name.to_string(),
                _ => {
                    if o_ref.is_array() {
                        "object".to_string()
                    } else {
                        "#<Object>".to_string()
                    }
                }
            }
        }
        _ => to_string(v),
    }
}

pub fn is_callable(value: &JsValue) -> bool {
    value.is_callable()
}

pub fn is_constructor(value: &JsValue) -> bool {
    match value {
        JsValue::Object(o) => o.borrow().as_function().map_or(false, |f| f.is_constructor()),
        _ => false,
    }
}
