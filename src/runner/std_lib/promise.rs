//! Promise built-in.
//!
//! The constructor and combinators are thin wrappers over the settling and
//! reaction machinery in `eval::promise`; every callback runs as a microtask.

use std::cell::RefCell;
use std::rc::Rc;

use crate::runner::ds::error::JErrorType;
use crate::runner::ds::object::JsObjectType;
use crate::runner::ds::operations::object::iterate_to_vec;
use crate::runner::ds::promise_object::{PromiseAllState, PromiseReaction, ReactionHandler};
use crate::runner::ds::value::JsValue;
use crate::runner::eval::function::{call_function, describe_value};
use crate::runner::eval::promise::{
    create_resolving_functions, new_promise, perform_then, promise_resolve, reject_promise, resolve_promise,
};
use crate::runner::plugin::registry::BuiltInRegistry;
use crate::runner::plugin::types::{BuiltInObject, EvalContext};

use super::arg;

/// Register the Promise built-in with the registry.
pub fn register(registry: &mut BuiltInRegistry) {
    let promise = BuiltInObject::new("Promise")
        .with_constructor(promise_constructor)
        .add_static_method("resolve", promise_resolve_static)
        .add_static_method("reject", promise_reject_static)
        .add_static_method("all", promise_all)
        .add_static_method("race", promise_race)
        .add_method("then", promise_then)
        .add_method("catch", promise_catch)
        .add_method("finally", promise_finally);

    registry.register_object(promise);
}

fn this_promise(this: &JsValue, method: &str) -> Result<JsObjectType, JErrorType> {
    match this {
        JsValue::Object(o) if o.borrow().as_promise().is_some() => Ok(o.clone()),
        _ => Err(JErrorType::TypeError(format!(
            "Method Promise.prototype.{} called on incompatible receiver {}",
            method,
            describe_value(this)
        ))),
    }
}

fn reaction(capability: &JsObjectType, handler: ReactionHandler) -> PromiseReaction {
    PromiseReaction {
        capability: Some(capability.clone()),
        handler,
    }
}

/// Registers `on_fulfilled`/`on_rejected` on `promise` and returns the derived promise.
fn then(ctx: &mut EvalContext, promise: &JsObjectType, on_fulfilled: JsValue, on_rejected: JsValue) -> JsValue {
    let derived = new_promise(ctx);
    let fulfill_handler = if on_fulfilled.is_callable() {
        ReactionHandler::Callable(on_fulfilled)
    } else {
        ReactionHandler::Identity
    };
    let reject_handler = if on_rejected.is_callable() {
        ReactionHandler::Callable(on_rejected)
    } else {
        ReactionHandler::Thrower
    };
    perform_then(
        ctx,
        promise,
        reaction(&derived, fulfill_handler),
        reaction(&derived, reject_handler),
    );
    JsValue::Object(derived)
}

/// Promise constructor: runs the executor synchronously with fresh resolving functions.
fn promise_constructor(ctx: &mut EvalContext, this: JsValue, args: Vec<JsValue>) -> Result<JsValue, JErrorType> {
    if this.is_undefined() {
        return Err(JErrorType::TypeError(
            "Promise constructor cannot be invoked without 'new'".to_string(),
        ));
    }
    let executor = arg(&args, 0);
    if !executor.is_callable() {
        return Err(JErrorType::TypeError(format!(
            "Promise resolver {} is not a function",
            describe_value(&executor)
        )));
    }
    let promise = new_promise(ctx);
    let (resolve, reject) = create_resolving_functions(ctx, &promise);
    if let Err(e) = call_function(ctx, &executor, JsValue::Undefined, vec![resolve, reject.clone()]) {
        let reason = ctx.error_to_value(e);
        call_function(ctx, &reject, JsValue::Undefined, vec![reason])?;
    }
    Ok(JsValue::Object(promise))
}

/// Promise.resolve
fn promise_resolve_static(ctx: &mut EvalContext, _this: JsValue, args: Vec<JsValue>) -> Result<JsValue, JErrorType> {
    Ok(JsValue::Object(promise_resolve(ctx, arg(&args, 0))))
}

/// Promise.reject
fn promise_reject_static(ctx: &mut EvalContext, _this: JsValue, args: Vec<JsValue>) -> Result<JsValue, JErrorType> {
    let promise = new_promise(ctx);
    reject_promise(ctx, &promise, arg(&args, 0));
    Ok(JsValue::Object(promise))
}

/// Promise.all - fulfills with every value in input order, or rejects with the first reason.
fn promise_all(ctx: &mut EvalContext, _this: JsValue, args: Vec<JsValue>) -> Result<JsValue, JErrorType> {
    let aggregate = new_promise(ctx);
    let inputs = match iterate_to_vec(&arg(&args, 0), None) {
        Ok(values) => values,
        Err(e) => {
            let reason = ctx.error_to_value(e);
            reject_promise(ctx, &aggregate, reason);
            return Ok(JsValue::Object(aggregate));
        }
    };
    if inputs.is_empty() {
        let empty = ctx.new_array(vec![]);
        resolve_promise(ctx, &aggregate, empty);
        return Ok(JsValue::Object(aggregate));
    }
    let state = Rc::new(RefCell::new(PromiseAllState {
        values: vec![JsValue::Undefined; inputs.len()],
        remaining: inputs.len(),
        capability: aggregate.clone(),
    }));
    for (index, input) in inputs.into_iter().enumerate() {
        let element = promise_resolve(ctx, input);
        perform_then(
            ctx,
            &element,
            PromiseReaction {
                capability: None,
                handler: ReactionHandler::AllElement {
                    index,
                    state: state.clone(),
                },
            },
            reaction(&aggregate, ReactionHandler::Thrower),
        );
    }
    Ok(JsValue::Object(aggregate))
}

/// Promise.race - settles like whichever input settles first.
fn promise_race(ctx: &mut EvalContext, _this: JsValue, args: Vec<JsValue>) -> Result<JsValue, JErrorType> {
    let aggregate = new_promise(ctx);
    let inputs = match iterate_to_vec(&arg(&args, 0), None) {
        Ok(values) => values,
        Err(e) => {
            let reason = ctx.error_to_value(e);
            reject_promise(ctx, &aggregate, reason);
            return Ok(JsValue::Object(aggregate));
        }
    };
    for input in inputs {
        let element = promise_resolve(ctx, input);
        perform_then(
            ctx,
            &element,
            reaction(&aggregate, ReactionHandler::Identity),
            reaction(&aggregate, ReactionHandler::Thrower),
        );
    }
    Ok(JsValue::Object(aggregate))
}

/// Promise.prototype.then
fn promise_then(ctx: &mut EvalContext, this: JsValue, args: Vec<JsValue>) -> Result<JsValue, JErrorType> {
    let promise = this_promise(&this, "then")?;
    Ok(then(ctx, &promise, arg(&args, 0), arg(&args, 1)))
}

/// Promise.prototype.catch
fn promise_catch(ctx: &mut EvalContext, this: JsValue, args: Vec<JsValue>) -> Result<JsValue, JErrorType> {
    let promise = this_promise(&this, "catch")?;
    Ok(then(ctx, &promise, JsValue::Undefined, arg(&args, 0)))
}

/// Promise.prototype.finally
fn promise_finally(ctx: &mut EvalContext, this: JsValue, args: Vec<JsValue>) -> Result<JsValue, JErrorType> {
    let promise = this_promise(&this, "finally")?;
    let on_finally = arg(&args, 0);
    if !on_finally.is_callable() {
        return Ok(then(ctx, &promise, JsValue::Undefined, JsValue::Undefined));
    }
    let derived = new_promise(ctx);
    perform_then(
        ctx,
        &promise,
        reaction(&derived, ReactionHandler::Finally(on_finally.clone())),
        reaction(&derived, ReactionHandler::Finally(on_finally)),
    );
    Ok(JsValue::Object(derived))
}
