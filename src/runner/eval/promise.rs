//! Promise machinery: settling, reactions and the promise side of `await`.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use crate::runner::ds::error::JErrorType;
use crate::runner::ds::function_object::{FunctionKind, FunctionObject};
use crate::runner::ds::job_queue::Job;
use crate::runner::ds::object::{JsObject, JsObjectType, ObjectKind};
use crate::runner::ds::operations::object::get_object_property;
use crate::runner::ds::promise_object::{PromiseReaction, PromiseRecord, PromiseState, ReactionHandler};
use crate::runner::ds::value::JsValue;
use crate::runner::plugin::types::EvalContext;

use super::event_loop::report_uncaught;
use super::function::{call_function, resume_async_function};
use super::suspend::Activation;
use super::types::ValueResult;

pub fn new_promise(ctx: &mut EvalContext) -> JsObjectType {
    let proto = ctx.prototype_of("Promise");
    JsObject::new(ObjectKind::Promise(PromiseRecord::new()), Some(proto))
}

pub fn is_promise(v: &JsValue) -> bool {
    match v {
        JsValue::Object(o) => o.borrow().as_promise().is_some(),
        _ => false,
    }
}

/// The `resolve`/`reject` pair for `promise`. Only the first call of either has an effect.
pub fn create_resolving_functions(ctx: &mut EvalContext, promise: &JsObjectType) -> (JsValue, JsValue) {
    let already_resolved = Rc::new(Cell::new(false));
    let mut make = |reject: bool| {
        let f = FunctionObject {
            name: String::new(),
            length: 1,
            kind: FunctionKind::PromiseResolver {
                promise: promise.clone(),
                reject,
                already_resolved: already_resolved.clone(),
            },
        };
        JsValue::Object(ctx.new_function_object(f))
    };
    let resolve = make(false);
    let reject = make(true);
    (resolve, reject)
}

/// Resolves `promise` with `value`, adopting the state of `value` when it is a thenable.
pub fn resolve_promise(ctx: &mut EvalContext, promise: &JsObjectType, value: JsValue) {
    if let JsValue::Object(o) = &value {
        if Rc::ptr_eq(o, promise) {
            let reason = ctx.create_error("TypeError", "Chaining cycle detected for promise #<Promise>");
            reject_promise(ctx, promise, reason);
            return;
        }
        let then = get_object_property(ctx, o, "then");
        if then.is_callable() {
            ctx.jobs.enqueue_microtask(Job::ResolveThenable {
                promise: promise.clone(),
                thenable: value.clone(),
                then,
            });
            return;
        }
    }
    fulfill_promise(ctx, promise, value);
}

pub fn fulfill_promise(ctx: &mut EvalContext, promise: &JsObjectType, value: JsValue) {
    let reactions = {
        let mut p = promise.borrow_mut();
        let record = match p.as_promise_mut() {
            Some(r) if r.is_pending() => r,
            _ => return,
        };
        record.state = PromiseState::Fulfilled(value.clone());
        record.reject_reactions.clear();
        std::mem::take(&mut record.fulfill_reactions)
    };
    trigger_reactions(ctx, reactions, value, false);
}

pub fn reject_promise(ctx: &mut EvalContext, promise: &JsObjectType, reason: JsValue) {
    let (reactions, handled) = {
        let mut p = promise.borrow_mut();
        let record = match p.as_promise_mut() {
            Some(r) if r.is_pending() => r,
            _ => return,
        };
        record.state = PromiseState::Rejected(reason.clone());
        record.fulfill_reactions.clear();
        (std::mem::take(&mut record.reject_reactions), record.is_handled)
    };
    if !handled {
        ctx.jobs.track_rejection(promise.clone());
    }
    trigger_reactions(ctx, reactions, reason, true);
}

fn trigger_reactions(ctx: &mut EvalContext, reactions: Vec<PromiseReaction>, argument: JsValue, rejected: bool) {
    for reaction in reactions {
        ctx.jobs.enqueue_microtask(Job::PromiseReaction {
            reaction,
            argument: argument.clone(),
            rejected,
        });
    }
}

/// `PerformPromiseThen`: registers both reactions, or queues the matching one if already settled.
pub fn perform_then(
    ctx: &mut EvalContext,
    promise: &JsObjectType,
    on_fulfilled: PromiseReaction,
    on_rejected: PromiseReaction,
) {
    let settled = {
        let mut p = promise.borrow_mut();
        let record = match p.as_promise_mut() {
            Some(r) => r,
            None => return,
        };
        record.is_handled = true;
        match &record.state {
            PromiseState::Pending => {
                record.fulfill_reactions.push(on_fulfilled);
                record.reject_reactions.push(on_rejected);
                return;
            }
            PromiseState::Fulfilled(v) => (on_fulfilled, v.clone(), false),
            PromiseState::Rejected(r) => (on_rejected, r.clone(), true),
        }
    };
    let (reaction, argument, rejected) = settled;
    ctx.jobs.enqueue_microtask(Job::PromiseReaction {
        reaction,
        argument,
        rejected,
    });
}

/// `Promise.resolve(value)`: promises pass through, anything else is wrapped.
pub fn promise_resolve(ctx: &mut EvalContext, value: JsValue) -> JsObjectType {
    if let JsValue::Object(o) = &value {
        if o.borrow().as_promise().is_some() {
            return o.clone();
        }
    }
    let promise = new_promise(ctx);
    resolve_promise(ctx, &promise, value);
    promise
}

pub fn run_reaction_job(ctx: &mut EvalContext, reaction: PromiseReaction, argument: JsValue, rejected: bool) {
    let PromiseReaction { capability, handler } = reaction;
    let outcome = match handler {
        ReactionHandler::Identity => Ok(argument),
        ReactionHandler::Thrower => Err(argument),
        ReactionHandler::Callable(f) => match call_function(ctx, &f, JsValue::Undefined, vec![argument]) {
            Ok(v) => Ok(v),
            Err(e) => Err(ctx.error_to_value(e)),
        },
        ReactionHandler::Finally(f) => match call_function(ctx, &f, JsValue::Undefined, vec![]) {
            Ok(_) if rejected => Err(argument),
            Ok(_) => Ok(argument),
            Err(e) => Err(ctx.error_to_value(e)),
        },
        ReactionHandler::Resume(slot) => {
            let activation = slot.borrow_mut().take();
            if let Some(activation) = activation {
                let outcome = if rejected { Err(argument) } else { Ok(argument) };
                resume_async_function(ctx, activation, outcome);
            }
            return;
        }
        ReactionHandler::AllElement { index, state } => {
            let finished = {
                let mut s = state.borrow_mut();
                if let Some(slot) = s.values.get_mut(index) {
                    *slot = argument;
                }
                s.remaining = s.remaining.saturating_sub(1);
                if s.remaining == 0 {
                    Some((s.values.clone(), s.capability.clone()))
                } else {
                    None
                }
            };
            if let Some((values, aggregate)) = finished {
                let array = ctx.new_array(values);
                resolve_promise(ctx, &aggregate, array);
            }
            return;
        }
    };
    match (capability, outcome) {
        (Some(derived), Ok(v)) => resolve_promise(ctx, &derived, v),
        (Some(derived), Err(r)) => reject_promise(ctx, &derived, r),
        (None, Ok(_)) => {}
        (None, Err(r)) => report_uncaught(ctx, JErrorType::Thrown(r)),
    }
}

/// Calls `thenable.then(resolve, reject)` on behalf of a promise resolved with it.
pub fn run_resolve_thenable_job(ctx: &mut EvalContext, promise: JsObjectType, thenable: JsValue, then: JsValue) {
    let (resolve, reject) = create_resolving_functions(ctx, &promise);
    if let Err(e) = call_function(ctx, &then, thenable, vec![resolve, reject.clone()]) {
        let reason = ctx.error_to_value(e);
        if let Err(e) = call_function(ctx, &reject, JsValue::Undefined, vec![reason]) {
            report_uncaught(ctx, e);
        }
    }
}

/// `await value` on the way down: stores the promise to wait on and suspends the body.
///
/// The enclosing async call turns the suspension into an [`Activation`] and
/// subscribes it with [`subscribe_activation`].
pub fn await_value(ctx: &mut EvalContext, value: JsValue) -> ValueResult {
    let promise = promise_resolve(ctx, value);
    Err(ctx.suspension.suspend_on(promise))
}

/// Resumes `activation` from a microtask once `promise` settles.
pub fn subscribe_activation(ctx: &mut EvalContext, promise: &JsObjectType, activation: Activation) {
    let slot = Rc::new(RefCell::new(Some(activation)));
    perform_then(
        ctx,
        promise,
        PromiseReaction {
            capability: None,
            handler: ReactionHandler::Resume(slot.clone()),
        },
        PromiseReaction {
            capability: None,
            handler: ReactionHandler::Resume(slot),
        },
    );
}
