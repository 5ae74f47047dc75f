//! Timer and microtask globals: `setTimeout`, `setInterval`, their `clear`
//! counterparts and `queueMicrotask`.
//!
//! Timers run on the job queue's virtual clock, so a `setTimeout(f, 1000)`
//! fires as soon as everything due before it has run.

use crate::runner::ds::error::JErrorType;
use crate::runner::ds::job_queue::Job;
use crate::runner::ds::operations::type_conversion::to_number;
use crate::runner::ds::promise_object::{PromiseReaction, ReactionHandler};
use crate::runner::ds::value::JsValue;
use crate::runner::eval::function::describe_value;
use crate::runner::plugin::registry::BuiltInRegistry;
use crate::runner::plugin::types::EvalContext;

use super::arg;

/// Register the timer functions with the registry.
pub fn register(registry: &mut BuiltInRegistry) {
    registry.register_function("setTimeout", set_timeout);
    registry.register_function("clearTimeout", clear_timeout);
    registry.register_function("setInterval", set_interval);
    registry.register_function("clearInterval", clear_timeout);
    registry.register_function("queueMicrotask", queue_microtask);
}

/// Milliseconds from a delay argument; anything not a positive number means 0.
fn delay_of(v: &JsValue) -> u64 {
    let ms = to_number(v);
    if ms.is_nan() || ms <= 0.0 {
        0
    } else {
        ms.min(u32::MAX as f64) as u64
    }
}

/// setTimeout(callback, delay, ...args). A non-callable callback schedules nothing.
fn set_timeout(ctx: &mut EvalContext, _this: JsValue, args: Vec<JsValue>) -> Result<JsValue, JErrorType> {
    let callback = arg(&args, 0);
    if !callback.is_callable() {
        return Ok(JsValue::from_i64(0));
    }
    let delay = delay_of(&arg(&args, 1));
    let extra: Vec<JsValue> = args.into_iter().skip(2).collect();
    let id = ctx.jobs.add_timer(delay, callback, extra);
    Ok(JsValue::from_i64(id as i64))
}

/// setInterval(callback, period, ...args). Runs until cleared or until the event
/// loop's timer budget runs out.
fn set_interval(ctx: &mut EvalContext, _this: JsValue, args: Vec<JsValue>) -> Result<JsValue, JErrorType> {
    let callback = arg(&args, 0);
    if !callback.is_callable() {
        return Ok(JsValue::from_i64(0));
    }
    let period = delay_of(&arg(&args, 1));
    let extra: Vec<JsValue> = args.into_iter().skip(2).collect();
    let id = ctx.jobs.add_interval(period, callback, extra);
    Ok(JsValue::from_i64(id as i64))
}

/// clearTimeout(id) and clearInterval(id); both share one id space. Unknown ids are ignored.
fn clear_timeout(ctx: &mut EvalContext, _this: JsValue, args: Vec<JsValue>) -> Result<JsValue, JErrorType> {
    let id = to_number(&arg(&args, 0));
    if id.is_finite() && id >= 0.0 {
        ctx.jobs.clear_timer(id as u32);
    }
    Ok(JsValue::Undefined)
}

/// queueMicrotask(callback)
fn queue_microtask(ctx: &mut EvalContext, _this: JsValue, args: Vec<JsValue>) -> Result<JsValue, JErrorType> {
    let callback = arg(&args, 0);
    if !callback.is_callable() {
        return Err(JErrorType::TypeError(format!(
            "Failed to execute 'queueMicrotask' on 'Window': parameter 1 is not of type 'Function'. Received {}",
            describe_value(&callback)
        )));
    }
    ctx.jobs.enqueue_microtask(Job::PromiseReaction {
        reaction: PromiseReaction {
            capability: None,
            handler: ReactionHandler::Callable(callback),
        },
        argument: JsValue::Undefined,
        rejected: false,
    });
    Ok(JsValue::Undefined)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_delay_of_clamps_to_zero() {
        assert_eq!(delay_of(&JsValue::Undefined), 0);
        assert_eq!(delay_of(&JsValue::from_i64(-5)), 0);
        assert_eq!(delay_of(&JsValue::String("25".to_string())), 25);
        assert_eq!(delay_of(&JsValue::from_f64(10.7)), 10);
    }
}
