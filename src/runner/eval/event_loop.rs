//! The event loop that runs after the script body: microtasks first, then timers.

use log::{debug, warn};

use crate::runner::ds::error::JErrorType;
use crate::runner::ds::job_queue::{Job, Timer};
use crate::runner::ds::promise_object::PromiseState;
use crate::runner::ds::operations::type_conversion::to_string;
use crate::runner::ds::value::JsValue;
use crate::runner::plugin::types::EvalContext;

use super::function::call_function;
use super::promise::{run_reaction_job, run_resolve_thenable_job};

/// Upper bound on timer callbacks run by one [`drain`], so a self-rescheduling
/// `setTimeout` chain cannot keep a run alive forever.
pub const MAX_TIMER_TASKS: usize = 10_000;

/// Runs queued work until both queues are empty, then reports rejections nobody handled.
pub fn drain(ctx: &mut EvalContext) {
    let mut timers_run = 0;
    loop {
        while let Some(job) = ctx.jobs.next_microtask() {
            run_job(ctx, job);
        }
        if timers_run >= MAX_TIMER_TASKS {
            warn!(
                "Stopped after {} timer callbacks, {} timers still pending",
                timers_run,
                ctx.jobs.pending_timers()
            );
            break;
        }
        match ctx.jobs.next_timer() {
            Some(timer) => {
                timers_run += 1;
                run_timer(ctx, timer);
            }
            None => break,
        }
    }
    debug!("event loop drained after {} timer callbacks", timers_run);
    report_unhandled_rejections(ctx);
}

fn run_job(ctx: &mut EvalContext, job: Job) {
    match job {
        Job::PromiseReaction {
            reaction,
            argument,
            rejected,
        } => run_reaction_job(ctx, reaction, argument, rejected),
        Job::ResolveThenable {
            promise,
            thenable,
            then,
        } => run_resolve_thenable_job(ctx, promise, thenable, then),
    }
}

fn run_timer(ctx: &mut EvalContext, timer: Timer) {
    debug!("timer {} fired at {}ms", timer.id, timer.due);
    // Re-armed first, so the callback itself can clear the interval.
    ctx.jobs.rearm(&timer);
    if let Err(e) = call_function(ctx, &timer.callback, JsValue::Undefined, timer.args) {
        report_uncaught(ctx, e);
    }
}

/// Logs an error that escaped a deferred callback. It never reaches the run's result.
pub fn report_uncaught(ctx: &mut EvalContext, e: JErrorType) {
    if let JErrorType::Suspended = e {
        return;
    }
    let value = ctx.error_to_value(e);
    warn!("Uncaught {}", to_string(&value));
}

fn report_unhandled_rejections(ctx: &mut EvalContext) {
    for promise in ctx.jobs.take_rejections() {
        let p = promise.borrow();
        if let Some(record) = p.as_promise() {
            if let (false, PromiseState::Rejected(reason)) = (record.is_handled, &record.state) {
                warn!("Uncaught (in promise) {}", to_string(reason));
            }
        }
    }
}
