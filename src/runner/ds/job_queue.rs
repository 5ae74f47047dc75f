use std::collections::VecDeque;

use crate::runner::ds::object::JsObjectType;
use crate::runner::ds::promise_object::PromiseReaction;
use crate::runner::ds::value::JsValue;

pub enum Job {
    PromiseReaction {
        reaction: PromiseReaction,
        argument: JsValue,
        rejected: bool,
    },
    /// Adopts the state of a thenable that a promise was resolved with.
    ResolveThenable {
        promise: JsObjectType,
        thenable: JsValue,
        then: JsValue,
    },
}

pub struct Timer {
    pub id: u32,
    pub due: u64,
    seq: u64,
    pub callback: JsValue,
    pub args: Vec<JsValue>,
    /// Period of a `setInterval` timer.
    pub interval: Option<u64>,
}

/// Microtasks plus `setTimeout`/`setInterval` timers on a virtual millisecond clock.
///
/// Timers never sleep: taking the next timer advances the clock straight to its due time.
/// Timers due at the same instant fire in creation order.
pub struct JobQueue {
    microtasks: VecDeque<Job>,
    timers: Vec<Timer>,
    now: u64,
    next_timer_id: u32,
    next_seq: u64,
    rejections: Vec<JsObjectType>,
}

impl JobQueue {
    pub fn new() -> Self {
        JobQueue {
            microtasks: VecDeque::new(),
            timers: Vec::new(),
            now: 0,
            next_timer_id: 1,
            next_seq: 0,
            rejections: Vec::new(),
        }
    }

    pub fn now(&self) -> u64 {
        self.now
    }

    pub fn enqueue_microtask(&mut self, job: Job) {
        self.microtasks.push_back(job);
    }

    pub fn next_microtask(&mut self) -> Option<Job> {
        self.microtasks.pop_front()
    }

    pub fn add_timer(&mut self, delay: u64, callback: JsValue, args: Vec<JsValue>) -> u32 {
        self.schedule(delay, None, callback, args)
    }

    /// Repeats every `period` ms, at least 1, until cleared.
    pub fn add_interval(&mut self, period: u64, callback: JsValue, args: Vec<JsValue>) -> u32 {
        let period = period.max(1);
        self.schedule(period, Some(period), callback, args)
    }

    fn schedule(&mut self, delay: u64, interval: Option<u64>, callback: JsValue, args: Vec<JsValue>) -> u32 {
        let id = self.next_timer_id;
        self.next_timer_id += 1;
        self.push_timer(id, delay, interval, callback, args);
        id
    }

    fn push_timer(&mut self, id: u32, delay: u64, interval: Option<u64>, callback: JsValue, args: Vec<JsValue>) {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.timers.push(Timer {
            id,
            due: self.now + delay,
            seq,
            callback,
            args,
            interval,
        });
    }

    /// Re-arms an interval timer that just fired, keeping its id so it can still be cleared.
    pub fn rearm(&mut self, timer: &Timer) {
        if let Some(period) = timer.interval {
            self.push_timer(timer.id, period, Some(period), timer.callback.clone(), timer.args.clone());
        }
    }

    pub fn clear_timer(&mut self, id: u32) -> bool {
        let before = self.timers.len();
        self.timers.retain(|t| t.id != id);
        before != self.timers.len()
    }

    pub fn next_timer(&mut self) -> Option<Timer> {
        let (index, _) = self
            .timers
            .iter()
            .enumerate()
            .min_by_key(|(_, t)| (t.due, t.seq))?;
        let timer = self.timers.remove(index);
        if timer.due > self.now {
            self.now = timer.due;
        }
        Some(timer)
    }

    pub fn pending_timers(&self) -> usize {
        self.timers.len()
    }

    pub fn is_idle(&self) -> bool {
        self.microtasks.is_empty() && self.timers.is_empty()
    }

    /// Remembers a promise that was rejected while nothing was listening.
    pub fn track_rejection(&mut self, promise: JsObjectType) {
        self.rejections.push(promise);
    }

    pub fn take_rejections(&mut self) -> Vec<JsObjectType> {
        std::mem::take(&mut self.rejections)
    }
}

impl Default for JobQueue {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timers_fire_by_due_time_then_creation_order() {
        let mut queue = JobQueue::new();
        let late = queue.add_timer(100, JsValue::Undefined, vec![]);
        let first = queue.add_timer(0, JsValue::Undefined, vec![]);
        let second = queue.add_timer(0, JsValue::Undefined, vec![]);
        let order: Vec<u32> = std::iter::from_fn(|| queue.next_timer().map(|t| t.id)).collect();
        assert_eq!(order, vec![first, second, late]);
        assert_eq!(queue.now(), 100);
        assert!(queue.is_idle());
    }

    #[test]
    fn test_cleared_timer_never_fires() {
        let mut queue = JobQueue::new();
        let id = queue.add_timer(10, JsValue::Undefined, vec![]);
        assert!(queue.clear_timer(id));
        assert!(!queue.clear_timer(id));
        assert!(queue.next_timer().is_none());
    }

    #[test]
    fn test_interval_rearms_with_same_id() {
        let mut queue = JobQueue::new();
        let id = queue.add_interval(30, JsValue::Undefined, vec![]);
        let once = queue.add_timer(45, JsValue::Undefined, vec![]);
        let mut fired = vec![];
        while let Some(timer) = queue.next_timer() {
            fired.push((timer.id, queue.now()));
            queue.rearm(&timer);
            if fired.len() == 4 {
                assert!(queue.clear_timer(id));
            }
            if fired.len() > 10 {
                break;
            }
        }
        assert_eq!(fired, vec![(id, 30), (once, 45), (id, 60), (id, 90)]);
    }
}
