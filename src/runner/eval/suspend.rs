//! Pausing an async function body at `await` and picking it up again later.
//!
//! An `await` that has to wait stores the promise it waits on and fails with
//! [`JErrorType::Suspended`]. Each evaluator step the suspension unwinds through
//! records a [`Frame`] holding the progress it had made: the loop index, the
//! operands already evaluated, the scope it had entered. The frames and the
//! function's own scope form an [`Activation`].
//!
//! A promise reaction later resumes the activation. The body is entered again from
//! the top; every step on the recorded path takes its frame back, skips the work it
//! had already done, and descends into the same child. The `await` at the end of the
//! path receives the settled outcome in place of the promise.

use std::rc::Rc;

use crate::parser::ast::FunctionData;
use crate::runner::ds::env_record::EnvRef;
use crate::runner::ds::error::JErrorType;
use crate::runner::ds::object::JsObjectType;
use crate::runner::ds::value::JsValue;
use crate::runner::plugin::types::EvalContext;

use super::types::EvalResult;

/// Identity of an AST node: its address plus its type, so a node and its first field differ.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NodeKey(usize, &'static str);

impl NodeKey {
    pub fn of<T: ?Sized>(node: &T) -> Self {
        NodeKey((node as *const T).cast::<u8>() as usize, std::any::type_name::<T>())
    }
}

/// Progress of one evaluation step that was interrupted by `await`.
pub struct Frame {
    key: NodeKey,
    /// Which child was running. The meaning is private to the step that recorded it.
    pub step: usize,
    /// Position in a list of children: statements, elements, arguments, loop iterations.
    pub index: usize,
    /// Operands or partial results already computed.
    pub values: Vec<JsValue>,
    /// Completion value collected so far by statement lists and loops.
    pub value: Option<JsValue>,
    /// Scope that was current when the step suspended.
    pub env: Option<EnvRef>,
    pub keys: Vec<String>,
    /// Outcome a `try` statement holds back while its `finally` block runs.
    pub pending: Option<EvalResult>,
}

impl Frame {
    pub fn at<T: ?Sized>(node: &T, step: usize) -> Self {
        Frame {
            key: NodeKey::of(node),
            step,
            index: 0,
            values: Vec::new(),
            value: None,
            env: None,
            keys: Vec::new(),
            pending: None,
        }
    }

    pub fn with_index(mut self, index: usize) -> Self {
        self.index = index;
        self
    }

    pub fn with_values(mut self, values: Vec<JsValue>) -> Self {
        self.values = values;
        self
    }

    pub fn with_value(mut self, value: Option<JsValue>) -> Self {
        self.value = value;
        self
    }

    pub fn with_env(mut self, env: EnvRef) -> Self {
        self.env = Some(env);
        self
    }

    pub fn with_keys(mut self, keys: Vec<String>) -> Self {
        self.keys = keys;
        self
    }

    pub fn with_pending(mut self, pending: EvalResult) -> Self {
        self.pending = Some(pending);
        self
    }

    /// The value at `index` of [`Frame::values`], `undefined` if it was never stored.
    pub fn value_at(&self, index: usize) -> JsValue {
        self.values.get(index).cloned().unwrap_or(JsValue::Undefined)
    }
}

/// A suspended async function call, waiting for the promise it awaited.
pub struct Activation {
    pub function: JsObjectType,
    pub data: Rc<FunctionData>,
    pub this_value: JsValue,
    pub func_env: EnvRef,
    /// The promise the call returned to its caller.
    pub promise: JsObjectType,
    /// Innermost frame first.
    pub frames: Vec<Frame>,
}

/// How an awaited promise settled.
pub type AwaitOutcome = Result<JsValue, JsValue>;

/// Suspension bookkeeping carried by [`EvalContext`].
#[derive(Default)]
pub struct SuspendState {
    captured: Vec<Frame>,
    awaiting: Option<JsObjectType>,
    resuming: Vec<Frame>,
    outcome: Option<AwaitOutcome>,
}

impl SuspendState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Called by the `await` that suspends: remembers what it waits on.
    pub fn suspend_on(&mut self, promise: JsObjectType) -> JErrorType {
        self.awaiting = Some(promise);
        JErrorType::Suspended
    }

    pub fn record(&mut self, frame: Frame) {
        self.captured.push(frame);
    }

    /// Frames recorded since `mark`, plus the awaited promise. Clears both.
    pub fn take_suspension(&mut self, mark: usize) -> (Vec<Frame>, Option<JsObjectType>) {
        let frames = self.captured.split_off(mark.min(self.captured.len()));
        (frames, self.awaiting.take())
    }

    /// Current depth of the capture stack; pass it back to [`SuspendState::take_suspension`].
    pub fn mark(&self) -> usize {
        self.captured.len()
    }

    pub fn begin_resume(&mut self, frames: Vec<Frame>, outcome: AwaitOutcome) {
        self.resuming = frames;
        self.outcome = Some(outcome);
    }

    /// True while a resumed body is walking back down to its `await`.
    pub fn is_resuming(&self) -> bool {
        self.outcome.is_some()
    }

    /// Pops the frame recorded for `node`, if the resumed path continues through it.
    pub fn resume_frame<T: ?Sized>(&mut self, node: &T) -> Option<Frame> {
        if self.outcome.is_none() {
            return None;
        }
        match self.resuming.last() {
            Some(frame) if frame.key == NodeKey::of(node) => self.resuming.pop(),
            _ => None,
        }
    }

    /// Hands the settled outcome to the `await` that suspended.
    pub fn take_outcome(&mut self) -> Option<AwaitOutcome> {
        if !self.resuming.is_empty() {
            return None;
        }
        self.outcome.take()
    }

    /// Drops any resume state a body left behind.
    pub fn end_resume(&mut self) {
        self.resuming.clear();
        self.outcome = None;
    }
}

pub fn is_suspended<T>(result: &Result<T, JErrorType>) -> bool {
    matches!(result, Err(JErrorType::Suspended))
}

/// Records a frame when a suspension passes through the calling step.
///
/// The closure sees the context as it is after the child returned, so
/// `ctx.lex_env()` is the scope of the recording step itself.
pub trait OnSuspend<T> {
    fn on_suspend<F>(self, ctx: &mut EvalContext, frame: F) -> Result<T, JErrorType>
    where
        F: FnOnce(&EvalContext) -> Frame;
}

impl<T> OnSuspend<T> for Result<T, JErrorType> {
    fn on_suspend<F>(self, ctx: &mut EvalContext, frame: F) -> Result<T, JErrorType>
    where
        F: FnOnce(&EvalContext) -> Frame,
    {
        if is_suspended(&self) {
            let frame = frame(ctx);
            ctx.suspension.record(frame);
        }
        self
    }
}
