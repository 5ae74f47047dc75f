use std::cell::RefCell;
use std::rc::Rc;

use crate::runner::ds::object::JsObjectType;
use crate::runner::ds::value::JsValue;
use crate::runner::eval::suspend::Activation;

#[derive(Debug, Clone)]
pub enum PromiseState {
    Pending,
    Fulfilled(JsValue),
    Rejected(JsValue),
}

/// Shared bookkeeping for one `Promise.all` call.
pub struct PromiseAllState {
    pub values: Vec<JsValue>,
    pub remaining: usize,
    pub capability: JsObjectType,
}

pub enum ReactionHandler {
    /// Pass the settled value through unchanged.
    Identity,
    /// Re-throw the settled reason unchanged.
    Thrower,
    Callable(JsValue),
    /// Runs the callback, then settles with the original outcome.
    Finally(JsValue),
    AllElement {
        index: usize,
        state: Rc<RefCell<PromiseAllState>>,
    },
    /// Continues an async function suspended on this promise. Shared by both
    /// reactions; whichever runs takes the activation.
    Resume(Rc<RefCell<Option<Activation>>>),
}

pub struct PromiseReaction {
    /// The derived promise returned by `then`, settled with the handler's outcome.
    pub capability: Option<JsObjectType>,
    pub handler: ReactionHandler,
}

pub struct PromiseRecord {
    pub state: PromiseState,
    pub fulfill_reactions: Vec<PromiseReaction>,
    pub reject_reactions: Vec<PromiseReaction>,
    pub is_handled: bool,
}

impl PromiseRecord {
    pub fn new() -> Self {
        PromiseRecord {
            state: PromiseState::Pending,
            fulfill_reactions: Vec::new(),
            reject_reactions: Vec::new(),
            is_handled: false,
        }
    }

    pub fn is_pending(&self) -> bool {
        matches!(self.state, PromiseState::Pending)
    }
}

impl Default for PromiseRecord {
    fn default() -> Self {
        Self::new()
    }
}
