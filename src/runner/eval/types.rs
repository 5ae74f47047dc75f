//! Completion records produced by statement evaluation.
//!
//! Throws never appear here; they travel as `Err(JErrorType)`.

use crate::runner::ds::error::JErrorType;
use crate::runner::ds::value::JsValue;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CompletionType {
    Normal,
    Return,
    /// Unlabelled `break`; loops and `switch` consume it.
    Break,
    /// Unlabelled `continue`; only loops consume it.
    Continue,
}

/// How a statement finished, plus the value it produced (if any).
///
/// `value` is `None` for an "empty" completion so that statement lists can
/// keep the last non-empty value as the script's completion value.
#[derive(Debug, Clone)]
pub struct Completion {
    pub completion_type: CompletionType,
    pub value: Option<JsValue>,
}

impl Completion {
    pub fn of(completion_type: CompletionType, value: Option<JsValue>) -> Self {
        Completion { completion_type, value }
    }

    pub fn empty() -> Self {
        Self::of(CompletionType::Normal, None)
    }

    pub fn with_value(value: JsValue) -> Self {
        Self::of(CompletionType::Normal, Some(value))
    }

    pub fn returning(value: JsValue) -> Self {
        Self::of(CompletionType::Return, Some(value))
    }

    pub fn jump(completion_type: CompletionType) -> Self {
        Self::of(completion_type, None)
    }

    pub fn is_abrupt(&self) -> bool {
        self.completion_type != CompletionType::Normal
    }

    pub fn get_value(&self) -> JsValue {
        self.value.clone().unwrap_or(JsValue::Undefined)
    }

    /// `UpdateEmpty`: an empty completion takes `value`, a filled one keeps its own.
    pub fn update_empty(mut self, value: Option<JsValue>) -> Self {
        if self.value.is_none() {
            self.value = value;
        }
        self
    }
}

pub type EvalResult = Result<Completion, JErrorType>;

pub type ValueResult = Result<JsValue, JErrorType>;
