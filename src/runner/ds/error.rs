use std::fmt;

use crate::runner::ds::value::JsValue;

/// An abrupt completion raised while evaluating script code.
///
/// The native variants carry the message a browser would put in `error.message`;
/// they are turned into real error objects when script code catches them.
#[derive(Debug, Clone)]
pub enum JErrorType {
    ReferenceError(String),
    TypeError(String),
    RangeError(String),
    SyntaxError(String),
    /// A value thrown by `throw` or a rejected promise.
    Thrown(JsValue),
    /// An `await` is waiting. Unwinds to the enclosing async function call, which
    /// returns its promise and resumes the body once the awaited value settles.
    Suspended,
}

impl JErrorType {
    pub fn name(&self) -> &'static str {
        match self {
            JErrorType::ReferenceError(_) => "ReferenceError",
            JErrorType::TypeError(_) => "TypeError",
            JErrorType::RangeError(_) => "RangeError",
            JErrorType::SyntaxError(_) => "SyntaxError",
            JErrorType::Thrown(_) => "Error",
            JErrorType::Suspended => "Suspended",
        }
    }
}

impl fmt::Display for JErrorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JErrorType::ReferenceError(m)
            | JErrorType::TypeError(m)
            | JErrorType::RangeError(m)
            | JErrorType::SyntaxError(m) => write!(f, "{}", m),
            JErrorType::Thrown(v) => write!(f, "{}", v),
            JErrorType::Suspended => write!(f, "execution suspended at await"),
        }
    }
}

impl std::error::Error for JErrorType {}
