//! The outcome of one snippet run.

use std::fmt;

/// What a run produced. Immutable once built; a new run replaces it wholesale.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExecutionResult {
    /// The snippet completed. `message` is the captured lines joined with `\n`,
    /// or the no-output placeholder when nothing was printed.
    Success {
        captured_lines: Vec<String>,
        message: String,
    },
    /// The snippet failed to parse or threw.
    Failure { message: String },
}

impl ExecutionResult {
    pub fn success(captured_lines: Vec<String>, placeholder: &str) -> Self {
        let message = if captured_lines.is_empty() {
            placeholder.to_string()
        } else {
            captured_lines.join("\n")
        };
        ExecutionResult::Success {
            captured_lines,
            message,
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        ExecutionResult::Failure {
            message: message.into(),
        }
    }

    pub fn message(&self) -> &str {
        match self {
            ExecutionResult::Success { message, .. } | ExecutionResult::Failure { message } => message,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, ExecutionResult::Success { .. })
    }

    /// Lines printed by the run. Empty for failures.
    pub fn captured_lines(&self) -> &[String] {
        match self {
            ExecutionResult::Success { captured_lines, .. } => captured_lines,
            ExecutionResult::Failure { .. } => &[],
        }
    }
}

impl fmt::Display for ExecutionResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExecutionResult::Success { message, .. } => write!(f, "{}", message),
            ExecutionResult::Failure { message } => write!(f, "Error: {}", message),
        }
    }
}
