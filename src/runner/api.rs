//! Entry points for running a whole script in an [`EvalContext`].

use std::fmt;

use log::debug;

use crate::parser::ast::ProgramData;
use crate::parser::{JsError, JsParser};
use crate::runner::ds::error::JErrorType;
use crate::runner::ds::value::JsValue;
use crate::runner::eval::event_loop::drain;
use crate::runner::eval::statement::{execute_statement_list, instantiate_declarations};
use crate::runner::eval::CompletionType;
use crate::runner::plugin::types::EvalContext;

/// Why a script did not run to completion.
#[derive(Debug, Clone)]
pub enum RunError {
    /// The source did not parse; nothing ran.
    Parse(JsError),
    /// The script body threw, or hit an early error at runtime.
    Runtime(JErrorType),
}

impl fmt::Display for RunError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunError::Parse(e) => write!(f, "SyntaxError: {} ({}:{})", e.message, e.line, e.column),
            RunError::Runtime(e) => write!(f, "{}: {}", e.name(), e),
        }
    }
}

impl std::error::Error for RunError {}

impl From<JsError> for RunError {
    fn from(e: JsError) -> Self {
        RunError::Parse(e)
    }
}

impl From<JErrorType> for RunError {
    fn from(e: JErrorType) -> Self {
        RunError::Runtime(e)
    }
}

/// Parses and runs `source`, then drains the event loop.
/// Returns the completion value of the script body.
pub fn run_source(source: &str, ctx: &mut EvalContext) -> Result<JsValue, RunError> {
    let program = JsParser::parse_to_ast_from_str(source)?;
    debug!("parsed {} top-level statements", program.body.len());
    run_program(&program, ctx)
}

/// Runs an already parsed script in the global scope of `ctx`.
///
/// Queued promise reactions and timers run after the body completes normally.
/// When the body throws, they are dropped along with the rest of the run.
pub fn run_program(program: &ProgramData, ctx: &mut EvalContext) -> Result<JsValue, RunError> {
    let global_env = ctx.global_env.clone();
    for name in &program.var_names {
        if !global_env.borrow().has_binding(name) {
            global_env.borrow_mut().initialize_binding(name, JsValue::Undefined);
        }
    }
    instantiate_declarations(&program.body, &global_env, ctx);

    let completion = execute_statement_list(&program.body, ctx)?;
    match completion.completion_type {
        CompletionType::Normal => {}
        CompletionType::Return => {
            return Err(JErrorType::SyntaxError("Illegal return statement".to_string()).into())
        }
        CompletionType::Break => return Err(JErrorType::SyntaxError("Illegal break statement".to_string()).into()),
        CompletionType::Continue => {
            return Err(JErrorType::SyntaxError(
                "Illegal continue statement: no surrounding iteration statement".to_string(),
            )
            .into())
        }
    }
    debug!("script body finished, draining event loop");
    drain(ctx);
    Ok(completion.value.unwrap_or(JsValue::Undefined))
}
