//! The execution engine: evaluates one snippet and reports what it printed or threw.

use std::thread;

use log::{debug, info, warn};

use crate::runner::api::{run_source, RunError};
use crate::runner::plugin::registry::BuiltInRegistry;
use crate::runner::plugin::types::EvalContext;

use super::config::SandboxConfig;
use super::console::ConsoleCapture;
use super::result::ExecutionResult;

/// Runs snippets. Every run gets a fresh interpreter, so runs never see each other's globals.
#[derive(Debug, Clone, Default)]
pub struct ExecutionEngine {
    config: SandboxConfig,
}

impl ExecutionEngine {
    pub fn new(config: SandboxConfig) -> Self {
        ExecutionEngine { config }
    }

    pub fn config(&self) -> &SandboxConfig {
        &self.config
    }

    /// Evaluates `source` and blocks until it and everything it scheduled has finished.
    ///
    /// Never fails: parse errors, thrown values and interpreter panics all come
    /// back as [`ExecutionResult::Failure`]. There is no timeout, so a snippet
    /// that loops forever never returns.
    pub fn run(&self, source: &str) -> ExecutionResult {
        debug!("running snippet ({} bytes)", source.len());
        let outcome = thread::scope(|scope| {
            let spawned = thread::Builder::new()
                .name("tryit-eval".to_string())
                .stack_size(self.config.stack_size)
                .spawn_scoped(scope, || self.evaluate(source));
            match spawned {
                Ok(handle) => handle.join().ok(),
                Err(e) => {
                    warn!("could not spawn evaluation thread, evaluating inline: {}", e);
                    Some(self.evaluate(source))
                }
            }
        });
        let result = outcome.unwrap_or_else(|| {
            warn!("evaluation thread panicked");
            ExecutionResult::failure(self.config.error_fallback_message.clone())
        });
        info!(
            "snippet {}: {}",
            if result.is_success() { "succeeded" } else { "failed" },
            result.message()
        );
        result
    }

    /// Evaluates on the current thread with a fresh context.
    pub fn evaluate(&self, source: &str) -> ExecutionResult {
        let mut ctx = EvalContext::with_registry(BuiltInRegistry::with_core());
        ctx.max_call_depth = self.config.max_call_depth;
        if let Some(seed) = self.config.random_seed {
            ctx.set_random_seed(seed);
        }
        if let Some(ms) = self.config.start_time_ms {
            ctx.set_start_time(ms);
        }

        let mut capture = ConsoleCapture::install(&mut ctx);
        match run_source(source, &mut capture) {
            Ok(_) => ExecutionResult::success(capture.lines(), &self.config.no_output_message),
            Err(RunError::Parse(e)) => {
                debug!("parse error at {}:{}: {}", e.line, e.column, e.message);
                ExecutionResult::failure(e.message)
            }
            Err(RunError::Runtime(e)) => {
                debug!("snippet threw {}", e.name());
                let message = capture
                    .error_message(&e)
                    .unwrap_or_else(|| self.config.error_fallback_message.clone());
                ExecutionResult::failure(message)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(source: &str) -> ExecutionResult {
        ExecutionEngine::default().run(source)
    }

    #[test]
    fn test_captures_lines() {
        assert_eq!(run("console.log('a', 1); console.log(true);").message(), "a 1\ntrue");
    }

    #[test]
    fn test_placeholder_without_output() {
        assert_eq!(run("var x = 2;"), ExecutionResult::success(vec![], "Code executed successfully (no output)"));
    }

    #[test]
    fn test_error_message() {
        assert_eq!(run("throw new TypeError('bad')"), ExecutionResult::failure("bad"));
    }

    #[test]
    fn test_non_error_throw_uses_fallback() {
        assert_eq!(run("throw 42;"), ExecutionResult::failure("An error occurred"));
        assert_eq!(run("throw { message: 'x' };"), ExecutionResult::failure("An error occurred"));
    }

    #[test]
    fn test_custom_messages() {
        let engine = ExecutionEngine::new(
            SandboxConfig::default()
                .with_no_output_message("nothing")
                .with_error_fallback_message("nope"),
        );
        assert_eq!(engine.run("1 + 1;").message(), "nothing");
        assert_eq!(engine.run("throw 'x';").message(), "nope");
    }

    #[test]
    fn test_output_is_lost_when_snippet_throws() {
        let result = run("console.log('before'); throw new Error('after');");
        assert_eq!(result, ExecutionResult::failure("after"));
    }

    #[test]
    fn test_evaluate_inline() {
        let engine = ExecutionEngine::default();
        assert_eq!(engine.evaluate("console.log(2 * 21)").message(), "42");
    }
}
