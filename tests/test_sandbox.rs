//! Behaviour of Try It widgets as a page sees it: run, reset, and what the
//! output panel shows.

use std::cell::RefCell;
use std::rc::Rc;

use tryit::runner::api::run_source;
use tryit::runner::plugin::registry::BuiltInRegistry;
use tryit::runner::plugin::types::{ConsoleLevel, ConsoleSink, EvalContext};
use tryit::sandbox::{
    ConsoleCapture, ExecutionEngine, ExecutionResult, RenderedResult, RunState, SandboxConfig, TryItWidget,
};

const NO_OUTPUT: &str = "Code executed successfully (no output)";

fn run(code: &str) -> ExecutionResult {
    ExecutionEngine::default().run(code)
}

fn success(lines: &[&str]) -> ExecutionResult {
    ExecutionResult::success(lines.iter().map(|l| l.to_string()).collect(), NO_OUTPUT)
}

#[test]
fn test_primitive_logs_are_space_and_newline_joined() {
    let result = run("console.log('a', 1, true); console.log(null, undefined); console.log(2.5)");
    assert_eq!(result, success(&["a 1 true", "null undefined", "2.5"]));
    assert_eq!(result.message(), "a 1 true\nnull undefined\n2.5");
}

#[test]
fn test_objects_are_pretty_printed() {
    assert_eq!(run("console.log({ a: 1, b: 'x' })").message(), "{\n  \"a\": 1,\n  \"b\": \"x\"\n}");
    assert_eq!(run("console.log([1, 2])").message(), "[\n  1,\n  2\n]");
    assert_eq!(run("console.log('list:', [])").message(), "list: []");
}

#[test]
fn test_no_output_gives_placeholder() {
    assert_eq!(run("var x = 1; x + 1;"), success(&[]));
    assert_eq!(run(""), success(&[]));
    assert_eq!(run("1+1;").message(), NO_OUTPUT);
}

#[test]
fn test_thrown_error_message() {
    assert_eq!(run("throw new Error('boom');"), ExecutionResult::failure("boom"));
    assert_eq!(run("throw new RangeError('too far')"), ExecutionResult::failure("too far"));
}

#[test]
fn test_thrown_non_error_uses_fallback() {
    assert_eq!(run("throw 'str';"), ExecutionResult::failure("An error occurred"));
    assert_eq!(run("throw null"), ExecutionResult::failure("An error occurred"));
}

#[test]
fn test_engine_errors_carry_their_message() {
    assert_eq!(run("undefinedFunction();").message(), "undefinedFunction is not defined");
    assert_eq!(run("const o = null; o.x;").message(), "Cannot read properties of null (reading 'x')");
    assert_eq!(run("const c = 1; c = 2;").message(), "Assignment to constant variable.");
}

#[test]
fn test_syntax_errors_fail_without_running_anything() {
    let result = run("console.log('never'); console.log(1");
    assert_eq!(result, ExecutionResult::failure("Unexpected end of input"));
}

#[test]
fn test_runaway_recursion_is_a_range_error() {
    let engine = ExecutionEngine::new(SandboxConfig::default().with_max_call_depth(200));
    let result = engine.run("function down(n) { return down(n + 1); } down(0);");
    assert_eq!(result, ExecutionResult::failure("Maximum call stack size exceeded"));
}

#[test]
fn test_add_example() {
    let mut widget = TryItWidget::new("function add(a, b) {\n  return a + b;\n}\n\nconsole.log(add(5, 3));");
    assert_eq!(widget.run().cloned(), Some(success(&["8"])));
}

#[test]
fn test_edit_run_reset() {
    let seed = "console.log('seed');";
    let mut widget = TryItWidget::new(seed);

    widget.snippet_mut().set_text("console.log(1); console.log(2);");
    assert_eq!(widget.run().map(|r| r.message().to_string()), Some("1\n2".to_string()));
    assert_eq!(
        widget.render().result,
        RenderedResult::Success {
            message: "1\n2".to_string()
        }
    );

    widget.reset();
    assert_eq!(widget.snippet().get_text(), seed);
    assert!(widget.result().is_none());
    assert_eq!(widget.render().result, RenderedResult::Empty);
}

#[test]
fn test_reset_after_failure() {
    let mut widget = TryItWidget::new("console.log('ok')");
    widget.snippet_mut().set_text("throw new Error('bad')");
    widget.run();
    assert_eq!(
        widget.render().result,
        RenderedResult::Failure {
            message: "bad".to_string()
        }
    );
    widget.reset();
    assert_eq!(widget.snippet().get_text(), "console.log('ok')");
    assert!(widget.result().is_none());
}

#[test]
fn test_run_while_running_is_ignored() {
    let mut widget = TryItWidget::new("console.log('first')");
    let pending = widget.begin_run().unwrap();
    assert_eq!(widget.state(), RunState::Running);
    assert!(widget.render().busy);

    assert!(widget.begin_run().is_none());
    assert!(widget.run().is_none());
    assert_eq!(widget.state(), RunState::Running);

    assert_eq!(widget.complete_run(pending).map(|r| r.message().to_string()), Some("first".to_string()));
    assert_eq!(widget.state(), RunState::Idle);
}

#[test]
fn test_new_run_replaces_old_result() {
    let mut widget = TryItWidget::new("console.log('one')");
    widget.run();
    widget.snippet_mut().set_text("throw 'x'");
    widget.run();
    assert_eq!(widget.result(), Some(&ExecutionResult::failure("An error occurred")));
}

#[test]
fn test_runs_do_not_share_globals() {
    let mut widget = TryItWidget::new("var counter = (typeof counter === 'undefined') ? 1 : counter + 1; console.log(counter);");
    assert_eq!(widget.run().map(|r| r.message().to_string()), Some("1".to_string()));
    assert_eq!(widget.run().map(|r| r.message().to_string()), Some("1".to_string()));
}

#[test]
fn test_seeded_random_is_repeatable() {
    let config = SandboxConfig::default().with_random_seed(1234);
    let code = "console.log(Math.random(), Math.random());";
    let first = ExecutionEngine::new(config.clone()).run(code);
    let second = ExecutionEngine::new(config).run(code);
    assert_eq!(first, second);
}

#[test]
fn test_html_markers() {
    let mut widget = TryItWidget::new("console.log('<b>')");
    assert!(!widget.to_html().contains("data-testid=\"code-output\""));
    widget.run();
    let html = widget.to_html();
    assert!(html.contains("data-testid=\"code-output\""));
    assert!(html.contains("data-state=\"success\""));
    assert!(html.contains("&lt;b&gt;"));
    assert!(html.contains(&widget.id().to_string()));
}

struct Recorder(Rc<RefCell<Vec<String>>>);

impl ConsoleSink for Recorder {
    fn write(&mut self, level: ConsoleLevel, line: &str) {
        self.0.borrow_mut().push(format!("{}: {}", level, line));
    }
}

#[test]
fn test_console_sink_is_restored_after_success_and_failure() {
    let seen = Rc::new(RefCell::new(Vec::new()));
    let mut ctx = EvalContext::with_registry(BuiltInRegistry::with_core());
    ctx.replace_console(Box::new(Recorder(seen.clone())));

    {
        let mut capture = ConsoleCapture::install(&mut ctx);
        run_source("console.log('captured'); console.warn('passed on');", &mut capture).unwrap();
        assert_eq!(capture.lines(), vec!["captured"]);
    }
    {
        let mut capture = ConsoleCapture::install(&mut ctx);
        assert!(run_source("console.log('lost'); throw new Error('x');", &mut capture).is_err());
        assert_eq!(capture.lines(), vec!["lost"]);
    }

    run_source("console.log('host again');", &mut ctx).unwrap();
    assert_eq!(*seen.borrow(), vec!["warn: passed on", "log: host again"]);
}
