//! A "Try It" widget: one snippet, one engine, at most one live result.

use std::fmt;
use std::thread;

use log::debug;
use uuid::Uuid;

use super::config::SandboxConfig;
use super::engine::ExecutionEngine;
use super::presenter::{RenderedView, ResultPresenter};
use super::result::ExecutionResult;
use super::snippet::Snippet;

/// Distinguishes widgets on the same page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct WidgetId(Uuid);

impl WidgetId {
    pub fn new() -> Self {
        WidgetId(Uuid::new_v4())
    }
}

impl Default for WidgetId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for WidgetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Idle,
    Running,
}

/// Ticket from [`TryItWidget::begin_run`]. Holds the text as it was when the run started.
#[derive(Debug)]
pub struct PendingRun {
    widget: WidgetId,
    source: String,
}

impl PendingRun {
    pub fn source(&self) -> &str {
        &self.source
    }
}

/// Called with the snippet text after each successful run.
pub type RunCallback = Box<dyn FnMut(&str)>;

pub struct TryItWidget {
    id: WidgetId,
    snippet: Snippet,
    result: Option<ExecutionResult>,
    state: RunState,
    engine: ExecutionEngine,
    on_run: Option<RunCallback>,
}

impl TryItWidget {
    pub fn new(seed_text: impl Into<String>) -> Self {
        Self::with_config(seed_text, SandboxConfig::default())
    }

    pub fn with_config(seed_text: impl Into<String>, config: SandboxConfig) -> Self {
        TryItWidget {
            id: WidgetId::new(),
            snippet: Snippet::new(seed_text),
            result: None,
            state: RunState::Idle,
            engine: ExecutionEngine::new(config),
            on_run: None,
        }
    }

    /// Registers a hook that fires after a run ends in `Success`. Failed runs never call it.
    pub fn with_on_run(mut self, callback: impl FnMut(&str) + 'static) -> Self {
        self.on_run = Some(Box::new(callback));
        self
    }

    pub fn id(&self) -> WidgetId {
        self.id
    }

    pub fn snippet(&self) -> &Snippet {
        &self.snippet
    }

    pub fn snippet_mut(&mut self) -> &mut Snippet {
        &mut self.snippet
    }

    pub fn result(&self) -> Option<&ExecutionResult> {
        self.result.as_ref()
    }

    pub fn state(&self) -> RunState {
        self.state
    }

    /// Starts a run: `Idle -> Running` and the old result is cleared.
    /// Returns `None`, changing nothing, when a run is already in progress.
    pub fn begin_run(&mut self) -> Option<PendingRun> {
        if self.state == RunState::Running {
            debug!("widget {} is already running", self.id);
            return None;
        }
        self.state = RunState::Running;
        self.result = None;
        Some(PendingRun {
            widget: self.id,
            source: self.snippet.get_text().to_string(),
        })
    }

    /// Evaluates a pending run, publishes its result and goes back to `Idle`.
    /// A ticket from another widget, or one arriving while idle, is ignored.
    pub fn complete_run(&mut self, run: PendingRun) -> Option<&ExecutionResult> {
        if run.widget != self.id || self.state != RunState::Running {
            debug!("ignoring stale run ticket for widget {}", run.widget);
            return None;
        }
        let delay = self.engine.config().run_delay;
        if !delay.is_zero() {
            thread::sleep(delay);
        }
        let result = self.engine.run(&run.source);
        self.state = RunState::Idle;
        if result.is_success() {
            if let Some(on_run) = self.on_run.as_mut() {
                on_run(&run.source);
            }
        }
        self.result = Some(result);
        self.result.as_ref()
    }

    /// `begin_run` and `complete_run` back to back.
    pub fn run(&mut self) -> Option<&ExecutionResult> {
        let pending = self.begin_run()?;
        self.complete_run(pending)
    }

    /// Restores the seed text and clears the result.
    pub fn reset(&mut self) {
        self.snippet.reset_to_seed();
        self.result = None;
    }

    pub fn render(&self) -> RenderedView {
        ResultPresenter::render(self.result.as_ref(), self.state)
    }

    pub fn to_html(&self) -> String {
        ResultPresenter::to_html(&self.render(), &self.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_publishes_result() {
        let mut widget = TryItWidget::new("console.log('hi')");
        assert!(widget.result().is_none());
        assert_eq!(widget.run().map(|r| r.message().to_string()), Some("hi".to_string()));
        assert_eq!(widget.state(), RunState::Idle);
    }

    #[test]
    fn test_begin_run_clears_old_result() {
        let mut widget = TryItWidget::new("console.log(1)");
        widget.run();
        let pending = widget.begin_run().unwrap();
        assert!(widget.result().is_none());
        assert_eq!(widget.state(), RunState::Running);
        assert_eq!(pending.source(), "console.log(1)");
    }

    #[test]
    fn test_ticket_snapshots_text() {
        let mut widget = TryItWidget::new("console.log(1)");
        let pending = widget.begin_run().unwrap();
        widget.snippet_mut().set_text("console.log(2)");
        assert_eq!(widget.complete_run(pending).unwrap().message(), "1");
    }

    #[test]
    fn test_foreign_ticket_is_ignored() {
        let mut a = TryItWidget::new("console.log('a')");
        let mut b = TryItWidget::new("console.log('b')");
        let ticket = a.begin_run().unwrap();
        b.begin_run().unwrap();
        assert!(b.complete_run(ticket).is_none());
        assert_eq!(b.state(), RunState::Running);
    }

    #[test]
    fn test_on_run_fires_only_after_success() {
        use std::cell::RefCell;
        use std::rc::Rc;

        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = seen.clone();
        let mut widget = TryItWidget::new("console.log('ok')")
            .with_on_run(move |source| sink.borrow_mut().push(source.to_string()));
        widget.run();
        assert_eq!(*seen.borrow(), vec!["console.log('ok')".to_string()]);

        widget.snippet_mut().set_text("throw new Error('nope')");
        assert_eq!(widget.run().map(ExecutionResult::is_success), Some(false));
        widget.snippet_mut().set_text("let x = ;");
        assert_eq!(widget.run().map(ExecutionResult::is_success), Some(false));
        assert_eq!(seen.borrow().len(), 1);

        widget.reset();
        widget.run();
        assert_eq!(seen.borrow().len(), 2);
    }

    #[test]
    fn test_ids_are_unique() {
        assert_ne!(TryItWidget::new("").id(), TryItWidget::new("").id());
    }
}
