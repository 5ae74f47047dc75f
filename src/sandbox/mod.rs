//! "Try It" widgets: edit a snippet, run it, show what it printed or threw.
//!
//! A [`TryItWidget`] ties together the three parts of a widget:
//!
//! - the editor surface, [`Snippet`], holding the seed and the current text;
//! - the [`ExecutionEngine`], which evaluates the text in a fresh interpreter
//!   while a [`ConsoleCapture`] collects its `console.log` lines;
//! - the [`ResultPresenter`], a pure view of the latest [`ExecutionResult`].
//!
//! ```
//! use tryit::sandbox::{ExecutionResult, TryItWidget};
//!
//! let mut widget = TryItWidget::new("function add(a, b) { return a + b; }\nconsole.log(add(5, 3));");
//! assert_eq!(widget.run().map(ExecutionResult::message), Some("8"));
//!
//! widget.snippet_mut().set_text("throw new Error('boom');");
//! assert_eq!(widget.run().map(ExecutionResult::message), Some("boom"));
//!
//! widget.reset();
//! assert!(widget.result().is_none());
//! ```

pub mod config;
pub mod console;
pub mod engine;
pub mod presenter;
pub mod result;
pub mod snippet;
pub mod widget;

pub use config::{ConfigError, SandboxConfig};
pub use console::ConsoleCapture;
pub use engine::ExecutionEngine;
pub use presenter::{RenderedResult, RenderedView, ResultPresenter};
pub use result::ExecutionResult;
pub use snippet::Snippet;
pub use widget::{PendingRun, RunCallback, RunState, TryItWidget, WidgetId};
