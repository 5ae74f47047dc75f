//! Result presenter: turns a widget's state into something to show.

use super::result::ExecutionResult;
use super::widget::{RunState, WidgetId};

/// The three visually distinct states of the output panel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenderedResult {
    Empty,
    Success { message: String },
    Failure { message: String },
}

/// What the output panel shows, plus whether the run control is busy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedView {
    pub result: RenderedResult,
    pub busy: bool,
}

pub struct ResultPresenter;

impl ResultPresenter {
    /// Pure view of the current result. `None` renders as [`RenderedResult::Empty`].
    pub fn render(result: Option<&ExecutionResult>, state: RunState) -> RenderedView {
        let result = match result {
            None => RenderedResult::Empty,
            Some(ExecutionResult::Success { message, .. }) => RenderedResult::Success {
                message: message.clone(),
            },
            Some(ExecutionResult::Failure { message }) => RenderedResult::Failure {
                message: message.clone(),
            },
        };
        RenderedView {
            result,
            busy: state == RunState::Running,
        }
    }

    /// Markup for the output panel. The message element is omitted when there is no result.
    pub fn to_html(view: &RenderedView, id: &WidgetId) -> String {
        let mut html = format!(
            "<div class=\"try-it-result\" data-testid=\"try-it-result\" data-widget-id=\"{}\" data-busy=\"{}\">",
            id, view.busy
        );
        let output = match &view.result {
            RenderedResult::Empty => None,
            RenderedResult::Success { message } => Some(("success", "Output:", message)),
            RenderedResult::Failure { message } => Some(("error", "Error:", message)),
        };
        if let Some((state, label, message)) = output {
            html.push_str(&format!(
                "<p class=\"try-it-label\">{}</p><pre class=\"code-output code-output-{}\" data-testid=\"code-output\" data-state=\"{}\">{}</pre>",
                label,
                state,
                state,
                escape_html(message)
            ));
        }
        html.push_str("</div>");
        html
    }

    /// Plain text for a terminal. Empty when there is no result.
    pub fn to_terminal(view: &RenderedView) -> String {
        let mut text = String::new();
        if view.busy {
            text.push_str("Running...\n");
        }
        match &view.result {
            RenderedResult::Empty => {}
            RenderedResult::Success { message } => {
                text.push_str("Output:\n");
                text.push_str(message);
                text.push('\n');
            }
            RenderedResult::Failure { message } => {
                text.push_str("Error:\n");
                text.push_str(message);
                text.push('\n');
            }
        }
        text
    }
}

pub fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_states() {
        assert_eq!(
            ResultPresenter::render(None, RunState::Idle),
            RenderedView {
                result: RenderedResult::Empty,
                busy: false
            }
        );
        let ok = ExecutionResult::success(vec!["8".to_string()], "none");
        assert_eq!(
            ResultPresenter::render(Some(&ok), RunState::Idle).result,
            RenderedResult::Success {
                message: "8".to_string()
            }
        );
        let failed = ExecutionResult::failure("boom");
        let view = ResultPresenter::render(Some(&failed), RunState::Running);
        assert!(view.busy);
        assert_eq!(
            view.result,
            RenderedResult::Failure {
                message: "boom".to_string()
            }
        );
    }

    #[test]
    fn test_html_markers() {
        let id = WidgetId::new();
        let failed = ExecutionResult::failure("a < b");
        let html = ResultPresenter::to_html(&ResultPresenter::render(Some(&failed), RunState::Idle), &id);
        assert!(html.contains("data-testid=\"code-output\""));
        assert!(html.contains("data-state=\"error\""));
        assert!(html.contains("a &lt; b"));
        assert!(html.contains(&format!("data-widget-id=\"{}\"", id)));

        let empty = ResultPresenter::to_html(&ResultPresenter::render(None, RunState::Idle), &id);
        assert!(!empty.contains("code-output"));
        assert!(empty.contains("data-busy=\"false\""));
    }

    #[test]
    fn test_terminal_text() {
        let ok = ExecutionResult::success(vec!["1".to_string(), "2".to_string()], "none");
        assert_eq!(
            ResultPresenter::to_terminal(&ResultPresenter::render(Some(&ok), RunState::Idle)),
            "Output:\n1\n2\n"
        );
        assert_eq!(ResultPresenter::to_terminal(&ResultPresenter::render(None, RunState::Idle)), "");
    }

    #[test]
    fn test_escape_html() {
        assert_eq!(escape_html("<b>\"x\" & 'y'</b>"), "&lt;b&gt;&quot;x&quot; &amp; &#39;y&#39;&lt;/b&gt;");
    }
}
