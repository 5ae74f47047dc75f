//! Scoped capture of `console.log` output.
//!
//! [`ConsoleCapture::install`] swaps a capturing sink into an [`EvalContext`]
//! and hands back a guard. While the guard lives, `console.log` lines are
//! collected in memory and every other console level still reaches the sink
//! that was installed before. Dropping the guard puts that sink back, on
//! every exit path including panics.

use std::cell::RefCell;
use std::ops::{Deref, DerefMut};
use std::rc::Rc;

use crate::runner::plugin::types::{ConsoleLevel, ConsoleSink, EvalContext};

type SharedSink = Rc<RefCell<Option<Box<dyn ConsoleSink>>>>;

struct CaptureSink {
    lines: Rc<RefCell<Vec<String>>>,
    previous: SharedSink,
}

impl ConsoleSink for CaptureSink {
    fn write(&mut self, level: ConsoleLevel, line: &str) {
        match level {
            ConsoleLevel::Log => self.lines.borrow_mut().push(line.to_string()),
            _ => {
                if let Some(sink) = self.previous.borrow_mut().as_mut() {
                    sink.write(level, line);
                }
            }
        }
    }
}

/// Guard that owns the capture for as long as it lives. Derefs to the context.
pub struct ConsoleCapture<'a> {
    ctx: &'a mut EvalContext,
    lines: Rc<RefCell<Vec<String>>>,
    previous: SharedSink,
}

impl<'a> ConsoleCapture<'a> {
    pub fn install(ctx: &'a mut EvalContext) -> Self {
        let lines = Rc::new(RefCell::new(Vec::new()));
        let previous: SharedSink = Rc::new(RefCell::new(None));
        let sink = CaptureSink {
            lines: lines.clone(),
            previous: previous.clone(),
        };
        let old = ctx.replace_console(Box::new(sink));
        *previous.borrow_mut() = Some(old);
        ConsoleCapture { ctx, lines, previous }
    }

    /// Lines captured so far, in call order.
    pub fn lines(&self) -> Vec<String> {
        self.lines.borrow().clone()
    }
}

impl Deref for ConsoleCapture<'_> {
    type Target = EvalContext;

    fn deref(&self) -> &EvalContext {
        self.ctx
    }
}

impl DerefMut for ConsoleCapture<'_> {
    fn deref_mut(&mut self) -> &mut EvalContext {
        self.ctx
    }
}

impl Drop for ConsoleCapture<'_> {
    fn drop(&mut self) {
        let old = self.previous.borrow_mut().take();
        if let Some(old) = old {
            // The capture sink comes back out and is dropped here.
            self.ctx.replace_console(old);
        }
    }
}
