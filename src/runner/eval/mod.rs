//! Evaluation module for executing JavaScript AST.
//!
//! This module contains the core evaluation logic for the JavaScript interpreter.

pub mod event_loop;
pub mod expression;
pub mod function;
pub mod pattern;
pub mod promise;
pub mod statement;
pub mod suspend;
pub mod types;

pub use function::{call_function, construct};
pub use types::{Completion, CompletionType};
