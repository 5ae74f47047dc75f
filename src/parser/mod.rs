mod api;
pub mod ast;
pub mod static_semantics;
#[allow(non_fmt_panics)]
#[cfg(test)]
mod unit_tests;
mod util;

pub use api::JsParser;
pub use ast::JsError;
