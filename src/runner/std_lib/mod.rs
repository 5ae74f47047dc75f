//! Standard library built-in objects.
//!
//! Each submodule registers its objects and functions with a [`BuiltInRegistry`];
//! nothing is materialized until a snippet first names it.
//!
//! [`BuiltInRegistry`]: crate::runner::plugin::registry::BuiltInRegistry

pub mod array;
pub mod boolean;
pub mod console;
pub mod core;
pub mod date;
pub mod error;
pub mod function;
pub mod globals;
pub mod json;
pub mod math;
pub mod number;
pub mod object;
pub mod promise;
pub mod string;
pub mod timers;

pub use self::core::register_core_builtins;

use crate::runner::ds::value::JsValue;

/// The `i`-th argument, or `undefined` when the caller passed fewer.
pub(crate) fn arg(args: &[JsValue], i: usize) -> JsValue {
    args.get(i).cloned().unwrap_or(JsValue::Undefined)
}
