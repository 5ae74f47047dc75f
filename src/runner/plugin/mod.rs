//! Built-in registry and super-global scope.
//!
//! This module implements the **super-global scope**: built-in objects are
//! described once in a [`BuiltInRegistry`] and only turned into live JS objects
//! when a snippet first touches them.
//!
//! ## Super-Global Scope Concept
//!
//! The super-global scope sits outside the normal lexical environment chain and
//! provides objects that are available globally but resolved on-demand:
//!
//! ```text
//! Variable Lookup Order:
//! 1. Local scope (function/block)
//! 2. Outer scopes (lexical chain)
//! 3. Global scope and global object
//! 4. Super-global scope ← Built-ins live here
//! ```
//!
//! ### Key Components
//!
//! - **[`BuiltInRegistry`]**: Declarative table of built-in objects, functions and constants
//! - **[`SuperGlobalEnvironment`]**: Materializes registry entries and caches them
//! - **[`EvalContext`](types::EvalContext)**: Execution context owning the super-global scope
//!   and the console sink
//!
//! ## Example: Custom Built-in
//!
//! ```
//! use tryit::runner::api::run_source;
//! use tryit::runner::plugin::registry::BuiltInRegistry;
//! use tryit::runner::plugin::types::{BuiltInObject, EvalContext};
//! use tryit::runner::ds::value::JsValue;
//! use tryit::runner::ds::error::JErrorType;
//! use tryit::runner::ds::operations::type_conversion::to_number;
//!
//! fn triple(_ctx: &mut EvalContext, _this: JsValue, args: Vec<JsValue>) -> Result<JsValue, JErrorType> {
//!     let n = args.first().map(to_number).unwrap_or(f64::NAN);
//!     Ok(JsValue::from_f64(n * 3.0))
//! }
//!
//! let mut registry = BuiltInRegistry::with_core();
//! registry.register_object(BuiltInObject::new("MyMath").add_method("triple", triple));
//!
//! let mut ctx = EvalContext::with_registry(registry);
//! run_source("var result = MyMath.triple(7);", &mut ctx).unwrap();
//! assert_eq!(ctx.get_binding("result"), Some(JsValue::from_i64(21)));
//! ```

pub mod registry;
pub mod super_global;
pub mod types;

pub use registry::BuiltInRegistry;
pub use super_global::SuperGlobalEnvironment;
