//! # tryit - JavaScript "Try It" widgets in Rust
//!
//! Runs the short JavaScript snippets of a tutorial page and reports what they
//! printed or threw. The crate carries its own interpreter:
//! - PEG parser with an ESTree-shaped AST
//! - Tree-walking evaluator with closures, destructuring, promises and `async`/`await`
//! - Built-in library resolved lazily from a registry (the super-global scope)
//! - An event loop with a microtask queue and virtual-clock timers
//!
//! ## Quick Start
//!
//! ### Running a widget
//!
//! ```
//! use tryit::sandbox::TryItWidget;
//!
//! let mut widget = TryItWidget::new("console.log(1); console.log(2);");
//! let result = widget.run().unwrap();
//! assert_eq!(result.message(), "1\n2");
//! ```
//!
//! ### Parsing JavaScript
//!
//! ```
//! use tryit::parser::JsParser;
//!
//! let code = "var x = 5 + 3;";
//! let ast = JsParser::parse_to_ast_from_str(code).unwrap();
//! println!("Parsed {} statements", ast.body.len());
//! ```
//!
//! ### Running JavaScript with the interpreter
//!
//! ```
//! use tryit::runner::api::run_source;
//! use tryit::runner::plugin::registry::BuiltInRegistry;
//! use tryit::runner::plugin::types::EvalContext;
//!
//! let mut ctx = EvalContext::with_registry(BuiltInRegistry::with_core());
//! run_source("var x = Math.abs(-42);", &mut ctx).unwrap();
//!
//! let x = ctx.get_binding("x").unwrap();
//! println!("x = {:?}", x);
//! ```
//!
//! ## Super-Global Scope
//!
//! Built-in objects (`Math`, `console`, `Array`, ...) are not preloaded into the
//! global scope. They live in a [`runner::plugin::registry::BuiltInRegistry`] and
//! are materialized the first time a snippet names them, then cached. Snippets
//! can shadow them with their own bindings but cannot replace the cached objects
//! for other names.
//!
//! ## Architecture
//!
//! - **[`parser`]** - PEG parser and AST types
//! - **[`runner`]** - The interpreter
//!   - **[`runner::plugin`]** - Evaluation context, registry and super-global scope
//!   - **[`runner::ds`]** - Data structures (values, objects, environments, job queue)
//!   - **[`runner::eval`]** - Tree-walking evaluator and event loop
//!   - **[`runner::std_lib`]** - Built-in library
//! - **[`sandbox`]** - Widgets, the execution engine, console capture and presentation

#[macro_use]
extern crate lazy_static;

pub mod parser;
pub mod runner;
pub mod sandbox;
