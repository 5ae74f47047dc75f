//! The JavaScript runtime: values and objects (`ds`), the tree-walking
//! evaluator (`eval`), built-ins (`std_lib`) and their lazy registry (`plugin`).

pub mod api;
pub mod ds;
pub mod eval;
pub mod plugin;
pub mod std_lib;
