//! Core built-ins registration.

use crate::runner::plugin::registry::BuiltInRegistry;

use super::{array, boolean, console, date, error, function, globals, json, math, number, object, promise, string, timers};

/// Register all core built-in objects with the registry.
pub fn register_core_builtins(registry: &mut BuiltInRegistry) {
    // Object and Function first: every other prototype chain ends in them.
    object::register(registry);
    function::register(registry);
    array::register(registry);
    string::register(registry);
    number::register(registry);
    boolean::register(registry);
    date::register(registry);
    math::register(registry);
    json::register(registry);
    error::register(registry);
    promise::register(registry);
    timers::register(registry);
    globals::register(registry);
    console::register(registry);
}
