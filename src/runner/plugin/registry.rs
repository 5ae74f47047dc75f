//! Declarative table of the built-ins a snippet can reach.

use std::collections::HashMap;
use std::fmt;

use super::types::{BuiltInObject, NativeFn};
use crate::runner::ds::value::JsValue;
use crate::runner::std_lib::register_core_builtins;

#[derive(Debug, PartialEq)]
pub enum RegistryError {
    UnknownObject(String),
    UnknownMethod(String, String),
}

impl fmt::Display for RegistryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RegistryError::UnknownObject(name) => write!(f, "no built-in object named {}", name),
            RegistryError::UnknownMethod(obj, method) => write!(f, "{} has no built-in method {}", obj, method),
        }
    }
}

impl std::error::Error for RegistryError {}

/// Built-in objects, global functions and global constants, keyed by name.
/// Nothing here is a live JS value until the super-global scope materializes it.
pub struct BuiltInRegistry {
    objects: HashMap<String, BuiltInObject>,
    /// `parseInt`, `setTimeout` and friends.
    functions: HashMap<String, NativeFn>,
    /// `NaN`, `Infinity`, `undefined`.
    values: HashMap<String, JsValue>,
}

impl BuiltInRegistry {
    pub fn new() -> Self {
        BuiltInRegistry {
            objects: HashMap::new(),
            functions: HashMap::new(),
            values: HashMap::new(),
        }
    }

    /// Everything a Try It snippet is allowed to use.
    pub fn with_core() -> Self {
        let mut registry = Self::new();
        register_core_builtins(&mut registry);
        registry
    }

    /// Adds `obj`, replacing any earlier object with the same name.
    pub fn register_object(&mut self, obj: BuiltInObject) {
        self.objects.insert(obj.name.clone(), obj);
    }

    pub fn register_function(&mut self, name: impl Into<String>, func: NativeFn) {
        self.functions.insert(name.into(), func);
    }

    pub fn register_value(&mut self, name: impl Into<String>, value: JsValue) {
        self.values.insert(name.into(), value);
    }

    pub fn get_object(&self, name: &str) -> Option<&BuiltInObject> {
        self.objects.get(name)
    }

    pub fn get_function(&self, name: &str) -> Option<NativeFn> {
        self.functions.get(name).copied()
    }

    pub fn get_value(&self, name: &str) -> Option<&JsValue> {
        self.values.get(name)
    }

    /// The native behind `object.method`, for hosts that call built-ins directly.
    pub fn get_method(&self, object: &str, method: &str) -> Result<NativeFn, RegistryError> {
        let obj = self
            .objects
            .get(object)
            .ok_or_else(|| RegistryError::UnknownObject(object.to_string()))?;
        obj.get_method(method)
            .ok_or_else(|| RegistryError::UnknownMethod(object.to_string(), method.to_string()))
    }

    pub fn has_object(&self, name: &str) -> bool {
        self.objects.contains_key(name)
    }

    pub fn has_method(&self, object: &str, method: &str) -> bool {
        self.objects.get(object).map_or(false, |obj| obj.has_method(method))
    }

    /// True for any name the super-global scope can resolve.
    pub fn provides(&self, name: &str) -> bool {
        self.objects.contains_key(name) || self.functions.contains_key(name) || self.values.contains_key(name)
    }
}

impl Default for BuiltInRegistry {
    fn default() -> Self {
        Self::with_core()
    }
}
