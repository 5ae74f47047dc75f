//! Super-global environment: the bottom of the scope chain.
//!
//! This environment sits below the global scope and lazily materializes
//! built-in objects on first access. Objects are cached after first
//! resolution so each name is materialized at most once per context.
//!
//! ## How It Works
//!
//! When JavaScript code references a name that isn't found in the lexical
//! environment chain or on the global object, the super-global environment is consulted:
//!
//! ```text
//! JavaScript: Math.abs(-5)
//!      ↓
//! 1. Check local scope → not found
//! 2. Check outer scopes → not found
//! 3. Check the global object → not found
//! 4. Check super-global → "Math" is registered
//!      ↓
//! 5. Build the Math object from its BuiltInObject definition
//! 6. Cache it
//! 7. Property lookup finds `abs` on it as an ordinary native function
//! ```
//!
//! ## Prototypes
//!
//! A constructor's methods live on its prototype object, which is created the
//! first time anything needs it: an array literal asks for `Array`'s prototype
//! without `Array` ever being named. The prototype is registered before its
//! methods are built, so the `Function.prototype` ↔ `Object.prototype` cycle
//! resolves without recursion.
//!
//! ## Example
//!
//! ```
//! use tryit::runner::plugin::super_global::SuperGlobalEnvironment;
//! use tryit::runner::plugin::registry::BuiltInRegistry;
//! use tryit::runner::ds::object::JsObject;
//!
//! let mut sg = SuperGlobalEnvironment::new(BuiltInRegistry::with_core());
//! let global = JsObject::new_ordinary(None);
//! assert!(sg.has_name("Math"));
//! assert!(sg.resolve_binding("Math", &global).is_some());
//! assert!(sg.resolve_binding("NotAThing", &global).is_none());
//! ```

use std::collections::HashMap;

use crate::runner::ds::function_object::FunctionObject;
use crate::runner::ds::object::{JsObject, JsObjectType, ObjectKind};
use crate::runner::ds::value::JsValue;
use crate::runner::plugin::registry::BuiltInRegistry;
use crate::runner::plugin::types::NativeFn;

/// The super-global environment for lazy resolution of built-in objects.
///
/// ## Resolution Order
///
/// When a name is looked up:
/// 1. Check if it's in the cache → return cached value
/// 2. `globalThis` → the context's global object
/// 3. Registered global functions and constants
/// 4. Registered built-in objects, materialized with their prototype
///
/// JavaScript code cannot create or modify super-global bindings, though it
/// can shadow them with its own declarations.
pub struct SuperGlobalEnvironment {
    registry: BuiltInRegistry,
    /// Cache of already-materialized bindings (name → value).
    cache: HashMap<String, JsValue>,
    /// Prototype objects keyed by the built-in that owns them.
    prototypes: HashMap<String, JsObjectType>,
}

impl SuperGlobalEnvironment {
    pub fn new(registry: BuiltInRegistry) -> Self {
        SuperGlobalEnvironment {
            registry,
            cache: HashMap::new(),
            prototypes: HashMap::new(),
        }
    }

    pub fn registry(&self) -> &BuiltInRegistry {
        &self.registry
    }

    /// Check if the given name can be resolved here.
    pub fn has_name(&self, name: &str) -> bool {
        name == "globalThis" || self.cache.contains_key(name) || self.registry.provides(name)
    }

    /// Number of names materialized so far.
    pub fn materialized_count(&self) -> usize {
        self.cache.len()
    }

    /// Resolve a name, caching the result.
    pub fn resolve_binding(&mut self, name: &str, global_object: &JsObjectType) -> Option<JsValue> {
        if name == "globalThis" {
            return Some(JsValue::Object(global_object.clone()));
        }
        self.materialize(name)
    }

    /// The prototype object shared by instances of the named built-in.
    pub fn prototype_of(&mut self, name: &str) -> JsObjectType {
        if let Some(p) = self.prototypes.get(name) {
            return p.clone();
        }
        let parent_name = match self.registry.get_object(name) {
            Some(o) => o.prototype.clone(),
            None if name == "Object" => None,
            None => Some("Object".to_string()),
        };
        let parent = match parent_name {
            Some(p) if p != name => Some(self.prototype_of(&p)),
            _ => None,
        };
        // Building the parent may already have built this prototype.
        if let Some(p) = self.prototypes.get(name) {
            return p.clone();
        }
        let proto = JsObject::new_ordinary(parent);
        self.prototypes.insert(name.to_string(), proto.clone());

        let (methods, properties, has_constructor) = match self.registry.get_object(name) {
            Some(o) => (
                o.methods.clone(),
                o.prototype_properties.clone(),
                o.constructor.is_some(),
            ),
            None => (vec![], vec![], false),
        };
        for (method_name, func) in methods {
            let f = self.native_function(&method_name, func, None);
            proto
                .borrow_mut()
                .define_hidden_property(&method_name, JsValue::Object(f));
        }
        for (key, value) in properties {
            proto.borrow_mut().define_hidden_property(&key, value);
        }
        if has_constructor {
            self.materialize(name);
        }
        proto
    }

    fn native_function(&mut self, name: &str, func: NativeFn, constructor: Option<NativeFn>) -> JsObjectType {
        let proto = self.prototype_of("Function");
        let length = if constructor.is_some() { 1 } else { 0 };
        JsObject::new(
            ObjectKind::Function(FunctionObject::new_native(name, length, func, constructor)),
            Some(proto),
        )
    }

    fn materialize(&mut self, name: &str) -> Option<JsValue> {
        if let Some(v) = self.cache.get(name) {
            return Some(v.clone());
        }
        if let Some(func) = self.registry.get_function(name) {
            let f = JsValue::Object(self.native_function(name, func, None));
            self.cache.insert(name.to_string(), f.clone());
            return Some(f);
        }
        if let Some(v) = self.registry.get_value(name).cloned() {
            self.cache.insert(name.to_string(), v.clone());
            return Some(v);
        }
        let (constructor, parent_name, methods, static_methods, properties) = match self.registry.get_object(name) {
            Some(o) => (
                o.constructor,
                o.prototype.clone(),
                o.methods.clone(),
                o.static_methods.clone(),
                o.properties.clone(),
            ),
            None => return None,
        };

        let object = match constructor {
            Some(ctor) => {
                let proto = self.prototype_of(name);
                if let Some(v) = self.cache.get(name) {
                    return Some(v.clone());
                }
                let f = self.native_function(name, ctor, Some(ctor));
                f.borrow_mut()
                    .define_hidden_property("prototype", JsValue::Object(proto.clone()));
                proto
                    .borrow_mut()
                    .define_hidden_property("constructor", JsValue::Object(f.clone()));
                self.cache.insert(name.to_string(), JsValue::Object(f.clone()));
                f
            }
            None => {
                let parent = parent_name.map(|p| self.prototype_of(&p));
                let o = JsObject::new_ordinary(parent);
                self.cache.insert(name.to_string(), JsValue::Object(o.clone()));
                for (method_name, func) in methods {
                    let f = self.native_function(&method_name, func, None);
                    o.borrow_mut()
                        .define_hidden_property(&method_name, JsValue::Object(f));
                }
                o
            }
        };
        for (method_name, func) in static_methods {
            let f = self.native_function(&method_name, func, None);
            object
                .borrow_mut()
                .define_hidden_property(&method_name, JsValue::Object(f));
        }
        for (key, value) in properties {
            object.borrow_mut().define_hidden_property(&key, value);
        }
        Some(JsValue::Object(object))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runner::ds::object::{get_property, inherits_from};
    use std::rc::Rc;

    #[test]
    fn test_objects_are_materialized_once() {
        let mut sg = SuperGlobalEnvironment::new(BuiltInRegistry::with_core());
        let global = JsObject::new_ordinary(None);
        let first = sg.resolve_binding("Math", &global);
        let second = sg.resolve_binding("Math", &global);
        assert!(first.is_some());
        assert_eq!(first, second);
    }

    #[test]
    fn test_constructor_and_prototype_are_linked() {
        let mut sg = SuperGlobalEnvironment::new(BuiltInRegistry::with_core());
        let global = JsObject::new_ordinary(None);
        let array = match sg.resolve_binding("Array", &global) {
            Some(JsValue::Object(o)) => o,
            _ => panic!("Array must resolve to an object"),
        };
        let proto = sg.prototype_of("Array");
        match get_property(&array, "prototype") {
            Some(JsValue::Object(p)) => assert!(Rc::ptr_eq(&p, &proto)),
            _ => panic!("Array.prototype missing"),
        }
        assert!(get_property(&proto, "push").is_some());
        let object_proto = sg.prototype_of("Object");
        assert!(inherits_from(&proto, &object_proto));
    }

    #[test]
    fn test_error_subclasses_inherit_from_error() {
        let mut sg = SuperGlobalEnvironment::new(BuiltInRegistry::with_core());
        let type_error_proto = sg.prototype_of("TypeError");
        let error_proto = sg.prototype_of("Error");
        let instance = JsObject::new(ObjectKind::Error, Some(type_error_proto));
        assert!(inherits_from(&instance, &error_proto));
    }

    #[test]
    fn test_global_this_is_the_global_object() {
        let mut sg = SuperGlobalEnvironment::new(BuiltInRegistry::new());
        let global = JsObject::new_ordinary(None);
        match sg.resolve_binding("globalThis", &global) {
            Some(JsValue::Object(o)) => assert!(Rc::ptr_eq(&o, &global)),
            _ => panic!("globalThis must resolve"),
        }
    }
}
