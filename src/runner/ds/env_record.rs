use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use crate::runner::ds::error::JErrorType;
use crate::runner::ds::value::JsValue;

pub type EnvRef = Rc<RefCell<EnvironmentRecord>>;

#[derive(Debug)]
pub struct Binding {
    /// `None` while the binding is in its temporal dead zone.
    pub value: Option<JsValue>,
    pub mutable: bool,
}

/// A declarative scope: the global scope, a function body, a block or a loop iteration.
#[derive(Debug)]
pub struct EnvironmentRecord {
    bindings: HashMap<String, Binding>,
    pub outer: Option<EnvRef>,
}

impl EnvironmentRecord {
    pub fn new(outer: Option<EnvRef>) -> EnvRef {
        Rc::new(RefCell::new(EnvironmentRecord {
            bindings: HashMap::new(),
            outer,
        }))
    }

    pub fn has_binding(&self, name: &str) -> bool {
        self.bindings.contains_key(name)
    }

    /// Declares an uninitialized binding. Existing bindings are left untouched.
    pub fn create_mutable_binding(&mut self, name: &str) {
        self.bindings.entry(name.to_string()).or_insert(Binding {
            value: None,
            mutable: true,
        });
    }

    pub fn create_immutable_binding(&mut self, name: &str) {
        self.bindings.insert(
            name.to_string(),
            Binding {
                value: None,
                mutable: false,
            },
        );
    }

    pub fn initialize_binding(&mut self, name: &str, value: JsValue) {
        match self.bindings.get_mut(name) {
            Some(b) => b.value = Some(value),
            None => {
                self.bindings.insert(
                    name.to_string(),
                    Binding {
                        value: Some(value),
                        mutable: true,
                    },
                );
            }
        }
    }

    pub fn set_mutable_binding(&mut self, name: &str, value: JsValue) -> Result<(), JErrorType> {
        match self.bindings.get_mut(name) {
            Some(b) => {
                if b.value.is_none() {
                    Err(JErrorType::ReferenceError(format!(
                        "Cannot access '{}' before initialization",
                        name
                    )))
                } else if !b.mutable {
                    Err(JErrorType::TypeError("Assignment to constant variable.".to_string()))
                } else {
                    b.value = Some(value);
                    Ok(())
                }
            }
            None => Err(JErrorType::ReferenceError(format!("{} is not defined", name))),
        }
    }

    pub fn get_binding_value(&self, name: &str) -> Option<Result<JsValue, JErrorType>> {
        self.bindings.get(name).map(|b| match &b.value {
            Some(v) => Ok(v.clone()),
            None => Err(JErrorType::ReferenceError(format!(
                "Cannot access '{}' before initialization",
                name
            ))),
        })
    }

    /// Snapshot of all initialized bindings, used to give each loop iteration its own copy.
    pub fn copy_bindings(&self) -> Vec<(String, JsValue, bool)> {
        self.bindings
            .iter()
            .filter_map(|(k, b)| b.value.as_ref().map(|v| (k.to_string(), v.clone(), b.mutable)))
            .collect()
    }
}

/// Walks the scope chain starting at `env` and returns the record holding `name`.
pub fn resolve_binding(env: &EnvRef, name: &str) -> Option<EnvRef> {
    let mut current = Some(env.clone());
    while let Some(e) = current {
        if e.borrow().has_binding(name) {
            return Some(e);
        }
        current = e.borrow().outer.clone();
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_walks_outer_scopes() {
        let global = EnvironmentRecord::new(None);
        global.borrow_mut().initialize_binding("x", JsValue::Boolean(true));
        let inner = EnvironmentRecord::new(Some(global.clone()));
        let found = resolve_binding(&inner, "x");
        assert!(found.map_or(false, |e| Rc::ptr_eq(&e, &global)));
        assert!(resolve_binding(&inner, "y").is_none());
    }

    #[test]
    fn test_const_and_tdz_errors() {
        let env = EnvironmentRecord::new(None);
        env.borrow_mut().create_immutable_binding("c");
        match env.borrow().get_binding_value("c") {
            Some(Err(e)) => assert_eq!(e.to_string(), "Cannot access 'c' before initialization"),
            _ => panic!("expected a TDZ error"),
        }
        env.borrow_mut().initialize_binding("c", JsValue::Null);
        match env.borrow_mut().set_mutable_binding("c", JsValue::Undefined) {
            Err(e) => assert_eq!(e.to_string(), "Assignment to constant variable."),
            Ok(_) => panic!("const assignment must fail"),
        };
    }
}
