use std::cell::RefCell;
use std::rc::Rc;

use crate::runner::ds::error::JErrorType;
use crate::runner::ds::function_object::FunctionObject;
use crate::runner::ds::object_property::{as_array_index, PropertyDescriptor, PropertyMap};
use crate::runner::ds::promise_object::PromiseRecord;
use crate::runner::ds::value::JsValue;

pub type JsObjectType = Rc<RefCell<JsObject>>;

/// Arrays are stored densely, so their length is capped well below the
/// `2^32 - 1` the language allows.
pub const MAX_ARRAY_LENGTH: usize = 1 << 22;

pub fn is_valid_array_length(len: f64) -> bool {
    len >= 0.0 && len.fract() == 0.0 && len <= MAX_ARRAY_LENGTH as f64
}

pub fn invalid_array_length() -> JErrorType {
    JErrorType::RangeError("Invalid array length".to_string())
}

pub enum ObjectKind {
    Ordinary,
    /// Dense element storage; holes read back as `undefined`.
    Array(Vec<JsValue>),
    Function(FunctionObject),
    Error,
    Promise(PromiseRecord),
    /// Time value in milliseconds since the epoch, NaN for an invalid date.
    Date(f64),
    Global,
}

pub struct JsObject {
    pub kind: ObjectKind,
    pub properties: PropertyMap,
    pub prototype: Option<JsObjectType>,
    pub extensible: bool,
}

impl JsObject {
    pub fn new(kind: ObjectKind, prototype: Option<JsObjectType>) -> JsObjectType {
        Rc::new(RefCell::new(JsObject {
            kind,
            properties: PropertyMap::new(),
            prototype,
            extensible: true,
        }))
    }

    pub fn new_ordinary(prototype: Option<JsObjectType>) -> JsObjectType {
        JsObject::new(ObjectKind::Ordinary, prototype)
    }

    pub fn new_array(values: Vec<JsValue>, prototype: Option<JsObjectType>) -> JsObjectType {
        JsObject::new(ObjectKind::Array(values), prototype)
    }

    pub fn is_callable(&self) -> bool {
        matches!(self.kind, ObjectKind::Function(_))
    }

    pub fn is_array(&self) -> bool {
        matches!(self.kind, ObjectKind::Array(_))
    }

    pub fn as_function(&self) -> Option<&FunctionObject> {
        match &self.kind {
            ObjectKind::Function(f) => Some(f),
            _ => None,
        }
    }

    pub fn as_date(&self) -> Option<f64> {
        match self.kind {
            ObjectKind::Date(t) => Some(t),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&Vec<JsValue>> {
        match &self.kind {
            ObjectKind::Array(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_array_mut(&mut self) -> Option<&mut Vec<JsValue>> {
        match &mut self.kind {
            ObjectKind::Array(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_promise(&self) -> Option<&PromiseRecord> {
        match &self.kind {
            ObjectKind::Promise(p) => Some(p),
            _ => None,
        }
    }

    pub fn as_promise_mut(&mut self) -> Option<&mut PromiseRecord> {
        match &mut self.kind {
            ObjectKind::Promise(p) => Some(p),
            _ => None,
        }
    }

    pub fn class_name(&self) -> &'static str {
        match self.kind {
            ObjectKind::Ordinary => "Object",
            ObjectKind::Array(_) => "Array",
            ObjectKind::Function(_) => "Function",
            ObjectKind::Error => "Error",
            ObjectKind::Promise(_) => "Promise",
            ObjectKind::Date(_) => "Date",
            ObjectKind::Global => "Window",
        }
    }

    /// Own property lookup, including the virtual `length`, index and `name` slots.
    pub fn get_own_property(&self, key: &str) -> Option<JsValue> {
        match &self.kind {
            ObjectKind::Array(values) => {
                if key == "length" {
                    return Some(JsValue::from_i64(values.len() as i64));
                }
                if let Some(i) = as_array_index(key) {
                    return values.get(i).cloned();
                }
            }
            ObjectKind::Function(f) => {
                if !self.properties.contains_key(key) {
                    if key == "name" {
                        return Some(JsValue::String(f.name.to_string()));
                    }
                    if key == "length" {
                        return Some(JsValue::from_i64(f.length as i64));
                    }
                }
            }
            _ => {}
        }
        self.properties.get(key).map(|d| d.value.clone())
    }

    pub fn has_own_property(&self, key: &str) -> bool {
        match &self.kind {
            ObjectKind::Array(values) => {
                if key == "length" {
                    return true;
                }
                if let Some(i) = as_array_index(key) {
                    return i < values.len();
                }
            }
            ObjectKind::Function(_) if key == "name" || key == "length" => return true,
            _ => {}
        }
        self.properties.contains_key(key)
    }

    /// Assigns an own data property. Returns false when the write is rejected
    /// (frozen object or read-only property), which sloppy-mode code ignores.
    pub fn set_own_property(&mut self, key: &str, value: JsValue) -> bool {
        let extensible = self.extensible;
        if let ObjectKind::Array(values) = &mut self.kind {
            if key == "length" {
                if !extensible {
                    return false;
                }
                let new_len = match &value {
                    JsValue::Number(n) => n.as_f64(),
                    _ => f64::NAN,
                };
                if is_valid_array_length(new_len) {
                    values.resize(new_len as usize, JsValue::Undefined);
                    return true;
                }
                return false;
            }
            if let Some(i) = as_array_index(key) {
                if !extensible || i >= MAX_ARRAY_LENGTH {
                    return false;
                }
                if i >= values.len() {
                    values.resize(i + 1, JsValue::Undefined);
                }
                values[i] = value;
                return true;
            }
        }
        match self.properties.get_mut(key) {
            Some(d) => {
                if !d.writable {
                    return false;
                }
                d.value = value;
                true
            }
            None => {
                if !self.extensible {
                    return false;
                }
                self.properties
                    .insert(key.to_string(), PropertyDescriptor::new_data(value));
                true
            }
        }
    }

    /// Installs a non-enumerable property, as used for built-ins and internal slots.
    pub fn define_hidden_property(&mut self, key: &str, value: JsValue) {
        self.properties
            .insert(key.to_string(), PropertyDescriptor::new_hidden(value));
    }

    pub fn delete_own_property(&mut self, key: &str) -> bool {
        if let ObjectKind::Array(values) = &mut self.kind {
            if key == "length" {
                return false;
            }
            if let Some(i) = as_array_index(key) {
                if i < values.len() {
                    values[i] = JsValue::Undefined;
                }
                return true;
            }
        }
        match self.properties.get(key) {
            Some(d) if !d.configurable => false,
            Some(_) => {
                self.properties.remove(key);
                true
            }
            None => true,
        }
    }

    /// Own enumerable string keys in JS order; array elements come first.
    pub fn own_enumerable_keys(&self) -> Vec<String> {
        let mut keys = vec![];
        if let ObjectKind::Array(values) = &self.kind {
            keys.extend((0..values.len()).map(|i| i.to_string()));
        }
        keys.extend(self.properties.enumerable_keys());
        keys
    }

    pub fn own_keys(&self) -> Vec<String> {
        let mut keys = vec![];
        if let ObjectKind::Array(values) = &self.kind {
            keys.extend((0..values.len()).map(|i| i.to_string()));
            keys.push("length".to_string());
        }
        keys.extend(self.properties.keys());
        keys
    }

    /// `Object.freeze`: no new properties, every existing one read-only.
    pub fn freeze(&mut self) {
        self.extensible = false;
        let keys = self.properties.keys();
        for k in keys {
            if let Some(d) = self.properties.get_mut(&k) {
                d.writable = false;
                d.configurable = false;
            }
        }
    }

    /// Rejects array writes the dense storage cannot hold: a bad `length`, or an
    /// index at or past [`MAX_ARRAY_LENGTH`].
    pub fn check_array_write(&self, key: &str, value: &JsValue) -> Result<(), JErrorType> {
        if !self.is_array() {
            return Ok(());
        }
        if key == "length" {
            let len = match value {
                JsValue::Number(n) => n.as_f64(),
                _ => f64::NAN,
            };
            if !is_valid_array_length(len) {
                return Err(invalid_array_length());
            }
        } else if as_array_index(key).map_or(false, |i| i >= MAX_ARRAY_LENGTH) {
            return Err(invalid_array_length());
        }
        Ok(())
    }

    pub fn is_frozen(&self) -> bool {
        !self.extensible && self.properties.iter().all(|(_, d)| !d.writable)
    }
}

/// Property lookup along the prototype chain.
pub fn get_property(object: &JsObjectType, key: &str) -> Option<JsValue> {
    let mut current = Some(object.clone());
    while let Some(o) = current {
        let o_ref = o.borrow();
        if let Some(v) = o_ref.get_own_property(key) {
            return Some(v);
        }
        current = o_ref.prototype.clone();
    }
    None
}

pub fn has_property(object: &JsObjectType, key: &str) -> bool {
    let mut current = Some(object.clone());
    while let Some(o) = current {
        let o_ref = o.borrow();
        if o_ref.has_own_property(key) {
            return true;
        }
        current = o_ref.prototype.clone();
    }
    false
}

/// True when `prototype` appears anywhere on `object`'s prototype chain.
pub fn inherits_from(object: &JsObjectType, prototype: &JsObjectType) -> bool {
    let mut current = object.borrow().prototype.clone();
    while let Some(p) = current {
        if Rc::ptr_eq(&p, prototype) {
            return true;
        }
        current = p.borrow().prototype.clone();
    }
    false
}
