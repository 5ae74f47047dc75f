use crate::runner::ds::error::JErrorType;
use crate::runner::ds::function_object::FunctionKind;
use crate::runner::ds::object::{get_property, JsObject, JsObjectType, ObjectKind};
use crate::runner::ds::object_property::as_array_index;
use crate::runner::ds::operations::type_conversion::to_string;
use crate::runner::ds::value::JsValue;
use crate::runner::plugin::types::EvalContext;

/// `GetV`: property read on any value, boxing primitives through their prototypes.
pub fn get_value_property(ctx: &mut EvalContext, base: &JsValue, key: &str) -> Result<JsValue, JErrorType> {
    match base {
        JsValue::Undefined | JsValue::Null => Err(JErrorType::TypeError(format!(
            "Cannot read properties of {} (reading '{}')",
            base_name(base),
            key
        ))),
        JsValue::String(s) => {
            if key == "length" {
                return Ok(JsValue::from_i64(s.chars().count() as i64));
            }
            if let Some(i) = as_array_index(key) {
                return Ok(match s.chars().nth(i) {
                    Some(c) => JsValue::String(c.to_string()),
                    None => JsValue::Undefined,
                });
            }
            let proto = ctx.prototype_of("String");
            Ok(get_property(&proto, key).unwrap_or(JsValue::Undefined))
        }
        JsValue::Number(_) => {
            let proto = ctx.prototype_of("Number");
            Ok(get_property(&proto, key).unwrap_or(JsValue::Undefined))
        }
        JsValue::Boolean(_) => {
            let proto = ctx.prototype_of("Boolean");
            Ok(get_property(&proto, key).unwrap_or(JsValue::Undefined))
        }
        JsValue::Object(o) => Ok(get_object_property(ctx, o, key)),
    }
}

pub fn get_object_property(ctx: &mut EvalContext, o: &JsObjectType, key: &str) -> JsValue {
    if key == "prototype" {
        ensure_function_prototype(ctx, o);
    }
    if let Some(v) = get_property(o, key) {
        return v;
    }
    if matches!(o.borrow().kind, ObjectKind::Global) {
        if let Some(v) = ctx.resolve_super_global(key) {
            return v;
        }
    }
    JsValue::Undefined
}

/// Ordinary functions get their `prototype` object the first time it is asked for.
fn ensure_function_prototype(ctx: &mut EvalContext, o: &JsObjectType) {
    let needs_prototype = {
        let o_ref = o.borrow();
        match o_ref.as_function() {
            Some(f) => {
                matches!(f.kind, FunctionKind::Script { .. })
                    && f.is_constructor()
                    && !o_ref.properties.contains_key("prototype")
            }
            None => false,
        }
    };
    if needs_prototype {
        let object_proto = ctx.prototype_of("Object");
        let proto = JsObject::new_ordinary(Some(object_proto));
        proto
            .borrow_mut()
            .define_hidden_property("constructor", JsValue::Object(o.clone()));
        let mut o_mut = o.borrow_mut();
        o_mut.set_own_property("prototype", JsValue::Object(proto));
        if let Some(d) = o_mut.properties.get_mut("prototype") {
            d.enumerable = false;
        }
    }
}

/// `PutValue` on a property reference. Writes to primitives are dropped, as in sloppy mode.
pub fn set_value_property(
    ctx: &mut EvalContext,
    base: &JsValue,
    key: &str,
    value: JsValue,
) -> Result<(), JErrorType> {
    match base {
        JsValue::Undefined | JsValue::Null => Err(JErrorType::TypeError(format!(
            "Cannot set properties of {} (setting '{}')",
            base_name(base),
            key
        ))),
        JsValue::Object(o) => {
            if key == "prototype" {
                ensure_function_prototype(ctx, o);
            }
            o.borrow().check_array_write(key, &value)?;
            o.borrow_mut().set_own_property(key, value);
            Ok(())
        }
        _ => Ok(()),
    }
}

pub fn delete_value_property(base: &JsValue, key: &str) -> Result<bool, JErrorType> {
    match base {
        JsValue::Undefined | JsValue::Null => Err(JErrorType::TypeError(format!(
            "Cannot convert undefined or null to object (deleting '{}')",
            key
        ))),
        JsValue::Object(o) => Ok(o.borrow_mut().delete_own_property(key)),
        _ => Ok(true),
    }
}

fn base_name(base: &JsValue) -> &'static str {
    match base {
        JsValue::Null => "null",
        _ => "undefined",
    }
}

/// Every enumerable string key visible to `for...in`, own keys first, then inherited ones.
pub fn enumerable_keys_with_inherited(o: &JsObjectType) -> Vec<String> {
    let mut keys: Vec<String> = vec![];
    let mut shadowed: Vec<String> = vec![];
    let mut current = Some(o.clone());
    while let Some(obj) = current {
        let obj_ref = obj.borrow();
        for k in obj_ref.own_enumerable_keys() {
            if !shadowed.contains(&k) {
                keys.push(k.to_string());
                shadowed.push(k);
            }
        }
        for k in obj_ref.own_keys() {
            if !shadowed.contains(&k) {
                shadowed.push(k);
            }
        }
        current = obj_ref.prototype.clone();
    }
    keys
}

/// Materializes an iterable into its values. Arrays and strings are the iterables the runtime knows.
pub fn iterate_to_vec(value: &JsValue, label: Option<&str>) -> Result<Vec<JsValue>, JErrorType> {
    match value {
        JsValue::String(s) => Ok(s.chars().map(|c| JsValue::String(c.to_string())).collect()),
        JsValue::Object(o) => match o.borrow().as_array() {
            Some(values) => Ok(values.clone()),
            None => Err(not_iterable(value, label)),
        },
        _ => Err(not_iterable(value, label)),
    }
}

pub fn not_iterable(value: &JsValue, label: Option<&str>) -> JErrorType {
    let described = match (label, value) {
        (Some(l), _) => l.to_string(),
        (None, JsValue::Object(o)) if o.borrow().is_callable() => "function".to_string(),
        (None, JsValue::Object(_)) => "object".to_string(),
        (None, JsValue::Number(n)) => format!("number {}", n),
        (None, JsValue::Boolean(b)) => format!("boolean {}", b),
        (None, v) => to_string(v),
    };
    JErrorType::TypeError(format!("{} is not iterable", described))
}
