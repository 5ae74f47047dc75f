//! Object built-in.
//!
//! Provides the Object constructor, its static helpers and `Object.prototype`.

use crate::runner::ds::error::JErrorType;
use crate::runner::ds::object::{JsObject, JsObjectType};
use crate::runner::ds::operations::object::get_value_property;
use crate::runner::ds::operations::test_and_comparison::is_same_value;
use crate::runner::ds::operations::type_conversion::{to_property_key, to_string};
use crate::runner::ds::value::JsValue;
use crate::runner::plugin::registry::BuiltInRegistry;
use crate::runner::plugin::types::{BuiltInObject, EvalContext};

use super::arg;

/// Register the Object built-in with the registry.
pub fn register(registry: &mut BuiltInRegistry) {
    let object = BuiltInObject::new("Object")
        .with_no_prototype()
        .with_constructor(object_constructor)
        .add_static_method("keys", object_keys)
        .add_static_method("values", object_values)
        .add_static_method("entries", object_entries)
        .add_static_method("assign", object_assign)
        .add_static_method("freeze", object_freeze)
        .add_static_method("isFrozen", object_is_frozen)
        .add_static_method("create", object_create)
        .add_static_method("fromEntries", object_from_entries)
        .add_static_method("getPrototypeOf", object_get_prototype_of)
        .add_static_method("is", object_is)
        .add_method("hasOwnProperty", object_has_own_property)
        .add_method("toString", object_to_string)
        .add_method("valueOf", object_value_of);

    registry.register_object(object);
}

/// Object constructor.
fn object_constructor(ctx: &mut EvalContext, _this: JsValue, args: Vec<JsValue>) -> Result<JsValue, JErrorType> {
    match arg(&args, 0) {
        v @ JsValue::Object(_) => Ok(v),
        _ => Ok(JsValue::Object(ctx.new_object())),
    }
}

fn require_object_coercible(v: &JsValue) -> Result<(), JErrorType> {
    if v.is_nullish() {
        Err(JErrorType::TypeError("Cannot convert undefined or null to object".to_string()))
    } else {
        Ok(())
    }
}

/// Own enumerable keys of any non-nullish value; strings expose their indices.
fn own_keys_of(v: &JsValue) -> Result<Vec<String>, JErrorType> {
    require_object_coercible(v)?;
    Ok(match v {
        JsValue::Object(o) => o.borrow().own_enumerable_keys(),
        JsValue::String(s) => (0..s.chars().count()).map(|i| i.to_string()).collect(),
        _ => vec![],
    })
}

/// Object.keys
fn object_keys(ctx: &mut EvalContext, _this: JsValue, args: Vec<JsValue>) -> Result<JsValue, JErrorType> {
    let keys = own_keys_of(&arg(&args, 0))?;
    Ok(ctx.new_array(keys.into_iter().map(JsValue::String).collect()))
}

/// Object.values
fn object_values(ctx: &mut EvalContext, _this: JsValue, args: Vec<JsValue>) -> Result<JsValue, JErrorType> {
    let target = arg(&args, 0);
    let mut values = vec![];
    for key in own_keys_of(&target)? {
        values.push(get_value_property(ctx, &target, &key)?);
    }
    Ok(ctx.new_array(values))
}

/// Object.entries
fn object_entries(ctx: &mut EvalContext, _this: JsValue, args: Vec<JsValue>) -> Result<JsValue, JErrorType> {
    let target = arg(&args, 0);
    let mut entries = vec![];
    for key in own_keys_of(&target)? {
        let value = get_value_property(ctx, &target, &key)?;
        entries.push(ctx.new_array(vec![JsValue::String(key), value]));
    }
    Ok(ctx.new_array(entries))
}

/// Object.assign
fn object_assign(ctx: &mut EvalContext, _this: JsValue, args: Vec<JsValue>) -> Result<JsValue, JErrorType> {
    let target = arg(&args, 0);
    require_object_coercible(&target)?;
    let target_object = match &target {
        JsValue::Object(o) => o.clone(),
        _ => return Ok(target),
    };
    for source in args.iter().skip(1) {
        if source.is_nullish() {
            continue;
        }
        for key in own_keys_of(source)? {
            let v = get_value_property(ctx, source, &key)?;
            if !target_object.borrow_mut().set_own_property(&key, v) {
                return Err(JErrorType::TypeError(format!(
                    "Cannot assign to read only property '{}' of object",
                    key
                )));
            }
        }
    }
    Ok(target)
}

/// Object.freeze
fn object_freeze(_ctx: &mut EvalContext, _this: JsValue, args: Vec<JsValue>) -> Result<JsValue, JErrorType> {
    let target = arg(&args, 0);
    if let JsValue::Object(o) = &target {
        o.borrow_mut().freeze();
    }
    Ok(target)
}

/// Object.isFrozen
fn object_is_frozen(_ctx: &mut EvalContext, _this: JsValue, args: Vec<JsValue>) -> Result<JsValue, JErrorType> {
    Ok(JsValue::Boolean(match arg(&args, 0) {
        JsValue::Object(o) => o.borrow().is_frozen(),
        _ => true,
    }))
}

/// Object.create
fn object_create(_ctx: &mut EvalContext, _this: JsValue, args: Vec<JsValue>) -> Result<JsValue, JErrorType> {
    let proto: Option<JsObjectType> = match arg(&args, 0) {
        JsValue::Null => None,
        JsValue::Object(o) => Some(o),
        other => {
            return Err(JErrorType::TypeError(format!(
                "Object prototype may only be an Object or null: {}",
                to_string(&other)
            )))
        }
    };
    Ok(JsValue::Object(JsObject::new_ordinary(proto)))
}

/// Object.fromEntries
fn object_from_entries(ctx: &mut EvalContext, _this: JsValue, args: Vec<JsValue>) -> Result<JsValue, JErrorType> {
    let entries = arg(&args, 0);
    let pairs = match &entries {
        JsValue::Object(o) => o.borrow().as_array().cloned(),
        _ => None,
    };
    let pairs = match pairs {
        Some(p) => p,
        None => return Err(JErrorType::TypeError(format!("{} is not iterable", to_string(&entries)))),
    };
    let object = ctx.new_object();
    for pair in pairs {
        let key = get_value_property(ctx, &pair, "0")?;
        let value = get_value_property(ctx, &pair, "1")?;
        object.borrow_mut().set_own_property(&to_property_key(&key), value);
    }
    Ok(JsValue::Object(object))
}

/// Object.getPrototypeOf
fn object_get_prototype_of(ctx: &mut EvalContext, _this: JsValue, args: Vec<JsValue>) -> Result<JsValue, JErrorType> {
    let target = arg(&args, 0);
    require_object_coercible(&target)?;
    let proto = match &target {
        JsValue::Object(o) => o.borrow().prototype.clone(),
        JsValue::String(_) => Some(ctx.prototype_of("String")),
        JsValue::Number(_) => Some(ctx.prototype_of("Number")),
        JsValue::Boolean(_) => Some(ctx.prototype_of("Boolean")),
        _ => None,
    };
    Ok(proto.map_or(JsValue::Null, JsValue::Object))
}

/// Object.is
fn object_is(_ctx: &mut EvalContext, _this: JsValue, args: Vec<JsValue>) -> Result<JsValue, JErrorType> {
    Ok(JsValue::Boolean(is_same_value(&arg(&args, 0), &arg(&args, 1))))
}

/// Object.prototype.hasOwnProperty
fn object_has_own_property(_ctx: &mut EvalContext, this: JsValue, args: Vec<JsValue>) -> Result<JsValue, JErrorType> {
    let key = to_property_key(&arg(&args, 0));
    require_object_coercible(&this)?;
    Ok(JsValue::Boolean(match &this {
        JsValue::Object(o) => o.borrow().has_own_property(&key),
        JsValue::String(s) => key == "length" || key.parse::<usize>().map_or(false, |i| i < s.chars().count()),
        _ => false,
    }))
}

/// Object.prototype.toString
fn object_to_string(_ctx: &mut EvalContext, this: JsValue, _args: Vec<JsValue>) -> Result<JsValue, JErrorType> {
    let tag = match &this {
        JsValue::Undefined => "Undefined",
        JsValue::Null => "Null",
        JsValue::Boolean(_) => "Boolean",
        JsValue::Number(_) => "Number",
        JsValue::String(_) => "String",
        JsValue::Object(o) => o.borrow().class_name(),
    };
    Ok(JsValue::String(format!("[object {}]", tag)))
}

/// Object.prototype.valueOf
fn object_value_of(_ctx: &mut EvalContext, this: JsValue, _args: Vec<JsValue>) -> Result<JsValue, JErrorType> {
    require_object_coercible(&this)?;
    Ok(this)
}
