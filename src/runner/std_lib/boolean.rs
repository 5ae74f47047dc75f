//! Boolean built-in.

use crate::runner::ds::error::JErrorType;
use crate::runner::ds::operations::type_conversion::to_boolean;
use crate::runner::ds::value::JsValue;
use crate::runner::plugin::registry::BuiltInRegistry;
use crate::runner::plugin::types::{BuiltInObject, EvalContext};

use super::arg;

/// Register the Boolean built-in with the registry.
pub fn register(registry: &mut BuiltInRegistry) {
    let boolean = BuiltInObject::new("Boolean")
        .with_constructor(boolean_constructor)
        .add_method("toString", boolean_to_string)
        .add_method("valueOf", boolean_value_of);

    registry.register_object(boolean);
}

fn this_boolean(this: &JsValue, method: &str) -> Result<bool, JErrorType> {
    match this {
        JsValue::Boolean(b) => Ok(*b),
        _ => Err(JErrorType::TypeError(format!(
            "Boolean.prototype.{} requires that 'this' be a Boolean",
            method
        ))),
    }
}

/// Boolean constructor.
fn boolean_constructor(_ctx: &mut EvalContext, _this: JsValue, args: Vec<JsValue>) -> Result<JsValue, JErrorType> {
    Ok(JsValue::Boolean(to_boolean(&arg(&args, 0))))
}

/// Boolean.prototype.toString
fn boolean_to_string(_ctx: &mut EvalContext, this: JsValue, _args: Vec<JsValue>) -> Result<JsValue, JErrorType> {
    Ok(JsValue::String(this_boolean(&this, "toString")?.to_string()))
}

/// Boolean.prototype.valueOf
fn boolean_value_of(_ctx: &mut EvalContext, this: JsValue, _args: Vec<JsValue>) -> Result<JsValue, JErrorType> {
    Ok(JsValue::Boolean(this_boolean(&this, "valueOf")?))
}
