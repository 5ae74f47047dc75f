//! `Error` and its subclasses. Instances get an own `message`; `name` comes
//! from the prototype.

use crate::runner::ds::error::JErrorType;
use crate::runner::ds::operations::type_conversion::{error_to_string, to_string};
use crate::runner::ds::value::JsValue;
use crate::runner::plugin::registry::BuiltInRegistry;
use crate::runner::plugin::types::{BuiltInObject, EvalContext, NativeFn};

pub fn register(registry: &mut BuiltInRegistry) {
    let error = BuiltInObject::new("Error")
        .with_constructor(error_constructor)
        .add_prototype_property("name", JsValue::String("Error".to_string()))
        .add_prototype_property("message", JsValue::String(String::new()))
        .add_method("toString", error_to_string_method);
    registry.register_object(error);

    let subclasses: [(&str, NativeFn); 4] = [
        ("TypeError", type_error_constructor),
        ("ReferenceError", reference_error_constructor),
        ("SyntaxError", syntax_error_constructor),
        ("RangeError", range_error_constructor),
    ];
    for (name, constructor) in subclasses {
        let subclass = BuiltInObject::new(name)
            .with_prototype("Error")
            .with_constructor(constructor)
            .add_prototype_property("name", JsValue::String(name.to_string()));
        registry.register_object(subclass);
    }
}

/// Builds the error for `new Kind(message)` and plain `Kind(message)` alike.
fn construct_error(ctx: &mut EvalContext, kind: &str, args: &[JsValue]) -> Result<JsValue, JErrorType> {
    let message = match args.first() {
        None | Some(JsValue::Undefined) => String::new(),
        Some(m) => to_string(m),
    };
    Ok(ctx.create_error(kind, &message))
}

macro_rules! error_constructors {
    ($($fn_name:ident => $kind:literal),* $(,)?) => {
        $(
            fn $fn_name(ctx: &mut EvalContext, _this: JsValue, args: Vec<JsValue>) -> Result<JsValue, JErrorType> {
                construct_error(ctx, $kind, &args)
            }
        )*
    };
}

error_constructors! {
    error_constructor => "Error",
    type_error_constructor => "TypeError",
    reference_error_constructor => "ReferenceError",
    syntax_error_constructor => "SyntaxError",
    range_error_constructor => "RangeError",
}

/// Error.prototype.toString
fn error_to_string_method(
    _ctx: &mut EvalContext,
    this: JsValue,
    _args: Vec<JsValue>,
) -> Result<JsValue, JErrorType> {
    match &this {
        JsValue::Object(o) => Ok(JsValue::String(error_to_string(o))),
        _ => Err(JErrorType::TypeError(
            "Error.prototype.toString requires that 'this' be an Object".to_string(),
        )),
    }
}
