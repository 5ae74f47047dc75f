//! Global functions and constants: `parseInt`, `parseFloat`, `isNaN`, `isFinite`,
//! `NaN`, `Infinity` and `undefined`.

use crate::runner::ds::error::JErrorType;
use crate::runner::ds::operations::type_conversion::to_number;
use crate::runner::ds::value::JsValue;
use crate::runner::plugin::registry::BuiltInRegistry;
use crate::runner::plugin::types::EvalContext;

use super::arg;
use super::number::{number_parse_float, number_parse_int};

/// Register the global functions and constants with the registry.
pub fn register(registry: &mut BuiltInRegistry) {
    registry.register_function("parseInt", number_parse_int);
    registry.register_function("parseFloat", number_parse_float);
    registry.register_function("isNaN", global_is_nan);
    registry.register_function("isFinite", global_is_finite);

    registry.register_value("NaN", JsValue::from_f64(f64::NAN));
    registry.register_value("Infinity", JsValue::from_f64(f64::INFINITY));
    registry.register_value("undefined", JsValue::Undefined);
}

/// isNaN - coerces its argument first, unlike `Number.isNaN`.
fn global_is_nan(_ctx: &mut EvalContext, _this: JsValue, args: Vec<JsValue>) -> Result<JsValue, JErrorType> {
    Ok(JsValue::Boolean(to_number(&arg(&args, 0)).is_nan()))
}

/// isFinite
fn global_is_finite(_ctx: &mut EvalContext, _this: JsValue, args: Vec<JsValue>) -> Result<JsValue, JErrorType> {
    Ok(JsValue::Boolean(to_number(&arg(&args, 0)).is_finite()))
}
