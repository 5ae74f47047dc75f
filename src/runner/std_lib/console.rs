//! Console built-in object.
//!
//! Provides console.log, console.info, console.warn, console.error and console.debug.
//! Every call is formatted into one line and handed to the context's console sink.

use crate::runner::ds::error::JErrorType;
use crate::runner::ds::operations::type_conversion::to_string;
use crate::runner::ds::value::JsValue;
use crate::runner::plugin::registry::BuiltInRegistry;
use crate::runner::plugin::types::{BuiltInObject, ConsoleLevel, EvalContext};

use super::json::stringify;

/// Register the console object with the registry.
pub fn register(registry: &mut BuiltInRegistry) {
    let console = BuiltInObject::new("console")
        .add_method("log", console_log)
        .add_method("info", console_info)
        .add_method("warn", console_warn)
        .add_method("error", console_error)
        .add_method("debug", console_debug);

    registry.register_object(console);
}

/// Formats one console argument: objects (arrays and `null` included) as
/// `JSON.stringify(x, null, 2)`, everything else as `String(x)`.
pub fn format_value(ctx: &mut EvalContext, value: &JsValue) -> Result<String, JErrorType> {
    match value {
        JsValue::Null => Ok("null".to_string()),
        JsValue::Object(o) if !o.borrow().is_callable() => {
            let text = stringify(ctx, value, &JsValue::Undefined, &JsValue::from_i64(2))?;
            Ok(text.unwrap_or_default())
        }
        _ => Ok(to_string(value)),
    }
}

/// Formats all arguments of one call, separated by single spaces.
pub fn format_args(ctx: &mut EvalContext, args: &[JsValue]) -> Result<String, JErrorType> {
    let mut parts = Vec::with_capacity(args.len());
    for a in args {
        parts.push(format_value(ctx, a)?);
    }
    Ok(parts.join(" "))
}

fn write(ctx: &mut EvalContext, level: ConsoleLevel, args: &[JsValue]) -> Result<JsValue, JErrorType> {
    let line = format_args(ctx, args)?;
    ctx.console_write(level, &line);
    Ok(JsValue::Undefined)
}

/// console.log
fn console_log(ctx: &mut EvalContext, _this: JsValue, args: Vec<JsValue>) -> Result<JsValue, JErrorType> {
    write(ctx, ConsoleLevel::Log, &args)
}

/// console.info
fn console_info(ctx: &mut EvalContext, _this: JsValue, args: Vec<JsValue>) -> Result<JsValue, JErrorType> {
    write(ctx, ConsoleLevel::Info, &args)
}

/// console.warn
fn console_warn(ctx: &mut EvalContext, _this: JsValue, args: Vec<JsValue>) -> Result<JsValue, JErrorType> {
    write(ctx, ConsoleLevel::Warn, &args)
}

/// console.error
fn console_error(ctx: &mut EvalContext, _this: JsValue, args: Vec<JsValue>) -> Result<JsValue, JErrorType> {
    write(ctx, ConsoleLevel::Error, &args)
}

/// console.debug
fn console_debug(ctx: &mut EvalContext, _this: JsValue, args: Vec<JsValue>) -> Result<JsValue, JErrorType> {
    write(ctx, ConsoleLevel::Debug, &args)
}
