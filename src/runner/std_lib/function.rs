//! Function built-in: `Function.prototype.call`, `apply`, `bind` and `toString`.

use crate::runner::ds::error::JErrorType;
use crate::runner::ds::function_object::{FunctionKind, FunctionObject};
use crate::runner::ds::object::get_property;
use crate::runner::ds::operations::type_conversion::{to_integer_or_infinity, to_string};
use crate::runner::ds::value::JsValue;
use crate::runner::eval::function::{call_function, describe_value};
use crate::runner::plugin::registry::BuiltInRegistry;
use crate::runner::plugin::types::{BuiltInObject, EvalContext};

use super::arg;

/// Register the Function built-in with the registry.
pub fn register(registry: &mut BuiltInRegistry) {
    let function = BuiltInObject::new("Function")
        .with_constructor(function_constructor)
        .add_method("call", function_call)
        .add_method("apply", function_apply)
        .add_method("bind", function_bind)
        .add_method("toString", function_to_string);

    registry.register_object(function);
}

fn require_callable(this: &JsValue, method: &str) -> Result<(), JErrorType> {
    if this.is_callable() {
        Ok(())
    } else {
        Err(JErrorType::TypeError(format!(
            "Function.prototype.{} called on {}, which is not a function",
            method,
            describe_value(this)
        )))
    }
}

/// Function constructor. Snippets cannot compile code from strings.
fn function_constructor(_ctx: &mut EvalContext, _this: JsValue, _args: Vec<JsValue>) -> Result<JsValue, JErrorType> {
    Err(JErrorType::SyntaxError(
        "Code generation from strings disallowed for this context".to_string(),
    ))
}

/// Function.prototype.call
fn function_call(ctx: &mut EvalContext, this: JsValue, args: Vec<JsValue>) -> Result<JsValue, JErrorType> {
    require_callable(&this, "call")?;
    let mut args = args.into_iter();
    let this_arg = args.next().unwrap_or(JsValue::Undefined);
    call_function(ctx, &this, this_arg, args.collect())
}

/// Function.prototype.apply
fn function_apply(ctx: &mut EvalContext, this: JsValue, args: Vec<JsValue>) -> Result<JsValue, JErrorType> {
    require_callable(&this, "apply")?;
    let this_arg = arg(&args, 0);
    let call_args = match arg(&args, 1) {
        JsValue::Undefined | JsValue::Null => vec![],
        JsValue::Object(o) => {
            let values = o.borrow().as_array().cloned();
            match values {
                Some(values) => values,
                None => {
                    let len = get_property(&o, "length").map_or(0.0, |l| to_integer_or_infinity(&l).max(0.0));
                    (0..len as usize)
                        .map(|i| get_property(&o, &i.to_string()).unwrap_or(JsValue::Undefined))
                        .collect()
                }
            }
        }
        _ => {
            return Err(JErrorType::TypeError(
                "CreateListFromArrayLike called on non-object".to_string(),
            ))
        }
    };
    call_function(ctx, &this, this_arg, call_args)
}

/// Function.prototype.bind
fn function_bind(ctx: &mut EvalContext, this: JsValue, args: Vec<JsValue>) -> Result<JsValue, JErrorType> {
    require_callable(&this, "bind")?;
    let (name, length) = match &this {
        JsValue::Object(o) => {
            let target_name = get_property(o, "name").map(|n| to_string(&n)).unwrap_or_default();
            let target_length = o.borrow().as_function().map_or(0, |f| f.length);
            (format!("bound {}", target_name), target_length)
        }
        _ => (String::from("bound "), 0),
    };
    let mut args = args.into_iter();
    let this_value = args.next().unwrap_or(JsValue::Undefined);
    let bound_args: Vec<JsValue> = args.collect();
    let function = FunctionObject {
        name,
        length: length.saturating_sub(bound_args.len()),
        kind: FunctionKind::Bound {
            target: this,
            this_value,
            args: bound_args,
        },
    };
    Ok(JsValue::Object(ctx.new_function_object(function)))
}

/// Function.prototype.toString
fn function_to_string(_ctx: &mut EvalContext, this: JsValue, _args: Vec<JsValue>) -> Result<JsValue, JErrorType> {
    require_callable(&this, "toString")?;
    Ok(JsValue::String(to_string(&this)))
}
