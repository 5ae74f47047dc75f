//! Math built-in object.
//!
//! Provides mathematical constants and functions. `Math.random` draws from the
//! context's own generator, so a seeded context replays the same sequence.

use crate::runner::ds::error::JErrorType;
use crate::runner::ds::operations::type_conversion::{to_int32, to_number, to_uint32};
use crate::runner::ds::value::JsValue;
use crate::runner::plugin::registry::BuiltInRegistry;
use crate::runner::plugin::types::{BuiltInObject, EvalContext};

use super::arg;

/// Register the Math object with the registry.
pub fn register(registry: &mut BuiltInRegistry) {
    let math = BuiltInObject::new("Math")
        // Constants
        .add_property("E", JsValue::from_f64(std::f64::consts::E))
        .add_property("LN10", JsValue::from_f64(std::f64::consts::LN_10))
        .add_property("LN2", JsValue::from_f64(std::f64::consts::LN_2))
        .add_property("LOG10E", JsValue::from_f64(std::f64::consts::LOG10_E))
        .add_property("LOG2E", JsValue::from_f64(std::f64::consts::LOG2_E))
        .add_property("PI", JsValue::from_f64(std::f64::consts::PI))
        .add_property("SQRT1_2", JsValue::from_f64(std::f64::consts::FRAC_1_SQRT_2))
        .add_property("SQRT2", JsValue::from_f64(std::f64::consts::SQRT_2))
        // Methods
        .add_method("abs", math_abs)
        .add_method("floor", math_floor)
        .add_method("ceil", math_ceil)
        .add_method("round", math_round)
        .add_method("trunc", math_trunc)
        .add_method("sign", math_sign)
        .add_method("min", math_min)
        .add_method("max", math_max)
        .add_method("sqrt", math_sqrt)
        .add_method("cbrt", math_cbrt)
        .add_method("pow", math_pow)
        .add_method("exp", math_exp)
        .add_method("log", math_log)
        .add_method("log10", math_log10)
        .add_method("log2", math_log2)
        .add_method("sin", math_sin)
        .add_method("cos", math_cos)
        .add_method("tan", math_tan)
        .add_method("atan", math_atan)
        .add_method("atan2", math_atan2)
        .add_method("hypot", math_hypot)
        .add_method("random", math_random)
        .add_method("clz32", math_clz32)
        .add_method("imul", math_imul);

    registry.register_object(math);
}

fn unary(args: &[JsValue], f: fn(f64) -> f64) -> Result<JsValue, JErrorType> {
    Ok(JsValue::from_f64(f(to_number(&arg(args, 0)))))
}

/// Math.abs
fn math_abs(_ctx: &mut EvalContext, _this: JsValue, args: Vec<JsValue>) -> Result<JsValue, JErrorType> {
    unary(&args, f64::abs)
}

/// Math.floor
fn math_floor(_ctx: &mut EvalContext, _this: JsValue, args: Vec<JsValue>) -> Result<JsValue, JErrorType> {
    unary(&args, f64::floor)
}

/// Math.ceil
fn math_ceil(_ctx: &mut EvalContext, _this: JsValue, args: Vec<JsValue>) -> Result<JsValue, JErrorType> {
    unary(&args, f64::ceil)
}

/// Math.round - halves round towards +Infinity, unlike `f64::round`.
fn math_round(_ctx: &mut EvalContext, _this: JsValue, args: Vec<JsValue>) -> Result<JsValue, JErrorType> {
    unary(&args, |x| {
        if !x.is_finite() || x.fract() == 0.0 {
            x
        } else {
            (x + 0.5).floor()
        }
    })
}

/// Math.trunc
fn math_trunc(_ctx: &mut EvalContext, _this: JsValue, args: Vec<JsValue>) -> Result<JsValue, JErrorType> {
    unary(&args, f64::trunc)
}

/// Math.sign
fn math_sign(_ctx: &mut EvalContext, _this: JsValue, args: Vec<JsValue>) -> Result<JsValue, JErrorType> {
    unary(&args, |x| if x.is_nan() || x == 0.0 { x } else { x.signum() })
}

/// Math.min
fn math_min(_ctx: &mut EvalContext, _this: JsValue, args: Vec<JsValue>) -> Result<JsValue, JErrorType> {
    let mut result = f64::INFINITY;
    for a in &args {
        let x = to_number(a);
        if x.is_nan() {
            return Ok(JsValue::from_f64(f64::NAN));
        }
        if x < result {
            result = x;
        }
    }
    Ok(JsValue::from_f64(result))
}

/// Math.max
fn math_max(_ctx: &mut EvalContext, _this: JsValue, args: Vec<JsValue>) -> Result<JsValue, JErrorType> {
    let mut result = f64::NEG_INFINITY;
    for a in &args {
        let x = to_number(a);
        if x.is_nan() {
            return Ok(JsValue::from_f64(f64::NAN));
        }
        if x > result {
            result = x;
        }
    }
    Ok(JsValue::from_f64(result))
}

/// Math.sqrt
fn math_sqrt(_ctx: &mut EvalContext, _this: JsValue, args: Vec<JsValue>) -> Result<JsValue, JErrorType> {
    unary(&args, f64::sqrt)
}

/// Math.cbrt
fn math_cbrt(_ctx: &mut EvalContext, _this: JsValue, args: Vec<JsValue>) -> Result<JsValue, JErrorType> {
    unary(&args, f64::cbrt)
}

/// Math.pow
fn math_pow(_ctx: &mut EvalContext, _this: JsValue, args: Vec<JsValue>) -> Result<JsValue, JErrorType> {
    let base = to_number(&arg(&args, 0));
    let exponent = to_number(&arg(&args, 1));
    if exponent.is_nan() || (base.abs() == 1.0 && exponent.is_infinite()) {
        return Ok(JsValue::from_f64(f64::NAN));
    }
    Ok(JsValue::from_f64(base.powf(exponent)))
}

/// Math.exp
fn math_exp(_ctx: &mut EvalContext, _this: JsValue, args: Vec<JsValue>) -> Result<JsValue, JErrorType> {
    unary(&args, f64::exp)
}

/// Math.log
fn math_log(_ctx: &mut EvalContext, _this: JsValue, args: Vec<JsValue>) -> Result<JsValue, JErrorType> {
    unary(&args, f64::ln)
}

/// Math.log10
fn math_log10(_ctx: &mut EvalContext, _this: JsValue, args: Vec<JsValue>) -> Result<JsValue, JErrorType> {
    unary(&args, f64::log10)
}

/// Math.log2
fn math_log2(_ctx: &mut EvalContext, _this: JsValue, args: Vec<JsValue>) -> Result<JsValue, JErrorType> {
    unary(&args, f64::log2)
}

/// Math.sin
fn math_sin(_ctx: &mut EvalContext, _this: JsValue, args: Vec<JsValue>) -> Result<JsValue, JErrorType> {
    unary(&args, f64::sin)
}

/// Math.cos
fn math_cos(_ctx: &mut EvalContext, _this: JsValue, args: Vec<JsValue>) -> Result<JsValue, JErrorType> {
    unary(&args, f64::cos)
}

/// Math.tan
fn math_tan(_ctx: &mut EvalContext, _this: JsValue, args: Vec<JsValue>) -> Result<JsValue, JErrorType> {
    unary(&args, f64::tan)
}

/// Math.atan
fn math_atan(_ctx: &mut EvalContext, _this: JsValue, args: Vec<JsValue>) -> Result<JsValue, JErrorType> {
    unary(&args, f64::atan)
}

/// Math.atan2
fn math_atan2(_ctx: &mut EvalContext, _this: JsValue, args: Vec<JsValue>) -> Result<JsValue, JErrorType> {
    let y = to_number(&arg(&args, 0));
    let x = to_number(&arg(&args, 1));
    Ok(JsValue::from_f64(y.atan2(x)))
}

/// Math.hypot
fn math_hypot(_ctx: &mut EvalContext, _this: JsValue, args: Vec<JsValue>) -> Result<JsValue, JErrorType> {
    let mut sum_sq = 0.0;
    let mut saw_nan = false;
    for a in &args {
        let x = to_number(a);
        if x.is_infinite() {
            return Ok(JsValue::from_f64(f64::INFINITY));
        }
        saw_nan |= x.is_nan();
        sum_sq += x * x;
    }
    if saw_nan {
        return Ok(JsValue::from_f64(f64::NAN));
    }
    Ok(JsValue::from_f64(sum_sq.sqrt()))
}

/// Math.random
fn math_random(ctx: &mut EvalContext, _this: JsValue, _args: Vec<JsValue>) -> Result<JsValue, JErrorType> {
    Ok(JsValue::from_f64(ctx.next_random()))
}

/// Math.clz32 - Count leading zeros in 32-bit integer.
fn math_clz32(_ctx: &mut EvalContext, _this: JsValue, args: Vec<JsValue>) -> Result<JsValue, JErrorType> {
    Ok(JsValue::from_i64(to_uint32(&arg(&args, 0)).leading_zeros() as i64))
}

/// Math.imul - 32-bit integer multiplication.
fn math_imul(_ctx: &mut EvalContext, _this: JsValue, args: Vec<JsValue>) -> Result<JsValue, JErrorType> {
    let a = to_int32(&arg(&args, 0));
    let b = to_int32(&arg(&args, 1));
    Ok(JsValue::from_i64(a.wrapping_mul(b) as i64))
}
