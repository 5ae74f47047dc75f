//! Number built-in.
//!
//! Provides Number constructor, static methods and prototype methods.
//! The string parsers here also back the global `parseInt` and `parseFloat`.

use crate::runner::ds::error::JErrorType;
use crate::runner::ds::operations::type_conversion::{
    is_integral_number, number_to_string, to_integer_or_infinity, to_number, to_string,
};
use crate::runner::ds::value::{JsNumberType, JsValue};
use crate::runner::plugin::registry::BuiltInRegistry;
use crate::runner::plugin::types::{BuiltInObject, EvalContext};

use super::arg;

const MAX_SAFE_INTEGER: f64 = 9007199254740991.0;

/// Register the Number built-in with the registry.
pub fn register(registry: &mut BuiltInRegistry) {
    let number = BuiltInObject::new("Number")
        .with_constructor(number_constructor)
        // Static methods
        .add_static_method("isNaN", number_is_nan)
        .add_static_method("isFinite", number_is_finite)
        .add_static_method("isInteger", number_is_integer)
        .add_static_method("isSafeInteger", number_is_safe_integer)
        .add_static_method("parseFloat", number_parse_float)
        .add_static_method("parseInt", number_parse_int)
        // Constants
        .add_property("MAX_SAFE_INTEGER", JsValue::from_f64(MAX_SAFE_INTEGER))
        .add_property("MIN_SAFE_INTEGER", JsValue::from_f64(-MAX_SAFE_INTEGER))
        .add_property("MAX_VALUE", JsValue::from_f64(f64::MAX))
        .add_property("MIN_VALUE", JsValue::from_f64(5e-324))
        .add_property("EPSILON", JsValue::from_f64(f64::EPSILON))
        .add_property("POSITIVE_INFINITY", JsValue::from_f64(f64::INFINITY))
        .add_property("NEGATIVE_INFINITY", JsValue::from_f64(f64::NEG_INFINITY))
        .add_property("NaN", JsValue::from_f64(f64::NAN))
        // Prototype methods
        .add_method("toString", number_to_string_method)
        .add_method("toFixed", number_to_fixed)
        .add_method("valueOf", number_value_of);

    registry.register_object(number);
}

/// Number constructor: `Number(value)` converts, `Number()` is 0.
fn number_constructor(
    _ctx: &mut EvalContext,
    _this: JsValue,
    args: Vec<JsValue>,
) -> Result<JsValue, JErrorType> {
    if args.is_empty() {
        return Ok(JsValue::from_i64(0));
    }
    Ok(JsValue::from_f64(to_number(&args[0])))
}

/// Number.isNaN - no coercion, unlike the global `isNaN`.
fn number_is_nan(
    _ctx: &mut EvalContext,
    _this: JsValue,
    args: Vec<JsValue>,
) -> Result<JsValue, JErrorType> {
    Ok(JsValue::Boolean(matches!(arg(&args, 0), JsValue::Number(JsNumberType::NaN))))
}

/// Number.isFinite
fn number_is_finite(
    _ctx: &mut EvalContext,
    _this: JsValue,
    args: Vec<JsValue>,
) -> Result<JsValue, JErrorType> {
    Ok(JsValue::Boolean(match arg(&args, 0) {
        JsValue::Number(n) => n.as_f64().is_finite(),
        _ => false,
    }))
}

/// Number.isInteger
fn number_is_integer(
    _ctx: &mut EvalContext,
    _this: JsValue,
    args: Vec<JsValue>,
) -> Result<JsValue, JErrorType> {
    Ok(JsValue::Boolean(is_integral_number(&arg(&args, 0))))
}

/// Number.isSafeInteger
fn number_is_safe_integer(
    _ctx: &mut EvalContext,
    _this: JsValue,
    args: Vec<JsValue>,
) -> Result<JsValue, JErrorType> {
    let v = arg(&args, 0);
    let safe = is_integral_number(&v) && to_number(&v).abs() <= MAX_SAFE_INTEGER;
    Ok(JsValue::Boolean(safe))
}

/// Number.parseFloat - same function as the global `parseFloat`.
pub(crate) fn number_parse_float(
    _ctx: &mut EvalContext,
    _this: JsValue,
    args: Vec<JsValue>,
) -> Result<JsValue, JErrorType> {
    Ok(JsValue::from_f64(parse_float(&to_string(&arg(&args, 0)))))
}

/// Number.parseInt - same function as the global `parseInt`.
pub(crate) fn number_parse_int(
    _ctx: &mut EvalContext,
    _this: JsValue,
    args: Vec<JsValue>,
) -> Result<JsValue, JErrorType> {
    let radix = to_integer_or_infinity(&arg(&args, 1));
    Ok(JsValue::from_f64(parse_int(&to_string(&arg(&args, 0)), radix)))
}

/// Parses the longest decimal literal prefix, after leading whitespace.
pub fn parse_float(s: &str) -> f64 {
    let t = s.trim_start();
    let (sign, body) = match t.as_bytes().first() {
        Some(b'-') => (-1.0, &t[1..]),
        Some(b'+') => (1.0, &t[1..]),
        _ => (1.0, t),
    };
    if body.starts_with("Infinity") {
        return sign * f64::INFINITY;
    }
    let bytes = body.as_bytes();
    let mut end = 0;
    let mut saw_digit = false;
    while end < bytes.len() && bytes[end].is_ascii_digit() {
        end += 1;
        saw_digit = true;
    }
    if end < bytes.len() && bytes[end] == b'.' {
        end += 1;
        while end < bytes.len() && bytes[end].is_ascii_digit() {
            end += 1;
            saw_digit = true;
        }
    }
    if !saw_digit {
        return f64::NAN;
    }
    if end < bytes.len() && (bytes[end] == b'e' || bytes[end] == b'E') {
        let mut exp_end = end + 1;
        if exp_end < bytes.len() && (bytes[exp_end] == b'+' || bytes[exp_end] == b'-') {
            exp_end += 1;
        }
        let digits_start = exp_end;
        while exp_end < bytes.len() && bytes[exp_end].is_ascii_digit() {
            exp_end += 1;
        }
        if exp_end > digits_start {
            end = exp_end;
        }
    }
    body[..end].parse::<f64>().map_or(f64::NAN, |f| sign * f)
}

/// Parses the longest run of digits valid in `radix` (0 means "detect"), after leading whitespace.
pub fn parse_int(s: &str, radix: f64) -> f64 {
    let t = s.trim_start();
    let (sign, mut body) = match t.as_bytes().first() {
        Some(b'-') => (-1.0, &t[1..]),
        Some(b'+') => (1.0, &t[1..]),
        _ => (1.0, t),
    };
    let mut radix = if radix.is_finite() { radix as u32 } else { 0 };
    if radix != 0 && !(2..=36).contains(&radix) {
        return f64::NAN;
    }
    let has_hex_prefix = body.starts_with("0x") || body.starts_with("0X");
    if (radix == 0 || radix == 16) && has_hex_prefix {
        body = &body[2..];
        radix = 16;
    }
    if radix == 0 {
        radix = 10;
    }
    let mut result = 0.0;
    let mut saw_digit = false;
    for c in body.chars() {
        match c.to_digit(radix) {
            Some(d) => {
                result = result * radix as f64 + d as f64;
                saw_digit = true;
            }
            None => break,
        }
    }
    if saw_digit {
        sign * result
    } else {
        f64::NAN
    }
}

fn this_number(this: &JsValue, method: &str) -> Result<f64, JErrorType> {
    match this {
        JsValue::Number(n) => Ok(n.as_f64()),
        _ => Err(JErrorType::TypeError(format!(
            "Number.prototype.{} requires that 'this' be a Number",
            method
        ))),
    }
}

/// Number.prototype.toString
fn number_to_string_method(
    _ctx: &mut EvalContext,
    this: JsValue,
    args: Vec<JsValue>,
) -> Result<JsValue, JErrorType> {
    let n = this_number(&this, "toString")?;
    let radix = match arg(&args, 0) {
        JsValue::Undefined => 10.0,
        r => to_integer_or_infinity(&r),
    };
    if !(2.0..=36.0).contains(&radix) {
        return Err(JErrorType::RangeError(
            "toString() radix must be between 2 and 36".to_string(),
        ));
    }
    if radix == 10.0 || !n.is_finite() {
        return Ok(JsValue::String(number_to_string(n)));
    }
    Ok(JsValue::String(format_radix(n, radix as u32)))
}

/// Number.prototype.toFixed
fn number_to_fixed(
    _ctx: &mut EvalContext,
    this: JsValue,
    args: Vec<JsValue>,
) -> Result<JsValue, JErrorType> {
    let n = this_number(&this, "toFixed")?;
    let digits = to_integer_or_infinity(&arg(&args, 0));
    if !(0.0..=100.0).contains(&digits) {
        return Err(JErrorType::RangeError(
            "toFixed() digits argument must be between 0 and 100".to_string(),
        ));
    }
    Ok(JsValue::String(to_fixed(n, digits as usize)))
}

/// Number.prototype.valueOf
fn number_value_of(
    _ctx: &mut EvalContext,
    this: JsValue,
    _args: Vec<JsValue>,
) -> Result<JsValue, JErrorType> {
    this_number(&this, "valueOf")?;
    Ok(this)
}

/// Fixed-point notation. Exact halves round away from zero.
pub fn to_fixed(n: f64, digits: usize) -> String {
    if !n.is_finite() || n.abs() >= 1e21 {
        return number_to_string(n);
    }
    let magnitude = n.abs();
    let scaled = magnitude * 10f64.powi(digits as i32);
    let body = if scaled.fract() == 0.5 && scaled < MAX_SAFE_INTEGER {
        let rounded = format!("{:0>width$}", (scaled.floor() as u64 + 1).to_string(), width = digits + 1);
        if digits == 0 {
            rounded
        } else {
            let split = rounded.len() - digits;
            format!("{}.{}", &rounded[..split], &rounded[split..])
        }
    } else {
        format!("{:.*}", digits, magnitude)
    };
    if n < 0.0 {
        format!("-{}", body)
    } else {
        body
    }
}

/// Format a number in a given radix, including up to 52 fractional digits.
fn format_radix(n: f64, radix: u32) -> String {
    const DIGITS: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";

    let negative = n < 0.0;
    let magnitude = n.abs();
    let mut int_part = magnitude.trunc();
    let mut fraction = magnitude - int_part;

    let mut result = Vec::new();
    if int_part == 0.0 {
        result.push(b'0');
    }
    while int_part >= 1.0 {
        let digit = (int_part % radix as f64) as usize;
        result.push(DIGITS[digit]);
        int_part = (int_part / radix as f64).trunc();
    }
    if negative {
        result.push(b'-');
    }
    result.reverse();

    if fraction > 0.0 {
        result.push(b'.');
        let mut count = 0;
        while fraction > 0.0 && count < 52 {
            fraction *= radix as f64;
            let digit = fraction.trunc() as usize;
            result.push(DIGITS[digit]);
            fraction -= digit as f64;
            count += 1;
        }
    }

    result.into_iter().map(char::from).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_int_stops_at_first_invalid_digit() {
        assert_eq!(parse_int("42px", 0.0), 42.0);
        assert_eq!(parse_int("  -17", 0.0), -17.0);
        assert_eq!(parse_int("0x1F", 0.0), 31.0);
        assert_eq!(parse_int("ff", 16.0), 255.0);
        assert!(parse_int("px", 0.0).is_nan());
        assert!(parse_int("10", 1.0).is_nan());
    }

    #[test]
    fn test_parse_float_takes_longest_prefix() {
        assert_eq!(parse_float("3.14abc"), 3.14);
        assert_eq!(parse_float("  .5"), 0.5);
        assert_eq!(parse_float("1e3x"), 1000.0);
        assert_eq!(parse_float("2e"), 2.0);
        assert_eq!(parse_float("-Infinity"), f64::NEG_INFINITY);
        assert!(parse_float("abc").is_nan());
    }

    #[test]
    fn test_to_fixed_rounds_halves_up() {
        assert_eq!(to_fixed(2.5, 0), "3");
        assert_eq!(to_fixed(1.25, 1), "1.3");
        assert_eq!(to_fixed(3.14159, 2), "3.14");
        assert_eq!(to_fixed(-1.5, 0), "-2");
        assert_eq!(to_fixed(0.0, 2), "0.00");
    }

    #[test]
    fn test_format_radix() {
        assert_eq!(format_radix(255.0, 16), "ff");
        assert_eq!(format_radix(-5.0, 2), "-101");
        assert_eq!(format_radix(0.5, 2), "0.1");
    }
}
