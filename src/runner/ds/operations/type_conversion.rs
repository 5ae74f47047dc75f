use std::rc::Rc;

use crate::runner::ds::object::{get_property, JsObjectType, ObjectKind};
use crate::runner::ds::operations::time::to_date_string;
use crate::runner::ds::value::{JsNumberType, JsValue};

pub const TYPE_STR_UNDEFINED: &str = "undefined";
pub const TYPE_STR_BOOLEAN: &str = "boolean";
pub const TYPE_STR_STRING: &str = "string";
pub const TYPE_STR_NUMBER: &str = "number";
pub const TYPE_STR_OBJECT: &str = "object";
pub const TYPE_STR_FUNCTION: &str = "function";

/// The result of the `typeof` operator.
pub fn get_type(a: &JsValue) -> &'static str {
    match a {
        JsValue::Undefined => TYPE_STR_UNDEFINED,
        JsValue::Null => TYPE_STR_OBJECT,
        JsValue::Boolean(_) => TYPE_STR_BOOLEAN,
        JsValue::String(_) => TYPE_STR_STRING,
        JsValue::Number(_) => TYPE_STR_NUMBER,
        JsValue::Object(o) => {
            if o.borrow().is_callable() {
                TYPE_STR_FUNCTION
            } else {
                TYPE_STR_OBJECT
            }
        }
    }
}

pub fn to_boolean(v: &JsValue) -> bool {
    match v {
        JsValue::Undefined | JsValue::Null => false,
        JsValue::Boolean(b) => *b,
        JsValue::String(s) => !s.is_empty(),
        JsValue::Number(n) => {
            let f = n.as_f64();
            !(f.is_nan() || f == 0.0)
        }
        JsValue::Object(_) => true,
    }
}

pub fn to_number(v: &JsValue) -> f64 {
    match v {
        JsValue::Undefined => f64::NAN,
        JsValue::Null => 0.0,
        JsValue::Boolean(b) => {
            if *b {
                1.0
            } else {
                0.0
            }
        }
        JsValue::String(s) => string_to_number(s),
        JsValue::Number(n) => n.as_f64(),
        JsValue::Object(o) => match o.borrow().as_date() {
            Some(t) => t,
            None => string_to_number(&to_string(v)),
        },
    }
}

pub fn to_numeric_value(v: &JsValue) -> JsValue {
    match v {
        JsValue::Number(_) => v.clone(),
        _ => JsValue::from_f64(to_number(v)),
    }
}

/// `StringToNumber`: surrounding whitespace is ignored and the empty string is 0.
pub fn string_to_number(s: &str) -> f64 {
    let t = s.trim();
    if t.is_empty() {
        return 0.0;
    }
    match t {
        "Infinity" | "+Infinity" => return f64::INFINITY,
        "-Infinity" => return f64::NEG_INFINITY,
        _ => {}
    }
    let radix = if t.len() > 2 {
        match &t[..2] {
            "0x" | "0X" => Some(16),
            "0o" | "0O" => Some(8),
            "0b" | "0B" => Some(2),
            _ => None,
        }
    } else {
        None
    };
    if let Some(radix) = radix {
        return match u64::from_str_radix(&t[2..], radix) {
            Ok(v) => v as f64,
            Err(_) => f64::NAN,
        };
    }
    let well_formed = t
        .chars()
        .all(|c| c.is_ascii_digit() || matches!(c, '.' | 'e' | 'E' | '+' | '-'))
        && t.chars().any(|c| c.is_ascii_digit());
    if !well_formed {
        return f64::NAN;
    }
    t.parse::<f64>().unwrap_or(f64::NAN)
}

/// `Number::toString` with radix 10, in the shortest form that round-trips.
pub fn number_to_string(n: f64) -> String {
    if n.is_nan() {
        return "NaN".to_string();
    }
    if n == 0.0 {
        return "0".to_string();
    }
    if n.is_infinite() {
        return if n > 0.0 { "Infinity" } else { "-Infinity" }.to_string();
    }
    if n < 0.0 {
        return format!("-{}", number_to_string(-n));
    }
    let scientific = format!("{:e}", n);
    let (mantissa, exponent) = match scientific.split_once('e') {
        Some((m, e)) => (m, e.parse::<i32>().unwrap_or(0)),
        None => (scientific.as_str(), 0),
    };
    let digits: String = mantissa.chars().filter(|c| *c != '.').collect();
    let k = digits.len() as i32;
    let n = exponent + 1;
    if k <= n && n <= 21 {
        format!("{}{}", digits, "0".repeat((n - k) as usize))
    } else if 0 < n && n <= 21 {
        let (int_part, frac_part) = digits.split_at(n as usize);
        format!("{}.{}", int_part, frac_part)
    } else if -6 < n && n <= 0 {
        format!("0.{}{}", "0".repeat((-n) as usize), digits)
    } else {
        let e = n - 1;
        let sign = if e >= 0 { '+' } else { '-' };
        let (first, rest) = digits.split_at(1);
        if rest.is_empty() {
            format!("{}e{}{}", first, sign, e.abs())
        } else {
            format!("{}.{}e{}{}", first, rest, sign, e.abs())
        }
    }
}

pub fn to_string(v: &JsValue) -> String {
    let mut seen = vec![];
    to_string_guarded(v, &mut seen)
}

fn to_string_guarded(v: &JsValue, seen: &mut Vec<JsObjectType>) -> String {
    match v {
        JsValue::Undefined => "undefined".to_string(),
        JsValue::Null => "null".to_string(),
        JsValue::Boolean(b) => b.to_string(),
        JsValue::String(s) => s.to_string(),
        JsValue::Number(n) => number_to_string(n.as_f64()),
        JsValue::Object(o) => {
            if seen.iter().any(|s| Rc::ptr_eq(s, o)) {
                return String::new();
            }
            let elements = {
                let o_ref = o.borrow();
                match &o_ref.kind {
                    ObjectKind::Array(values) => Some(values.clone()),
                    ObjectKind::Function(f) => return f.source_text(),
                    ObjectKind::Error => return error_to_string(o),
                    ObjectKind::Date(t) => return to_date_string(*t),
                    _ => None,
                }
            };
            match elements {
                Some(values) => {
                    seen.push(o.clone());
                    let parts: Vec<String> = values
                        .iter()
                        .map(|e| {
                            if e.is_nullish() {
                                String::new()
                            } else {
                                to_string_guarded(e, seen)
                            }
                        })
                        .collect();
                    seen.pop();
                    parts.join(",")
                }
                None => format!("[object {}]", if is_global(o) { "Window" } else { "Object" }),
            }
        }
    }
}

fn is_global(o: &JsObjectType) -> bool {
    matches!(o.borrow().kind, ObjectKind::Global)
}

/// `Error.prototype.toString`: "Name: message", dropping empty parts.
pub fn error_to_string(o: &JsObjectType) -> String {
    let name = match get_property(o, "name") {
        Some(JsValue::Undefined) | None => "Error".to_string(),
        Some(v) => to_string(&v),
    };
    let message = match get_property(o, "message") {
        Some(JsValue::Undefined) | None => String::new(),
        Some(v) => to_string(&v),
    };
    if message.is_empty() {
        name
    } else if name.is_empty() {
        message
    } else {
        format!("{}: {}", name, message)
    }
}

/// Objects have no user-visible `valueOf`/`toString` hooks, so their primitive is their string form.
pub fn to_primitive(v: &JsValue) -> JsValue {
    match v {
        JsValue::Object(_) => JsValue::String(to_string(v)),
        _ => v.clone(),
    }
}

/// `ToPrimitive` with hint number, as relational comparison uses it: a date
/// compares by its time value, any other object by its string form.
pub fn to_primitive_number(v: &JsValue) -> JsValue {
    match v {
        JsValue::Object(o) => match o.borrow().as_date() {
            Some(t) => JsValue::from_f64(t),
            None => JsValue::String(to_string(v)),
        },
        _ => v.clone(),
    }
}

pub fn to_property_key(v: &JsValue) -> String {
    to_string(v)
}

pub fn to_int32(v: &JsValue) -> i32 {
    to_uint32(v) as i32
}

pub fn to_uint32(v: &JsValue) -> u32 {
    let f = to_number(v);
    if !f.is_finite() {
        return 0;
    }
    f.trunc().rem_euclid(4294967296.0) as u32
}

/// `ToIntegerOrInfinity`, with NaN mapped to 0.
pub fn to_integer_or_infinity(v: &JsValue) -> f64 {
    let f = to_number(v);
    if f.is_nan() {
        0.0
    } else {
        f.trunc()
    }
}

/// Clamps a relative index argument (as taken by `slice`, `at`, ...) into `0..=len`.
pub fn relative_index(v: &JsValue, len: usize, default: usize) -> usize {
    if let JsValue::Undefined = v {
        return default;
    }
    let rel = to_integer_or_infinity(v);
    let len_f = len as f64;
    if rel < 0.0 {
        (len_f + rel).max(0.0) as usize
    } else {
        rel.min(len_f) as usize
    }
}

pub fn is_integral_number(v: &JsValue) -> bool {
    match v {
        JsValue::Number(JsNumberType::Integer(_)) => true,
        JsValue::Number(JsNumberType::Float(f)) => f.fract() == 0.0,
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_number_to_string_forms() {
        assert_eq!(number_to_string(8.0), "8");
        assert_eq!(number_to_string(0.1 + 0.2), "0.30000000000000004");
        assert_eq!(number_to_string(1e21), "1e+21");
        assert_eq!(number_to_string(123456789012345680000.0), "123456789012345680000");
        assert_eq!(number_to_string(0.000001), "0.000001");
        assert_eq!(number_to_string(1e-7), "1e-7");
        assert_eq!(number_to_string(-2.5), "-2.5");
        assert_eq!(number_to_string(1.5e-10), "1.5e-10");
        assert_eq!(number_to_string(f64::NAN), "NaN");
        assert_eq!(number_to_string(f64::NEG_INFINITY), "-Infinity");
    }

    #[test]
    fn test_string_to_number() {
        assert_eq!(string_to_number("  42  "), 42.0);
        assert_eq!(string_to_number(""), 0.0);
        assert_eq!(string_to_number("0x1F"), 31.0);
        assert_eq!(string_to_number("1e3"), 1000.0);
        assert!(string_to_number("12px").is_nan());
        assert!(string_to_number("inf").is_nan());
        assert_eq!(string_to_number("-Infinity"), f64::NEG_INFINITY);
    }

    #[test]
    fn test_int32_wraps() {
        assert_eq!(to_int32(&JsValue::from_f64(4294967295.0)), -1);
        assert_eq!(to_uint32(&JsValue::from_f64(-1.0)), 4294967295);
        assert_eq!(to_int32(&JsValue::from_f64(f64::NAN)), 0);
    }

    #[test]
    fn test_truthiness() {
        assert!(!to_boolean(&JsValue::String(String::new())));
        assert!(!to_boolean(&JsValue::from_f64(f64::NAN)));
        assert!(to_boolean(&JsValue::String("0".to_string())));
        assert!(!to_boolean(&JsValue::from_i64(0)));
    }
}
