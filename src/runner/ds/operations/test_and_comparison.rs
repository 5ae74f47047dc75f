use std::cmp::Ordering;
use std::rc::Rc;

use crate::runner::ds::operations::type_conversion::{to_number, to_primitive, to_primitive_number};
use crate::runner::ds::value::JsValue;

/// `===`
pub fn is_strictly_equal(a: &JsValue, b: &JsValue) -> bool {
    match (a, b) {
        (JsValue::Number(x), JsValue::Number(y)) => x.as_f64() == y.as_f64(),
        (JsValue::Object(x), JsValue::Object(y)) => Rc::ptr_eq(x, y),
        _ => a == b,
    }
}

/// `==`
pub fn is_loosely_equal(a: &JsValue, b: &JsValue) -> bool {
    match (a, b) {
        (JsValue::Undefined | JsValue::Null, JsValue::Undefined | JsValue::Null) => true,
        (JsValue::Undefined | JsValue::Null, _) | (_, JsValue::Undefined | JsValue::Null) => false,
        (JsValue::Number(_), JsValue::String(_)) | (JsValue::String(_), JsValue::Number(_)) => {
            to_number(a) == to_number(b)
        }
        (JsValue::Boolean(_), _) => is_loosely_equal(&JsValue::from_f64(to_number(a)), b),
        (_, JsValue::Boolean(_)) => is_loosely_equal(a, &JsValue::from_f64(to_number(b))),
        (JsValue::Object(_), JsValue::Object(_)) => is_strictly_equal(a, b),
        (JsValue::Object(_), _) => is_loosely_equal(&to_primitive(a), b),
        (_, JsValue::Object(_)) => is_loosely_equal(a, &to_primitive(b)),
        _ => is_strictly_equal(a, b),
    }
}

/// `SameValueZero`, used by `includes`: like `===` except NaN equals NaN.
pub fn is_same_value_zero(a: &JsValue, b: &JsValue) -> bool {
    if let (JsValue::Number(x), JsValue::Number(y)) = (a, b) {
        let (x, y) = (x.as_f64(), y.as_f64());
        return (x.is_nan() && y.is_nan()) || x == y;
    }
    is_strictly_equal(a, b)
}

/// `Object.is`
pub fn is_same_value(a: &JsValue, b: &JsValue) -> bool {
    if let (JsValue::Number(x), JsValue::Number(y)) = (a, b) {
        let (x, y) = (x.as_f64(), y.as_f64());
        if x.is_nan() && y.is_nan() {
            return true;
        }
        return x == y && x.is_sign_negative() == y.is_sign_negative();
    }
    is_strictly_equal(a, b)
}

/// Abstract relational comparison. `None` when either side is NaN.
pub fn compare_values(a: &JsValue, b: &JsValue) -> Option<Ordering> {
    let pa = to_primitive_number(a);
    let pb = to_primitive_number(b);
    if let (JsValue::String(x), JsValue::String(y)) = (&pa, &pb) {
        return Some(x.encode_utf16().cmp(y.encode_utf16()));
    }
    to_number(&pa).partial_cmp(&to_number(&pb))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn s(v: &str) -> JsValue {
        JsValue::String(v.to_string())
    }

    #[test]
    fn test_loose_equality_coercions() {
        assert!(is_loosely_equal(&JsValue::from_i64(1), &s("1")));
        assert!(is_loosely_equal(&JsValue::Null, &JsValue::Undefined));
        assert!(is_loosely_equal(&JsValue::Boolean(false), &s("0")));
        assert!(!is_loosely_equal(&JsValue::Null, &JsValue::from_i64(0)));
        assert!(!is_strictly_equal(&JsValue::from_i64(1), &s("1")));
    }

    #[test]
    fn test_nan_comparisons() {
        let nan = JsValue::from_f64(f64::NAN);
        assert!(!is_strictly_equal(&nan, &nan));
        assert!(is_same_value_zero(&nan, &nan));
        assert!(compare_values(&nan, &JsValue::from_i64(1)).is_none());
        assert!(!is_same_value(&JsValue::from_f64(-0.0), &JsValue::from_i64(0)));
    }

    #[test]
    fn test_string_ordering() {
        assert_eq!(compare_values(&s("apple"), &s("banana")), Some(Ordering::Less));
        assert_eq!(compare_values(&s("10"), &JsValue::from_i64(9)), Some(Ordering::Greater));
    }
}
