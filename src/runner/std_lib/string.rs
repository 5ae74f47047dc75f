//! String built-in.
//!
//! Provides String constructor and prototype methods. Indices count Unicode
//! scalar values, matching how the rest of the runtime indexes strings.

use crate::runner::ds::error::JErrorType;
use crate::runner::ds::operations::type_conversion::{
    relative_index, to_integer_or_infinity, to_number, to_string,
};
use crate::runner::ds::value::JsValue;
use crate::runner::eval::function::call_function;
use crate::runner::plugin::registry::BuiltInRegistry;
use crate::runner::plugin::types::{BuiltInObject, EvalContext};

use super::arg;

/// Register the String built-in with the registry.
pub fn register(registry: &mut BuiltInRegistry) {
    let string = BuiltInObject::new("String")
        .with_constructor(string_constructor)
        .add_static_method("fromCharCode", string_from_char_code)
        .add_method("charAt", string_char_at)
        .add_method("charCodeAt", string_char_code_at)
        .add_method("at", string_at)
        .add_method("substring", string_substring)
        .add_method("substr", string_substr)
        .add_method("slice", string_slice)
        .add_method("indexOf", string_index_of)
        .add_method("lastIndexOf", string_last_index_of)
        .add_method("includes", string_includes)
        .add_method("startsWith", string_starts_with)
        .add_method("endsWith", string_ends_with)
        .add_method("split", string_split)
        .add_method("trim", string_trim)
        .add_method("trimStart", string_trim_start)
        .add_method("trimEnd", string_trim_end)
        .add_method("toUpperCase", string_to_upper_case)
        .add_method("toLowerCase", string_to_lower_case)
        .add_method("repeat", string_repeat)
        .add_method("padStart", string_pad_start)
        .add_method("padEnd", string_pad_end)
        .add_method("replace", string_replace)
        .add_method("replaceAll", string_replace_all)
        .add_method("concat", string_concat)
        .add_method("toString", string_to_string)
        .add_method("valueOf", string_to_string);

    registry.register_object(string);
}

/// The receiver as characters; `null` and `undefined` are rejected.
fn this_chars(this: &JsValue, method: &str) -> Result<Vec<char>, JErrorType> {
    if this.is_nullish() {
        return Err(JErrorType::TypeError(format!(
            "String.prototype.{} called on null or undefined",
            method
        )));
    }
    Ok(to_string(this).chars().collect())
}

fn string_of(chars: &[char]) -> JsValue {
    JsValue::String(chars.iter().collect())
}

/// First occurrence of `needle` at or after `from`.
fn find_chars(haystack: &[char], needle: &[char], from: usize) -> Option<usize> {
    if needle.is_empty() {
        return Some(from.min(haystack.len()));
    }
    if needle.len() > haystack.len() {
        return None;
    }
    (from..=haystack.len() - needle.len()).find(|&i| haystack[i..i + needle.len()] == *needle)
}

/// Last occurrence of `needle` starting at or before `from`.
fn rfind_chars(haystack: &[char], needle: &[char], from: usize) -> Option<usize> {
    if needle.len() > haystack.len() {
        return None;
    }
    let last = (haystack.len() - needle.len()).min(from);
    (0..=last).rev().find(|&i| haystack[i..i + needle.len()] == *needle)
}

/// String constructor.
fn string_constructor(
    _ctx: &mut EvalContext,
    _this: JsValue,
    args: Vec<JsValue>,
) -> Result<JsValue, JErrorType> {
    if args.is_empty() {
        Ok(JsValue::String(String::new()))
    } else {
        Ok(JsValue::String(to_string(&args[0])))
    }
}

/// String.fromCharCode
fn string_from_char_code(
    _ctx: &mut EvalContext,
    _this: JsValue,
    args: Vec<JsValue>,
) -> Result<JsValue, JErrorType> {
    let units: Vec<u16> = args
        .iter()
        .map(|a| to_integer_or_infinity(a).rem_euclid(65536.0) as u16)
        .collect();
    Ok(JsValue::String(String::from_utf16_lossy(&units)))
}

/// String.prototype.charAt
fn string_char_at(
    _ctx: &mut EvalContext,
    this: JsValue,
    args: Vec<JsValue>,
) -> Result<JsValue, JErrorType> {
    let chars = this_chars(&this, "charAt")?;
    let index = to_integer_or_infinity(&arg(&args, 0));
    if index < 0.0 || index >= chars.len() as f64 {
        return Ok(JsValue::String(String::new()));
    }
    Ok(JsValue::String(chars[index as usize].to_string()))
}

/// String.prototype.charCodeAt
fn string_char_code_at(
    _ctx: &mut EvalContext,
    this: JsValue,
    args: Vec<JsValue>,
) -> Result<JsValue, JErrorType> {
    let chars = this_chars(&this, "charCodeAt")?;
    let index = to_integer_or_infinity(&arg(&args, 0));
    if index < 0.0 || index >= chars.len() as f64 {
        return Ok(JsValue::from_f64(f64::NAN));
    }
    let mut units = [0u16; 2];
    let code = chars[index as usize].encode_utf16(&mut units)[0];
    Ok(JsValue::from_i64(code as i64))
}

/// String.prototype.at
fn string_at(
    _ctx: &mut EvalContext,
    this: JsValue,
    args: Vec<JsValue>,
) -> Result<JsValue, JErrorType> {
    let chars = this_chars(&this, "at")?;
    let rel = to_integer_or_infinity(&arg(&args, 0));
    let index = if rel < 0.0 { chars.len() as f64 + rel } else { rel };
    if index < 0.0 || index >= chars.len() as f64 {
        return Ok(JsValue::Undefined);
    }
    Ok(JsValue::String(chars[index as usize].to_string()))
}

/// String.prototype.substring
fn string_substring(
    _ctx: &mut EvalContext,
    this: JsValue,
    args: Vec<JsValue>,
) -> Result<JsValue, JErrorType> {
    let chars = this_chars(&this, "substring")?;
    let len = chars.len() as f64;
    let clamp = |v: &JsValue, default: f64| match v {
        JsValue::Undefined => default,
        _ => to_integer_or_infinity(v).max(0.0).min(len),
    };
    let mut start = clamp(&arg(&args, 0), 0.0) as usize;
    let mut end = clamp(&arg(&args, 1), len) as usize;

    // Swap if start > end
    if start > end {
        std::mem::swap(&mut start, &mut end);
    }

    Ok(string_of(&chars[start..end]))
}

/// String.prototype.substr
fn string_substr(
    _ctx: &mut EvalContext,
    this: JsValue,
    args: Vec<JsValue>,
) -> Result<JsValue, JErrorType> {
    let chars = this_chars(&this, "substr")?;
    let start = relative_index(&arg(&args, 0), chars.len(), 0);
    let count = match arg(&args, 1) {
        JsValue::Undefined => chars.len() - start,
        v => to_integer_or_infinity(&v).max(0.0).min((chars.len() - start) as f64) as usize,
    };
    Ok(string_of(&chars[start..start + count]))
}

/// String.prototype.slice
fn string_slice(
    _ctx: &mut EvalContext,
    this: JsValue,
    args: Vec<JsValue>,
) -> Result<JsValue, JErrorType> {
    let chars = this_chars(&this, "slice")?;
    let start = relative_index(&arg(&args, 0), chars.len(), 0);
    let end = relative_index(&arg(&args, 1), chars.len(), chars.len());
    if start >= end {
        return Ok(JsValue::String(String::new()));
    }
    Ok(string_of(&chars[start..end]))
}

/// String.prototype.indexOf
fn string_index_of(
    _ctx: &mut EvalContext,
    this: JsValue,
    args: Vec<JsValue>,
) -> Result<JsValue, JErrorType> {
    let chars = this_chars(&this, "indexOf")?;
    let needle: Vec<char> = to_string(&arg(&args, 0)).chars().collect();
    let from = to_integer_or_infinity(&arg(&args, 1)).max(0.0).min(chars.len() as f64) as usize;
    let found = find_chars(&chars, &needle, from).map_or(-1, |i| i as i64);
    Ok(JsValue::from_i64(found))
}

/// String.prototype.lastIndexOf
fn string_last_index_of(
    _ctx: &mut EvalContext,
    this: JsValue,
    args: Vec<JsValue>,
) -> Result<JsValue, JErrorType> {
    let chars = this_chars(&this, "lastIndexOf")?;
    let needle: Vec<char> = to_string(&arg(&args, 0)).chars().collect();
    let from = match arg(&args, 1) {
        JsValue::Undefined => chars.len(),
        v => {
            let f = to_number(&v);
            if f.is_nan() {
                chars.len()
            } else {
                f.trunc().max(0.0).min(chars.len() as f64) as usize
            }
        }
    };
    let found = rfind_chars(&chars, &needle, from).map_or(-1, |i| i as i64);
    Ok(JsValue::from_i64(found))
}

/// String.prototype.includes
fn string_includes(
    _ctx: &mut EvalContext,
    this: JsValue,
    args: Vec<JsValue>,
) -> Result<JsValue, JErrorType> {
    let chars = this_chars(&this, "includes")?;
    let needle: Vec<char> = to_string(&arg(&args, 0)).chars().collect();
    let from = to_integer_or_infinity(&arg(&args, 1)).max(0.0).min(chars.len() as f64) as usize;
    Ok(JsValue::Boolean(find_chars(&chars, &needle, from).is_some()))
}

/// String.prototype.startsWith
fn string_starts_with(
    _ctx: &mut EvalContext,
    this: JsValue,
    args: Vec<JsValue>,
) -> Result<JsValue, JErrorType> {
    let chars = this_chars(&this, "startsWith")?;
    let needle: Vec<char> = to_string(&arg(&args, 0)).chars().collect();
    let start = to_integer_or_infinity(&arg(&args, 1)).max(0.0).min(chars.len() as f64) as usize;
    Ok(JsValue::Boolean(chars[start..].starts_with(&needle)))
}

/// String.prototype.endsWith
fn string_ends_with(
    _ctx: &mut EvalContext,
    this: JsValue,
    args: Vec<JsValue>,
) -> Result<JsValue, JErrorType> {
    let chars = this_chars(&this, "endsWith")?;
    let needle: Vec<char> = to_string(&arg(&args, 0)).chars().collect();
    let end = match arg(&args, 1) {
        JsValue::Undefined => chars.len(),
        v => to_integer_or_infinity(&v).max(0.0).min(chars.len() as f64) as usize,
    };
    Ok(JsValue::Boolean(chars[..end].ends_with(&needle)))
}

/// String.prototype.split - string separators only.
fn string_split(
    ctx: &mut EvalContext,
    this: JsValue,
    args: Vec<JsValue>,
) -> Result<JsValue, JErrorType> {
    let chars = this_chars(&this, "split")?;
    let limit = match arg(&args, 1) {
        JsValue::Undefined => usize::MAX,
        v => to_integer_or_infinity(&v).max(0.0) as usize,
    };
    let parts: Vec<JsValue> = match arg(&args, 0) {
        JsValue::Undefined => vec![string_of(&chars)],
        separator => {
            let separator: Vec<char> = to_string(&separator).chars().collect();
            if separator.is_empty() {
                chars.iter().map(|c| JsValue::String(c.to_string())).collect()
            } else {
                let mut parts = vec![];
                let mut start = 0;
                while let Some(i) = find_chars(&chars, &separator, start) {
                    parts.push(string_of(&chars[start..i]));
                    start = i + separator.len();
                }
                parts.push(string_of(&chars[start..]));
                parts
            }
        }
    };
    Ok(ctx.new_array(parts.into_iter().take(limit).collect()))
}

/// String.prototype.trim
fn string_trim(
    _ctx: &mut EvalContext,
    this: JsValue,
    _args: Vec<JsValue>,
) -> Result<JsValue, JErrorType> {
    let s: String = this_chars(&this, "trim")?.into_iter().collect();
    Ok(JsValue::String(s.trim().to_string()))
}

/// String.prototype.trimStart
fn string_trim_start(
    _ctx: &mut EvalContext,
    this: JsValue,
    _args: Vec<JsValue>,
) -> Result<JsValue, JErrorType> {
    let s: String = this_chars(&this, "trimStart")?.into_iter().collect();
    Ok(JsValue::String(s.trim_start().to_string()))
}

/// String.prototype.trimEnd
fn string_trim_end(
    _ctx: &mut EvalContext,
    this: JsValue,
    _args: Vec<JsValue>,
) -> Result<JsValue, JErrorType> {
    let s: String = this_chars(&this, "trimEnd")?.into_iter().collect();
    Ok(JsValue::String(s.trim_end().to_string()))
}

/// String.prototype.toUpperCase
fn string_to_upper_case(
    _ctx: &mut EvalContext,
    this: JsValue,
    _args: Vec<JsValue>,
) -> Result<JsValue, JErrorType> {
    let s: String = this_chars(&this, "toUpperCase")?.into_iter().collect();
    Ok(JsValue::String(s.to_uppercase()))
}

/// String.prototype.toLowerCase
fn string_to_lower_case(
    _ctx: &mut EvalContext,
    this: JsValue,
    _args: Vec<JsValue>,
) -> Result<JsValue, JErrorType> {
    let s: String = this_chars(&this, "toLowerCase")?.into_iter().collect();
    Ok(JsValue::String(s.to_lowercase()))
}

/// String.prototype.repeat
fn string_repeat(
    _ctx: &mut EvalContext,
    this: JsValue,
    args: Vec<JsValue>,
) -> Result<JsValue, JErrorType> {
    let s: String = this_chars(&this, "repeat")?.into_iter().collect();
    let count = to_integer_or_infinity(&arg(&args, 0));
    if count < 0.0 || count.is_infinite() {
        return Err(JErrorType::RangeError(format!(
            "Invalid count value: {}",
            to_string(&arg(&args, 0))
        )));
    }
    if s.len() as f64 * count > MAX_STRING_LENGTH as f64 {
        return Err(JErrorType::RangeError("Invalid string length".to_string()));
    }
    Ok(JsValue::String(s.repeat(count as usize)))
}

const MAX_STRING_LENGTH: usize = 1 << 29;

/// Padding of exactly `missing` characters made by cycling `filler`.
fn padding(filler: &[char], missing: usize) -> String {
    filler.iter().cycle().take(missing).collect()
}

fn pad(this: &JsValue, args: &[JsValue], method: &str, at_start: bool) -> Result<JsValue, JErrorType> {
    let chars = this_chars(this, method)?;
    let target = to_integer_or_infinity(&arg(args, 0));
    let filler: Vec<char> = match arg(args, 1) {
        JsValue::Undefined => vec![' '],
        f => to_string(&f).chars().collect(),
    };
    let s: String = chars.iter().collect();
    if target <= chars.len() as f64 || filler.is_empty() {
        return Ok(JsValue::String(s));
    }
    if target > MAX_STRING_LENGTH as f64 {
        return Err(JErrorType::RangeError("Invalid string length".to_string()));
    }
    let fill = padding(&filler, target as usize - chars.len());
    Ok(JsValue::String(if at_start { fill + &s } else { s + &fill }))
}

/// String.prototype.padStart
fn string_pad_start(
    _ctx: &mut EvalContext,
    this: JsValue,
    args: Vec<JsValue>,
) -> Result<JsValue, JErrorType> {
    pad(&this, &args, "padStart", true)
}

/// String.prototype.padEnd
fn string_pad_end(
    _ctx: &mut EvalContext,
    this: JsValue,
    args: Vec<JsValue>,
) -> Result<JsValue, JErrorType> {
    pad(&this, &args, "padEnd", false)
}

/// Expands `$$`, `$&`, `` $` `` and `$'` in a replacement string.
fn expand_replacement(template: &str, matched: &str, before: &str, after: &str) -> String {
    let mut out = String::new();
    let mut chars = template.chars().peekable();
    while let Some(c) = chars.next() {
        if c != '$' {
            out.push(c);
            continue;
        }
        match chars.peek() {
            Some('$') => out.push('$'),
            Some('&') => out.push_str(matched),
            Some('`') => out.push_str(before),
            Some('\'') => out.push_str(after),
            _ => {
                out.push('$');
                continue;
            }
        }
        chars.next();
    }
    out
}

fn replace(
    ctx: &mut EvalContext,
    this: &JsValue,
    args: &[JsValue],
    method: &str,
    all: bool,
) -> Result<JsValue, JErrorType> {
    let chars = this_chars(this, method)?;
    let pattern: Vec<char> = to_string(&arg(args, 0)).chars().collect();
    let replacement = arg(args, 1);
    let subject: String = chars.iter().collect();

    let mut positions = vec![];
    let mut from = 0;
    while let Some(i) = find_chars(&chars, &pattern, from) {
        positions.push(i);
        if !all {
            break;
        }
        from = i + pattern.len().max(1);
        if from > chars.len() {
            break;
        }
    }

    let mut out = String::new();
    let mut last = 0;
    for i in positions {
        out.extend(&chars[last..i]);
        let matched: String = chars[i..i + pattern.len()].iter().collect();
        if replacement.is_callable() {
            let r = call_function(
                ctx,
                &replacement,
                JsValue::Undefined,
                vec![
                    JsValue::String(matched),
                    JsValue::from_i64(i as i64),
                    JsValue::String(subject.clone()),
                ],
            )?;
            out.push_str(&to_string(&r));
        } else {
            let before: String = chars[..i].iter().collect();
            let after: String = chars[i + pattern.len()..].iter().collect();
            out.push_str(&expand_replacement(&to_string(&replacement), &matched, &before, &after));
        }
        last = i + pattern.len();
    }
    out.extend(&chars[last..]);
    Ok(JsValue::String(out))
}

/// String.prototype.replace - first occurrence of a string pattern.
fn string_replace(
    ctx: &mut EvalContext,
    this: JsValue,
    args: Vec<JsValue>,
) -> Result<JsValue, JErrorType> {
    replace(ctx, &this, &args, "replace", false)
}

/// String.prototype.replaceAll - every occurrence of a string pattern.
fn string_replace_all(
    ctx: &mut EvalContext,
    this: JsValue,
    args: Vec<JsValue>,
) -> Result<JsValue, JErrorType> {
    replace(ctx, &this, &args, "replaceAll", true)
}

/// String.prototype.concat
fn string_concat(
    _ctx: &mut EvalContext,
    this: JsValue,
    args: Vec<JsValue>,
) -> Result<JsValue, JErrorType> {
    let mut s: String = this_chars(&this, "concat")?.into_iter().collect();
    for a in &args {
        s.push_str(&to_string(a));
    }
    Ok(JsValue::String(s))
}

/// String.prototype.toString and valueOf
fn string_to_string(
    _ctx: &mut EvalContext,
    this: JsValue,
    _args: Vec<JsValue>,
) -> Result<JsValue, JErrorType> {
    match this {
        JsValue::String(_) => Ok(this),
        _ => Err(JErrorType::TypeError(
            "String.prototype.toString requires that 'this' be a String".to_string(),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chars(s: &str) -> Vec<char> {
        s.chars().collect()
    }

    #[test]
    fn test_find_chars() {
        assert_eq!(find_chars(&chars("hello"), &chars("l"), 0), Some(2));
        assert_eq!(find_chars(&chars("hello"), &chars("l"), 3), Some(3));
        assert_eq!(find_chars(&chars("hello"), &chars("z"), 0), None);
        assert_eq!(find_chars(&chars("hi"), &chars(""), 5), Some(2));
        assert_eq!(rfind_chars(&chars("hello"), &chars("l"), 5), Some(3));
    }

    #[test]
    fn test_expand_replacement_patterns() {
        assert_eq!(expand_replacement("[$&]", "b", "a", "c"), "[b]");
        assert_eq!(expand_replacement("$$", "b", "a", "c"), "$");
        assert_eq!(expand_replacement("$`|$'", "b", "a", "c"), "a|c");
        assert_eq!(expand_replacement("$1", "b", "a", "c"), "$1");
    }

    #[test]
    fn test_padding_cycles_filler() {
        assert_eq!(padding(&chars("ab"), 5), "ababa");
        assert_eq!(padding(&chars("0"), 0), "");
    }
}
