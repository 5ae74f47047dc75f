//! JSON built-in object.
//!
//! Provides JSON.parse and JSON.stringify methods.

use std::rc::Rc;

use crate::runner::ds::error::JErrorType;
use crate::runner::ds::object::JsObjectType;
use crate::runner::ds::operations::object::get_value_property;
use crate::runner::ds::operations::type_conversion::{number_to_string, to_integer_or_infinity, to_string};
use crate::runner::ds::value::JsValue;
use crate::runner::eval::function::call_function;
use crate::runner::plugin::registry::BuiltInRegistry;
use crate::runner::plugin::types::{BuiltInObject, EvalContext};

use super::arg;

/// Register the JSON object with the registry.
pub fn register(registry: &mut BuiltInRegistry) {
    let json = BuiltInObject::new("JSON")
        .add_method("parse", json_parse)
        .add_method("stringify", json_stringify);

    registry.register_object(json);
}

/// JSON.parse - Parse JSON string to JavaScript value.
fn json_parse(ctx: &mut EvalContext, _this: JsValue, args: Vec<JsValue>) -> Result<JsValue, JErrorType> {
    let text = to_string(&arg(&args, 0));
    let mut parser = JsonParser {
        chars: text.chars().collect(),
        pos: 0,
    };
    let value = parser.parse_value(ctx)?;
    parser.skip_whitespace();
    if parser.pos < parser.chars.len() {
        return Err(parser.unexpected());
    }
    Ok(value)
}

struct JsonParser {
    chars: Vec<char>,
    pos: usize,
}

impl JsonParser {
    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn next(&mut self) -> Option<char> {
        let c = self.peek();
        if c.is_some() {
            self.pos += 1;
        }
        c
    }

    fn unexpected(&self) -> JErrorType {
        match self.peek() {
            Some(c) => JErrorType::SyntaxError(format!("Unexpected token {} in JSON at position {}", c, self.pos)),
            None => JErrorType::SyntaxError("Unexpected end of JSON input".to_string()),
        }
    }

    fn expect(&mut self, expected: char) -> Result<(), JErrorType> {
        self.skip_whitespace();
        if self.peek() == Some(expected) {
            self.pos += 1;
            Ok(())
        } else {
            Err(self.unexpected())
        }
    }

    fn skip_whitespace(&mut self) {
        while let Some(c) = self.peek() {
            if matches!(c, ' ' | '\t' | '\n' | '\r') {
                self.pos += 1;
            } else {
                break;
            }
        }
    }

    fn parse_value(&mut self, ctx: &mut EvalContext) -> Result<JsValue, JErrorType> {
        self.skip_whitespace();
        match self.peek() {
            Some('"') => self.parse_string().map(JsValue::String),
            Some('-') | Some('0'..='9') => self.parse_number(),
            Some('[') => self.parse_array(ctx),
            Some('{') => self.parse_object(ctx),
            Some('t') => self.parse_keyword("true", JsValue::Boolean(true)),
            Some('f') => self.parse_keyword("false", JsValue::Boolean(false)),
            Some('n') => self.parse_keyword("null", JsValue::Null),
            _ => Err(self.unexpected()),
        }
    }

    fn parse_keyword(&mut self, word: &str, value: JsValue) -> Result<JsValue, JErrorType> {
        for expected in word.chars() {
            if self.peek() != Some(expected) {
                return Err(self.unexpected());
            }
            self.pos += 1;
        }
        Ok(value)
    }

    fn parse_string(&mut self) -> Result<String, JErrorType> {
        self.pos += 1;
        let mut result = String::new();
        loop {
            match self.peek() {
                None => return Err(JErrorType::SyntaxError("Unterminated string in JSON".to_string())),
                Some('"') => {
                    self.pos += 1;
                    return Ok(result);
                }
                Some('\\') => {
                    self.pos += 1;
                    let escaped = match self.next() {
                        Some('"') => '"',
                        Some('\\') => '\\',
                        Some('/') => '/',
                        Some('b') => '\u{0008}',
                        Some('f') => '\u{000C}',
                        Some('n') => '\n',
                        Some('r') => '\r',
                        Some('t') => '\t',
                        Some('u') => self.parse_unicode_escape()?,
                        _ => {
                            self.pos -= 1;
                            return Err(self.unexpected());
                        }
                    };
                    result.push(escaped);
                }
                Some(c) if (c as u32) < 0x20 => return Err(self.unexpected()),
                Some(c) => {
                    self.pos += 1;
                    result.push(c);
                }
            }
        }
    }

    fn parse_unicode_escape(&mut self) -> Result<char, JErrorType> {
        let mut code = 0u32;
        for _ in 0..4 {
            match self.peek().and_then(|c| c.to_digit(16)) {
                Some(d) => {
                    code = code * 16 + d;
                    self.pos += 1;
                }
                None => return Err(self.unexpected()),
            }
        }
        Ok(char::from_u32(code).unwrap_or('\u{FFFD}'))
    }

    fn parse_number(&mut self) -> Result<JsValue, JErrorType> {
        let start = self.pos;
        if self.peek() == Some('-') {
            self.pos += 1;
        }
        match self.peek() {
            Some('0') => self.pos += 1,
            Some('1'..='9') => self.skip_digits(),
            _ => return Err(self.unexpected()),
        }
        if self.peek() == Some('.') {
            self.pos += 1;
            if !self.peek().map_or(false, |c| c.is_ascii_digit()) {
                return Err(self.unexpected());
            }
            self.skip_digits();
        }
        if matches!(self.peek(), Some('e') | Some('E')) {
            self.pos += 1;
            if matches!(self.peek(), Some('+') | Some('-')) {
                self.pos += 1;
            }
            if !self.peek().map_or(false, |c| c.is_ascii_digit()) {
                return Err(self.unexpected());
            }
            self.skip_digits();
        }
        let text: String = self.chars[start..self.pos].iter().collect();
        text.parse::<f64>()
            .map(JsValue::from_f64)
            .map_err(|_| JErrorType::SyntaxError(format!("Unexpected number in JSON at position {}", start)))
    }

    fn skip_digits(&mut self) {
        while self.peek().map_or(false, |c| c.is_ascii_digit()) {
            self.pos += 1;
        }
    }

    fn parse_array(&mut self, ctx: &mut EvalContext) -> Result<JsValue, JErrorType> {
        self.pos += 1;
        let mut values = vec![];
        self.skip_whitespace();
        if self.peek() == Some(']') {
            self.pos += 1;
            return Ok(ctx.new_array(values));
        }
        loop {
            values.push(self.parse_value(ctx)?);
            self.skip_whitespace();
            match self.peek() {
                Some(',') => self.pos += 1,
                Some(']') => {
                    self.pos += 1;
                    return Ok(ctx.new_array(values));
                }
                _ => return Err(self.unexpected()),
            }
        }
    }

    fn parse_object(&mut self, ctx: &mut EvalContext) -> Result<JsValue, JErrorType> {
        self.pos += 1;
        let object = ctx.new_object();
        self.skip_whitespace();
        if self.peek() == Some('}') {
            self.pos += 1;
            return Ok(JsValue::Object(object));
        }
        loop {
            self.skip_whitespace();
            if self.peek() != Some('"') {
                return Err(self.unexpected());
            }
            let key = self.parse_string()?;
            self.expect(':')?;
            let value = self.parse_value(ctx)?;
            object.borrow_mut().set_own_property(&key, value);
            self.skip_whitespace();
            match self.peek() {
                Some(',') => self.pos += 1,
                Some('}') => {
                    self.pos += 1;
                    return Ok(JsValue::Object(object));
                }
                _ => return Err(self.unexpected()),
            }
        }
    }
}

/// JSON.stringify - Convert JavaScript value to JSON string.
fn json_stringify(ctx: &mut EvalContext, _this: JsValue, args: Vec<JsValue>) -> Result<JsValue, JErrorType> {
    let result = stringify(ctx, &arg(&args, 0), &arg(&args, 1), &arg(&args, 2))?;
    Ok(result.map_or(JsValue::Undefined, JsValue::String))
}

enum Replacer {
    None,
    Function(JsValue),
    AllowList(Vec<String>),
}

struct Serializer {
    replacer: Replacer,
    gap: String,
    stack: Vec<JsObjectType>,
}

/// `JSON.stringify(value, replacer, space)`. `None` stands for the `undefined` result
/// produced for functions and `undefined` itself.
pub fn stringify(
    ctx: &mut EvalContext,
    value: &JsValue,
    replacer: &JsValue,
    space: &JsValue,
) -> Result<Option<String>, JErrorType> {
    let replacer = match replacer {
        JsValue::Object(o) if o.borrow().is_callable() => Replacer::Function(replacer.clone()),
        JsValue::Object(o) => match o.borrow().as_array() {
            Some(keys) => Replacer::AllowList(keys.iter().map(to_string).collect()),
            None => Replacer::None,
        },
        _ => Replacer::None,
    };
    let gap = match space {
        JsValue::Number(_) => " ".repeat(to_integer_or_infinity(space).clamp(0.0, 10.0) as usize),
        JsValue::String(s) => s.chars().take(10).collect(),
        _ => String::new(),
    };
    let mut serializer = Serializer {
        replacer,
        gap,
        stack: vec![],
    };
    let wrapper = ctx.new_object();
    wrapper.borrow_mut().set_own_property("", value.clone());
    serializer.serialize_property(ctx, &JsValue::Object(wrapper), "", value.clone(), "")
}

impl Serializer {
    fn serialize_property(
        &mut self,
        ctx: &mut EvalContext,
        holder: &JsValue,
        key: &str,
        value: JsValue,
        indent: &str,
    ) -> Result<Option<String>, JErrorType> {
        let mut value = value;
        if let JsValue::Object(_) = value {
            let to_json = get_value_property(ctx, &value, "toJSON")?;
            if to_json.is_callable() {
                value = call_function(ctx, &to_json, value, vec![JsValue::String(key.to_string())])?;
            }
        }
        if let Replacer::Function(f) = &self.replacer {
            let f = f.clone();
            value = call_function(ctx, &f, holder.clone(), vec![JsValue::String(key.to_string()), value])?;
        }
        Ok(match &value {
            JsValue::Null => Some("null".to_string()),
            JsValue::Boolean(b) => Some(b.to_string()),
            JsValue::String(s) => Some(quote(s)),
            JsValue::Number(n) => {
                let f = n.as_f64();
                Some(if f.is_finite() {
                    number_to_string(f)
                } else {
                    "null".to_string()
                })
            }
            JsValue::Undefined => None,
            JsValue::Object(o) => {
                if o.borrow().is_callable() {
                    None
                } else if o.borrow().is_array() {
                    Some(self.serialize_array(ctx, o, indent)?)
                } else {
                    Some(self.serialize_object(ctx, o, indent)?)
                }
            }
        })
    }

    fn enter(&mut self, o: &JsObjectType) -> Result<(), JErrorType> {
        if self.stack.iter().any(|s| Rc::ptr_eq(s, o)) {
            return Err(JErrorType::TypeError("Converting circular structure to JSON".to_string()));
        }
        self.stack.push(o.clone());
        Ok(())
    }

    fn wrap(&self, open: char, close: char, parts: Vec<String>, indent: &str, inner: &str) -> String {
        if parts.is_empty() {
            format!("{}{}", open, close)
        } else if self.gap.is_empty() {
            format!("{}{}{}", open, parts.join(","), close)
        } else {
            let separator = format!(",\n{}", inner);
            format!("{}\n{}{}\n{}{}", open, inner, parts.join(&separator), indent, close)
        }
    }

    fn serialize_array(&mut self, ctx: &mut EvalContext, o: &JsObjectType, indent: &str) -> Result<String, JErrorType> {
        self.enter(o)?;
        let inner = format!("{}{}", indent, self.gap);
        let holder = JsValue::Object(o.clone());
        let len = o.borrow().as_array().map_or(0, |v| v.len());
        let mut parts = vec![];
        for i in 0..len {
            let key = i.to_string();
            let element = get_value_property(ctx, &holder, &key)?;
            let part = self.serialize_property(ctx, &holder, &key, element, &inner)?;
            parts.push(part.unwrap_or_else(|| "null".to_string()));
        }
        self.stack.pop();
        Ok(self.wrap('[', ']', parts, indent, &inner))
    }

    fn serialize_object(&mut self, ctx: &mut EvalContext, o: &JsObjectType, indent: &str) -> Result<String, JErrorType> {
        self.enter(o)?;
        let inner = format!("{}{}", indent, self.gap);
        let holder = JsValue::Object(o.clone());
        let keys = match &self.replacer {
            Replacer::AllowList(keys) => keys.clone(),
            _ => o.borrow().own_enumerable_keys(),
        };
        let colon = if self.gap.is_empty() { ":" } else { ": " };
        let mut parts = vec![];
        for key in keys {
            let v = get_value_property(ctx, &holder, &key)?;
            if let Some(part) = self.serialize_property(ctx, &holder, &key, v, &inner)? {
                parts.push(format!("{}{}{}", quote(&key), colon, part));
            }
        }
        self.stack.pop();
        Ok(self.wrap('{', '}', parts, indent, &inner))
    }
}

fn quote(s: &str) -> String {
    let mut result = String::with_capacity(s.len() + 2);
    result.push('"');
    for c in s.chars() {
        match c {
            '"' => result.push_str("\\\""),
            '\\' => result.push_str("\\\\"),
            '\u{0008}' => result.push_str("\\b"),
            '\u{000C}' => result.push_str("\\f"),
            '\n' => result.push_str("\\n"),
            '\r' => result.push_str("\\r"),
            '\t' => result.push_str("\\t"),
            c if (c as u32) < 0x20 => result.push_str(&format!("\\u{:04x}", c as u32)),
            c => result.push(c),
        }
    }
    result.push('"');
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quote_escapes_control_characters() {
        assert_eq!(quote("a\"b"), "\"a\\\"b\"");
        assert_eq!(quote("line\nnext"), "\"line\\nnext\"");
        assert_eq!(quote("\u{0001}"), "\"\\u0001\"");
    }
}
