use crate::parser::ast::NumberLiteralType;

/// Resolves escape sequences in the body of a string or template literal.
pub fn unescape_string(raw: &str) -> Result<String, String> {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars().peekable();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        let escaped = match chars.next() {
            Some(e) => e,
            None => return Err("Invalid or unexpected token".to_string()),
        };
        match escaped {
            'n' => out.push('\n'),
            't' => out.push('\t'),
            'r' => out.push('\r'),
            'b' => out.push('\u{0008}'),
            'f' => out.push('\u{000C}'),
            'v' => out.push('\u{000B}'),
            '0' if !matches!(chars.peek(), Some(d) if d.is_ascii_digit()) => out.push('\0'),
            'x' => {
                let hex: String = chars.by_ref().take(2).collect();
                out.push(code_point_from_hex(&hex, 2)?);
            }
            'u' => {
                if chars.peek() == Some(&'{') {
                    chars.next();
                    let mut hex = String::new();
                    loop {
                        match chars.next() {
                            Some('}') => break,
                            Some(h) => hex.push(h),
                            None => return Err("Invalid Unicode escape sequence".to_string()),
                        }
                    }
                    out.push(code_point_from_hex(&hex, 0)?);
                } else {
                    let hex: String = chars.by_ref().take(4).collect();
                    let unit = code_unit_from_hex(&hex)?;
                    if (0xD800..0xDC00).contains(&unit) {
                        // A high surrogate may be followed by an escaped low surrogate.
                        let mut lookahead = chars.clone();
                        if lookahead.next() == Some('\\') && lookahead.next() == Some('u') {
                            let low_hex: String = lookahead.by_ref().take(4).collect();
                            if let Ok(low) = code_unit_from_hex(&low_hex) {
                                if (0xDC00..0xE000).contains(&low) {
                                    let cp = 0x10000 + ((unit - 0xD800) << 10) + (low - 0xDC00);
                                    out.push(char::from_u32(cp).unwrap_or('\u{FFFD}'));
                                    chars = lookahead;
                                    continue;
                                }
                            }
                        }
                    }
                    out.push(char::from_u32(unit).unwrap_or('\u{FFFD}'));
                }
            }
            '\r' => {
                if chars.peek() == Some(&'\n') {
                    chars.next();
                }
            }
            '\n' | '\u{2028}' | '\u{2029}' => {}
            other => out.push(other),
        }
    }
    Ok(out)
}

fn code_unit_from_hex(hex: &str) -> Result<u32, String> {
    if hex.len() != 4 {
        return Err("Invalid Unicode escape sequence".to_string());
    }
    u32::from_str_radix(hex, 16).map_err(|_| "Invalid Unicode escape sequence".to_string())
}

fn code_point_from_hex(hex: &str, exact_len: usize) -> Result<char, String> {
    let message = if exact_len == 2 {
        "Invalid hexadecimal escape sequence"
    } else {
        "Invalid Unicode escape sequence"
    };
    if hex.is_empty() || (exact_len > 0 && hex.len() != exact_len) {
        return Err(message.to_string());
    }
    let cp = u32::from_str_radix(hex, 16).map_err(|_| message.to_string())?;
    if cp > 0x10FFFF {
        return Err("Undefined Unicode code-point".to_string());
    }
    Ok(char::from_u32(cp).unwrap_or('\u{FFFD}'))
}

/// Converts the text of a numeric literal token into a number.
pub fn parse_numeric_literal(s: &str) -> NumberLiteralType {
    let radix = match s.get(0..2) {
        Some("0x") | Some("0X") => 16,
        Some("0b") | Some("0B") => 2,
        Some("0o") | Some("0O") => 8,
        _ => 10,
    };
    if radix != 10 {
        let digits = &s[2..];
        return match i64::from_str_radix(digits, radix) {
            Ok(i) => NumberLiteralType::IntegerLiteral(i),
            Err(_) => NumberLiteralType::FloatLiteral(digits.chars().fold(0.0, |acc, d| {
                acc * radix as f64 + d.to_digit(radix).unwrap_or(0) as f64
            })),
        };
    }
    if !s.contains(['.', 'e', 'E']) {
        if let Ok(i) = s.parse::<i64>() {
            return NumberLiteralType::IntegerLiteral(i);
        }
    }
    NumberLiteralType::FloatLiteral(s.parse::<f64>().unwrap_or(f64::NAN))
}
