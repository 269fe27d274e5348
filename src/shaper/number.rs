//! Loose numeric coercion
//!
//! Database drivers hand back numerics as strings (`"1234.50"`), bigints as
//! strings, and sometimes booleans. Everything is coerced the way a browser
//! client would coerce it with `Number(x)`.

use serde_json::Value;

/// Coerce a JSON value to a number; `None` when it is not a number (NaN)
///
/// - `null`, `""` and whitespace-only strings are `0`
/// - booleans are `0`/`1`
/// - strings are trimmed and accept `0x`/`0o`/`0b` prefixes and `Infinity`
/// - arrays and objects are NaN, except `[]` (0) and a one-element array
///   that coerces to a number
pub fn js_number(value: &Value) -> Option<f64> {
    match value {
        Value::Null => Some(0.0),
        Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
        Value::Number(n) => n.as_f64(),
        Value::String(s) => parse_numeric_str(s),
        Value::Array(items) => match items.as_slice() {
            [] => Some(0.0),
            [single] if !single.is_array() && !single.is_object() => match single {
                Value::Null => Some(0.0),
                Value::Bool(_) => None,
                other => js_number(other),
            },
            _ => None,
        },
        Value::Object(_) => None,
    }
}

/// Finite number or `0`
pub fn to_number(value: &Value) -> f64 {
    match js_number(value) {
        Some(n) if n.is_finite() => n,
        _ => 0.0,
    }
}

fn parse_numeric_str(raw: &str) -> Option<f64> {
    let s = raw.trim();
    if s.is_empty() {
        return Some(0.0);
    }

    let radix = |prefix: [&str; 2], radix: u32| -> Option<Option<f64>> {
        let digits = prefix.iter().find_map(|p| s.strip_prefix(p))?;
        Some(u64::from_str_radix(digits, radix).ok().map(|n| n as f64))
    };
    if let Some(n) = radix(["0x", "0X"], 16) {
        return n;
    }
    if let Some(n) = radix(["0o", "0O"], 8) {
        return n;
    }
    if let Some(n) = radix(["0b", "0B"], 2) {
        return n;
    }

    let (sign, body) = match s.as_bytes()[0] {
        b'-' => (-1.0, &s[1..]),
        b'+' => (1.0, &s[1..]),
        _ => (1.0, s),
    };
    if body == "Infinity" {
        return Some(sign * f64::INFINITY);
    }
    // Rust's parser also accepts "inf"/"nan" spellings, which Number() rejects
    if !body
        .chars()
        .all(|c| c.is_ascii_digit() || matches!(c, '.' | 'e' | 'E' | '+' | '-'))
    {
        return None;
    }
    body.parse::<f64>().ok().map(|n| sign * n)
}
