use serde_json::Value;

use crate::shaper::js_number;

pub const MIN_LIMIT: u32 = 1;
pub const MAX_LIMIT: u32 = 50;
pub const DEFAULT_LIMIT: u32 = 5;

/// Clamp a requested row limit into `[1, 50]`
///
/// Missing, `null`, blank and non-numeric requests use `default` (itself
/// clamped). Any number, `0` included, is clamped. Fractions are truncated.
pub fn clamp_limit(requested: Option<&Value>, default: u32) -> u32 {
    let default = default.clamp(MIN_LIMIT, MAX_LIMIT);
    let n = requested
        .filter(|v| is_present(v))
        .and_then(js_number)
        .filter(|n| !n.is_nan());
    match n {
        Some(n) => n.trunc().clamp(MIN_LIMIT as f64, MAX_LIMIT as f64) as u32,
        None => default,
    }
}

fn is_present(value: &Value) -> bool {
    match value {
        Value::Null | Value::Bool(_) => false,
        Value::String(s) => !s.trim().is_empty(),
        _ => true,
    }
}
