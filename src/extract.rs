//! Defensive lookups into loosely structured JSON payloads.
//!
//! Nothing in here fails: a missing key, a value of the wrong type or an
//! undecodable document all collapse to `None`.

use serde_json::Value;

use crate::models::Strategy;

/// Walk `path` through nested objects.
pub fn get_path<'a>(value: &'a Value, path: &[&str]) -> Option<&'a Value> {
    path.iter()
        .try_fold(value, |current, key| current.as_object()?.get(*key))
}

/// Interpret a JSON value as a float. Numeric strings are accepted, booleans are not.
pub fn as_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok().filter(|f| f.is_finite()),
        _ => None,
    }
}

/// Numeric value at `path`, if present and numeric.
pub fn number_at(value: &Value, path: &[&str]) -> Option<f64> {
    get_path(value, path).and_then(as_number)
}

/// Parse a stored `ResultJson` string into a JSON object.
pub fn parse_object(raw: &str) -> Option<Value> {
    if raw.is_empty() {
        return None;
    }
    serde_json::from_str::<Value>(raw)
        .ok()
        .filter(Value::is_object)
}

/// JSON truthiness: null, false, zero and empty strings, arrays or objects are absent.
fn is_present(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(items) => !items.is_empty(),
        Value::Object(map) => !map.is_empty(),
    }
}

/// Score for `strategy` from a stored payload.
///
/// Producers either write `{"mobile": {"score": ..}}` directly or wrap it as
/// `{"insight": {"mobile": {"score": ..}}}`; the top-level value wins when
/// it is truthy.
pub fn strategy_score(payload: &Value, strategy: Strategy) -> Option<f64> {
    let key = strategy.as_str();
    let section = payload
        .get(key)
        .filter(|v| is_present(v))
        .or_else(|| get_path(payload, &["insight", key]))?;
    section
        .as_object()
        .and_then(|obj| obj.get("score"))
        .and_then(as_number)
}

/// Score for `strategy` straight from a raw `ResultJson` string.
pub fn score_from_raw(raw: &str, strategy: Strategy) -> Option<f64> {
    parse_object(raw).and_then(|payload| strategy_score(&payload, strategy))
}

/// Rescale a `[0, 1]` score to a percentage, rounded to two decimals.
pub fn to_percent(score: f64) -> f64 {
    (score * 100.0 * 100.0).round() / 100.0
}
