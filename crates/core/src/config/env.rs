//! Typed reads of raw environment values.

use serde_json::{Number, Value};

/// Read `key` from the process environment and coerce it with
/// [`parse_env_value`]. Returns `None` when the variable is unset.
pub fn env_value(key: &str) -> Option<Value> {
    std::env::var(key).ok().map(|raw| parse_env_value(&raw))
}

/// Coerce a raw environment string.
///
/// `true`/`false` become booleans and `null` becomes null (any case),
/// numeric strings become numbers, and a value wrapped in matching single or
/// double quotes is unwrapped. Anything else stays a string.
pub fn parse_env_value(raw: &str) -> Value {
    match raw.to_lowercase().as_str() {
        "true" => return Value::Bool(true),
        "false" => return Value::Bool(false),
        "null" => return Value::Null,
        "" => return Value::String(String::new()),
        _ => {}
    }

    let trimmed = raw.trim();
    if let Ok(i) = trimmed.parse::<i64>() {
        return Value::Number(i.into());
    }
    if let Some(n) = trimmed.parse::<f64>().ok().and_then(Number::from_f64) {
        return Value::Number(n);
    }

    for quote in ['"', '\''] {
        if raw.len() >= 2 && raw.starts_with(quote) && raw.ends_with(quote) {
            return Value::String(raw[1..raw.len() - 1].to_string());
        }
    }

    Value::String(raw.to_string())
}
