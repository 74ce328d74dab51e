//! Minimal `{{path}}` placeholder substitution.

use std::sync::LazyLock;

use regex::{Captures, Regex};
use serde_json::Value;

static PLACEHOLDER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{\{([a-zA-Z0-9.\-_]+)\}\}").expect("placeholder pattern compiles"));

/// Replace every `{{path}}` in `template` with the value found at that
/// dot-path in `values`.
///
/// Strings are inserted as-is, other values as compact JSON. Placeholders
/// whose path is missing (or null) are kept untouched.
pub fn stache(template: &str, values: &Value) -> String {
    PLACEHOLDER
        .replace_all(template, |caps: &Captures<'_>| match super::get(values, &caps[1]) {
            None | Some(Value::Null) => caps[0].to_string(),
            Some(Value::String(s)) => s.clone(),
            Some(other) => other.to_string(),
        })
        .into_owned()
}
