//! Identifier checks and JSON <-> SQLite value conversion.

use serde_json::{Number, Value};
use tokio_rusqlite::rusqlite::types::{Value as SqlValue, ValueRef};

use crate::Error;

/// Reject anything that isn't a plain SQL identifier.
///
/// Table and column names are interpolated into statements, so only
/// `[A-Za-z_][A-Za-z0-9_]*` is accepted.
pub fn ensure_identifier(name: &str) -> Result<(), Error> {
    let mut chars = name.chars();
    let valid = matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_');
    if valid { Ok(()) } else { Err(Error::InvalidIdentifier(name.to_string())) }
}

/// Convert a JSON value into a bindable SQLite value.
///
/// Booleans become 0/1; sequences and mappings are stored as JSON text.
pub fn json_to_sql(value: &Value) -> SqlValue {
    match value {
        Value::Null => SqlValue::Null,
        Value::Bool(b) => SqlValue::Integer(i64::from(*b)),
        Value::Number(n) => match n.as_i64() {
            Some(i) => SqlValue::Integer(i),
            None => SqlValue::Real(n.as_f64().unwrap_or_default()),
        },
        Value::String(s) => SqlValue::Text(s.clone()),
        Value::Array(_) | Value::Object(_) => SqlValue::Text(value.to_string()),
    }
}

/// How a column is read back into JSON.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    Plain,
    /// Text holding an encoded sequence or mapping.
    Json,
    /// Integer 0/1, or the strings `true`/`on`/`1`.
    Bool,
}

/// Convert a SQLite column value into JSON.
pub fn sql_to_json(value: ValueRef<'_>, kind: ColumnKind) -> Value {
    match (value, kind) {
        (ValueRef::Null, _) => Value::Null,
        (ValueRef::Integer(i), ColumnKind::Bool) => Value::Bool(i != 0),
        (ValueRef::Text(t), ColumnKind::Bool) => {
            Value::Bool(matches!(String::from_utf8_lossy(t).to_lowercase().as_str(), "true" | "on" | "1"))
        }
        (ValueRef::Text(t), ColumnKind::Json) => {
            // undecodable JSON columns read as an empty sequence
            serde_json::from_slice(t).unwrap_or_else(|_| Value::Array(Vec::new()))
        }
        (ValueRef::Integer(i), _) => Value::Number(i.into()),
        (ValueRef::Real(f), _) => Number::from_f64(f).map(Value::Number).unwrap_or(Value::Null),
        (ValueRef::Text(t), _) => Value::String(String::from_utf8_lossy(t).into_owned()),
        (ValueRef::Blob(b), _) => Value::Array(b.iter().map(|byte| Value::Number((*byte).into())).collect()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_identifiers() {
        assert!(ensure_identifier("posts").is_ok());
        assert!(ensure_identifier("_form_usage2").is_ok());
        assert!(ensure_identifier("").is_err());
        assert!(ensure_identifier("2posts").is_err());
        assert!(ensure_identifier("posts; DROP TABLE x").is_err());
        assert!(ensure_identifier("a.b").is_err());
    }

    #[test]
    fn test_json_to_sql() {
        assert_eq!(json_to_sql(&json!(true)), SqlValue::Integer(1));
        assert_eq!(json_to_sql(&json!(2.5)), SqlValue::Real(2.5));
        assert_eq!(json_to_sql(&json!(["a"])), SqlValue::Text("[\"a\"]".into()));
        assert_eq!(json_to_sql(&Value::Null), SqlValue::Null);
    }

    #[test]
    fn test_sql_to_json_kinds() {
        assert_eq!(sql_to_json(ValueRef::Integer(1), ColumnKind::Bool), json!(true));
        assert_eq!(sql_to_json(ValueRef::Text(b"on"), ColumnKind::Bool), json!(true));
        assert_eq!(sql_to_json(ValueRef::Text(b"[1,2]"), ColumnKind::Json), json!([1, 2]));
        assert_eq!(sql_to_json(ValueRef::Text(b"oops"), ColumnKind::Json), json!([]));
        assert_eq!(sql_to_json(ValueRef::Text(b"[1,2]"), ColumnKind::Plain), json!("[1,2]"));
    }
}
