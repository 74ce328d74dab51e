//! Dot-path access to nested JSON trees.
//!
//! A path such as `"site.nav.0.title"` addresses nested values: each
//! `.`-separated segment is a mapping key, or an index when the current
//! value is a sequence.
//!
//! - [`get`] never mutates and returns `None` for a missing path.
//! - [`set`] overwrites the leaf, creating empty mappings along the way.
//! - [`add`] merges into the leaf: strings concatenate, numbers sum,
//!   sequences append and mappings merge shallowly.
//!
//! `set` and `add` replace any scalar found at an intermediate segment with
//! an empty mapping. Existing data at that segment is lost.

mod stache;

pub use stache::stache;

use serde_json::{Map, Number, Value};

/// Path segment separator.
pub const SEPARATOR: char = '.';

/// Look up the value at `path`.
pub fn get<'a>(tree: &'a Value, path: &str) -> Option<&'a Value> {
    let (head, rest) = split(path);
    let child = match tree {
        Value::Object(map) => map.get(head)?,
        Value::Array(items) => items.get(head.parse::<usize>().ok()?)?,
        _ => return None,
    };
    match rest {
        Some(rest) => get(child, rest),
        None => Some(child),
    }
}

/// Set `value` at `path`, overwriting whatever was there.
pub fn set(tree: &mut Value, path: &str, value: Value) {
    *slot(tree, path) = value;
}

/// Add `value` into the leaf at `path`.
///
/// An absent leaf starts from the zero value of the incoming type, so the
/// first `add` behaves like [`set`]. A leaf of a different kind is replaced.
/// Booleans and null cannot be added and are stored as with `set`.
pub fn add(tree: &mut Value, path: &str, value: Value) {
    let leaf = slot(tree, path);
    let current = std::mem::take(leaf);
    *leaf = merge(current, value);
}

/// Walk `path`, creating containers as needed, and return the leaf slot.
///
/// A missing leaf is returned as `Value::Null`. On a sequence, an index one
/// past the end appends; any other segment turns the sequence into a mapping
/// keyed by index so its elements are kept.
fn slot<'a>(tree: &'a mut Value, path: &str) -> &'a mut Value {
    let (head, rest) = split(path);
    let index = match &*tree {
        Value::Array(items) => head.parse::<usize>().ok().filter(|i| *i <= items.len()),
        _ => None,
    };
    if tree.is_array() && index.is_none() {
        if let Value::Array(items) = tree.take() {
            *tree = Value::Object(keyed_by_index(items));
        }
    }
    let child = match (tree, index) {
        (Value::Array(items), Some(index)) => {
            if index == items.len() {
                items.push(Value::Null);
            }
            &mut items[index]
        }
        (tree, _) => ensure_object(tree).entry(head.to_string()).or_insert(Value::Null),
    };
    match rest {
        Some(rest) => descend(child, rest),
        None => child,
    }
}

fn keyed_by_index(items: Vec<Value>) -> Map<String, Value> {
    items
        .into_iter()
        .enumerate()
        .map(|(i, item)| (i.to_string(), item))
        .collect()
}

fn ensure_object(value: &mut Value) -> &mut Map<String, Value> {
    if !value.is_object() {
        *value = Value::Object(Map::new());
    }
    match value {
        Value::Object(map) => map,
        _ => unreachable!("value was just replaced with a mapping"),
    }
}

fn descend<'a>(child: &'a mut Value, rest: &str) -> &'a mut Value {
    if !child.is_object() && !child.is_array() {
        *child = Value::Object(Map::new());
    }
    slot(child, rest)
}

fn split(path: &str) -> (&str, Option<&str>) {
    match path.split_once(SEPARATOR) {
        Some((head, rest)) => (head, Some(rest)),
        None => (path, None),
    }
}

fn merge(current: Value, incoming: Value) -> Value {
    match (current, incoming) {
        (Value::Null, incoming) => merge(zero_of(&incoming), incoming),
        (Value::String(mut a), Value::String(b)) => {
            a.push_str(&b);
            Value::String(a)
        }
        (Value::Number(a), Value::Number(b)) => Value::Number(sum(&a, &b).unwrap_or(a)),
        (Value::Array(mut a), Value::Array(b)) => {
            a.extend(b);
            Value::Array(a)
        }
        (Value::Object(mut a), Value::Object(b)) => {
            a.extend(b);
            Value::Object(a)
        }
        (_, incoming) => incoming,
    }
}

fn zero_of(value: &Value) -> Value {
    match value {
        Value::String(_) => Value::String(String::new()),
        Value::Number(_) => Value::Number(0.into()),
        Value::Array(_) => Value::Array(Vec::new()),
        Value::Object(_) => Value::Object(Map::new()),
        // not addable: `merge` falls through to the incoming value
        Value::Bool(_) | Value::Null => Value::Bool(false),
    }
}

/// `None` when the total is not a finite number.
fn sum(a: &Number, b: &Number) -> Option<Number> {
    if let (Some(x), Some(y)) = (a.as_i64(), b.as_i64()) {
        if let Some(total) = x.checked_add(y) {
            return Some(total.into());
        }
    }
    if let (Some(x), Some(y)) = (a.as_u64(), b.as_u64()) {
        if let Some(total) = x.checked_add(y) {
            return Some(total.into());
        }
    }
    Number::from_f64(a.as_f64()? + b.as_f64()?)
}

/// Overlay `options` onto `defaults` and drop keys whose value ends up null.
pub fn merge_defaults(options: Map<String, Value>, defaults: Map<String, Value>) -> Map<String, Value> {
    let mut merged = defaults;
    merged.extend(options);
    merged.retain(|_, value| !value.is_null());
    merged
}
