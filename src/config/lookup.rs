//! Delimited key lookup into a merged value.
//!
//! Objects are indexed by property name, arrays by non-negative integer.
//! A scalar or null reached before the path is exhausted is returned as is.

use serde_json::Value;

/// Walk `root` along `key` split on `delimiter`.
///
/// An empty key yields `root`. Returns `None` when a property is absent or an
/// array index is out of range or not a non-negative integer.
///
/// # Example
/// ```
/// use serde_json::json;
/// use layered_configs::config::lookup;
///
/// let root = json!({"prop1": {"prop2": ["a", "b"]}});
/// assert_eq!(lookup(&root, "prop1/prop2/1", "/"), Some(&json!("b")));
/// assert_eq!(lookup(&root, "prop1/missing", "/"), None);
/// ```
pub fn lookup<'a>(root: &'a Value, key: &str, delimiter: &str) -> Option<&'a Value> {
    if key.is_empty() {
        return Some(root);
    }

    key.split(delimiter)
        .try_fold(root, |current, segment| step(current, segment))
}

fn step<'a>(current: &'a Value, segment: &str) -> Option<&'a Value> {
    match current {
        Value::Object(map) => map.get(segment),
        Value::Array(items) => parse_index(segment).and_then(|i| items.get(i)),
        Value::String(_) | Value::Number(_) | Value::Bool(_) | Value::Null => Some(current),
    }
}

fn parse_index(segment: &str) -> Option<usize> {
    segment.trim().parse::<usize>().ok()
}
