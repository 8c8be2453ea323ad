//! Top-level merge for parsed configuration files.
//!
//! Later files override earlier ones key by key at the top level only.
//! Nested objects and arrays are replaced entirely, never merged.

use serde_json::{Map, Value};

/// Shallow merge `overlay` into `base`, with `overlay` taking precedence.
///
/// Every top-level key of the overlay replaces the base entry, including an
/// explicit `null`. Keys only present in the base are kept.
///
/// # Example
/// ```
/// use serde_json::json;
/// use layered_configs::config::shallow_merge;
///
/// let base = json!({"server": {"port": 8080, "host": "localhost"}, "debug": true});
/// let overlay = json!({"server": {"port": 9000}});
/// let merged = shallow_merge(base.as_object().unwrap().clone(), overlay.as_object().unwrap().clone());
/// // The nested object is replaced, not merged.
/// assert_eq!(serde_json::Value::Object(merged), json!({"server": {"port": 9000}, "debug": true}));
/// ```
pub fn shallow_merge(mut base: Map<String, Value>, overlay: Map<String, Value>) -> Map<String, Value> {
    for (key, value) in overlay {
        base.insert(key, value);
    }
    base
}

/// Merge mappings in order, with later mappings taking precedence.
pub fn shallow_merge_all(maps: impl IntoIterator<Item = Map<String, Value>>) -> Map<String, Value> {
    maps.into_iter().fold(Map::new(), shallow_merge)
}
