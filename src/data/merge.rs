//! Deep-default merging for config mappings.
//!
//! Cascading configuration and variant defaults both use "fill the holes"
//! semantics: values already present in the target always win, missing keys
//! are copied from the defaults, and nested mappings merge recursively.
//! Sequences are treated as atomic values, never merged element-wise.

use serde_json::{Map, Value};

/// Fill missing keys in `target` from `defaults`, recursing into nested
/// mappings. Existing target values are never overwritten.
pub fn defaults_deep(target: &mut Map<String, Value>, defaults: &Map<String, Value>) {
    for (key, default_value) in defaults {
        match target.get_mut(key) {
            None => {
                target.insert(key.clone(), default_value.clone());
            }
            Some(Value::Object(existing)) => {
                if let Value::Object(default_map) = default_value {
                    defaults_deep(existing, default_map);
                }
            }
            Some(_) => {}
        }
    }
}

/// Non-destructive variant of [`defaults_deep`].
pub fn with_defaults(over: &Map<String, Value>, under: &Map<String, Value>) -> Map<String, Value> {
    let mut merged = over.clone();
    defaults_deep(&mut merged, under);
    merged
}

/// Project a dotted path (`a.b.0.c`) out of a value. Numeric segments index
/// into sequences. Returns `None` when any segment is missing.
pub fn dotted_get<'a>(value: &'a Value, path: &str) -> Option<&'a Value> {
    let mut current = value;
    for segment in path.split('.') {
        current = match current {
            Value::Object(map) => map.get(segment)?,
            Value::Array(items) => items.get(segment.parse::<usize>().ok()?)?,
            _ => return None,
        };
    }
    Some(current)
}
