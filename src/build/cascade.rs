//! Cascading directory configuration.
//!
//! Only four keys cascade from ancestor directories to descendants:
//! `context` (deep-merged, nearer wins), `preview`, `status` and `display`
//! (replaced wholesale). Tags accumulate down the tree as a union rather
//! than a cascade, matching component tag inheritance. Every other config
//! key applies only to the directory that declares it.

use crate::data::merge::with_defaults;
use serde_json::{Map, Value};

/// The cascading slice of a directory's configuration.
#[derive(Debug, Clone, Default)]
pub struct Cascade {
    pub context: Map<String, Value>,
    pub preview: Option<String>,
    pub status: Option<String>,
    pub display: Map<String, Value>,
    pub tags: Vec<String>,
}

impl Cascade {
    /// Overlay a directory's own config onto this cascade, producing the
    /// cascade its children inherit.
    pub fn descend(&self, config: &Map<String, Value>) -> Cascade {
        Cascade {
            context: match config.get("context").and_then(Value::as_object) {
                Some(own) => with_defaults(own, &self.context),
                None => self.context.clone(),
            },
            preview: str_key(config, "preview").or_else(|| self.preview.clone()),
            status: str_key(config, "status").or_else(|| self.status.clone()),
            display: match config.get("display").and_then(Value::as_object) {
                Some(own) => own.clone(),
                None => self.display.clone(),
            },
            tags: {
                let mut tags = str_array(config, "tags");
                for tag in &self.tags {
                    if !tags.contains(tag) {
                        tags.push(tag.clone());
                    }
                }
                tags
            },
        }
    }
}

/// String value for a key, when present and a string.
pub fn str_key(config: &Map<String, Value>, key: &str) -> Option<String> {
    config.get(key).and_then(Value::as_str).map(str::to_string)
}

/// Numeric order value for a key. Values outside `u32` range are treated
/// as absent rather than truncated.
pub fn order_key(config: &Map<String, Value>, key: &str) -> Option<u32> {
    config
        .get(key)
        .and_then(Value::as_u64)
        .and_then(|n| u32::try_from(n).ok())
}

pub fn bool_key(config: &Map<String, Value>, key: &str) -> Option<bool> {
    config.get(key).and_then(Value::as_bool)
}

pub fn map_key(config: &Map<String, Value>, key: &str) -> Map<String, Value> {
    config
        .get(key)
        .and_then(Value::as_object)
        .cloned()
        .unwrap_or_default()
}

/// String sequence for a key; non-string elements are ignored.
pub fn str_array(config: &Map<String, Value>, key: &str) -> Vec<String> {
    config
        .get(key)
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}
