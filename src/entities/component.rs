//! Components: a named unit owning one or more variants.

use super::entity::{EntityMeta, Identifiable};
use super::variant::Variant;
use super::variants::VariantCollection;
use crate::error::CompileError;
use serde::Serialize;
use serde_json::{Map, Value};

/// A component: metadata plus a non-empty variant collection.
///
/// The builder guarantees at least one variant at construction (a `default`
/// is synthesized when nothing else produces one), so default-variant
/// resolution never fails.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Component {
    #[serde(flatten)]
    pub meta: EntityMeta,
    /// Own tags unioned with inherited parent tags, deduplicated.
    pub tags: Vec<String>,
    /// Raw markdown notes (config `notes`, or the directory readme).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub preview: Option<String>,
    pub display: Map<String, Value>,
    #[serde(skip)]
    pub variants: VariantCollection,
    /// Config keys outside the reserved vocabulary.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Component {
    pub fn variants(&self) -> &VariantCollection {
        &self.variants
    }

    /// Strict lookup by handle.
    pub fn get_variant(&self, handle: &str) -> Result<&Variant, CompileError> {
        self.variants.try_get(&self.meta.handle, handle)
    }

    /// Lookup with fallback to the default variant; total.
    pub fn get_variant_or_default(&self, handle: &str) -> &Variant {
        self.variants.get_or_default(handle)
    }

    pub fn default_variant(&self) -> &Variant {
        self.variants.default()
    }

    /// Distinct variant statuses, first-seen order.
    pub fn statuses(&self) -> Vec<&str> {
        let mut seen = Vec::new();
        for variant in &self.variants {
            if !seen.contains(&variant.status.as_str()) {
                seen.push(variant.status.as_str());
            }
        }
        seen
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t == tag)
    }

    /// JSON projection, recursively covering variants.
    pub fn to_json(&self) -> Value {
        let mut json = serde_json::to_value(self).unwrap_or(Value::Null);
        if let Value::Object(map) = &mut json {
            map.insert("type".to_string(), Value::String("component".to_string()));
            map.insert(
                "status".to_string(),
                Value::Array(
                    self.statuses()
                        .into_iter()
                        .map(|s| Value::String(s.to_string()))
                        .collect(),
                ),
            );
            map.insert("variants".to_string(), self.variants.to_json());
        }
        json
    }
}

impl Identifiable for Component {
    fn meta(&self) -> &EntityMeta {
        &self.meta
    }
}
