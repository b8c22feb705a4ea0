//! Ordered, handle-unique variant sets.

use super::variant::Variant;
use crate::error::CompileError;
use serde::Serialize;
use serde_json::Value;
use std::collections::HashSet;

/// The variants of one component, in insertion order, unique by handle.
///
/// Components guarantee at least one variant at construction, so default
/// resolution is total.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct VariantCollection {
    items: Vec<Variant>,
    /// Config-declared default handle, when present.
    #[serde(skip)]
    default_handle: Option<String>,
    #[serde(skip)]
    seen: HashSet<String>,
}

impl VariantCollection {
    pub fn new(default_handle: Option<String>) -> Self {
        Self {
            items: Vec::new(),
            default_handle,
            seen: HashSet::new(),
        }
    }

    /// Append a variant. A duplicate handle is disambiguated by appending a
    /// numeric suffix in first-seen order (`foo`, `foo-2`, `foo-3`), which
    /// re-derives the variant's path and id.
    pub fn push(&mut self, mut variant: Variant) -> &Variant {
        let unique = crate::naming::unique_handle(&variant.meta.handle, &mut self.seen);
        if unique != variant.meta.handle {
            variant.meta.rehandle(unique);
        }
        self.items.push(variant);
        self.items.last().unwrap_or_else(|| unreachable!())
    }

    /// True when a variant with this exact handle exists.
    pub fn contains(&self, handle: &str) -> bool {
        self.seen.contains(handle)
    }

    pub fn get(&self, handle: &str) -> Option<&Variant> {
        self.items.iter().find(|v| v.meta.handle == handle)
    }

    /// Strict lookup, surfacing `VariantNotFound` to the caller.
    pub fn try_get(&self, component: &str, handle: &str) -> Result<&Variant, CompileError> {
        self.get(handle).ok_or_else(|| CompileError::VariantNotFound {
            component: component.to_string(),
            variant: handle.to_string(),
        })
    }

    /// Lookup with fallback to the default variant; never fails.
    pub fn get_or_default(&self, handle: &str) -> &Variant {
        self.get(handle).unwrap_or_else(|| self.default())
    }

    /// The default variant: the config-declared default handle when present
    /// and valid, else the first variant in insertion order. The non-empty
    /// invariant is enforced at component construction, so an empty
    /// collection here is a programmer error.
    pub fn default(&self) -> &Variant {
        if let Some(handle) = &self.default_handle {
            if let Some(variant) = self.get(handle) {
                return variant;
            }
        }
        self.items
            .first()
            .expect("component invariant violated: no variants")
    }

    pub fn default_handle(&self) -> &str {
        &self.default().meta.handle
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Variant> {
        self.items.iter()
    }

    /// JSON projection; the default variant is flagged.
    pub fn to_json(&self) -> Value {
        let default_id = self.default().meta.id.clone();
        Value::Array(
            self.items
                .iter()
                .map(|v| {
                    let mut json = v.to_json();
                    if let Value::Object(map) = &mut json {
                        if v.meta.id == default_id {
                            map.insert("default".to_string(), Value::Bool(true));
                        }
                    }
                    json
                })
                .collect(),
        )
    }
}

impl<'a> IntoIterator for &'a VariantCollection {
    type Item = &'a Variant;
    type IntoIter = std::slice::Iter<'a, Variant>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}
