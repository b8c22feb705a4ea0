//! Variants: one renderable instance of a component.

use super::entity::{EntityMeta, Identifiable};
use serde::Serialize;
use serde_json::{Map, Value};
use std::path::PathBuf;

/// One renderable view + context combination belonging to a component.
///
/// Immutable after construction; [`Variant::clone_variant`] is the only
/// sanctioned way to derive a copy, and it preserves the id.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Variant {
    #[serde(flatten)]
    pub meta: EntityMeta,
    /// Owning component's handle (non-owning back-reference).
    pub component: String,
    /// View file name this variant renders with, when one exists.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub view: Option<String>,
    /// Absolute path of the view file.
    #[serde(skip)]
    pub view_path: Option<PathBuf>,
    /// Template context; may contain unresolved `@` reference strings.
    pub context: Map<String, Value>,
    /// Display/preview-pane hints, passed through to renderers.
    pub display: Map<String, Value>,
    /// Handle of the preview layout to wrap this variant in.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub preview: Option<String>,
    pub status: String,
    /// Raw markdown notes; rendering is the markdown collaborator's job.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    /// Config keys outside the reserved vocabulary, carried through to the
    /// JSON projection untouched.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Variant {
    /// The cross-entity reference form: `@component:variant`.
    pub fn full_handle(&self) -> String {
        format!("@{}:{}", self.component, self.meta.handle)
    }

    /// Deep copy preserving the id.
    pub fn clone_variant(&self) -> Variant {
        self.clone()
    }

    /// JSON projection for external renderers and CLIs.
    pub fn to_json(&self) -> Value {
        let mut json = serde_json::to_value(self).unwrap_or(Value::Null);
        if let Value::Object(map) = &mut json {
            map.insert("type".to_string(), Value::String("variant".to_string()));
            map.insert("fullHandle".to_string(), Value::String(self.full_handle()));
        }
        json
    }
}

impl Identifiable for Variant {
    fn meta(&self) -> &EntityMeta {
        &self.meta
    }
}
