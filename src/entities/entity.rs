//! Shared entity identity and metadata.
//!
//! Every node in the entity graph (collection, component, variant) carries
//! an [`EntityMeta`]: a stable id derived from its structural path, a
//! sibling-unique handle, display label/title, ordering and visibility.
//! Parent links are non-owning slash-path strings, so the graph stays a
//! plain tree with no reference cycles.

use crate::naming::{slugify, titlize};
use serde::Serialize;

/// Common identity and display metadata for graph entities.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EntityMeta {
    /// Stable content-independent id, derived from the structural path.
    /// Identical source layouts produce identical ids across rebuilds.
    pub id: String,
    pub name: String,
    /// URL/CLI-safe slug, unique among siblings.
    pub handle: String,
    pub label: String,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order: Option<u32>,
    pub hidden: bool,
    /// Slash path from the source root (`patterns/button/large`).
    pub path: String,
    /// Non-owning back-reference to the parent's path. `None` at the root.
    #[serde(skip)]
    pub parent_path: Option<String>,
}

impl EntityMeta {
    /// Build metadata for an entity named `name` under `parent_path`.
    /// Label and title default from the name by title-casing; config
    /// overrides are applied afterwards by the builder.
    pub fn new(name: &str, parent_path: Option<&str>) -> Self {
        let handle = slugify(name);
        let path = match parent_path {
            Some(parent) if !parent.is_empty() => format!("{parent}/{handle}"),
            _ => handle.clone(),
        };
        let label = titlize(name);
        Self {
            id: entity_id(&path),
            name: name.to_string(),
            handle,
            label: label.clone(),
            title: label,
            order: None,
            hidden: false,
            parent_path: parent_path.map(str::to_string),
            path,
        }
    }

    /// Re-derive path and id after a handle change (sibling
    /// disambiguation). The name and display fields are untouched.
    pub fn rehandle(&mut self, handle: String) {
        self.handle = handle;
        self.path = match self.parent_path.as_deref() {
            Some(parent) if !parent.is_empty() => format!("{}/{}", parent, self.handle),
            _ => self.handle.clone(),
        };
        self.id = entity_id(&self.path);
    }
}

/// Derive a stable entity id from a structural slash path.
pub fn entity_id(path: &str) -> String {
    let hash = blake3::hash(path.as_bytes());
    hex::encode(&hash.as_bytes()[..8])
}

/// Read access to common entity metadata.
pub trait Identifiable {
    fn meta(&self) -> &EntityMeta;

    fn id(&self) -> &str {
        &self.meta().id
    }

    fn handle(&self) -> &str {
        &self.meta().handle
    }

    fn name(&self) -> &str {
        &self.meta().name
    }

    fn path(&self) -> &str {
        &self.meta().path
    }
}

/// Sibling ordering: explicit order ascending, absent order last.
pub trait Orderable {
    fn order(&self) -> Option<u32>;

    fn sort_order(&self) -> u32 {
        self.order().unwrap_or(u32::MAX)
    }
}

impl<T: Identifiable> Orderable for T {
    fn order(&self) -> Option<u32> {
        self.meta().order
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_are_stable_per_path() {
        let a = EntityMeta::new("button", Some("patterns"));
        let b = EntityMeta::new("button", Some("patterns"));
        assert_eq!(a.id, b.id);
        assert_eq!(a.path, "patterns/button");

        let elsewhere = EntityMeta::new("button", Some("forms"));
        assert_ne!(a.id, elsewhere.id);
    }

    #[test]
    fn labels_default_from_name() {
        let meta = EntityMeta::new("primary-nav", None);
        assert_eq!(meta.handle, "primary-nav");
        assert_eq!(meta.label, "Primary Nav");
        assert_eq!(meta.title, "Primary Nav");
    }

    #[test]
    fn rehandle_rederives_path_and_id() {
        let mut meta = EntityMeta::new("foo", Some("lib"));
        let original_id = meta.id.clone();
        meta.rehandle("foo-2".to_string());
        assert_eq!(meta.path, "lib/foo-2");
        assert_ne!(meta.id, original_id);
        assert_eq!(meta.name, "foo");
    }
}
