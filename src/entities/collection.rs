//! Collections: ordered, possibly nested sets of components.
//!
//! A collection mirrors one source directory, so the graph is structurally
//! a tree; cycles cannot be expressed. Sibling order is explicit `order`
//! ascending, ties broken components-before-collections, then by name.

use super::component::Component;
use super::entity::{EntityMeta, Identifiable, Orderable};
use super::variant::Variant;
use crate::error::CompileError;
use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::collections::HashSet;

/// One child of a collection.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Item {
    Component(Component),
    Collection(Collection),
}

impl Item {
    pub fn meta(&self) -> &EntityMeta {
        match self {
            Item::Component(c) => &c.meta,
            Item::Collection(c) => &c.meta,
        }
    }

    fn meta_mut(&mut self) -> &mut EntityMeta {
        match self {
            Item::Component(c) => &mut c.meta,
            Item::Collection(c) => &mut c.meta,
        }
    }

    /// Components sort before sub-collections on order ties.
    fn type_rank(&self) -> u8 {
        match self {
            Item::Component(_) => 0,
            Item::Collection(_) => 1,
        }
    }
}

/// A lookup result inside the graph.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum EntityRef<'a> {
    Collection(&'a Collection),
    Component(&'a Component),
    Variant(&'a Variant),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Collection {
    #[serde(flatten)]
    pub meta: EntityMeta,
    #[serde(skip)]
    items: Vec<Item>,
    #[serde(skip)]
    seen: HashSet<String>,
}

impl Collection {
    pub fn new(meta: EntityMeta) -> Self {
        Self {
            meta,
            items: Vec::new(),
            seen: HashSet::new(),
        }
    }

    /// Append a child, disambiguating its handle against existing siblings.
    pub fn push(&mut self, mut item: Item) {
        let unique = crate::naming::unique_handle(&item.meta().handle, &mut self.seen);
        if unique != item.meta().handle {
            item.meta_mut().rehandle(unique);
        }
        self.items.push(item);
    }

    /// Apply the sibling sort: order ascending (absent last), components
    /// before sub-collections, then name ascending.
    pub fn sort_items(&mut self) {
        self.items.sort_by(|a, b| {
            let ka = (order_of(a), a.type_rank(), a.meta().name.clone());
            let kb = (order_of(b), b.type_rank(), b.meta().name.clone());
            ka.cmp(&kb)
        });
    }

    pub fn items(&self) -> &[Item] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// All components, depth-first.
    pub fn components(&self) -> Vec<&Component> {
        let mut out = Vec::new();
        self.collect_components(&mut out);
        out
    }

    fn collect_components<'a>(&'a self, out: &mut Vec<&'a Component>) {
        for item in &self.items {
            match item {
                Item::Component(c) => out.push(c),
                Item::Collection(c) => c.collect_components(out),
            }
        }
    }

    /// All variants of all components, depth-first.
    pub fn variants(&self) -> Vec<&Variant> {
        self.components()
            .into_iter()
            .flat_map(|c| c.variants().iter())
            .collect()
    }

    /// Component handle → structural path, for `@handle` resolution.
    pub fn handle_index(&self) -> HashMap<String, String> {
        self.components()
            .iter()
            .map(|c| (c.meta.handle.clone(), c.meta.path.clone()))
            .collect()
    }

    /// Deep search for a component by handle.
    pub fn find_component(&self, handle: &str) -> Option<&Component> {
        self.components()
            .into_iter()
            .find(|c| c.meta.handle == handle)
    }

    /// Strict lookup, surfacing `ComponentNotFound` to the caller.
    pub fn try_component(&self, handle: &str) -> Result<&Component, CompileError> {
        self.find_component(handle)
            .ok_or_else(|| CompileError::ComponentNotFound(handle.to_string()))
    }

    /// Look an entity up by `@handle[:variant]` or by slash path.
    pub fn find(&self, query: &str) -> Option<EntityRef<'_>> {
        if let Some(handle) = query.strip_prefix('@') {
            return match handle.split_once(':') {
                Some((component, variant)) => {
                    let component = self.find_component(component)?;
                    component.variants().get(variant).map(EntityRef::Variant)
                }
                None => self.find_component(handle).map(EntityRef::Component),
            };
        }
        self.find_by_path(query.trim_matches('/'))
    }

    fn find_by_path(&self, path: &str) -> Option<EntityRef<'_>> {
        if path.is_empty() {
            return Some(EntityRef::Collection(self));
        }
        let (head, rest) = match path.split_once('/') {
            Some((head, rest)) => (head, Some(rest)),
            None => (path, None),
        };
        for item in &self.items {
            if item.meta().handle != head {
                continue;
            }
            return match (item, rest) {
                (Item::Component(c), None) => Some(EntityRef::Component(c)),
                (Item::Component(c), Some(variant)) if !variant.contains('/') => {
                    c.variants().get(variant).map(EntityRef::Variant)
                }
                (Item::Collection(c), None) => Some(EntityRef::Collection(c)),
                (Item::Collection(c), Some(rest)) => c.find_by_path(rest),
                _ => None,
            };
        }
        None
    }

    /// JSON projection, recursively applied to children.
    pub fn to_json(&self) -> Value {
        let mut json = serde_json::to_value(self).unwrap_or(Value::Null);
        if let Value::Object(map) = &mut json {
            map.insert("type".to_string(), Value::String("collection".to_string()));
            map.insert(
                "items".to_string(),
                Value::Array(
                    self.items
                        .iter()
                        .map(|item| match item {
                            Item::Component(c) => c.to_json(),
                            Item::Collection(c) => c.to_json(),
                        })
                        .collect(),
                ),
            );
        }
        json
    }
}

impl Identifiable for Collection {
    fn meta(&self) -> &EntityMeta {
        &self.meta
    }
}

fn order_of(item: &Item) -> u32 {
    match item {
        Item::Component(c) => c.sort_order(),
        Item::Collection(c) => c.sort_order(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::variants::VariantCollection;

    fn component(name: &str, parent: &str, order: Option<u32>) -> Component {
        let mut meta = EntityMeta::new(name, Some(parent));
        meta.order = order;
        let mut variants = VariantCollection::new(None);
        variants.push(Variant {
            meta: EntityMeta::new("default", Some(&meta.path.clone())),
            component: meta.handle.clone(),
            view: None,
            view_path: None,
            context: Map::new(),
            display: Map::new(),
            preview: None,
            status: "ready".to_string(),
            notes: None,
            extra: Map::new(),
        });
        Component {
            meta,
            tags: Vec::new(),
            notes: None,
            preview: None,
            display: Map::new(),
            variants,
            extra: Map::new(),
        }
    }

    fn graph() -> Collection {
        let mut root = Collection::new(EntityMeta::new("components", None));
        let mut forms = Collection::new(EntityMeta::new("forms", Some("components")));
        forms.push(Item::Component(component("input", "components/forms", None)));
        root.push(Item::Component(component("button", "components", Some(2))));
        root.push(Item::Component(component("badge", "components", None)));
        root.push(Item::Collection(forms));
        root.sort_items();
        root
    }

    #[test]
    fn sort_is_order_then_type_then_name() {
        let mut root = Collection::new(EntityMeta::new("root", None));
        let mut sub = Collection::new(EntityMeta::new("alpha", Some("root")));
        sub.push(Item::Component(component("x", "root/alpha", None)));
        root.push(Item::Collection(sub));
        root.push(Item::Component(component("zed", "root", None)));
        root.push(Item::Component(component("first", "root", Some(1))));
        root.sort_items();
        let names: Vec<&str> = root.items().iter().map(|i| i.meta().name.as_str()).collect();
        // Explicit order first, then unordered components before
        // collections, alphabetically.
        assert_eq!(names, vec!["first", "zed", "alpha"]);
    }

    #[test]
    fn duplicate_sibling_handles_are_disambiguated() {
        let mut root = Collection::new(EntityMeta::new("root", None));
        root.push(Item::Component(component("foo", "root", None)));
        root.push(Item::Component(component("foo", "root", None)));
        let handles: Vec<&str> = root
            .items()
            .iter()
            .map(|i| i.meta().handle.as_str())
            .collect();
        assert_eq!(handles, vec!["foo", "foo-2"]);
    }

    #[test]
    fn find_by_handle_and_path() {
        let graph = graph();
        assert!(matches!(graph.find("@button"), Some(EntityRef::Component(_))));
        assert!(matches!(graph.find("@input"), Some(EntityRef::Component(_))));
        assert!(matches!(
            graph.find("@button:default"),
            Some(EntityRef::Variant(_))
        ));
        assert!(matches!(
            graph.find("forms/input"),
            Some(EntityRef::Component(_))
        ));
        assert!(matches!(graph.find("forms"), Some(EntityRef::Collection(_))));
        assert!(graph.find("@missing").is_none());
        assert!(graph.find("forms/nope").is_none());
    }

    #[test]
    fn strict_component_lookup_errors() {
        let graph = graph();
        assert!(graph.try_component("button").is_ok());
        assert!(matches!(
            graph.try_component("missing"),
            Err(CompileError::ComponentNotFound(_))
        ));
    }

    #[test]
    fn handle_index_covers_nested_components() {
        let index = graph().handle_index();
        assert_eq!(index["input"], "components/forms/input");
        assert_eq!(index["button"], "components/button");
    }
}
