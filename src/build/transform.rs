//! Filesystem-to-entity transform.
//!
//! Walks a classified [`FileRecord`] tree and produces the
//! Collection/Component/Variant graph. Pure with respect to its input: all
//! I/O happened when the records were read. A directory is a component when
//! a direct child view shares its name or its config declares
//! `type: component`; everything else is a collection. Malformed config
//! files degrade to an empty config with a warning, and collections that
//! end up empty are dropped.

use super::cascade::{bool_key, map_key, order_key, str_array, str_key, Cascade};
use crate::config::CompilerConfig;
use crate::data::merge::with_defaults;
use crate::data::{self};
use crate::entities::{Collection, Component, EntityMeta, Item, Variant, VariantCollection};
use crate::error::CompileError;
use crate::fs::{FileRecord, FileRole};
use crate::naming::slugify;
use serde_json::{Map, Value};
use tracing::{debug, warn};

/// Config keys with entity-level meaning. Everything else is carried onto
/// the entity's JSON projection untouched.
pub const RESERVED_KEYS: &[&str] = &[
    "id", "type", "name", "handle", "label", "title", "order", "hidden", "status", "context",
    "variants", "preview", "display", "notes", "readme", "tags", "default", "view",
];

/// Builds the entity graph from a record tree.
pub struct TreeBuilder<'a> {
    config: &'a CompilerConfig,
}

struct ComponentInput<'a> {
    name: &'a str,
    order: Option<u32>,
    hidden: bool,
    view: Option<&'a FileRecord>,
    files: &'a [&'a FileRecord],
    config: Map<String, Value>,
    /// Whether a sibling readme may supply notes (component directories
    /// only; file-based components have no directory of their own).
    allow_readme: bool,
    cascade: &'a Cascade,
    parent_path: Option<&'a str>,
}

impl<'a> TreeBuilder<'a> {
    pub fn new(config: &'a CompilerConfig) -> Self {
        Self { config }
    }

    /// Transform a record tree into the root collection.
    pub fn build(&self, root: &FileRecord, cascade: &Cascade) -> Result<Collection, CompileError> {
        match self.build_dir(root, cascade, true, None)? {
            Some(Item::Collection(collection)) => Ok(collection),
            // The root is never classified as a component and never dropped.
            _ => Ok(Collection::new(EntityMeta::new(&self.config.name, None))),
        }
    }

    fn build_dir(
        &self,
        dir: &FileRecord,
        cascade: &Cascade,
        root: bool,
        parent_path: Option<&str>,
    ) -> Result<Option<Item>, CompileError> {
        let files: Vec<&FileRecord> = dir.children.iter().filter(|c| !c.is_dir).collect();
        let name = if root {
            self.config.name.clone()
        } else {
            dir.entry_name()
        };
        let config = self.load_config(find_dir_config(&files, &name));

        if !root {
            let own_view = files
                .iter()
                .find(|f| f.role == FileRole::View && f.scope.as_deref() == Some(name.as_str()))
                .copied();
            let declared = str_key(&config, "type").as_deref() == Some("component");
            if own_view.is_some() || declared {
                let component = self.build_component(ComponentInput {
                    name: &name,
                    order: dir.order,
                    hidden: dir.hidden,
                    view: own_view,
                    files: &files,
                    config,
                    allow_readme: true,
                    cascade,
                    parent_path,
                })?;
                return Ok(Some(Item::Component(component)));
            }
        }

        let mut meta = EntityMeta::new(&name, parent_path);
        apply_meta_overrides(&mut meta, &config);
        if !root {
            meta.order = order_key(&config, "order").or(dir.order);
            meta.hidden = bool_key(&config, "hidden").unwrap_or(dir.hidden);
        }
        let path = meta.path.clone();
        let child_cascade = cascade.descend(&config);
        let mut collection = Collection::new(meta);

        // Component files directly inside this collection.
        for view in files.iter().filter(|f| f.role == FileRole::View) {
            let comp_name = view.entry_name();
            let comp_config = self.load_config(find_config(&files, &comp_name));
            let component = self.build_component(ComponentInput {
                name: &comp_name,
                order: view.order,
                hidden: view.hidden,
                view: Some(view),
                files: &files,
                config: comp_config,
                allow_readme: false,
                cascade: &child_cascade,
                parent_path: Some(&path),
            })?;
            collection.push(Item::Component(component));
        }

        // Subdirectories are independent subtrees.
        for sub in dir.children.iter().filter(|c| c.is_dir) {
            if let Some(item) = self.build_dir(sub, &child_cascade, false, Some(&path))? {
                collection.push(item);
            }
        }

        collection.sort_items();
        if !root && collection.is_empty() {
            debug!("dropping empty collection '{}'", path);
            return Ok(None);
        }
        Ok(Some(Item::Collection(collection)))
    }

    fn build_component(&self, input: ComponentInput<'_>) -> Result<Component, CompileError> {
        let mut config = input.config;

        // Inline frontmatter on the view file has the highest precedence.
        if let Some(view) = input.view {
            if let Some(bytes) = &view.contents {
                match data::parse_frontmatter(bytes, &view.path) {
                    Ok(Some(front)) => config = with_defaults(&front, &config),
                    Ok(None) => {}
                    Err(err) => warn!("{err}; ignoring frontmatter"),
                }
            }
        }

        let mut meta = EntityMeta::new(input.name, input.parent_path);
        apply_meta_overrides(&mut meta, &config);
        meta.order = order_key(&config, "order").or(input.order);
        meta.hidden = bool_key(&config, "hidden").unwrap_or(input.hidden);

        // Cascading keys: directory config over inherited values.
        let context = match config.get("context").and_then(Value::as_object) {
            Some(own) => with_defaults(own, &input.cascade.context),
            None => input.cascade.context.clone(),
        };
        let preview = str_key(&config, "preview").or_else(|| input.cascade.preview.clone());
        let status_handle = str_key(&config, "status").or_else(|| input.cascade.status.clone());
        let status = self.config.statuses.normalize(status_handle.as_deref());
        let display = match config.get("display").and_then(Value::as_object) {
            Some(own) => own.clone(),
            None => input.cascade.display.clone(),
        };

        let mut tags = str_array(&config, "tags");
        for tag in &input.cascade.tags {
            if !tags.contains(tag) {
                tags.push(tag.clone());
            }
        }

        let notes = str_key(&config, "notes")
            .or_else(|| str_key(&config, "readme"))
            .or_else(|| {
                if input.allow_readme {
                    input
                        .files
                        .iter()
                        .find(|f| f.role == FileRole::Readme)
                        .and_then(|f| f.text())
                } else {
                    None
                }
            });

        let default_handle = str_key(&config, "default")
            .map(|h| slugify(&h))
            .unwrap_or_else(|| self.config.default_variant.clone());

        // Variant defaults carry the cascading keys only; label, title and
        // notes must never inherit.
        let mut variant_defaults = Map::new();
        variant_defaults.insert("context".to_string(), Value::Object(context.clone()));
        variant_defaults.insert("status".to_string(), Value::String(status.clone()));
        variant_defaults.insert("display".to_string(), Value::Object(display.clone()));
        if let Some(p) = &preview {
            variant_defaults.insert("preview".to_string(), Value::String(p.clone()));
        }

        let var_views: Vec<&FileRecord> = input
            .files
            .iter()
            .filter(|f| {
                f.role == FileRole::VariantView && f.scope.as_deref() == Some(input.name)
            })
            .copied()
            .collect();

        let declared: Vec<Value> = config
            .get("variants")
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default();
        let declares_default = declared.iter().any(|entry| {
            entry
                .as_object()
                .and_then(|m| str_key(m, "name").or_else(|| str_key(m, "handle")))
                .map(|n| slugify(&n) == default_handle)
                .unwrap_or(false)
        });

        let mut variants = VariantCollection::new(Some(default_handle.clone()));

        // The component's own view always yields the base variant unless a
        // config entry claims the default handle.
        if input.view.is_some() && !declares_default {
            variants.push(self.make_variant(
                &meta,
                &default_handle,
                &variant_defaults,
                &Map::new(),
                input.view,
                &var_views,
            ));
        }

        for entry in &declared {
            let Some(entry_map) = entry.as_object() else {
                warn!("variant of '{}' is not a mapping, skipping", meta.handle);
                continue;
            };
            let Some(vname) =
                str_key(entry_map, "name").or_else(|| str_key(entry_map, "handle"))
            else {
                warn!("variant of '{}' has no name, skipping", meta.handle);
                continue;
            };
            variants.push(self.make_variant(
                &meta,
                &vname,
                &variant_defaults,
                entry_map,
                input.view,
                &var_views,
            ));
        }

        // View files not claimed by a config entry become variants.
        for view in &var_views {
            let Some(vhandle) = variant_handle(&view.stem(), &self.config.splitter) else {
                continue;
            };
            if variants.contains(&vhandle) {
                continue;
            }
            let mut entry = Map::new();
            entry.insert("name".to_string(), Value::String(vhandle.clone()));
            if let Some(file_name) = view.rel_path.file_name().and_then(|n| n.to_str()) {
                entry.insert("view".to_string(), Value::String(file_name.to_string()));
            }
            variants.push(self.make_variant(
                &meta,
                &vhandle,
                &variant_defaults,
                &entry,
                input.view,
                &var_views,
            ));
        }

        // Every component carries at least one variant.
        if variants.is_empty() {
            variants.push(self.make_variant(
                &meta,
                &default_handle,
                &variant_defaults,
                &Map::new(),
                input.view,
                &var_views,
            ));
        }

        Ok(Component {
            extra: extra_of(&config),
            meta,
            tags,
            notes,
            preview,
            display,
            variants,
        })
    }

    fn make_variant(
        &self,
        component: &EntityMeta,
        vname: &str,
        defaults: &Map<String, Value>,
        entry: &Map<String, Value>,
        component_view: Option<&FileRecord>,
        var_views: &[&FileRecord],
    ) -> Variant {
        let merged = with_defaults(entry, defaults);
        let mut meta = EntityMeta::new(vname, Some(&component.path));
        // Label/title come from the entry alone, never from the defaults.
        if let Some(label) = str_key(entry, "label") {
            meta.title = str_key(entry, "title").unwrap_or_else(|| label.clone());
            meta.label = label;
        } else if let Some(title) = str_key(entry, "title") {
            meta.title = title;
        }
        meta.order = order_key(entry, "order");
        meta.hidden = bool_key(entry, "hidden").unwrap_or(false);

        let (view, view_path) = resolve_view(
            str_key(&merged, "view"),
            &meta.handle,
            component_view,
            var_views,
            &self.config.splitter,
        );

        Variant {
            component: component.handle.clone(),
            view,
            view_path,
            context: map_key(&merged, "context"),
            display: map_key(&merged, "display"),
            preview: str_key(&merged, "preview"),
            status: self
                .config
                .statuses
                .normalize(str_key(&merged, "status").as_deref()),
            notes: str_key(entry, "notes"),
            extra: extra_of(entry),
            meta,
        }
    }

    fn load_config(&self, file: Option<&FileRecord>) -> Map<String, Value> {
        let Some(file) = file else {
            return Map::new();
        };
        let Some(bytes) = &file.contents else {
            return Map::new();
        };
        match data::parse_file(bytes, &file.path) {
            Ok(map) => map,
            Err(err) => {
                warn!("{err}; continuing with empty config");
                Map::new()
            }
        }
    }
}

fn find_config<'a>(files: &[&'a FileRecord], scope: &str) -> Option<&'a FileRecord> {
    files
        .iter()
        .find(|f| f.role == FileRole::Config && f.scope.as_deref() == Some(scope))
        .copied()
}

/// Config for a directory itself: a stem-scoped file matching the directory
/// name wins, otherwise a bare `config.*` file.
fn find_dir_config<'a>(files: &[&'a FileRecord], name: &str) -> Option<&'a FileRecord> {
    find_config(files, name).or_else(|| {
        files
            .iter()
            .find(|f| f.role == FileRole::Config && f.scope.is_none())
            .copied()
    })
}

fn apply_meta_overrides(meta: &mut EntityMeta, config: &Map<String, Value>) {
    if let Some(handle) = str_key(config, "handle") {
        let slug = slugify(&handle);
        if !slug.is_empty() && slug != meta.handle {
            meta.rehandle(slug);
        }
    }
    if let Some(label) = str_key(config, "label") {
        meta.title = str_key(config, "title").unwrap_or_else(|| label.clone());
        meta.label = label;
    } else if let Some(title) = str_key(config, "title") {
        meta.title = title;
    }
}

/// Variant handle from a variant view stem (`button--large` → `large`).
fn variant_handle(stem: &str, splitter: &str) -> Option<String> {
    let (_, variant) = stem.split_once(splitter)?;
    let slug = slugify(variant);
    if slug.is_empty() {
        None
    } else {
        Some(slug)
    }
}

/// Pick the view file for a variant: an explicitly configured view name, a
/// variant view file matching the handle, or the component's own view.
fn resolve_view(
    configured: Option<String>,
    handle: &str,
    component_view: Option<&FileRecord>,
    var_views: &[&FileRecord],
    splitter: &str,
) -> (Option<String>, Option<std::path::PathBuf>) {
    let file_name = |f: &FileRecord| {
        f.rel_path
            .file_name()
            .and_then(|n| n.to_str())
            .map(str::to_string)
    };
    if let Some(name) = configured {
        let found = var_views
            .iter()
            .find(|f| file_name(f).as_deref() == Some(name.as_str()))
            .copied()
            .or_else(|| {
                component_view.filter(|f| file_name(f).as_deref() == Some(name.as_str()))
            });
        return (Some(name), found.map(|f| f.path.clone()));
    }
    if let Some(matched) = var_views
        .iter()
        .find(|f| variant_handle(&f.stem(), splitter).as_deref() == Some(handle))
    {
        return (file_name(matched), Some(matched.path.clone()));
    }
    match component_view {
        Some(view) => (file_name(view), Some(view.path.clone())),
        None => (None, None),
    }
}

fn extra_of(config: &Map<String, Value>) -> Map<String, Value> {
    config
        .iter()
        .filter(|(key, _)| !RESERVED_KEYS.contains(&key.as_str()))
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect()
}
