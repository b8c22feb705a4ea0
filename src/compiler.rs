//! The compiler facade: cached builds, lookup and context resolution.
//!
//! Owns the only mutable shared state in the core: the build cache. A
//! build's output graph is immutable and shared by all readers until the
//! next rebuild replaces it wholesale, keyed by a hash over the source
//! tree's (path, mtime) pairs and the compiler settings. The
//! check-hash-or-rebuild decision happens in one critical section, so
//! concurrent callers cannot race two rebuilds. A watcher notification
//! only marks the cache dirty; the next `parse()` does a full rebuild.

use crate::build::{Cascade, TreeBuilder};
use crate::config::CompilerConfig;
use crate::entities::{Collection, Component, EntityRef, Variant};
use crate::error::CompileError;
use crate::fs::{FileRecord, SourceReader};
use crate::resolve::ContextResolver;
use parking_lot::Mutex;
use serde_json::{Map, Value};
use std::sync::Arc;
use std::time::SystemTime;
use tracing::{debug, info};

/// An owned lookup result from [`Compiler::find`].
#[derive(Debug, Clone)]
pub enum Found {
    Collection(Collection),
    Component(Component),
    Variant(Variant),
}

#[derive(Default)]
struct State {
    graph: Option<Arc<Collection>>,
    resolver: Option<ContextResolver>,
    source_hash: Option<[u8; 32]>,
    dirty: bool,
}

/// Compiles a source directory into an entity graph, caching the result.
pub struct Compiler {
    config: CompilerConfig,
    reader: Arc<dyn SourceReader>,
    state: Mutex<State>,
}

impl Compiler {
    pub fn new(config: CompilerConfig, reader: Arc<dyn SourceReader>) -> Self {
        Self {
            config,
            reader,
            state: Mutex::new(State::default()),
        }
    }

    pub fn config(&self) -> &CompilerConfig {
        &self.config
    }

    /// The current entity graph, rebuilt only when the source hash changed
    /// or the dirty flag is set.
    pub async fn parse(&self) -> Result<Arc<Collection>, CompileError> {
        let tree = self.reader.list_tree(&self.config.source)?;
        let hash = source_hash(&tree, &self.config);

        let mut state = self.state.lock();
        if !state.dirty {
            if let (Some(graph), Some(previous)) = (&state.graph, state.source_hash) {
                if previous == hash {
                    debug!("source unchanged, returning cached graph");
                    return Ok(Arc::clone(graph));
                }
            }
        }

        let graph = Arc::new(TreeBuilder::new(&self.config).build(&tree, &Cascade::default())?);
        info!(
            components = graph.components().len(),
            "built entity graph for {}",
            self.config.source.display()
        );
        state.resolver = Some(ContextResolver::new(&graph));
        state.graph = Some(Arc::clone(&graph));
        state.source_hash = Some(hash);
        state.dirty = false;
        Ok(graph)
    }

    /// Mark the cached graph stale. The next `parse()` performs a full
    /// rebuild even if nothing changed on disk.
    pub fn mark_dirty(&self) {
        debug!("marking build cache dirty");
        self.state.lock().dirty = true;
    }

    pub fn is_dirty(&self) -> bool {
        self.state.lock().dirty
    }

    /// Look an entity up by `@handle[:variant]` or slash path.
    pub async fn find(&self, query: &str) -> Result<Option<Found>, CompileError> {
        let graph = self.parse().await?;
        Ok(graph.find(query).map(|entity| match entity {
            EntityRef::Collection(c) => Found::Collection(c.clone()),
            EntityRef::Component(c) => Found::Component(c.clone()),
            EntityRef::Variant(v) => Found::Variant(v.clone_variant()),
        }))
    }

    /// Fully resolved context for a variant, ready for rendering.
    pub async fn resolve_context(&self, variant: &Variant) -> Result<Map<String, Value>, CompileError> {
        self.parse().await?;
        let resolver = self
            .state
            .lock()
            .resolver
            .clone()
            .ok_or_else(|| CompileError::Config("no graph has been built".to_string()))?;
        Ok(resolver.resolve_variant(variant).await)
    }

    /// Reference-resolution warnings accumulated against the current graph.
    pub fn resolution_warnings(&self) -> Vec<String> {
        self.state
            .lock()
            .resolver
            .as_ref()
            .map(|r| r.warnings())
            .unwrap_or_default()
    }
}

/// Hash of everything a rebuild depends on: every record's relative path
/// and mtime, plus the compiler settings.
fn source_hash(tree: &FileRecord, config: &CompilerConfig) -> [u8; 32] {
    let mut hasher = blake3::Hasher::new();
    hash_record(&mut hasher, tree);
    if let Ok(bytes) = serde_json::to_vec(config) {
        hasher.update(&bytes);
    }
    *hasher.finalize().as_bytes()
}

fn hash_record(hasher: &mut blake3::Hasher, record: &FileRecord) {
    hasher.update(record.rel_path.to_string_lossy().as_bytes());
    hasher.update(&[0]);
    let mtime = record
        .mtime
        .duration_since(SystemTime::UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos();
    hasher.update(&mtime.to_le_bytes());
    for child in &record.children {
        hash_record(hasher, child);
    }
}
