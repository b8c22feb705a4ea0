//! Context resolution.
//!
//! Template contexts may reference other entities' contexts with strings of
//! the form `@handle[:variant][.dotted.path]`. Resolution recurses through
//! mappings and sequences preserving shape, substitutes each reference with
//! the target variant's fully-resolved context (or a dotted projection of
//! it), and memoizes whole-context resolutions by a content hash of the raw
//! input. Structurally identical concurrent resolutions share one in-flight
//! computation, so for cycle-free contexts repeated work and duplicate
//! warnings are bounded to once per distinct raw context for the life of
//! the resolver.
//!
//! Resolution is deliberately forgiving: unresolvable handles and missing
//! dotted paths become `null` with a warning, never an error. A reference
//! chain that re-enters a context already being resolved on that same chain
//! is cut to `null`, so graphs with cyclic references still terminate. The
//! cut is decided per awaiting chain: only completed, cut-free results are
//! memoized, and a chain about to await an in-flight computation that
//! transitively waits on that same chain cuts instead of awaiting, so two
//! tasks entering a cycle from opposite ends both terminate.
//!
//! A resolver is built against one immutable graph and discarded with it;
//! rebuilding the graph replaces the resolver and thereby clears the cache.

use crate::entities::{Collection, Variant};
use futures::future::{BoxFuture, FutureExt, Shared};
use parking_lot::Mutex;
use serde_json::{Map, Value};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tracing::warn;

type CacheKey = [u8; 32];
/// A resolved value plus whether it is clean (no cycle cut anywhere
/// inside). Only clean results are safe to memoize; a cut depends on the
/// chain that hit it.
type Outcome = (Arc<Value>, bool);
type SharedResolution = Shared<BoxFuture<'static, Outcome>>;

/// Raw per-component context index: default variant handle plus each
/// variant's unresolved context, cloned out of the graph so resolution
/// futures own their inputs.
struct ComponentContexts {
    default_handle: String,
    variants: HashMap<String, Map<String, Value>>,
}

/// In-flight computations and the direct await edges between them. One
/// lock guards both so the deadlock check and the edge insertion that
/// follows it are a single step.
#[derive(Default)]
struct Flight {
    inflight: HashMap<CacheKey, SharedResolution>,
    waits: HashMap<CacheKey, Vec<CacheKey>>,
}

struct Inner {
    index: HashMap<String, ComponentContexts>,
    done: Mutex<HashMap<CacheKey, Arc<Value>>>,
    flight: Mutex<Flight>,
    warnings: Mutex<Vec<String>>,
}

/// Resolves raw contexts against one entity graph.
#[derive(Clone)]
pub struct ContextResolver {
    inner: Arc<Inner>,
}

impl ContextResolver {
    /// Build a resolver (and its handle index) for a graph.
    pub fn new(graph: &Collection) -> Self {
        let mut index = HashMap::new();
        for component in graph.components() {
            let mut variants = HashMap::new();
            for variant in component.variants() {
                variants.insert(variant.meta.handle.clone(), variant.context.clone());
            }
            index.insert(
                component.meta.handle.clone(),
                ComponentContexts {
                    default_handle: component.default_variant().meta.handle.clone(),
                    variants,
                },
            );
        }
        Self {
            inner: Arc::new(Inner {
                index,
                done: Mutex::new(HashMap::new()),
                flight: Mutex::new(Flight::default()),
                warnings: Mutex::new(Vec::new()),
            }),
        }
    }

    /// Resolve an arbitrary raw context value.
    pub async fn resolve(&self, raw: &Value) -> Arc<Value> {
        let (value, _clean) =
            resolve_cached(self.inner.clone(), raw.clone(), Arc::new(Vec::new())).await;
        value
    }

    /// Resolve a variant's context mapping in full.
    pub async fn resolve_variant(&self, variant: &Variant) -> Map<String, Value> {
        let raw = Value::Object(variant.context.clone());
        match self.resolve(&raw).await.as_ref() {
            Value::Object(map) => map.clone(),
            _ => Map::new(),
        }
    }

    /// Warnings accumulated so far (one per distinct failing raw context).
    pub fn warnings(&self) -> Vec<String> {
        self.inner.warnings.lock().clone()
    }

    /// Drop all memoized resolutions and warnings.
    pub fn clear(&self) {
        self.inner.done.lock().clear();
        {
            let mut flight = self.inner.flight.lock();
            flight.inflight.clear();
            flight.waits.clear();
        }
        self.inner.warnings.lock().clear();
    }
}

fn hash_value(value: &Value) -> CacheKey {
    let bytes = serde_json::to_vec(value).unwrap_or_default();
    *blake3::hash(&bytes).as_bytes()
}

fn push_warning(inner: &Inner, message: String) {
    warn!("{message}");
    inner.warnings.lock().push(message);
}

/// True when the computation for `from` is transitively waiting on any key
/// in `chain`. Awaiting it from that chain would deadlock: those keys are
/// exactly the chain's own in-progress computations, which cannot finish
/// until the caller does.
fn awaits_any(waits: &HashMap<CacheKey, Vec<CacheKey>>, from: CacheKey, chain: &[CacheKey]) -> bool {
    let mut stack = vec![from];
    let mut seen = HashSet::new();
    while let Some(key) = stack.pop() {
        if chain.contains(&key) {
            return true;
        }
        if !seen.insert(key) {
            continue;
        }
        if let Some(next) = waits.get(&key) {
            stack.extend(next.iter().copied());
        }
    }
    false
}

/// Memoized whole-context resolution. The chain holds the keys of contexts
/// currently being resolved on this call path; re-entering one directly, or
/// awaiting an in-flight computation that is itself waiting on this chain,
/// is cut to `null` instead. In-flight computations coalesce concurrent
/// identical resolutions; only completed clean results enter the memo.
fn resolve_cached(
    inner: Arc<Inner>,
    raw: Value,
    chain: Arc<Vec<CacheKey>>,
) -> BoxFuture<'static, Outcome> {
    async move {
        let key = hash_value(&raw);
        if chain.contains(&key) {
            push_warning(&inner, "context reference cycle detected, resolving to null".into());
            return (Arc::new(Value::Null), false);
        }
        if let Some(value) = inner.done.lock().get(&key) {
            return (value.clone(), true);
        }
        let parent = chain.last().copied();
        let shared = {
            let mut flight = inner.flight.lock();
            match flight.inflight.get(&key).cloned() {
                Some(existing) => {
                    if awaits_any(&flight.waits, key, &chain) {
                        drop(flight);
                        push_warning(
                            &inner,
                            "context reference cycle detected, resolving to null".into(),
                        );
                        return (Arc::new(Value::Null), false);
                    }
                    if let Some(parent) = parent {
                        flight.waits.entry(parent).or_default().push(key);
                    }
                    existing
                }
                None => {
                    let mut next_chain = chain.as_ref().clone();
                    next_chain.push(key);
                    let computation = spawn_resolution(inner.clone(), key, raw, Arc::new(next_chain));
                    flight.inflight.insert(key, computation.clone());
                    if let Some(parent) = parent {
                        flight.waits.entry(parent).or_default().push(key);
                    }
                    computation
                }
            }
        };
        let outcome = shared.await;
        if let Some(parent) = parent {
            let mut flight = inner.flight.lock();
            if let Some(edges) = flight.waits.get_mut(&parent) {
                if let Some(pos) = edges.iter().position(|k| *k == key) {
                    edges.swap_remove(pos);
                }
                if edges.is_empty() {
                    flight.waits.remove(&parent);
                }
            }
        }
        outcome
    }
    .boxed()
}

/// One shared computation for a raw context: resolve it, retire the
/// in-flight entry, and publish the result to the memo only when no cycle
/// cut happened anywhere inside it.
fn spawn_resolution(
    inner: Arc<Inner>,
    key: CacheKey,
    raw: Value,
    chain: Arc<Vec<CacheKey>>,
) -> SharedResolution {
    async move {
        let (value, clean) = resolve_fragment(inner.clone(), raw, chain).await;
        let value = Arc::new(value);
        {
            let mut flight = inner.flight.lock();
            flight.inflight.remove(&key);
            flight.waits.remove(&key);
        }
        if clean {
            inner.done.lock().insert(key, value.clone());
        }
        (value, clean)
    }
    .boxed()
    .shared()
}

/// Structural recursion: mappings and sequences keep their shape, reference
/// strings are substituted, everything else passes through. A fragment is
/// clean only when every piece of it resolved without a cycle cut.
fn resolve_fragment(
    inner: Arc<Inner>,
    value: Value,
    chain: Arc<Vec<CacheKey>>,
) -> BoxFuture<'static, (Value, bool)> {
    async move {
        match value {
            Value::Object(map) => {
                let (keys, values): (Vec<String>, Vec<Value>) = map.into_iter().unzip();
                let resolved = futures::future::join_all(
                    values
                        .into_iter()
                        .map(|v| resolve_fragment(inner.clone(), v, chain.clone())),
                )
                .await;
                let clean = resolved.iter().all(|(_, c)| *c);
                let map = keys
                    .into_iter()
                    .zip(resolved.into_iter().map(|(v, _)| v))
                    .collect();
                (Value::Object(map), clean)
            }
            Value::Array(items) => {
                let resolved = futures::future::join_all(
                    items
                        .into_iter()
                        .map(|v| resolve_fragment(inner.clone(), v, chain.clone())),
                )
                .await;
                let clean = resolved.iter().all(|(_, c)| *c);
                let items = resolved.into_iter().map(|(v, _)| v).collect();
                (Value::Array(items), clean)
            }
            Value::String(text) if text.starts_with('@') => {
                resolve_reference(&inner, &text, &chain).await
            }
            other => (other, true),
        }
    }
    .boxed()
}

/// Substitute one `@handle[:variant][.dotted.path]` reference.
async fn resolve_reference(
    inner: &Arc<Inner>,
    reference: &str,
    chain: &Arc<Vec<CacheKey>>,
) -> (Value, bool) {
    let body = &reference[1..];
    let (target, dotted) = match body.split_once('.') {
        Some((target, path)) => (target, Some(path)),
        None => (body, None),
    };
    let (component, variant) = match target.split_once(':') {
        Some((component, variant)) => (component, Some(variant)),
        None => (target, None),
    };

    let Some(entry) = inner.index.get(component) else {
        push_warning(inner, format!("could not resolve context reference {reference}"));
        return (Value::Null, true);
    };
    let variant_handle = variant.unwrap_or(&entry.default_handle);
    let Some(raw_context) = entry.variants.get(variant_handle) else {
        push_warning(inner, format!("could not resolve context reference {reference}"));
        return (Value::Null, true);
    };

    let (resolved, clean) = resolve_cached(
        inner.clone(),
        Value::Object(raw_context.clone()),
        chain.clone(),
    )
    .await;

    // Both spellings address the same value: `@button.size` projects into
    // the resolved context directly, `@button.context.size` goes through
    // the variant's context field first.
    let dotted = match dotted {
        Some("context") => None,
        Some(path) => Some(path.strip_prefix("context.").unwrap_or(path)),
        None => None,
    };

    let value = match dotted {
        None => resolved.as_ref().clone(),
        Some(path) => match crate::data::merge::dotted_get(&resolved, path) {
            Some(value) => value.clone(),
            None => {
                push_warning(
                    inner,
                    format!("path '{path}' not found while resolving {reference}"),
                );
                Value::Null
            }
        },
    };
    (value, clean)
}
