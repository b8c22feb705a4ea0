//! Source directory watching.
//!
//! Wraps a `notify` watcher around the compiler's source root. Events are
//! debounced into small batches; the core's only reaction to any of them is
//! to mark the build cache dirty, so the next `parse()` rebuilds in full.

use crate::compiler::Compiler;
use crate::error::CompileError;
use notify::{RecursiveMode, Watcher};
use std::path::{Path, PathBuf};
use std::sync::mpsc;
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::{Duration, Instant};
use tracing::{debug, error, warn};

/// Filesystem change event, normalized from the notify backend.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ChangeEvent {
    Created(PathBuf),
    Modified(PathBuf),
    Removed(PathBuf),
}

/// Watcher configuration.
#[derive(Debug, Clone)]
pub struct WatchConfig {
    /// Debounce window in milliseconds.
    pub debounce_ms: u64,
    /// File/directory names (or `*.ext` patterns) to ignore.
    pub ignore_patterns: Vec<String>,
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            debounce_ms: 100,
            ignore_patterns: vec![
                ".git".to_string(),
                ".DS_Store".to_string(),
                "node_modules".to_string(),
                "*.swp".to_string(),
                "*.tmp".to_string(),
            ],
        }
    }
}

/// Watches the compiler's source root and marks its cache dirty on change.
pub struct SourceWatcher {
    // Held so the notify backend stays alive for the watcher's lifetime.
    _watcher: notify::RecommendedWatcher,
    handle: Option<JoinHandle<()>>,
}

impl SourceWatcher {
    /// Start watching. The watcher stops when dropped.
    pub fn start(compiler: Arc<Compiler>, config: WatchConfig) -> Result<Self, CompileError> {
        let (tx, rx) = mpsc::channel();
        let mut watcher = notify::recommended_watcher(move |res| {
            if let Err(err) = tx.send(res) {
                error!("failed to forward watch event: {}", err);
            }
        })
        .map_err(|e| CompileError::Watch(e.to_string()))?;

        let source = compiler.config().source.clone();
        watcher
            .watch(&source, RecursiveMode::Recursive)
            .map_err(|e| CompileError::Watch(e.to_string()))?;
        debug!("watching {} for changes", source.display());

        let handle = std::thread::spawn(move || {
            event_loop(rx, compiler, config);
        });

        Ok(Self {
            _watcher: watcher,
            handle: Some(handle),
        })
    }

    /// Stop watching and wait for the event loop to drain. Dropping the
    /// watcher without calling this also stops it; the loop exits on
    /// channel disconnect.
    pub fn stop(mut self) {
        drop(self._watcher);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

fn event_loop(
    rx: mpsc::Receiver<Result<notify::Event, notify::Error>>,
    compiler: Arc<Compiler>,
    config: WatchConfig,
) {
    let debounce = Duration::from_millis(config.debounce_ms);
    while let Ok(first) = rx.recv() {
        let mut batch = Vec::new();
        collect(first, &config.ignore_patterns, &mut batch);

        // Drain further events inside the debounce window into one batch.
        let deadline = Instant::now() + debounce;
        while let Some(remaining) = deadline.checked_duration_since(Instant::now()) {
            if remaining.is_zero() {
                break;
            }
            match rx.recv_timeout(remaining) {
                Ok(event) => collect(event, &config.ignore_patterns, &mut batch),
                Err(mpsc::RecvTimeoutError::Timeout) => break,
                Err(mpsc::RecvTimeoutError::Disconnected) => return,
            }
        }

        if !batch.is_empty() {
            debug!("{} change event(s), marking compiler dirty", batch.len());
            compiler.mark_dirty();
        }
    }
}

fn collect(
    event: Result<notify::Event, notify::Error>,
    ignore: &[String],
    batch: &mut Vec<ChangeEvent>,
) {
    let event = match event {
        Ok(event) => event,
        Err(err) => {
            warn!("watch event error: {}", err);
            return;
        }
    };
    for change in normalize(event) {
        let path = match &change {
            ChangeEvent::Created(p) | ChangeEvent::Modified(p) | ChangeEvent::Removed(p) => p,
        };
        if !is_ignored(path, ignore) {
            batch.push(change);
        }
    }
}

/// Flatten a notify event into per-path change events.
pub fn normalize(event: notify::Event) -> Vec<ChangeEvent> {
    use notify::EventKind;
    let wrap: fn(PathBuf) -> ChangeEvent = match event.kind {
        EventKind::Create(_) => ChangeEvent::Created,
        EventKind::Modify(_) => ChangeEvent::Modified,
        EventKind::Remove(_) => ChangeEvent::Removed,
        _ => return Vec::new(),
    };
    event.paths.into_iter().map(wrap).collect()
}

/// Simple name matching: a pattern is either an exact path component or a
/// `*.ext` extension pattern.
pub fn is_ignored(path: &Path, patterns: &[String]) -> bool {
    patterns.iter().any(|pattern| {
        if let Some(ext) = pattern.strip_prefix("*.") {
            return path.extension().and_then(|e| e.to_str()) == Some(ext);
        }
        path.components()
            .any(|c| c.as_os_str().to_str() == Some(pattern.as_str()))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use notify::event::{AccessKind, CreateKind, EventKind, ModifyKind};

    #[test]
    fn normalize_maps_event_kinds() {
        let event = notify::Event::new(EventKind::Create(CreateKind::File))
            .add_path(PathBuf::from("/src/button.hbs"));
        assert_eq!(
            normalize(event),
            vec![ChangeEvent::Created(PathBuf::from("/src/button.hbs"))]
        );

        let event = notify::Event::new(EventKind::Modify(ModifyKind::Any))
            .add_path(PathBuf::from("/src/a"))
            .add_path(PathBuf::from("/src/b"));
        assert_eq!(normalize(event).len(), 2);

        let event = notify::Event::new(EventKind::Access(AccessKind::Any));
        assert!(normalize(event).is_empty());
    }

    #[test]
    fn ignore_patterns_match_components_and_extensions() {
        let patterns = WatchConfig::default().ignore_patterns;
        assert!(is_ignored(Path::new("/src/.git/HEAD"), &patterns));
        assert!(is_ignored(Path::new("/src/button.hbs.swp"), &patterns));
        assert!(!is_ignored(Path::new("/src/button/button.hbs"), &patterns));
    }
}
