//! Watcher-driven rebuild flow.

use std::fs;
use std::sync::Arc;
use std::time::Duration;

use componentry::config::CompilerConfig;
use componentry::fs::DiskReader;
use componentry::watch::{SourceWatcher, WatchConfig};
use componentry::Compiler;
use tempfile::TempDir;

#[tokio::test]
async fn filesystem_change_marks_dirty_and_forces_a_rebuild() {
    let tmp = TempDir::new().unwrap();
    let button = tmp.path().join("button");
    fs::create_dir_all(&button).unwrap();
    fs::write(button.join("button.hbs"), "<button/>").unwrap();

    let config = CompilerConfig {
        source: tmp.path().to_path_buf(),
        ..CompilerConfig::default()
    };
    let matchers = config.matchers();
    let compiler = Arc::new(Compiler::new(config, Arc::new(DiskReader::new(matchers))));
    let first = compiler.parse().await.unwrap();

    let watcher = SourceWatcher::start(
        Arc::clone(&compiler),
        WatchConfig {
            debounce_ms: 25,
            ..WatchConfig::default()
        },
    )
    .unwrap();

    fs::write(button.join("button--large.hbs"), "<button class=\"lg\"/>").unwrap();

    let mut dirty = false;
    for _ in 0..200 {
        if compiler.is_dirty() {
            dirty = true;
            break;
        }
        tokio::time::sleep(Duration::from_millis(25)).await;
    }
    assert!(dirty, "watcher never marked the build cache dirty");

    let second = compiler.parse().await.unwrap();
    assert!(!Arc::ptr_eq(&first, &second));
    let button = second.find_component("button").unwrap();
    assert!(button.variants().get("large").is_some());

    watcher.stop();
}
