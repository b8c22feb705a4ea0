//! End-to-end compile tests over real directory trees.

use std::fs;
use std::path::Path;
use std::sync::Arc;

use componentry::config::CompilerConfig;
use componentry::fs::DiskReader;
use componentry::{Compiler, CompileError};
use tempfile::TempDir;

fn write_tree(root: &Path, files: &[(&str, &str)]) {
    for (rel, contents) in files {
        let path = root.join(rel);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, contents).unwrap();
    }
}

fn compiler_for(tmp: &TempDir) -> Compiler {
    let config = CompilerConfig {
        source: tmp.path().to_path_buf(),
        ..CompilerConfig::default()
    };
    let matchers = config.matchers();
    Compiler::new(config, Arc::new(DiskReader::new(matchers)))
}

#[tokio::test]
async fn component_directory_with_config_yields_one_labelled_component() {
    let tmp = TempDir::new().unwrap();
    write_tree(
        tmp.path(),
        &[
            ("button/button.hbs", "<button>{{ label }}</button>"),
            ("button/config.json", r#"{"label": "Button"}"#),
        ],
    );

    let graph = compiler_for(&tmp).parse().await.unwrap();
    let components = graph.components();
    assert_eq!(components.len(), 1);
    let button = components[0];
    assert_eq!(button.meta.handle, "button");
    assert_eq!(button.meta.label, "Button");
    assert_eq!(button.variants().len(), 1);
    assert_eq!(button.default_variant().meta.handle, "default");
}

#[tokio::test]
async fn variant_view_files_produce_named_variants() {
    let tmp = TempDir::new().unwrap();
    write_tree(
        tmp.path(),
        &[
            ("button/button.hbs", "<button/>"),
            ("button/button--large.hbs", "<button class=\"lg\"/>"),
        ],
    );

    let graph = compiler_for(&tmp).parse().await.unwrap();
    let button = graph.find_component("button").unwrap();
    let handles: Vec<&str> = button
        .variants()
        .iter()
        .map(|v| v.meta.handle.as_str())
        .collect();
    assert_eq!(handles, vec!["default", "large"]);
}

#[tokio::test]
async fn duplicate_component_handles_are_disambiguated() {
    let tmp = TempDir::new().unwrap();
    // A loose component file and a component directory with the same name
    // both produce a component called `foo`.
    write_tree(
        tmp.path(),
        &[("foo.hbs", "<p>loose</p>"), ("foo/foo.hbs", "<p>dir</p>")],
    );

    let graph = compiler_for(&tmp).parse().await.unwrap();
    let handles: Vec<&str> = graph
        .components()
        .iter()
        .map(|c| c.meta.handle.as_str())
        .collect();
    assert_eq!(handles, vec!["foo", "foo-2"]);
    assert!(graph.find("@foo").is_some());
    assert!(graph.find("@foo-2").is_some());
}

#[tokio::test]
async fn repeated_parses_are_deterministic_and_cached() {
    let tmp = TempDir::new().unwrap();
    write_tree(
        tmp.path(),
        &[
            ("02-badge/badge.hbs", "<span/>"),
            ("01-button/button.hbs", "<button/>"),
            ("forms/input/input.hbs", "<input/>"),
        ],
    );

    let compiler = compiler_for(&tmp);
    let first = compiler.parse().await.unwrap();
    let second = compiler.parse().await.unwrap();
    assert!(Arc::ptr_eq(&first, &second));

    // A forced rebuild of unchanged sources produces a deep-equal graph.
    compiler.mark_dirty();
    let third = compiler.parse().await.unwrap();
    assert!(!Arc::ptr_eq(&first, &third));
    assert_eq!(first.to_json(), third.to_json());
}

#[tokio::test]
async fn every_component_has_a_variant_and_total_default_lookup() {
    let tmp = TempDir::new().unwrap();
    write_tree(
        tmp.path(),
        &[
            ("button/button.hbs", "<button/>"),
            ("button/button--large.hbs", "<button class=\"lg\"/>"),
            ("badge.hbs", "<span/>"),
            (
                "card/card.config.yml",
                "type: component\nvariants:\n  - name: plain\n",
            ),
        ],
    );

    let graph = compiler_for(&tmp).parse().await.unwrap();
    assert_eq!(graph.components().len(), 3);
    for component in graph.components() {
        assert!(component.variants().len() >= 1);
        let fallback = component.get_variant_or_default("no-such-variant");
        assert_eq!(fallback.meta.handle, component.default_variant().meta.handle);
    }
}

#[tokio::test]
async fn non_reserved_config_keys_round_trip_through_json() {
    let tmp = TempDir::new().unwrap();
    write_tree(
        tmp.path(),
        &[
            ("button/button.hbs", "<button/>"),
            (
                "button/button.config.json",
                r#"{"label": "Button", "source": {"repo": "design-system"}, "deprecated": false}"#,
            ),
        ],
    );

    let graph = compiler_for(&tmp).parse().await.unwrap();
    let json = graph.find_component("button").unwrap().to_json();
    assert_eq!(json["label"], serde_json::json!("Button"));
    assert_eq!(json["source"]["repo"], serde_json::json!("design-system"));
    assert_eq!(json["deprecated"], serde_json::json!(false));
}

#[tokio::test]
async fn cascading_config_reaches_nested_components_on_disk() {
    let tmp = TempDir::new().unwrap();
    write_tree(
        tmp.path(),
        &[
            ("config.yml", "context:\n  brand: acme\nstatus: wip\n"),
            ("forms/input/input.hbs", "<input/>"),
            (
                "forms/input/input.config.json",
                r#"{"context": {"placeholder": "Name"}}"#,
            ),
        ],
    );

    let graph = compiler_for(&tmp).parse().await.unwrap();
    let input = graph.find_component("input").unwrap();
    let variant = input.default_variant();
    assert_eq!(variant.context["brand"], serde_json::json!("acme"));
    assert_eq!(variant.context["placeholder"], serde_json::json!("Name"));
    assert_eq!(variant.status, "wip");
}

#[tokio::test]
async fn strict_variant_lookup_surfaces_not_found() {
    let tmp = TempDir::new().unwrap();
    write_tree(tmp.path(), &[("button/button.hbs", "<button/>")]);

    let graph = compiler_for(&tmp).parse().await.unwrap();
    let button = graph.find_component("button").unwrap();
    let err = button.get_variant("huge").unwrap_err();
    assert!(matches!(err, CompileError::VariantNotFound { .. }));
}
