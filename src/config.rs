//! Compiler settings.
//!
//! Loaded with precedence: built-in defaults, then `componentry.toml` in the
//! workspace root, then `CMPY_*` environment variables. These settings shape
//! file classification (view extension, variant splitter) and the status
//! vocabulary; per-directory config files are a separate concern handled by
//! the `data` module during builds.

use crate::error::CompileError;
use crate::fs::Matchers;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// One named status in the registry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusInfo {
    pub label: String,
    pub color: String,
}

/// Status vocabulary for variants, plus the default applied when neither
/// config nor cascade names one.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StatusRegistry {
    pub default: String,
    pub options: BTreeMap<String, StatusInfo>,
}

impl Default for StatusRegistry {
    fn default() -> Self {
        let mut options = BTreeMap::new();
        options.insert(
            "prototype".to_string(),
            StatusInfo {
                label: "Prototype".into(),
                color: "red".into(),
            },
        );
        options.insert(
            "wip".to_string(),
            StatusInfo {
                label: "WIP".into(),
                color: "yellow".into(),
            },
        );
        options.insert(
            "ready".to_string(),
            StatusInfo {
                label: "Ready".into(),
                color: "green".into(),
            },
        );
        Self {
            default: "ready".to_string(),
            options,
        }
    }
}

impl StatusRegistry {
    /// Validate a status handle, falling back to the default for unknown
    /// handles (with a warning, matching the lenient build policy).
    pub fn normalize(&self, handle: Option<&str>) -> String {
        match handle {
            Some(h) if self.options.contains_key(h) => h.to_string(),
            Some(h) => {
                tracing::warn!("status '{}' is not a known option, using '{}'", h, self.default);
                self.default.clone()
            }
            None => self.default.clone(),
        }
    }

    pub fn info(&self, handle: &str) -> Option<&StatusInfo> {
        self.options.get(handle)
    }

    /// Aggregate display info for a component's variant statuses: the
    /// single status's entry, or a `mixed` marker when variants disagree.
    pub fn summary(&self, statuses: &[&str]) -> StatusInfo {
        match statuses {
            [only] => self.info(only).cloned().unwrap_or_else(|| StatusInfo {
                label: crate::naming::titlize(only),
                color: "white".to_string(),
            }),
            _ => StatusInfo {
                label: "Mixed".to_string(),
                color: "cyan".to_string(),
            },
        }
    }
}

/// Top-level compiler settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CompilerConfig {
    /// Source root containing the component library.
    pub source: PathBuf,
    /// Display name for the root collection.
    pub name: String,
    /// View file extension, including the dot.
    pub ext: String,
    /// Variant marker inside file stems.
    pub splitter: String,
    /// Default variant handle used when a component declares none.
    pub default_variant: String,
    pub statuses: StatusRegistry,
}

impl Default for CompilerConfig {
    fn default() -> Self {
        Self {
            source: PathBuf::from("components"),
            name: "components".to_string(),
            ext: ".hbs".to_string(),
            splitter: "--".to_string(),
            default_variant: "default".to_string(),
            statuses: StatusRegistry::default(),
        }
    }
}

impl CompilerConfig {
    /// Load settings for a workspace root.
    pub fn load(workspace_root: &Path) -> Result<Self, CompileError> {
        Self::load_from(workspace_root.join("componentry.toml"))
    }

    /// Load settings from a specific file path (which may not exist).
    pub fn load_from(file: PathBuf) -> Result<Self, CompileError> {
        let settings = config::Config::builder()
            .add_source(config::File::from(file).required(false))
            .add_source(config::Environment::with_prefix("CMPY").separator("__"))
            .build()
            .map_err(|e| CompileError::Config(e.to_string()))?;
        settings
            .try_deserialize()
            .map_err(|e| CompileError::Config(e.to_string()))
    }

    /// File name matchers derived from these settings.
    pub fn matchers(&self) -> Matchers {
        Matchers::new(self.ext.clone(), self.splitter.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn defaults_are_complete() {
        let config = CompilerConfig::default();
        assert_eq!(config.ext, ".hbs");
        assert_eq!(config.splitter, "--");
        assert_eq!(config.statuses.default, "ready");
        assert!(config.statuses.info("wip").is_some());
    }

    #[test]
    fn file_overrides_defaults() {
        let tmp = TempDir::new().unwrap();
        fs::write(
            tmp.path().join("componentry.toml"),
            "ext = \".njk\"\nname = \"patterns\"\n",
        )
        .unwrap();
        let config = CompilerConfig::load(tmp.path()).unwrap();
        assert_eq!(config.ext, ".njk");
        assert_eq!(config.name, "patterns");
        // Untouched keys keep their defaults.
        assert_eq!(config.splitter, "--");
    }

    #[test]
    fn missing_file_yields_defaults() {
        let tmp = TempDir::new().unwrap();
        let config = CompilerConfig::load(tmp.path()).unwrap();
        assert_eq!(config.ext, ".hbs");
    }

    #[test]
    fn unknown_status_normalizes_to_default() {
        let statuses = StatusRegistry::default();
        assert_eq!(statuses.normalize(Some("wip")), "wip");
        assert_eq!(statuses.normalize(Some("bogus")), "ready");
        assert_eq!(statuses.normalize(None), "ready");
    }

    #[test]
    fn status_summary_flags_disagreement_as_mixed() {
        let statuses = StatusRegistry::default();
        assert_eq!(statuses.summary(&["wip"]).label, "WIP");
        assert_eq!(statuses.summary(&["ready", "wip"]).label, "Mixed");
    }
}
