//! Error taxonomy for the compiler core.
//!
//! Build-level failures are deliberately narrow: a malformed config file is
//! reported but never aborts a build, and reference resolution downgrades
//! every failure to a warning. Only explicit lookups surface errors to the
//! caller.

use std::path::PathBuf;
use thiserror::Error;

/// Errors surfaced by the compiler core.
#[derive(Debug, Error)]
pub enum CompileError {
    /// A config file could not be parsed. Non-fatal at build level: the
    /// owning subtree falls back to an empty config.
    #[error("failed to parse config file {path}: {message}")]
    ConfigParse { path: PathBuf, message: String },

    /// Explicit component lookup with no fallback requested.
    #[error("component not found: {0}")]
    ComponentNotFound(String),

    /// Explicit variant lookup with no fallback requested.
    #[error("variant '{variant}' of component '{component}' not found")]
    VariantNotFound { component: String, variant: String },

    /// A config file extension the loader does not understand.
    #[error("unsupported config format: {0}")]
    UnsupportedFormat(String),

    /// Compiler settings could not be loaded.
    #[error("configuration error: {0}")]
    Config(String),

    /// Filesystem watcher failure.
    #[error("watch error: {0}")]
    Watch(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl CompileError {
    /// Build a `ConfigParse` error from any parser's error display.
    pub fn config_parse(path: impl Into<PathBuf>, err: impl std::fmt::Display) -> Self {
        CompileError::ConfigParse {
            path: path.into(),
            message: err.to_string(),
        }
    }
}
