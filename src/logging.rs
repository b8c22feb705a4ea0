//! Logging System
//!
//! Structured logging built on the `tracing` crate: configurable level,
//! text or JSON output, and an optional log file under the platform state
//! directory. Build warnings (bad configs, unresolvable references) flow
//! through this channel without interrupting `parse()` or resolution.

use crate::error::CompileError;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing_subscriber::fmt::time::ChronoUtc;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Registry};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level: trace, debug, info, warn, error, off
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Output format: json, text (default: text)
    #[serde(default = "default_format")]
    pub format: String,

    /// Log file path; None logs to stderr only.
    #[serde(default)]
    pub file: Option<PathBuf>,

    /// Enable colored output (text format only)
    #[serde(default = "default_true")]
    pub color: bool,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_format() -> String {
    "text".to_string()
}

fn default_true() -> bool {
    true
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_format(),
            file: None,
            color: default_true(),
        }
    }
}

/// Resolve the log file path with precedence: explicit config, the
/// `CMPY_LOG_FILE` env var, then the platform state directory default.
pub fn resolve_log_file_path(config_file: Option<PathBuf>) -> Result<PathBuf, CompileError> {
    if let Some(p) = config_file {
        if !p.as_os_str().is_empty() {
            return Ok(p);
        }
    }
    if let Ok(env_path) = std::env::var("CMPY_LOG_FILE") {
        if !env_path.is_empty() {
            return Ok(PathBuf::from(env_path));
        }
    }
    let project_dirs = directories::ProjectDirs::from("", "componentry", "componentry")
        .ok_or_else(|| {
            CompileError::Config("could not determine platform state directory".to_string())
        })?;
    let state_dir = project_dirs
        .state_dir()
        .unwrap_or_else(|| project_dirs.data_dir());
    Ok(state_dir.join("componentry.log"))
}

/// Initialize the logging system. The `CMPY_LOG` env var overrides the
/// configured level filter.
pub fn init_logging(config: &LoggingConfig) -> Result<(), CompileError> {
    let filter = match std::env::var("CMPY_LOG") {
        Ok(directives) if !directives.is_empty() => EnvFilter::new(directives),
        _ => EnvFilter::new(&config.level),
    };

    let base = Registry::default().with(filter);

    match (&config.file, config.format.as_str()) {
        (Some(file), format) => {
            let path = resolve_log_file_path(Some(file.clone()))?;
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            let writer = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(&path)?;
            if format == "json" {
                base.with(
                    fmt::layer()
                        .json()
                        .with_target(true)
                        .with_timer(ChronoUtc::rfc_3339())
                        .with_writer(writer),
                )
                .init();
            } else {
                base.with(
                    fmt::layer()
                        .with_ansi(false)
                        .with_timer(ChronoUtc::rfc_3339())
                        .with_writer(writer),
                )
                .init();
            }
        }
        (None, "json") => {
            base.with(
                fmt::layer()
                    .json()
                    .with_target(true)
                    .with_timer(ChronoUtc::rfc_3339())
                    .with_writer(std::io::stderr),
            )
            .init();
        }
        (None, _) => {
            base.with(
                fmt::layer()
                    .with_ansi(config.color)
                    .with_timer(ChronoUtc::rfc_3339())
                    .with_writer(std::io::stderr),
            )
            .init();
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = LoggingConfig::default();
        assert_eq!(config.level, "info");
        assert_eq!(config.format, "text");
        assert!(config.color);
        assert!(config.file.is_none());
    }

    #[test]
    fn explicit_file_path_wins() {
        let path = resolve_log_file_path(Some(PathBuf::from("/tmp/cmpy.log"))).unwrap();
        assert_eq!(path, PathBuf::from("/tmp/cmpy.log"));
    }
}
