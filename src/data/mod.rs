//! Config file loading.
//!
//! Parses per-directory and per-component config files into plain JSON
//! mappings. The format is inferred from the file extension; TOML stands in
//! for executable config modules. Parsing never panics on malformed input,
//! it reports a [`CompileError::ConfigParse`] the builder downgrades to a
//! warning.

pub mod merge;

use crate::error::CompileError;
use serde_json::{Map, Value};
use std::path::Path;

/// Supported config file formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    Json,
    Yaml,
    Toml,
}

impl ConfigFormat {
    /// Infer the format from a file extension.
    pub fn from_path(path: &Path) -> Option<Self> {
        match path.extension()?.to_str()? {
            "json" => Some(ConfigFormat::Json),
            "yaml" | "yml" => Some(ConfigFormat::Yaml),
            "toml" => Some(ConfigFormat::Toml),
            _ => None,
        }
    }
}

/// Parse raw config bytes into a mapping.
///
/// The top level must be a mapping; scalars and sequences are rejected with
/// the same `ConfigParse` error as malformed syntax.
pub fn parse(bytes: &[u8], format: ConfigFormat, path: &Path) -> Result<Map<String, Value>, CompileError> {
    let value: Value = match format {
        ConfigFormat::Json => {
            serde_json::from_slice(bytes).map_err(|e| CompileError::config_parse(path, e))?
        }
        ConfigFormat::Yaml => {
            serde_yaml::from_slice(bytes).map_err(|e| CompileError::config_parse(path, e))?
        }
        ConfigFormat::Toml => {
            let text = std::str::from_utf8(bytes)
                .map_err(|e| CompileError::config_parse(path, e))?;
            toml::from_str(text).map_err(|e| CompileError::config_parse(path, e))?
        }
    };
    match value {
        Value::Object(map) => Ok(map),
        Value::Null => Ok(Map::new()),
        other => Err(CompileError::config_parse(
            path,
            format!("expected a mapping at the top level, got {}", kind_of(&other)),
        )),
    }
}

/// Parse a config file by inferring its format from the path.
pub fn parse_file(bytes: &[u8], path: &Path) -> Result<Map<String, Value>, CompileError> {
    let format = ConfigFormat::from_path(path).ok_or_else(|| {
        CompileError::UnsupportedFormat(path.display().to_string())
    })?;
    parse(bytes, format, path)
}

/// Extract an inline frontmatter block (`---` fenced YAML) from view file
/// contents. Returns `None` when the file carries no frontmatter; a
/// malformed block is a parse error, consistent with config files.
pub fn parse_frontmatter(contents: &[u8], path: &Path) -> Result<Option<Map<String, Value>>, CompileError> {
    let text = match std::str::from_utf8(contents) {
        Ok(t) => t,
        Err(_) => return Ok(None),
    };
    let Some(rest) = text.strip_prefix("---") else {
        return Ok(None);
    };
    let Some(rest) = rest.strip_prefix('\n').or_else(|| rest.strip_prefix("\r\n")) else {
        return Ok(None);
    };
    let Some(end) = rest.find("\n---") else {
        return Ok(None);
    };
    let block = &rest[..end];
    let value: Value =
        serde_yaml::from_str(block).map_err(|e| CompileError::config_parse(path, e))?;
    match value {
        Value::Object(map) => Ok(Some(map)),
        Value::Null => Ok(None),
        other => Err(CompileError::config_parse(
            path,
            format!("expected a mapping in frontmatter, got {}", kind_of(&other)),
        )),
    }
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a sequence",
        Value::Object(_) => "a mapping",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::path::PathBuf;

    fn path(name: &str) -> PathBuf {
        PathBuf::from(name)
    }

    #[test]
    fn parses_json_yaml_and_toml() {
        let json_map = parse_file(br#"{"label": "Button"}"#, &path("button.config.json")).unwrap();
        assert_eq!(json_map["label"], json!("Button"));

        let yaml_map = parse_file(b"label: Button\norder: 3\n", &path("button.config.yaml")).unwrap();
        assert_eq!(yaml_map["order"], json!(3));

        let toml_map = parse_file(b"label = \"Button\"\n", &path("button.config.toml")).unwrap();
        assert_eq!(toml_map["label"], json!("Button"));
    }

    #[test]
    fn malformed_config_is_a_parse_error() {
        let err = parse_file(b"{not json", &path("bad.config.json")).unwrap_err();
        assert!(matches!(err, CompileError::ConfigParse { .. }));
    }

    #[test]
    fn non_mapping_top_level_is_rejected() {
        let err = parse_file(b"[1, 2]", &path("list.config.json")).unwrap_err();
        assert!(matches!(err, CompileError::ConfigParse { .. }));
    }

    #[test]
    fn unknown_extension_is_unsupported() {
        let err = parse_file(b"x", &path("weird.config.ini")).unwrap_err();
        assert!(matches!(err, CompileError::UnsupportedFormat(_)));
    }

    #[test]
    fn frontmatter_extraction() {
        let view = b"---\nlabel: Inline\ncontext:\n  size: sm\n---\n<button>{{ label }}</button>\n";
        let map = parse_frontmatter(view, &path("button.hbs")).unwrap().unwrap();
        assert_eq!(map["label"], json!("Inline"));
        assert_eq!(map["context"]["size"], json!("sm"));

        assert!(parse_frontmatter(b"<button></button>", &path("plain.hbs"))
            .unwrap()
            .is_none());
    }
}
