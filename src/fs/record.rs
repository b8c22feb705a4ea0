//! Normalized filesystem records.
//!
//! A [`FileRecord`] describes one filesystem entry with everything the tree
//! builder needs: ordering and visibility parsed from the name, a role
//! classifying what the file contributes, and the component scope it
//! belongs to. Records are created once per filesystem read and never
//! mutated afterwards; the builder owns them for a single build pass.

use serde::Serialize;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

/// What a file contributes to the entity graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum FileRole {
    /// A component view (`button.hbs`).
    View,
    /// A per-variant view (`button--large.hbs`).
    VariantView,
    /// A config file (`button.config.json`).
    Config,
    /// A readme (`README.md`).
    Readme,
    /// A supporting asset (styles, scripts, images).
    Asset,
    /// Anything else.
    Other,
}

/// Name components parsed from a directory or file entry name.
///
/// A leading underscore hides the entry; a numeric-dash prefix sets its
/// explicit sort order: `_01-button` parses to order 1, name `button`,
/// hidden.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryName {
    pub name: String,
    pub order: Option<u32>,
    pub hidden: bool,
}

/// Parse order/hidden markers out of a raw entry name.
pub fn parse_entry_name(raw: &str) -> EntryName {
    let hidden = raw.starts_with('_');
    let trimmed = raw.strip_prefix('_').unwrap_or(raw);
    let digits: String = trimmed.chars().take_while(|c| c.is_ascii_digit()).collect();
    if !digits.is_empty() {
        if let Some(rest) = trimmed[digits.len()..].strip_prefix('-') {
            if !rest.is_empty() {
                if let Ok(order) = digits.parse::<u32>() {
                    return EntryName {
                        name: rest.to_string(),
                        order: Some(order),
                        hidden,
                    };
                }
            }
        }
    }
    EntryName {
        name: trimmed.to_string(),
        order: None,
        hidden,
    }
}

const CONFIG_EXTS: [&str; 4] = ["json", "yaml", "yml", "toml"];

/// File name patterns derived from compiler settings.
#[derive(Debug, Clone)]
pub struct Matchers {
    /// View file extension, including the dot (`.hbs`).
    pub ext: String,
    /// Variant marker inside a file stem (`--`).
    pub splitter: String,
}

impl Matchers {
    pub fn new(ext: impl Into<String>, splitter: impl Into<String>) -> Self {
        Self {
            ext: ext.into(),
            splitter: splitter.into(),
        }
    }

    /// Classify a file name, returning its role and the component scope it
    /// belongs to (the stem before any variant marker or config suffix,
    /// order/hidden markers stripped).
    pub fn classify(&self, file_name: &str) -> (FileRole, Option<String>) {
        let lower = file_name.to_ascii_lowercase();
        if lower == "readme.md" || lower == "readme.markdown" {
            return (FileRole::Readme, None);
        }
        if let Some(scope) = self.config_scope(file_name) {
            return (FileRole::Config, Some(parse_entry_name(&scope).name));
        }
        // A bare `config.json` binds to its directory rather than a stem.
        if CONFIG_EXTS
            .iter()
            .any(|ext| lower == format!("config.{ext}"))
        {
            return (FileRole::Config, None);
        }
        if let Some(stem) = file_name.strip_suffix(&self.ext) {
            if !stem.is_empty() {
                return match stem.split_once(&self.splitter) {
                    Some((component, variant)) if !component.is_empty() && !variant.is_empty() => {
                        (FileRole::VariantView, Some(parse_entry_name(component).name))
                    }
                    _ => (FileRole::View, Some(parse_entry_name(stem).name)),
                };
            }
        }
        if Path::new(file_name).extension().is_some() {
            (FileRole::Asset, None)
        } else {
            (FileRole::Other, None)
        }
    }

    /// Match `<scope>.config.{json,yaml,yml,toml}`, returning the scope.
    fn config_scope(&self, file_name: &str) -> Option<String> {
        let stem = CONFIG_EXTS
            .iter()
            .find_map(|ext| file_name.strip_suffix(&format!(".config.{ext}")))?;
        if stem.is_empty() {
            None
        } else {
            Some(stem.to_string())
        }
    }
}

/// One normalized filesystem entry, annotated for the tree builder.
#[derive(Debug, Clone)]
pub struct FileRecord {
    /// Absolute path on disk.
    pub path: PathBuf,
    /// Path relative to the source root.
    pub rel_path: PathBuf,
    /// Last modification time, used for build-cache hashing.
    pub mtime: SystemTime,
    /// File contents; `None` for directories.
    pub contents: Option<Vec<u8>>,
    pub is_dir: bool,
    /// Direct children, empty for files.
    pub children: Vec<FileRecord>,
    /// Explicit sort order from the numeric-dash prefix; `None` sorts last.
    pub order: Option<u32>,
    /// True when any path segment starts with an underscore.
    pub hidden: bool,
    pub role: FileRole,
    /// Component stem this file belongs to, when the role implies one.
    pub scope: Option<String>,
}

impl FileRecord {
    /// Create a file record, classifying it against `matchers`.
    pub fn file(
        path: PathBuf,
        rel_path: PathBuf,
        mtime: SystemTime,
        contents: Vec<u8>,
        matchers: &Matchers,
    ) -> Self {
        let file_name = rel_path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or_default()
            .to_string();
        let (role, scope) = matchers.classify(&file_name);
        let parsed = parse_entry_name(stem_of(&file_name));
        Self {
            path,
            hidden: any_segment_hidden(&rel_path),
            rel_path,
            mtime,
            contents: Some(contents),
            is_dir: false,
            children: Vec::new(),
            order: parsed.order,
            role,
            scope,
        }
    }

    /// Create a directory record over already-built children.
    pub fn dir(
        path: PathBuf,
        rel_path: PathBuf,
        mtime: SystemTime,
        children: Vec<FileRecord>,
    ) -> Self {
        let name = rel_path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or_default();
        let parsed = parse_entry_name(name);
        Self {
            path,
            hidden: any_segment_hidden(&rel_path),
            rel_path,
            mtime,
            contents: None,
            is_dir: true,
            children,
            order: parsed.order,
            role: FileRole::Other,
            scope: None,
        }
    }

    /// Entry name with order/hidden markers stripped. For files this is the
    /// stem (no extension), for directories the directory name. The source
    /// root has an empty relative path, so it falls back to its on-disk
    /// directory name.
    pub fn entry_name(&self) -> String {
        let raw = self
            .rel_path
            .file_name()
            .or_else(|| self.path.file_name())
            .and_then(|n| n.to_str())
            .unwrap_or_default();
        let raw = if self.is_dir { raw } else { stem_of(raw) };
        parse_entry_name(raw).name
    }

    /// File stem including any variant marker, order prefix stripped.
    pub fn stem(&self) -> String {
        let raw = self
            .rel_path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or_default();
        stem_of(raw).to_string()
    }

    /// Contents decoded as UTF-8, lossily.
    pub fn text(&self) -> Option<String> {
        self.contents
            .as_ref()
            .map(|bytes| String::from_utf8_lossy(bytes).into_owned())
    }

    /// Sort key matching the sibling ordering rules: explicit order
    /// ascending with absent order last, then name.
    pub fn sort_key(&self) -> (u32, String) {
        (self.order.unwrap_or(u32::MAX), self.entry_name())
    }
}

/// Stem of a file name: everything before the first dot-suffix run that
/// looks like an extension (`button.config.json` keeps `button.config` out;
/// we only strip the final extension).
fn stem_of(file_name: &str) -> &str {
    match file_name.rsplit_once('.') {
        Some((stem, _)) if !stem.is_empty() => stem,
        _ => file_name,
    }
}

fn any_segment_hidden(rel_path: &Path) -> bool {
    rel_path.components().any(|c| {
        c.as_os_str()
            .to_str()
            .map(|s| s.starts_with('_'))
            .unwrap_or(false)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::UNIX_EPOCH;

    fn matchers() -> Matchers {
        Matchers::new(".hbs", "--")
    }

    #[test]
    fn entry_name_parsing() {
        assert_eq!(
            parse_entry_name("_01-button"),
            EntryName {
                name: "button".into(),
                order: Some(1),
                hidden: true
            }
        );
        assert_eq!(
            parse_entry_name("02-nav"),
            EntryName {
                name: "nav".into(),
                order: Some(2),
                hidden: false
            }
        );
        assert_eq!(
            parse_entry_name("button"),
            EntryName {
                name: "button".into(),
                order: None,
                hidden: false
            }
        );
        // A bare numeric name is a name, not an order prefix.
        assert_eq!(parse_entry_name("404").name, "404");
        assert_eq!(parse_entry_name("404").order, None);
    }

    #[test]
    fn classification_roles() {
        let m = matchers();
        assert_eq!(m.classify("button.hbs"), (FileRole::View, Some("button".into())));
        assert_eq!(
            m.classify("button--large.hbs"),
            (FileRole::VariantView, Some("button".into()))
        );
        assert_eq!(
            m.classify("button.config.json"),
            (FileRole::Config, Some("button".into()))
        );
        assert_eq!(m.classify("config.json"), (FileRole::Config, None));
        assert_eq!(m.classify("config.yml"), (FileRole::Config, None));
        assert_eq!(m.classify("README.md"), (FileRole::Readme, None));
        assert_eq!(m.classify("readme.markdown"), (FileRole::Readme, None));
        assert_eq!(m.classify("styles.css"), (FileRole::Asset, None));
        assert_eq!(m.classify("LICENSE"), (FileRole::Other, None));
    }

    #[test]
    fn hidden_propagates_from_any_segment() {
        let m = matchers();
        let record = FileRecord::file(
            "/src/_private/button.hbs".into(),
            "_private/button.hbs".into(),
            UNIX_EPOCH,
            b"<button/>".to_vec(),
            &m,
        );
        assert!(record.hidden);
        assert_eq!(record.entry_name(), "button");
    }

    #[test]
    fn order_parsed_from_file_stem() {
        let m = matchers();
        let record = FileRecord::file(
            "/src/01-button.hbs".into(),
            "01-button.hbs".into(),
            UNIX_EPOCH,
            Vec::new(),
            &m,
        );
        assert_eq!(record.order, Some(1));
        assert_eq!(record.entry_name(), "button");
    }
}
