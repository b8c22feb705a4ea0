//! Filesystem reading collaborator.
//!
//! The compiler core never performs raw I/O; it consumes a [`FileRecord`]
//! tree from a [`SourceReader`]. [`DiskReader`] is the stock implementation,
//! walking the source directory one level at a time with deterministic
//! (name-sorted) child order so that repeated listings of an unchanged tree
//! are identical.

use super::record::{FileRecord, Matchers};
use crate::error::CompileError;
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use tracing::debug;
use walkdir::WalkDir;

/// Produces the record tree the builder consumes.
pub trait SourceReader: Send + Sync {
    /// Recursively list `root`, returning its directory record with stat
    /// and content for every file underneath.
    fn list_tree(&self, root: &Path) -> Result<FileRecord, CompileError>;
}

/// Disk-backed reader.
pub struct DiskReader {
    matchers: Matchers,
}

impl DiskReader {
    pub fn new(matchers: Matchers) -> Self {
        Self { matchers }
    }

    fn read_dir(&self, dir: &Path, root: &Path) -> Result<FileRecord, CompileError> {
        let mut children = Vec::new();
        for entry in WalkDir::new(dir)
            .min_depth(1)
            .max_depth(1)
            .sort_by_file_name()
        {
            let entry = match entry {
                Ok(entry) => entry,
                Err(err) => {
                    // Unreadable entries are excluded, not fatal.
                    debug!("skipping unreadable entry under {}: {}", dir.display(), err);
                    continue;
                }
            };
            let path = entry.path().to_path_buf();
            if entry.file_type().is_dir() {
                children.push(self.read_dir(&path, root)?);
            } else if entry.file_type().is_file() {
                let contents = match std::fs::read(&path) {
                    Ok(bytes) => bytes,
                    Err(err) => {
                        debug!("skipping unreadable file {}: {}", path.display(), err);
                        continue;
                    }
                };
                let mtime = modified(&path);
                children.push(FileRecord::file(
                    path.clone(),
                    rel_to(&path, root),
                    mtime,
                    contents,
                    &self.matchers,
                ));
            }
        }
        Ok(FileRecord::dir(
            dir.to_path_buf(),
            rel_to(dir, root),
            modified(dir),
            children,
        ))
    }
}

impl SourceReader for DiskReader {
    fn list_tree(&self, root: &Path) -> Result<FileRecord, CompileError> {
        let root = dunce::canonicalize(root)?;
        self.read_dir(&root, &root)
    }
}

fn rel_to(path: &Path, root: &Path) -> PathBuf {
    path.strip_prefix(root).unwrap_or(path).to_path_buf()
}

fn modified(path: &Path) -> SystemTime {
    std::fs::metadata(path)
        .and_then(|m| m.modified())
        .unwrap_or(SystemTime::UNIX_EPOCH)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::record::FileRole;
    use std::fs;
    use tempfile::TempDir;

    fn reader() -> DiskReader {
        DiskReader::new(Matchers::new(".hbs", "--"))
    }

    #[test]
    fn lists_and_classifies_a_tree() {
        let tmp = TempDir::new().unwrap();
        let button = tmp.path().join("button");
        fs::create_dir(&button).unwrap();
        fs::write(button.join("button.hbs"), "<button/>").unwrap();
        fs::write(button.join("button--large.hbs"), "<button class=\"lg\"/>").unwrap();
        fs::write(button.join("button.config.json"), "{}").unwrap();
        fs::write(button.join("README.md"), "# Button").unwrap();

        let tree = reader().list_tree(tmp.path()).unwrap();
        assert!(tree.is_dir);
        assert_eq!(tree.children.len(), 1);
        let dir = &tree.children[0];
        assert_eq!(dir.entry_name(), "button");
        let roles: Vec<FileRole> = dir.children.iter().map(|c| c.role).collect();
        assert_eq!(
            roles,
            vec![
                FileRole::Readme,
                FileRole::VariantView,
                FileRole::Config,
                FileRole::View
            ]
        );
    }

    #[test]
    fn listing_is_deterministic() {
        let tmp = TempDir::new().unwrap();
        for name in ["b.hbs", "a.hbs", "c.hbs"] {
            fs::write(tmp.path().join(name), "x").unwrap();
        }
        let first = reader().list_tree(tmp.path()).unwrap();
        let second = reader().list_tree(tmp.path()).unwrap();
        let names = |t: &FileRecord| {
            t.children
                .iter()
                .map(|c| c.entry_name())
                .collect::<Vec<_>>()
        };
        assert_eq!(names(&first), names(&second));
        assert_eq!(names(&first), vec!["a", "b", "c"]);
    }
}
