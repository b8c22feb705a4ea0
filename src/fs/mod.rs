//! Filesystem boundary: normalized records and the reader collaborator.

pub mod reader;
pub mod record;

pub use reader::{DiskReader, SourceReader};
pub use record::{parse_entry_name, EntryName, FileRecord, FileRole, Matchers};
