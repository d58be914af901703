//! Directory entry types.

use chrono::{DateTime, Utc};
use compact_str::CompactString;
use serde::{Deserialize, Serialize};

/// Kind of a directory entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    /// Regular file.
    File,
    /// Folder (directory).
    Folder,
}

impl EntryKind {
    /// Check if this is a folder.
    pub fn is_folder(&self) -> bool {
        matches!(self, Self::Folder)
    }

    /// Check if this is a regular file.
    pub fn is_file(&self) -> bool {
        matches!(self, Self::File)
    }
}

/// Metadata reported by the file store for an entry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntryMetadata {
    /// Last modification time, if the store reports one.
    #[serde(default)]
    pub modified: Option<DateTime<Utc>>,
    /// Mimetype as reported by the store.
    #[serde(default)]
    pub mimetype: Option<CompactString>,
}

/// A single entry in a directory listing.
///
/// Names are unique within one directory; the cache relies on this.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirectoryEntry {
    /// Entry name (a single path component).
    pub name: CompactString,
    /// File or folder.
    pub kind: EntryKind,
    /// Size in bytes. Folders report whatever the store reports, often 0.
    pub size: u64,
    /// Additional metadata.
    #[serde(default)]
    pub metadata: EntryMetadata,
}

impl DirectoryEntry {
    /// Create a file entry.
    pub fn file(name: impl Into<CompactString>, size: u64) -> Self {
        Self {
            name: name.into(),
            kind: EntryKind::File,
            size,
            metadata: EntryMetadata::default(),
        }
    }

    /// Create a folder entry.
    pub fn folder(name: impl Into<CompactString>) -> Self {
        Self {
            name: name.into(),
            kind: EntryKind::Folder,
            size: 0,
            metadata: EntryMetadata::default(),
        }
    }

    /// Set the modification time.
    pub fn with_modified(mut self, modified: DateTime<Utc>) -> Self {
        self.metadata.modified = Some(modified);
        self
    }

    /// Set the mimetype.
    pub fn with_mimetype(mut self, mimetype: impl Into<CompactString>) -> Self {
        self.metadata.mimetype = Some(mimetype.into());
        self
    }

    /// Check if this entry is a folder.
    pub fn is_folder(&self) -> bool {
        self.kind.is_folder()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entry_constructors() {
        let file = DirectoryEntry::file("notes.txt", 12);
        assert_eq!(file.kind, EntryKind::File);
        assert_eq!(file.size, 12);
        assert!(!file.is_folder());

        let folder = DirectoryEntry::folder("logs");
        assert!(folder.is_folder());
        assert_eq!(folder.size, 0);
    }

    #[test]
    fn test_entry_kind_serializes_lowercase() {
        let json = serde_json::to_string(&EntryKind::Folder).unwrap();
        assert_eq!(json, "\"folder\"");
    }
}
