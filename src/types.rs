//! Listing and summary types handed to whatever serves the browsing UI.

use serde::{Deserialize, Serialize};
use serde_with::skip_serializing_none;
use std::time::SystemTime;

/// Message carried by a listing whose directory resolved but has no children.
pub const EMPTY_DIRECTORY: &str = "Directory is empty";

/// Common view over directory and file entries.
pub trait FsEntry {
    fn name(&self) -> &str;
    fn size(&self) -> u64;
    fn is_directory(&self) -> bool;
}

#[skip_serializing_none]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DirectoryEntry {
    pub name: String,
    pub size: u64,
    pub is_directory: bool,
    pub item_count: Option<usize>,
}

impl DirectoryEntry {
    pub fn new(name: impl Into<String>, size: u64) -> Self {
        Self {
            name: name.into(),
            size,
            is_directory: true,
            item_count: None,
        }
    }

    pub fn with_item_count(mut self, count: usize) -> Self {
        self.item_count = Some(count);
        self
    }
}

impl FsEntry for DirectoryEntry {
    fn name(&self) -> &str {
        &self.name
    }
    fn size(&self) -> u64 {
        self.size
    }
    fn is_directory(&self) -> bool {
        true
    }
}

#[skip_serializing_none]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileEntry {
    pub name: String,
    pub size: u64,
    pub is_directory: bool,
    pub extension: Option<String>,
}

impl FileEntry {
    /// Builds a file entry, deriving the extension from the text after the last `.`.
    pub fn new(name: impl Into<String>, size: u64) -> Self {
        let name = name.into();
        let extension = name.rsplit_once('.').map(|(_, ext)| ext.to_string());
        Self {
            name,
            size,
            is_directory: false,
            extension,
        }
    }
}

impl FsEntry for FileEntry {
    fn name(&self) -> &str {
        &self.name
    }
    fn size(&self) -> u64 {
        self.size
    }
    fn is_directory(&self) -> bool {
        false
    }
}

/// Contents of one directory, split into subdirectories and files.
///
/// `path` is the requested path when resolution succeeded, or the prefix that
/// did resolve when it failed. An `error` with a full-length `path` means the
/// directory exists but is empty.
#[skip_serializing_none]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DirectoryListing {
    pub current: DirectoryEntry,
    pub path: Vec<String>,
    pub directories: Vec<DirectoryEntry>,
    pub files: Vec<FileEntry>,
    pub total_items: usize,
    pub error: Option<String>,
}

impl DirectoryListing {
    /// Builds a listing from unsorted children, ordering both partitions largest first.
    pub(crate) fn new(
        current: DirectoryEntry,
        path: Vec<String>,
        mut directories: Vec<DirectoryEntry>,
        mut files: Vec<FileEntry>,
    ) -> Self {
        // sort_by is stable, so equal sizes keep export order
        directories.sort_by(|a, b| b.size.cmp(&a.size));
        files.sort_by(|a, b| b.size.cmp(&a.size));

        let total_items = directories.len() + files.len();
        let error = (total_items == 0).then(|| EMPTY_DIRECTORY.to_string());

        Self {
            current,
            path,
            directories,
            files,
            total_items,
            error,
        }
    }

    /// Listing for a path that could not be resolved past `resolved`.
    pub(crate) fn not_found(requested: &[String], resolved: usize) -> Self {
        let name = requested
            .last()
            .cloned()
            .unwrap_or_else(|| "root".to_string());

        Self {
            current: DirectoryEntry::new(name, 0),
            path: requested[..resolved].to_vec(),
            directories: Vec::new(),
            files: Vec::new(),
            total_items: 0,
            error: Some(format!("Path not found: {}", join_path(requested))),
        }
    }

    /// True when every requested segment resolved, even if the directory is empty.
    pub fn is_resolved(&self, requested: &[String]) -> bool {
        self.path.as_slice() == requested
    }

    pub fn is_empty(&self) -> bool {
        self.total_items == 0
    }

    /// All direct children, directories first.
    pub fn entries(&self) -> impl Iterator<Item = &dyn FsEntry> {
        let directories = self.directories.iter().map(|d| d as &dyn FsEntry);
        let files = self.files.iter().map(|f| f as &dyn FsEntry);
        directories.chain(files)
    }

    pub fn child_names(&self) -> impl Iterator<Item = &str> {
        self.entries().map(|entry| entry.name())
    }
}

/// Which of the two export layouts a document used.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ExportFormat {
    /// Object with `ver` and a flat `root` array of flag-tagged items.
    FlaggedItem,
    /// Top-level array where directories are nested arrays.
    ArrayTuple,
}

/// Whole-export metadata, independent of path navigation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportSummary {
    pub root_path: String,
    pub total_size: u64,
    pub available_space: u64,
    pub total_files: u64,
    pub max_files: u64,
    #[serde(with = "serde_millis")]
    pub scan_time: SystemTime,
    pub format: ExportFormat,
    pub version: u64,
}

/// Splits a slash-separated path into segments, dropping empty ones.
pub fn split_path(path: &str) -> Vec<String> {
    path.split('/')
        .filter(|segment| !segment.is_empty())
        .map(str::to_string)
        .collect()
}

/// Joins segments into an index key; the root is the empty string.
pub fn join_path<S: AsRef<str>>(segments: &[S]) -> String {
    segments
        .iter()
        .map(|s| s.as_ref())
        .collect::<Vec<&str>>()
        .join("/")
}
