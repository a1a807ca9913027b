//! Eager path index over every directory in the tree.

use std::collections::{HashMap, HashSet};
use std::time::Instant;

use serde::{Deserialize, Serialize};

use crate::export::{with_stack, Node, NodeKind};
use crate::types::{split_path, DirectoryEntry, DirectoryListing, FileEntry};

const ROOT: usize = 0;

/// Precomputed listings for every reachable directory, addressed by path segments.
///
/// Built in one bottom-up pass, so every directory size in every listing is the
/// recursive sum of the files beneath it rather than the figure the export
/// declared. Immutable once built.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PathIndex {
    dirs: Vec<IndexedDir>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct IndexedDir {
    /// Listing with an empty `path`; filled in on lookup.
    listing: DirectoryListing,
    /// Reachable subdirectories by name. Shadowed duplicates are absent.
    subdirs: HashMap<String, usize>,
}

impl PathIndex {
    pub fn build(root: &Node) -> Self {
        let started = Instant::now();
        let mut dirs = Vec::new();
        let total = index_dir(root, &mut dirs);

        tracing::debug!(
            directories = dirs.len(),
            total_size = total,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "built path index"
        );
        Self { dirs }
    }

    /// Listing for a path given as segments.
    pub fn lookup<S: AsRef<str>>(&self, path: &[S]) -> Option<DirectoryListing> {
        let slot = self.slot(path)?;
        let mut listing = self.dirs[slot].listing.clone();
        listing.path = path.iter().map(|s| s.as_ref().to_string()).collect();
        Some(listing)
    }

    /// Listing for a slash-separated key; `""` is the root.
    pub fn get(&self, key: &str) -> Option<DirectoryListing> {
        self.lookup(&split_path(key))
    }

    pub fn root(&self) -> Option<DirectoryListing> {
        self.lookup::<&str>(&[])
    }

    pub fn contains(&self, key: &str) -> bool {
        self.slot(&split_path(key)).is_some()
    }

    pub fn len(&self) -> usize {
        self.dirs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dirs.is_empty()
    }

    /// Slash-joined keys of every indexed directory, in no particular order.
    pub fn paths(&self) -> impl Iterator<Item = String> {
        let mut keys = Vec::with_capacity(self.dirs.len());
        let mut pending = Vec::new();
        if !self.dirs.is_empty() {
            pending.push((ROOT, String::new()));
        }
        while let Some((slot, key)) = pending.pop() {
            for (name, &child) in &self.dirs[slot].subdirs {
                let child_key = if key.is_empty() {
                    name.clone()
                } else {
                    format!("{key}/{name}")
                };
                pending.push((child, child_key));
            }
            keys.push(key);
        }
        keys.into_iter()
    }

    fn slot<S: AsRef<str>>(&self, path: &[S]) -> Option<usize> {
        if self.dirs.is_empty() {
            return None;
        }
        path.iter().try_fold(ROOT, |slot, segment| {
            self.dirs[slot].subdirs.get(segment.as_ref()).copied()
        })
    }
}

/// Indexes `node` and everything below it, returning its recursive size.
/// Sizes saturate at `u64::MAX`.
fn index_dir(node: &Node, dirs: &mut Vec<IndexedDir>) -> u64 {
    let children = node.children();
    // reserve the slot so parents sit before their children
    let slot = dirs.len();
    let placeholder = DirectoryEntry::new(&node.name, 0);
    dirs.push(IndexedDir {
        listing: DirectoryListing::new(placeholder, Vec::new(), Vec::new(), Vec::new()),
        subdirs: HashMap::new(),
    });

    let mut seen = HashSet::with_capacity(children.len());
    let mut subdirs = HashMap::new();
    let mut directories = Vec::new();
    let mut files = Vec::new();
    let mut total = 0u64;

    for child in children {
        let first = seen.insert(child.name.as_str());
        match &child.kind {
            NodeKind::Dir { children: grand } => {
                // shadowed duplicates are unreachable by path, so only their size counts
                let size = if first {
                    let child_slot = dirs.len();
                    let size = with_stack(|| index_dir(child, dirs));
                    subdirs.insert(child.name.clone(), child_slot);
                    size
                } else {
                    child.total_size()
                };
                total = total.saturating_add(size);
                directories.push(DirectoryEntry::new(&child.name, size).with_item_count(grand.len()));
            }
            NodeKind::File => {
                total = total.saturating_add(child.size);
                files.push(FileEntry::new(&child.name, child.size));
            }
        }
    }

    let current = DirectoryEntry::new(&node.name, total).with_item_count(children.len());
    dirs[slot] = IndexedDir {
        listing: DirectoryListing::new(current, Vec::new(), directories, files),
        subdirs,
    };
    total
}
