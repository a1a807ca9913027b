//! On-demand resolution of a single path against the canonical tree.

use crate::export::{Node, NodeKind};
use crate::types::{DirectoryEntry, DirectoryListing, FileEntry};

/// Walks `path` down from `root` and lists the directory it names.
///
/// Each segment matches the first child with that exact name. A segment that
/// is missing or names a file yields a not-found listing truncated to the
/// prefix that did resolve. Child entries report the sizes declared in the
/// export; use [`PathIndex`](super::PathIndex) when recursive totals matter.
pub fn resolve<S: AsRef<str>>(root: &Node, path: &[S]) -> DirectoryListing {
    let requested: Vec<String> = path.iter().map(|s| s.as_ref().to_string()).collect();

    let mut dir = root;
    for (depth, segment) in requested.iter().enumerate() {
        match dir.child(segment) {
            Some(next) if next.is_dir() => dir = next,
            _ => {
                tracing::debug!(path = ?requested, depth, "path not found");
                return DirectoryListing::not_found(&requested, depth);
            }
        }
    }

    let mut directories = Vec::new();
    let mut files = Vec::new();
    for child in dir.children() {
        match &child.kind {
            NodeKind::Dir { children } => directories
                .push(DirectoryEntry::new(&child.name, child.size).with_item_count(children.len())),
            NodeKind::File => files.push(FileEntry::new(&child.name, child.size)),
        }
    }

    let item_count = dir.children().len();
    let current = if requested.is_empty() {
        // the root has no parent entry to take a declared size from
        let listed = directories
            .iter()
            .map(|d| d.size)
            .chain(files.iter().map(|f| f.size))
            .fold(0u64, |acc, size| acc.saturating_add(size));
        DirectoryEntry::new(&root.name, listed)
    } else {
        DirectoryEntry::new(&dir.name, dir.size)
    };

    DirectoryListing::new(
        current.with_item_count(item_count),
        requested,
        directories,
        files,
    )
}
