//! Canonical tree produced by the decoder.

use serde::{Deserialize, Serialize};

/// A decoded export node - either a file or a directory owning its children.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Node {
    pub name: String,
    /// Declared size: apparent-then-disk for files, the export's own figure for directories.
    pub size: u64,
    pub kind: NodeKind,
    /// Read error reported by the scanner for this node, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum NodeKind {
    File,
    Dir { children: Vec<Node> },
}

impl Node {
    pub fn new_file(name: impl Into<String>, size: u64) -> Self {
        Self {
            name: name.into(),
            size,
            kind: NodeKind::File,
            error: None,
        }
    }

    pub fn new_dir(name: impl Into<String>, size: u64, children: Vec<Node>) -> Self {
        Self {
            name: name.into(),
            size,
            kind: NodeKind::Dir { children },
            error: None,
        }
    }

    pub fn with_error(mut self, error: impl Into<String>) -> Self {
        self.error = Some(error.into());
        self
    }

    pub fn is_file(&self) -> bool {
        matches!(self.kind, NodeKind::File)
    }

    pub fn is_dir(&self) -> bool {
        matches!(self.kind, NodeKind::Dir { .. })
    }

    /// Direct children; empty for files.
    pub fn children(&self) -> &[Node] {
        match &self.kind {
            NodeKind::Dir { children } => children,
            NodeKind::File => &[],
        }
    }

    /// First child with exactly this name, in export order.
    pub fn child(&self, name: &str) -> Option<&Node> {
        self.children().iter().find(|c| c.name == name)
    }

    /// Recursive byte total. Only file sizes count; declared directory sizes are ignored.
    /// Saturates at `u64::MAX`.
    pub fn total_size(&self) -> u64 {
        self.descendants()
            .filter(|n| n.is_file())
            .fold(0, |acc, n| acc.saturating_add(n.size))
    }

    /// Number of files in this subtree.
    pub fn file_count(&self) -> u64 {
        self.descendants().filter(|n| n.is_file()).count() as u64
    }

    /// Number of directories in this subtree, this one included.
    pub fn dir_count(&self) -> u64 {
        self.descendants().filter(|n| n.is_dir()).count() as u64
    }

    /// This node and everything below it, depth first, without recursing.
    pub fn descendants(&self) -> Descendants<'_> {
        Descendants { stack: vec![self] }
    }
}

pub struct Descendants<'a> {
    stack: Vec<&'a Node>,
}

impl<'a> Iterator for Descendants<'a> {
    type Item = &'a Node;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.stack.pop()?;
        self.stack.extend(node.children().iter().rev());
        Some(node)
    }
}

// flat teardown; the derived drop recurses once per level
impl Drop for Node {
    fn drop(&mut self) {
        let mut pending = match &mut self.kind {
            NodeKind::Dir { children } => std::mem::take(children),
            NodeKind::File => return,
        };
        while let Some(mut node) = pending.pop() {
            if let NodeKind::Dir { children } = &mut node.kind {
                pending.append(children);
            }
        }
    }
}
