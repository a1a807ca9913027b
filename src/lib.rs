//! ncdu-explorer: decode disk-usage exports into a sized directory tree and
//! answer "what is in this directory, largest first" queries against it.

pub mod config;
pub mod error;
pub mod export;
pub mod format;
pub mod listing;
pub mod snapshot;
pub mod source;
pub mod types;

// Re-export
pub use config::ExplorerConfig;
pub use error::{ExplorerError, ExplorerResult, FormatError};
pub use export::{decode, decode_with, DecodeOptions, Descendants, Node, NodeKind};
pub use format::format_size;
pub use listing::{resolve, PathIndex};
pub use snapshot::{Snapshot, SnapshotStore};
pub use source::{ExportSource, FileSource, StaticSource};
pub use types::*;
