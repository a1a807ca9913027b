use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::error::{ExplorerError, ExplorerResult};

/// Where raw export text comes from.
///
/// The store calls this on every (re)load; implementations do no caching.
#[async_trait::async_trait]
pub trait ExportSource: Send + Sync + 'static {
    /// Short description for log lines, e.g. the file path.
    fn describe(&self) -> String;

    async fn read_export(&self) -> ExplorerResult<String>;
}

#[async_trait::async_trait]
impl<S: ExportSource> ExportSource for Arc<S> {
    fn describe(&self) -> String {
        (**self).describe()
    }

    async fn read_export(&self) -> ExplorerResult<String> {
        (**self).read_export().await
    }
}

/// Reads the export from a file on each load.
#[derive(Debug, Clone)]
pub struct FileSource {
    path: PathBuf,
}

impl FileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait::async_trait]
impl ExportSource for FileSource {
    fn describe(&self) -> String {
        self.path.display().to_string()
    }

    async fn read_export(&self) -> ExplorerResult<String> {
        tokio::fs::read_to_string(&self.path)
            .await
            .map_err(|e| ExplorerError::Source(format!("{}: {}", self.path.display(), e)))
    }
}

/// Serves a fixed export held in memory.
#[derive(Debug, Clone)]
pub struct StaticSource {
    text: String,
}

impl StaticSource {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }
}

#[async_trait::async_trait]
impl ExportSource for StaticSource {
    fn describe(&self) -> String {
        format!("<static export, {} bytes>", self.text.len())
    }

    async fn read_export(&self) -> ExplorerResult<String> {
        Ok(self.text.clone())
    }
}
