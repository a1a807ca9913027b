//! Immutable loaded exports and the store that swaps them in on refresh.

use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::{Mutex, RwLock};

use crate::error::{ExplorerResult, FormatError};
use crate::export::{decode_with, DecodeOptions, Node};
use crate::listing::{resolve, PathIndex};
use crate::source::ExportSource;
use crate::types::{split_path, DirectoryListing, ExportSummary};

/// One decoded export with its precomputed index. Never mutated after construction.
#[derive(Debug)]
pub struct Snapshot {
    summary: ExportSummary,
    root: Node,
    index: PathIndex,
    loaded_at: Instant,
}

impl Snapshot {
    /// Decodes `text` and builds the path index in one step.
    pub fn from_export(text: &str, options: &DecodeOptions) -> Result<Self, FormatError> {
        let (summary, root) = decode_with(text, options)?;
        let index = PathIndex::build(&root);
        Ok(Self {
            summary,
            root,
            index,
            loaded_at: Instant::now(),
        })
    }

    pub fn summary(&self) -> &ExportSummary {
        &self.summary
    }

    pub fn root(&self) -> &Node {
        &self.root
    }

    pub fn index(&self) -> &PathIndex {
        &self.index
    }

    pub fn age(&self) -> Duration {
        self.loaded_at.elapsed()
    }

    /// Listing for `path`, served from the index.
    ///
    /// Paths missing from the index go through the resolver so the caller gets
    /// the not-found listing truncated at the first bad segment.
    pub fn listing<S: AsRef<str>>(&self, path: &[S]) -> DirectoryListing {
        self.index
            .lookup(path)
            .unwrap_or_else(|| resolve(&self.root, path))
    }

    /// Same as [`Snapshot::listing`] for a slash-separated path; empty segments are dropped.
    pub fn listing_for(&self, path: &str) -> DirectoryListing {
        self.listing(&split_path(path))
    }
}

/// Holds the current snapshot and reloads it from `S` once it goes stale.
///
/// Readers always get a complete snapshot: a reload builds the replacement
/// off to the side and publishes it with a single swap. A failed reload keeps
/// the previous snapshot and is retried on the next request.
pub struct SnapshotStore<S> {
    source: S,
    refresh_interval: Duration,
    options: DecodeOptions,
    current: RwLock<Option<Arc<Snapshot>>>,
    reload: Mutex<()>,
}

impl<S: ExportSource> SnapshotStore<S> {
    pub fn new(source: S, refresh_interval: Duration, options: DecodeOptions) -> Self {
        Self {
            source,
            refresh_interval,
            options,
            current: RwLock::new(None),
            reload: Mutex::new(()),
        }
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    /// The current snapshot, reloading first if none is loaded or it is stale.
    pub async fn current(&self) -> ExplorerResult<Arc<Snapshot>> {
        if let Some(snapshot) = self.fresh().await {
            return Ok(snapshot);
        }

        let _guard = self.reload.lock().await;
        // another caller may have finished a reload while we waited
        if let Some(snapshot) = self.fresh().await {
            return Ok(snapshot);
        }

        match self.load().await {
            Ok(snapshot) => Ok(snapshot),
            Err(e) => match self.loaded().await {
                Some(previous) => {
                    tracing::warn!(
                        source = %self.source.describe(),
                        error = %e,
                        "refresh failed, keeping previous snapshot"
                    );
                    Ok(previous)
                }
                None => {
                    tracing::error!(
                        source = %self.source.describe(),
                        error = %e,
                        "initial export load failed"
                    );
                    Err(e)
                }
            },
        }
    }

    /// Reloads unconditionally. On failure the previous snapshot stays published.
    pub async fn force_reload(&self) -> ExplorerResult<Arc<Snapshot>> {
        let _guard = self.reload.lock().await;
        self.load().await
    }

    /// The published snapshot, if any, without triggering a reload.
    pub async fn loaded(&self) -> Option<Arc<Snapshot>> {
        self.current.read().await.clone()
    }

    pub async fn is_loaded(&self) -> bool {
        self.current.read().await.is_some()
    }

    /// Listing for a slash-separated path against the current snapshot.
    pub async fn list(&self, path: &str) -> ExplorerResult<DirectoryListing> {
        Ok(self.current().await?.listing_for(path))
    }

    pub async fn summary(&self) -> ExplorerResult<ExportSummary> {
        Ok(self.current().await?.summary().clone())
    }

    async fn fresh(&self) -> Option<Arc<Snapshot>> {
        self.current
            .read()
            .await
            .as_ref()
            .filter(|snapshot| snapshot.age() < self.refresh_interval)
            .cloned()
    }

    async fn load(&self) -> ExplorerResult<Arc<Snapshot>> {
        let started = Instant::now();
        tracing::info!(source = %self.source.describe(), "reading export");

        let text = self.source.read_export().await?;
        let options = self.options.clone();
        // decoding and indexing are CPU-bound and unbounded in tree size
        let snapshot =
            tokio::task::spawn_blocking(move || Snapshot::from_export(&text, &options)).await??;
        let snapshot = Arc::new(snapshot);

        *self.current.write().await = Some(Arc::clone(&snapshot));

        tracing::info!(
            source = %self.source.describe(),
            directories = snapshot.index().len(),
            files = snapshot.root().file_count(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "published snapshot"
        );
        Ok(snapshot)
    }
}
