//! Runtime configuration for loading and refreshing an export.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{ExplorerError, ExplorerResult};
use crate::export::DecodeOptions;
use crate::snapshot::SnapshotStore;
use crate::source::FileSource;

pub const ENV_EXPORT_PATH: &str = "NCDU_FILE_PATH";
pub const ENV_REFRESH_HOURS: &str = "REFRESH_INTERVAL_HOURS";
pub const ENV_STRICT_NAMES: &str = "NCDU_STRICT_NAMES";

const DEFAULT_EXPORT_PATH: &str = "ncdu-export.json";
const DEFAULT_REFRESH: Duration = Duration::from_secs(3 * 60 * 60);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExplorerConfig {
    pub export_path: PathBuf,
    /// Snapshots older than this are reloaded on the next request.
    pub refresh_interval: Duration,
    pub decode: DecodeOptions,
}

impl Default for ExplorerConfig {
    fn default() -> Self {
        Self {
            export_path: PathBuf::from(DEFAULT_EXPORT_PATH),
            refresh_interval: DEFAULT_REFRESH,
            decode: DecodeOptions::default(),
        }
    }
}

impl ExplorerConfig {
    /// Reads overrides from the process environment.
    pub fn from_env() -> ExplorerResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds a config from any key lookup; unset keys keep their defaults.
    pub fn from_lookup<F>(lookup: F) -> ExplorerResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(path) = lookup(ENV_EXPORT_PATH).filter(|p| !p.trim().is_empty()) {
            config.export_path = PathBuf::from(path);
        }

        if let Some(raw) = lookup(ENV_REFRESH_HOURS) {
            let value: f64 = raw.trim().parse().map_err(|_| {
                ExplorerError::Config(format!("{ENV_REFRESH_HOURS} is not a number: {raw:?}"))
            })?;
            if !value.is_finite() || value <= 0.0 {
                return Err(ExplorerError::Config(format!(
                    "{ENV_REFRESH_HOURS} must be positive, got {value}"
                )));
            }
            config.refresh_interval = Duration::try_from_secs_f64(value * 3600.0).map_err(|_| {
                ExplorerError::Config(format!("{ENV_REFRESH_HOURS} is out of range: {value}"))
            })?;
        }

        if let Some(raw) = lookup(ENV_STRICT_NAMES) {
            config.decode.reject_duplicate_names = match raw.trim().to_ascii_lowercase().as_str() {
                "1" | "true" | "yes" => true,
                "0" | "false" | "no" | "" => false,
                other => {
                    return Err(ExplorerError::Config(format!(
                        "{ENV_STRICT_NAMES} must be a boolean, got {other:?}"
                    )));
                }
            };
        }

        Ok(config)
    }

    pub fn with_refresh_interval(mut self, interval: Duration) -> Self {
        self.refresh_interval = interval;
        self
    }

    /// A store that reads `export_path` from disk.
    pub fn file_store(&self) -> SnapshotStore<FileSource> {
        SnapshotStore::new(
            FileSource::new(&self.export_path),
            self.refresh_interval,
            self.decode.clone(),
        )
    }
}
