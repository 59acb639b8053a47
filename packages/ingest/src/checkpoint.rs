//! Checkpoint persistence for the geocoding backfill.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use trash_bin_map_source::SourceError;

/// Somewhere to write the full dataset document mid-backfill.
#[async_trait]
pub trait CheckpointSink: Send + Sync {
    /// Writes `document`, replacing any previous checkpoint.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError`] if the document cannot be serialized or
    /// written.
    async fn persist(&self, document: &serde_json::Value) -> Result<(), SourceError>;
}

/// Overwrites a JSON file in place.
///
/// The document is written to a sibling temp file and renamed over the
/// target, so an interrupted write never leaves a truncated dataset behind.
#[derive(Debug, Clone)]
pub struct FileCheckpoint {
    path: PathBuf,
}

impl FileCheckpoint {
    /// Checkpoints to `path`.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Target file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self.path.file_name().unwrap_or_default().to_os_string();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

#[async_trait]
impl CheckpointSink for FileCheckpoint {
    async fn persist(&self, document: &serde_json::Value) -> Result<(), SourceError> {
        let bytes = serde_json::to_vec_pretty(document)?;
        let temp = self.temp_path();
        tokio::fs::write(&temp, bytes).await?;
        tokio::fs::rename(&temp, &self.path).await?;
        log::debug!("Checkpoint written to {}", self.path.display());
        Ok(())
    }
}
