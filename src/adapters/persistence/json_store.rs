//! Snapshot Store - Atomic JSON Snapshot Persistence
//!
//! Saves the stock snapshot to a single JSON file using atomic writes
//! (write to tmp file, then rename), so readers always see either the
//! old or the new snapshot, never a partial write.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use async_trait::async_trait;
use tokio::fs;
use tracing::{debug, info, instrument};

use crate::domain::snapshot::Snapshot;
use crate::ports::snapshot_store::SnapshotStore;

/// Atomic JSON file store for the stock snapshot.
pub struct JsonSnapshotStore {
    /// Path to the snapshot file.
    path: PathBuf,
    /// Temporary path for atomic writes.
    tmp_path: PathBuf,
}

impl JsonSnapshotStore {
    /// Create a store for `path`, creating its parent directory.
    pub async fn new(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir)
                .await
                .with_context(|| format!("Failed to create data directory {}", dir.display()))?;
        }

        let mut tmp_name = path.file_name().unwrap_or_default().to_os_string();
        tmp_name.push(".tmp");
        let tmp_path = path.with_file_name(tmp_name);

        Ok(Self { path, tmp_path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl SnapshotStore for JsonSnapshotStore {
    /// Load the snapshot. Returns an empty one if no file exists yet
    /// (first startup).
    #[instrument(skip(self), fields(path = %self.path.display()))]
    async fn load(&self) -> Result<Snapshot> {
        if !fs::try_exists(&self.path).await.unwrap_or(false) {
            info!("No snapshot file found, starting fresh");
            return Ok(Snapshot::new());
        }

        let json = fs::read_to_string(&self.path)
            .await
            .context("Failed to read snapshot file")?;

        let snapshot: Snapshot =
            serde_json::from_str(&json).context("Failed to parse snapshot JSON")?;

        info!(products = snapshot.len(), "Snapshot loaded");
        Ok(snapshot)
    }

    /// Save the snapshot atomically (tmp → rename).
    async fn replace(&self, snapshot: &Snapshot) -> Result<()> {
        let json = serde_json::to_string(snapshot).context("Failed to serialize snapshot")?;

        // Write to tmp file
        fs::write(&self.tmp_path, &json)
            .await
            .context("Failed to write tmp snapshot file")?;

        // Atomic rename
        fs::rename(&self.tmp_path, &self.path)
            .await
            .context("Failed to rename snapshot file")?;

        debug!(
            path = %self.path.display(),
            products = snapshot.len(),
            "Snapshot saved"
        );

        Ok(())
    }
}
