//! Snapshot Store Port - Stock Snapshot Persistence
//!
//! The monitor keeps the snapshot in memory and hands the whole of it
//! to the store after every product update. Stores only need to load
//! the last saved snapshot and replace it.

use async_trait::async_trait;

use crate::domain::snapshot::Snapshot;

/// Trait for snapshot persistence providers.
#[async_trait]
pub trait SnapshotStore: Send + Sync + 'static {
  /// Load the last saved snapshot; empty when nothing was saved yet.
  async fn load(&self) -> anyhow::Result<Snapshot>;

  /// Replace the stored snapshot with `snapshot`.
  async fn replace(&self, snapshot: &Snapshot) -> anyhow::Result<()>;
}
