use crate::{datastore::SnapshotStore, Result};

/// Takes a snapshot every `interval` blocks and keeps the latest `retention`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SnapshotManager {
  interval: u64,
  retention: usize,
}

impl SnapshotManager {
  pub fn new(interval: u64, retention: usize) -> Self {
    Self {
      interval,
      retention: retention.max(1),
    }
  }

  pub async fn maybe_snapshot<S: SnapshotStore>(&self, store: &S, height: u64) -> Result<bool> {
    if self.interval == 0 || height % self.interval != 0 {
      return Ok(false);
    }
    self.snapshot(store, height).await?;
    Ok(true)
  }

  pub async fn snapshot<S: SnapshotStore>(&self, store: &S, height: u64) -> Result {
    store.snapshot(height).await?;
    log::info!("created snapshot at height {height}");

    let snapshots = store.snapshots().await?;
    let expired = snapshots.len().saturating_sub(self.retention);
    for height in &snapshots[..expired] {
      store.delete_snapshot(*height).await?;
      log::debug!("pruned snapshot at height {height}");
    }

    Ok(())
  }
}
