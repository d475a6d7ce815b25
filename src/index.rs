use crate::{
  chain::ChainClient,
  datastore::{DataStoreReadOnly, SnapshotStore},
  protocol::{BlockSummary, LedgerMode, ProtocolManager},
  Config, Result,
};
use std::sync::{
  atomic::{AtomicBool, Ordering},
  Arc,
};

mod reorg;
mod snapshot;

pub use self::{
  reorg::{Reorg, ReorgError, ReorgState},
  snapshot::SnapshotManager,
};

#[derive(Debug)]
pub enum Step {
  Indexed(BlockSummary),
  /// The next block is not available yet.
  Waiting,
  /// A reorg was rolled back to the snapshot at this height.
  RolledBack(u64),
}

/// Drives the protocol manager over the chain, one block at a time.
pub struct Index<S: SnapshotStore, C: ChainClient> {
  store: Arc<S>,
  chain: Arc<C>,
  config: Arc<Config>,
  manager: ProtocolManager<S>,
  state: ReorgState,
}

impl<S: SnapshotStore, C: ChainClient> Index<S, C> {
  pub fn new(store: Arc<S>, chain: Arc<C>, config: Arc<Config>) -> Self {
    Self {
      manager: ProtocolManager::new(store.clone(), config.clone()),
      store,
      chain,
      config,
      state: ReorgState::Synced,
    }
  }

  pub fn manager(&self) -> &ProtocolManager<S> {
    &self.manager
  }

  pub fn state(&self) -> ReorgState {
    self.state
  }

  pub async fn next_height(&self) -> Result<u64> {
    Ok(match self.manager.context().get_last_height().await? {
      Some(height) => height + 1,
      None => self.config.first_inscription_height,
    })
  }

  /// Replays settled history in batch mode, then takes a final snapshot.
  pub async fn startup(&mut self, shutting_down: &AtomicBool) -> Result {
    let tip = self.chain.chain_tip().await?;
    let last = self
      .config
      .last_startup_height
      .unwrap_or_else(|| tip.saturating_sub(self.config.blocks_behind))
      .min(tip);

    log::info!(
      "startup replay from height {} to {}",
      self.next_height().await?,
      last
    );

    let snapshots = SnapshotManager::new(
      self.config.startup_snapshot_interval,
      self.config.snapshot_retention,
    );

    let mut indexed = false;
    while self.next_height().await? <= last {
      if shutting_down.load(Ordering::Relaxed) {
        log::info!("startup replay interrupted");
        return Ok(());
      }
      match self.index_next(LedgerMode::Batch, &snapshots).await? {
        Step::Indexed(_) => indexed = true,
        Step::RolledBack(_) => {}
        Step::Waiting => break,
      }
    }

    if indexed {
      if let Some(height) = self.manager.context().get_last_height().await? {
        snapshots.snapshot(self.store.as_ref(), height).await?;
      }
    }

    log::info!("startup replay finished at height {last}");
    Ok(())
  }

  /// Follows the chain tip in streaming mode until shutdown.
  pub async fn daemon(&mut self, shutting_down: &AtomicBool) -> Result {
    let snapshots =
      SnapshotManager::new(self.config.snapshot_interval, self.config.snapshot_retention);

    while !shutting_down.load(Ordering::Relaxed) {
      let tip = self.chain.chain_tip().await?;
      if self.next_height().await? > tip.saturating_sub(self.config.blocks_behind) {
        tokio::time::sleep(self.config.poll_interval).await;
        continue;
      }

      if let Step::Waiting = self.index_next(LedgerMode::Streaming, &snapshots).await? {
        tokio::time::sleep(self.config.poll_interval).await;
      }
    }

    log::info!("daemon stopped at height {:?}", self.manager.context().get_last_height().await?);
    Ok(())
  }

  pub async fn index_next(&mut self, mode: LedgerMode, snapshots: &SnapshotManager) -> Result<Step> {
    let height = self.next_height().await?;
    let Some(block) = self.chain.block_by_height(height).await? else {
      return Ok(Step::Waiting);
    };

    if let Err(err) = Reorg::detect(
      self.manager.context(),
      self.chain.as_ref(),
      &block,
      height,
      self.config.reorg_window(),
    )
    .await
    {
      let Some(reorg) = err.downcast_ref::<ReorgError>().cloned() else {
        return Err(err);
      };

      self.state = ReorgState::Diverged { height };
      log::info!("{reorg}");
      let Some(good_height) = reorg.good_height() else {
        return Err(err);
      };

      self.state = ReorgState::Recovering { fork: good_height };
      let snapshot = Reorg::recover(self.store.as_ref(), height, good_height).await?;
      self.state = ReorgState::Synced;
      log::info!("resuming from height {}", self.next_height().await?);
      return Ok(Step::RolledBack(snapshot));
    }

    let summary = self
      .manager
      .index_block(Arc::new(block), height, mode)
      .await?;
    snapshots.maybe_snapshot(self.store.as_ref(), height).await?;

    Ok(Step::Indexed(summary))
  }
}
