use crate::{
  chain::ChainClient,
  datastore::{Context, DataStoreReadOnly, SnapshotStore},
  Result,
};
use anyhow::anyhow;
use bitcoin::Block;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReorgState {
  Synced,
  Diverged { height: u64 },
  Recovering { fork: u64 },
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ReorgError {
  #[error("{depth} block deep reorg detected at height {height}")]
  Recoverable { height: u64, depth: u64 },
  #[error("unrecoverable reorg detected at height {height}")]
  Unrecoverable { height: u64 },
}

impl ReorgError {
  /// Highest height whose stored block is still on the best chain.
  pub fn good_height(&self) -> Option<u64> {
    match self {
      Self::Recoverable { height, depth } => height.checked_sub(*depth),
      Self::Unrecoverable { .. } => None,
    }
  }
}

pub struct Reorg {}

impl Reorg {
  /// Checks that `block` extends the last processed block. On divergence,
  /// walks back at most `window` stored hashes to find the fork point.
  pub async fn detect<S: SnapshotStore, C: ChainClient>(
    context: &Context<S>,
    chain: &C,
    block: &Block,
    height: u64,
    window: u64,
  ) -> Result {
    let Some(prev_height) = height.checked_sub(1) else {
      return Ok(());
    };

    match context.get_block_hash(prev_height).await? {
      Some(index_prev_blockhash) if index_prev_blockhash == block.header.prev_blockhash => Ok(()),
      Some(_) => {
        for depth in 2..=window.saturating_add(1) {
          let Some(candidate) = height.checked_sub(depth) else {
            break;
          };
          let Some(index_block_hash) = context.get_block_hash(candidate).await? else {
            break;
          };
          if chain.block_hash(candidate).await? == Some(index_block_hash) {
            return Err(anyhow!(ReorgError::Recoverable { height, depth }));
          }
        }

        Err(anyhow!(ReorgError::Unrecoverable { height }))
      }
      None => Ok(()),
    }
  }

  /// Rolls the store back to the latest snapshot at or below `good_height`
  /// and returns its height.
  pub async fn recover<S: SnapshotStore>(store: &S, height: u64, good_height: u64) -> Result<u64> {
    log::info!("rolling back index after reorg at height {height}, fork at {good_height}");

    let snapshot = store
      .snapshots()
      .await?
      .into_iter()
      .filter(|snapshot| *snapshot <= good_height)
      .max()
      .ok_or_else(|| anyhow!(ReorgError::Unrecoverable { height }))?;

    store.restore(snapshot).await?;

    log::info!("successfully rolled back index to snapshot at height {snapshot}");
    Ok(snapshot)
  }
}
