use super::{
  carrier, extractor,
  ledger::{self, LedgerMode, Outcome, Receipt},
  scheduler::{self, Candidate},
  BlockContext, ChunkWalker, Inscription,
};
use crate::{
  datastore::{Context, DataStoreReadOnly, DataStoreReadWrite, KvStore, TransferKind},
  Config, Result,
};
use anyhow::Context as _;
use bitcoin::Block;
use futures::future::try_join_all;
use std::{sync::Arc, time::Instant};
use tokio::sync::Semaphore;

#[derive(Debug, Default, PartialEq)]
pub struct BlockSummary {
  pub height: u64,
  pub inscriptions: usize,
  pub events: usize,
  pub receipts: Vec<Receipt>,
}

impl BlockSummary {
  pub fn applied(&self) -> usize {
    self
      .receipts
      .iter()
      .filter(|receipt| receipt.outcome == Outcome::Applied)
      .count()
  }
}

/// Runs every component over one block: extraction, carrier tracking,
/// classification and the ledger.
pub struct ProtocolManager<S: KvStore> {
  context: Context<S>,
  config: Arc<Config>,
}

impl<S: KvStore> ProtocolManager<S> {
  pub fn new(store: Arc<S>, config: Arc<Config>) -> Self {
    Self {
      context: Context::new(store),
      config,
    }
  }

  pub fn context(&self) -> &Context<S> {
    &self.context
  }

  pub fn config(&self) -> &Config {
    &self.config
  }

  /// Indexes one block inside a single store batch. Nothing of the block is
  /// visible to the store unless every step succeeded.
  pub async fn index_block(
    &self,
    block: Arc<Block>,
    height: u64,
    mode: LedgerMode,
  ) -> Result<BlockSummary> {
    let start = Instant::now();
    let store = self.context.store();

    store.begin_block().await?;
    let summary = match self.process_block(&block, height, mode).await {
      Ok(summary) => summary,
      Err(err) => {
        if let Err(e) = store.abort_block().await {
          log::error!("failed to abort block {height}: {e}");
        }
        return Err(err);
      }
    };
    store.commit_block().await?;

    log::info!(
      "Protocol Manager indexed block {} with {} inscriptions, {} events, {} applied in {} ms",
      height,
      summary.inscriptions,
      summary.events,
      summary.applied(),
      (Instant::now() - start).as_millis(),
    );

    Ok(summary)
  }

  async fn process_block(
    &self,
    block: &Arc<Block>,
    height: u64,
    mode: LedgerMode,
  ) -> Result<BlockSummary> {
    if matches!(
      self.context.get_read_model_height().await?,
      Some(applied) if applied >= height
    ) {
      log::warn!("read models already include block {height}, only recording its hash");
      self.record_block(block, height).await?;
      return Ok(BlockSummary {
        height,
        ..Default::default()
      });
    }

    let context = BlockContext {
      network: self.config.network,
      blockheight: height,
      blocktime: block.header.time,
    };
    let walker = Arc::new(ChunkWalker::new(block.clone()));

    let inscriptions = self.extract(block.clone(), walker.clone(), context).await?;

    let mut events = 0;
    for (tx_index, (tx, inscription)) in block.txdata.iter().zip(&inscriptions).enumerate() {
      let tx_index = u32::try_from(tx_index)?;

      if let Some(inscription) = inscription {
        carrier::watch(&self.context, context, &walker, tx, inscription).await?;

        if let Some(kind) = Candidate::genesis_kind(inscription) {
          match carrier::output_owner(tx, context) {
            Some(receiver) => {
              let candidate = Candidate {
                inscription: inscription.clone(),
                tx_index,
                input_index: 0,
                receiver,
                sender: None,
              };
              events += scheduler::schedule(&self.context, &self.config, mode, context, &candidate, kind)
                .await?
                .len();
            }
            None => log::debug!(
              "genesis of {} pays to a script without address, no event",
              inscription.id
            ),
          }
        }
      }

      // skip coinbase transaction.
      if tx.is_coin_base() {
        continue;
      }

      for input_index in 0..tx.input.len() {
        let input_index = u32::try_from(input_index)?;
        if let Some(candidate) =
          carrier::detect_spend(&self.context, context, &walker, tx, tx_index, input_index).await?
        {
          let kind = TransferKind::pending(candidate.inscription.protocol());
          events += scheduler::schedule(&self.context, &self.config, mode, context, &candidate, kind)
            .await?
            .len();
        }
      }
    }

    let receipts = ledger::apply_block(&self.context, &self.config, mode, height).await?;

    self.record_block(block, height).await?;

    Ok(BlockSummary {
      height,
      inscriptions: inscriptions.iter().flatten().count(),
      events,
      receipts,
    })
  }

  async fn record_block(&self, block: &Block, height: u64) -> Result {
    self
      .context
      .set_last_block(height, &block.block_hash())
      .await?;
    if let Some(expired) = height.checked_sub(self.config.reorg_window() + 1) {
      self.context.remove_block_hash(expired).await?;
    }
    Ok(())
  }

  /// Extracts and persists the inscriptions of every transaction, in
  /// parallel. A stored inscription wins over a fresh extraction.
  async fn extract(
    &self,
    block: Arc<Block>,
    walker: Arc<ChunkWalker>,
    context: BlockContext,
  ) -> Result<Vec<Option<Inscription>>> {
    let semaphore = Arc::new(Semaphore::new(self.config.workers.max(1)));
    let mut handles = Vec::with_capacity(block.txdata.len());

    for tx_index in 0..block.txdata.len() {
      let permit = semaphore.clone().acquire_owned().await?;
      let block = block.clone();
      let walker = walker.clone();
      let config = self.config.clone();
      let store = self.context.clone();

      handles.push(tokio::spawn(async move {
        let _permit = permit;
        let Some(inscription) = block
          .txdata
          .get(tx_index)
          .and_then(|tx| extractor::extract(tx, context, &walker, &config))
        else {
          return Ok::<_, anyhow::Error>(None);
        };

        match store.get_inscription(&inscription.id).await? {
          Some(stored) => Ok(Some(stored)),
          None => {
            store.save_inscription(&inscription).await?;
            Ok(Some(inscription))
          }
        }
      }));
    }

    try_join_all(handles)
      .await
      .context("extraction task failed")?
      .into_iter()
      .collect()
  }
}
