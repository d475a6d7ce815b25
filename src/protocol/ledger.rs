use super::{drc20, ownership, Content, Error};
use crate::{
  datastore::{DataStoreReadWrite, LedgerError, TransferEvent, TransferKind},
  Config, InscriptionId,
};
use anyhow::anyhow;

/// How pending events are consumed.
///
/// With `retain_history` the audit trail keeps genesis and Pending* events
/// only. Confirmed* events are purged once applied in either mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LedgerMode {
  /// Pending events are provisional until their confirmation is applied.
  Streaming,
  /// Pending events are final and confirmations are never scheduled. Only
  /// valid for history deeper than any reorg.
  Batch,
}

#[derive(Debug, PartialEq)]
pub enum Outcome {
  Applied,
  Rejected(LedgerError),
  Skipped,
}

#[derive(Debug, PartialEq)]
pub struct Receipt {
  pub key: String,
  pub kind: TransferKind,
  pub inscription_id: InscriptionId,
  pub outcome: Outcome,
}

/// Applies the stored events of block `height` to the read models.
pub async fn apply_block<N: DataStoreReadWrite>(
  store: &N,
  config: &Config,
  mode: LedgerMode,
  height: u64,
) -> anyhow::Result<Vec<Receipt>> {
  let mut events = store
    .get_block_events(height)
    .await
    .map_err(|e| anyhow!("failed to load events of block {height}: {e}"))?;
  events.sort_by_key(TransferEvent::order);

  let mut receipts = Vec::with_capacity(events.len());
  for mut event in events {
    if event.applied {
      continue;
    }

    let outcome = match apply(store, mode, &event).await {
      Ok(true) => Outcome::Applied,
      Ok(false) => Outcome::Skipped,
      Err(Error::Ledger(e)) => {
        log::debug!("event {} rejected: {}", event.key(), e);
        Outcome::Rejected(e)
      }
      Err(Error::Num(e)) => {
        log::debug!("event {} rejected: {}", event.key(), e);
        Outcome::Rejected(LedgerError::Num(e))
      }
      Err(Error::DataStore(e)) => {
        return Err(anyhow!("failed to apply event {}: {e}", event.key()))
      }
    };

    if event.kind.is_confirmed() || !config.retain_history {
      store
        .remove_event(&event)
        .await
        .map_err(|e| anyhow!("failed to purge event {}: {e}", event.key()))?;
    } else {
      event.applied = true;
      store
        .save_event(&event)
        .await
        .map_err(|e| anyhow!("failed to save event {}: {e}", event.key()))?;
    }

    receipts.push(Receipt {
      key: event.key(),
      kind: event.kind,
      inscription_id: event.inscription_id,
      outcome,
    });
  }

  store
    .set_read_model_height(height)
    .await
    .map_err(|e| anyhow!("failed to checkpoint read models at {height}: {e}"))?;

  Ok(receipts)
}

async fn apply<N: DataStoreReadWrite>(
  store: &N,
  mode: LedgerMode,
  event: &TransferEvent,
) -> Result<bool, Error<N>> {
  match event.kind {
    TransferKind::Deploy
    | TransferKind::Mint
    | TransferKind::MarkTransferable
    | TransferKind::PendingTransfer => execute_token(store, mode, event).await?,
    TransferKind::ConfirmedTransfer => {
      if mode == LedgerMode::Batch {
        log::warn!("confirmed event {} skipped in batch mode", event.key());
        return Ok(false);
      }
      execute_token(store, mode, event).await?
    }
    TransferKind::PendingName | TransferKind::PendingNumbered | TransferKind::PendingChunked => {
      ownership::process_pending(store, mode, event).await?
    }
    TransferKind::ConfirmedName
    | TransferKind::ConfirmedNumbered
    | TransferKind::ConfirmedChunked => {
      if mode == LedgerMode::Batch {
        log::warn!("confirmed event {} skipped in batch mode", event.key());
        return Ok(false);
      }
      ownership::process_confirm(store, event).await?
    }
  }

  Ok(true)
}

async fn execute_token<N: DataStoreReadWrite>(
  store: &N,
  mode: LedgerMode,
  event: &TransferEvent,
) -> Result<(), Error<N>> {
  let inscription = store
    .get_inscription(&event.inscription_id)
    .await
    .map_err(|e| Error::DataStore(e))?
    .ok_or(LedgerError::InscriptionNotFound(event.inscription_id))?;

  match &inscription.content {
    Content::Token(operation) => drc20::execute(store, mode, event, operation).await,
    _ => Err(Error::Ledger(LedgerError::UnexpectedContent(
      event.inscription_id,
    ))),
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::{
    datastore::{Context, DataStoreReadOnly, MemoryStore, Tick},
    protocol::{
      drc20::{Deploy, Mint, Num, Operation},
      Inscription, ProtocolKind,
    },
  };
  use bitcoin::{hashes::Hash, Txid};
  use pretty_assertions::assert_eq;
  use std::{str::FromStr, sync::Arc};

  fn store() -> Context<MemoryStore> {
    Context::new(Arc::new(MemoryStore::new()))
  }

  fn tick() -> Tick {
    Tick::from_str("dogi").unwrap()
  }

  async fn inscribe(store: &Context<MemoryStore>, n: u8, operation: Operation) -> InscriptionId {
    let id = InscriptionId::from(Txid::from_byte_array([n; 32]));
    store
      .save_inscription(&Inscription {
        id,
        content_type: "text/plain".to_string(),
        height: 1,
        timestamp: 0,
        content: Content::Token(operation),
      })
      .await
      .unwrap();
    id
  }

  fn event(id: InscriptionId, kind: TransferKind, tx_index: u32, receiver: &str) -> TransferEvent {
    TransferEvent {
      height: 1,
      tx_index,
      input_index: 0,
      inscription_id: id,
      protocol: ProtocolKind::Token,
      subject: "dogi".to_string(),
      receiver: receiver.to_string(),
      sender: None,
      kind,
      timestamp: 0,
      applied: false,
    }
  }

  async fn setup(store: &Context<MemoryStore>) -> (TransferEvent, TransferEvent) {
    let deploy = inscribe(
      store,
      1,
      Operation::Deploy(Deploy {
        tick: tick(),
        max: Num::from(1000),
        lim: Num::from(100),
        dec: None,
      }),
    )
    .await;
    let mint = inscribe(
      store,
      2,
      Operation::Mint(Mint {
        tick: tick(),
        amt: Num::from(10),
      }),
    )
    .await;

    // the mint is stored first but comes later in the block
    let mint = event(mint, TransferKind::Mint, 2, "a");
    let deploy = event(deploy, TransferKind::Deploy, 1, "a");
    store.save_event(&mint).await.unwrap();
    store.save_event(&deploy).await.unwrap();
    (deploy, mint)
  }

  #[tokio::test]
  async fn test_apply_in_block_order() {
    let store = store();
    setup(&store).await;

    let receipts = apply_block(&store, &Config::default(), LedgerMode::Batch, 1)
      .await
      .unwrap();

    assert_eq!(
      receipts
        .iter()
        .map(|r| (r.kind, &r.outcome))
        .collect::<Vec<_>>(),
      vec![
        (TransferKind::Deploy, &Outcome::Applied),
        (TransferKind::Mint, &Outcome::Applied)
      ]
    );
    assert_eq!(
      store.get_balance("a", &tick()).await.unwrap().unwrap().available,
      Num::from(10)
    );
    assert!(store.get_block_events(1).await.unwrap().is_empty());
    assert_eq!(store.get_read_model_height().await.unwrap(), Some(1));
  }

  #[tokio::test]
  async fn test_retained_events_are_not_reapplied() {
    let store = store();
    let (deploy, mint) = setup(&store).await;
    let config = Config {
      retain_history: true,
      ..Default::default()
    };

    apply_block(&store, &config, LedgerMode::Batch, 1)
      .await
      .unwrap();
    assert!(store
      .get_event(&mint.key())
      .await
      .unwrap()
      .unwrap()
      .applied);
    assert_eq!(
      store.get_history(ProtocolKind::Token, "dogi").await.unwrap().len(),
      2
    );
    assert!(store.get_event(&deploy.key()).await.unwrap().unwrap().applied);

    let receipts = apply_block(&store, &config, LedgerMode::Batch, 1)
      .await
      .unwrap();
    assert!(receipts.is_empty());
    assert_eq!(
      store.get_balance("a", &tick()).await.unwrap().unwrap().available,
      Num::from(10)
    );
  }

  #[tokio::test]
  async fn test_confirmed_skipped_in_batch() {
    let store = store();
    let id = inscribe(
      &store,
      3,
      Operation::Mint(Mint {
        tick: tick(),
        amt: Num::from(10),
      }),
    )
    .await;
    store
      .save_event(&event(id, TransferKind::ConfirmedTransfer, 0, "a"))
      .await
      .unwrap();

    let receipts = apply_block(&store, &Config::default(), LedgerMode::Batch, 1)
      .await
      .unwrap();
    assert_eq!(receipts[0].outcome, Outcome::Skipped);
  }

  #[tokio::test]
  async fn test_rejected_event_is_a_no_op() {
    let store = store();
    let id = inscribe(
      &store,
      4,
      Operation::Mint(Mint {
        tick: tick(),
        amt: Num::from(10),
      }),
    )
    .await;
    store
      .save_event(&event(id, TransferKind::Mint, 0, "a"))
      .await
      .unwrap();

    let receipts = apply_block(&store, &Config::default(), LedgerMode::Streaming, 1)
      .await
      .unwrap();
    assert_eq!(
      receipts[0].outcome,
      Outcome::Rejected(LedgerError::TickNotFound("dogi".to_string()))
    );
    assert_eq!(store.get_balance("a", &tick()).await.unwrap(), None);
  }
}
