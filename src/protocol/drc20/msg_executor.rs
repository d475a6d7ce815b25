use super::{params::PROTOCOL_LITERAL, Deploy, Mint, Operation, Transfer};
use crate::{
  datastore::{Balance, DataStoreReadWrite, LedgerError, TokenInfo, TransferEvent, TransferKind},
  protocol::{Error, LedgerMode},
};

pub(crate) async fn execute<N: DataStoreReadWrite>(
  store: &N,
  mode: LedgerMode,
  event: &TransferEvent,
  operation: &Operation,
) -> Result<(), Error<N>> {
  log::debug!("DRC20 execute event: {:?}", event);
  match (event.kind, operation) {
    (TransferKind::Deploy, Operation::Deploy(deploy)) => process_deploy(store, event, deploy).await,
    (TransferKind::Mint, Operation::Mint(mint)) => process_mint(store, event, mint).await,
    (TransferKind::MarkTransferable, Operation::Transfer(transfer)) => {
      process_inscribe_transfer(store, event, transfer).await
    }
    (TransferKind::PendingTransfer, Operation::Transfer(transfer)) => {
      process_transfer(store, mode, event, transfer).await
    }
    (TransferKind::ConfirmedTransfer, Operation::Transfer(transfer)) => {
      process_confirm_transfer(store, event, transfer).await
    }
    _ => Err(Error::Ledger(LedgerError::UnexpectedContent(
      event.inscription_id,
    ))),
  }
}

async fn process_deploy<N: DataStoreReadWrite>(
  store: &N,
  event: &TransferEvent,
  deploy: &Deploy,
) -> Result<(), Error<N>> {
  if let Some(stored_tick_info) = store
    .get_token_info(&deploy.tick)
    .await
    .map_err(|e| Error::DataStore(e))?
  {
    return Err(Error::Ledger(LedgerError::DuplicateTick(
      stored_tick_info.tick.to_string(),
    )));
  }

  let new_info = TokenInfo {
    tick: deploy.tick.clone(),
    protocol: PROTOCOL_LITERAL.to_string(),
    max: deploy.max.clone(),
    lim: deploy.lim.clone(),
    dec: deploy.dec,
    supply: Default::default(),
    deploy_by: event.receiver.clone(),
    inscription_id: event.inscription_id,
    deployed_number: event.height,
    deployed_timestamp: event.timestamp,
  };

  store
    .insert_token_info(&new_info)
    .await
    .map_err(|e| Error::DataStore(e))?;

  Ok(())
}

async fn process_mint<N: DataStoreReadWrite>(
  store: &N,
  event: &TransferEvent,
  mint: &Mint,
) -> Result<(), Error<N>> {
  let token_info = store
    .get_token_info(&mint.tick)
    .await
    .map_err(|e| Error::DataStore(e))?
    .ok_or(LedgerError::TickNotFound(mint.tick.to_string()))?;

  let (token_info, minted) = token_info.mint(&mint.amt)?;
  if minted != mint.amt {
    log::debug!(
      "mint of {} {} cut to {} to fit the max supply",
      mint.amt,
      mint.tick,
      minted
    );
  }

  // get or initialize receiver balance.
  let balance = store
    .get_balance(&event.receiver, &mint.tick)
    .await
    .map_err(|e| Error::DataStore(e))?
    .unwrap_or_else(|| Balance::new(&mint.tick));

  store
    .update_balance(&event.receiver, &balance.credit_available(&minted)?)
    .await
    .map_err(|e| Error::DataStore(e))?;

  store
    .update_token_info(&token_info)
    .await
    .map_err(|e| Error::DataStore(e))?;

  Ok(())
}

async fn process_inscribe_transfer<N: DataStoreReadWrite>(
  store: &N,
  event: &TransferEvent,
  transfer: &Transfer,
) -> Result<(), Error<N>> {
  store
    .get_token_info(&transfer.tick)
    .await
    .map_err(|e| Error::DataStore(e))?
    .ok_or(LedgerError::TickNotFound(transfer.tick.to_string()))?;

  let balance = balance_of(store, &event.receiver, transfer).await?;

  store
    .update_balance(
      &event.receiver,
      &balance.available_to_transferable(&transfer.amt)?,
    )
    .await
    .map_err(|e| Error::DataStore(e))?;

  Ok(())
}

async fn process_transfer<N: DataStoreReadWrite>(
  store: &N,
  mode: LedgerMode,
  event: &TransferEvent,
  transfer: &Transfer,
) -> Result<(), Error<N>> {
  let sender = event.sender.as_ref().ok_or(LedgerError::MissingSender)?;

  store
    .get_token_info(&transfer.tick)
    .await
    .map_err(|e| Error::DataStore(e))?
    .ok_or(LedgerError::TickNotFound(transfer.tick.to_string()))?;

  let from_balance = balance_of(store, sender, transfer).await?;
  store
    .update_balance(sender, &from_balance.debit_transferable(&transfer.amt)?)
    .await
    .map_err(|e| Error::DataStore(e))?;

  // read after the sender update so a self-transfer sees the debit.
  let to_balance = store
    .get_balance(&event.receiver, &transfer.tick)
    .await
    .map_err(|e| Error::DataStore(e))?
    .unwrap_or_else(|| Balance::new(&transfer.tick));

  let to_balance = match mode {
    LedgerMode::Streaming => to_balance.credit_pending(&transfer.amt)?,
    LedgerMode::Batch => to_balance.credit_available(&transfer.amt)?,
  };

  store
    .update_balance(&event.receiver, &to_balance)
    .await
    .map_err(|e| Error::DataStore(e))?;

  Ok(())
}

async fn process_confirm_transfer<N: DataStoreReadWrite>(
  store: &N,
  event: &TransferEvent,
  transfer: &Transfer,
) -> Result<(), Error<N>> {
  let balance = balance_of(store, &event.receiver, transfer).await?;

  store
    .update_balance(&event.receiver, &balance.pending_to_available(&transfer.amt)?)
    .await
    .map_err(|e| Error::DataStore(e))?;

  Ok(())
}

async fn balance_of<N: DataStoreReadWrite>(
  store: &N,
  address: &str,
  transfer: &Transfer,
) -> Result<Balance, Error<N>> {
  Ok(
    store
      .get_balance(address, &transfer.tick)
      .await
      .map_err(|e| Error::DataStore(e))?
      .ok_or_else(|| LedgerError::BalanceNotFound {
        address: address.to_string(),
        tick: transfer.tick.to_string(),
      })?,
  )
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::{
    datastore::{Context, DataStoreReadOnly, MemoryStore, Tick},
    protocol::{drc20::Num, ProtocolKind},
    InscriptionId,
  };
  use bitcoin::{hashes::Hash, Txid};
  use pretty_assertions::assert_eq;
  use std::{str::FromStr, sync::Arc};

  fn store() -> Context<MemoryStore> {
    Context::new(Arc::new(MemoryStore::new()))
  }

  fn tick() -> Tick {
    Tick::from_str("ABCD").unwrap()
  }

  fn event(kind: TransferKind, receiver: &str, sender: Option<&str>) -> TransferEvent {
    TransferEvent {
      height: 100,
      tx_index: 1,
      input_index: 0,
      inscription_id: InscriptionId::from(Txid::from_byte_array([1; 32])),
      protocol: ProtocolKind::Token,
      subject: "abcd".to_string(),
      receiver: receiver.to_string(),
      sender: sender.map(str::to_string),
      kind,
      timestamp: 1_700_000_000,
      applied: false,
    }
  }

  fn deploy(max: u64, lim: u64) -> Operation {
    Operation::Deploy(Deploy {
      tick: tick(),
      max: Num::from(max),
      lim: Num::from(lim),
      dec: None,
    })
  }

  fn mint(amt: u64) -> Operation {
    Operation::Mint(Mint {
      tick: tick(),
      amt: Num::from(amt),
    })
  }

  fn transfer(amt: u64) -> Operation {
    Operation::Transfer(Transfer {
      tick: tick(),
      amt: Num::from(amt),
    })
  }

  async fn run(
    store: &Context<MemoryStore>,
    mode: LedgerMode,
    event: TransferEvent,
    op: Operation,
  ) -> Result<(), LedgerError> {
    match execute(store, mode, &event, &op).await {
      Ok(()) => Ok(()),
      Err(Error::Ledger(e)) => Err(e),
      Err(e) => panic!("unexpected error: {e}"),
    }
  }

  async fn balance(store: &Context<MemoryStore>, address: &str) -> (Num, Num, Num) {
    let balance = store
      .get_balance(address, &tick())
      .await
      .unwrap()
      .unwrap_or_else(|| Balance::new(&tick()));
    (balance.available, balance.transferable, balance.pending)
  }

  fn nums(available: u64, transferable: u64, pending: u64) -> (Num, Num, Num) {
    (
      Num::from(available),
      Num::from(transferable),
      Num::from(pending),
    )
  }

  #[tokio::test]
  async fn test_deploy_idempotence() {
    let store = store();
    run(&store, LedgerMode::Streaming, event(TransferKind::Deploy, "a", None), deploy(1000, 100))
      .await
      .unwrap();
    let first = store.get_token_info(&tick()).await.unwrap().unwrap();
    assert_eq!(first.supply, Num::zero());
    assert_eq!(first.deploy_by, "a");

    assert_eq!(
      run(&store, LedgerMode::Streaming, event(TransferKind::Deploy, "b", None), deploy(5, 5)).await,
      Err(LedgerError::DuplicateTick("abcd".to_string()))
    );
    assert_eq!(store.get_token_info(&tick()).await.unwrap().unwrap(), first);
  }

  #[tokio::test]
  async fn test_mint_cap() {
    let store = store();
    let mode = LedgerMode::Streaming;
    run(&store, mode, event(TransferKind::Deploy, "a", None), deploy(1000, 1000))
      .await
      .unwrap();

    run(&store, mode, event(TransferKind::Mint, "x", None), mint(50))
      .await
      .unwrap();
    run(&store, mode, event(TransferKind::Mint, "y", None), mint(1000))
      .await
      .unwrap();

    assert_eq!(balance(&store, "x").await, nums(50, 0, 0));
    assert_eq!(balance(&store, "y").await, nums(950, 0, 0));
    assert_eq!(
      store.get_token_info(&tick()).await.unwrap().unwrap().supply,
      Num::from(1000)
    );

    assert_eq!(
      run(&store, mode, event(TransferKind::Mint, "z", None), mint(1)).await,
      Err(LedgerError::TickMinted("abcd".to_string()))
    );
    assert_eq!(balance(&store, "z").await, nums(0, 0, 0));
  }

  #[tokio::test]
  async fn test_mint_above_limit() {
    let store = store();
    let mode = LedgerMode::Streaming;
    run(&store, mode, event(TransferKind::Deploy, "a", None), deploy(1000, 100))
      .await
      .unwrap();
    assert_eq!(
      run(&store, mode, event(TransferKind::Mint, "x", None), mint(101)).await,
      Err(LedgerError::AmountExceedLimit {
        amt: "101".to_string(),
        lim: "100".to_string(),
      })
    );
    assert_eq!(balance(&store, "x").await, nums(0, 0, 0));
  }

  #[tokio::test]
  async fn test_mint_unknown_tick() {
    let store = store();
    assert_eq!(
      run(&store, LedgerMode::Batch, event(TransferKind::Mint, "x", None), mint(1)).await,
      Err(LedgerError::TickNotFound("abcd".to_string()))
    );
  }

  #[tokio::test]
  async fn test_transfer_round_trip() {
    let store = store();
    let mode = LedgerMode::Streaming;
    run(&store, mode, event(TransferKind::Deploy, "a", None), deploy(1000, 100))
      .await
      .unwrap();
    run(&store, mode, event(TransferKind::Mint, "a", None), mint(100))
      .await
      .unwrap();
    run(&store, mode, event(TransferKind::MarkTransferable, "a", None), transfer(40))
      .await
      .unwrap();
    assert_eq!(balance(&store, "a").await, nums(60, 40, 0));

    run(&store, mode, event(TransferKind::PendingTransfer, "b", Some("a")), transfer(40))
      .await
      .unwrap();
    assert_eq!(balance(&store, "a").await, nums(60, 0, 0));
    assert_eq!(balance(&store, "b").await, nums(0, 0, 40));

    run(&store, mode, event(TransferKind::ConfirmedTransfer, "b", Some("a")), transfer(40))
      .await
      .unwrap();
    assert_eq!(balance(&store, "b").await, nums(40, 0, 0));
    assert_eq!(
      store.get_token_info(&tick()).await.unwrap().unwrap().supply,
      Num::from(100)
    );
  }

  #[tokio::test]
  async fn test_batch_transfer_credits_available() {
    let store = store();
    let mode = LedgerMode::Batch;
    run(&store, mode, event(TransferKind::Deploy, "a", None), deploy(1000, 100))
      .await
      .unwrap();
    run(&store, mode, event(TransferKind::Mint, "a", None), mint(100))
      .await
      .unwrap();
    run(&store, mode, event(TransferKind::MarkTransferable, "a", None), transfer(30))
      .await
      .unwrap();
    run(&store, mode, event(TransferKind::PendingTransfer, "b", Some("a")), transfer(30))
      .await
      .unwrap();
    assert_eq!(balance(&store, "b").await, nums(30, 0, 0));
  }

  #[tokio::test]
  async fn test_transfer_exceeding_transferable_is_noop() {
    let store = store();
    let mode = LedgerMode::Streaming;
    run(&store, mode, event(TransferKind::Deploy, "a", None), deploy(1000, 100))
      .await
      .unwrap();
    run(&store, mode, event(TransferKind::Mint, "a", None), mint(100))
      .await
      .unwrap();
    run(&store, mode, event(TransferKind::MarkTransferable, "a", None), transfer(10))
      .await
      .unwrap();

    assert!(matches!(
      run(&store, mode, event(TransferKind::PendingTransfer, "b", Some("a")), transfer(11)).await,
      Err(LedgerError::InsufficientBalance { .. })
    ));
    assert_eq!(balance(&store, "a").await, nums(90, 10, 0));
    assert_eq!(balance(&store, "b").await, nums(0, 0, 0));

    assert!(matches!(
      run(&store, mode, event(TransferKind::MarkTransferable, "a", None), transfer(91)).await,
      Err(LedgerError::InsufficientBalance { .. })
    ));
    assert_eq!(balance(&store, "a").await, nums(90, 10, 0));
  }

  #[tokio::test]
  async fn test_self_transfer() {
    let store = store();
    let mode = LedgerMode::Streaming;
    run(&store, mode, event(TransferKind::Deploy, "a", None), deploy(1000, 100))
      .await
      .unwrap();
    run(&store, mode, event(TransferKind::Mint, "a", None), mint(100))
      .await
      .unwrap();
    run(&store, mode, event(TransferKind::MarkTransferable, "a", None), transfer(25))
      .await
      .unwrap();
    run(&store, mode, event(TransferKind::PendingTransfer, "a", Some("a")), transfer(25))
      .await
      .unwrap();
    assert_eq!(balance(&store, "a").await, nums(75, 0, 25));
  }

  #[tokio::test]
  async fn test_unexpected_content() {
    let store = store();
    assert!(matches!(
      run(&store, LedgerMode::Streaming, event(TransferKind::Mint, "a", None), transfer(1)).await,
      Err(LedgerError::UnexpectedContent(_))
    ));
  }
}
