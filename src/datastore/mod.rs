mod address;
mod context;
pub mod drc20;
mod errors;
pub mod keys;
pub mod kv;
pub mod ord;
pub mod ownership;

pub use self::{
  address::address_from_script,
  context::Context,
  drc20::{Balance, Tick, TokenInfo},
  errors::LedgerError,
  kv::{KvStore, MemoryStore, RedbStore, SnapshotStore, StoreError},
  ord::{Carrier, TransferEvent, TransferKind},
  ownership::Ownership,
};
use crate::{
  protocol::{Inscription, ProtocolKind},
  InscriptionId,
};
use async_trait::async_trait;
use bitcoin::{BlockHash, OutPoint};
use std::fmt::{Debug, Display};

#[async_trait]
pub trait DataStoreReadOnly: Send + Sync {
  type Error: Debug + Display + Send + Sync;

  // INSCRIPTIONS
  async fn get_inscription(&self, id: &InscriptionId) -> Result<Option<Inscription>, Self::Error>;

  // CARRIERS
  async fn get_carrier(&self, outpoint: &OutPoint) -> Result<Option<Carrier>, Self::Error>;

  // TRANSFER EVENTS
  async fn get_event(&self, key: &str) -> Result<Option<TransferEvent>, Self::Error>;
  async fn get_block_events(&self, height: u64) -> Result<Vec<TransferEvent>, Self::Error>;
  /// Retained genesis and pending events of one subject. Confirmations are
  /// not part of the history.
  async fn get_history(
    &self,
    protocol: ProtocolKind,
    subject: &str,
  ) -> Result<Vec<TransferEvent>, Self::Error>;

  // DRC20
  async fn get_token_info(&self, tick: &Tick) -> Result<Option<TokenInfo>, Self::Error>;
  async fn get_tokens_info(&self) -> Result<Vec<TokenInfo>, Self::Error>;
  async fn get_balance(&self, address: &str, tick: &Tick) -> Result<Option<Balance>, Self::Error>;
  async fn get_balances(&self, address: &str) -> Result<Vec<Balance>, Self::Error>;
  /// Holders of `tick`, largest total first.
  async fn get_holders(&self, tick: &Tick) -> Result<Vec<(String, f64)>, Self::Error>;

  // OWNERSHIP
  async fn get_owner(
    &self,
    protocol: ProtocolKind,
    key: &str,
  ) -> Result<Option<Ownership>, Self::Error>;
  async fn get_ownerships(
    &self,
    protocol: ProtocolKind,
    address: &str,
  ) -> Result<Vec<Ownership>, Self::Error>;

  // CHECKPOINTS
  async fn get_last_height(&self) -> Result<Option<u64>, Self::Error>;
  async fn get_read_model_height(&self) -> Result<Option<u64>, Self::Error>;
  async fn get_block_hash(&self, height: u64) -> Result<Option<BlockHash>, Self::Error>;
}

#[async_trait]
pub trait DataStoreReadWrite: DataStoreReadOnly {
  // INSCRIPTIONS
  async fn save_inscription(&self, inscription: &Inscription) -> Result<(), Self::Error>;

  // CARRIERS
  async fn insert_carrier(&self, outpoint: &OutPoint, carrier: &Carrier)
    -> Result<(), Self::Error>;
  async fn remove_carrier(&self, outpoint: &OutPoint) -> Result<(), Self::Error>;

  // TRANSFER EVENTS
  async fn save_event(&self, event: &TransferEvent) -> Result<(), Self::Error>;
  async fn remove_event(&self, event: &TransferEvent) -> Result<(), Self::Error>;

  // DRC20
  async fn insert_token_info(&self, info: &TokenInfo) -> Result<(), Self::Error>;
  async fn update_token_info(&self, info: &TokenInfo) -> Result<(), Self::Error>;
  async fn update_balance(&self, address: &str, balance: &Balance) -> Result<(), Self::Error>;

  // OWNERSHIP
  async fn insert_ownership(&self, ownership: &Ownership) -> Result<(), Self::Error>;
  async fn remove_ownership(&self, ownership: &Ownership) -> Result<(), Self::Error>;

  // CHECKPOINTS
  async fn set_last_block(&self, height: u64, hash: &BlockHash) -> Result<(), Self::Error>;
  async fn set_read_model_height(&self, height: u64) -> Result<(), Self::Error>;
  async fn remove_block_hash(&self, height: u64) -> Result<(), Self::Error>;
}
