use crate::{datastore::keys, protocol::ProtocolKind, InscriptionId};
use serde::{Deserialize, Serialize};

/// An unspent output currently holding an inscription.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Carrier {
  pub inscription_id: InscriptionId,
  pub address: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TransferKind {
  Deploy,
  Mint,
  MarkTransferable,
  PendingTransfer,
  PendingName,
  PendingNumbered,
  PendingChunked,
  ConfirmedTransfer,
  ConfirmedName,
  ConfirmedNumbered,
  ConfirmedChunked,
}

impl TransferKind {
  pub fn code(self) -> &'static str {
    match self {
      Self::Deploy => "deploy",
      Self::Mint => "mint",
      Self::MarkTransferable => "inscribe_transfer",
      Self::PendingTransfer => "pending_transfer",
      Self::PendingName => "pending_dns",
      Self::PendingNumbered => "pending_dogemap",
      Self::PendingChunked => "pending_nft",
      Self::ConfirmedTransfer => "transfer",
      Self::ConfirmedName => "dns",
      Self::ConfirmedNumbered => "dogemap",
      Self::ConfirmedChunked => "nft",
    }
  }

  /// The pending kind a spend of a `protocol` carrier produces.
  pub fn pending(protocol: ProtocolKind) -> Self {
    match protocol {
      ProtocolKind::Token => Self::PendingTransfer,
      ProtocolKind::Name => Self::PendingName,
      ProtocolKind::Numbered => Self::PendingNumbered,
      ProtocolKind::Chunked => Self::PendingChunked,
    }
  }

  /// The confirmation companion of a pending kind.
  pub fn confirmed(self) -> Option<Self> {
    match self {
      Self::PendingTransfer => Some(Self::ConfirmedTransfer),
      Self::PendingName => Some(Self::ConfirmedName),
      Self::PendingNumbered => Some(Self::ConfirmedNumbered),
      Self::PendingChunked => Some(Self::ConfirmedChunked),
      Self::Deploy
      | Self::Mint
      | Self::MarkTransferable
      | Self::ConfirmedTransfer
      | Self::ConfirmedName
      | Self::ConfirmedNumbered
      | Self::ConfirmedChunked => None,
    }
  }

  pub fn is_confirmed(self) -> bool {
    matches!(
      self,
      Self::ConfirmedTransfer
        | Self::ConfirmedName
        | Self::ConfirmedNumbered
        | Self::ConfirmedChunked
    )
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct TransferEvent {
  pub height: u64,
  pub tx_index: u32,
  pub input_index: u32,
  pub inscription_id: InscriptionId,
  pub protocol: ProtocolKind,
  /// Tick, name, number or inscription id the event is filed under.
  pub subject: String,
  pub receiver: String,
  pub sender: Option<String>,
  pub kind: TransferKind,
  pub timestamp: u32,
  #[serde(default)]
  pub applied: bool,
}

impl TransferEvent {
  pub fn key(&self) -> String {
    keys::event(
      self.height,
      self.tx_index,
      self.input_index,
      self.kind,
      &self.inscription_id,
    )
  }

  /// Events raised by a spend sort after those raised by a genesis in the
  /// same transaction.
  pub fn order(&self) -> (bool, u32, bool, u32) {
    (
      !self.kind.is_confirmed(),
      self.tx_index,
      self.sender.is_some(),
      self.input_index,
    )
  }
}
