use super::{drc20::Operation, BlockContext, Content, Inscription, LedgerMode};
use crate::{
  datastore::{DataStoreReadWrite, TransferEvent, TransferKind},
  Config,
};

/// An inscription moving to `receiver`, raised either by its genesis or by a
/// carrier spend. `sender` is `None` for genesis events and registrations.
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
  pub inscription: Inscription,
  pub tx_index: u32,
  pub input_index: u32,
  pub receiver: String,
  pub sender: Option<String>,
}

impl Candidate {
  /// Kind of the event raised when the inscription is revealed.
  pub fn genesis_kind(inscription: &Inscription) -> Option<TransferKind> {
    match &inscription.content {
      Content::Token(Operation::Deploy(_)) => Some(TransferKind::Deploy),
      Content::Token(Operation::Mint(_)) => Some(TransferKind::Mint),
      Content::Token(Operation::Transfer(_)) => Some(TransferKind::MarkTransferable),
      Content::Name(_) => Some(TransferKind::PendingName),
      Content::Numbered(_) => Some(TransferKind::PendingNumbered),
      Content::Chunked(asset) if asset.complete => Some(TransferKind::PendingChunked),
      Content::Chunked(_) => None,
    }
  }

  pub fn event(&self, kind: TransferKind, context: BlockContext) -> TransferEvent {
    TransferEvent {
      height: context.blockheight,
      tx_index: self.tx_index,
      input_index: self.input_index,
      inscription_id: self.inscription.id,
      protocol: self.inscription.protocol(),
      subject: self.inscription.subject(),
      receiver: self.receiver.clone(),
      sender: self.sender.clone(),
      kind,
      timestamp: context.blocktime,
      applied: false,
    }
  }

  fn is_complete(&self) -> bool {
    match &self.inscription.content {
      Content::Chunked(asset) => asset.complete,
      _ => true,
    }
  }
}

/// Records the event of `kind` for `candidate`. In streaming mode a pending
/// event also schedules its confirmation `confirmation_delay` blocks later.
/// Events already stored under the same key are left untouched.
pub async fn schedule<N: DataStoreReadWrite>(
  store: &N,
  config: &Config,
  mode: LedgerMode,
  context: BlockContext,
  candidate: &Candidate,
  kind: TransferKind,
) -> Result<Vec<TransferEvent>, N::Error> {
  let event = candidate.event(kind, context);
  let mut events = vec![event.clone()];

  if mode == LedgerMode::Streaming && candidate.is_complete() {
    if let Some(confirmed) = kind.confirmed() {
      events.push(TransferEvent {
        height: event.height + config.confirmation_delay,
        kind: confirmed,
        ..event
      });
    }
  }

  let mut recorded = Vec::with_capacity(events.len());
  for event in events {
    if store.get_event(&event.key()).await?.is_some() {
      log::debug!("event {} already recorded", event.key());
      continue;
    }
    store.save_event(&event).await?;
    recorded.push(event);
  }

  Ok(recorded)
}
