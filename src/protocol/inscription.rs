use super::{dns::Registration, dogemap::Claim, drc20::Operation, ProtocolKind};
use crate::InscriptionId;
use bitcoin::Txid;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Inscription {
  pub id: InscriptionId,
  pub content_type: String,
  pub height: u64,
  pub timestamp: u32,
  pub content: Content,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(tag = "protocol", content = "content", rename_all = "lowercase")]
pub enum Content {
  Token(Operation),
  Name(Registration),
  Numbered(Claim),
  Chunked(ChunkedAsset),
}

/// Transactions of a chunked payload. `complete` never goes back to false.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ChunkedAsset {
  pub txids: Vec<Txid>,
  pub complete: bool,
}

impl ChunkedAsset {
  pub fn extend(&mut self, txids: impl IntoIterator<Item = Txid>, complete: bool) {
    for txid in txids {
      if !self.txids.contains(&txid) {
        self.txids.push(txid);
      }
    }
    self.complete |= complete;
  }

  pub fn tail(&self) -> Option<Txid> {
    self.txids.last().copied()
  }
}

impl Inscription {
  pub fn protocol(&self) -> ProtocolKind {
    match self.content {
      Content::Token(_) => ProtocolKind::Token,
      Content::Name(_) => ProtocolKind::Name,
      Content::Numbered(_) => ProtocolKind::Numbered,
      Content::Chunked(_) => ProtocolKind::Chunked,
    }
  }

  /// Key an ownership record is held under. Tokens have none.
  pub fn ownership_key(&self) -> Option<String> {
    match &self.content {
      Content::Token(_) => None,
      Content::Name(registration) => Some(registration.name.clone()),
      Content::Numbered(claim) => Some(claim.number.to_string()),
      Content::Chunked(_) => Some(self.id.to_string()),
    }
  }

  /// Name the inscription's events are filed under.
  pub fn subject(&self) -> String {
    match &self.content {
      Content::Token(operation) => operation.tick().to_string(),
      _ => self.ownership_key().unwrap_or_default(),
    }
  }

  /// Whether output 0 of the genesis transaction carries the inscription.
  pub fn is_watched(&self) -> bool {
    match &self.content {
      Content::Token(operation) => matches!(operation, Operation::Transfer(_)),
      Content::Name(_) | Content::Numbered(_) => true,
      Content::Chunked(asset) => !asset.complete,
    }
  }
}
