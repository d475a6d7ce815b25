use crate::{protocol::ProtocolKind, InscriptionId};
use serde::{Deserialize, Serialize};

/// Holder record of a name, a number or a chunked asset.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Ownership {
  pub protocol: ProtocolKind,
  pub key: String,
  pub address: String,
  pub inscription_id: InscriptionId,
  pub pending: bool,
  pub timestamp: u32,
}

impl Ownership {
  pub fn confirm(&self) -> Self {
    Self {
      pending: false,
      ..self.clone()
    }
  }
}
