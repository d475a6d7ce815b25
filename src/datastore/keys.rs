//! Logical keyspace shared by every `KvStore` backend.

use super::TransferKind;
use crate::{protocol::ProtocolKind, InscriptionId};
use bitcoin::OutPoint;

pub const TOKEN_LIST: &str = "tl";
pub const LAST_HEIGHT: &str = "b:it:l";
pub const READ_MODEL_HEIGHT: &str = "b:rm:l";

pub fn inscription(id: &InscriptionId) -> String {
  format!("i:{id}")
}

pub fn carrier(outpoint: &OutPoint) -> String {
  format!("o:{}:{}", outpoint.txid, outpoint.vout)
}

pub fn event(
  height: u64,
  tx_index: u32,
  input_index: u32,
  kind: TransferKind,
  id: &InscriptionId,
) -> String {
  format!("it:{height}:{tx_index}:{input_index}:{}:{id}", kind.code())
}

pub fn block_events(height: u64) -> String {
  format!("it:b:{height}")
}

pub fn history(protocol: ProtocolKind, name: &str) -> String {
  format!("it:{}:{name}", protocol.short())
}

pub fn token(tick: &str) -> String {
  format!("t:{tick}")
}

pub fn balance(address: &str, tick: &str) -> String {
  format!("bd:{address}:{tick}")
}

pub fn address_tokens(address: &str) -> String {
  format!("ub:t:{address}")
}

pub fn holders(tick: &str) -> String {
  format!("tb:{tick}")
}

pub fn address_ownerships(protocol: ProtocolKind, address: &str) -> String {
  format!("ub:{}:{address}", protocol.short())
}

pub fn owner(protocol: ProtocolKind, key: &str) -> String {
  format!("own:{}:{key}", protocol.short())
}

pub fn block_hash(height: u64) -> String {
  format!("b:h:{height}")
}
