pub(crate) mod carrier;
pub mod chunk;
pub mod dns;
pub mod dogemap;
pub mod drc20;
pub mod envelope;
mod error;
pub mod extractor;
mod inscription;
pub mod ledger;
pub(crate) mod ownership;
pub mod protocol_manager;
pub mod scheduler;

pub use self::{
  chunk::{ChunkChain, ChunkWalker},
  error::{Error, JsonError},
  inscription::{ChunkedAsset, Content, Inscription},
  ledger::{LedgerMode, Outcome, Receipt},
  protocol_manager::{BlockSummary, ProtocolManager},
};

use crate::config::Network;
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::fmt::{self, Display, Formatter};

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct BlockContext {
  pub network: Network,
  pub blockheight: u64,
  pub blocktime: u32,
}

/// The four Doginals sub-protocols.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, ValueEnum)]
pub enum ProtocolKind {
  #[value(name = "drc20")]
  Token,
  #[value(name = "dns")]
  Name,
  #[value(name = "dogemap")]
  Numbered,
  #[value(name = "nft")]
  Chunked,
}

impl ProtocolKind {
  /// Short code used in storage keys.
  pub fn short(self) -> &'static str {
    match self {
      Self::Token => "t",
      Self::Name => "d",
      Self::Numbered => "m",
      Self::Chunked => "n",
    }
  }
}

impl Display for ProtocolKind {
  fn fmt(&self, f: &mut Formatter) -> fmt::Result {
    let name = match self {
      Self::Token => "drc20",
      Self::Name => "dns",
      Self::Numbered => "dogemap",
      Self::Chunked => "nft",
    };
    f.write_str(name)
  }
}
