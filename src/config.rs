use crate::protocol::ProtocolKind;
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub const FIRST_INSCRIPTION_HEIGHT: u64 = 4_609_723;
pub const CONFIRMATION_DELAY: u64 = 12;
pub const SNAPSHOT_INTERVAL: u64 = 50;
pub const SNAPSHOT_RETENTION: usize = 10;
pub const STARTUP_SNAPSHOT_INTERVAL: u64 = 10_000;
pub const POLL_INTERVAL: Duration = Duration::from_secs(10);
pub const RPC_POOL_SIZE: usize = 16;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
pub enum Network {
  #[default]
  Mainnet,
  Testnet,
}

impl Network {
  pub fn p2pkh_prefix(self) -> u8 {
    match self {
      Self::Mainnet => 0x1e,
      Self::Testnet => 0x71,
    }
  }

  pub fn p2sh_prefix(self) -> u8 {
    match self {
      Self::Mainnet => 0x16,
      Self::Testnet => 0xc4,
    }
  }
}

/// Indexer settings, built once at startup and handed to every component by
/// reference.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
  pub network: Network,
  /// Height the startup replay begins at when nothing has been indexed yet.
  pub first_inscription_height: u64,
  /// Upper bound of the startup replay. Defaults to the chain tip minus
  /// `blocks_behind`.
  pub last_startup_height: Option<u64>,
  /// Blocks between a pending event and its confirmation.
  pub confirmation_delay: u64,
  /// Protocols to index. Empty means all of them.
  pub protocols: Vec<ProtocolKind>,
  pub blocks_behind: u64,
  pub snapshot_interval: u64,
  pub snapshot_retention: usize,
  pub startup_snapshot_interval: u64,
  /// Keep applied genesis and pending transfer events instead of purging
  /// them. Confirmations are never kept.
  pub retain_history: bool,
  pub workers: usize,
  pub poll_interval: Duration,
}

impl Config {
  pub fn is_protocol_enabled(&self, protocol: ProtocolKind) -> bool {
    self.protocols.is_empty() || self.protocols.contains(&protocol)
  }

  /// Deepest reorg that can still be traced back through stored block hashes.
  pub fn reorg_window(&self) -> u64 {
    let retention = u64::try_from(self.snapshot_retention).unwrap_or(u64::MAX);
    self.snapshot_interval.saturating_mul(retention.max(1))
  }
}

impl Default for Config {
  fn default() -> Self {
    Self {
      network: Network::Mainnet,
      first_inscription_height: FIRST_INSCRIPTION_HEIGHT,
      last_startup_height: None,
      confirmation_delay: CONFIRMATION_DELAY,
      protocols: Vec::new(),
      blocks_behind: 0,
      snapshot_interval: SNAPSHOT_INTERVAL,
      snapshot_retention: SNAPSHOT_RETENTION,
      startup_snapshot_interval: STARTUP_SNAPSHOT_INTERVAL,
      retain_history: false,
      workers: std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(8),
      poll_interval: POLL_INTERVAL,
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_empty_protocol_list_enables_all() {
    let config = Config::default();
    assert!(config.is_protocol_enabled(ProtocolKind::Token));
    assert!(config.is_protocol_enabled(ProtocolKind::Chunked));
  }

  #[test]
  fn test_protocol_allow_list() {
    let config = Config {
      protocols: vec![ProtocolKind::Name],
      ..Default::default()
    };
    assert!(config.is_protocol_enabled(ProtocolKind::Name));
    assert!(!config.is_protocol_enabled(ProtocolKind::Token));
  }

  #[test]
  fn test_address_prefixes() {
    assert_eq!(Network::Mainnet.p2pkh_prefix(), 0x1e);
    assert_eq!(Network::Mainnet.p2sh_prefix(), 0x16);
    assert_eq!(Network::Testnet.p2pkh_prefix(), 0x71);
  }
}
