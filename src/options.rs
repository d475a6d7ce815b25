use crate::{config, protocol::ProtocolKind, Config, Network, Result};
use anyhow::anyhow;
use clap::Parser;
use log::LevelFilter;
use std::{path::PathBuf, str::FromStr, time::Duration};

#[derive(Clone, Default, Debug, Parser)]
pub(crate) struct Options {
  #[arg(long, value_enum, default_value_t, help = "Index <NETWORK>.")]
  pub(crate) network: Network,
  #[arg(long, help = "Store the index in <DATA_DIR>.")]
  pub(crate) data_dir: Option<PathBuf>,
  #[arg(long, help = "Write logs to <LOG_DIR>. Defaults to <DATA_DIR>/logs.")]
  pub(crate) log_dir: Option<PathBuf>,
  #[arg(long, default_value = "info", help = "Log at <LOG_LEVEL>.")]
  pub(crate) log_level: String,
  #[arg(
    long,
    default_value = "http://127.0.0.1:22555",
    help = "Connect to Dogecoin Core RPC at <RPC_URL>."
  )]
  pub(crate) rpc_url: String,
  #[arg(long, help = "Authenticate to Dogecoin Core RPC as <RPC_USER>.")]
  pub(crate) rpc_user: Option<String>,
  #[arg(long, help = "Authenticate to Dogecoin Core RPC with <RPC_PASS>.")]
  pub(crate) rpc_pass: Option<String>,
  #[arg(long, help = "Allow at most <RPC_POOL_SIZE> concurrent RPC requests. [default: 16]")]
  pub(crate) rpc_pool_size: Option<usize>,
  #[arg(
    long,
    help = "Give up on an RPC request after <RPC_MAX_RETRIES> retries. Retries forever by default."
  )]
  pub(crate) rpc_max_retries: Option<u32>,
  #[arg(long, help = "Start indexing at <FIRST_INSCRIPTION_HEIGHT>.")]
  pub(crate) first_inscription_height: Option<u64>,
  #[arg(long, help = "Stop the startup replay at <LAST_STARTUP_HEIGHT>.")]
  pub(crate) last_startup_height: Option<u64>,
  #[arg(long, help = "Confirm pending transfers after <CONFIRMATION_DELAY> blocks.")]
  pub(crate) confirmation_delay: Option<u64>,
  #[arg(
    long,
    value_enum,
    value_delimiter = ',',
    help = "Only index <PROTOCOLS>. Defaults to all of them."
  )]
  pub(crate) protocols: Vec<ProtocolKind>,
  #[arg(long, help = "Stay <BLOCKS_BEHIND> blocks behind the chain tip.")]
  pub(crate) blocks_behind: Option<u64>,
  #[arg(long, help = "Snapshot the index every <SNAPSHOT_INTERVAL> blocks.")]
  pub(crate) snapshot_interval: Option<u64>,
  #[arg(long, help = "Keep at most <SNAPSHOT_RETENTION> snapshots.")]
  pub(crate) snapshot_retention: Option<usize>,
  #[arg(long, help = "Snapshot every <STARTUP_SNAPSHOT_INTERVAL> blocks during startup.")]
  pub(crate) startup_snapshot_interval: Option<u64>,
  #[arg(long, help = "Keep applied transfer events.")]
  pub(crate) retain_history: bool,
  #[arg(long, help = "Extract inscriptions with <WORKERS> parallel tasks.")]
  pub(crate) workers: Option<usize>,
  #[arg(long, help = "Poll the chain tip every <POLL_INTERVAL> seconds.")]
  pub(crate) poll_interval: Option<u64>,
}

impl Options {
  pub(crate) fn config(&self) -> Config {
    let defaults = Config::default();
    Config {
      network: self.network,
      first_inscription_height: self
        .first_inscription_height
        .unwrap_or(defaults.first_inscription_height),
      last_startup_height: self.last_startup_height,
      confirmation_delay: self
        .confirmation_delay
        .unwrap_or(defaults.confirmation_delay),
      protocols: self.protocols.clone(),
      blocks_behind: self.blocks_behind.unwrap_or(defaults.blocks_behind),
      snapshot_interval: self.snapshot_interval.unwrap_or(defaults.snapshot_interval),
      snapshot_retention: self
        .snapshot_retention
        .unwrap_or(defaults.snapshot_retention),
      startup_snapshot_interval: self
        .startup_snapshot_interval
        .unwrap_or(defaults.startup_snapshot_interval),
      retain_history: self.retain_history,
      workers: self.workers.unwrap_or(defaults.workers),
      poll_interval: self
        .poll_interval
        .map(Duration::from_secs)
        .unwrap_or(defaults.poll_interval),
    }
  }

  pub(crate) fn rpc_pool_size(&self) -> usize {
    self.rpc_pool_size.unwrap_or(config::RPC_POOL_SIZE)
  }

  pub(crate) fn data_dir(&self) -> Result<PathBuf> {
    let base = match &self.data_dir {
      Some(data_dir) => return Ok(data_dir.clone()),
      None => dirs::data_dir()
        .ok_or_else(|| anyhow!("failed to retrieve data dir"))?
        .join("doginals"),
    };

    Ok(match self.network {
      Network::Mainnet => base,
      Network::Testnet => base.join("testnet"),
    })
  }

  pub(crate) fn log_dir(&self) -> Result<PathBuf> {
    match &self.log_dir {
      Some(log_dir) => Ok(log_dir.clone()),
      None => Ok(self.data_dir()?.join("logs")),
    }
  }

  pub(crate) fn log_level(&self) -> LevelFilter {
    LevelFilter::from_str(&self.log_level).unwrap_or(LevelFilter::Info)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn parse(args: &[&str]) -> Options {
    Options::try_parse_from(std::iter::once("doginals").chain(args.iter().copied())).unwrap()
  }

  #[test]
  fn test_defaults() {
    let options = parse(&[]);
    assert_eq!(options.config(), Config::default());
    assert_eq!(options.rpc_pool_size(), 16);
    assert_eq!(options.rpc_max_retries, None);
    assert_eq!(options.log_level(), LevelFilter::Info);
  }

  #[test]
  fn test_overrides() {
    let options = parse(&[
      "--network",
      "testnet",
      "--protocols",
      "drc20,dns",
      "--confirmation-delay",
      "3",
      "--retain-history",
      "--poll-interval",
      "1",
      "--log-level",
      "debug",
      "--rpc-max-retries",
      "6",
    ]);
    let config = options.config();
    assert_eq!(config.network, Network::Testnet);
    assert_eq!(config.protocols, vec![ProtocolKind::Token, ProtocolKind::Name]);
    assert_eq!(config.confirmation_delay, 3);
    assert!(config.retain_history);
    assert_eq!(config.poll_interval, Duration::from_secs(1));
    assert_eq!(options.log_level(), LevelFilter::Debug);
    assert_eq!(options.rpc_max_retries, Some(6));
  }

  #[test]
  fn test_data_dir_per_network() {
    let options = parse(&["--data-dir", "/tmp/doginals"]);
    assert_eq!(options.data_dir().unwrap(), PathBuf::from("/tmp/doginals"));
    assert_eq!(
      options.log_dir().unwrap(),
      PathBuf::from("/tmp/doginals/logs")
    );
  }
}
