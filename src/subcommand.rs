use crate::{
  chain::{ChainClientPool, RpcChainClient},
  datastore::RedbStore,
  index::Index,
  options::Options,
  Result, SHUTTING_DOWN,
};
use anyhow::Context as _;
use clap::Parser;
use std::{fs, sync::Arc};

const INDEX_FILE: &str = "index.redb";

#[derive(Debug, Parser)]
pub(crate) enum Subcommand {
  #[command(about = "Replay settled history in batch mode, then exit")]
  Startup,
  #[command(about = "Follow the chain tip in streaming mode")]
  Daemon,
  #[command(about = "Replay settled history, then follow the chain tip")]
  Run,
}

impl Subcommand {
  pub(crate) fn run(self, options: Options) -> Result {
    let config = Arc::new(options.config());
    log::info!("starting {:?} with {:?}", self, config);

    let data_dir = options.data_dir()?;
    fs::create_dir_all(&data_dir)
      .with_context(|| format!("failed to create data dir `{}`", data_dir.display()))?;
    let store = Arc::new(
      RedbStore::open(data_dir.join(INDEX_FILE))
        .with_context(|| format!("failed to open index at `{}`", data_dir.display()))?,
    );

    let client = RpcChainClient::new(
      &options.rpc_url,
      options.rpc_user.clone(),
      options.rpc_pass.clone(),
    )?;
    let client = Arc::new(client);
    let chain = Arc::new(match options.rpc_max_retries {
      Some(max_retries) => ChainClientPool::bounded(client, options.rpc_pool_size(), max_retries),
      None => ChainClientPool::new(client, options.rpc_pool_size()),
    });

    let runtime = tokio::runtime::Builder::new_multi_thread()
      .enable_all()
      .build()?;

    runtime.block_on(async move {
      let mut index = Index::new(store, chain, config);
      match self {
        Self::Startup => index.startup(&SHUTTING_DOWN).await,
        Self::Daemon => index.daemon(&SHUTTING_DOWN).await,
        Self::Run => {
          index.startup(&SHUTTING_DOWN).await?;
          index.daemon(&SHUTTING_DOWN).await
        }
      }
    })
  }
}
