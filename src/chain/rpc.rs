use super::{decode_block, ChainClient};
use crate::Result;
use async_trait::async_trait;
use bitcoin::{Block, BlockHash};
use bitcoincore_rpc::{Auth, Client, RpcApi};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;

trait BitcoinCoreRpcResultExt<T> {
  fn into_option(self) -> Result<Option<T>>;
}

impl<T> BitcoinCoreRpcResultExt<T> for Result<T, bitcoincore_rpc::Error> {
  fn into_option(self) -> Result<Option<T>> {
    match self {
      Ok(ok) => Ok(Some(ok)),
      Err(bitcoincore_rpc::Error::JsonRpc(bitcoincore_rpc::jsonrpc::error::Error::Rpc(
        bitcoincore_rpc::jsonrpc::error::RpcError { code: -8 | -5, .. },
      ))) => Ok(None),
      Err(bitcoincore_rpc::Error::JsonRpc(bitcoincore_rpc::jsonrpc::error::Error::Rpc(
        bitcoincore_rpc::jsonrpc::error::RpcError { message, .. },
      )))
        if message.ends_with("not found") =>
      {
        Ok(None)
      }
      Err(err) => Err(err.into()),
    }
  }
}

#[derive(Deserialize)]
struct HeaderInfo {
  height: u64,
}

/// Dogecoin Core JSON-RPC client. Blocks are fetched raw and decoded locally.
pub struct RpcChainClient {
  client: Arc<Client>,
}

impl RpcChainClient {
  pub fn new(url: &str, user: Option<String>, pass: Option<String>) -> Result<Self> {
    let auth = match (user, pass) {
      (Some(user), Some(pass)) => Auth::UserPass(user, pass),
      _ => Auth::None,
    };
    Ok(Self {
      client: Arc::new(Client::new(url, auth)?),
    })
  }

  /// Runs a blocking RPC call off the async runtime.
  async fn call<T, F>(&self, f: F) -> Result<T>
  where
    F: FnOnce(&Client) -> Result<T> + Send + 'static,
    T: Send + 'static,
  {
    let client = self.client.clone();
    tokio::task::spawn_blocking(move || f(&client)).await?
  }
}

#[async_trait]
impl ChainClient for RpcChainClient {
  async fn block_by_height(&self, height: u64) -> Result<Option<Block>> {
    match self.block_hash(height).await? {
      Some(hash) => self.block_by_hash(&hash).await,
      None => Ok(None),
    }
  }

  async fn block_by_hash(&self, hash: &BlockHash) -> Result<Option<Block>> {
    let hash = hash.to_string();
    let raw = self
      .call(move |client| {
        client
          .call::<String>("getblock", &[json!(hash), json!(false)])
          .into_option()
      })
      .await?;

    match raw {
      Some(raw) => Ok(Some(decode_block(&hex::decode(raw)?)?)),
      None => Ok(None),
    }
  }

  async fn block_height(&self, hash: &BlockHash) -> Result<Option<u64>> {
    let hash = hash.to_string();
    let info = self
      .call(move |client| {
        client
          .call::<HeaderInfo>("getblockheader", &[json!(hash), json!(true)])
          .into_option()
      })
      .await?;
    Ok(info.map(|info| info.height))
  }

  async fn block_hash(&self, height: u64) -> Result<Option<BlockHash>> {
    self
      .call(move |client| client.get_block_hash(height).into_option())
      .await
  }

  async fn chain_tip(&self) -> Result<u64> {
    self
      .call(|client| Ok(client.get_block_count()?))
      .await
  }
}
