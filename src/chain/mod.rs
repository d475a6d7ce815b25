//! Access to the Dogecoin chain.

mod block;
mod pool;
mod rpc;

pub use self::{block::decode_block, pool::ChainClientPool, rpc::RpcChainClient};
use crate::Result;
use async_trait::async_trait;
use bitcoin::{Block, BlockHash};

#[async_trait]
pub trait ChainClient: Send + Sync {
  async fn block_by_height(&self, height: u64) -> Result<Option<Block>>;
  async fn block_by_hash(&self, hash: &BlockHash) -> Result<Option<Block>>;
  async fn block_height(&self, hash: &BlockHash) -> Result<Option<u64>>;
  async fn block_hash(&self, height: u64) -> Result<Option<BlockHash>>;
  /// Height of the best block.
  async fn chain_tip(&self) -> Result<u64>;
}
