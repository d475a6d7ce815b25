use super::ChainClient;
use crate::{Result, SHUTTING_DOWN};
use async_trait::async_trait;
use bitcoin::{Block, BlockHash};
use std::{
  future::Future,
  sync::{atomic::Ordering, Arc},
  time::Duration,
};
use tokio::sync::{Semaphore, SemaphorePermit};

pub const RETRY_BACKOFF: Duration = Duration::from_secs(2);

/// Bounds the number of concurrent requests to a chain client and retries
/// failed ones after a fixed backoff.
pub struct ChainClientPool<C: ChainClient> {
  client: Arc<C>,
  permits: Semaphore,
  backoff: Duration,
  /// `None` retries until the request succeeds or shutdown is requested.
  max_retries: Option<u32>,
}

impl<C: ChainClient> ChainClientPool<C> {
  pub fn new(client: Arc<C>, size: usize) -> Self {
    Self::with_backoff(client, size, RETRY_BACKOFF, None)
  }

  pub fn bounded(client: Arc<C>, size: usize, max_retries: u32) -> Self {
    Self::with_backoff(client, size, RETRY_BACKOFF, Some(max_retries))
  }

  pub fn with_backoff(
    client: Arc<C>,
    size: usize,
    backoff: Duration,
    max_retries: Option<u32>,
  ) -> Self {
    Self {
      client,
      permits: Semaphore::new(size.max(1)),
      backoff,
      max_retries,
    }
  }

  async fn permit(&self) -> Result<SemaphorePermit<'_>> {
    loop {
      match tokio::time::timeout(self.backoff, self.permits.acquire()).await {
        Ok(permit) => return Ok(permit?),
        Err(_) => log::warn!(
          "chain client pool exhausted, still waiting after {:?}",
          self.backoff
        ),
      }
    }
  }

  async fn with_retries<T, F, Fut>(&self, what: &str, request: F) -> Result<T>
  where
    F: Fn() -> Fut + Send + Sync,
    Fut: Future<Output = Result<T>> + Send,
    T: Send,
  {
    let mut errors = 0;
    loop {
      let permit = self.permit().await?;
      let result = request().await;
      drop(permit);

      match result {
        Ok(value) => return Ok(value),
        Err(err) => {
          errors += 1;
          if matches!(self.max_retries, Some(max) if errors > max) {
            log::error!("giving up on {what} after {errors} attempts");
            return Err(err.context(format!("failed to fetch {what}")));
          }
          if SHUTTING_DOWN.load(Ordering::Relaxed) {
            return Err(err.context(format!("shutting down while fetching {what}")));
          }
          log::warn!(
            "failed to fetch {what} ({errors} attempts), retrying in {:?}: {err}",
            self.backoff
          );
          tokio::time::sleep(self.backoff).await;
        }
      }
    }
  }
}

#[async_trait]
impl<C: ChainClient> ChainClient for ChainClientPool<C> {
  async fn block_by_height(&self, height: u64) -> Result<Option<Block>> {
    self
      .with_retries(&format!("block {height}"), || {
        self.client.block_by_height(height)
      })
      .await
  }

  async fn block_by_hash(&self, hash: &BlockHash) -> Result<Option<Block>> {
    self
      .with_retries(&format!("block {hash}"), || self.client.block_by_hash(hash))
      .await
  }

  async fn block_height(&self, hash: &BlockHash) -> Result<Option<u64>> {
    self
      .with_retries(&format!("height of block {hash}"), || {
        self.client.block_height(hash)
      })
      .await
  }

  async fn block_hash(&self, height: u64) -> Result<Option<BlockHash>> {
    self
      .with_retries(&format!("hash of block {height}"), || {
        self.client.block_hash(height)
      })
      .await
  }

  async fn chain_tip(&self) -> Result<u64> {
    self
      .with_retries("chain tip", || self.client.chain_tip())
      .await
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use anyhow::anyhow;
  use std::sync::atomic::{AtomicU32, Ordering};

  struct Flaky {
    failures: u32,
    calls: AtomicU32,
  }

  #[async_trait]
  impl ChainClient for Flaky {
    async fn block_by_height(&self, _: u64) -> Result<Option<Block>> {
      Ok(None)
    }

    async fn block_by_hash(&self, _: &BlockHash) -> Result<Option<Block>> {
      Ok(None)
    }

    async fn block_height(&self, _: &BlockHash) -> Result<Option<u64>> {
      Ok(None)
    }

    async fn block_hash(&self, _: u64) -> Result<Option<BlockHash>> {
      Ok(None)
    }

    async fn chain_tip(&self) -> Result<u64> {
      let call = self.calls.fetch_add(1, Ordering::SeqCst);
      if call < self.failures {
        Err(anyhow!("connection refused"))
      } else {
        Ok(100)
      }
    }
  }

  fn pool(failures: u32, max_retries: Option<u32>) -> (Arc<Flaky>, ChainClientPool<Flaky>) {
    let client = Arc::new(Flaky {
      failures,
      calls: AtomicU32::new(0),
    });
    let pool = ChainClientPool::with_backoff(
      client.clone(),
      2,
      Duration::from_millis(1),
      max_retries,
    );
    (client, pool)
  }

  #[tokio::test]
  async fn test_retries_until_success() {
    let (client, pool) = pool(3, Some(5));
    assert_eq!(pool.chain_tip().await.unwrap(), 100);
    assert_eq!(client.calls.load(Ordering::SeqCst), 4);
  }

  #[tokio::test]
  async fn test_unbounded_outlasts_long_outage() {
    let (client, pool) = pool(40, None);
    assert_eq!(pool.chain_tip().await.unwrap(), 100);
    assert_eq!(client.calls.load(Ordering::SeqCst), 41);
  }

  #[tokio::test]
  async fn test_gives_up() {
    let (client, pool) = pool(10, Some(2));
    assert!(pool.chain_tip().await.is_err());
    assert_eq!(client.calls.load(Ordering::SeqCst), 3);
  }

  #[tokio::test]
  async fn test_waits_for_permit() {
    let pool = Arc::new(pool(0, Some(0)).1);
    let held = pool.permits.acquire_many(2).await.unwrap();

    let waiter = {
      let pool = pool.clone();
      tokio::spawn(async move { pool.chain_tip().await })
    };
    tokio::time::sleep(Duration::from_millis(10)).await;
    assert!(!waiter.is_finished());

    drop(held);
    assert_eq!(waiter.await.unwrap().unwrap(), 100);
  }
}
