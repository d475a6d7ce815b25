mod batch;
mod memory;
mod redb;

pub use self::{memory::MemoryStore, redb::RedbStore};
use async_trait::async_trait;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
  #[error("redb database error: {0}")]
  Database(#[from] ::redb::DatabaseError),

  #[error("redb transaction error: {0}")]
  Transaction(#[from] ::redb::TransactionError),

  #[error("redb table error: {0}")]
  Table(#[from] ::redb::TableError),

  #[error("redb storage error: {0}")]
  Storage(#[from] ::redb::StorageError),

  #[error("redb commit error: {0}")]
  Commit(#[from] ::redb::CommitError),

  #[error("redb savepoint error: {0}")]
  Savepoint(#[from] ::redb::SavepointError),

  #[error("blocking task failed: {0}")]
  Join(#[from] tokio::task::JoinError),

  #[error("snapshot at height {0} not found")]
  SnapshotNotFound(u64),

  #[error("a block write batch is already open")]
  BatchOpen,

  #[error("no block write batch is open")]
  NoBatch,
}

/// Redis-shaped key-value storage: plain strings, hashes, sets and sorted
/// sets, all addressed by string keys.
#[async_trait]
pub trait KvStore: Send + Sync + 'static {
  type Error: std::error::Error + Send + Sync + 'static;

  async fn get(&self, key: &str) -> Result<Option<String>, Self::Error>;
  async fn set(&self, key: &str, value: &str) -> Result<(), Self::Error>;
  async fn delete(&self, key: &str) -> Result<(), Self::Error>;

  async fn hash_get(&self, key: &str, field: &str) -> Result<Option<String>, Self::Error>;
  async fn hash_set(&self, key: &str, field: &str, value: &str) -> Result<(), Self::Error>;
  async fn hash_delete(&self, key: &str, field: &str) -> Result<(), Self::Error>;
  async fn hash_get_all(&self, key: &str) -> Result<Vec<(String, String)>, Self::Error>;

  async fn set_add(&self, key: &str, member: &str) -> Result<(), Self::Error>;
  async fn set_remove(&self, key: &str, member: &str) -> Result<(), Self::Error>;
  async fn set_members(&self, key: &str) -> Result<Vec<String>, Self::Error>;

  async fn sorted_set_add(&self, key: &str, member: &str, score: f64) -> Result<(), Self::Error>;
  async fn sorted_set_remove(&self, key: &str, member: &str) -> Result<(), Self::Error>;
  /// Members with `min <= score <= max`, lowest score first.
  async fn sorted_set_range_by_score(
    &self,
    key: &str,
    min: f64,
    max: f64,
  ) -> Result<Vec<(String, f64)>, Self::Error>;

  /// Buffers every following write until `commit_block`. Reads see the
  /// buffered writes.
  async fn begin_block(&self) -> Result<(), Self::Error>;
  /// Writes the buffered batch in one atomic commit.
  async fn commit_block(&self) -> Result<(), Self::Error>;
  /// Drops the buffered batch.
  async fn abort_block(&self) -> Result<(), Self::Error>;
}

/// Whole-store snapshots identified by block height.
#[async_trait]
pub trait SnapshotStore: KvStore {
  async fn snapshot(&self, height: u64) -> Result<(), Self::Error>;
  /// Heights of the snapshots kept, ascending.
  async fn snapshots(&self) -> Result<Vec<u64>, Self::Error>;
  /// Rolls the store back to the snapshot taken at `height`. Snapshots taken
  /// after it are discarded.
  async fn restore(&self, height: u64) -> Result<(), Self::Error>;
  async fn delete_snapshot(&self, height: u64) -> Result<(), Self::Error>;
}

fn sort_by_score(mut members: Vec<(String, f64)>) -> Vec<(String, f64)> {
  members.sort_by(|a, b| a.1.total_cmp(&b.1).then_with(|| a.0.cmp(&b.0)));
  members
}
