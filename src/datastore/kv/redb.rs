use super::{batch::Batch, *};
use ::redb::{
  Database, Durability, MultimapTableDefinition, ReadableMultimapTable, ReadableTable,
  TableDefinition, WriteTransaction,
};
use std::{path::Path, sync::Arc};
use tokio::sync::Mutex;

const STRINGS: TableDefinition<&str, &str> = TableDefinition::new("STRINGS");
const HASHES: TableDefinition<(&str, &str), &str> = TableDefinition::new("HASHES");
const SETS: MultimapTableDefinition<&str, &str> = MultimapTableDefinition::new("SETS");
const ZSETS: TableDefinition<(&str, &str), f64> = TableDefinition::new("ZSETS");
const SNAPSHOTS: TableDefinition<u64, u64> = TableDefinition::new("SNAPSHOTS");

/// Persistent store on a single redb file. Snapshots are redb persistent
/// savepoints, mapped from block height to savepoint id. Writes made inside a
/// block batch land in one write transaction.
#[derive(Clone)]
pub struct RedbStore {
  database: Arc<Database>,
  batch: Arc<Mutex<Option<Batch>>>,
}

impl RedbStore {
  pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
    let database = Database::create(path)?;

    let wtx = database.begin_write()?;
    wtx.open_table(STRINGS)?;
    wtx.open_table(HASHES)?;
    wtx.open_multimap_table(SETS)?;
    wtx.open_table(ZSETS)?;
    wtx.open_table(SNAPSHOTS)?;
    wtx.commit()?;

    Ok(Self {
      database: Arc::new(database),
      batch: Arc::new(Mutex::new(None)),
    })
  }

  async fn read<T, F>(&self, f: F) -> Result<T, StoreError>
  where
    F: FnOnce(&Database) -> Result<T, StoreError> + Send + 'static,
    T: Send + 'static,
  {
    let database = self.database.clone();
    tokio::task::spawn_blocking(move || f(&database)).await?
  }

  async fn write<T, F>(&self, f: F) -> Result<T, StoreError>
  where
    F: FnOnce(&mut WriteTransaction) -> Result<T, StoreError> + Send + 'static,
    T: Send + 'static,
  {
    let database = self.database.clone();
    tokio::task::spawn_blocking(move || {
      let mut wtx = database.begin_write()?;
      wtx.set_durability(Durability::Immediate);
      let value = f(&mut wtx)?;
      wtx.commit()?;
      Ok(value)
    })
    .await?
  }

  /// Records a write in the open batch, or commits it alone when none is open.
  async fn buffer(&self, f: impl FnOnce(&mut Batch) + Send) -> Result<(), StoreError> {
    let mut open = self.batch.lock().await;
    if let Some(batch) = open.as_mut() {
      f(batch);
      return Ok(());
    }
    drop(open);

    let mut single = Batch::default();
    f(&mut single);
    self.commit(single).await
  }

  async fn commit(&self, batch: Batch) -> Result<(), StoreError> {
    self.write(move |wtx| apply(wtx, batch)).await
  }
}

fn apply(wtx: &mut WriteTransaction, batch: Batch) -> Result<(), StoreError> {
  {
    let mut table = wtx.open_table(STRINGS)?;
    for (key, value) in &batch.strings {
      match value {
        Some(value) => {
          table.insert(key.as_str(), value.as_str())?;
        }
        None => {
          table.remove(key.as_str())?;
        }
      }
    }
  }

  {
    let mut table = wtx.open_table(HASHES)?;
    for ((key, field), value) in &batch.hashes {
      match value {
        Some(value) => {
          table.insert((key.as_str(), field.as_str()), value.as_str())?;
        }
        None => {
          table.remove((key.as_str(), field.as_str()))?;
        }
      }
    }
  }

  {
    let mut table = wtx.open_multimap_table(SETS)?;
    for ((key, member), present) in &batch.sets {
      if *present {
        table.insert(key.as_str(), member.as_str())?;
      } else {
        table.remove(key.as_str(), member.as_str())?;
      }
    }
  }

  {
    let mut table = wtx.open_table(ZSETS)?;
    for ((key, member), score) in &batch.zsets {
      match score {
        Some(score) => {
          table.insert((key.as_str(), member.as_str()), *score)?;
        }
        None => {
          table.remove((key.as_str(), member.as_str()))?;
        }
      }
    }
  }

  Ok(())
}

#[async_trait]
impl KvStore for RedbStore {
  type Error = StoreError;

  async fn get(&self, key: &str) -> Result<Option<String>, Self::Error> {
    if let Some(value) = self.batch.lock().await.as_ref().and_then(|b| b.get(key)) {
      return Ok(value);
    }

    let key = key.to_string();
    self
      .read(move |database| {
        let rtx = database.begin_read()?;
        let table = rtx.open_table(STRINGS)?;
        let value = table.get(key.as_str())?.map(|v| v.value().to_string());
        Ok(value)
      })
      .await
  }

  async fn set(&self, key: &str, value: &str) -> Result<(), Self::Error> {
    self.buffer(|batch| batch.set(key, Some(value))).await
  }

  async fn delete(&self, key: &str) -> Result<(), Self::Error> {
    self.buffer(|batch| batch.set(key, None)).await
  }

  async fn hash_get(&self, key: &str, field: &str) -> Result<Option<String>, Self::Error> {
    if let Some(value) = self
      .batch
      .lock()
      .await
      .as_ref()
      .and_then(|b| b.hash_get(key, field))
    {
      return Ok(value);
    }

    let (key, field) = (key.to_string(), field.to_string());
    self
      .read(move |database| {
        let rtx = database.begin_read()?;
        let table = rtx.open_table(HASHES)?;
        let value = table
          .get((key.as_str(), field.as_str()))?
          .map(|v| v.value().to_string());
        Ok(value)
      })
      .await
  }

  async fn hash_set(&self, key: &str, field: &str, value: &str) -> Result<(), Self::Error> {
    self
      .buffer(|batch| batch.hash_set(key, field, Some(value)))
      .await
  }

  async fn hash_delete(&self, key: &str, field: &str) -> Result<(), Self::Error> {
    self.buffer(|batch| batch.hash_set(key, field, None)).await
  }

  async fn hash_get_all(&self, key: &str) -> Result<Vec<(String, String)>, Self::Error> {
    let batch = self.batch.lock().await;

    let owned = key.to_string();
    let committed = self
      .read(move |database| {
        let rtx = database.begin_read()?;
        let table = rtx.open_table(HASHES)?;

        let mut fields = Vec::new();
        for next in table.range((owned.as_str(), "")..)? {
          let next = next?;
          let (hash, field) = next.0.value();
          if hash != owned {
            break;
          }
          fields.push((field.to_string(), next.1.value().to_string()));
        }

        Ok(fields)
      })
      .await?;

    Ok(match batch.as_ref() {
      Some(batch) => batch.merge_hash(key, committed),
      None => committed,
    })
  }

  async fn set_add(&self, key: &str, member: &str) -> Result<(), Self::Error> {
    self
      .buffer(|batch| batch.set_member(key, member, true))
      .await
  }

  async fn set_remove(&self, key: &str, member: &str) -> Result<(), Self::Error> {
    self
      .buffer(|batch| batch.set_member(key, member, false))
      .await
  }

  async fn set_members(&self, key: &str) -> Result<Vec<String>, Self::Error> {
    let batch = self.batch.lock().await;

    let owned = key.to_string();
    let committed = self
      .read(move |database| {
        let rtx = database.begin_read()?;
        let table = rtx.open_multimap_table(SETS)?;

        let mut members = Vec::new();
        for member in table.get(owned.as_str())? {
          members.push(member?.value().to_string());
        }

        Ok(members)
      })
      .await?;

    Ok(match batch.as_ref() {
      Some(batch) => batch.merge_set(key, committed),
      None => committed,
    })
  }

  async fn sorted_set_add(&self, key: &str, member: &str, score: f64) -> Result<(), Self::Error> {
    self
      .buffer(|batch| batch.sorted_set_member(key, member, Some(score)))
      .await
  }

  async fn sorted_set_remove(&self, key: &str, member: &str) -> Result<(), Self::Error> {
    self
      .buffer(|batch| batch.sorted_set_member(key, member, None))
      .await
  }

  async fn sorted_set_range_by_score(
    &self,
    key: &str,
    min: f64,
    max: f64,
  ) -> Result<Vec<(String, f64)>, Self::Error> {
    let batch = self.batch.lock().await;

    let owned = key.to_string();
    let committed = self
      .read(move |database| {
        let rtx = database.begin_read()?;
        let table = rtx.open_table(ZSETS)?;

        let mut members = Vec::new();
        for next in table.range((owned.as_str(), "")..)? {
          let next = next?;
          let (zset, member) = next.0.value();
          if zset != owned {
            break;
          }
          let score = next.1.value();
          if score >= min && score <= max {
            members.push((member.to_string(), score));
          }
        }

        Ok(members)
      })
      .await?;

    Ok(sort_by_score(match batch.as_ref() {
      Some(batch) => batch.merge_sorted_set(key, min, max, committed),
      None => committed,
    }))
  }

  async fn begin_block(&self) -> Result<(), Self::Error> {
    let mut batch = self.batch.lock().await;
    if batch.is_some() {
      return Err(StoreError::BatchOpen);
    }
    *batch = Some(Batch::default());
    Ok(())
  }

  async fn commit_block(&self) -> Result<(), Self::Error> {
    let batch = self.batch.lock().await.take().ok_or(StoreError::NoBatch)?;
    self.commit(batch).await
  }

  async fn abort_block(&self) -> Result<(), Self::Error> {
    self.batch.lock().await.take();
    Ok(())
  }
}

#[async_trait]
impl SnapshotStore for RedbStore {
  async fn snapshot(&self, height: u64) -> Result<(), Self::Error> {
    self
      .write(move |wtx| {
        let savepoint = wtx.persistent_savepoint()?;
        let replaced = wtx
          .open_table(SNAPSHOTS)?
          .insert(height, savepoint)?
          .map(|v| v.value());
        if let Some(replaced) = replaced {
          wtx.delete_persistent_savepoint(replaced)?;
        }
        log::debug!("created savepoint {savepoint} at height {height}");
        Ok(())
      })
      .await
  }

  async fn snapshots(&self) -> Result<Vec<u64>, Self::Error> {
    self
      .read(|database| {
        let rtx = database.begin_read()?;
        let table = rtx.open_table(SNAPSHOTS)?;

        let mut heights = Vec::new();
        for next in table.range::<u64>(..)? {
          heights.push(next?.0.value());
        }

        Ok(heights)
      })
      .await
  }

  async fn restore(&self, height: u64) -> Result<(), Self::Error> {
    self.batch.lock().await.take();

    let (id, kept) = self
      .write(move |wtx| {
        let mut kept = Vec::new();
        let mut later = Vec::new();
        {
          let table = wtx.open_table(SNAPSHOTS)?;
          for next in table.range::<u64>(..)? {
            let (key, value) = next?;
            if key.value() <= height {
              kept.push((key.value(), value.value()));
            } else {
              later.push(value.value());
            }
          }
        }

        let id = kept
          .iter()
          .find(|(key, _)| *key == height)
          .map(|(_, id)| *id)
          .ok_or(StoreError::SnapshotNotFound(height))?;

        for id in later {
          wtx.delete_persistent_savepoint(id)?;
        }

        Ok((id, kept))
      })
      .await?;

    self
      .write(move |wtx| {
        let savepoint = wtx.get_persistent_savepoint(id)?;
        wtx.restore_savepoint(&savepoint)?;

        // the restored mapping predates the savepoint and later prunes.
        let mut table = wtx.open_table(SNAPSHOTS)?;
        let mut stale = Vec::new();
        for next in table.range::<u64>(..)? {
          stale.push(next?.0.value());
        }
        for key in stale {
          table.remove(key)?;
        }
        for (key, value) in kept {
          table.insert(key, value)?;
        }

        log::info!("restored savepoint {id} at height {height}");
        Ok(())
      })
      .await
  }

  async fn delete_snapshot(&self, height: u64) -> Result<(), Self::Error> {
    self
      .write(move |wtx| {
        let id = wtx.open_table(SNAPSHOTS)?.remove(height)?.map(|v| v.value());
        if let Some(id) = id {
          wtx.delete_persistent_savepoint(id)?;
        }
        Ok(())
      })
      .await
  }
}
