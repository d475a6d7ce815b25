use super::{batch::Batch, *};
use std::collections::{BTreeMap, BTreeSet};
use tokio::sync::Mutex;

#[derive(Debug, Clone, Default)]
struct Dataset {
  strings: BTreeMap<String, String>,
  hashes: BTreeMap<String, BTreeMap<String, String>>,
  sets: BTreeMap<String, BTreeSet<String>>,
  zsets: BTreeMap<String, BTreeMap<String, f64>>,
}

impl Dataset {
  fn set(&mut self, key: &str, value: Option<&str>) {
    match value {
      Some(value) => {
        self.strings.insert(key.to_string(), value.to_string());
      }
      None => {
        self.strings.remove(key);
      }
    }
  }

  fn hash_set(&mut self, key: &str, field: &str, value: Option<&str>) {
    match value {
      Some(value) => {
        self
          .hashes
          .entry(key.to_string())
          .or_default()
          .insert(field.to_string(), value.to_string());
      }
      None => {
        if let Some(hash) = self.hashes.get_mut(key) {
          hash.remove(field);
          if hash.is_empty() {
            self.hashes.remove(key);
          }
        }
      }
    }
  }

  fn set_member(&mut self, key: &str, member: &str, present: bool) {
    if present {
      self
        .sets
        .entry(key.to_string())
        .or_default()
        .insert(member.to_string());
    } else if let Some(set) = self.sets.get_mut(key) {
      set.remove(member);
      if set.is_empty() {
        self.sets.remove(key);
      }
    }
  }

  fn sorted_set_member(&mut self, key: &str, member: &str, score: Option<f64>) {
    match score {
      Some(score) => {
        self
          .zsets
          .entry(key.to_string())
          .or_default()
          .insert(member.to_string(), score);
      }
      None => {
        if let Some(zset) = self.zsets.get_mut(key) {
          zset.remove(member);
          if zset.is_empty() {
            self.zsets.remove(key);
          }
        }
      }
    }
  }

  fn apply(&mut self, batch: Batch) {
    for (key, value) in batch.strings {
      self.set(&key, value.as_deref());
    }
    for ((key, field), value) in batch.hashes {
      self.hash_set(&key, &field, value.as_deref());
    }
    for ((key, member), present) in batch.sets {
      self.set_member(&key, &member, present);
    }
    for ((key, member), score) in batch.zsets {
      self.sorted_set_member(&key, &member, score);
    }
  }
}

/// In-process store. Snapshots are full copies of the dataset.
#[derive(Debug, Default)]
pub struct MemoryStore {
  data: Mutex<Dataset>,
  batch: Mutex<Option<Batch>>,
  snapshots: Mutex<BTreeMap<u64, Dataset>>,
}

impl MemoryStore {
  pub fn new() -> Self {
    Self::default()
  }

  /// Runs `f` on the open batch, or on the dataset when none is open.
  async fn write(&self, f: impl FnOnce(&mut dyn Writer)) {
    let mut batch = self.batch.lock().await;
    match batch.as_mut() {
      Some(batch) => f(batch),
      None => f(&mut *self.data.lock().await),
    }
  }
}

trait Writer {
  fn set(&mut self, key: &str, value: Option<&str>);
  fn hash_set(&mut self, key: &str, field: &str, value: Option<&str>);
  fn set_member(&mut self, key: &str, member: &str, present: bool);
  fn sorted_set_member(&mut self, key: &str, member: &str, score: Option<f64>);
}

macro_rules! writer {
  ($ty:ty) => {
    impl Writer for $ty {
      fn set(&mut self, key: &str, value: Option<&str>) {
        <$ty>::set(self, key, value)
      }

      fn hash_set(&mut self, key: &str, field: &str, value: Option<&str>) {
        <$ty>::hash_set(self, key, field, value)
      }

      fn set_member(&mut self, key: &str, member: &str, present: bool) {
        <$ty>::set_member(self, key, member, present)
      }

      fn sorted_set_member(&mut self, key: &str, member: &str, score: Option<f64>) {
        <$ty>::sorted_set_member(self, key, member, score)
      }
    }
  };
}

writer!(Dataset);
writer!(Batch);

#[async_trait]
impl KvStore for MemoryStore {
  type Error = StoreError;

  async fn get(&self, key: &str) -> Result<Option<String>, Self::Error> {
    if let Some(value) = self.batch.lock().await.as_ref().and_then(|b| b.get(key)) {
      return Ok(value);
    }
    Ok(self.data.lock().await.strings.get(key).cloned())
  }

  async fn set(&self, key: &str, value: &str) -> Result<(), Self::Error> {
    self.write(|w| w.set(key, Some(value))).await;
    Ok(())
  }

  async fn delete(&self, key: &str) -> Result<(), Self::Error> {
    self.write(|w| w.set(key, None)).await;
    Ok(())
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
    Ok(
      self
        .data
        .lock()
        .await
        .hashes
        .get(key)
        .and_then(|hash| hash.get(field).cloned()),
    )
  }

  async fn hash_set(&self, key: &str, field: &str, value: &str) -> Result<(), Self::Error> {
    self.write(|w| w.hash_set(key, field, Some(value))).await;
    Ok(())
  }

  async fn hash_delete(&self, key: &str, field: &str) -> Result<(), Self::Error> {
    self.write(|w| w.hash_set(key, field, None)).await;
    Ok(())
  }

  async fn hash_get_all(&self, key: &str) -> Result<Vec<(String, String)>, Self::Error> {
    let batch = self.batch.lock().await;
    let committed = self
      .data
      .lock()
      .await
      .hashes
      .get(key)
      .map(|hash| {
        hash
          .iter()
          .map(|(field, value)| (field.clone(), value.clone()))
          .collect()
      })
      .unwrap_or_default();

    Ok(match batch.as_ref() {
      Some(batch) => batch.merge_hash(key, committed),
      None => committed,
    })
  }

  async fn set_add(&self, key: &str, member: &str) -> Result<(), Self::Error> {
    self.write(|w| w.set_member(key, member, true)).await;
    Ok(())
  }

  async fn set_remove(&self, key: &str, member: &str) -> Result<(), Self::Error> {
    self.write(|w| w.set_member(key, member, false)).await;
    Ok(())
  }

  async fn set_members(&self, key: &str) -> Result<Vec<String>, Self::Error> {
    let batch = self.batch.lock().await;
    let committed = self
      .data
      .lock()
      .await
      .sets
      .get(key)
      .map(|set| set.iter().cloned().collect())
      .unwrap_or_default();

    Ok(match batch.as_ref() {
      Some(batch) => batch.merge_set(key, committed),
      None => committed,
    })
  }

  async fn sorted_set_add(&self, key: &str, member: &str, score: f64) -> Result<(), Self::Error> {
    self
      .write(|w| w.sorted_set_member(key, member, Some(score)))
      .await;
    Ok(())
  }

  async fn sorted_set_remove(&self, key: &str, member: &str) -> Result<(), Self::Error> {
    self.write(|w| w.sorted_set_member(key, member, None)).await;
    Ok(())
  }

  async fn sorted_set_range_by_score(
    &self,
    key: &str,
    min: f64,
    max: f64,
  ) -> Result<Vec<(String, f64)>, Self::Error> {
    let batch = self.batch.lock().await;
    let committed = self
      .data
      .lock()
      .await
      .zsets
      .get(key)
      .map(|zset| {
        zset
          .iter()
          .filter(|(_, score)| **score >= min && **score <= max)
          .map(|(member, score)| (member.clone(), *score))
          .collect()
      })
      .unwrap_or_default();

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
    self.data.lock().await.apply(batch);
    Ok(())
  }

  async fn abort_block(&self) -> Result<(), Self::Error> {
    self.batch.lock().await.take();
    Ok(())
  }
}

#[async_trait]
impl SnapshotStore for MemoryStore {
  async fn snapshot(&self, height: u64) -> Result<(), Self::Error> {
    let data = self.data.lock().await.clone();
    self.snapshots.lock().await.insert(height, data);
    Ok(())
  }

  async fn snapshots(&self) -> Result<Vec<u64>, Self::Error> {
    Ok(self.snapshots.lock().await.keys().copied().collect())
  }

  async fn restore(&self, height: u64) -> Result<(), Self::Error> {
    let mut snapshots = self.snapshots.lock().await;
    let data = snapshots
      .get(&height)
      .cloned()
      .ok_or(StoreError::SnapshotNotFound(height))?;
    snapshots.retain(|snapshot, _| *snapshot <= height);
    self.batch.lock().await.take();
    *self.data.lock().await = data;
    Ok(())
  }

  async fn delete_snapshot(&self, height: u64) -> Result<(), Self::Error> {
    self.snapshots.lock().await.remove(&height);
    Ok(())
  }
}
