use super::*;
use anyhow::{anyhow, Error};
use serde::{de::DeserializeOwned, Serialize};
use std::{str::FromStr, sync::Arc};

/// Typed view of the keyspace over any `KvStore`. Records are stored as JSON.
pub struct Context<S: KvStore> {
  store: Arc<S>,
}

impl<S: KvStore> Clone for Context<S> {
  fn clone(&self) -> Self {
    Self {
      store: self.store.clone(),
    }
  }
}

impl<S: KvStore> Context<S> {
  pub fn new(store: Arc<S>) -> Self {
    Self { store }
  }

  pub fn store(&self) -> &Arc<S> {
    &self.store
  }

  async fn get_json<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, Error> {
    match self.store.get(key).await? {
      Some(value) => Ok(Some(serde_json::from_str(&value)?)),
      None => Ok(None),
    }
  }

  async fn set_json<T: Serialize + Sync>(&self, key: &str, value: &T) -> Result<(), Error> {
    self.store.set(key, &serde_json::to_string(value)?).await?;
    Ok(())
  }

  async fn get_number(&self, key: &str) -> Result<Option<u64>, Error> {
    match self.store.get(key).await? {
      Some(value) => Ok(Some(
        value
          .parse()
          .map_err(|e| anyhow!("invalid height `{value}` at {key}: {e}"))?,
      )),
      None => Ok(None),
    }
  }

  async fn all_members(&self, key: &str) -> Result<Vec<(String, f64)>, Error> {
    Ok(
      self
        .store
        .sorted_set_range_by_score(key, f64::MIN, f64::MAX)
        .await?,
    )
  }
}

#[async_trait]
impl<S: KvStore> DataStoreReadOnly for Context<S> {
  type Error = Error;

  async fn get_inscription(&self, id: &InscriptionId) -> Result<Option<Inscription>, Self::Error> {
    self.get_json(&keys::inscription(id)).await
  }

  async fn get_carrier(&self, outpoint: &OutPoint) -> Result<Option<Carrier>, Self::Error> {
    self.get_json(&keys::carrier(outpoint)).await
  }

  async fn get_event(&self, key: &str) -> Result<Option<TransferEvent>, Self::Error> {
    self.get_json(key).await
  }

  async fn get_block_events(&self, height: u64) -> Result<Vec<TransferEvent>, Self::Error> {
    let mut events = Vec::new();
    for key in self.store.set_members(&keys::block_events(height)).await? {
      if let Some(event) = self.get_json(&key).await? {
        events.push(event);
      }
    }
    Ok(events)
  }

  async fn get_history(
    &self,
    protocol: ProtocolKind,
    subject: &str,
  ) -> Result<Vec<TransferEvent>, Self::Error> {
    let mut events = Vec::new();
    for (key, _) in self.all_members(&keys::history(protocol, subject)).await? {
      if let Some(event) = self.get_json(&key).await? {
        events.push(event);
      }
    }
    Ok(events)
  }

  async fn get_token_info(&self, tick: &Tick) -> Result<Option<TokenInfo>, Self::Error> {
    self.get_json(&keys::token(tick.as_str())).await
  }

  async fn get_tokens_info(&self) -> Result<Vec<TokenInfo>, Self::Error> {
    let mut tokens = Vec::new();
    for (tick, _) in self.all_members(keys::TOKEN_LIST).await? {
      if let Some(info) = self.get_json(&keys::token(&tick)).await? {
        tokens.push(info);
      }
    }
    Ok(tokens)
  }

  async fn get_balance(&self, address: &str, tick: &Tick) -> Result<Option<Balance>, Self::Error> {
    self.get_json(&keys::balance(address, tick.as_str())).await
  }

  async fn get_balances(&self, address: &str) -> Result<Vec<Balance>, Self::Error> {
    let mut balances = Vec::new();
    for (tick, _) in self.all_members(&keys::address_tokens(address)).await? {
      if let Some(balance) = self.get_json(&keys::balance(address, &tick)).await? {
        balances.push(balance);
      }
    }
    Ok(balances)
  }

  async fn get_holders(&self, tick: &Tick) -> Result<Vec<(String, f64)>, Self::Error> {
    let mut holders = self.all_members(&keys::holders(tick.as_str())).await?;
    holders.reverse();
    Ok(holders)
  }

  async fn get_owner(
    &self,
    protocol: ProtocolKind,
    key: &str,
  ) -> Result<Option<Ownership>, Self::Error> {
    self.get_json(&keys::owner(protocol, key)).await
  }

  async fn get_ownerships(
    &self,
    protocol: ProtocolKind,
    address: &str,
  ) -> Result<Vec<Ownership>, Self::Error> {
    self
      .store
      .hash_get_all(&keys::address_ownerships(protocol, address))
      .await?
      .into_iter()
      .map(|(_, value)| serde_json::from_str(&value).map_err(Error::from))
      .collect()
  }

  async fn get_last_height(&self) -> Result<Option<u64>, Self::Error> {
    self.get_number(keys::LAST_HEIGHT).await
  }

  async fn get_read_model_height(&self) -> Result<Option<u64>, Self::Error> {
    self.get_number(keys::READ_MODEL_HEIGHT).await
  }

  async fn get_block_hash(&self, height: u64) -> Result<Option<BlockHash>, Self::Error> {
    match self.store.get(&keys::block_hash(height)).await? {
      Some(hash) => Ok(Some(BlockHash::from_str(&hash)?)),
      None => Ok(None),
    }
  }
}

#[async_trait]
impl<S: KvStore> DataStoreReadWrite for Context<S> {
  async fn save_inscription(&self, inscription: &Inscription) -> Result<(), Self::Error> {
    self
      .set_json(&keys::inscription(&inscription.id), inscription)
      .await
  }

  async fn insert_carrier(
    &self,
    outpoint: &OutPoint,
    carrier: &Carrier,
  ) -> Result<(), Self::Error> {
    self.set_json(&keys::carrier(outpoint), carrier).await
  }

  async fn remove_carrier(&self, outpoint: &OutPoint) -> Result<(), Self::Error> {
    self.store.delete(&keys::carrier(outpoint)).await?;
    Ok(())
  }

  async fn save_event(&self, event: &TransferEvent) -> Result<(), Self::Error> {
    let key = event.key();
    self.set_json(&key, event).await?;
    self
      .store
      .set_add(&keys::block_events(event.height), &key)
      .await?;
    self
      .store
      .sorted_set_add(
        &keys::history(event.protocol, &event.subject),
        &key,
        event.height as f64,
      )
      .await?;
    Ok(())
  }

  async fn remove_event(&self, event: &TransferEvent) -> Result<(), Self::Error> {
    let key = event.key();
    self.store.delete(&key).await?;
    self
      .store
      .set_remove(&keys::block_events(event.height), &key)
      .await?;
    self
      .store
      .sorted_set_remove(&keys::history(event.protocol, &event.subject), &key)
      .await?;
    Ok(())
  }

  async fn insert_token_info(&self, info: &TokenInfo) -> Result<(), Self::Error> {
    self.set_json(&keys::token(info.tick.as_str()), info).await?;
    self
      .store
      .sorted_set_add(
        keys::TOKEN_LIST,
        info.tick.as_str(),
        f64::from(info.deployed_timestamp),
      )
      .await?;
    Ok(())
  }

  async fn update_token_info(&self, info: &TokenInfo) -> Result<(), Self::Error> {
    self.set_json(&keys::token(info.tick.as_str()), info).await
  }

  async fn update_balance(&self, address: &str, balance: &Balance) -> Result<(), Self::Error> {
    let tick = balance.tick.as_str();
    self.set_json(&keys::balance(address, tick), balance).await?;

    let total = balance.total()?;
    if total.is_zero() {
      self
        .store
        .sorted_set_remove(&keys::holders(tick), address)
        .await?;
      self
        .store
        .sorted_set_remove(&keys::address_tokens(address), tick)
        .await?;
    } else {
      self
        .store
        .sorted_set_add(&keys::holders(tick), address, total.to_f64())
        .await?;
      self
        .store
        .sorted_set_add(&keys::address_tokens(address), tick, total.to_f64())
        .await?;
    }
    Ok(())
  }

  async fn insert_ownership(&self, ownership: &Ownership) -> Result<(), Self::Error> {
    let value = serde_json::to_string(ownership)?;
    self
      .store
      .hash_set(
        &keys::address_ownerships(ownership.protocol, &ownership.address),
        &ownership.key,
        &value,
      )
      .await?;
    self
      .store
      .set(&keys::owner(ownership.protocol, &ownership.key), &value)
      .await?;
    Ok(())
  }

  async fn remove_ownership(&self, ownership: &Ownership) -> Result<(), Self::Error> {
    self
      .store
      .hash_delete(
        &keys::address_ownerships(ownership.protocol, &ownership.address),
        &ownership.key,
      )
      .await?;
    self
      .store
      .delete(&keys::owner(ownership.protocol, &ownership.key))
      .await?;
    Ok(())
  }

  async fn set_last_block(&self, height: u64, hash: &BlockHash) -> Result<(), Self::Error> {
    self
      .store
      .set(&keys::block_hash(height), &hash.to_string())
      .await?;
    self
      .store
      .set(keys::LAST_HEIGHT, &height.to_string())
      .await?;
    Ok(())
  }

  async fn set_read_model_height(&self, height: u64) -> Result<(), Self::Error> {
    self
      .store
      .set(keys::READ_MODEL_HEIGHT, &height.to_string())
      .await?;
    Ok(())
  }

  async fn remove_block_hash(&self, height: u64) -> Result<(), Self::Error> {
    self.store.delete(&keys::block_hash(height)).await?;
    Ok(())
  }
}
