use super::*;
use crate::protocol::drc20::Num;
use serde::{Deserialize, Serialize};

/// Token balance of one address. Every transition returns a new value and
/// leaves `self` untouched.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Balance {
  pub tick: Tick,
  pub available: Num,
  pub transferable: Num,
  pub pending: Num,
}

impl Balance {
  pub fn new(tick: &Tick) -> Self {
    Self {
      tick: tick.clone(),
      available: Num::zero(),
      transferable: Num::zero(),
      pending: Num::zero(),
    }
  }

  pub fn total(&self) -> Result<Num, LedgerError> {
    Ok(
      self
        .available
        .checked_add(&self.transferable)?
        .checked_add(&self.pending)?,
    )
  }

  pub fn credit_available(&self, amt: &Num) -> Result<Self, LedgerError> {
    Ok(Self {
      available: self.available.checked_add(amt)?,
      ..self.clone()
    })
  }

  pub fn credit_pending(&self, amt: &Num) -> Result<Self, LedgerError> {
    Ok(Self {
      pending: self.pending.checked_add(amt)?,
      ..self.clone()
    })
  }

  pub fn available_to_transferable(&self, amt: &Num) -> Result<Self, LedgerError> {
    Ok(Self {
      available: Self::debit("available", &self.available, amt)?,
      transferable: self.transferable.checked_add(amt)?,
      ..self.clone()
    })
  }

  pub fn debit_transferable(&self, amt: &Num) -> Result<Self, LedgerError> {
    Ok(Self {
      transferable: Self::debit("transferable", &self.transferable, amt)?,
      ..self.clone()
    })
  }

  pub fn pending_to_available(&self, amt: &Num) -> Result<Self, LedgerError> {
    Ok(Self {
      pending: Self::debit("pending", &self.pending, amt)?,
      available: self.available.checked_add(amt)?,
      ..self.clone()
    })
  }

  fn debit(kind: &'static str, have: &Num, need: &Num) -> Result<Num, LedgerError> {
    if have < need {
      return Err(LedgerError::InsufficientBalance {
        kind,
        have: have.to_string(),
        need: need.to_string(),
      });
    }
    Ok(have.checked_sub(need)?)
  }
}
