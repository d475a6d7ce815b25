use super::*;
use crate::{protocol::drc20::Num, InscriptionId};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct TokenInfo {
  pub tick: Tick,
  pub protocol: String,
  pub max: Num,
  pub lim: Num,
  pub dec: Option<u32>,
  pub supply: Num,
  pub deploy_by: String,
  pub inscription_id: InscriptionId,
  pub deployed_number: u64,
  pub deployed_timestamp: u32,
}

impl TokenInfo {
  /// Applies a mint of `amt`, returning the updated descriptor and the amount
  /// actually minted. The last mint is cut down to what is left of `max`.
  pub fn mint(&self, amt: &Num) -> Result<(Self, Num), LedgerError> {
    if amt > &self.lim {
      return Err(LedgerError::AmountExceedLimit {
        amt: amt.to_string(),
        lim: self.lim.to_string(),
      });
    }

    if self.supply >= self.max {
      return Err(LedgerError::TickMinted(self.tick.to_string()));
    }

    let minted = amt.min(&self.max.checked_sub(&self.supply)?);
    let info = Self {
      supply: self.supply.checked_add(&minted)?,
      ..self.clone()
    };

    Ok((info, minted))
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use bitcoin::{hashes::Hash, Txid};
  use std::str::FromStr;

  fn token(max: u64, lim: u64, supply: u64) -> TokenInfo {
    TokenInfo {
      tick: Tick::from_str("doge").unwrap(),
      protocol: "drc-20".to_string(),
      max: Num::from(max),
      lim: Num::from(lim),
      dec: None,
      supply: Num::from(supply),
      deploy_by: "D8Gq6rNPbYjz2kPRxGRnoW8fsgMvBfB6Vp".to_string(),
      inscription_id: InscriptionId::from(Txid::from_byte_array([1; 32])),
      deployed_number: 1,
      deployed_timestamp: 1,
    }
  }

  #[test]
  fn test_mint_within_limit() {
    let (info, minted) = token(1000, 100, 0).mint(&Num::from(100)).unwrap();
    assert_eq!(minted, Num::from(100));
    assert_eq!(info.supply, Num::from(100));
  }

  #[test]
  fn test_mint_cut_to_max() {
    let (info, minted) = token(1000, 100, 950).mint(&Num::from(100)).unwrap();
    assert_eq!(minted, Num::from(50));
    assert_eq!(info.supply, Num::from(1000));
  }

  #[test]
  fn test_mint_exceed_limit() {
    assert_eq!(
      token(1000, 100, 0).mint(&Num::from(101)),
      Err(LedgerError::AmountExceedLimit {
        amt: "101".to_string(),
        lim: "100".to_string(),
      })
    );
  }

  #[test]
  fn test_mint_fully_minted() {
    assert_eq!(
      token(1000, 100, 1000).mint(&Num::from(1)),
      Err(LedgerError::TickMinted("doge".to_string()))
    );
  }
}
