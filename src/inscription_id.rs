use bitcoin::Txid;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::{
  fmt::{self, Display, Formatter},
  num::ParseIntError,
  str::FromStr,
};

/// Identity of an inscription: its genesis transaction and output index.
#[derive(Debug, PartialEq, Copy, Clone, Hash, Eq, PartialOrd, Ord)]
pub struct InscriptionId {
  pub txid: Txid,
  pub index: u32,
}

impl From<Txid> for InscriptionId {
  fn from(txid: Txid) -> Self {
    Self { txid, index: 0 }
  }
}

impl Display for InscriptionId {
  fn fmt(&self, f: &mut Formatter) -> fmt::Result {
    write!(f, "{}i{}", self.txid, self.index)
  }
}

#[derive(Debug, thiserror::Error)]
pub enum ParseError {
  #[error("invalid character: '{0}'")]
  Character(char),
  #[error("invalid length: {0}")]
  Length(usize),
  #[error("invalid seprator: `{0}`")]
  Separator(char),
  #[error("invalid txid: {0}")]
  Txid(<Txid as FromStr>::Err),
  #[error("invalid index: {0}")]
  Index(ParseIntError),
}

impl FromStr for InscriptionId {
  type Err = ParseError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    if let Some(char) = s.chars().find(|char| !char.is_ascii()) {
      return Err(ParseError::Character(char));
    }

    const TXID_LEN: usize = 64;
    const MIN_LEN: usize = TXID_LEN + 2;

    if s.len() < MIN_LEN {
      return Err(ParseError::Length(s.len()));
    }

    let txid = &s[..TXID_LEN];

    let separator = char::from(s.as_bytes()[TXID_LEN]);
    if separator != 'i' {
      return Err(ParseError::Separator(separator));
    }

    let vout = &s[TXID_LEN + 1..];

    Ok(Self {
      txid: txid.parse().map_err(ParseError::Txid)?,
      index: vout.parse().map_err(ParseError::Index)?,
    })
  }
}

impl Serialize for InscriptionId {
  fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
  where
    S: Serializer,
  {
    serializer.collect_str(self)
  }
}

impl<'de> Deserialize<'de> for InscriptionId {
  fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
  where
    D: Deserializer<'de>,
  {
    Self::from_str(&String::deserialize(deserializer)?).map_err(serde::de::Error::custom)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use bitcoin::hashes::Hash;

  fn txid(n: u8) -> Txid {
    Txid::from_byte_array([n; 32])
  }

  #[test]
  fn test_display() {
    let id = InscriptionId::from(txid(1));
    assert_eq!(
      id.to_string(),
      "0101010101010101010101010101010101010101010101010101010101010101i0"
    );
  }

  #[test]
  fn test_from_str() {
    let id = InscriptionId {
      txid: txid(2),
      index: 7,
    };
    assert_eq!(id.to_string().parse::<InscriptionId>().unwrap(), id);
  }

  #[test]
  fn test_from_str_bad_separator() {
    let s = format!("{}x0", txid(1));
    assert!(matches!(
      s.parse::<InscriptionId>(),
      Err(ParseError::Separator('x'))
    ));
  }

  #[test]
  fn test_from_str_too_short() {
    assert!(matches!(
      "abc".parse::<InscriptionId>(),
      Err(ParseError::Length(3))
    ));
  }

  #[test]
  fn test_serde_as_string() {
    let id = InscriptionId::from(txid(3));
    let json = serde_json::to_string(&id).unwrap();
    assert_eq!(json, format!("\"{id}\""));
    assert_eq!(serde_json::from_str::<InscriptionId>(&json).unwrap(), id);
  }
}
