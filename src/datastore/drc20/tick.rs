use super::*;
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use std::{fmt, str::FromStr};

pub const TICK_CHAR_COUNT: usize = 4;
pub const RESERVED_TICK: &str = "𝕏";

/// Canonical, lower-cased ticker symbol.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Tick(String);

impl FromStr for Tick {
  type Err = LedgerError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    if s.is_empty() || (s.chars().count() != TICK_CHAR_COUNT && s != RESERVED_TICK) {
      return Err(LedgerError::InvalidTick(s.to_string()));
    }
    Ok(Self(s.to_lowercase()))
  }
}

impl Tick {
  pub fn as_str(&self) -> &str {
    &self.0
  }
}

impl fmt::Display for Tick {
  fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
    f.write_str(&self.0)
  }
}

impl Serialize for Tick {
  fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
  where
    S: Serializer,
  {
    self.as_str().serialize(serializer)
  }
}

/// Reads back a stored tick. The length rule applies to the inscribed symbol
/// before lower-casing, so the canonical form is taken as is.
impl<'de> Deserialize<'de> for Tick {
  fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
  where
    D: Deserializer<'de>,
  {
    let tick = String::deserialize(deserializer)?;
    if tick.is_empty() || tick.to_lowercase() != tick {
      return Err(de::Error::custom(format!(
        "deserialize tick error: not a canonical tick: {tick}"
      )));
    }
    Ok(Self(tick))
  }
}
