use super::error::NumError;
use bigdecimal::{num_bigint::Sign, BigDecimal, ToPrimitive, Zero};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::{
  fmt::{Display, Formatter},
  str::FromStr,
};

/// Unsigned decimal amount used for supplies, limits and balances.
#[derive(PartialEq, PartialOrd, Debug, Clone)]
pub struct Num(BigDecimal);

impl Num {
  pub fn zero() -> Self {
    Self(BigDecimal::zero())
  }

  pub fn checked_add(&self, other: &Num) -> Result<Self, NumError> {
    Ok(Self(self.0.clone() + &other.0))
  }

  pub fn checked_sub(&self, other: &Num) -> Result<Self, NumError> {
    if self.0 < other.0 {
      return Err(NumError::Overflow {
        op: String::from("checked_sub"),
        org: self.clone(),
        other: other.clone(),
      });
    }

    Ok(Self(self.0.clone() - &other.0))
  }

  pub fn min(&self, other: &Num) -> Self {
    if self.0 <= other.0 {
      self.clone()
    } else {
      other.clone()
    }
  }

  pub fn sign(&self) -> Sign {
    self.0.sign()
  }

  pub fn is_positive(&self) -> bool {
    self.sign() == Sign::Plus
  }

  pub fn is_zero(&self) -> bool {
    self.0.is_zero()
  }

  /// Lossy conversion for sorted-set scores.
  pub fn to_f64(&self) -> f64 {
    self.0.to_f64().unwrap_or(f64::MAX)
  }
}

impl Default for Num {
  fn default() -> Self {
    Self::zero()
  }
}

impl From<u64> for Num {
  fn from(n: u64) -> Self {
    Self(BigDecimal::from(n))
  }
}

impl FromStr for Num {
  type Err = NumError;

  /// Accepts ASCII digits with at most one decimal point, optionally
  /// surrounded by whitespace. Signs, exponents and group separators are
  /// rejected.
  fn from_str(s: &str) -> Result<Self, Self::Err> {
    let trimmed = s.trim();
    let digits = trimmed.chars().filter(|c| c.is_ascii_digit()).count();
    let points = trimmed.chars().filter(|c| *c == '.').count();

    if digits == 0 || points > 1 || digits + points != trimmed.len() {
      return Err(NumError::InvalidNum(s.to_string()));
    }

    let normalized = match (trimmed.starts_with('.'), trimmed.ends_with('.')) {
      (true, _) => format!("0{trimmed}"),
      (_, true) => format!("{trimmed}0"),
      _ => trimmed.to_string(),
    };

    let num =
      BigDecimal::from_str(&normalized).map_err(|_| NumError::InvalidNum(s.to_string()))?;

    Ok(Self(num))
  }
}

impl Display for Num {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    self.0.fmt(f)
  }
}

impl Serialize for Num {
  fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
  where
    S: Serializer,
  {
    let s = self.to_string();
    serializer.serialize_str(&s)
  }
}

impl<'de> Deserialize<'de> for Num {
  fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
  where
    D: Deserializer<'de>,
  {
    let s = String::deserialize(deserializer)?;
    Ok(Self(
      BigDecimal::from_str(&s).map_err(serde::de::Error::custom)?,
    ))
  }
}
