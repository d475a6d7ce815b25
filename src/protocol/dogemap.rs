use serde::{Deserialize, Serialize};

pub const SUFFIX: &str = ".dogemap";
pub const MAX_NUMBER: u32 = 5_000_000;

/// A numbered claim such as `1234.dogemap`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Claim {
  pub name: String,
  pub number: u32,
}

impl Claim {
  pub fn parse(payload: &str) -> Option<Self> {
    if !payload.to_lowercase().contains(SUFFIX) {
      return None;
    }

    let number = payload.split('.').next()?.trim().parse::<u32>().ok()?;
    if number > MAX_NUMBER {
      return None;
    }

    Some(Self {
      name: payload.to_string(),
      number,
    })
  }
}
