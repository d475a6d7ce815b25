use super::{params::*, Num};
use crate::{datastore::Tick, protocol::JsonError};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::str::FromStr;

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(tag = "op")]
pub enum Operation {
  #[serde(rename = "deploy")]
  Deploy(Deploy),
  #[serde(rename = "mint")]
  Mint(Mint),
  #[serde(rename = "transfer")]
  Transfer(Transfer),
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Deploy {
  pub tick: Tick,
  pub max: Num,
  pub lim: Num,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub dec: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Mint {
  pub tick: Tick,
  pub amt: Num,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Transfer {
  pub tick: Tick,
  pub amt: Num,
}

#[derive(Deserialize)]
struct RawOperation {
  p: Option<String>,
  op: Option<String>,
  tick: Option<String>,
  max: Option<String>,
  lim: Option<String>,
  amt: Option<String>,
  dec: Option<Value>,
}

impl Operation {
  pub fn tick(&self) -> &Tick {
    match self {
      Self::Deploy(deploy) => &deploy.tick,
      Self::Mint(mint) => &mint.tick,
      Self::Transfer(transfer) => &transfer.tick,
    }
  }

  /// Validates a DRC-20 payload. Any failed predicate rejects the whole
  /// payload.
  pub fn from_json(json: &Map<String, Value>) -> Result<Self, JsonError> {
    let raw: RawOperation = serde_json::from_value(Value::Object(json.clone()))
      .map_err(|e| JsonError::ParseOperationJsonError(e.to_string()))?;

    if raw.p.as_deref() != Some(PROTOCOL_LITERAL) {
      return Err(JsonError::UnsupportedProtocol(raw.p));
    }

    let tick = raw.tick.ok_or(JsonError::MissingField("tick"))?;
    let tick = Tick::from_str(&tick).map_err(|_| JsonError::InvalidTick(tick))?;

    match raw.op.as_deref() {
      Some("deploy") => {
        let max = raw.max.ok_or(JsonError::MissingField("max"))?;
        if max.chars().count() > MAX_SUPPLY_WIDTH {
          return Err(JsonError::InvalidNumber {
            field: "max",
            value: max,
          });
        }
        Ok(Self::Deploy(Deploy {
          tick,
          max: positive("max", &max)?,
          lim: positive("lim", &raw.lim.ok_or(JsonError::MissingField("lim"))?)?,
          dec: raw.dec.as_ref().and_then(decimals),
        }))
      }
      Some("mint") => Ok(Self::Mint(Mint {
        tick,
        amt: positive("amt", &raw.amt.ok_or(JsonError::MissingField("amt"))?)?,
      })),
      Some("transfer") => Ok(Self::Transfer(Transfer {
        tick,
        amt: positive("amt", &raw.amt.ok_or(JsonError::MissingField("amt"))?)?,
      })),
      _ => Err(JsonError::UnsupportedOperation(raw.op)),
    }
  }
}

fn positive(field: &'static str, value: &str) -> Result<Num, JsonError> {
  match Num::from_str(value) {
    Ok(num) if num.is_positive() => Ok(num),
    _ => Err(JsonError::InvalidNumber {
      field,
      value: value.to_string(),
    }),
  }
}

fn decimals(value: &Value) -> Option<u32> {
  match value {
    Value::String(s) => s.trim().parse().ok(),
    Value::Number(n) => n.as_u64().and_then(|n| u32::try_from(n).ok()),
    _ => None,
  }
}
