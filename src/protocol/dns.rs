use super::JsonError;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub const PROTOCOL_LITERAL: &str = "dns";
pub const OP_REGISTER: &str = "reg";
pub const EXTENSIONS: [&str; 4] = ["x", "doge", "hub", "oifi"];

/// A name registration such as `foo.doge`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Registration {
  pub name: String,
}

impl Registration {
  pub fn from_json(json: &Map<String, Value>) -> Result<Self, JsonError> {
    let field = |key: &'static str| json.get(key).and_then(Value::as_str);

    let p = field("p");
    if p != Some(PROTOCOL_LITERAL) {
      return Err(JsonError::UnsupportedProtocol(p.map(str::to_string)));
    }

    let op = field("op");
    if op != Some(OP_REGISTER) {
      return Err(JsonError::UnsupportedOperation(op.map(str::to_string)));
    }

    let name = field("name").ok_or(JsonError::MissingField("name"))?;
    match name.split('.').collect::<Vec<_>>().as_slice() {
      [_, extension] if EXTENSIONS.contains(extension) => Ok(Self {
        name: name.to_string(),
      }),
      _ => Err(JsonError::InvalidName(name.to_string())),
    }
  }
}
