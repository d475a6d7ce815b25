use bitcoin::{
  opcodes::{self, Class, ClassifyContext},
  script::{self, Instruction},
  Script,
};

pub const PROTOCOL_ID: &[u8] = b"ord";
const MAX_NUMBER_LEN: usize = 4;

/// A single instruction of an unlocking script.
#[derive(Debug, Clone, PartialEq)]
pub enum ScriptToken {
  Push(Vec<u8>),
  Op(opcodes::All),
}

impl ScriptToken {
  pub fn as_bytes(&self) -> Option<&[u8]> {
    match self {
      Self::Push(bytes) => Some(bytes),
      Self::Op(_) => None,
    }
  }

  /// Small-integer opcodes and pushes of at most four bytes read as minimal
  /// script numbers. An empty push is zero.
  pub fn as_number(&self) -> Option<i64> {
    match self {
      Self::Push(bytes) if bytes.len() <= MAX_NUMBER_LEN => script::read_scriptint(bytes).ok(),
      Self::Push(_) => None,
      Self::Op(op) => match op.classify(ClassifyContext::Legacy) {
        Class::PushNum(n) => Some(n.into()),
        _ => None,
      },
    }
  }
}

/// Splits a script into tokens, stopping at the first malformed instruction.
pub fn tokenize(script: &Script) -> Vec<ScriptToken> {
  script
    .instructions()
    .map_while(Result::ok)
    .map(|instruction| match instruction {
      Instruction::PushBytes(bytes) => ScriptToken::Push(bytes.as_bytes().to_vec()),
      Instruction::Op(op) => ScriptToken::Op(op),
    })
    .collect()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Envelope {
  pub content_type: String,
  pub payload: String,
}

impl Envelope {
  /// `ord <n> <content type> <n> <payload> ...`
  pub fn from_tokens(tokens: &[ScriptToken]) -> Option<Self> {
    if tokens.first()?.as_bytes()? != PROTOCOL_ID {
      return None;
    }

    let content_type = String::from_utf8_lossy(tokens.get(2)?.as_bytes()?).into_owned();
    let envelope = Self {
      content_type,
      payload: String::from_utf8_lossy(tokens.get(4)?.as_bytes()?).into_owned(),
    };

    if envelope.media_type().matches('/').count() != 1 {
      return None;
    }

    Some(envelope)
  }

  /// The content type without parameters.
  pub fn media_type(&self) -> &str {
    self
      .content_type
      .split(';')
      .next()
      .unwrap_or_default()
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use bitcoin::script::{Builder, PushBytesBuf};

  fn push(bytes: &[u8]) -> PushBytesBuf {
    PushBytesBuf::try_from(bytes.to_vec()).unwrap()
  }

  fn envelope(content_type: &str, payload: &str) -> bitcoin::ScriptBuf {
    Builder::new()
      .push_slice(push(PROTOCOL_ID))
      .push_int(1)
      .push_slice(push(content_type.as_bytes()))
      .push_int(0)
      .push_slice(push(payload.as_bytes()))
      .into_script()
  }

  #[test]
  fn test_from_tokens() {
    let script = envelope("text/plain;charset=utf-8", "hello");
    assert_eq!(
      Envelope::from_tokens(&tokenize(&script)),
      Some(Envelope {
        content_type: "text/plain;charset=utf-8".to_string(),
        payload: "hello".to_string(),
      })
    );
  }

  #[test]
  fn test_media_type() {
    let envelope = Envelope {
      content_type: "application/json; charset=utf-8".to_string(),
      payload: String::new(),
    };
    assert_eq!(envelope.media_type(), "application/json");
  }

  #[test]
  fn test_reject_bad_content_type() {
    assert_eq!(Envelope::from_tokens(&tokenize(&envelope("text", "x"))), None);
    assert_eq!(
      Envelope::from_tokens(&tokenize(&envelope("text/plain/x", "x"))),
      None
    );
    assert!(Envelope::from_tokens(&tokenize(&envelope("image/png;a/b", "x"))).is_some());
  }

  #[test]
  fn test_reject_missing_marker() {
    let script = Builder::new()
      .push_slice(push(b"ore"))
      .push_int(1)
      .push_slice(push(b"text/plain"))
      .push_int(0)
      .push_slice(push(b"x"))
      .into_script();
    assert_eq!(Envelope::from_tokens(&tokenize(&script)), None);
  }

  #[test]
  fn test_reject_truncated() {
    let script = Builder::new()
      .push_slice(push(PROTOCOL_ID))
      .push_int(1)
      .push_slice(push(b"text/plain"))
      .into_script();
    assert_eq!(Envelope::from_tokens(&tokenize(&script)), None);
  }

  #[test]
  fn test_numbers() {
    let script = Builder::new()
      .push_int(0)
      .push_int(5)
      .push_int(16)
      .push_int(300)
      .push_slice(push(&[0xff; 5]))
      .push_opcode(opcodes::all::OP_CHECKSIG)
      .into_script();

    let numbers = tokenize(&script)
      .iter()
      .map(ScriptToken::as_number)
      .collect::<Vec<_>>();

    assert_eq!(
      numbers,
      vec![Some(0), Some(5), Some(16), Some(300), None, None]
    );
  }
}
