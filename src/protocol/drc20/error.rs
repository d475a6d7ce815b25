use super::Num;

#[derive(Debug, PartialEq, thiserror::Error)]
pub enum NumError {
  #[error("{op} overflow: original: {org}, other: {other}")]
  Overflow { op: String, org: Num, other: Num },

  #[error("invalid number: {0}")]
  InvalidNum(String),
}
