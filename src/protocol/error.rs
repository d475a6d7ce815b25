use super::drc20::NumError;
use crate::datastore::{DataStoreReadOnly, LedgerError};

#[derive(Debug, thiserror::Error)]
pub enum Error<L: DataStoreReadOnly> {
  #[error("ledger error: {0}")]
  Ledger(LedgerError),

  #[error("datastore error: {0}")]
  DataStore(<L>::Error),

  #[error("drc20 num error: {0}")]
  Num(NumError),
}

#[derive(Debug, PartialEq, thiserror::Error)]
pub enum JsonError {
  #[error("invalid json string")]
  InvalidJson,

  #[error("field `{0}` is not a string")]
  NotAString(String),

  #[error("unsupported protocol: {0:?}")]
  UnsupportedProtocol(Option<String>),

  #[error("unsupported operation: {0:?}")]
  UnsupportedOperation(Option<String>),

  #[error("missing field `{0}`")]
  MissingField(&'static str),

  #[error("invalid tick: {0}")]
  InvalidTick(String),

  #[error("invalid `{field}` value: {value}")]
  InvalidNumber { field: &'static str, value: String },

  #[error("invalid name: {0}")]
  InvalidName(String),

  #[error("parse operation json error: {0}")]
  ParseOperationJsonError(String),
}

impl<L: DataStoreReadOnly> From<LedgerError> for Error<L> {
  fn from(e: LedgerError) -> Self {
    Self::Ledger(e)
  }
}

impl<L: DataStoreReadOnly> From<NumError> for Error<L> {
  fn from(e: NumError) -> Self {
    Self::Num(e)
  }
}
