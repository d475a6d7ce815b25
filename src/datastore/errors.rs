use crate::{protocol::drc20::NumError, InscriptionId};

/// Unmet preconditions while applying an event. Every variant is a no-op for
/// the read models.
#[derive(Debug, PartialEq, thiserror::Error)]
pub enum LedgerError {
  #[error("inscription {0} not found")]
  InscriptionNotFound(InscriptionId),

  #[error("inscription {0} does not carry the expected content")]
  UnexpectedContent(InscriptionId),

  #[error("invalid tick: {0}")]
  InvalidTick(String),

  #[error("tick {0} not found")]
  TickNotFound(String),

  #[error("duplicate tick deploy: {0}")]
  DuplicateTick(String),

  #[error("amount {amt} exceeds limit {lim}")]
  AmountExceedLimit { amt: String, lim: String },

  #[error("tick {0} has been fully minted")]
  TickMinted(String),

  #[error("balance of {address} for {tick} not found")]
  BalanceNotFound { address: String, tick: String },

  #[error("insufficient {kind} balance: {have} < {need}")]
  InsufficientBalance {
    kind: &'static str,
    have: String,
    need: String,
  },

  #[error("transfer event without sender")]
  MissingSender,

  #[error("`{0}` is already registered")]
  DuplicateRegistration(String),

  #[error("inscription {inscription_id} does not own `{key}`")]
  NotOwner {
    key: String,
    inscription_id: InscriptionId,
  },

  #[error("ownership of `{0}` not found")]
  OwnershipNotFound(String),

  #[error("num error: {0}")]
  Num(#[from] NumError),
}
