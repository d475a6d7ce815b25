mod error;
mod msg_executor;
mod num;
mod operation;
mod params;

pub(crate) use self::msg_executor::execute;
pub use self::{
  error::NumError,
  num::Num,
  operation::{Deploy, Mint, Operation, Transfer},
  params::PROTOCOL_LITERAL,
};
