mod balance;
mod tick;
mod token_info;

pub use self::{balance::Balance, tick::Tick, token_info::TokenInfo};
use super::LedgerError;
