//! Bank errors.

use ipala_types::{AccAddress, Coin};
use thiserror::Error;

pub type BankResult<T> = Result<T, BankError>;

/// Errors reported by the fund-custody collaborator.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BankError {
    #[error("insufficient funds: {address} has {available}, needs {required}")]
    InsufficientFunds {
        address: AccAddress,
        required: Coin,
        available: Coin,
    },

    #[error("invalid denomination: {0}")]
    InvalidDenom(String),

    #[error("balance overflow for {address} in {denom}")]
    Overflow { address: AccAddress, denom: String },

    #[error("corrupt balance record: {0}")]
    Codec(String),
}
