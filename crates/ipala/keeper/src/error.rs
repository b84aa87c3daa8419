//! Keeper error type.

use ipala_bank::BankError;
use ipala_types::{AccAddress, Coin, ValidationError};
use thiserror::Error;

pub type KeeperResult<T> = Result<T, KeeperError>;

/// Errors from the IPALA keeper.
///
/// Three classes matter to callers:
/// - validation rejections (`InsufficientBond`, `InvalidBondDenom`,
///   `MonikerTaken`, `Validation`) leave state untouched
/// - `Bank` aborts the claim that triggered the transfer
/// - `SweepPayout` is fatal to the block, see [`KeeperError::is_fatal`]
#[derive(Error, Debug, Clone)]
pub enum KeeperError {
    // --- Claim rejections ---
    #[error("insufficient bond: requested {requested}, minimum is {minimum}")]
    InsufficientBond { requested: Coin, minimum: Coin },

    #[error("invalid bond denomination: expected {expected}, got {got}")]
    InvalidBondDenom { expected: String, got: String },

    #[error("moniker {moniker:?} is already taken by {owner}")]
    MonikerTaken { moniker: String, owner: AccAddress },

    #[error(transparent)]
    Validation(#[from] ValidationError),

    // --- Fund movement ---
    #[error("fund transfer failed: {0}")]
    Bank(#[from] BankError),

    #[error("unbonding payout of {amount} to {account} failed: {source}")]
    SweepPayout {
        account: AccAddress,
        amount: Coin,
        source: BankError,
    },

    // --- Store / configuration ---
    #[error("not found: {0}")]
    NotFound(String),

    #[error("corrupt store value: {0}")]
    Codec(String),

    #[error("arithmetic overflow: {0}")]
    Overflow(String),

    #[error("invariant broken: {0}")]
    InvariantBroken(String),

    #[error("configuration error: {0}")]
    Config(String),
}

impl KeeperError {
    /// Errors the block driver must not swallow: the block cannot be
    /// committed and the node has to halt.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            KeeperError::SweepPayout { .. } | KeeperError::InvariantBroken(_)
        )
    }

    /// Errors reported by the fund-custody collaborator during a claim.
    pub fn is_transfer_failure(&self) -> bool {
        matches!(self, KeeperError::Bank(_))
    }

    pub(crate) fn codec(err: impl std::fmt::Display) -> Self {
        KeeperError::Codec(err.to_string())
    }
}
