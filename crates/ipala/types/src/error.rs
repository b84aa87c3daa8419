//! Validation errors for the shared types.

use thiserror::Error;

/// Result alias for structural validation.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Structural validation failures. None of these depend on chain state.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("invalid address: {0}")]
    InvalidAddress(String),

    #[error("empty operator address")]
    EmptyAddress,

    #[error("invalid denomination: {0}")]
    InvalidDenom(String),

    #[error("invalid coin: {0}")]
    InvalidCoin(String),

    #[error("{field} must not be empty")]
    EmptyField { field: &'static str },

    #[error("{field} too long: {len} bytes exceeds limit of {max}")]
    FieldTooLong {
        field: &'static str,
        len: usize,
        max: usize,
    },

    #[error("invalid params: {0}")]
    InvalidParams(String),
}
