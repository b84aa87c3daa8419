//! Denominations and single-denom coin amounts.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{ValidationError, ValidationResult};

const MIN_DENOM_LEN: usize = 3;
const MAX_DENOM_LEN: usize = 128;

/// Check a denomination: a leading ASCII letter followed by 2..=127
/// alphanumerics or one of `/ : . _ -`.
pub fn validate_denom(denom: &str) -> ValidationResult<()> {
    let len = denom.len();
    if !(MIN_DENOM_LEN..=MAX_DENOM_LEN).contains(&len) {
        return Err(ValidationError::InvalidDenom(denom.to_string()));
    }
    let mut chars = denom.chars();
    let first_ok = chars.next().is_some_and(|c| c.is_ascii_alphabetic());
    let rest_ok = chars.all(is_denom_char);
    if first_ok && rest_ok {
        Ok(())
    } else {
        Err(ValidationError::InvalidDenom(denom.to_string()))
    }
}

fn is_denom_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '/' | ':' | '.' | '_' | '-')
}

/// A single-denomination amount.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Coin {
    pub denom: String,
    pub amount: u64,
}

impl Coin {
    pub fn new(denom: impl Into<String>, amount: u64) -> Self {
        Self {
            denom: denom.into(),
            amount,
        }
    }

    pub fn zero(denom: impl Into<String>) -> Self {
        Self::new(denom, 0)
    }

    pub fn validate(&self) -> ValidationResult<()> {
        validate_denom(&self.denom)
    }

    pub fn is_zero(&self) -> bool {
        self.amount == 0
    }

    pub fn same_denom(&self, other: &Coin) -> bool {
        self.denom == other.denom
    }

    pub fn checked_add(&self, other: &Coin) -> ValidationResult<Coin> {
        self.ensure_same_denom(other)?;
        let amount = self
            .amount
            .checked_add(other.amount)
            .ok_or_else(|| ValidationError::InvalidCoin(format!("{self} + {other} overflows")))?;
        Ok(Coin::new(self.denom.clone(), amount))
    }

    pub fn checked_sub(&self, other: &Coin) -> ValidationResult<Coin> {
        self.ensure_same_denom(other)?;
        let amount = self
            .amount
            .checked_sub(other.amount)
            .ok_or_else(|| ValidationError::InvalidCoin(format!("{self} - {other} underflows")))?;
        Ok(Coin::new(self.denom.clone(), amount))
    }

    fn ensure_same_denom(&self, other: &Coin) -> ValidationResult<()> {
        if self.same_denom(other) {
            Ok(())
        } else {
            Err(ValidationError::InvalidCoin(format!(
                "denomination mismatch: {} vs {}",
                self.denom, other.denom
            )))
        }
    }
}

impl fmt::Display for Coin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.amount, self.denom)
    }
}

/// Parses the compact `<amount><denom>` form, e.g. `150nch`.
impl FromStr for Coin {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let split = s
            .find(|c: char| !c.is_ascii_digit())
            .ok_or_else(|| ValidationError::InvalidCoin(s.to_string()))?;
        let (amount, denom) = s.split_at(split);
        if amount.is_empty() {
            return Err(ValidationError::InvalidCoin(s.to_string()));
        }
        let amount = amount
            .parse::<u64>()
            .map_err(|e| ValidationError::InvalidCoin(format!("{s}: {e}")))?;
        validate_denom(denom)?;
        Ok(Coin::new(denom, amount))
    }
}
