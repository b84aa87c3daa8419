//! Module parameters.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::coin::Coin;
use crate::error::{ValidationError, ValidationResult};

pub const DEFAULT_BOND_DENOM: &str = "unch";
/// 100 NCH at six decimals.
pub const DEFAULT_MIN_BOND: u64 = 100_000_000;
/// Three days.
pub const DEFAULT_UNBONDING_SECS: u64 = 3 * 24 * 60 * 60;

/// Module parameters, read at the start of every claim evaluation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Params {
    /// Registrations below this bond are rejected or evicted
    pub min_bond: Coin,
    /// Delay between a bond decrease/eviction and the payout, in seconds
    #[serde(with = "duration_secs")]
    pub unbonding_time: Duration,
}

impl Params {
    pub fn new(min_bond: Coin, unbonding_time: Duration) -> Self {
        Self {
            min_bond,
            unbonding_time,
        }
    }

    pub fn validate(&self) -> ValidationResult<()> {
        self.min_bond.validate()?;
        if self.unbonding_time.is_zero() {
            return Err(ValidationError::InvalidParams("unbonding_time must be positive".into()));
        }
        self.unbonding_delay().map(|_| ())
    }

    /// The unbonding time as a signed delta suitable for block-time arithmetic.
    pub fn unbonding_delay(&self) -> ValidationResult<chrono::Duration> {
        chrono::Duration::from_std(self.unbonding_time).map_err(|_| {
            ValidationError::InvalidParams(format!(
                "unbonding_time out of range: {:?}",
                self.unbonding_time
            ))
        })
    }
}

impl Default for Params {
    fn default() -> Self {
        Self {
            min_bond: Coin::new(DEFAULT_BOND_DENOM, DEFAULT_MIN_BOND),
            unbonding_time: Duration::from_secs(DEFAULT_UNBONDING_SECS),
        }
    }
}

mod duration_secs {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(d.as_secs())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        u64::deserialize(d).map(Duration::from_secs)
    }
}
