//! Transaction messages.

use serde::{Deserialize, Serialize};

use crate::address::AccAddress;
use crate::coin::Coin;
use crate::error::{ValidationError, ValidationResult};

pub const MAX_MONIKER_LEN: usize = 70;
pub const MAX_WEBSITE_LEN: usize = 140;
pub const MAX_ENDPOINT_LEN: usize = 140;
pub const MAX_DETAILS_LEN: usize = 280;

/// Register, update or deregister a service node.
///
/// The same message covers every case: the keeper compares `bond` against the
/// current minimum bond and the existing record to decide what happens. A
/// zero bond is legal and deregisters the operator.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MsgClaim {
    pub operator_address: AccAddress,
    pub moniker: String,
    #[serde(default)]
    pub website: String,
    #[serde(default)]
    pub server_endpoint: String,
    #[serde(default)]
    pub details: String,
    pub bond: Coin,
}

impl MsgClaim {
    /// Stateless checks run before the message reaches the keeper.
    pub fn validate_basic(&self) -> ValidationResult<()> {
        if self.operator_address.is_empty() {
            return Err(ValidationError::EmptyAddress);
        }
        if self.moniker.trim().is_empty() {
            return Err(ValidationError::EmptyField { field: "moniker" });
        }
        check_len("moniker", &self.moniker, MAX_MONIKER_LEN)?;
        check_len("website", &self.website, MAX_WEBSITE_LEN)?;
        check_len("server_endpoint", &self.server_endpoint, MAX_ENDPOINT_LEN)?;
        check_len("details", &self.details, MAX_DETAILS_LEN)?;
        self.bond.validate()
    }
}

fn check_len(field: &'static str, value: &str, max: usize) -> ValidationResult<()> {
    if value.len() > max {
        return Err(ValidationError::FieldTooLong {
            field,
            len: value.len(),
            max,
        });
    }
    Ok(())
}
