//! # ipala-types
//!
//! Shared value types for the IPALA service-node module:
//!
//! - **AccAddress**: fixed-length opaque account identifier
//! - **Coin**: denomination + non-negative integer amount
//! - **ServiceNode**: one registration per operator, backed by an escrowed bond
//! - **UnBonding**: a pending release of funds maturing at a block time
//! - **MsgClaim**: the register/update/deregister message
//! - **Params**: minimum bond and unbonding delay
//!
//! Everything here is plain data with validation. State transitions live in
//! `ipala-keeper`.

#![deny(unsafe_code)]

mod address;
mod coin;
mod error;
mod msg;
mod node;
mod params;

pub use address::{module_address, AccAddress, ADDR_LEN};
pub use coin::{validate_denom, Coin};
pub use error::{ValidationError, ValidationResult};
pub use msg::{MsgClaim, MAX_DETAILS_LEN, MAX_ENDPOINT_LEN, MAX_MONIKER_LEN, MAX_WEBSITE_LEN};
pub use node::{ServiceNode, UnBonding};
pub use params::{Params, DEFAULT_BOND_DENOM, DEFAULT_MIN_BOND, DEFAULT_UNBONDING_SECS};
