//! Service node and unbonding records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::address::AccAddress;
use crate::coin::Coin;
use crate::msg::MsgClaim;

/// A registered service node.
///
/// A record exists only while its bond sits in the module's pooled escrow
/// account.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceNode {
    /// Primary key, immutable for the life of the record
    pub operator_address: AccAddress,
    /// Unique among active registrations
    pub moniker: String,
    pub website: String,
    pub server_endpoint: String,
    pub details: String,
    /// Currently escrowed stake
    pub bond: Coin,
}

impl ServiceNode {
    /// Build the record a claim message describes.
    pub fn from_claim(msg: &MsgClaim) -> Self {
        Self {
            operator_address: msg.operator_address,
            moniker: msg.moniker.clone(),
            website: msg.website.clone(),
            server_endpoint: msg.server_endpoint.clone(),
            details: msg.details.clone(),
            bond: msg.bond.clone(),
        }
    }

    /// Whether `other` carries the same profile (everything except the bond).
    pub fn same_profile(&self, other: &ServiceNode) -> bool {
        self.moniker == other.moniker
            && self.website == other.website
            && self.server_endpoint == other.server_endpoint
            && self.details == other.details
    }
}

/// One pending release of funds back to an account.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnBonding {
    pub account_address: AccAddress,
    pub amount: Coin,
    pub end_time: DateTime<Utc>,
}

impl UnBonding {
    pub fn new(account_address: AccAddress, amount: Coin, end_time: DateTime<Utc>) -> Self {
        Self {
            account_address,
            amount,
            end_time,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::address::ADDR_LEN;

    fn claim() -> MsgClaim {
        MsgClaim {
            operator_address: AccAddress::new([7u8; ADDR_LEN]),
            moniker: "relay-1".into(),
            website: "https://relay.example".into(),
            server_endpoint: "tcp://10.0.0.1:26656".into(),
            details: "primary relay".into(),
            bond: Coin::new("nch", 150),
        }
    }

    #[test]
    fn from_claim_copies_everything() {
        let msg = claim();
        let node = ServiceNode::from_claim(&msg);
        assert_eq!(node.operator_address, msg.operator_address);
        assert_eq!(node.moniker, "relay-1");
        assert_eq!(node.bond, Coin::new("nch", 150));
    }

    #[test]
    fn same_profile_ignores_bond() {
        let a = ServiceNode::from_claim(&claim());
        let mut b = a.clone();
        b.bond.amount = 999;
        assert!(a.same_profile(&b));
        b.details = "changed".into();
        assert!(!a.same_profile(&b));
    }

    #[test]
    fn record_json_roundtrip() {
        let node = ServiceNode::from_claim(&claim());
        let bytes = serde_json::to_vec(&node).unwrap();
        let back: ServiceNode = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(back, node);
    }
}
