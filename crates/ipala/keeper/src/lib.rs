//! # ipala-keeper
//!
//! Service-node bonding lifecycle and time-queued unbonding engine.
//!
//! Operators register a service node by escrowing a bond with a claim
//! message. Later claims raise, lower or drop that bond, and every release
//! of escrowed funds waits in a time-bucketed queue until the block time
//! passes its maturity, when the end-of-block sweep pays it out.
//!
//! ```text
//! MsgClaim ──▶ Keeper::deliver_claim ──▶ Registry   (record + bond/moniker indices)
//!                     │                ├─▶ EscrowGateway ──▶ BankKeeper
//!                     │                └─▶ UnbondingQueue
//! end of block ──▶ Keeper::end_blocker ──▶ UnbondingQueue::drain_matured
//!                                         └─▶ EscrowGateway::release
//! ```
//!
//! Every operation is a function of stored state, the message and the block
//! header carried by [`Context`](ipala_store::Context). Nothing reads the
//! wall clock.

#![deny(unsafe_code)]

mod block;
mod claim;
mod config;
mod error;
mod escrow;
mod events;
mod invariants;
pub mod keys;
mod params;
mod querier;
mod queue;
mod registry;
mod sweeper;

pub use block::BlockResult;
pub use claim::ClaimOutcome;
pub use config::{KeeperConfig, DEFAULT_MODULE_NAME, DEFAULT_QUERY_LIMIT};
pub use error::{KeeperError, KeeperResult};
pub use escrow::EscrowGateway;
pub use events::{
    ATTRIBUTE_KEY_ACTION, ATTRIBUTE_KEY_AMOUNT, ATTRIBUTE_KEY_COMPLETION_TIME,
    ATTRIBUTE_KEY_MODULE, ATTRIBUTE_KEY_MONIKER, ATTRIBUTE_KEY_OPERATOR, ATTRIBUTE_KEY_OUTCOME,
    ATTRIBUTE_KEY_SENDER, EVENT_TYPE_CLAIM, EVENT_TYPE_COMPLETE_UNBONDING, EVENT_TYPE_MESSAGE,
};
pub use querier::QueryRequest;
pub use queue::{UnbondingBucket, UnbondingQueue};
pub use registry::Registry;
pub use sweeper::SweepReport;

use ipala_bank::BankKeeper;
use ipala_types::{module_address, AccAddress};

/// Entry point of the module.
///
/// Owns the configuration and the fund-custody collaborator. Registry, queue
/// and escrow views borrow both and are cheap to construct per call.
#[derive(Debug, Clone)]
pub struct Keeper<B> {
    config: KeeperConfig,
    bank: B,
}

impl<B: BankKeeper> Keeper<B> {
    pub fn new(config: KeeperConfig, bank: B) -> KeeperResult<Self> {
        config.validate()?;
        Ok(Self { config, bank })
    }

    pub fn config(&self) -> &KeeperConfig {
        &self.config
    }

    pub fn bank(&self) -> &B {
        &self.bank
    }

    pub fn registry(&self) -> Registry<'_> {
        Registry::new(&self.config)
    }

    pub fn unbonding_queue(&self) -> UnbondingQueue<'_> {
        UnbondingQueue::new(&self.config)
    }

    pub fn escrow(&self) -> EscrowGateway<'_, B> {
        EscrowGateway::new(&self.bank, &self.config)
    }

    /// Account holding every escrowed bond and every unmatured unbonding.
    pub fn pool_address(&self) -> AccAddress {
        module_address(&self.config.module_name)
    }
}
