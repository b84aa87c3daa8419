//! End-of-block payout of matured unbondings.

use ipala_bank::BankKeeper;
use ipala_store::Context;
use ipala_types::UnBonding;
use serde::{Deserialize, Serialize};
use tracing::{error, info};

use crate::error::{KeeperError, KeeperResult};
use crate::events::complete_unbonding_event;
use crate::Keeper;

/// Entries paid out by one end-of-block sweep.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SweepReport {
    pub height: u64,
    pub paid: Vec<UnBonding>,
}

impl<B: BankKeeper> Keeper<B> {
    /// Pay out every unbonding that matured at or before the block time.
    ///
    /// Runs in its own branch: a failed payout leaves every bucket in place
    /// and nothing paid. The error is fatal to the block.
    pub fn end_blocker(&self, ctx: &mut Context<'_>) -> KeeperResult<SweepReport> {
        let height = ctx.block_height();
        let now = ctx.block_time();

        let result: KeeperResult<Vec<UnBonding>> = ctx.run_atomic(|branch| {
            let matured = self.unbonding_queue().drain_matured(branch, now)?;
            let escrow = self.escrow();
            for entry in &matured {
                escrow
                    .release(branch, &entry.account_address, &entry.amount)
                    .map_err(|err| match err {
                        KeeperError::Bank(source) => KeeperError::SweepPayout {
                            account: entry.account_address,
                            amount: entry.amount.clone(),
                            source,
                        },
                        other => other,
                    })?;
                branch.emit(complete_unbonding_event(entry));
            }
            Ok(matured)
        });

        match result {
            Ok(paid) => {
                if !paid.is_empty() {
                    info!(height, paid = paid.len(), "Matured unbondings paid out");
                }
                Ok(SweepReport { height, paid })
            }
            Err(err) => {
                error!(height, block_time = %now, error = %err, "Unbonding sweep failed");
                Err(err)
            }
        }
    }
}
