//! Block driver: delivers a block's claims, then sweeps, on one cache branch.

use ipala_bank::BankKeeper;
use ipala_store::{BlockHeader, CacheStore, Context, Event, KvStore};
use ipala_types::MsgClaim;
use tracing::info;

use crate::claim::ClaimOutcome;
use crate::error::KeeperResult;
use crate::sweeper::SweepReport;
use crate::Keeper;

/// Everything one block produced.
#[derive(Debug, Clone)]
pub struct BlockResult {
    pub height: u64,
    /// One entry per claim, in delivery order
    pub tx_results: Vec<KeeperResult<ClaimOutcome>>,
    pub sweep: SweepReport,
    pub events: Vec<Event>,
}

impl BlockResult {
    pub fn accepted(&self) -> usize {
        self.tx_results.iter().filter(|r| r.is_ok()).count()
    }

    pub fn rejected(&self) -> usize {
        self.tx_results.len() - self.accepted()
    }
}

impl<B: BankKeeper> Keeper<B> {
    /// Deliver `claims` in order, then sweep matured unbondings.
    ///
    /// A rejected claim is recorded and the block continues. A sweep failure
    /// aborts the block and nothing it did reaches `store`.
    pub fn execute_block(
        &self,
        store: &mut dyn KvStore,
        header: BlockHeader,
        claims: &[MsgClaim],
    ) -> KeeperResult<BlockResult> {
        let height = header.height;
        let mut cache = CacheStore::new(store);
        let (tx_results, sweep, events) = {
            let mut ctx = Context::new(&mut cache, header);
            let tx_results: Vec<_> = claims
                .iter()
                .map(|msg| self.deliver_claim(&mut ctx, msg))
                .collect();
            let sweep = self.end_blocker(&mut ctx)?;
            (tx_results, sweep, ctx.take_events())
        };
        cache.write();

        let result = BlockResult {
            height,
            tx_results,
            sweep,
            events,
        };
        info!(
            height,
            accepted = result.accepted(),
            rejected = result.rejected(),
            paid = result.sweep.paid.len(),
            "Block executed"
        );
        Ok(result)
    }
}
