//! Drives a scenario block by block and collects a report.

use chrono::{DateTime, Utc};
use ipala_bank::StoreBank;
use ipala_keeper::{BlockResult, ClaimOutcome, Keeper, UnbondingBucket};
use ipala_store::{BlockHeader, Context, Event, MemStore};
use ipala_types::{AccAddress, Coin, MsgClaim, ServiceNode, UnBonding};
use serde::Serialize;
use tracing::{debug, info};

use crate::scenario::SimConfig;

#[derive(Debug, Clone, Serialize)]
pub struct SimReport {
    pub blocks: Vec<BlockReport>,
    pub service_nodes: Vec<ServiceNode>,
    pub pending_unbondings: Vec<UnbondingBucket>,
    pub pool: Coin,
    pub balances: Vec<AccountBalances>,
    /// BLAKE3 digest of the final store
    pub state_digest: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct BlockReport {
    pub height: u64,
    pub time: DateTime<Utc>,
    pub txs: Vec<TxReport>,
    pub paid: Vec<UnBonding>,
    pub events: Vec<Event>,
}

#[derive(Debug, Clone, Serialize)]
pub struct TxReport {
    pub operator: AccAddress,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub outcome: Option<ClaimOutcome>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct AccountBalances {
    pub address: AccAddress,
    pub coins: Vec<Coin>,
}

#[derive(Debug, Clone, Copy)]
pub struct RunOptions {
    /// Run the keeper invariants after every block
    pub check_invariants: bool,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            check_invariants: true,
        }
    }
}

/// Replay a scenario from genesis against a fresh in-memory store.
pub fn run(config: &SimConfig, options: RunOptions) -> anyhow::Result<SimReport> {
    let bank = StoreBank::new();
    let keeper = Keeper::new(config.keeper.clone(), bank)?;
    let mut store = MemStore::new();

    {
        let mut ctx = Context::new(&mut store, BlockHeader::new(0, config.genesis_time));
        for account in &config.accounts {
            for coin in &account.coins {
                bank.mint(&mut ctx, &account.address, coin)?;
            }
        }
    }
    info!(accounts = config.accounts.len(), "Genesis balances loaded");

    let mut time = config.genesis_time;
    let mut blocks = Vec::with_capacity(config.blocks.len());
    for (i, spec) in config.blocks.iter().enumerate() {
        let delta = i64::try_from(spec.advance_secs)
            .ok()
            .and_then(chrono::Duration::try_seconds)
            .ok_or_else(|| anyhow::anyhow!("advance_secs out of range in block {}", i + 1))?;
        time = time
            .checked_add_signed(delta)
            .ok_or_else(|| anyhow::anyhow!("block time overflow at block {}", i + 1))?;
        let header = BlockHeader::new(i as u64 + 1, time);

        if let Some(params) = &spec.params {
            let mut ctx = Context::new(&mut store, header.clone());
            keeper.set_params(&mut ctx, params)?;
        }

        let result = keeper.execute_block(&mut store, header.clone(), &spec.claims)?;
        debug!(height = result.height, digest = %store.digest(), "Block committed");

        if options.check_invariants {
            let ctx = Context::new(&mut store, header.clone());
            keeper.assert_invariants(&ctx)?;
        }
        blocks.push(block_report(header.time, &spec.claims, result));
    }

    let ctx = Context::new(&mut store, BlockHeader::new(blocks.len() as u64, time));
    let service_nodes = keeper.registry().list_all_by_bond(&ctx)?;
    let pending_unbondings = keeper.unbonding_queue().pending(&ctx)?;
    let pool = keeper.pool_balance(&ctx, None)?;
    let balances = config
        .accounts
        .iter()
        .map(|account| -> anyhow::Result<AccountBalances> {
            Ok(AccountBalances {
                address: account.address,
                coins: bank.get_all_balances(&ctx, &account.address)?,
            })
        })
        .collect::<anyhow::Result<Vec<_>>>()?;
    drop(ctx);

    Ok(SimReport {
        blocks,
        service_nodes,
        pending_unbondings,
        pool,
        balances,
        state_digest: store.digest(),
    })
}

fn block_report(
    time: DateTime<Utc>,
    claims: &[MsgClaim],
    result: BlockResult,
) -> BlockReport {
    let txs = claims
        .iter()
        .zip(result.tx_results)
        .map(|(msg, outcome)| match outcome {
            Ok(outcome) => TxReport {
                operator: msg.operator_address,
                outcome: Some(outcome),
                error: None,
            },
            Err(err) => TxReport {
                operator: msg.operator_address,
                outcome: None,
                error: Some(err.to_string()),
            },
        })
        .collect();
    BlockReport {
        height: result.height,
        time,
        txs,
        paid: result.sweep.paid,
        events: result.events,
    }
}
