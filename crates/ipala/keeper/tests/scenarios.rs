//! End-to-end bonding lifecycles driven through `Keeper::execute_block`.

use std::time::Duration;

use chrono::{DateTime, TimeZone, Utc};
use ipala_bank::{BankKeeper, StoreBank};
use ipala_keeper::{ClaimOutcome, Keeper, KeeperConfig, KeeperError, QueryRequest};
use ipala_store::{BlockHeader, Context, MemStore};
use ipala_types::{AccAddress, Coin, MsgClaim, Params, UnBonding, ADDR_LEN};

const DENOM: &str = "nch";
const DELAY: i64 = 3 * 24 * 60 * 60;

struct Chain {
    keeper: Keeper<StoreBank>,
    store: MemStore,
    height: u64,
}

impl Chain {
    fn new() -> Self {
        let params = Params::new(Coin::new(DENOM, 100), Duration::from_secs(DELAY as u64));
        let keeper = Keeper::new(KeeperConfig::with_params(params), StoreBank::new()).unwrap();
        Self {
            keeper,
            store: MemStore::new(),
            height: 0,
        }
    }

    fn fund(&mut self, who: AccAddress, amount: u64) {
        let mut ctx = Context::new(&mut self.store, BlockHeader::new(0, genesis()));
        self.keeper
            .bank()
            .mint(&mut ctx, &who, &Coin::new(DENOM, amount))
            .unwrap();
    }

    fn block(&mut self, at: DateTime<Utc>, claims: &[MsgClaim]) -> ipala_keeper::BlockResult {
        self.height += 1;
        let result = self
            .keeper
            .execute_block(&mut self.store, BlockHeader::new(self.height, at), claims)
            .unwrap();
        self.check_invariants();
        result
    }

    fn with_ctx<T>(&mut self, f: impl FnOnce(&Keeper<StoreBank>, &Context<'_>) -> T) -> T {
        let ctx = Context::new(&mut self.store, BlockHeader::new(self.height, genesis()));
        f(&self.keeper, &ctx)
    }

    fn balance(&mut self, who: AccAddress) -> u64 {
        self.with_ctx(|k, ctx| k.bank().get_balance(ctx, &who, DENOM).unwrap().amount)
    }

    fn pool(&mut self) -> u64 {
        self.with_ctx(|k, ctx| k.pool_balance(ctx, None).unwrap().amount)
    }

    fn check_invariants(&mut self) {
        self.with_ctx(|k, ctx| k.assert_invariants(ctx).unwrap());
    }
}

fn genesis() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()
}

fn secs(n: i64) -> DateTime<Utc> {
    genesis() + chrono::Duration::seconds(n)
}

fn addr(b: u8) -> AccAddress {
    AccAddress::new([b; ADDR_LEN])
}

fn claim(operator: AccAddress, moniker: &str, amount: u64) -> MsgClaim {
    MsgClaim {
        operator_address: operator,
        moniker: moniker.to_string(),
        website: "https://node.example".to_string(),
        server_endpoint: "tcp://10.0.0.1:26656".to_string(),
        details: String::new(),
        bond: Coin::new(DENOM, amount),
    }
}

#[test]
fn create_then_evict_pays_out_after_delay() {
    let mut chain = Chain::new();
    let a = addr(0xa1);
    chain.fund(a, 1_000);

    let created = chain.block(secs(0), &[claim(a, "node-a", 150)]);
    assert_eq!(
        created.tx_results[0].as_ref().unwrap(),
        &ClaimOutcome::Created {
            bond: Coin::new(DENOM, 150),
        }
    );
    assert_eq!(chain.pool(), 150);

    let now = secs(5);
    let evicted = chain.block(now, &[claim(a, "node-a", 80)]);
    let matures_at = now + chrono::Duration::seconds(DELAY);
    assert_eq!(
        evicted.tx_results[0].as_ref().unwrap(),
        &ClaimOutcome::Evicted {
            released: Coin::new(DENOM, 150),
            matures_at,
        }
    );
    let bucket = chain.with_ctx(|k, ctx| k.unbonding_queue().bucket(ctx, matures_at).unwrap());
    assert_eq!(
        bucket,
        vec![UnBonding::new(a, Coin::new(DENOM, 150), matures_at)]
    );
    assert!(chain
        .with_ctx(|k, ctx| k.registry().get(ctx, &a).unwrap())
        .is_none());
    // funds stay escrowed until maturity
    assert_eq!(chain.balance(a), 850);
    assert_eq!(chain.pool(), 150);

    let paid = chain.block(matures_at, &[]);
    assert_eq!(paid.sweep.paid.len(), 1);
    assert_eq!(chain.balance(a), 1_000);
    assert_eq!(chain.pool(), 0);
    assert!(chain
        .with_ctx(|k, ctx| k.unbonding_queue().pending(ctx).unwrap())
        .is_empty());
}

#[test]
fn increase_then_evict_releases_full_bond() {
    let mut chain = Chain::new();
    let b = addr(0xb2);
    chain.fund(b, 1_000);

    chain.block(secs(0), &[claim(b, "node-b", 100)]);
    let raised = chain.block(secs(1), &[claim(b, "node-b", 120)]);
    assert!(matches!(
        raised.tx_results[0],
        Ok(ClaimOutcome::BondIncreased { ref delta, .. }) if delta.amount == 20
    ));
    assert_eq!(chain.pool(), 120);
    assert!(chain
        .with_ctx(|k, ctx| k.unbonding_queue().pending(ctx).unwrap())
        .is_empty());

    let evicted = chain.block(secs(2), &[claim(b, "node-b", 90)]);
    assert!(matches!(
        evicted.tx_results[0],
        Ok(ClaimOutcome::Evicted { ref released, .. }) if released.amount == 120
    ));
}

#[test]
fn decrease_matures_independently_of_later_claims() {
    let mut chain = Chain::new();
    let c = addr(0xc3);
    chain.fund(c, 10_000);

    chain.block(secs(0), &[claim(c, "node-c", 1_000)]);
    chain.block(secs(10), &[claim(c, "node-c", 700)]);
    chain.block(secs(20), &[claim(c, "node-c", 500)]);
    chain.block(secs(30), &[claim(c, "node-c", 900)]);
    assert_eq!(chain.balance(c), 8_600);

    let first = chain.block(secs(10 + DELAY), &[]);
    assert_eq!(first.sweep.paid[0].amount, Coin::new(DENOM, 300));
    let second = chain.block(secs(20 + DELAY), &[]);
    assert_eq!(second.sweep.paid[0].amount, Coin::new(DENOM, 200));

    assert_eq!(chain.balance(c), 9_100);
    assert_eq!(chain.pool(), 900);
}

#[test]
fn same_block_unbondings_share_a_bucket() {
    let mut chain = Chain::new();
    let (x, y) = (addr(1), addr(2));
    chain.fund(x, 500);
    chain.fund(y, 500);
    chain.block(secs(0), &[claim(x, "x", 200), claim(y, "y", 300)]);

    chain.block(secs(7), &[claim(y, "y", 0), claim(x, "x", 150)]);
    let pending = chain.with_ctx(|k, ctx| k.unbonding_queue().pending(ctx).unwrap());
    assert_eq!(pending.len(), 1);
    let owners: Vec<_> = pending[0]
        .entries
        .iter()
        .map(|e| e.account_address)
        .collect();
    assert_eq!(owners, vec![y, x]);

    let paid = chain.block(secs(7 + DELAY + 100), &[]);
    let amounts: Vec<_> = paid.sweep.paid.iter().map(|e| e.amount.amount).collect();
    assert_eq!(amounts, vec![300, 50]);
}

#[test]
fn moniker_is_unique_among_active_nodes() {
    let mut chain = Chain::new();
    chain.fund(addr(1), 500);
    chain.fund(addr(2), 500);

    let result = chain.block(
        secs(0),
        &[claim(addr(1), "shared", 100), claim(addr(2), "shared", 100)],
    );
    assert!(result.tx_results[0].is_ok());
    assert!(matches!(result.tx_results[1], Err(KeeperError::MonikerTaken { .. })));
    assert_eq!(chain.balance(addr(2)), 500);

    // once the holder leaves, the moniker is free again
    let result = chain.block(
        secs(1),
        &[claim(addr(1), "shared", 0), claim(addr(2), "shared", 100)],
    );
    assert_eq!(result.accepted(), 2);
}

#[test]
fn failed_transfer_leaves_no_trace() {
    let mut chain = Chain::new();
    chain.fund(addr(1), 120);
    chain.block(secs(0), &[claim(addr(1), "solo", 100)]);
    let before = chain.store.digest();

    let result = chain.block(secs(1), &[claim(addr(1), "renamed", 500)]);
    assert!(result.tx_results[0]
        .as_ref()
        .is_err_and(|e| e.is_transfer_failure()));
    assert!(result.events.is_empty());
    assert_eq!(chain.store.digest(), before);
}

#[test]
fn queries_reflect_committed_state() {
    let mut chain = Chain::new();
    for b in 1..=3u8 {
        chain.fund(addr(b), 1_000);
    }
    chain.block(
        secs(0),
        &[
            claim(addr(1), "one", 300),
            claim(addr(2), "two", 100),
            claim(addr(3), "three", 200),
        ],
    );

    let top = chain.with_ctx(|k, ctx| {
        k.query(ctx, &QueryRequest::TopServiceNodes { limit: Some(1) })
            .unwrap()
    });
    assert_eq!(top[0]["moniker"], "one");

    let by_moniker = chain.with_ctx(|k, ctx| {
        k.query(
            ctx,
            &QueryRequest::ServiceNodeByMoniker {
                moniker: "three".into(),
            },
        )
        .unwrap()
    });
    assert_eq!(by_moniker["operator_address"], addr(3).to_hex());
}
