//! Claim state machine.
//!
//! Decides whether a claim creates, resizes, updates or evicts a service node,
//! and moves escrow and queue state to match inside one atomic branch.

use std::cmp::Ordering;

use chrono::{DateTime, Utc};
use ipala_bank::BankKeeper;
use ipala_store::Context;
use ipala_types::{AccAddress, Coin, MsgClaim, Params, ServiceNode, UnBonding};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::{KeeperError, KeeperResult};
use crate::events::{claim_event, message_event};
use crate::Keeper;

/// Which transition a successful claim took.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ClaimOutcome {
    /// First sufficient claim; the full bond moved into escrow
    Created { bond: Coin },
    /// The difference moved into escrow immediately
    BondIncreased {
        previous: Coin,
        bond: Coin,
        delta: Coin,
    },
    /// The difference stays escrowed until `matures_at`
    BondDecreased {
        previous: Coin,
        bond: Coin,
        delta: Coin,
        matures_at: DateTime<Utc>,
    },
    /// Bond unchanged, profile rewritten
    ProfileUpdated { bond: Coin },
    /// Record deleted; the whole bond is released at `matures_at`
    Evicted {
        released: Coin,
        matures_at: DateTime<Utc>,
    },
}

impl ClaimOutcome {
    pub fn action(&self) -> &'static str {
        match self {
            ClaimOutcome::Created { .. } => "created",
            ClaimOutcome::BondIncreased { .. } => "bond_increased",
            ClaimOutcome::BondDecreased { .. } => "bond_decreased",
            ClaimOutcome::ProfileUpdated { .. } => "profile_updated",
            ClaimOutcome::Evicted { .. } => "evicted",
        }
    }
}

impl<B: BankKeeper> Keeper<B> {
    /// Validate `msg` and apply it inside its own atomic branch.
    ///
    /// On any error the context is left exactly as it was, events included.
    pub fn deliver_claim(
        &self,
        ctx: &mut Context<'_>,
        msg: &MsgClaim,
    ) -> KeeperResult<ClaimOutcome> {
        let result = msg
            .validate_basic()
            .map_err(KeeperError::from)
            .and_then(|()| ctx.run_atomic(|branch| self.handle_claim(branch, msg)));

        if let Err(err) = &result {
            warn!(
                height = ctx.block_height(),
                operator = %msg.operator_address,
                moniker = %msg.moniker,
                bond = %msg.bond,
                error = %err,
                "Claim rejected"
            );
        }
        result
    }

    /// Apply a structurally valid claim.
    ///
    /// Decision order:
    ///
    /// | existing | bond vs min | bond vs existing | action |
    /// |---|---|---|---|
    /// | absent  | `>=` | -         | create, escrow full bond |
    /// | absent  | `<`  | -         | reject [`KeeperError::InsufficientBond`] |
    /// | present | `>=` | greater   | escrow the difference, update |
    /// | present | `>=` | smaller   | queue the difference, update |
    /// | present | `>=` | equal     | update profile |
    /// | present | `<`  | -         | queue the whole bond, delete record |
    ///
    /// Transfers and queue writes come before the record write. Callers that
    /// need all-or-nothing behaviour go through [`Keeper::deliver_claim`].
    pub fn handle_claim(
        &self,
        ctx: &mut Context<'_>,
        msg: &MsgClaim,
    ) -> KeeperResult<ClaimOutcome> {
        let params = self.params(ctx)?;
        if msg.bond.denom != params.min_bond.denom {
            return Err(KeeperError::InvalidBondDenom {
                expected: params.min_bond.denom,
                got: msg.bond.denom.clone(),
            });
        }

        let sufficient = msg.bond.amount >= params.min_bond.amount;
        let outcome = match self.registry().get(ctx, &msg.operator_address)? {
            None if !sufficient => {
                return Err(KeeperError::InsufficientBond {
                    requested: msg.bond.clone(),
                    minimum: params.min_bond,
                })
            }
            None => self.create(ctx, msg)?,
            Some(existing) if !sufficient => self.evict(ctx, existing, &params)?,
            Some(existing) => self.update(ctx, msg, existing, &params)?,
        };

        ctx.emit(message_event(&self.config.module_name, &msg.operator_address));
        ctx.emit(claim_event(msg, &outcome));
        Ok(outcome)
    }

    fn create(&self, ctx: &mut Context<'_>, msg: &MsgClaim) -> KeeperResult<ClaimOutcome> {
        self.ensure_moniker_available(ctx, &msg.moniker, &msg.operator_address)?;
        self.escrow().bond(ctx, &msg.operator_address, &msg.bond)?;

        let node = ServiceNode::from_claim(msg);
        self.registry().put(ctx, &node, None)?;

        info!(
            operator = %node.operator_address,
            moniker = %node.moniker,
            bond = %node.bond,
            "Service node created"
        );
        Ok(ClaimOutcome::Created { bond: node.bond })
    }

    fn evict(
        &self,
        ctx: &mut Context<'_>,
        existing: ServiceNode,
        params: &Params,
    ) -> KeeperResult<ClaimOutcome> {
        let matures_at = maturity(ctx.block_time(), params)?;
        self.enqueue_unbonding(ctx, &existing.operator_address, &existing.bond, matures_at)?;

        let registry = self.registry();
        registry.remove(ctx, &existing);
        registry.remove_moniker(ctx, &existing.moniker);

        info!(
            operator = %existing.operator_address,
            moniker = %existing.moniker,
            released = %existing.bond,
            matures_at = %matures_at,
            "Service node evicted"
        );
        Ok(ClaimOutcome::Evicted {
            released: existing.bond,
            matures_at,
        })
    }

    fn update(
        &self,
        ctx: &mut Context<'_>,
        msg: &MsgClaim,
        existing: ServiceNode,
        params: &Params,
    ) -> KeeperResult<ClaimOutcome> {
        if !existing.bond.same_denom(&msg.bond) {
            return Err(KeeperError::InvalidBondDenom {
                expected: existing.bond.denom.clone(),
                got: msg.bond.denom.clone(),
            });
        }
        self.ensure_moniker_available(ctx, &msg.moniker, &msg.operator_address)?;

        let node = ServiceNode::from_claim(msg);
        let previous = existing.bond.clone();
        let outcome = match node.bond.amount.cmp(&previous.amount) {
            Ordering::Greater => {
                let delta = node.bond.checked_sub(&previous)?;
                self.escrow().bond(ctx, &node.operator_address, &delta)?;
                ClaimOutcome::BondIncreased {
                    previous,
                    bond: node.bond.clone(),
                    delta,
                }
            }
            Ordering::Less => {
                let delta = previous.checked_sub(&node.bond)?;
                let matures_at = maturity(ctx.block_time(), params)?;
                self.enqueue_unbonding(ctx, &node.operator_address, &delta, matures_at)?;
                ClaimOutcome::BondDecreased {
                    previous,
                    bond: node.bond.clone(),
                    delta,
                    matures_at,
                }
            }
            Ordering::Equal => ClaimOutcome::ProfileUpdated {
                bond: node.bond.clone(),
            },
        };

        self.registry().put(ctx, &node, Some(&existing))?;
        debug!(
            operator = %node.operator_address,
            outcome = outcome.action(),
            bond = %node.bond,
            "Service node updated"
        );
        Ok(outcome)
    }

    /// A moniker may be reused only by the operator that already holds it.
    fn ensure_moniker_available(
        &self,
        ctx: &Context<'_>,
        moniker: &str,
        operator: &AccAddress,
    ) -> KeeperResult<()> {
        match self.registry().moniker_owner(ctx, moniker)? {
            Some(owner) if owner != *operator => Err(KeeperError::MonikerTaken {
                moniker: moniker.to_string(),
                owner,
            }),
            _ => Ok(()),
        }
    }

    fn enqueue_unbonding(
        &self,
        ctx: &mut Context<'_>,
        account: &AccAddress,
        amount: &Coin,
        matures_at: DateTime<Utc>,
    ) -> KeeperResult<()> {
        if amount.is_zero() {
            return Ok(());
        }
        let entry = UnBonding::new(*account, amount.clone(), matures_at);
        self.unbonding_queue().insert(ctx, matures_at, &[entry])
    }
}

fn maturity(now: DateTime<Utc>, params: &Params) -> KeeperResult<DateTime<Utc>> {
    let delay = params.unbonding_delay()?;
    now.checked_add_signed(delay)
        .ok_or_else(|| KeeperError::Overflow(format!("{now} + {}s", delay.num_seconds())))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::*;
    use crate::EVENT_TYPE_CLAIM;
    use ipala_bank::BankError;
    use ipala_store::{KvStore, MemStore};
    use ipala_types::ValidationError;

    fn at(secs: i64) -> DateTime<Utc> {
        genesis_time() + chrono::Duration::seconds(secs)
    }

    #[test]
    fn create_escrows_full_bond() {
        let keeper = keeper();
        let mut store = MemStore::new();
        let mut ctx = Context::new(&mut store, header_at(1, 0));
        fund(&mut ctx, addr(1), 1_000);

        let outcome = keeper
            .deliver_claim(&mut ctx, &claim(addr(1), "alpha", 150))
            .unwrap();
        assert_eq!(
            outcome,
            ClaimOutcome::Created {
                bond: Coin::new(DENOM, 150),
            }
        );
        assert_eq!(balance(&keeper, &ctx, &addr(1)), 850);
        assert_eq!(pool(&keeper, &ctx), 150);
        assert!(keeper.registry().get(&ctx, &addr(1)).unwrap().is_some());
    }

    #[test]
    fn create_below_minimum_is_rejected_without_writes() {
        let keeper = keeper();
        let mut store = MemStore::new();
        let mut ctx = Context::new(&mut store, header_at(1, 0));
        fund(&mut ctx, addr(1), 1_000);
        let before = ctx.events().len();

        let err = keeper
            .deliver_claim(&mut ctx, &claim(addr(1), "alpha", 99))
            .unwrap_err();
        assert!(matches!(err, KeeperError::InsufficientBond { .. }));
        assert_eq!(pool(&keeper, &ctx), 0);
        assert_eq!(ctx.events().len(), before);
        assert!(!keeper.registry().moniker_taken(&ctx, "alpha"));
    }

    #[test]
    fn increase_escrows_exactly_the_difference() {
        let keeper = keeper();
        let mut store = MemStore::new();
        let mut ctx = Context::new(&mut store, header_at(1, 0));
        fund(&mut ctx, addr(1), 1_000);
        keeper
            .deliver_claim(&mut ctx, &claim(addr(1), "alpha", 100))
            .unwrap();

        let outcome = keeper
            .deliver_claim(&mut ctx, &claim(addr(1), "alpha", 120))
            .unwrap();
        assert_eq!(
            outcome,
            ClaimOutcome::BondIncreased {
                previous: Coin::new(DENOM, 100),
                bond: Coin::new(DENOM, 120),
                delta: Coin::new(DENOM, 20),
            }
        );
        assert_eq!(balance(&keeper, &ctx, &addr(1)), 880);
        assert_eq!(pool(&keeper, &ctx), 120);
        assert!(keeper.unbonding_queue().pending(&ctx).unwrap().is_empty());
    }

    #[test]
    fn decrease_queues_difference_and_keeps_it_escrowed() {
        let keeper = keeper();
        let mut store = MemStore::new();
        let mut ctx = Context::new(&mut store, header_at(1, 0));
        fund(&mut ctx, addr(1), 1_000);
        keeper
            .deliver_claim(&mut ctx, &claim(addr(1), "alpha", 300))
            .unwrap();

        let outcome = keeper
            .deliver_claim(&mut ctx, &claim(addr(1), "alpha", 200))
            .unwrap();
        let matures_at = at(DELAY_SECS as i64);
        assert_eq!(
            outcome,
            ClaimOutcome::BondDecreased {
                previous: Coin::new(DENOM, 300),
                bond: Coin::new(DENOM, 200),
                delta: Coin::new(DENOM, 100),
                matures_at,
            }
        );
        assert_eq!(pool(&keeper, &ctx), 300);
        assert_eq!(
            keeper.registry().get(&ctx, &addr(1)).unwrap().unwrap().bond,
            Coin::new(DENOM, 200)
        );
        assert_eq!(
            keeper.unbonding_queue().bucket(&ctx, matures_at).unwrap(),
            vec![UnBonding::new(addr(1), Coin::new(DENOM, 100), matures_at)]
        );
        assert_eq!(
            keeper.registry().bond_index(&ctx).unwrap(),
            vec![(200, addr(1))]
        );
    }

    #[test]
    fn equal_bond_updates_profile_and_moniker() {
        let keeper = keeper();
        let mut store = MemStore::new();
        let mut ctx = Context::new(&mut store, header_at(1, 0));
        fund(&mut ctx, addr(1), 1_000);
        keeper
            .deliver_claim(&mut ctx, &claim(addr(1), "alpha", 150))
            .unwrap();

        let mut msg = claim(addr(1), "beta", 150);
        msg.website = "https://beta.example".into();
        let outcome = keeper.deliver_claim(&mut ctx, &msg).unwrap();
        assert_eq!(
            outcome,
            ClaimOutcome::ProfileUpdated {
                bond: Coin::new(DENOM, 150),
            }
        );

        let registry = keeper.registry();
        let node = registry.get(&ctx, &addr(1)).unwrap().unwrap();
        assert_eq!(node.website, "https://beta.example");
        assert!(!registry.moniker_taken(&ctx, "alpha"));
        assert_eq!(registry.moniker_owner(&ctx, "beta").unwrap(), Some(addr(1)));
        assert_eq!(pool(&keeper, &ctx), 150);
    }

    #[test]
    fn below_minimum_evicts_whole_bond() {
        let keeper = keeper();
        let mut store = MemStore::new();
        let mut ctx = Context::new(&mut store, header_at(1, 0));
        fund(&mut ctx, addr(1), 1_000);
        keeper
            .deliver_claim(&mut ctx, &claim(addr(1), "alpha", 150))
            .unwrap();

        // eviction ignores the moniker in the message
        let outcome = keeper
            .deliver_claim(&mut ctx, &claim(addr(1), "other", 0))
            .unwrap();
        let matures_at = at(DELAY_SECS as i64);
        assert_eq!(
            outcome,
            ClaimOutcome::Evicted {
                released: Coin::new(DENOM, 150),
                matures_at,
            }
        );

        let registry = keeper.registry();
        assert!(registry.get(&ctx, &addr(1)).unwrap().is_none());
        assert!(registry.bond_index(&ctx).unwrap().is_empty());
        assert!(!registry.moniker_taken(&ctx, "alpha"));
        assert_eq!(pool(&keeper, &ctx), 150);
        assert_eq!(
            keeper.unbonding_queue().bucket(&ctx, matures_at).unwrap(),
            vec![UnBonding::new(addr(1), Coin::new(DENOM, 150), matures_at)]
        );
    }

    #[test]
    fn moniker_held_by_another_operator_is_rejected() {
        let keeper = keeper();
        let mut store = MemStore::new();
        let mut ctx = Context::new(&mut store, header_at(1, 0));
        fund(&mut ctx, addr(1), 1_000);
        fund(&mut ctx, addr(2), 1_000);
        keeper
            .deliver_claim(&mut ctx, &claim(addr(1), "alpha", 150))
            .unwrap();
        keeper
            .deliver_claim(&mut ctx, &claim(addr(2), "beta", 150))
            .unwrap();

        let err = keeper
            .deliver_claim(&mut ctx, &claim(addr(2), "alpha", 200))
            .unwrap_err();
        assert!(matches!(err, KeeperError::MonikerTaken { owner, .. } if owner == addr(1)));
        assert_eq!(balance(&keeper, &ctx, &addr(2)), 850);

        let err = keeper
            .deliver_claim(&mut ctx, &claim(addr(3), "alpha", 150))
            .unwrap_err();
        assert!(matches!(err, KeeperError::MonikerTaken { .. }));
    }

    #[test]
    fn released_moniker_can_be_claimed_again() {
        let keeper = keeper();
        let mut store = MemStore::new();
        let mut ctx = Context::new(&mut store, header_at(1, 0));
        fund(&mut ctx, addr(1), 1_000);
        fund(&mut ctx, addr(2), 1_000);
        keeper
            .deliver_claim(&mut ctx, &claim(addr(1), "alpha", 150))
            .unwrap();
        keeper
            .deliver_claim(&mut ctx, &claim(addr(1), "alpha", 0))
            .unwrap();

        let outcome = keeper
            .deliver_claim(&mut ctx, &claim(addr(2), "alpha", 100))
            .unwrap();
        assert!(matches!(outcome, ClaimOutcome::Created { .. }));
    }

    #[test]
    fn insufficient_funds_rolls_back_everything() {
        let keeper = keeper();
        let mut store = MemStore::new();
        let digest_before;
        {
            let mut ctx = Context::new(&mut store, header_at(1, 0));
            fund(&mut ctx, addr(1), 110);
            keeper
                .deliver_claim(&mut ctx, &claim(addr(1), "alpha", 100))
                .unwrap();
        }
        digest_before = store.digest();
        {
            let mut ctx = Context::new(&mut store, header_at(2, 5));
            let err = keeper
                .deliver_claim(&mut ctx, &claim(addr(1), "beta", 500))
                .unwrap_err();
            assert!(matches!(err, KeeperError::Bank(BankError::InsufficientFunds { .. })));
            assert!(err.is_transfer_failure());
            assert!(ctx.events().is_empty());
        }
        assert_eq!(store.digest(), digest_before);
    }

    #[test]
    fn wrong_denom_is_rejected() {
        let keeper = keeper();
        let mut store = MemStore::new();
        let mut ctx = Context::new(&mut store, header_at(1, 0));
        let mut msg = claim(addr(1), "alpha", 500);
        msg.bond = Coin::new("atom", 500);
        let err = keeper.deliver_claim(&mut ctx, &msg).unwrap_err();
        assert!(matches!(err, KeeperError::InvalidBondDenom { .. }));
    }

    #[test]
    fn structural_validation_runs_first() {
        let keeper = keeper();
        let mut store = MemStore::new();
        let mut ctx = Context::new(&mut store, header_at(1, 0));
        let msg = claim(addr(1), "", 500);
        let err = keeper.deliver_claim(&mut ctx, &msg).unwrap_err();
        assert!(matches!(
            err,
            KeeperError::Validation(ValidationError::EmptyField { field: "moniker" })
        ));
    }

    #[test]
    fn successful_claim_emits_message_and_claim_events() {
        let keeper = keeper();
        let mut store = MemStore::new();
        let mut ctx = Context::new(&mut store, header_at(1, 0));
        fund(&mut ctx, addr(1), 1_000);
        keeper
            .deliver_claim(&mut ctx, &claim(addr(1), "alpha", 150))
            .unwrap();

        let events = ctx.take_events();
        let kinds: Vec<_> = events.iter().map(|e| e.kind.as_str()).collect();
        assert_eq!(kinds, vec!["message", EVENT_TYPE_CLAIM]);
        assert_eq!(events[1].get("outcome"), Some("created"));
    }

    #[test]
    fn params_change_applies_to_next_claim() {
        let keeper = keeper();
        let mut store = MemStore::new();
        let mut ctx = Context::new(&mut store, header_at(1, 0));
        fund(&mut ctx, addr(1), 1_000);
        keeper
            .deliver_claim(&mut ctx, &claim(addr(1), "alpha", 150))
            .unwrap();

        let raised = Params::new(Coin::new(DENOM, 200), std::time::Duration::from_secs(5));
        keeper.set_params(&mut ctx, &raised).unwrap();

        // same bond is now under the minimum
        let outcome = keeper
            .deliver_claim(&mut ctx, &claim(addr(1), "alpha", 150))
            .unwrap();
        assert_eq!(
            outcome,
            ClaimOutcome::Evicted {
                released: Coin::new(DENOM, 150),
                matures_at: at(5),
            }
        );
    }

    #[test]
    fn handle_claim_surfaces_corrupt_record() {
        let keeper = keeper();
        let mut store = MemStore::new();
        let mut ctx = Context::new(&mut store, header_at(1, 0));
        ctx.kv_mut("ipala")
            .set(&crate::keys::service_node_key(&addr(1)), b"[]".to_vec());
        let err = keeper
            .handle_claim(&mut ctx, &claim(addr(1), "alpha", 150))
            .unwrap_err();
        assert!(matches!(err, KeeperError::Codec(_)));
    }

    #[test]
    fn outcome_serializes_with_tag() {
        let outcome = ClaimOutcome::ProfileUpdated {
            bond: Coin::new(DENOM, 5),
        };
        let json = serde_json::to_value(&outcome).unwrap();
        assert_eq!(json["outcome"], "profile_updated");
    }
}
