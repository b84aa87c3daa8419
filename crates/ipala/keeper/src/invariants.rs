//! State invariants.
//!
//! Cheap enough to run after every block in tests and the replay harness.
//! A violation is [`KeeperError::InvariantBroken`], which is fatal.

use std::collections::{BTreeMap, BTreeSet};

use ipala_bank::BankKeeper;
use ipala_store::Context;
use ipala_types::AccAddress;

use crate::error::{KeeperError, KeeperResult};
use crate::Keeper;

impl<B: BankKeeper> Keeper<B> {
    /// Every index entry points at a matching record and every record has
    /// exactly one entry in each index.
    pub fn index_consistency(&self, ctx: &Context<'_>) -> KeeperResult<()> {
        let registry = self.registry();
        let records: BTreeMap<AccAddress, _> = registry
            .records(ctx)?
            .into_iter()
            .map(|node| (node.operator_address, node))
            .collect();

        let bond_index = registry.bond_index(ctx)?;
        let mut bonded = BTreeSet::new();
        for (amount, operator) in &bond_index {
            match records.get(operator) {
                Some(node) if node.bond.amount == *amount => {}
                Some(node) => {
                    return Err(broken(format!(
                        "bond index has {amount} for {operator}, record has {}",
                        node.bond
                    )))
                }
                None => return Err(broken(format!("bond index entry for missing {operator}"))),
            }
            if !bonded.insert(*operator) {
                return Err(broken(format!("{operator} appears twice in the bond index")));
            }
        }

        let moniker_index = registry.moniker_index(ctx)?;
        for (moniker, operator) in &moniker_index {
            match records.get(operator) {
                Some(node) if node.moniker == *moniker => {}
                _ => {
                    return Err(broken(format!(
                        "moniker {moniker:?} points at {operator} which does not hold it"
                    )))
                }
            }
        }

        if bond_index.len() != records.len() || moniker_index.len() != records.len() {
            return Err(broken(format!(
                "{} records, {} bond index entries, {} moniker index entries",
                records.len(),
                bond_index.len(),
                moniker_index.len()
            )));
        }
        Ok(())
    }

    /// Per denomination, the pool holds exactly the active bonds plus every
    /// pending unbonding.
    pub fn escrow_solvency(&self, ctx: &Context<'_>) -> KeeperResult<()> {
        let mut expected: BTreeMap<String, u64> = BTreeMap::new();
        let mut add = |denom: &str, amount: u64| -> KeeperResult<()> {
            let total = expected.entry(denom.to_string()).or_insert(0);
            *total = total
                .checked_add(amount)
                .ok_or_else(|| KeeperError::Overflow(format!("escrow total in {denom}")))?;
            Ok(())
        };

        for node in self.registry().records(ctx)? {
            add(&node.bond.denom, node.bond.amount)?;
        }
        for bucket in self.unbonding_queue().pending(ctx)? {
            for entry in bucket.entries {
                add(&entry.amount.denom, entry.amount.amount)?;
            }
        }

        let escrow = self.escrow();
        for (denom, owed) in expected {
            let held = escrow.pool_balance(ctx, &denom)?;
            if held.amount != owed {
                return Err(broken(format!(
                    "pool holds {held}, bonds and unbondings total {owed}{denom}"
                )));
            }
        }
        Ok(())
    }

    pub fn assert_invariants(&self, ctx: &Context<'_>) -> KeeperResult<()> {
        self.index_consistency(ctx)?;
        self.escrow_solvency(ctx)
    }
}

fn broken(msg: String) -> KeeperError {
    KeeperError::InvariantBroken(msg)
}
