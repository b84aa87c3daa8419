//! Moves bonds between operator accounts and the module pool.

use ipala_bank::BankKeeper;
use ipala_store::Context;
use ipala_types::{AccAddress, Coin};
use tracing::debug;

use crate::config::KeeperConfig;
use crate::error::KeeperResult;

/// Moves coins between user accounts and the module's pooled account.
///
/// Keeps no bookkeeping of its own. Collaborator errors come back verbatim
/// as [`KeeperError::Bank`](crate::KeeperError::Bank).
#[derive(Debug)]
pub struct EscrowGateway<'a, B> {
    bank: &'a B,
    module_name: &'a str,
}

impl<'a, B: BankKeeper> EscrowGateway<'a, B> {
    pub fn new(bank: &'a B, config: &'a KeeperConfig) -> Self {
        Self {
            bank,
            module_name: &config.module_name,
        }
    }

    pub fn bond(
        &self,
        ctx: &mut Context<'_>,
        account: &AccAddress,
        amount: &Coin,
    ) -> KeeperResult<()> {
        if amount.is_zero() {
            return Ok(());
        }
        self.bank
            .send_coins_from_account_to_module(ctx, account, self.module_name, amount)?;
        debug!(account = %account, amount = %amount, "Bond escrowed");
        Ok(())
    }

    pub fn release(
        &self,
        ctx: &mut Context<'_>,
        account: &AccAddress,
        amount: &Coin,
    ) -> KeeperResult<()> {
        if amount.is_zero() {
            return Ok(());
        }
        self.bank
            .send_coins_from_module_to_account(ctx, self.module_name, account, amount)?;
        debug!(account = %account, amount = %amount, "Escrow released");
        Ok(())
    }

    pub fn pool_balance(&self, ctx: &Context<'_>, denom: &str) -> KeeperResult<Coin> {
        Ok(self.bank.get_module_balance(ctx, self.module_name, denom)?)
    }
}
