//! Fund custody boundary for IPALA.
//!
//! The keeper never touches balances directly. It asks a [`BankKeeper`] to
//! move coins between user accounts and module-owned accounts, and treats
//! every error as verbatim rejection of the enclosing transaction.
//!
//! [`StoreBank`] is the reference implementation. It keeps balances in the
//! same context store as the keeper, so a dropped transaction branch rolls
//! back transfers together with registry and queue writes.

#![deny(unsafe_code)]

mod error;
mod store_bank;

pub use error::{BankError, BankResult};
pub use store_bank::{StoreBank, BANK_NAMESPACE};

use ipala_store::Context;
use ipala_types::{module_address, AccAddress, Coin};

/// The two transfers the keeper needs, plus balance reads.
pub trait BankKeeper {
    /// Move `amount` from a user account into the account owned by `module`.
    fn send_coins_from_account_to_module(
        &self,
        ctx: &mut Context<'_>,
        sender: &AccAddress,
        recipient_module: &str,
        amount: &Coin,
    ) -> BankResult<()>;

    /// Move `amount` from the account owned by `module` to a user account.
    fn send_coins_from_module_to_account(
        &self,
        ctx: &mut Context<'_>,
        sender_module: &str,
        recipient: &AccAddress,
        amount: &Coin,
    ) -> BankResult<()>;

    fn get_balance(&self, ctx: &Context<'_>, addr: &AccAddress, denom: &str) -> BankResult<Coin>;

    fn get_module_balance(&self, ctx: &Context<'_>, module: &str, denom: &str) -> BankResult<Coin> {
        self.get_balance(ctx, &module_address(module), denom)
    }
}
