//! Bank backed by the key/value store.

use ipala_store::{Context, KvRead, KvStore};
use ipala_types::{module_address, validate_denom, AccAddress, Coin, ADDR_LEN};
use tracing::debug;

use crate::error::{BankError, BankResult};
use crate::BankKeeper;

/// Store namespace holding balances.
pub const BANK_NAMESPACE: &str = "bank";

const BALANCE_PREFIX: u8 = 0x02;

/// `0x02 | address | denom`
fn balance_key(addr: &AccAddress, denom: &str) -> Vec<u8> {
    let mut key = Vec::with_capacity(1 + ADDR_LEN + denom.len());
    key.push(BALANCE_PREFIX);
    key.extend_from_slice(addr.as_bytes());
    key.extend_from_slice(denom.as_bytes());
    key
}

fn decode_amount(bytes: &[u8]) -> BankResult<u64> {
    let arr: [u8; 8] = bytes
        .try_into()
        .map_err(|_| BankError::Codec(format!("expected 8 bytes, got {}", bytes.len())))?;
    Ok(u64::from_be_bytes(arr))
}

/// Balances kept in the context store under the `bank` namespace.
#[derive(Clone, Copy, Debug, Default)]
pub struct StoreBank;

impl StoreBank {
    pub fn new() -> Self {
        Self
    }

    /// Credit `amount` out of thin air. Genesis and test funding only.
    pub fn mint(&self, ctx: &mut Context<'_>, addr: &AccAddress, amount: &Coin) -> BankResult<()> {
        validate_denom(&amount.denom).map_err(|e| BankError::InvalidDenom(e.to_string()))?;
        let current = self.read_amount(ctx, addr, &amount.denom)?;
        let next = current
            .checked_add(amount.amount)
            .ok_or_else(|| BankError::Overflow {
                address: *addr,
                denom: amount.denom.clone(),
            })?;
        self.write_amount(ctx, addr, &amount.denom, next);
        Ok(())
    }

    /// Every non-zero balance of `addr`, ordered by denomination.
    pub fn get_all_balances(&self, ctx: &Context<'_>, addr: &AccAddress) -> BankResult<Vec<Coin>> {
        let mut prefix = vec![BALANCE_PREFIX];
        prefix.extend_from_slice(addr.as_bytes());
        ctx.kv(BANK_NAMESPACE)
            .prefix_scan(&prefix)
            .into_iter()
            .map(|(key, value)| {
                let denom = String::from_utf8(key[prefix.len()..].to_vec())
                    .map_err(|e| BankError::Codec(e.to_string()))?;
                Ok(Coin::new(denom, decode_amount(&value)?))
            })
            .collect()
    }

    /// Move `amount` between two accounts.
    pub fn send(
        &self,
        ctx: &mut Context<'_>,
        from: &AccAddress,
        to: &AccAddress,
        amount: &Coin,
    ) -> BankResult<()> {
        validate_denom(&amount.denom).map_err(|e| BankError::InvalidDenom(e.to_string()))?;
        if amount.is_zero() {
            return Ok(());
        }

        let available = self.read_amount(ctx, from, &amount.denom)?;
        if available < amount.amount {
            return Err(BankError::InsufficientFunds {
                address: *from,
                required: amount.clone(),
                available: Coin::new(amount.denom.clone(), available),
            });
        }
        // Debit first so a self-send nets to zero.
        self.write_amount(ctx, from, &amount.denom, available - amount.amount);

        let credited = self.read_amount(ctx, to, &amount.denom)?;
        let next = credited
            .checked_add(amount.amount)
            .ok_or_else(|| BankError::Overflow {
                address: *to,
                denom: amount.denom.clone(),
            })?;
        self.write_amount(ctx, to, &amount.denom, next);

        debug!(from = %from, to = %to, amount = %amount, "Coins transferred");
        Ok(())
    }

    fn read_amount(&self, ctx: &Context<'_>, addr: &AccAddress, denom: &str) -> BankResult<u64> {
        match ctx.kv(BANK_NAMESPACE).get(&balance_key(addr, denom)) {
            Some(bytes) => decode_amount(&bytes),
            None => Ok(0),
        }
    }

    fn write_amount(&self, ctx: &mut Context<'_>, addr: &AccAddress, denom: &str, amount: u64) {
        let key = balance_key(addr, denom);
        let mut kv = ctx.kv_mut(BANK_NAMESPACE);
        if amount == 0 {
            kv.delete(&key);
        } else {
            kv.set(&key, amount.to_be_bytes().to_vec());
        }
    }
}

impl BankKeeper for StoreBank {
    fn send_coins_from_account_to_module(
        &self,
        ctx: &mut Context<'_>,
        sender: &AccAddress,
        recipient_module: &str,
        amount: &Coin,
    ) -> BankResult<()> {
        self.send(ctx, sender, &module_address(recipient_module), amount)
    }

    fn send_coins_from_module_to_account(
        &self,
        ctx: &mut Context<'_>,
        sender_module: &str,
        recipient: &AccAddress,
        amount: &Coin,
    ) -> BankResult<()> {
        self.send(ctx, &module_address(sender_module), recipient, amount)
    }

    fn get_balance(&self, ctx: &Context<'_>, addr: &AccAddress, denom: &str) -> BankResult<Coin> {
        Ok(Coin::new(denom, self.read_amount(ctx, addr, denom)?))
    }
}
