//! Module parameters, stored or falling back to the genesis values.

use std::time::Duration;

use ipala_bank::BankKeeper;
use ipala_store::{Context, KvRead, KvStore};
use ipala_types::{Coin, Params};
use tracing::info;

use crate::error::{KeeperError, KeeperResult};
use crate::keys::PARAMS_KEY;
use crate::Keeper;

impl<B: BankKeeper> Keeper<B> {
    /// Current parameters. Falls back to the configured genesis params until
    /// a params record has been written.
    pub fn params(&self, ctx: &Context<'_>) -> KeeperResult<Params> {
        match ctx.kv(&self.config.store_namespace).get(PARAMS_KEY) {
            Some(bytes) => serde_json::from_slice(&bytes).map_err(KeeperError::codec),
            None => Ok(self.config.genesis_params.clone()),
        }
    }

    pub fn set_params(&self, ctx: &mut Context<'_>, params: &Params) -> KeeperResult<()> {
        params.validate()?;
        let bytes = serde_json::to_vec(params).map_err(KeeperError::codec)?;
        ctx.kv_mut(&self.config.store_namespace)
            .set(PARAMS_KEY, bytes);
        info!(
            min_bond = %params.min_bond,
            unbonding_secs = params.unbonding_time.as_secs(),
            "Params updated"
        );
        Ok(())
    }

    pub fn min_bond(&self, ctx: &Context<'_>) -> KeeperResult<Coin> {
        Ok(self.params(ctx)?.min_bond)
    }

    pub fn unbonding_time(&self, ctx: &Context<'_>) -> KeeperResult<Duration> {
        Ok(self.params(ctx)?.unbonding_time)
    }
}
