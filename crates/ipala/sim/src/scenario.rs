//! Scenario file format.
//!
//! ```toml
//! genesis_time = "2024-01-01T00:00:00Z"
//!
//! [keeper.genesis_params]
//! unbonding_time = 60
//! min_bond = { denom = "nch", amount = 100 }
//!
//! [[accounts]]
//! address = "a1a1a1a1a1a1a1a1a1a1a1a1a1a1a1a1a1a1a1a1"
//! coins = [{ denom = "nch", amount = 1000 }]
//!
//! [[blocks]]
//! advance_secs = 5
//! claims = [
//!   { operator_address = "a1a1...", moniker = "node-a", bond = { denom = "nch", amount = 150 } },
//! ]
//! ```

use std::path::Path;

use anyhow::{bail, Context as _};
use chrono::{DateTime, Utc};
use ipala_keeper::KeeperConfig;
use ipala_types::{AccAddress, Coin, MsgClaim, Params};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimConfig {
    #[serde(default)]
    pub keeper: KeeperConfig,

    /// Time of the genesis block; block times advance from here
    pub genesis_time: DateTime<Utc>,

    #[serde(default)]
    pub accounts: Vec<GenesisAccount>,

    #[serde(default)]
    pub blocks: Vec<BlockSpec>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenesisAccount {
    pub address: AccAddress,
    pub coins: Vec<Coin>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockSpec {
    /// Seconds since the previous block
    #[serde(default = "default_advance")]
    pub advance_secs: u64,

    /// Params written before the block's claims run
    #[serde(default)]
    pub params: Option<Params>,

    #[serde(default)]
    pub claims: Vec<MsgClaim>,
}

fn default_advance() -> u64 {
    1
}

impl SimConfig {
    pub fn from_toml_str(s: &str) -> anyhow::Result<Self> {
        let config: SimConfig = toml::from_str(s).context("invalid scenario")?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("reading scenario {}", path.display()))?;
        Self::from_toml_str(&contents).with_context(|| format!("loading {}", path.display()))
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        self.keeper.validate()?;
        for account in &self.accounts {
            if account.address.is_empty() {
                bail!("genesis account with empty address");
            }
            for coin in &account.coins {
                coin.validate()
                    .with_context(|| format!("genesis balance of {}", account.address))?;
            }
        }
        for (i, block) in self.blocks.iter().enumerate() {
            if let Some(params) = &block.params {
                params
                    .validate()
                    .with_context(|| format!("params of block {}", i + 1))?;
            }
        }
        Ok(())
    }
}
