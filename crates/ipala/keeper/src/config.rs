//! Keeper configuration.
//!
//! Built once at process start and borrowed by every registry, queue and
//! escrow view the keeper hands out.

use std::path::Path;

use ipala_types::Params;
use serde::{Deserialize, Serialize};

use crate::error::{KeeperError, KeeperResult};

pub const DEFAULT_MODULE_NAME: &str = "ipala";
pub const DEFAULT_QUERY_LIMIT: usize = 100;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeeperConfig {
    /// Name of the module account that holds every escrowed bond
    #[serde(default = "default_module_name")]
    pub module_name: String,

    /// Store namespace for registry, index, queue and params keys
    #[serde(default = "default_module_name")]
    pub store_namespace: String,

    /// Upper bound on list queries
    #[serde(default = "default_query_limit")]
    pub query_limit: usize,

    /// Params used until a params record is written to the store
    #[serde(default)]
    pub genesis_params: Params,
}

fn default_module_name() -> String {
    DEFAULT_MODULE_NAME.to_string()
}

fn default_query_limit() -> usize {
    DEFAULT_QUERY_LIMIT
}

impl Default for KeeperConfig {
    fn default() -> Self {
        Self {
            module_name: default_module_name(),
            store_namespace: default_module_name(),
            query_limit: DEFAULT_QUERY_LIMIT,
            genesis_params: Params::default(),
        }
    }
}

impl KeeperConfig {
    pub fn with_params(params: Params) -> Self {
        Self {
            genesis_params: params,
            ..Self::default()
        }
    }

    pub fn from_toml_str(s: &str) -> KeeperResult<Self> {
        let config: KeeperConfig =
            toml::from_str(s).map_err(|e| KeeperError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load from a TOML file, falling back to defaults when it does not exist.
    pub fn load(path: impl AsRef<Path>) -> KeeperResult<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(Self::default());
        }
        let contents = std::fs::read_to_string(path)
            .map_err(|e| KeeperError::Config(format!("{}: {e}", path.display())))?;
        Self::from_toml_str(&contents)
    }

    pub fn validate(&self) -> KeeperResult<()> {
        if self.module_name.is_empty() {
            return Err(KeeperError::Config("module_name must not be empty".into()));
        }
        if self.store_namespace.is_empty() || self.store_namespace.contains('/') {
            return Err(KeeperError::Config(format!(
                "invalid store_namespace {:?}",
                self.store_namespace
            )));
        }
        if self.query_limit == 0 {
            return Err(KeeperError::Config("query_limit must be positive".into()));
        }
        self.genesis_params.validate()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ipala_types::Coin;

    #[test]
    fn default_config_is_valid() {
        let config = KeeperConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.module_name, "ipala");
        assert_eq!(config.store_namespace, "ipala");
    }

    #[test]
    fn parses_toml_with_defaults() {
        let config = KeeperConfig::from_toml_str(
            r#"
            query_limit = 10

            [genesis_params]
            unbonding_time = 60

            [genesis_params.min_bond]
            denom = "nch"
            amount = 100
            "#,
        )
        .unwrap();
        assert_eq!(config.module_name, "ipala");
        assert_eq!(config.query_limit, 10);
        assert_eq!(config.genesis_params.min_bond, Coin::new("nch", 100));
        assert_eq!(config.genesis_params.unbonding_time.as_secs(), 60);
    }

    #[test]
    fn rejects_bad_namespace() {
        let config = KeeperConfig {
            store_namespace: "a/b".into(),
            ..KeeperConfig::default()
        };
        assert!(matches!(config.validate(), Err(KeeperError::Config(_))));
    }

    #[test]
    fn rejects_zero_query_limit() {
        assert!(KeeperConfig::from_toml_str("query_limit = 0").is_err());
    }

    #[test]
    fn load_missing_file_gives_defaults() {
        let config = KeeperConfig::load("/nonexistent/ipala.toml").unwrap();
        assert_eq!(config, KeeperConfig::default());
    }
}
