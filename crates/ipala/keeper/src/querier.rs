//! Read-only queries over the registry, queue and pool.
//!
//! [`QueryRequest`] is the JSON entry point; the typed helpers back it.

use ipala_bank::BankKeeper;
use ipala_store::Context;
use ipala_types::{AccAddress, Coin, ServiceNode};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{KeeperError, KeeperResult};
use crate::Keeper;

/// Read-only requests served against committed state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "query", rename_all = "snake_case")]
pub enum QueryRequest {
    ServiceNode { operator: AccAddress },
    ServiceNodeByMoniker { moniker: String },
    /// Ascending by bond
    ServiceNodes { limit: Option<usize> },
    /// Descending by bond
    TopServiceNodes { limit: Option<usize> },
    Params,
    UnbondingQueue,
    /// Defaults to the bond denomination
    PoolBalance { denom: Option<String> },
}

impl<B: BankKeeper> Keeper<B> {
    pub fn query(&self, ctx: &Context<'_>, request: &QueryRequest) -> KeeperResult<Value> {
        match request {
            QueryRequest::ServiceNode { operator } => to_json(&self.service_node(ctx, operator)?),
            QueryRequest::ServiceNodeByMoniker { moniker } => {
                to_json(&self.service_node_by_moniker(ctx, moniker)?)
            }
            QueryRequest::ServiceNodes { limit } => to_json(&self.service_nodes(ctx, *limit)?),
            QueryRequest::TopServiceNodes { limit } => {
                to_json(&self.top_service_nodes(ctx, *limit)?)
            }
            QueryRequest::Params => to_json(&self.params(ctx)?),
            QueryRequest::UnbondingQueue => to_json(&self.unbonding_queue().pending(ctx)?),
            QueryRequest::PoolBalance { denom } => {
                to_json(&self.pool_balance(ctx, denom.as_deref())?)
            }
        }
    }

    pub fn service_node(
        &self,
        ctx: &Context<'_>,
        operator: &AccAddress,
    ) -> KeeperResult<ServiceNode> {
        self.registry()
            .get(ctx, operator)?
            .ok_or_else(|| KeeperError::NotFound(format!("service node {operator}")))
    }

    pub fn service_node_by_moniker(
        &self,
        ctx: &Context<'_>,
        moniker: &str,
    ) -> KeeperResult<ServiceNode> {
        let operator = self
            .registry()
            .moniker_owner(ctx, moniker)?
            .ok_or_else(|| KeeperError::NotFound(format!("moniker {moniker:?}")))?;
        self.service_node(ctx, &operator)
    }

    pub fn service_nodes(
        &self,
        ctx: &Context<'_>,
        limit: Option<usize>,
    ) -> KeeperResult<Vec<ServiceNode>> {
        let mut nodes = self.registry().list_all_by_bond(ctx)?;
        nodes.truncate(self.clamp_limit(limit));
        Ok(nodes)
    }

    pub fn top_service_nodes(
        &self,
        ctx: &Context<'_>,
        limit: Option<usize>,
    ) -> KeeperResult<Vec<ServiceNode>> {
        self.registry().top_by_bond(ctx, self.clamp_limit(limit))
    }

    pub fn pool_balance(&self, ctx: &Context<'_>, denom: Option<&str>) -> KeeperResult<Coin> {
        match denom {
            Some(denom) => self.escrow().pool_balance(ctx, denom),
            None => {
                let denom = self.min_bond(ctx)?.denom;
                self.escrow().pool_balance(ctx, &denom)
            }
        }
    }

    fn clamp_limit(&self, limit: Option<usize>) -> usize {
        limit
            .unwrap_or(self.config.query_limit)
            .min(self.config.query_limit)
    }
}

fn to_json<T: Serialize>(value: &T) -> KeeperResult<Value> {
    serde_json::to_value(value).map_err(KeeperError::codec)
}
