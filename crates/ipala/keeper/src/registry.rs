//! Service node records and their bond and moniker indices.

use ipala_store::{Context, KvRead, KvStore};
use ipala_types::{AccAddress, ServiceNode};
use tracing::debug;

use crate::config::KeeperConfig;
use crate::error::{KeeperError, KeeperResult};
use crate::keys::{
    bond_index_key, moniker_key, parse_bond_index_key, service_node_key, BOND_INDEX_PREFIX,
    MONIKER_INDEX_PREFIX, SERVICE_NODE_PREFIX,
};

/// Service-node records and their bond and moniker indices.
///
/// Absence is `None`, never an error. A record that fails to decode surfaces
/// as [`KeeperError::Codec`].
#[derive(Debug, Clone, Copy)]
pub struct Registry<'a> {
    namespace: &'a str,
}

impl<'a> Registry<'a> {
    pub fn new(config: &'a KeeperConfig) -> Self {
        Self {
            namespace: &config.store_namespace,
        }
    }

    pub fn get(
        &self,
        ctx: &Context<'_>,
        operator: &AccAddress,
    ) -> KeeperResult<Option<ServiceNode>> {
        ctx.kv(self.namespace)
            .get(&service_node_key(operator))
            .map(|bytes| decode_node(&bytes))
            .transpose()
    }

    /// Write `node` and both of its index entries.
    ///
    /// When `previous` is given, its bond and moniker entries are removed
    /// first if they no longer match.
    pub fn put(
        &self,
        ctx: &mut Context<'_>,
        node: &ServiceNode,
        previous: Option<&ServiceNode>,
    ) -> KeeperResult<()> {
        let bytes = serde_json::to_vec(node).map_err(KeeperError::codec)?;
        let operator = node.operator_address;
        let mut kv = ctx.kv_mut(self.namespace);

        if let Some(prev) = previous {
            if prev.bond.amount != node.bond.amount {
                kv.delete(&bond_index_key(prev.bond.amount, &prev.operator_address));
            }
            if prev.moniker != node.moniker {
                kv.delete(&moniker_key(&prev.moniker));
            }
        }

        kv.set(&service_node_key(&operator), bytes);
        kv.set(
            &bond_index_key(node.bond.amount, &operator),
            operator.as_bytes().to_vec(),
        );
        kv.set(&moniker_key(&node.moniker), operator.as_bytes().to_vec());

        debug!(
            operator = %operator,
            moniker = %node.moniker,
            bond = %node.bond,
            "Service node stored"
        );
        Ok(())
    }

    /// Delete the record and its bond index entry. The moniker entry is
    /// removed separately with [`Registry::remove_moniker`].
    pub fn remove(&self, ctx: &mut Context<'_>, node: &ServiceNode) {
        let mut kv = ctx.kv_mut(self.namespace);
        kv.delete(&service_node_key(&node.operator_address));
        kv.delete(&bond_index_key(node.bond.amount, &node.operator_address));
        debug!(operator = %node.operator_address, "Service node removed");
    }

    pub fn remove_moniker(&self, ctx: &mut Context<'_>, moniker: &str) {
        ctx.kv_mut(self.namespace).delete(&moniker_key(moniker));
    }

    pub fn moniker_taken(&self, ctx: &Context<'_>, moniker: &str) -> bool {
        ctx.kv(self.namespace).has(&moniker_key(moniker))
    }

    pub fn moniker_owner(
        &self,
        ctx: &Context<'_>,
        moniker: &str,
    ) -> KeeperResult<Option<AccAddress>> {
        ctx.kv(self.namespace)
            .get(&moniker_key(moniker))
            .map(|bytes| decode_address(&bytes))
            .transpose()
    }

    /// Every node, lowest bond first, equal bonds by descending address.
    /// Each call re-scans the index.
    pub fn list_all_by_bond(&self, ctx: &Context<'_>) -> KeeperResult<Vec<ServiceNode>> {
        let entries = ctx.kv(self.namespace).prefix_scan(&[BOND_INDEX_PREFIX]);
        self.resolve_index(ctx, entries)
    }

    /// The `limit` highest-bonded nodes, highest first.
    pub fn top_by_bond(&self, ctx: &Context<'_>, limit: usize) -> KeeperResult<Vec<ServiceNode>> {
        let (start, end) = ([BOND_INDEX_PREFIX], [BOND_INDEX_PREFIX + 1]);
        let entries: Vec<_> = ctx
            .kv(self.namespace)
            .reverse_range(Some(&start[..]), Some(&end[..]))
            .into_iter()
            .take(limit)
            .collect();
        self.resolve_index(ctx, entries)
    }

    /// Primary records in address order, bypassing the indices.
    pub fn records(&self, ctx: &Context<'_>) -> KeeperResult<Vec<ServiceNode>> {
        ctx.kv(self.namespace)
            .prefix_scan(&[SERVICE_NODE_PREFIX])
            .into_iter()
            .map(|(_, bytes)| decode_node(&bytes))
            .collect()
    }

    /// Raw bond index as `(bond_amount, operator)` in key order.
    pub fn bond_index(&self, ctx: &Context<'_>) -> KeeperResult<Vec<(u64, AccAddress)>> {
        ctx.kv(self.namespace)
            .prefix_scan(&[BOND_INDEX_PREFIX])
            .into_iter()
            .map(|(key, _)| parse_bond_index_key(&key))
            .collect()
    }

    /// Raw moniker index as `(moniker, operator)` in key order.
    pub fn moniker_index(&self, ctx: &Context<'_>) -> KeeperResult<Vec<(String, AccAddress)>> {
        ctx.kv(self.namespace)
            .prefix_scan(&[MONIKER_INDEX_PREFIX])
            .into_iter()
            .map(|(key, value)| {
                let moniker = String::from_utf8(key[1..].to_vec()).map_err(KeeperError::codec)?;
                Ok((moniker, decode_address(&value)?))
            })
            .collect()
    }

    fn resolve_index(
        &self,
        ctx: &Context<'_>,
        entries: Vec<(Vec<u8>, Vec<u8>)>,
    ) -> KeeperResult<Vec<ServiceNode>> {
        entries
            .into_iter()
            .map(|(_, value)| {
                let operator = decode_address(&value)?;
                self.get(ctx, &operator)?.ok_or_else(|| {
                    KeeperError::InvariantBroken(format!(
                        "bond index points at missing record {operator}"
                    ))
                })
            })
            .collect()
    }
}

fn decode_node(bytes: &[u8]) -> KeeperResult<ServiceNode> {
    serde_json::from_slice(bytes).map_err(KeeperError::codec)
}

fn decode_address(bytes: &[u8]) -> KeeperResult<AccAddress> {
    Ok(AccAddress::from_slice(bytes)?)
}
