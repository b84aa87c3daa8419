//! Unbonding queue: pending releases bucketed by maturity time.

use chrono::{DateTime, Utc};
use ipala_store::{inclusive_end_bytes, Context, KvRead, KvStore};
use ipala_types::UnBonding;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::KeeperConfig;
use crate::error::{KeeperError, KeeperResult};
use crate::keys::{parse_unbonding_queue_key, unbonding_queue_key, UNBONDING_QUEUE_PREFIX};

/// Every pending entry maturing at one quantized instant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnbondingBucket {
    pub end_time: DateTime<Utc>,
    pub entries: Vec<UnBonding>,
}

/// Time-bucketed queue of pending releases.
///
/// Buckets are keyed by their maturity time in sortable form, so an
/// ascending scan visits them in time order. Entries are never addressed
/// individually; a bucket is appended to and then deleted whole.
#[derive(Debug, Clone, Copy)]
pub struct UnbondingQueue<'a> {
    namespace: &'a str,
}

impl<'a> UnbondingQueue<'a> {
    pub fn new(config: &'a KeeperConfig) -> Self {
        Self {
            namespace: &config.store_namespace,
        }
    }

    /// Append `entries` to the bucket at `end_time`, creating it if needed.
    pub fn insert(
        &self,
        ctx: &mut Context<'_>,
        end_time: DateTime<Utc>,
        entries: &[UnBonding],
    ) -> KeeperResult<()> {
        if entries.is_empty() {
            return Ok(());
        }
        let key = unbonding_queue_key(&end_time);
        let mut bucket = self.bucket(ctx, end_time)?;
        bucket.extend_from_slice(entries);
        let bytes = serde_json::to_vec(&bucket).map_err(KeeperError::codec)?;
        ctx.kv_mut(self.namespace).set(&key, bytes);

        debug!(
            end_time = %end_time,
            added = entries.len(),
            bucket_len = bucket.len(),
            "Unbonding enqueued"
        );
        Ok(())
    }

    /// Entries of the bucket at `end_time`, empty when there is none.
    pub fn bucket(
        &self,
        ctx: &Context<'_>,
        end_time: DateTime<Utc>,
    ) -> KeeperResult<Vec<UnBonding>> {
        match ctx.kv(self.namespace).get(&unbonding_queue_key(&end_time)) {
            Some(bytes) => decode_bucket(&bytes),
            None => Ok(Vec::new()),
        }
    }

    /// Remove and return every entry whose bucket time is at or before
    /// `cursor`, oldest bucket first and insertion order within a bucket.
    pub fn drain_matured(
        &self,
        ctx: &mut Context<'_>,
        cursor: DateTime<Utc>,
    ) -> KeeperResult<Vec<UnBonding>> {
        let end = inclusive_end_bytes(&unbonding_queue_key(&cursor));
        let matured = ctx
            .kv(self.namespace)
            .range(Some(&[UNBONDING_QUEUE_PREFIX][..]), Some(end.as_slice()));

        let mut drained = Vec::new();
        let mut kv = ctx.kv_mut(self.namespace);
        for (key, bytes) in &matured {
            drained.extend(decode_bucket(bytes)?);
            kv.delete(key);
        }

        if !matured.is_empty() {
            debug!(
                cursor = %cursor,
                buckets = matured.len(),
                entries = drained.len(),
                "Matured unbondings drained"
            );
        }
        Ok(drained)
    }

    /// Every pending bucket, oldest first.
    pub fn pending(&self, ctx: &Context<'_>) -> KeeperResult<Vec<UnbondingBucket>> {
        ctx.kv(self.namespace)
            .prefix_scan(&[UNBONDING_QUEUE_PREFIX])
            .into_iter()
            .map(|(key, bytes)| {
                Ok(UnbondingBucket {
                    end_time: parse_unbonding_queue_key(&key)?,
                    entries: decode_bucket(&bytes)?,
                })
            })
            .collect()
    }
}

fn decode_bucket(bytes: &[u8]) -> KeeperResult<Vec<UnBonding>> {
    serde_json::from_slice(bytes).map_err(KeeperError::codec)
}
