//! Write-back cache layered over a parent store.

use std::collections::BTreeMap;

use tracing::trace;

use crate::kv::{in_bounds, KvPair, KvRead, KvStore};

/// A write-buffering branch over a parent store.
///
/// Reads see the branch's own writes layered over the parent. Nothing reaches
/// the parent until [`CacheStore::write`]; dropping the branch discards every
/// buffered write.
pub struct CacheStore<'a> {
    parent: &'a mut dyn KvStore,
    /// `None` marks a deletion
    pending: BTreeMap<Vec<u8>, Option<Vec<u8>>>,
}

impl<'a> CacheStore<'a> {
    pub fn new(parent: &'a mut dyn KvStore) -> Self {
        Self {
            parent,
            pending: BTreeMap::new(),
        }
    }

    /// Number of buffered writes and deletions.
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    /// Flush every buffered write into the parent, in key order.
    pub fn write(self) {
        trace!(writes = self.pending.len(), "Committing cache branch");
        for (key, value) in self.pending {
            match value {
                Some(v) => self.parent.set(&key, v),
                None => self.parent.delete(&key),
            }
        }
    }
}

impl KvRead for CacheStore<'_> {
    fn get(&self, key: &[u8]) -> Option<Vec<u8>> {
        match self.pending.get(key) {
            Some(buffered) => buffered.clone(),
            None => self.parent.get(key),
        }
    }

    fn range(&self, start: Option<&[u8]>, end: Option<&[u8]>) -> Vec<KvPair> {
        let mut merged: BTreeMap<Vec<u8>, Vec<u8>> =
            self.parent.range(start, end).into_iter().collect();
        for (key, value) in &self.pending {
            if !in_bounds(key, start, end) {
                continue;
            }
            match value {
                Some(v) => {
                    merged.insert(key.clone(), v.clone());
                }
                None => {
                    merged.remove(key);
                }
            }
        }
        merged.into_iter().collect()
    }
}

impl KvStore for CacheStore<'_> {
    fn set(&mut self, key: &[u8], value: Vec<u8>) {
        self.pending.insert(key.to_vec(), Some(value));
    }

    fn delete(&mut self, key: &[u8]) {
        self.pending.insert(key.to_vec(), None);
    }
}
