//! Prefix-scoped views over a store.

use crate::kv::{prefix_end_bytes, KvPair, KvRead, KvStore};

fn prefixed(prefix: &[u8], key: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(prefix.len() + key.len());
    out.extend_from_slice(prefix);
    out.extend_from_slice(key);
    out
}

/// Translate a range inside the namespace to a range over the parent.
fn parent_bounds(
    prefix: &[u8],
    start: Option<&[u8]>,
    end: Option<&[u8]>,
) -> (Vec<u8>, Option<Vec<u8>>) {
    let lower = prefixed(prefix, start.unwrap_or_default());
    let upper = match end {
        Some(e) => Some(prefixed(prefix, e)),
        None => prefix_end_bytes(prefix),
    };
    (lower, upper)
}

fn strip(prefix: &[u8], pairs: Vec<KvPair>) -> Vec<KvPair> {
    pairs
        .into_iter()
        .map(|(k, v)| (k[prefix.len()..].to_vec(), v))
        .collect()
}

/// Read-only view of one namespace of a parent store.
pub struct PrefixRead<'a> {
    parent: &'a dyn KvStore,
    prefix: Vec<u8>,
}

impl<'a> PrefixRead<'a> {
    pub fn new(parent: &'a dyn KvStore, prefix: &[u8]) -> Self {
        Self {
            parent,
            prefix: prefix.to_vec(),
        }
    }
}

impl KvRead for PrefixRead<'_> {
    fn get(&self, key: &[u8]) -> Option<Vec<u8>> {
        self.parent.get(&prefixed(&self.prefix, key))
    }

    fn range(&self, start: Option<&[u8]>, end: Option<&[u8]>) -> Vec<KvPair> {
        let (lower, upper) = parent_bounds(&self.prefix, start, end);
        let pairs = self.parent.range(Some(&lower), upper.as_deref());
        strip(&self.prefix, pairs)
    }
}

/// Read-write view of one namespace of a parent store.
///
/// Keys are transparently prefixed on the way in and stripped on the way out,
/// so two modules sharing a parent never see each other's keys.
pub struct PrefixStore<'a> {
    parent: &'a mut dyn KvStore,
    prefix: Vec<u8>,
}

impl<'a> PrefixStore<'a> {
    pub fn new(parent: &'a mut dyn KvStore, prefix: &[u8]) -> Self {
        Self {
            parent,
            prefix: prefix.to_vec(),
        }
    }
}

impl KvRead for PrefixStore<'_> {
    fn get(&self, key: &[u8]) -> Option<Vec<u8>> {
        self.parent.get(&prefixed(&self.prefix, key))
    }

    fn range(&self, start: Option<&[u8]>, end: Option<&[u8]>) -> Vec<KvPair> {
        let (lower, upper) = parent_bounds(&self.prefix, start, end);
        let pairs = self.parent.range(Some(&lower), upper.as_deref());
        strip(&self.prefix, pairs)
    }
}

impl KvStore for PrefixStore<'_> {
    fn set(&mut self, key: &[u8], value: Vec<u8>) {
        let full = prefixed(&self.prefix, key);
        self.parent.set(&full, value);
    }

    fn delete(&mut self, key: &[u8]) {
        let full = prefixed(&self.prefix, key);
        self.parent.delete(&full);
    }
}
