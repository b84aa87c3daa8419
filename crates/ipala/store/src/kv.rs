//! Ordered key/value traits and range helpers.

/// A key/value pair returned by range scans.
pub type KvPair = (Vec<u8>, Vec<u8>);

/// Read side of an ordered byte-key store.
pub trait KvRead {
    fn get(&self, key: &[u8]) -> Option<Vec<u8>>;

    fn has(&self, key: &[u8]) -> bool {
        self.get(key).is_some()
    }

    /// All pairs with `start <= key < end` in ascending key order.
    ///
    /// `None` bounds are open. Results are materialized, so every call
    /// re-scans the store.
    fn range(&self, start: Option<&[u8]>, end: Option<&[u8]>) -> Vec<KvPair>;

    /// Same bounds as [`KvRead::range`], descending key order.
    fn reverse_range(&self, start: Option<&[u8]>, end: Option<&[u8]>) -> Vec<KvPair> {
        let mut pairs = self.range(start, end);
        pairs.reverse();
        pairs
    }

    /// All pairs whose key starts with `prefix`, ascending.
    fn prefix_scan(&self, prefix: &[u8]) -> Vec<KvPair> {
        let end = prefix_end_bytes(prefix);
        self.range(Some(prefix), end.as_deref())
    }
}

/// Write side of an ordered byte-key store.
pub trait KvStore: KvRead {
    fn set(&mut self, key: &[u8], value: Vec<u8>);

    fn delete(&mut self, key: &[u8]);
}

/// Smallest key strictly greater than every key starting with `prefix`.
///
/// `None` when no such key exists (empty prefix or all `0xff`).
pub fn prefix_end_bytes(prefix: &[u8]) -> Option<Vec<u8>> {
    let mut end = prefix.to_vec();
    while let Some(last) = end.pop() {
        if last < u8::MAX {
            end.push(last + 1);
            return Some(end);
        }
    }
    None
}

/// Exclusive end bound that makes a range include `key` itself.
pub fn inclusive_end_bytes(key: &[u8]) -> Vec<u8> {
    let mut end = key.to_vec();
    end.push(0x00);
    end
}

pub(crate) fn in_bounds(key: &[u8], start: Option<&[u8]>, end: Option<&[u8]>) -> bool {
    start.map_or(true, |s| key >= s) && end.map_or(true, |e| key < e)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prefix_end_increments_last_byte() {
        assert_eq!(prefix_end_bytes(&[0x11]), Some(vec![0x12]));
        assert_eq!(prefix_end_bytes(&[0x11, 0xff]), Some(vec![0x12]));
        assert_eq!(prefix_end_bytes(&[0xff, 0xff]), None);
        assert_eq!(prefix_end_bytes(&[]), None);
    }

    #[test]
    fn inclusive_end_sorts_right_after_key() {
        let key = b"abc".to_vec();
        let end = inclusive_end_bytes(&key);
        assert!(key < end);
        assert!(end < b"abd".to_vec());
        assert!(end < b"abc\x01".to_vec());
    }

    #[test]
    fn bounds_check() {
        assert!(in_bounds(b"b", Some(b"a"), Some(b"c")));
        assert!(in_bounds(b"a", Some(b"a"), None));
        assert!(!in_bounds(b"c", None, Some(b"c")));
    }
}
