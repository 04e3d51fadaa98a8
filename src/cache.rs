use std::num::NonZeroUsize;
use std::sync::Mutex;

use ethereum_types::H256;
use lru::LruCache;

/// Average serialized size of a node, used to translate a byte budget into an entry
/// count for the underlying `lru::LruCache`.
const AVERAGE_NODE_SIZE_BYTES: usize = 384;

/// A process-wide, bounded cache of sealed (already-hashed, already-committed) node
/// bytes, shared across every open trie backed by the same store. Only ever holds
/// bytes that are also durable in the backing store, so an eviction never loses data
/// — it just means the next lookup falls through to the store.
pub struct NodeCache {
    inner: Mutex<LruCache<H256, Vec<u8>>>,
}

impl NodeCache {
    pub fn with_budget_bytes(budget_bytes: usize) -> Self {
        let capacity = (budget_bytes / AVERAGE_NODE_SIZE_BYTES).max(1);
        Self {
            inner: Mutex::new(LruCache::new(
                NonZeroUsize::new(capacity).expect("capacity is at least 1"),
            )),
        }
    }

    pub fn get(&self, hash: &H256) -> Option<Vec<u8>> {
        let mut guard = self.inner.lock().expect("node cache lock poisoned");
        guard.get(hash).cloned()
    }

    pub fn put(&self, hash: H256, bytes: Vec<u8>) {
        let mut guard = self.inner.lock().expect("node cache lock poisoned");
        guard.put(hash, bytes);
    }

    pub fn len(&self) -> usize {
        self.inner.lock().expect("node cache lock poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn budget_translates_to_entry_capacity() {
        let cache = NodeCache::with_budget_bytes(AVERAGE_NODE_SIZE_BYTES * 4);
        for i in 0u8..8 {
            cache.put(H256::from_low_u64_be(i as u64), vec![i; 10]);
        }
        // only the 4 most recently used entries should survive
        assert!(cache.len() <= 4);
    }

    #[test]
    fn hit_after_put() {
        let cache = NodeCache::with_budget_bytes(AVERAGE_NODE_SIZE_BYTES * 8);
        let hash = H256::from_low_u64_be(42);
        cache.put(hash, vec![1, 2, 3]);
        assert_eq!(cache.get(&hash), Some(vec![1, 2, 3]));
    }

    #[test]
    fn miss_returns_none() {
        let cache = NodeCache::with_budget_bytes(AVERAGE_NODE_SIZE_BYTES * 8);
        assert_eq!(cache.get(&H256::from_low_u64_be(7)), None);
    }
}
