use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use crate::error::TrieError;

/// The backing key/value store a trie persists committed nodes to, keyed by node
/// hash. Implementations are free to batch, buffer, or defer writes as long as a
/// `get` following a `put`/`put_batch` for the same key observes the new value.
pub trait TrieDB: Send + Sync {
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, TrieError>;
    fn put(&self, key: Vec<u8>, value: Vec<u8>) -> Result<(), TrieError>;
    fn put_batch(&self, batch: Vec<(Vec<u8>, Vec<u8>)>) -> Result<(), TrieError> {
        for (key, value) in batch {
            self.put(key, value)?;
        }
        Ok(())
    }
}

/// A `TrieDB` backed by a plain in-memory map, useful for tests and ephemeral
/// tries that are never meant to outlive the process.
#[derive(Clone, Default)]
pub struct InMemoryTrieDB {
    inner: Arc<Mutex<HashMap<Vec<u8>, Vec<u8>>>>,
}

impl InMemoryTrieDB {
    pub fn new_empty() -> Self {
        Self::default()
    }
}

impl TrieDB for InMemoryTrieDB {
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, TrieError> {
        let guard = self.inner.lock().map_err(|_| TrieError::LockError)?;
        Ok(guard.get(key).cloned())
    }

    fn put(&self, key: Vec<u8>, value: Vec<u8>) -> Result<(), TrieError> {
        let mut guard = self.inner.lock().map_err(|_| TrieError::LockError)?;
        guard.insert(key, value);
        Ok(())
    }

    fn put_batch(&self, batch: Vec<(Vec<u8>, Vec<u8>)>) -> Result<(), TrieError> {
        let mut guard = self.inner.lock().map_err(|_| TrieError::LockError)?;
        for (key, value) in batch {
            guard.insert(key, value);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn put_then_get_roundtrips() {
        let db = InMemoryTrieDB::new_empty();
        db.put(vec![1, 2, 3], vec![9, 9]).unwrap();
        assert_eq!(db.get(&[1, 2, 3]).unwrap(), Some(vec![9, 9]));
        assert_eq!(db.get(&[4, 5, 6]).unwrap(), None);
    }

    #[test]
    fn put_batch_writes_all_entries() {
        let db = InMemoryTrieDB::new_empty();
        db.put_batch(vec![(vec![1], vec![1]), (vec![2], vec![2])])
            .unwrap();
        assert_eq!(db.get(&[1]).unwrap(), Some(vec![1]));
        assert_eq!(db.get(&[2]).unwrap(), Some(vec![2]));
    }
}
