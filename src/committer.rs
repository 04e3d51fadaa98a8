use std::sync::Arc;

use ethereum_types::H256;

use crate::cache::NodeCache;
use crate::db::TrieDB;
use crate::error::TrieError;

/// The sink a trie hands sealed `(hash, encoded node)` pairs to when committing a
/// root. A block height accompanies each batch so a committer that cares about
/// provenance (e.g. pruning by block) can use it; implementations that don't care
/// are free to ignore it.
pub trait Committer: Send + Sync {
    fn commit_batch(&self, block_height: u64, nodes: Vec<(H256, Vec<u8>)>) -> Result<(), TrieError>;

    /// Fast path for nodes already known to be durable (e.g. sitting in a shared
    /// cache from a previous commit), letting a trie skip writing them again.
    fn find_cached(&self, _hash: &H256) -> Option<Vec<u8>> {
        None
    }
}

/// Rejects every commit. Used by tries opened read-only or stateless.
#[derive(Debug, Default)]
pub struct NullCommitter;

impl Committer for NullCommitter {
    fn commit_batch(&self, _block_height: u64, nodes: Vec<(H256, Vec<u8>)>) -> Result<(), TrieError> {
        if nodes.is_empty() {
            Ok(())
        } else {
            Err(TrieError::CommitsDisabled)
        }
    }
}

/// Forwards every commit straight to a backing `TrieDB`, ignoring block height.
pub struct PassThroughCommitter {
    db: Arc<dyn TrieDB>,
}

impl PassThroughCommitter {
    pub fn new(db: Arc<dyn TrieDB>) -> Self {
        Self { db }
    }
}

impl Committer for PassThroughCommitter {
    fn commit_batch(&self, _block_height: u64, nodes: Vec<(H256, Vec<u8>)>) -> Result<(), TrieError> {
        let batch = nodes
            .into_iter()
            .map(|(hash, bytes)| (hash.as_bytes().to_vec(), bytes))
            .collect();
        self.db.put_batch(batch)
    }
}

/// Writes a commit batch to the backing store and mirrors it into the shared node
/// cache so a subsequent commit (of a sibling trie, or after a cache eviction) can
/// skip re-writing bytes it already knows are durable.
pub struct BlockBatchCommitter {
    db: Arc<dyn TrieDB>,
    cache: Arc<NodeCache>,
}

impl BlockBatchCommitter {
    pub fn new(db: Arc<dyn TrieDB>, cache: Arc<NodeCache>) -> Self {
        Self { db, cache }
    }
}

impl Committer for BlockBatchCommitter {
    fn commit_batch(&self, _block_height: u64, nodes: Vec<(H256, Vec<u8>)>) -> Result<(), TrieError> {
        let batch = nodes
            .iter()
            .map(|(hash, bytes)| (hash.as_bytes().to_vec(), bytes.clone()))
            .collect();
        self.db.put_batch(batch)?;
        for (hash, bytes) in nodes {
            self.cache.put(hash, bytes);
        }
        Ok(())
    }

    fn find_cached(&self, hash: &H256) -> Option<Vec<u8>> {
        self.cache.get(hash)
    }
}
