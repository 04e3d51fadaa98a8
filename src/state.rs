use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use ethereum_types::H256;

use crate::cache::NodeCache;
use crate::committer::{Committer, PassThroughCommitter};
use crate::db::TrieDB;
use crate::error::TrieError;
use crate::node::{decode_node, decode_raw_node, encode_node, Node};
use crate::node_hash::NodeHash;

const DEFAULT_CACHE_BUDGET_BYTES: usize = 64 * 1024 * 1024;

/// The collaborators a single trie needs to resolve and persist nodes: a backing
/// store, a shared sealed-node cache, a committer, and a private working set of
/// nodes built during the in-progress mutation (the "dirty" set — see the ownership
/// note in the crate-level docs).
pub struct TrieState {
    db: Arc<dyn TrieDB>,
    cache: Arc<NodeCache>,
    committer: Arc<dyn Committer>,
    dirty: RefCell<HashMap<H256, Node>>,
}

impl TrieState {
    pub fn new(db: Box<dyn TrieDB>) -> Self {
        let db: Arc<dyn TrieDB> = Arc::from(db);
        let committer = Arc::new(PassThroughCommitter::new(db.clone()));
        Self::with_collaborators(
            db,
            Arc::new(NodeCache::with_budget_bytes(DEFAULT_CACHE_BUDGET_BYTES)),
            committer,
        )
    }

    pub fn with_collaborators(
        db: Arc<dyn TrieDB>,
        cache: Arc<NodeCache>,
        committer: Arc<dyn Committer>,
    ) -> Self {
        Self {
            db,
            cache,
            committer,
            dirty: RefCell::new(HashMap::new()),
        }
    }

    /// Resolves a child reference to its node, preferring (in order) the inlined
    /// bytes, this trie's private dirty set, the committer's own fast path, the
    /// shared node cache, and finally the backing store.
    pub fn get_node(&self, hash: &NodeHash) -> Result<Option<Node>, TrieError> {
        match hash {
            NodeHash::Invalid => Ok(None),
            NodeHash::Inline(bytes) => Ok(Some(decode_raw_node(bytes)?)),
            NodeHash::Hashed(h) => {
                if let Some(node) = self.dirty.borrow().get(h) {
                    return Ok(Some(node.clone()));
                }
                if let Some(bytes) = self.committer.find_cached(h) {
                    return Ok(Some(decode_node(&bytes)?));
                }
                if let Some(bytes) = self.cache.get(h) {
                    return Ok(Some(decode_node(&bytes)?));
                }
                match self.db.get(h.as_bytes())? {
                    Some(bytes) => {
                        let node = decode_node(&bytes)?;
                        self.cache.put(*h, bytes);
                        Ok(Some(node))
                    }
                    None => Ok(None),
                }
            }
        }
    }

    /// Records a newly built node in the private working set, keyed by its own
    /// hash. Inlined nodes are skipped: they have no independent identity and are
    /// always re-decoded from their parent's encoding.
    pub fn insert_node(&self, hash: NodeHash, node: Node) {
        if let NodeHash::Hashed(h) = hash {
            self.dirty.borrow_mut().insert(h, node);
        }
    }

    pub fn is_dirty(&self, hash: &H256) -> bool {
        self.dirty.borrow().contains_key(hash)
    }

    /// Walks every dirty node reachable from `root`, seals each one (encodes it and
    /// hands it to the committer), and evicts it from the private working set. Nodes
    /// the committer already reports as durable (via `find_cached`) are skipped.
    pub fn commit(&mut self, root: &NodeHash, block_height: u64) -> Result<(), TrieError> {
        let mut batch = Vec::new();
        let mut visited = HashSet::new();
        self.collect_dirty(root, &mut batch, &mut visited)?;
        self.committer.commit_batch(block_height, batch)?;
        let mut dirty = self.dirty.borrow_mut();
        for hash in visited {
            dirty.remove(&hash);
        }
        Ok(())
    }

    fn collect_dirty(
        &self,
        hash: &NodeHash,
        batch: &mut Vec<(H256, Vec<u8>)>,
        visited: &mut HashSet<H256>,
    ) -> Result<(), TrieError> {
        let NodeHash::Hashed(h) = hash else {
            return Ok(());
        };
        if visited.contains(h) || self.committer.find_cached(h).is_some() {
            return Ok(());
        }
        let Some(node) = self.dirty.borrow().get(h).cloned() else {
            return Ok(());
        };
        visited.insert(*h);
        match &node {
            Node::Branch(branch) => {
                for child in &branch.choices {
                    self.collect_dirty(child, batch, visited)?;
                }
            }
            Node::Extension(extension) => {
                self.collect_dirty(&extension.child, batch, visited)?;
            }
            Node::Leaf(_) => {}
        }
        batch.push((*h, encode_node(&node)));
        Ok(())
    }

    /// The dirty children of a branch whose hashes are *not* already sealed —
    /// used by the trie engine to decide whether a commit's branch-child work is
    /// worth dispatching to the thread pool.
    pub fn dirty_child_count(&self, choices: &[NodeHash; 16]) -> usize {
        choices
            .iter()
            .filter(|hash| matches!(hash, NodeHash::Hashed(h) if self.is_dirty(h)))
            .count()
    }

    /// A handle to the committer, cheaply cloneable, for use by a caller (the trie
    /// engine) dispatching subtree commits across worker threads.
    pub fn committer(&self) -> Arc<dyn Committer> {
        self.committer.clone()
    }

    /// Collects the encoded bytes of every dirty node reachable from `hash`,
    /// without mutating the working set — used to hand an independent subtree to a
    /// worker thread for parallel commit.
    pub fn dirty_subtree_bytes(&self, hash: &NodeHash) -> Result<Vec<(H256, Vec<u8>)>, TrieError> {
        let mut batch = Vec::new();
        let mut visited = HashSet::new();
        self.collect_dirty(hash, &mut batch, &mut visited)?;
        Ok(batch)
    }

    /// Removes the given hashes from the private working set after their bytes have
    /// been durably committed by a caller bypassing `TrieState::commit`.
    pub fn discard_dirty(&self, hashes: &[H256]) {
        let mut dirty = self.dirty.borrow_mut();
        for hash in hashes {
            dirty.remove(hash);
        }
    }
}
