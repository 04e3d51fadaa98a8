//! A hash-addressed, radix-16 authenticated Merkle Patricia Trie engine.
//!
//! The trie maps byte-string keys to byte-string values and exposes a single
//! 32-byte root hash that authenticates its entire contents: any two tries with the
//! same set of key/value pairs have the same root hash, and changing one bit
//! anywhere in the trie changes the root.

pub mod cache;
pub mod committer;
pub mod config;
pub mod db;
pub mod error;
pub mod nibbles;
mod node;
mod node_hash;
pub mod state;
mod threadpool;
pub mod trie_iter;
pub mod visitor;

use std::cell::Cell;
use std::sync::{Arc, Mutex};

use ethereum_types::H256;
use lazy_static::lazy_static;
use sha3::{Digest, Keccak256};
use tracing::{debug, trace, warn};

pub use cache::NodeCache;
pub use committer::{BlockBatchCommitter, Committer, NullCommitter, PassThroughCommitter};
pub use config::TrieConfig;
pub use db::{InMemoryTrieDB, TrieDB};
pub use error::TrieError;
pub use nibbles::Nibbles;
pub use node::{BranchNode, ExtensionNode, LeafNode, Node};
pub use node_hash::NodeHash;
pub use state::TrieState;
pub use trie_iter::TrieIter;
pub use visitor::{accept, Visitor};

use threadpool::ThreadPool;

pub type PathRLP = Vec<u8>;
pub type ValueRLP = Vec<u8>;

lazy_static! {
    /// The root hash of a trie with no entries: the Keccak256 hash of the RLP
    /// encoding of the empty byte string (`0x80`).
    pub static ref EMPTY_TRIE_HASH: H256 = {
        let mut hasher = Keccak256::new();
        hasher.update([0x80u8]);
        H256::from_slice(&hasher.finalize())
    };
}

/// A single Merkle Patricia Trie.
///
/// A `Trie` is single-writer: `insert`/`remove`/`commit` take `&mut self`, so the
/// borrow checker already forbids two mutations running at once on one `Trie`
/// value. The `mutating` guard below additionally catches reentrant calls (e.g. a
/// visitor callback that tries to mutate the same trie it is walking), which the
/// borrow checker can't see through a shared reference taken for the walk.
pub struct Trie {
    root: NodeHash,
    state: TrieState,
    config: TrieConfig,
    mutating: Cell<bool>,
}

impl Trie {
    /// Opens an empty trie over `db`.
    pub fn new(db: Box<dyn TrieDB>) -> Self {
        Self::with_config(db, TrieConfig::default())
    }

    pub fn with_config(db: Box<dyn TrieDB>, config: TrieConfig) -> Self {
        let db: Arc<dyn TrieDB> = Arc::from(db);
        let cache = Arc::new(NodeCache::with_budget_bytes(config.cache_memory_budget_bytes));
        let committer: Arc<dyn Committer> = if config.allow_commits {
            Arc::new(BlockBatchCommitter::new(db.clone(), cache.clone()))
        } else {
            Arc::new(NullCommitter)
        };
        Self {
            root: NodeHash::Invalid,
            state: TrieState::with_collaborators(db, cache, committer),
            config,
            mutating: Cell::new(false),
        }
    }

    /// Opens a trie whose root is already known to exist in `db`.
    pub fn open(db: Box<dyn TrieDB>, root: H256, config: TrieConfig) -> Self {
        let mut trie = Self::with_config(db, config);
        trie.root = if root == *EMPTY_TRIE_HASH {
            NodeHash::Invalid
        } else {
            NodeHash::Hashed(root)
        };
        trie
    }

    fn enter(&self) -> Result<(), TrieError> {
        if self.mutating.replace(true) {
            return Err(TrieError::ConcurrentMutation);
        }
        Ok(())
    }

    fn exit(&self) {
        self.mutating.set(false);
    }

    pub fn get(&self, path: &[u8]) -> Result<Option<ValueRLP>, TrieError> {
        if !self.root.is_valid() {
            return Ok(None);
        }
        let Some(root_node) = self.state.get_node(&self.root)? else {
            return Err(TrieError::NodeMissing(self.root.finalize()));
        };
        root_node.get(&self.state, &Nibbles::from_bytes(path))
    }

    pub fn insert(&mut self, path: PathRLP, value: ValueRLP) -> Result<(), TrieError> {
        self.enter()?;
        let result = self.insert_inner(path, value);
        self.exit();
        result
    }

    fn insert_inner(&mut self, path: PathRLP, value: ValueRLP) -> Result<(), TrieError> {
        // An empty value is a delete (spec: "If value is empty, behaves as
        // delete"). Route through the same removal path `remove_inner` uses,
        // silently no-op-ing if the key was already absent.
        if value.is_empty() {
            self.remove_inner(&path, true)?;
            return Ok(());
        }
        let path = Nibbles::from_bytes(&path);
        let new_root = match self.root.is_valid() {
            true => {
                let root_node = self
                    .state
                    .get_node(&self.root)?
                    .ok_or_else(|| TrieError::NodeMissing(self.root.finalize()))?;
                root_node.insert(&self.state, path, value)?
            }
            false => Node::Leaf(LeafNode::new(path, value)),
        };
        self.root = new_root.insert_self_as_root(&self.state)?;
        Ok(())
    }

    /// Removes `path`. With `ignore_missing = true` (the default behavior of
    /// [`Trie::remove`]), a missing path is not an error: `Ok(None)` is returned.
    /// With `ignore_missing = false`, a missing path yields
    /// [`TrieError::MissingForDelete`].
    pub fn remove_with(
        &mut self,
        path: &[u8],
        ignore_missing: bool,
    ) -> Result<Option<ValueRLP>, TrieError> {
        self.enter()?;
        let result = self.remove_inner(path, ignore_missing);
        self.exit();
        result
    }

    /// Removes `path`, silently returning `Ok(None)` if it was absent.
    pub fn remove(&mut self, path: &[u8]) -> Result<Option<ValueRLP>, TrieError> {
        self.remove_with(path, true)
    }

    fn remove_inner(
        &mut self,
        path: &[u8],
        ignore_missing: bool,
    ) -> Result<Option<ValueRLP>, TrieError> {
        if !self.root.is_valid() {
            return if ignore_missing {
                Ok(None)
            } else {
                Err(TrieError::MissingForDelete)
            };
        }
        let path = Nibbles::from_bytes(path);
        let root_node = self
            .state
            .get_node(&self.root)?
            .ok_or_else(|| TrieError::NodeMissing(self.root.finalize()))?;
        let (new_root, removed) = root_node.remove(&self.state, &path)?;
        if removed.is_none() && !ignore_missing {
            return Err(TrieError::MissingForDelete);
        }
        self.root = match new_root {
            Some(node) => node.insert_self_as_root(&self.state)?,
            None => NodeHash::Invalid,
        };
        Ok(removed)
    }

    /// The current root hash, or [`EMPTY_TRIE_HASH`] for an empty trie. Unlike
    /// `commit`, this never writes anything to the backing store — it only forces
    /// pending in-memory nodes to be hashed if they haven't been already.
    pub fn root_hash(&self) -> Result<H256, TrieError> {
        Ok(self.root.finalize_or(*EMPTY_TRIE_HASH))
    }

    /// Discards the in-memory working view and points the trie at `root`, which
    /// must already be durable in the backing store (or be the empty root).
    /// Any not-yet-committed mutations are lost.
    pub fn set_root_hash(&mut self, root: H256) {
        self.root = if root == *EMPTY_TRIE_HASH {
            NodeHash::Invalid
        } else {
            NodeHash::Hashed(root)
        };
    }

    /// Seals and persists every dirty node reachable from the current root.
    ///
    /// When the root is a branch with at least
    /// [`TrieConfig::parallel_branch_threshold`] dirty children, each qualifying
    /// child's subtree is committed on its own worker thread; otherwise the whole
    /// subtree is committed inline. Partial failure across workers is reported as
    /// [`TrieError::AggregatedCommitError`], and any worker that did succeed has
    /// already durably written its subtree — only the failed subtrees remain dirty.
    pub fn commit(&mut self, block_height: u64) -> Result<(), TrieError> {
        if !self.config.allow_commits {
            return Err(TrieError::CommitsDisabled);
        }
        self.enter()?;
        let result = self.commit_inner(block_height);
        self.exit();
        result
    }

    fn commit_inner(&mut self, block_height: u64) -> Result<(), TrieError> {
        if !self.root.is_valid() {
            return Ok(());
        }

        let root_hash = match &self.root {
            NodeHash::Hashed(h) => Some(*h),
            _ => None,
        };

        if let Some(root_hash) = root_hash {
            if self.state.is_dirty(&root_hash) {
                if let Some(Node::Branch(branch)) = self.state.get_node(&self.root)? {
                    let dirty_children = self.state.dirty_child_count(&branch.choices);
                    if dirty_children >= self.config.parallel_branch_threshold {
                        debug!(dirty_children, "dispatching parallel branch commit");
                        return self.commit_parallel(block_height, root_hash, &branch);
                    }
                }
            }
        }

        trace!(root = ?self.root, "committing trie inline");
        self.state.commit(&self.root, block_height)
    }

    fn commit_parallel(
        &mut self,
        block_height: u64,
        root_hash: H256,
        branch: &BranchNode,
    ) -> Result<(), TrieError> {
        let mut subtrees = Vec::new();
        for child in branch.choices.iter() {
            if let NodeHash::Hashed(h) = child {
                if self.state.is_dirty(h) {
                    let bytes = self.state.dirty_subtree_bytes(child)?;
                    if !bytes.is_empty() {
                        subtrees.push(bytes);
                    }
                }
            }
        }

        let committer = self.state.committer();
        let errors: Arc<Mutex<Vec<TrieError>>> = Arc::new(Mutex::new(Vec::new()));
        let committed: Arc<Mutex<Vec<H256>>> = Arc::new(Mutex::new(Vec::new()));

        std::thread::scope(|scope| {
            let pool = ThreadPool::new(subtrees.len().max(1), scope);
            for subtree in subtrees {
                let committer = committer.clone();
                let errors = errors.clone();
                let committed = committed.clone();
                pool.execute(move || {
                    let hashes: Vec<H256> = subtree.iter().map(|(h, _)| *h).collect();
                    match committer.commit_batch(block_height, subtree) {
                        Ok(()) => committed.lock().expect("poisoned").extend(hashes),
                        Err(err) => {
                            warn!(error = %err, "parallel branch commit failed");
                            errors.lock().expect("poisoned").push(err);
                        }
                    }
                });
            }
        });

        let committed_hashes = committed.lock().expect("poisoned").clone();
        self.state.discard_dirty(&committed_hashes);

        let errors = Arc::try_unwrap(errors)
            .map(|m| m.into_inner().expect("poisoned"))
            .unwrap_or_default();
        if !errors.is_empty() {
            return Err(TrieError::AggregatedCommitError(errors));
        }

        // Every dirty child is sealed; commit the root branch node itself.
        let encoded = node::encode_node(&Node::Branch(Box::new(branch.clone())));
        committer.commit_batch(block_height, vec![(root_hash, encoded)])?;
        self.state.discard_dirty(&[root_hash]);
        Ok(())
    }

    /// Walks the trie with `visitor`, tolerating nodes missing from the backing
    /// store (reported via [`Visitor::visit_missing_node`] instead of erroring).
    /// `expect_accounts` is forwarded to the visitor as a hint that leaf values may
    /// be account RLPs (see [`Visitor::visit_account`]).
    pub fn accept(&self, visitor: &mut dyn Visitor, expect_accounts: bool) -> Result<(), TrieError> {
        visitor::accept(&self.state, &self.root, expect_accounts, visitor)
    }

    /// Walks the subtree rooted at `root`, which may be a historical root different
    /// from this trie's current one. `root` must already be durable in the backing
    /// store (or be [`EMPTY_TRIE_HASH`]); nodes are resolved lazily from it exactly
    /// as in [`Trie::accept`].
    pub fn accept_root(
        &self,
        visitor: &mut dyn Visitor,
        root: H256,
        expect_accounts: bool,
    ) -> Result<(), TrieError> {
        let root_ref = if root == *EMPTY_TRIE_HASH {
            NodeHash::Invalid
        } else {
            NodeHash::Hashed(root)
        };
        visitor::accept(&self.state, &root_ref, expect_accounts, visitor)
    }

    pub fn state(&self) -> &TrieState {
        &self.state
    }
}

impl IntoIterator for Trie {
    type Item = (Nibbles, Node);
    type IntoIter = TrieIterOwned;

    fn into_iter(self) -> Self::IntoIter {
        TrieIterOwned { trie: self }
    }
}

/// Owns the `Trie` it iterates so the iterator can outlive a borrow of it.
pub struct TrieIterOwned {
    trie: Trie,
}

impl TrieIterOwned {
    pub fn content(self) -> impl Iterator<Item = (PathRLP, ValueRLP)> {
        let root = self.trie.root.clone();
        let inner: Vec<(PathRLP, ValueRLP)> = TrieIter::new(&self.trie.state, root)
            .content()
            .collect();
        inner.into_iter()
    }
}

impl NodeHash {
    fn finalize_or(&self, default: H256) -> H256 {
        if self.is_valid() {
            self.finalize()
        } else {
            default
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_temp() -> Trie {
        Trie::new(Box::new(InMemoryTrieDB::new_empty()))
    }

    #[test]
    fn empty_trie_hash_matches_keccak_of_rlp_null() {
        let trie = new_temp();
        assert_eq!(trie.root_hash().unwrap(), *EMPTY_TRIE_HASH);
    }

    #[test]
    fn get_on_empty_trie_returns_none() {
        let trie = new_temp();
        assert_eq!(trie.get(b"missing").unwrap(), None);
    }

    #[test]
    fn insert_then_get_roundtrips() {
        let mut trie = new_temp();
        trie.insert(b"hello".to_vec(), b"world".to_vec()).unwrap();
        assert_eq!(trie.get(b"hello").unwrap(), Some(b"world".to_vec()));
    }

    #[test]
    fn get_resolves_inlined_branch_children() {
        // Two short keys that share no prefix collapse straight into a branch whose
        // children are each under 32 bytes encoded, so both are stored as
        // `NodeHash::Inline` rather than hash-addressed.
        let mut trie = new_temp();
        trie.insert(vec![0x12], b"a".to_vec()).unwrap();
        trie.insert(vec![0x13], b"b".to_vec()).unwrap();
        assert_eq!(trie.get(&[0x12]).unwrap(), Some(b"a".to_vec()));
        assert_eq!(trie.get(&[0x13]).unwrap(), Some(b"b".to_vec()));
    }

    #[test]
    fn hash_changes_after_insert() {
        let mut trie = new_temp();
        let empty_hash = trie.root_hash().unwrap();
        trie.insert(b"k".to_vec(), b"v".to_vec()).unwrap();
        assert_ne!(trie.root_hash().unwrap(), empty_hash);
    }

    #[test]
    fn insert_is_order_independent() {
        let mut a = new_temp();
        a.insert(b"aaa".to_vec(), b"1".to_vec()).unwrap();
        a.insert(b"bbb".to_vec(), b"2".to_vec()).unwrap();
        a.insert(b"ccc".to_vec(), b"3".to_vec()).unwrap();

        let mut b = new_temp();
        b.insert(b"ccc".to_vec(), b"3".to_vec()).unwrap();
        b.insert(b"aaa".to_vec(), b"1".to_vec()).unwrap();
        b.insert(b"bbb".to_vec(), b"2".to_vec()).unwrap();

        assert_eq!(a.root_hash().unwrap(), b.root_hash().unwrap());
    }

    #[test]
    fn remove_restores_empty_hash() {
        let mut trie = new_temp();
        let empty_hash = trie.root_hash().unwrap();
        trie.insert(b"k".to_vec(), b"v".to_vec()).unwrap();
        trie.remove(b"k").unwrap();
        assert_eq!(trie.root_hash().unwrap(), empty_hash);
    }

    #[test]
    fn remove_missing_path_is_silent_by_default() {
        let mut trie = new_temp();
        assert_eq!(trie.remove(b"missing").unwrap(), None);
    }

    #[test]
    fn insert_with_empty_value_behaves_as_delete() {
        let mut trie = new_temp();
        trie.insert(b"k".to_vec(), b"v".to_vec()).unwrap();
        assert_eq!(trie.get(b"k").unwrap(), Some(b"v".to_vec()));

        trie.insert(b"k".to_vec(), Vec::new()).unwrap();
        assert_eq!(trie.get(b"k").unwrap(), None);
        assert_eq!(trie.root_hash().unwrap(), *EMPTY_TRIE_HASH);
    }

    #[test]
    fn insert_with_empty_value_on_absent_key_is_a_silent_no_op() {
        let mut trie = new_temp();
        trie.insert(b"missing".to_vec(), Vec::new()).unwrap();
        assert_eq!(trie.get(b"missing").unwrap(), None);
        assert_eq!(trie.root_hash().unwrap(), *EMPTY_TRIE_HASH);
    }

    #[test]
    fn remove_missing_path_errors_when_strict() {
        let mut trie = new_temp();
        let result = trie.remove_with(b"missing", false);
        assert!(matches!(result, Err(TrieError::MissingForDelete)));
    }

    #[test]
    fn split_then_collapse_round_trips_to_singleton_root() {
        // S3: two keys sharing a nibble prefix split a leaf into an extension over
        // a branch with two leaf children.
        let mut split = new_temp();
        split.insert(vec![0xab], b"x".to_vec()).unwrap();
        split.insert(vec![0xaf], b"y".to_vec()).unwrap();
        let split_root = split.root_hash().unwrap();

        let mut singleton = new_temp();
        singleton.insert(vec![0xab], b"x".to_vec()).unwrap();
        let singleton_root = singleton.root_hash().unwrap();
        assert_ne!(split_root, singleton_root);

        // S4: deleting the second key collapses the tree back to a single leaf
        // whose root matches the singleton-insertion root exactly.
        split.remove(&[0xaf]).unwrap();
        assert_eq!(split.root_hash().unwrap(), singleton_root);
        assert_eq!(split.get(&[0xab]).unwrap(), Some(b"x".to_vec()));
        assert_eq!(split.get(&[0xaf]).unwrap(), None);
    }

    #[test]
    fn overwrite_is_a_single_leaf_and_commit_idempotent() {
        // S5
        let mut trie = new_temp();
        trie.insert(b"k".to_vec(), b"v1".to_vec()).unwrap();
        trie.insert(b"k".to_vec(), b"v2".to_vec()).unwrap();
        assert_eq!(trie.get(b"k").unwrap(), Some(b"v2".to_vec()));

        trie.commit(0).unwrap();
        let root = trie.root_hash().unwrap();
        trie.commit(1).unwrap();
        assert_eq!(trie.root_hash().unwrap(), root);
    }

    #[test]
    fn history_read_at_old_root_survives_further_mutation() {
        // S6
        let db = InMemoryTrieDB::new_empty();
        let mut trie = Trie::with_config(Box::new(db.clone()), TrieConfig::default());
        trie.insert(b"k1".to_vec(), b"v1".to_vec()).unwrap();
        trie.commit(0).unwrap();
        let r1 = trie.root_hash().unwrap();

        trie.insert(b"k2".to_vec(), b"v2".to_vec()).unwrap();
        trie.commit(1).unwrap();
        let r2 = trie.root_hash().unwrap();
        assert_ne!(r1, r2);

        let at_r1 = Trie::open(Box::new(db), r1, TrieConfig::default());
        assert_eq!(at_r1.get(b"k1").unwrap(), Some(b"v1".to_vec()));
        assert_eq!(at_r1.get(b"k2").unwrap(), None);

        // the live trie is still at r2 and sees both keys
        assert_eq!(trie.get(b"k1").unwrap(), Some(b"v1".to_vec()));
        assert_eq!(trie.get(b"k2").unwrap(), Some(b"v2".to_vec()));
    }

    #[test]
    fn commit_then_reopen_preserves_contents() {
        let db = InMemoryTrieDB::new_empty();
        let mut trie = Trie::with_config(Box::new(db.clone()), TrieConfig::default());
        trie.insert(b"k".to_vec(), b"v".to_vec()).unwrap();
        let root = trie.root_hash().unwrap();
        trie.commit(0).unwrap();

        let reopened = Trie::open(Box::new(db), root, TrieConfig::default());
        assert_eq!(reopened.get(b"k").unwrap(), Some(b"v".to_vec()));
    }

    #[test]
    fn commits_disabled_rejects_commit() {
        let config = TrieConfig {
            allow_commits: false,
            ..TrieConfig::default()
        };
        let mut trie = Trie::with_config(Box::new(InMemoryTrieDB::new_empty()), config);
        trie.insert(b"k".to_vec(), b"v".to_vec()).unwrap();
        assert!(matches!(trie.commit(0), Err(TrieError::CommitsDisabled)));
    }

    #[test]
    fn many_inserts_then_commit_triggers_parallel_branch_commit() {
        let db = InMemoryTrieDB::new_empty();
        let mut trie = Trie::new(Box::new(db));
        // Enough distinct first-nibble keys to populate >= 4 branch children, each
        // with a value long enough to push its leaf encoding past the 32-byte
        // inlining threshold so the children are hash-addressed dispatch candidates.
        for i in 0u8..8 {
            trie.insert(vec![i << 4], vec![i; 40]).unwrap();
        }
        trie.commit(0).unwrap();
        for i in 0u8..8 {
            assert_eq!(trie.get(&[i << 4]).unwrap(), Some(vec![i; 40]));
        }
    }

    #[test]
    fn commit_is_idempotent() {
        let db = InMemoryTrieDB::new_empty();
        let mut trie = Trie::new(Box::new(db));
        for i in 0u8..6 {
            trie.insert(vec![i], vec![i, i]).unwrap();
        }
        trie.commit(0).unwrap();
        let root_after_first = trie.root_hash().unwrap();
        // No intervening mutation: a second commit must be a no-op that produces
        // the same root and writes nothing new (everything is already sealed).
        trie.commit(1).unwrap();
        assert_eq!(trie.root_hash().unwrap(), root_after_first);
    }

    #[test]
    fn parallel_and_sequential_commit_agree_on_root_hash() {
        // Values long enough that each leaf's own encoding clears the 32-byte
        // inlining threshold, so the branch's children are hash-addressed and
        // `dirty_child_count` actually sees them as dispatch candidates.
        let keys: Vec<Vec<u8>> = (0u8..8)
            .map(|i| {
                let mut key = vec![i << 4, i];
                key.extend(std::iter::repeat(i).take(40));
                key
            })
            .collect();

        let db_seq = InMemoryTrieDB::new_empty();
        let config_seq = TrieConfig {
            parallel_branch_threshold: usize::MAX,
            ..TrieConfig::default()
        };
        let mut trie_seq = Trie::with_config(Box::new(db_seq), config_seq);
        for key in &keys {
            trie_seq.insert(key.clone(), key.clone()).unwrap();
        }
        trie_seq.commit(0).unwrap();

        let db_par = InMemoryTrieDB::new_empty();
        let config_par = TrieConfig {
            parallel_branch_threshold: 1,
            ..TrieConfig::default()
        };
        let mut trie_par = Trie::with_config(Box::new(db_par), config_par);
        for key in &keys {
            trie_par.insert(key.clone(), key.clone()).unwrap();
        }
        trie_par.commit(0).unwrap();

        assert_eq!(trie_seq.root_hash().unwrap(), trie_par.root_hash().unwrap());
        for key in &keys {
            assert_eq!(trie_par.get(key).unwrap(), Some(key.clone()));
        }
    }

    use proptest::collection::{btree_set, vec as prop_vec};
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn proptest_insert_then_get_roundtrips(data in btree_set(prop_vec(any::<u8>(), 1..32), 1..64)) {
            let mut trie = new_temp();
            for val in data.iter() {
                trie.insert(val.clone(), val.clone()).unwrap();
            }
            for val in data.iter() {
                prop_assert_eq!(trie.get(val).unwrap(), Some(val.clone()));
            }
        }

        #[test]
        fn proptest_insertion_order_does_not_affect_root(data in btree_set(prop_vec(any::<u8>(), 1..32), 1..64)) {
            let ordered: Vec<Vec<u8>> = data.iter().cloned().collect();
            let mut reversed = ordered.clone();
            reversed.reverse();

            let mut forward = new_temp();
            for val in &ordered {
                forward.insert(val.clone(), val.clone()).unwrap();
            }
            let mut backward = new_temp();
            for val in &reversed {
                backward.insert(val.clone(), val.clone()).unwrap();
            }
            prop_assert_eq!(forward.root_hash().unwrap(), backward.root_hash().unwrap());
        }

        #[test]
        fn proptest_deleting_everything_restores_empty_hash(data in btree_set(prop_vec(any::<u8>(), 1..32), 1..64)) {
            let mut trie = new_temp();
            let empty_hash = trie.root_hash().unwrap();
            for val in data.iter() {
                trie.insert(val.clone(), val.clone()).unwrap();
            }
            for val in data.iter() {
                trie.remove(val).unwrap();
            }
            prop_assert_eq!(trie.root_hash().unwrap(), empty_hash);
        }

        #[test]
        fn proptest_commit_preserves_structural_sharing(data in btree_set(prop_vec(any::<u8>(), 1..32), 1..64)) {
            let db = InMemoryTrieDB::new_empty();
            let mut trie = Trie::new(Box::new(db.clone()));
            for val in data.iter() {
                trie.insert(val.clone(), val.clone()).unwrap();
            }
            let root = trie.root_hash().unwrap();
            trie.commit(0).unwrap();

            let reopened = Trie::open(Box::new(db), root, TrieConfig::default());
            for val in data.iter() {
                prop_assert_eq!(reopened.get(val).unwrap(), Some(val.clone()));
            }
        }
    }
}
