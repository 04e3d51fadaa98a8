use crate::error::TrieError;
use crate::nibbles::Nibbles;
use crate::node::{BranchNode, ExtensionNode, LeafNode, Node};
use crate::node_hash::NodeHash;
use crate::state::TrieState;

/// Callbacks driven by a depth-first walk of the trie. A missing node (hash present
/// but absent from the backing store, e.g. a pruned ancestor) is reported through
/// `visit_missing_node` rather than aborting the walk — callers that need strict
/// completeness can track that in their own visitor state and fail afterwards.
pub trait Visitor {
    /// Called once, before the walk descends into the root. `expect_accounts`
    /// carries through the hint passed to [`accept`]: an accounts-aware consumer
    /// uses it to decide whether to interpret leaf values as account RLPs.
    fn visit_tree(&mut self, root: &NodeHash, expect_accounts: bool) {
        let _ = (root, expect_accounts);
    }

    /// Called before descending into a branch's children. Return `false` to skip
    /// descending into this branch's subtree.
    fn visit_branch(&mut self, path: &Nibbles, node: &BranchNode) -> bool {
        let _ = (path, node);
        true
    }

    /// Called before descending into an extension's child. Return `false` to skip.
    fn visit_extension(&mut self, path: &Nibbles, node: &ExtensionNode) -> bool {
        let _ = (path, node);
        true
    }

    fn visit_leaf(&mut self, path: &Nibbles, node: &LeafNode) {
        let _ = (path, node);
    }

    /// Called for every leaf in addition to `visit_leaf` when the walk was started
    /// with `expect_accounts = true`. An accounts-aware consumer overrides this to
    /// interpret `value` as an account RLP; the default is a no-op so a generic
    /// consumer can ignore the hint entirely.
    fn visit_account(&mut self, path: &Nibbles, value: &[u8]) {
        let _ = (path, value);
    }

    fn visit_missing_node(&mut self, path: &Nibbles, hash: &NodeHash) {
        let _ = (path, hash);
    }
}

/// Walks the subtree rooted at `root`, invoking `visitor`'s callbacks in depth-first
/// order; a branch's children are visited in ascending nibble order (0..15). `root`
/// may name a historical root different from any trie's live root — in that case it
/// is resolved lazily from `state` just like any other hash reference, rather than
/// requiring the caller to have it loaded already.
pub fn accept(
    state: &TrieState,
    root: &NodeHash,
    expect_accounts: bool,
    visitor: &mut dyn Visitor,
) -> Result<(), TrieError> {
    visitor.visit_tree(root, expect_accounts);
    visit_node(state, root, Nibbles::from_hex(Vec::new()), expect_accounts, visitor)
}

fn visit_node(
    state: &TrieState,
    hash: &NodeHash,
    path: Nibbles,
    expect_accounts: bool,
    visitor: &mut dyn Visitor,
) -> Result<(), TrieError> {
    if !hash.is_valid() {
        return Ok(());
    }
    let node = match state.get_node(hash)? {
        Some(node) => node,
        None => {
            visitor.visit_missing_node(&path, hash);
            return Ok(());
        }
    };
    match node {
        Node::Branch(branch) => {
            if visitor.visit_branch(&path, &branch) {
                for (choice, child) in branch.choices.iter().enumerate() {
                    if child.is_valid() {
                        visit_node(
                            state,
                            child,
                            path.append_new(choice as u8),
                            expect_accounts,
                            visitor,
                        )?;
                    }
                }
            }
        }
        Node::Extension(extension) => {
            if visitor.visit_extension(&path, &extension) {
                let mut child_path = path.clone();
                child_path.extend(&extension.prefix);
                visit_node(state, &extension.child, child_path, expect_accounts, visitor)?;
            }
        }
        Node::Leaf(leaf) => {
            let mut leaf_path = path;
            leaf_path.extend(&leaf.partial);
            visitor.visit_leaf(&leaf_path, &leaf);
            if expect_accounts {
                visitor.visit_account(&leaf_path, &leaf.value);
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::InMemoryTrieDB;
    use crate::Trie;

    #[derive(Default)]
    struct Collector {
        leaves: Vec<(Vec<u8>, Vec<u8>)>,
        missing: usize,
    }

    impl Visitor for Collector {
        fn visit_leaf(&mut self, path: &Nibbles, node: &LeafNode) {
            self.leaves.push((path.to_bytes(), node.value.clone()));
        }

        fn visit_missing_node(&mut self, _path: &Nibbles, _hash: &NodeHash) {
            self.missing += 1;
        }
    }

    #[test]
    fn visits_every_leaf() {
        let mut trie = Trie::new(Box::new(InMemoryTrieDB::new_empty()));
        trie.insert(b"a".to_vec(), b"1".to_vec()).unwrap();
        trie.insert(b"b".to_vec(), b"2".to_vec()).unwrap();
        let root = trie.root_hash().unwrap();
        let mut collector = Collector::default();
        let root_ref = if root == *crate::EMPTY_TRIE_HASH {
            NodeHash::Invalid
        } else {
            NodeHash::Hashed(root)
        };
        accept(trie.state(), &root_ref, false, &mut collector).unwrap();
        assert_eq!(collector.leaves.len(), 2);
        assert_eq!(collector.missing, 0);
    }

    #[test]
    fn expect_accounts_hint_drives_visit_account() {
        let mut trie = Trie::new(Box::new(InMemoryTrieDB::new_empty()));
        trie.insert(b"acct".to_vec(), b"rlp-account".to_vec())
            .unwrap();
        let root = trie.root_hash().unwrap();
        let root_ref = NodeHash::Hashed(root);

        #[derive(Default)]
        struct AccountCollector {
            tree_visits: usize,
            accounts: Vec<Vec<u8>>,
        }
        impl Visitor for AccountCollector {
            fn visit_tree(&mut self, _root: &NodeHash, expect_accounts: bool) {
                assert!(expect_accounts);
                self.tree_visits += 1;
            }
            fn visit_account(&mut self, _path: &Nibbles, value: &[u8]) {
                self.accounts.push(value.to_vec());
            }
        }

        let mut collector = AccountCollector::default();
        accept(trie.state(), &root_ref, true, &mut collector).unwrap();
        assert_eq!(collector.tree_visits, 1);
        assert_eq!(collector.accounts, vec![b"rlp-account".to_vec()]);
    }
}
