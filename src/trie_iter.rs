use std::cmp::Ordering;

use crate::error::TrieError;
use crate::nibbles::Nibbles;
use crate::node::Node;
use crate::node_hash::NodeHash;
use crate::state::TrieState;

pub type PathRLP = Vec<u8>;
pub type ValueRLP = Vec<u8>;

/// A resumable depth-first traversal over every `(path, node)` pair in a trie,
/// used for dumping/debugging rather than the tolerant, callback-driven visitor
/// framework in `visitor.rs`. Children of a branch are stacked in reverse order so
/// they pop — and so get visited — in ascending nibble order.
pub struct TrieIter<'a> {
    state: &'a TrieState,
    stack: Vec<(Nibbles, NodeHash)>,
}

impl<'a> TrieIter<'a> {
    pub fn new(state: &'a TrieState, root: NodeHash) -> Self {
        let mut stack = Vec::new();
        if root.is_valid() {
            stack.push((Nibbles::from_hex(Vec::new()), root));
        }
        Self { state, stack }
    }

    /// Positions the iterator so the next `next()` call returns the first leaf with
    /// a path greater than or equal to `key`, without re-visiting left siblings.
    pub fn advance(&mut self, key: &[u8]) -> Result<(), TrieError> {
        let Some((root_path, root_hash)) = self.stack.pop() else {
            return Ok(());
        };

        let mut hash = root_hash;
        let mut prefix = root_path;
        let mut target = Nibbles::from_bytes(key);

        loop {
            if target.is_empty() || target.at(0) == 16 || !hash.is_valid() {
                break;
            }
            let Some(node) = self.state.get_node(&hash)? else {
                self.stack.clear();
                break;
            };
            match node {
                Node::Branch(branch) => {
                    let Some(choice) = target.next_choice() else {
                        self.stack.clear();
                        break;
                    };
                    for i in (choice + 1..16).rev() {
                        let child = &branch.choices[i];
                        if child.is_valid() {
                            self.stack.push((prefix.append_new(i as u8), child.clone()));
                        }
                    }
                    hash = branch.choices[choice].clone();
                    prefix = prefix.append_new(choice as u8);
                    target = target.offset(1);
                }
                Node::Extension(extension) => {
                    match target.compare_prefix(&extension.prefix) {
                        Ordering::Greater => break,
                        Ordering::Less => {
                            self.stack.push((prefix.clone(), hash));
                            break;
                        }
                        Ordering::Equal => {
                            target = target.offset(extension.prefix.len());
                            prefix.extend(&extension.prefix);
                            hash = extension.child;
                        }
                    }
                }
                Node::Leaf(leaf) => {
                    if target.compare_prefix(&leaf.partial) != Ordering::Greater {
                        self.stack.push((prefix.clone(), hash));
                    }
                    break;
                }
            }
        }

        Ok(())
    }

    pub fn content(self) -> impl Iterator<Item = (PathRLP, ValueRLP)> + 'a {
        self.filter_map(|(path, node)| match node {
            Node::Branch(branch) => {
                (!branch.value.is_empty()).then_some((path.to_bytes(), branch.value))
            }
            Node::Extension(_) => None,
            Node::Leaf(leaf) => Some((path.to_bytes(), leaf.value)),
        })
    }
}

impl<'a> Iterator for TrieIter<'a> {
    type Item = (Nibbles, Node);

    fn next(&mut self) -> Option<Self::Item> {
        let (mut path, hash) = self.stack.pop()?;
        let node = self.state.get_node(&hash).ok().flatten()?;
        match &node {
            Node::Branch(branch) => {
                for (choice, child) in branch.choices.iter().enumerate().rev() {
                    if child.is_valid() {
                        self.stack.push((path.append_new(choice as u8), child.clone()));
                    }
                }
            }
            Node::Extension(extension) => {
                path.extend(&extension.prefix);
                self.stack.push((path.clone(), extension.child.clone()));
            }
            Node::Leaf(leaf) => {
                path.extend(&leaf.partial);
            }
        }
        Some((path, node))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::InMemoryTrieDB;
    use crate::Trie;

    #[test]
    fn content_yields_every_pair_in_order() {
        let mut trie = Trie::new(Box::new(InMemoryTrieDB::new_empty()));
        trie.insert(vec![0, 9], vec![3, 4]).unwrap();
        trie.insert(vec![1, 2], vec![5, 6]).unwrap();
        trie.insert(vec![2, 7], vec![7, 8]).unwrap();
        let root = NodeHash::Hashed(trie.root_hash().unwrap());
        let content = TrieIter::new(trie.state(), root).content().collect::<Vec<_>>();
        assert_eq!(
            content,
            vec![(vec![0, 9], vec![3, 4]), (vec![1, 2], vec![5, 6]), (vec![2, 7], vec![7, 8])]
        );
    }

    #[test]
    fn advance_skips_leaves_before_key() {
        let mut trie = Trie::new(Box::new(InMemoryTrieDB::new_empty()));
        trie.insert(vec![0, 9], vec![3, 4]).unwrap();
        trie.insert(vec![1, 2], vec![5, 6]).unwrap();
        trie.insert(vec![2, 7], vec![7, 8]).unwrap();
        let root = NodeHash::Hashed(trie.root_hash().unwrap());
        let mut iter = TrieIter::new(trie.state(), root);
        iter.advance(&[1, 2]).unwrap();
        let content = iter.content().collect::<Vec<_>>();
        assert_eq!(content, vec![(vec![1, 2], vec![5, 6]), (vec![2, 7], vec![7, 8])]);
    }
}
