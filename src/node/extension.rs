use super::{codec, BranchNode, LeafNode, Node};
use crate::error::TrieError;
use crate::nibbles::Nibbles;
use crate::node_hash::NodeHash;
use crate::state::TrieState;
use std::cmp::Ordering;

pub type ValueRLP = Vec<u8>;

/// A node sharing a common path prefix with a single child, avoiding a chain of
/// single-choice branches.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtensionNode {
    pub prefix: Nibbles,
    pub child: NodeHash,
}

impl ExtensionNode {
    pub fn new(prefix: Nibbles, child: NodeHash) -> Self {
        Self { prefix, child }
    }

    pub fn get(&self, state: &TrieState, path: &Nibbles) -> Result<Option<ValueRLP>, TrieError> {
        if path.compare_prefix(&self.prefix) != Ordering::Equal {
            return Ok(None);
        }
        let Some(child) = state.get_node(&self.child)? else {
            return Ok(None);
        };
        child.get(state, &path.offset(self.prefix.len()))
    }

    pub fn insert(
        self,
        state: &TrieState,
        path: Nibbles,
        value: ValueRLP,
    ) -> Result<Node, TrieError> {
        let match_index = path.count_prefix(&self.prefix);

        if match_index == self.prefix.len() {
            let child = state
                .get_node(&self.child)?
                .ok_or_else(|| TrieError::NodeMissing(self.child.finalize()))?;
            let new_child = child.insert(state, path.offset(match_index), value)?;
            let new_child_hash = new_child.insert_self(state)?;
            return Ok(Node::Extension(ExtensionNode::new(
                self.prefix,
                new_child_hash,
            )));
        }

        // The new path diverges partway through the extension's prefix: split into
        // (optionally) a shorter extension, a branch, and the remaining tail.
        let mut choices = std::array::from_fn(|_| NodeHash::Invalid);
        let mut branch_value = ValueRLP::new();

        if self.prefix.len() == match_index + 1 {
            choices[self.prefix.at(match_index) as usize] = self.child;
        } else {
            let extension = ExtensionNode::new(self.prefix.offset(match_index + 1), self.child);
            let hash = Node::Extension(extension).insert_self(state)?;
            choices[self.prefix.at(match_index) as usize] = hash;
        }

        if path.len() == match_index {
            branch_value = value;
        } else {
            let leaf = LeafNode::new(path.offset(match_index + 1), value);
            let choice = path.at(match_index);
            choices[choice as usize] = Node::Leaf(leaf).insert_self(state)?;
        }

        let branch = BranchNode::new(choices, branch_value);
        if match_index == 0 {
            return Ok(Node::Branch(Box::new(branch)));
        }

        let branch_hash = Node::Branch(Box::new(branch)).insert_self(state)?;
        Ok(Node::Extension(ExtensionNode::new(
            path.slice(0, match_index),
            branch_hash,
        )))
    }

    pub fn remove(
        self,
        state: &TrieState,
        path: &Nibbles,
    ) -> Result<(Option<Node>, Option<ValueRLP>), TrieError> {
        if path.compare_prefix(&self.prefix) != Ordering::Equal {
            return Ok((Some(Node::Extension(self)), None));
        }
        let Some(child) = state.get_node(&self.child)? else {
            return Ok((Some(Node::Extension(self)), None));
        };
        let (new_child, removed) = child.remove(state, &path.offset(self.prefix.len()))?;
        let Some(new_child) = new_child else {
            return Ok((None, removed));
        };

        // Re-merge with the child when it collapsed into something that can absorb
        // this extension's prefix, keeping the trie minimal after a deletion.
        let merged = match new_child {
            Node::Extension(child_ext) => {
                Node::Extension(ExtensionNode::new(self.prefix.concat(child_ext.prefix), child_ext.child))
            }
            Node::Leaf(child_leaf) => {
                Node::Leaf(LeafNode::new(self.prefix.concat(child_leaf.partial), child_leaf.value))
            }
            branch @ Node::Branch(_) => {
                let child_hash = branch.insert_self(state)?;
                Node::Extension(ExtensionNode::new(self.prefix, child_hash))
            }
        };
        Ok((Some(merged), removed))
    }
}

impl ExtensionNode {
    pub(super) fn encode_raw(&self) -> Vec<u8> {
        let mut buf = Vec::new();
        codec::Encoder::new()
            .field(&self.prefix.encode_compact())
            .field(&self.child.as_ref_bytes().to_vec())
            .finish(&mut buf);
        buf
    }

    pub(super) fn decode_raw(rlp: &[u8]) -> Result<Self, TrieError> {
        let mut decoder = codec::Decoder::new(rlp)?;
        let prefix: Vec<u8> = decoder.field()?;
        let child: Vec<u8> = decoder.field()?;
        decoder.finish()?;
        Ok(Self {
            prefix: Nibbles::decode_compact(&prefix)?,
            child: NodeHash::from_ref_bytes(&child),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::InMemoryTrieDB;

    fn state() -> TrieState {
        TrieState::new(Box::new(InMemoryTrieDB::new_empty()))
    }

    #[test]
    fn get_returns_none_on_prefix_mismatch() {
        let state = state();
        let ext = ExtensionNode::new(Nibbles::from_hex(vec![1, 2]), NodeHash::Invalid);
        let result = ext.get(&state, &Nibbles::from_hex(vec![9, 9])).unwrap();
        assert_eq!(result, None);
    }
}
