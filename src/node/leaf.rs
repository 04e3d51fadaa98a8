use super::{codec, BranchNode, ExtensionNode, Node};
use crate::error::TrieError;
use crate::nibbles::Nibbles;
use crate::state::TrieState;

pub type ValueRLP = Vec<u8>;

/// A node holding a value directly, reached via the remaining `partial` path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LeafNode {
    pub partial: Nibbles,
    pub value: ValueRLP,
}

impl LeafNode {
    pub fn new(partial: Nibbles, value: ValueRLP) -> Self {
        Self { partial, value }
    }

    pub fn get(&self, path: &Nibbles) -> Option<ValueRLP> {
        (path == &self.partial).then(|| self.value.clone())
    }

    /// Returns the node that should replace this leaf after inserting `value` at
    /// `path`. Either overwrites the value in place (exact match), or splits into a
    /// branch (and possibly an extension) at the first differing nibble.
    pub fn insert(
        self,
        state: &TrieState,
        path: Nibbles,
        value: ValueRLP,
    ) -> Result<Node, TrieError> {
        if path == self.partial {
            return Ok(Node::Leaf(LeafNode::new(path, value)));
        }

        let match_index = path.count_prefix(&self.partial);
        let mut choices = std::array::from_fn(|_| crate::node_hash::NodeHash::Invalid);
        let mut branch_value = ValueRLP::new();

        if self.partial.len() == match_index {
            branch_value = self.value;
        } else {
            let new_leaf = LeafNode::new(self.partial.offset(match_index + 1), self.value);
            let choice = self.partial.at(match_index);
            choices[choice as usize] = Node::Leaf(new_leaf).insert_self(state)?;
        }

        if path.len() == match_index {
            branch_value = value;
        } else {
            let new_leaf = LeafNode::new(path.offset(match_index + 1), value);
            let choice = path.at(match_index);
            choices[choice as usize] = Node::Leaf(new_leaf).insert_self(state)?;
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

    /// Returns `Some(node)` if the leaf survives removal at a different path
    /// (i.e. this leaf wasn't the target), or `None` if this leaf was consumed.
    pub fn remove(self, path: &Nibbles) -> (Option<Node>, Option<ValueRLP>) {
        if path == &self.partial {
            (None, Some(self.value))
        } else {
            (Some(Node::Leaf(self)), None)
        }
    }
}

impl LeafNode {
    pub(super) fn encode_raw(&self) -> Vec<u8> {
        let mut buf = Vec::new();
        codec::Encoder::new()
            .field(&self.partial.encode_compact())
            .field(&self.value)
            .finish(&mut buf);
        buf
    }

    pub(super) fn decode_raw(rlp: &[u8]) -> Result<Self, TrieError> {
        let mut decoder = codec::Decoder::new(rlp)?;
        let partial: Vec<u8> = decoder.field()?;
        let value: ValueRLP = decoder.field()?;
        decoder.finish()?;
        Ok(Self {
            partial: Nibbles::decode_compact(&partial)?,
            value,
        })
    }
}
