use super::{codec, ExtensionNode, LeafNode, Node};
use crate::error::TrieError;
use crate::nibbles::Nibbles;
use crate::node_hash::NodeHash;
use crate::state::TrieState;

pub type ValueRLP = Vec<u8>;

/// A 16-way fan-out node, one slot per nibble value, plus an optional value for
/// paths that terminate exactly at this node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BranchNode {
    pub choices: [NodeHash; 16],
    pub value: ValueRLP,
}

impl BranchNode {
    pub fn new(choices: [NodeHash; 16], value: ValueRLP) -> Self {
        Self { choices, value }
    }

    pub fn empty() -> Self {
        Self::new(std::array::from_fn(|_| NodeHash::Invalid), ValueRLP::new())
    }

    pub fn get(&self, state: &TrieState, path: &Nibbles) -> Result<Option<ValueRLP>, TrieError> {
        match path.next_choice() {
            None => Ok((!self.value.is_empty()).then(|| self.value.clone())),
            Some(choice) => {
                let child_hash = &self.choices[choice];
                if !child_hash.is_valid() {
                    return Ok(None);
                }
                let Some(child) = state.get_node(child_hash)? else {
                    return Ok(None);
                };
                child.get(state, &path.offset(1))
            }
        }
    }

    pub fn insert(
        mut self,
        state: &TrieState,
        path: Nibbles,
        value: ValueRLP,
    ) -> Result<Node, TrieError> {
        match path.next_choice() {
            None => {
                self.value = value;
            }
            Some(choice) => {
                let child_hash = &self.choices[choice];
                let new_child = if child_hash.is_valid() {
                    let child = state
                        .get_node(child_hash)?
                        .ok_or_else(|| TrieError::NodeMissing(child_hash.finalize()))?;
                    child.insert(state, path.offset(1), value)?
                } else {
                    Node::Leaf(LeafNode::new(path.offset(1), value))
                };
                self.choices[choice] = new_child.insert_self(state)?;
            }
        }
        Ok(Node::Branch(Box::new(self)))
    }

    pub fn remove(
        mut self,
        state: &TrieState,
        path: &Nibbles,
    ) -> Result<(Option<Node>, Option<ValueRLP>), TrieError> {
        let removed = match path.next_choice() {
            None => {
                let removed = (!self.value.is_empty()).then(|| self.value.clone());
                self.value = ValueRLP::new();
                removed
            }
            Some(choice) => {
                let child_hash = self.choices[choice].clone();
                if !child_hash.is_valid() {
                    return Ok((Some(Node::Branch(Box::new(self))), None));
                }
                let Some(child) = state.get_node(&child_hash)? else {
                    return Ok((Some(Node::Branch(Box::new(self))), None));
                };
                let (new_child, removed) = child.remove(state, &path.offset(1))?;
                self.choices[choice] = match new_child {
                    Some(node) => node.insert_self(state)?,
                    None => NodeHash::Invalid,
                };
                removed
            }
        };

        Ok((self.collapse(state)?, removed))
    }

    /// After a removal a branch with a single remaining child and no value, or a
    /// value and no children, is no longer the minimal encoding for its subtree and
    /// must collapse into a leaf or extension.
    fn collapse(self, state: &TrieState) -> Result<Option<Node>, TrieError> {
        let live: Vec<usize> = self
            .choices
            .iter()
            .enumerate()
            .filter(|(_, hash)| hash.is_valid())
            .map(|(i, _)| i)
            .collect();

        if live.is_empty() {
            return Ok(if self.value.is_empty() {
                None
            } else {
                Some(Node::Leaf(LeafNode::new(
                    Nibbles::from_hex(vec![16]),
                    self.value,
                )))
            });
        }

        if live.len() == 1 && self.value.is_empty() {
            let choice = live[0];
            let child_hash = self.choices[choice].clone();
            let child = state
                .get_node(&child_hash)?
                .ok_or_else(|| TrieError::NodeMissing(child_hash.finalize()))?;
            let merged = match child {
                Node::Leaf(leaf) => Node::Leaf(LeafNode::new(
                    leaf.partial.prepend(&Nibbles::from_hex(vec![choice as u8])),
                    leaf.value,
                )),
                Node::Extension(ext) => Node::Extension(ExtensionNode::new(
                    ext.prefix.prepend(&Nibbles::from_hex(vec![choice as u8])),
                    ext.child,
                )),
                Node::Branch(_) => Node::Extension(ExtensionNode::new(
                    Nibbles::from_hex(vec![choice as u8]),
                    child_hash,
                )),
            };
            return Ok(Some(merged));
        }

        Ok(Some(Node::Branch(Box::new(self))))
    }
}

impl BranchNode {
    pub(super) fn encode_raw(&self) -> Vec<u8> {
        let mut buf = Vec::new();
        let mut encoder = codec::Encoder::new();
        for choice in &self.choices {
            encoder = encoder.field(&choice.as_ref_bytes().to_vec());
        }
        encoder.field(&self.value).finish(&mut buf);
        buf
    }

    pub(super) fn decode_raw(rlp: &[u8]) -> Result<Self, TrieError> {
        let mut decoder = codec::Decoder::new(rlp)?;
        let mut choices: [NodeHash; 16] = std::array::from_fn(|_| NodeHash::Invalid);
        for choice in choices.iter_mut() {
            let bytes: Vec<u8> = decoder.field()?;
            *choice = NodeHash::from_ref_bytes(&bytes);
        }
        let value: ValueRLP = decoder.field()?;
        decoder.finish()?;
        Ok(Self { choices, value })
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
    fn get_own_value_on_terminator() {
        let branch = BranchNode::new(std::array::from_fn(|_| NodeHash::Invalid), b"v".to_vec());
        let state = state();
        assert_eq!(
            branch.get(&state, &Nibbles::from_hex(vec![16])).unwrap(),
            Some(b"v".to_vec())
        );
    }

    #[test]
    fn insert_new_child_sets_choice() {
        let state = state();
        let branch = BranchNode::empty();
        let node = branch
            .insert(&state, Nibbles::from_hex(vec![3, 16]), b"v".to_vec())
            .unwrap();
        match node {
            Node::Branch(b) => assert!(b.choices[3].is_valid()),
            _ => panic!("expected branch"),
        }
    }
}
