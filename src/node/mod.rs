mod branch;
mod codec;
mod extension;
mod leaf;

pub use branch::BranchNode;
pub use extension::ExtensionNode;
pub use leaf::LeafNode;

use alloy_rlp::Header;

use crate::error::TrieError;
use crate::nibbles::Nibbles;
use crate::node_hash::NodeHash;
use crate::state::TrieState;

pub type ValueRLP = Vec<u8>;

/// Branch nodes encode as 17 RLP items (16 child refs + a terminator value); leaves
/// and extensions both encode as 2.
const BRANCH_ITEM_COUNT: usize = 17;
const LEAF_OR_EXTENSION_ITEM_COUNT: usize = 2;

/// A single node in the trie: a 16-way branch, a shared-prefix extension, or a
/// terminal leaf holding a value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    Branch(Box<BranchNode>),
    Extension(ExtensionNode),
    Leaf(LeafNode),
}

impl From<BranchNode> for Node {
    fn from(node: BranchNode) -> Self {
        Node::Branch(Box::new(node))
    }
}

impl From<ExtensionNode> for Node {
    fn from(node: ExtensionNode) -> Self {
        Node::Extension(node)
    }
}

impl From<LeafNode> for Node {
    fn from(node: LeafNode) -> Self {
        Node::Leaf(node)
    }
}

impl Node {
    pub fn get(&self, state: &TrieState, path: &Nibbles) -> Result<Option<ValueRLP>, TrieError> {
        match self {
            Node::Branch(branch) => branch.get(state, path),
            Node::Extension(extension) => extension.get(state, path),
            Node::Leaf(leaf) => Ok(leaf.get(path)),
        }
    }

    pub fn insert(
        self,
        state: &TrieState,
        path: Nibbles,
        value: ValueRLP,
    ) -> Result<Node, TrieError> {
        match self {
            Node::Branch(branch) => branch.insert(state, path, value),
            Node::Extension(extension) => extension.insert(state, path, value),
            Node::Leaf(leaf) => leaf.insert(state, path, value),
        }
    }

    pub fn remove(
        self,
        state: &TrieState,
        path: &Nibbles,
    ) -> Result<(Option<Node>, Option<ValueRLP>), TrieError> {
        match self {
            Node::Branch(branch) => branch.remove(state, path),
            Node::Extension(extension) => extension.remove(state, path),
            Node::Leaf(leaf) => Ok(leaf.remove(path)),
        }
    }

    /// Encodes this node's own fields (child slots carry only their `NodeHash`, not
    /// a recursive encoding — callers must have already hashed children bottom-up).
    pub fn encode_raw(&self) -> Vec<u8> {
        match self {
            Node::Branch(branch) => branch.encode_raw(),
            Node::Extension(extension) => extension.encode_raw(),
            Node::Leaf(leaf) => leaf.encode_raw(),
        }
    }

    pub fn decode_raw(node_type: NodeType, rlp: &[u8]) -> Result<Self, TrieError> {
        Ok(match node_type {
            NodeType::Branch => Node::Branch(Box::new(BranchNode::decode_raw(rlp)?)),
            NodeType::Extension => Node::Extension(ExtensionNode::decode_raw(rlp)?),
            NodeType::Leaf => Node::Leaf(LeafNode::decode_raw(rlp)?),
        })
    }

    pub fn node_type(&self) -> NodeType {
        match self {
            Node::Branch(_) => NodeType::Branch,
            Node::Extension(_) => NodeType::Extension,
            Node::Leaf(_) => NodeType::Leaf,
        }
    }

    /// Hashes (or inlines) this node's encoding and records it in the trie's private
    /// working set, returning the reference its parent should store.
    pub fn insert_self(self, state: &TrieState) -> Result<NodeHash, TrieError> {
        let encoded = self.encode_raw();
        let hash = NodeHash::from_encoded(&encoded);
        state.insert_node(hash.clone(), self);
        Ok(hash)
    }

    /// Like [`Node::insert_self`], but for the trie's root: the root is always
    /// hash-addressed (`resolve_hash(ctx, is_root = true)` in the spec), never
    /// inlined, regardless of how short its own encoding is. Without this, a small
    /// trie (the common case for short keys/values) would produce a root whose
    /// encoding is under 32 bytes, which would never be recorded as dirty or
    /// written to the backing store, breaking commit and structural sharing.
    pub fn insert_self_as_root(self, state: &TrieState) -> Result<NodeHash, TrieError> {
        let encoded = self.encode_raw();
        let hash = NodeHash::from_encoded_root(&encoded);
        state.insert_node(hash.clone(), self);
        Ok(hash)
    }
}

/// Discriminant persisted alongside a node's RLP body so the backing store's bytes
/// can be decoded back into the right variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeType {
    Branch = 0,
    Extension = 1,
    Leaf = 2,
}

impl NodeType {
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(Self::Branch),
            1 => Some(Self::Extension),
            2 => Some(Self::Leaf),
            _ => None,
        }
    }
}

/// Encodes a full node (discriminant byte + body) for storage in the backing store.
pub fn encode_node(node: &Node) -> Vec<u8> {
    let mut buf = vec![node.node_type() as u8];
    buf.extend(node.encode_raw());
    buf
}

/// Inverse of [`encode_node`].
pub fn decode_node(bytes: &[u8]) -> Result<Node, TrieError> {
    let (discriminant, rest) = bytes.split_first().ok_or(TrieError::MalformedNode)?;
    let node_type = NodeType::from_u8(*discriminant).ok_or(TrieError::MalformedNode)?;
    Node::decode_raw(node_type, rest)
}

/// Decodes a node's bare RLP body — i.e. [`Node::encode_raw`]'s output, with no
/// leading [`NodeType`] discriminant. This is the form a `NodeHash::Inline` child
/// reference carries (see `NodeHash::from_encoded`/`as_ref_bytes`), so it cannot be
/// told apart by a stored discriminant byte the way [`decode_node`]'s input can.
/// Instead it follows spec §4.2: "Decode recognizes node variant by arity (2 vs 17)
/// and by the flag bit of its first item's hex-prefix."
pub fn decode_raw_node(rlp: &[u8]) -> Result<Node, TrieError> {
    match rlp_item_count(rlp)? {
        BRANCH_ITEM_COUNT => Ok(Node::Branch(Box::new(BranchNode::decode_raw(rlp)?))),
        LEAF_OR_EXTENSION_ITEM_COUNT => {
            let mut decoder = codec::Decoder::new(rlp)?;
            let first: Vec<u8> = decoder.field()?;
            let is_leaf = first.first().is_some_and(|flag| flag & 0x20 != 0);
            if is_leaf {
                Ok(Node::Leaf(LeafNode::decode_raw(rlp)?))
            } else {
                Ok(Node::Extension(ExtensionNode::decode_raw(rlp)?))
            }
        }
        _ => Err(TrieError::MalformedNode),
    }
}

/// Counts the top-level items in an RLP list without decoding their contents —
/// every field of every node variant (child refs, values, hex-prefix paths) is
/// itself an RLP byte string, so counting items this way is type-agnostic.
fn rlp_item_count(rlp: &[u8]) -> Result<usize, TrieError> {
    let mut buf = rlp;
    let header = Header::decode(&mut buf)?;
    if !header.list {
        return Err(TrieError::MalformedNode);
    }
    let mut count = 0usize;
    while !buf.is_empty() {
        let item_header = Header::decode(&mut buf)?;
        buf = &buf[item_header.payload_length..];
        count += 1;
    }
    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::InMemoryTrieDB;

    fn state() -> TrieState {
        TrieState::new(Box::new(InMemoryTrieDB::new_empty()))
    }

    #[test]
    fn leaf_roundtrips_through_encode_node() {
        let leaf = Node::Leaf(LeafNode::new(Nibbles::from_bytes(b"k"), b"v".to_vec()));
        let encoded = encode_node(&leaf);
        let decoded = decode_node(&encoded).unwrap();
        assert_eq!(leaf, decoded);
    }

    #[test]
    fn insert_self_is_retrievable_from_state() {
        let state = state();
        let leaf = Node::Leaf(LeafNode::new(Nibbles::from_bytes(b"k"), b"v".to_vec()));
        let hash = leaf.clone().insert_self(&state).unwrap();
        let fetched = state.get_node(&hash).unwrap();
        assert_eq!(fetched, Some(leaf));
    }

    #[test]
    fn extension_roundtrips_through_encode_node() {
        let ext = Node::Extension(ExtensionNode::new(
            Nibbles::from_hex(vec![1, 2, 3]),
            crate::node_hash::NodeHash::Hashed(ethereum_types::H256::repeat_byte(7)),
        ));
        let encoded = encode_node(&ext);
        let decoded = decode_node(&encoded).unwrap();
        assert_eq!(ext, decoded);
    }

    #[test]
    fn branch_roundtrips_through_encode_node() {
        let mut choices = std::array::from_fn(|_| crate::node_hash::NodeHash::Invalid);
        choices[3] = crate::node_hash::NodeHash::Inline(vec![1, 2, 3]);
        choices[9] = crate::node_hash::NodeHash::Hashed(ethereum_types::H256::repeat_byte(1));
        let branch = Node::Branch(Box::new(BranchNode::new(choices, b"terminator".to_vec())));
        let encoded = encode_node(&branch);
        let decoded = decode_node(&encoded).unwrap();
        assert_eq!(branch, decoded);
    }

    #[test]
    fn hash_of_encoding_is_deterministic() {
        let leaf = Node::Leaf(LeafNode::new(Nibbles::from_bytes(b"k"), b"v".to_vec()));
        let a = crate::node_hash::NodeHash::from_encoded(&leaf.encode_raw());
        let b = crate::node_hash::NodeHash::from_encoded(&leaf.encode_raw());
        assert_eq!(a, b);
    }

    #[test]
    fn short_node_encoding_is_inlined_not_hashed() {
        // A leaf with a tiny value encodes to well under 32 bytes and must be
        // inlined in its parent's child reference rather than hash-addressed.
        let leaf = Node::Leaf(LeafNode::new(Nibbles::from_bytes(b"k"), b"v".to_vec()));
        let encoded = leaf.encode_raw();
        assert!(encoded.len() < 32);
        assert!(matches!(
            crate::node_hash::NodeHash::from_encoded(&encoded),
            crate::node_hash::NodeHash::Inline(_)
        ));
    }

    #[test]
    fn long_node_encoding_is_hashed_not_inlined() {
        let leaf = Node::Leaf(LeafNode::new(
            Nibbles::from_bytes(b"a long enough key to push the encoding over 32 bytes"),
            b"a long enough value too".to_vec(),
        ));
        let encoded = leaf.encode_raw();
        assert!(encoded.len() >= 32);
        assert!(matches!(
            crate::node_hash::NodeHash::from_encoded(&encoded),
            crate::node_hash::NodeHash::Hashed(_)
        ));
    }
}
