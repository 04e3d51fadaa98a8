use ethereum_types::H256;
use sha3::{Digest, Keccak256};

/// A reference to a child node: either its Keccak256 hash, or — when the child's own
/// RLP encoding is shorter than 32 bytes — the encoding itself, inlined in place.
///
/// This is the inlining rule from the trie's node codec: a child is only
/// hash-addressed once its encoded form is large enough that storing the hash is
/// cheaper than storing the bytes directly.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum NodeHash {
    #[default]
    Invalid,
    Hashed(H256),
    Inline(Vec<u8>),
}

impl NodeHash {
    /// Hashes `encoded`, inlining it instead when it is shorter than 32 bytes.
    pub fn from_encoded(encoded: &[u8]) -> Self {
        if encoded.len() < 32 {
            NodeHash::Inline(encoded.to_vec())
        } else {
            Self::hash_bytes(encoded)
        }
    }

    /// Hashes `encoded` unconditionally, never inlining regardless of length.
    ///
    /// Used for the trie's root node only: a root must always be hash-addressed so
    /// it can be looked up in the backing store and shared across tries by hash,
    /// even when its own encoding would otherwise be short enough to inline as a
    /// child reference.
    pub fn from_encoded_root(encoded: &[u8]) -> Self {
        Self::hash_bytes(encoded)
    }

    fn hash_bytes(bytes: &[u8]) -> Self {
        let mut hasher = Keccak256::new();
        hasher.update(bytes);
        let hash = H256::from_slice(&hasher.finalize());
        NodeHash::Hashed(hash)
    }

    /// Reconstructs a child reference from the raw bytes stored in a parent's
    /// encoding: empty means no child, exactly 32 bytes is a hash (taken verbatim,
    /// *not* rehashed), anything shorter is the child's own inlined encoding.
    pub fn from_ref_bytes(bytes: &[u8]) -> Self {
        match bytes.len() {
            0 => NodeHash::Invalid,
            32 => NodeHash::Hashed(H256::from_slice(bytes)),
            _ => NodeHash::Inline(bytes.to_vec()),
        }
    }

    pub fn is_valid(&self) -> bool {
        !matches!(self, NodeHash::Invalid)
    }

    /// The raw bytes this reference stands for when embedded in a parent's RLP list:
    /// either the 32-byte hash, or the inlined encoding verbatim.
    pub fn as_ref_bytes(&self) -> &[u8] {
        match self {
            NodeHash::Invalid => &[],
            NodeHash::Hashed(hash) => hash.as_bytes(),
            NodeHash::Inline(bytes) => bytes,
        }
    }

    /// The hash to use as a storage key. Inlined nodes are rehashed on demand since
    /// they are never written to the backing store under their own key.
    pub fn finalize(&self) -> H256 {
        match self {
            NodeHash::Invalid => H256::zero(),
            NodeHash::Hashed(hash) => *hash,
            NodeHash::Inline(bytes) => {
                let mut hasher = Keccak256::new();
                hasher.update(bytes);
                H256::from_slice(&hasher.finalize())
            }
        }
    }
}

impl From<H256> for NodeHash {
    fn from(hash: H256) -> Self {
        NodeHash::Hashed(hash)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_encoding_is_inlined() {
        let encoded = vec![1, 2, 3];
        assert!(matches!(
            NodeHash::from_encoded(&encoded),
            NodeHash::Inline(_)
        ));
    }

    #[test]
    fn long_encoding_is_hashed() {
        let encoded = vec![0u8; 40];
        assert!(matches!(
            NodeHash::from_encoded(&encoded),
            NodeHash::Hashed(_)
        ));
    }

    #[test]
    fn invalid_is_not_valid() {
        assert!(!NodeHash::Invalid.is_valid());
        assert!(NodeHash::Hashed(H256::zero()).is_valid());
    }
}
