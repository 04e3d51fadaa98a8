use alloy_rlp::Error as RlpError;
use ethereum_types::H256;
use thiserror::Error;

/// Errors produced by the trie engine.
#[derive(Debug, Error)]
pub enum TrieError {
    #[error("failed to decode node: {0}")]
    RlpDecode(#[from] RlpError),
    #[error("malformed node encoding")]
    MalformedNode,
    #[error("malformed nibble path")]
    MalformedPath,
    #[error("node {0:?} referenced by the trie is missing from the backing store")]
    NodeMissing(H256),
    #[error("intermediate node {0:?} not found while looking for node {1:?}")]
    IntermediateNodeNotFound(H256, H256),
    #[error("root node {0:?} not found")]
    RootNotFound(H256),
    #[error("commits are disabled for this trie")]
    CommitsDisabled,
    #[error("concurrent mutation of the same trie root is not allowed")]
    ConcurrentMutation,
    #[error("reference count underflow while evicting a cached node")]
    RefCountUnderflow,
    #[error("attempted to mutate a sealed node without copying it first")]
    SealedMutation,
    #[error("internal invariant violated: {0}")]
    InvariantViolation(String),
    #[error("{} parallel branch commit(s) failed", .0.len())]
    AggregatedCommitError(Vec<TrieError>),
    #[error("path not found while deleting and strict deletes are enabled")]
    MissingForDelete,
    #[error("trie verification failed: {0}")]
    Verify(String),
    #[error("lock on trie state was poisoned")]
    LockError,
    #[error("backing store error: {0}")]
    DbError(#[from] anyhow::Error),
    #[error("invalid input")]
    InvalidInput,
}
