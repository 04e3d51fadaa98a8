use serde::{Deserialize, Serialize};

/// The tunables an embedder is allowed to set for a trie: how much memory the
/// shared node cache may use, the dirty-child threshold above which a commit's
/// branch children are dispatched to the thread pool, and whether commits are
/// permitted at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrieConfig {
    pub cache_memory_budget_bytes: usize,
    /// Minimum number of dirty children a branch must have at the root for its
    /// commit work to be dispatched across the thread pool instead of run inline.
    pub parallel_branch_threshold: usize,
    pub allow_commits: bool,
}

impl Default for TrieConfig {
    fn default() -> Self {
        Self {
            cache_memory_budget_bytes: 64 * 1024 * 1024,
            parallel_branch_threshold: 4,
            allow_commits: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_allows_commits() {
        let config = TrieConfig::default();
        assert!(config.allow_commits);
        assert_eq!(config.parallel_branch_threshold, 4);
    }
}
