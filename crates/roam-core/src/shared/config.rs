//! Engine-level configuration (spec §6 "Environment variables and flags
//! affecting the core"; SPEC_FULL.md §2 `IndexConfig`).
//!
//! The CLI layer (out of scope) populates this struct from flags/files;
//! `roam-core` never parses argv itself.

use std::path::PathBuf;

/// One workspace repo descriptor (spec §6 "Workspace configuration
/// contract"): `alias` is non-empty and contains no `/`.
#[derive(Debug, Clone)]
pub struct RepoDescriptor {
    pub alias: String,
    pub root: PathBuf,
}

impl RepoDescriptor {
    pub fn new(alias: impl Into<String>, root: impl Into<PathBuf>) -> Self {
        Self {
            alias: alias.into(),
            root: root.into(),
        }
    }

    pub fn is_valid(&self) -> bool {
        !self.alias.is_empty() && !self.alias.contains('/')
    }
}

/// Engine-level knobs for one indexing run.
#[derive(Debug, Clone)]
pub struct IndexConfig {
    /// `--force`: truncate content tables and re-index from scratch.
    pub force: bool,
    /// `--verbose`: log warnings as well as info-level stage boundaries.
    pub verbose: bool,
    /// Bounded worker pool size for parallel parse+extract (spec §5).
    /// `None` lets rayon pick (defaults to logical core count).
    pub worker_threads: Option<usize>,
    /// Git miner commit cap (spec §4.8 "≤5000 most-recent commits").
    pub git_commit_limit: usize,
    /// `git log` timeout, seconds (spec §5: 120s).
    pub git_log_timeout_secs: u64,
    /// `git ls-files` timeout, seconds (spec §5: 30s).
    pub git_ls_files_timeout_secs: u64,
    /// Max file size kept by discovery, bytes (spec §4.1: 1 MB).
    pub max_file_size_bytes: u64,
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            force: false,
            verbose: false,
            worker_threads: None,
            git_commit_limit: 5000,
            git_log_timeout_secs: 120,
            git_ls_files_timeout_secs: 30,
            max_file_size_bytes: 1024 * 1024,
        }
    }
}

impl IndexConfig {
    pub fn forced() -> Self {
        Self {
            force: true,
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repo_descriptor_rejects_alias_with_slash() {
        assert!(!RepoDescriptor::new("a/b", "/tmp").is_valid());
        assert!(RepoDescriptor::new("alpha", "/tmp").is_valid());
    }

    #[test]
    fn default_config_matches_spec_defaults() {
        let cfg = IndexConfig::default();
        assert!(!cfg.force);
        assert_eq!(cfg.git_commit_limit, 5000);
        assert_eq!(cfg.max_file_size_bytes, 1024 * 1024);
    }
}
