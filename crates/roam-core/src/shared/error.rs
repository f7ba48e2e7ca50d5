//! Error taxonomy for `roam-core` (spec §7).
//!
//! Per-file and per-symbol failures are never fatal — they are counted in
//! [`RunSummary`] and surfaced as a post-run summary line. Only
//! [`CoreError::StoreUnavailable`] and [`CoreError::LockContended`] abort an
//! index run.

use std::collections::HashMap;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("unreadable source: {path}: {source}")]
    UnreadableSource {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("no grammar for {path} (language {language})")]
    NoGrammar { path: String, language: String },

    #[error("parse error in {path}")]
    ParseFailure { path: String },

    #[error("extraction failed for symbol {symbol} in {path}: {reason}")]
    ExtractionFailure {
        path: String,
        symbol: String,
        reason: String,
    },

    #[error("git invocation failed: {0}")]
    GitUnavailable(String),

    #[error("index lock held by pid {pid} at {lock_path}")]
    LockContended { lock_path: String, pid: i32 },

    #[error("store unavailable: {0}")]
    StoreUnavailable(#[from] roam_store::error::StorageError),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, CoreError>;

/// Per-kind error counters accumulated across one index run (spec §7
/// "All errors are surfaced in aggregate via a post-run summary line").
#[derive(Debug, Clone, Default)]
pub struct RunSummary {
    pub counts: HashMap<&'static str, u64>,
    pub files_discovered: u64,
    pub files_indexed: u64,
    pub symbols_indexed: u64,
    pub edges_resolved: u64,
}

impl RunSummary {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, kind: &'static str) {
        *self.counts.entry(kind).or_insert(0) += 1;
    }

    pub fn record_unreadable_source(&mut self) {
        self.record("unreadable_source");
    }

    pub fn record_no_grammar(&mut self) {
        self.record("no_grammar");
    }

    pub fn record_parse_failure(&mut self) {
        self.record("parse_failure");
    }

    pub fn record_extraction_failure(&mut self) {
        self.record("extraction_failure");
    }

    pub fn record_git_unavailable(&mut self) {
        self.record("git_unavailable");
    }

    /// One-line human summary, e.g. `"indexed 42 files, 310 symbols, 128
    /// edges (3 parse_failure, 1 git_unavailable)"`.
    pub fn summary_line(&self) -> String {
        let mut parts: Vec<String> = self
            .counts
            .iter()
            .filter(|(_, &n)| n > 0)
            .map(|(kind, n)| format!("{n} {kind}"))
            .collect();
        parts.sort();
        let detail = if parts.is_empty() {
            "no errors".to_string()
        } else {
            parts.join(", ")
        };
        format!(
            "indexed {} files, {} symbols, {} edges ({detail})",
            self.files_indexed, self.symbols_indexed, self.edges_resolved
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn summary_line_lists_nonzero_counts_sorted() {
        let mut s = RunSummary::new();
        s.files_indexed = 2;
        s.record_parse_failure();
        s.record_git_unavailable();
        s.record_parse_failure();
        let line = s.summary_line();
        assert!(line.contains("2 parse_failure"));
        assert!(line.contains("1 git_unavailable"));
    }

    #[test]
    fn summary_line_reports_no_errors_when_empty() {
        let s = RunSummary::new();
        assert!(s.summary_line().contains("no errors"));
    }
}
