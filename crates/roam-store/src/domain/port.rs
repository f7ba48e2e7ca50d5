//! The `CodeIndexStore` port trait (spec §4.6).
//!
//! A single-writer-many-readers abstraction over the relational store.
//! `roam-core`'s indexing pipeline is the sole writer within a process;
//! read-only consumers (out of scope for this crate) open the same SQLite
//! file in read-only/WAL mode and call the read methods only.

use crate::domain::*;
use crate::error::Result;

/// Change classification produced by the change detector (spec §4.2),
/// re-exported here because the store is what the detector diffs against.
#[derive(Debug, Clone, Default)]
pub struct FileChangeSet {
    pub added: Vec<String>,
    pub modified: Vec<String>,
    pub removed: Vec<String>,
    pub unchanged: Vec<String>,
}

/// The relational store port. One implementation ships in this crate
/// (`infrastructure::sqlite::SqliteStore`); the trait exists so `roam-core`
/// depends on behavior, not on `rusqlite` directly.
pub trait CodeIndexStore {
    // -- files --------------------------------------------------------
    fn insert_file(&mut self, file: &NewFile) -> Result<i64>;
    /// Cascades to symbols → edges/metrics for that file (spec §4.6).
    fn delete_file_by_path(&mut self, path: &str) -> Result<()>;
    fn all_files(&self) -> Result<Vec<FileRecord>>;
    fn file_by_path(&self, path: &str) -> Result<Option<FileRecord>>;

    // -- symbols --------------------------------------------------------
    /// Inserts a batch of symbols belonging to one file inside a single
    /// transaction, resolving `parent_name` to a sibling symbol id.
    /// Returns assigned ids in input order.
    fn insert_symbols(&mut self, symbols: &[NewSymbol]) -> Result<Vec<i64>>;
    fn symbols_by_file(&self, file_id: i64) -> Result<Vec<SymbolRecord>>;
    fn all_symbols(&self) -> Result<Vec<SymbolRecord>>;
    /// Batched `name IN (...)` lookup, chunked per spec §4.6.
    fn symbols_by_names(&self, names: &[String]) -> Result<Vec<SymbolRecord>>;

    // -- edges --------------------------------------------------------
    /// Replaces the entire edges table (analytics are recomputed from
    /// scratch each run, spec §9 "Stop-the-world analytics").
    fn replace_edges(&mut self, edges: &[EdgeRecord]) -> Result<usize>;
    fn all_edges(&self) -> Result<Vec<EdgeRecord>>;
    fn replace_file_edges(&mut self, edges: &[FileEdgeRecord]) -> Result<usize>;
    fn all_file_edges(&self) -> Result<Vec<FileEdgeRecord>>;

    // -- derived metrics --------------------------------------------------------
    fn replace_symbol_metrics(&mut self, rows: &[SymbolMetricRecord]) -> Result<()>;
    fn all_symbol_metrics(&self) -> Result<Vec<SymbolMetricRecord>>;
    fn replace_complexity(&mut self, rows: &[ComplexityRecord]) -> Result<()>;
    fn all_complexity(&self) -> Result<Vec<ComplexityRecord>>;
    fn replace_clusters(&mut self, rows: &[ClusterAssignment]) -> Result<()>;
    fn all_clusters(&self) -> Result<Vec<ClusterAssignment>>;

    // -- git artifacts --------------------------------------------------------
    fn insert_commits(&mut self, commits: &[GitCommit]) -> Result<()>;
    fn insert_file_changes(&mut self, changes: &[GitFileChange]) -> Result<()>;
    fn replace_cochange(&mut self, rows: &[CochangeRecord]) -> Result<()>;
    fn all_cochange(&self) -> Result<Vec<CochangeRecord>>;
    fn replace_file_stats(&mut self, rows: &[FileStatsRecord]) -> Result<()>;
    fn all_file_stats(&self) -> Result<Vec<FileStatsRecord>>;
    fn replace_hyperedges(&mut self, edges: &[NewHyperedge]) -> Result<()>;
    fn known_commit_hashes(&self) -> Result<std::collections::HashSet<String>>;
    fn file_changes_grouped_by_commit(&self) -> Result<Vec<(String, Vec<GitFileChange>)>>;

    // -- maintenance --------------------------------------------------------
    /// `--force`: clears symbol/edge/metric/cluster/stats tables only
    /// (spec §4.6); git tables are untouched.
    fn truncate_content_tables(&mut self) -> Result<()>;

    /// Records a completed index run in the `snapshots` table (spec §6),
    /// returning the assigned snapshot id.
    fn record_snapshot(&mut self, forced: bool, created_at: i64) -> Result<i64>;
}
