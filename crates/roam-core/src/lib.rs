//! `roam-core` — the indexing-and-analysis pipeline (C1–C5, C7–C11) of the
//! roam codebase-comprehension engine.
//!
//! This crate turns a source tree into graph analytics by driving, in
//! order: file discovery, change detection, parsing, symbol/reference
//! extraction, reference resolution, complexity analysis, git history
//! mining, graph construction, and graph analytics. Every write goes
//! through [`roam_store::domain::CodeIndexStore`] — this crate never opens
//! a database connection of its own.
//!
//! The CLI, report formatters, per-command read queries, and the MCP
//! transport shim are out of scope; callers reach this crate through
//! [`features::indexing::index_repo`] and [`features::indexing::index_workspace`].

pub mod features;
pub mod shared;

pub use features::indexing::{index_repo, index_workspace, IndexOutcome};
pub use shared::config::{IndexConfig, RepoDescriptor};
pub use shared::error::{CoreError, RunSummary};
