//! `roam-store` — the relational store component (C6) of the roam
//! codebase-comprehension engine.
//!
//! Owns the on-disk schema (SQLite under `<root>/.roam/`), the domain row
//! types for every persisted entity, and the [`CodeIndexStore`] port that
//! `roam-core`'s indexing pipeline writes through. Nothing outside this
//! crate mutates a row directly.
//!
//! ```rust,no_run
//! use roam_store::domain::{CodeIndexStore, NewFile, Language, FileRole};
//! use roam_store::infrastructure::sqlite::SqliteStore;
//!
//! # fn main() -> roam_store::error::Result<()> {
//! let mut store = SqliteStore::open_in_memory()?;
//! let id = store.insert_file(&NewFile {
//!     path: "src/lib.rs".into(),
//!     language: Language::Rust,
//!     file_role: FileRole::Source,
//!     content_hash: "deadbeef".into(),
//!     mtime: 0,
//!     line_count: 10,
//! })?;
//! assert!(id > 0);
//! # Ok(())
//! # }
//! ```

pub mod domain;
pub mod error;
pub mod infrastructure;

pub use domain::{CodeIndexStore, FileChangeSet};
pub use error::{Result, StorageError};
