//! Cross-cutting concerns shared by every `features::*` module.

pub mod config;
pub mod error;
pub mod hashing;
pub mod stats;
