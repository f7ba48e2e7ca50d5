//! SQLite-backed implementation of [`crate::domain::CodeIndexStore`].

mod schema;
mod store;

pub use store::SqliteStore;

use crate::error::Result;
use rusqlite::Connection;
use std::path::Path;

/// Enables WAL journaling, a bounded busy timeout, and foreign-key
/// cascades — the three pragmas spec §6/§7 assume are in effect.
pub(crate) fn configure_connection(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "PRAGMA journal_mode = WAL;
         PRAGMA synchronous = NORMAL;
         PRAGMA busy_timeout = 5000;
         PRAGMA foreign_keys = ON;",
    )?;
    Ok(())
}

pub(crate) fn open_connection(path: &Path) -> Result<Connection> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let conn = Connection::open(path)?;
    configure_connection(&conn)?;
    schema::init_schema(&conn)?;
    Ok(conn)
}

pub(crate) fn open_in_memory_connection() -> Result<Connection> {
    let conn = Connection::open_in_memory()?;
    conn.execute_batch("PRAGMA foreign_keys = ON;")?;
    schema::init_schema(&conn)?;
    Ok(conn)
}
