//! On-disk schema (spec §6): table DDL and the minimum required indices.
//!
//! Table naming follows spec §6 literally: graph-derived per-symbol metrics
//! (pagerank, degree, betweenness) live in `graph_metrics`; AST-derived
//! per-symbol metrics (cognitive complexity, Halstead) live in
//! `symbol_metrics`. `snapshots` records one row per completed index run.

use rusqlite::{Connection, Result as SqliteResult};

pub const SCHEMA_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS files (
    id            INTEGER PRIMARY KEY AUTOINCREMENT,
    path          TEXT    NOT NULL UNIQUE,
    language      TEXT    NOT NULL,
    file_role     TEXT    NOT NULL,
    content_hash  TEXT    NOT NULL,
    mtime         INTEGER NOT NULL,
    line_count    INTEGER NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_files_path ON files(path);

CREATE TABLE IF NOT EXISTS symbols (
    id              INTEGER PRIMARY KEY AUTOINCREMENT,
    file_id         INTEGER NOT NULL REFERENCES files(id) ON DELETE CASCADE,
    name            TEXT    NOT NULL,
    qualified_name  TEXT    NOT NULL,
    kind            TEXT    NOT NULL,
    signature       TEXT,
    line_start      INTEGER NOT NULL,
    line_end        INTEGER NOT NULL,
    docstring       TEXT,
    visibility      TEXT    NOT NULL,
    is_exported     INTEGER NOT NULL,
    parent_id       INTEGER REFERENCES symbols(id) ON DELETE CASCADE,
    default_value   TEXT
);
CREATE INDEX IF NOT EXISTS idx_symbols_file_id ON symbols(file_id);
CREATE INDEX IF NOT EXISTS idx_symbols_name ON symbols(name);

CREATE TABLE IF NOT EXISTS edges (
    source_symbol_id INTEGER NOT NULL REFERENCES symbols(id) ON DELETE CASCADE,
    target_symbol_id INTEGER NOT NULL REFERENCES symbols(id) ON DELETE CASCADE,
    kind             TEXT    NOT NULL,
    line             INTEGER NOT NULL,
    PRIMARY KEY (source_symbol_id, target_symbol_id, kind)
);
CREATE INDEX IF NOT EXISTS idx_edges_source_id ON edges(source_symbol_id);
CREATE INDEX IF NOT EXISTS idx_edges_target_id ON edges(target_symbol_id);

CREATE TABLE IF NOT EXISTS file_edges (
    source_file_id INTEGER NOT NULL REFERENCES files(id) ON DELETE CASCADE,
    target_file_id INTEGER NOT NULL REFERENCES files(id) ON DELETE CASCADE,
    kind           TEXT    NOT NULL,
    symbol_count   INTEGER NOT NULL,
    PRIMARY KEY (source_file_id, target_file_id)
);
CREATE INDEX IF NOT EXISTS idx_file_edges_source ON file_edges(source_file_id);
CREATE INDEX IF NOT EXISTS idx_file_edges_target ON file_edges(target_file_id);

-- Graph-derived metrics: pagerank, degree, betweenness (spec §3 SymbolMetric).
CREATE TABLE IF NOT EXISTS graph_metrics (
    symbol_id   INTEGER PRIMARY KEY REFERENCES symbols(id) ON DELETE CASCADE,
    pagerank    REAL    NOT NULL,
    in_degree   INTEGER NOT NULL,
    out_degree  INTEGER NOT NULL,
    betweenness REAL    NOT NULL
);

-- AST-derived metrics: cognitive complexity + Halstead (spec §4.7).
CREATE TABLE IF NOT EXISTS symbol_metrics (
    symbol_id            INTEGER PRIMARY KEY REFERENCES symbols(id) ON DELETE CASCADE,
    cognitive_complexity INTEGER NOT NULL,
    nesting_depth        INTEGER NOT NULL,
    param_count          INTEGER NOT NULL,
    line_count           INTEGER NOT NULL,
    return_count         INTEGER NOT NULL,
    bool_op_count        INTEGER NOT NULL,
    callback_depth       INTEGER NOT NULL,
    cyclomatic_density   REAL    NOT NULL,
    halstead_volume      REAL    NOT NULL,
    halstead_difficulty  REAL    NOT NULL,
    halstead_effort      REAL    NOT NULL,
    halstead_bugs        REAL    NOT NULL
);

CREATE TABLE IF NOT EXISTS clusters (
    symbol_id     INTEGER PRIMARY KEY REFERENCES symbols(id) ON DELETE CASCADE,
    cluster_id    INTEGER NOT NULL,
    cluster_label TEXT    NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_clusters_cluster_id ON clusters(cluster_id);

CREATE TABLE IF NOT EXISTS file_stats (
    file_id          INTEGER PRIMARY KEY REFERENCES files(id) ON DELETE CASCADE,
    commit_count     INTEGER NOT NULL,
    total_churn      INTEGER NOT NULL,
    distinct_authors INTEGER NOT NULL,
    complexity       REAL    NOT NULL,
    cochange_entropy REAL    NOT NULL
);

CREATE TABLE IF NOT EXISTS git_commits (
    hash      TEXT PRIMARY KEY,
    author    TEXT    NOT NULL,
    timestamp INTEGER NOT NULL,
    message   TEXT    NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_git_commits_timestamp ON git_commits(timestamp);

CREATE TABLE IF NOT EXISTS git_file_changes (
    id            INTEGER PRIMARY KEY AUTOINCREMENT,
    commit_hash   TEXT    NOT NULL REFERENCES git_commits(hash) ON DELETE CASCADE,
    file_id       INTEGER REFERENCES files(id) ON DELETE SET NULL,
    path          TEXT    NOT NULL,
    lines_added   INTEGER NOT NULL,
    lines_removed INTEGER NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_git_file_changes_commit ON git_file_changes(commit_hash);
CREATE INDEX IF NOT EXISTS idx_git_file_changes_file ON git_file_changes(file_id);

CREATE TABLE IF NOT EXISTS git_cochange (
    file_a INTEGER NOT NULL REFERENCES files(id) ON DELETE CASCADE,
    file_b INTEGER NOT NULL REFERENCES files(id) ON DELETE CASCADE,
    count  INTEGER NOT NULL,
    PRIMARY KEY (file_a, file_b)
);

CREATE TABLE IF NOT EXISTS git_hyperedges (
    id          INTEGER PRIMARY KEY AUTOINCREMENT,
    commit_hash TEXT    NOT NULL REFERENCES git_commits(hash) ON DELETE CASCADE,
    file_count  INTEGER NOT NULL,
    sig_hash    TEXT    NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_git_hyperedges_commit ON git_hyperedges(commit_hash);

CREATE TABLE IF NOT EXISTS git_hyperedge_members (
    hyperedge_id INTEGER NOT NULL REFERENCES git_hyperedges(id) ON DELETE CASCADE,
    file_id      INTEGER NOT NULL,
    ordinal      INTEGER NOT NULL,
    PRIMARY KEY (hyperedge_id, file_id)
);

CREATE TABLE IF NOT EXISTS snapshots (
    id           INTEGER PRIMARY KEY AUTOINCREMENT,
    created_at   INTEGER NOT NULL,
    file_count   INTEGER NOT NULL,
    symbol_count INTEGER NOT NULL,
    edge_count   INTEGER NOT NULL,
    forced       INTEGER NOT NULL
);
"#;

/// Opens (or creates) the schema in the given connection. Idempotent —
/// safe to call on every process start (spec §6 "additional nullable
/// columns may be added without breaking older readers").
pub fn init_schema(conn: &Connection) -> SqliteResult<()> {
    conn.execute_batch(SCHEMA_SQL)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn schema_applies_twice_without_error() {
        let conn = Connection::open_in_memory().unwrap();
        init_schema(&conn).unwrap();
        init_schema(&conn).unwrap();
    }
}
