//! [`SqliteStore`] — the concrete `CodeIndexStore`.

use std::collections::{HashMap, HashSet};
use std::path::Path;

use rusqlite::{params, Connection, OptionalExtension};

use crate::domain::*;
use crate::error::{Result, StorageError};

/// Batches an id/name list into chunks of at most this size before building
/// an `IN (...)` clause (spec §4.6 "Large IN-lists").
const IN_LIST_CHUNK: usize = 500;

pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        Ok(Self {
            conn: super::open_connection(path.as_ref())?,
        })
    }

    pub fn open_in_memory() -> Result<Self> {
        Ok(Self {
            conn: super::open_in_memory_connection()?,
        })
    }

    /// Records a completed index run (spec §6 `snapshots` table).
    pub fn record_snapshot(&mut self, forced: bool, created_at: i64) -> Result<i64> {
        let file_count: i64 =
            self.conn
                .query_row("SELECT COUNT(*) FROM files", [], |r| r.get(0))?;
        let symbol_count: i64 =
            self.conn
                .query_row("SELECT COUNT(*) FROM symbols", [], |r| r.get(0))?;
        let edge_count: i64 =
            self.conn
                .query_row("SELECT COUNT(*) FROM edges", [], |r| r.get(0))?;
        self.conn.execute(
            "INSERT INTO snapshots (created_at, file_count, symbol_count, edge_count, forced)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![created_at, file_count, symbol_count, edge_count, forced as i64],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    fn row_to_file(row: &rusqlite::Row) -> rusqlite::Result<FileRecord> {
        Ok(FileRecord {
            id: row.get(0)?,
            path: row.get(1)?,
            language: Language::from_str_lossy(&row.get::<_, String>(2)?),
            file_role: FileRole::from_str_lossy(&row.get::<_, String>(3)?),
            content_hash: row.get(4)?,
            mtime: row.get(5)?,
            line_count: row.get(6)?,
        })
    }

    fn row_to_symbol(row: &rusqlite::Row) -> rusqlite::Result<SymbolRecord> {
        Ok(SymbolRecord {
            id: row.get(0)?,
            file_id: row.get(1)?,
            name: row.get(2)?,
            qualified_name: row.get(3)?,
            kind: SymbolKind::from_str_lossy(&row.get::<_, String>(4)?)
                .unwrap_or(SymbolKind::Variable),
            signature: row.get(5)?,
            line_start: row.get(6)?,
            line_end: row.get(7)?,
            docstring: row.get(8)?,
            visibility: Visibility::from_str_lossy(&row.get::<_, String>(9)?),
            is_exported: row.get::<_, i64>(10)? != 0,
            parent_id: row.get(11)?,
            default_value: row.get(12)?,
        })
    }

    /// Splits `items` into chunks of at most [`IN_LIST_CHUNK`] and calls
    /// `f` per chunk, collecting and flattening the results.
    fn chunked_in<T, R>(items: &[T], mut f: impl FnMut(&[T]) -> Result<Vec<R>>) -> Result<Vec<R>> {
        let mut out = Vec::with_capacity(items.len());
        for chunk in items.chunks(IN_LIST_CHUNK) {
            out.extend(f(chunk)?);
        }
        Ok(out)
    }
}

impl CodeIndexStore for SqliteStore {
    fn insert_file(&mut self, file: &NewFile) -> Result<i64> {
        self.conn.execute(
            "INSERT INTO files (path, language, file_role, content_hash, mtime, line_count)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)
             ON CONFLICT(path) DO UPDATE SET
                language = excluded.language,
                file_role = excluded.file_role,
                content_hash = excluded.content_hash,
                mtime = excluded.mtime,
                line_count = excluded.line_count",
            params![
                file.path,
                file.language.as_str(),
                file.file_role.as_str(),
                file.content_hash,
                file.mtime,
                file.line_count,
            ],
        )?;
        let id: i64 = self.conn.query_row(
            "SELECT id FROM files WHERE path = ?1",
            params![file.path],
            |r| r.get(0),
        )?;
        Ok(id)
    }

    fn delete_file_by_path(&mut self, path: &str) -> Result<()> {
        // ON DELETE CASCADE fans out to symbols -> edges/metrics/clusters
        // and to file_edges referencing this file (spec §4.6 "Ownership").
        self.conn
            .execute("DELETE FROM files WHERE path = ?1", params![path])?;
        Ok(())
    }

    fn all_files(&self) -> Result<Vec<FileRecord>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, path, language, file_role, content_hash, mtime, line_count FROM files",
        )?;
        let rows = stmt
            .query_map([], Self::row_to_file)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }

    fn file_by_path(&self, path: &str) -> Result<Option<FileRecord>> {
        self.conn
            .query_row(
                "SELECT id, path, language, file_role, content_hash, mtime, line_count
                 FROM files WHERE path = ?1",
                params![path],
                Self::row_to_file,
            )
            .optional()
            .map_err(StorageError::from)
    }

    fn insert_symbols(&mut self, symbols: &[NewSymbol]) -> Result<Vec<i64>> {
        if symbols.is_empty() {
            return Ok(Vec::new());
        }
        let file_id = symbols[0].file_id;
        let tx = self.conn.transaction()?;
        let mut ids = Vec::with_capacity(symbols.len());
        // Pass 1: insert all symbols with parent_id left null (parent may
        // not have an id yet within this batch).
        {
            let mut stmt = tx.prepare(
                "INSERT INTO symbols
                    (file_id, name, qualified_name, kind, signature, line_start, line_end,
                     docstring, visibility, is_exported, parent_id, default_value)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, NULL, ?11)",
            )?;
            for sym in symbols {
                stmt.execute(params![
                    sym.file_id,
                    sym.name,
                    sym.qualified_name,
                    sym.kind.as_str(),
                    sym.signature,
                    sym.line_start,
                    sym.line_end,
                    sym.docstring,
                    sym.visibility.as_str(),
                    sym.is_exported as i64,
                    sym.default_value,
                ])?;
                ids.push(tx.last_insert_rowid());
            }
        }
        // Pass 2: resolve parent_name -> sibling id within the same file
        // (spec §4.11 step 4; invariant: parent_id null or same file_id).
        let name_to_id: HashMap<&str, i64> = symbols
            .iter()
            .zip(ids.iter())
            .map(|(s, id)| (s.name.as_str(), *id))
            .collect();
        {
            let mut stmt = tx.prepare("UPDATE symbols SET parent_id = ?1 WHERE id = ?2")?;
            for (sym, id) in symbols.iter().zip(ids.iter()) {
                if let Some(parent_name) = &sym.parent_name {
                    if let Some(parent_id) = name_to_id.get(parent_name.as_str()) {
                        if parent_id != id {
                            stmt.execute(params![parent_id, id])?;
                        }
                    }
                }
            }
        }
        let _ = file_id;
        tx.commit()?;
        Ok(ids)
    }

    fn symbols_by_file(&self, file_id: i64) -> Result<Vec<SymbolRecord>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, file_id, name, qualified_name, kind, signature, line_start, line_end,
                    docstring, visibility, is_exported, parent_id, default_value
             FROM symbols WHERE file_id = ?1",
        )?;
        let rows = stmt
            .query_map(params![file_id], Self::row_to_symbol)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }

    fn all_symbols(&self) -> Result<Vec<SymbolRecord>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, file_id, name, qualified_name, kind, signature, line_start, line_end,
                    docstring, visibility, is_exported, parent_id, default_value
             FROM symbols",
        )?;
        let rows = stmt
            .query_map([], Self::row_to_symbol)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }

    fn symbols_by_names(&self, names: &[String]) -> Result<Vec<SymbolRecord>> {
        Self::chunked_in(names, |chunk| {
            let placeholders = chunk
                .iter()
                .map(|_| "?")
                .collect::<Vec<_>>()
                .join(", ");
            let sql = format!(
                "SELECT id, file_id, name, qualified_name, kind, signature, line_start, line_end,
                        docstring, visibility, is_exported, parent_id, default_value
                 FROM symbols WHERE name IN ({placeholders})"
            );
            let mut stmt = self.conn.prepare(&sql)?;
            let params: Vec<&dyn rusqlite::ToSql> =
                chunk.iter().map(|n| n as &dyn rusqlite::ToSql).collect();
            let rows = stmt
                .query_map(params.as_slice(), Self::row_to_symbol)?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(rows)
        })
    }

    fn replace_edges(&mut self, edges: &[EdgeRecord]) -> Result<usize> {
        let tx = self.conn.transaction()?;
        tx.execute("DELETE FROM edges", [])?;
        let mut inserted = 0usize;
        {
            let mut stmt = tx.prepare(
                "INSERT OR IGNORE INTO edges (source_symbol_id, target_symbol_id, kind, line)
                 VALUES (?1, ?2, ?3, ?4)",
            )?;
            for edge in edges {
                if edge.source_symbol_id == edge.target_symbol_id {
                    continue; // invariant: source != target (spec §3)
                }
                inserted += stmt.execute(params![
                    edge.source_symbol_id,
                    edge.target_symbol_id,
                    edge.kind.as_str(),
                    edge.line,
                ])?;
            }
        }
        tx.commit()?;
        Ok(inserted)
    }

    fn all_edges(&self) -> Result<Vec<EdgeRecord>> {
        let mut stmt = self
            .conn
            .prepare("SELECT source_symbol_id, target_symbol_id, kind, line FROM edges")?;
        let rows = stmt
            .query_map([], |row| {
                Ok(EdgeRecord {
                    source_symbol_id: row.get(0)?,
                    target_symbol_id: row.get(1)?,
                    kind: EdgeKind::from_str_lossy(&row.get::<_, String>(2)?)
                        .unwrap_or(EdgeKind::Reference),
                    line: row.get(3)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }

    fn replace_file_edges(&mut self, edges: &[FileEdgeRecord]) -> Result<usize> {
        let tx = self.conn.transaction()?;
        tx.execute("DELETE FROM file_edges", [])?;
        let mut inserted = 0usize;
        {
            let mut stmt = tx.prepare(
                "INSERT INTO file_edges (source_file_id, target_file_id, kind, symbol_count)
                 VALUES (?1, ?2, ?3, ?4)",
            )?;
            for edge in edges {
                inserted += stmt.execute(params![
                    edge.source_file_id,
                    edge.target_file_id,
                    edge.kind.as_str(),
                    edge.symbol_count,
                ])?;
            }
        }
        tx.commit()?;
        Ok(inserted)
    }

    fn all_file_edges(&self) -> Result<Vec<FileEdgeRecord>> {
        let mut stmt = self.conn.prepare(
            "SELECT source_file_id, target_file_id, kind, symbol_count FROM file_edges",
        )?;
        let rows = stmt
            .query_map([], |row| {
                Ok(FileEdgeRecord {
                    source_file_id: row.get(0)?,
                    target_file_id: row.get(1)?,
                    kind: FileEdgeKind::from_str_lossy(&row.get::<_, String>(2)?),
                    symbol_count: row.get(3)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }

    fn replace_symbol_metrics(&mut self, rows: &[SymbolMetricRecord]) -> Result<()> {
        let tx = self.conn.transaction()?;
        tx.execute("DELETE FROM graph_metrics", [])?;
        {
            let mut stmt = tx.prepare(
                "INSERT INTO graph_metrics (symbol_id, pagerank, in_degree, out_degree, betweenness)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
            )?;
            for row in rows {
                stmt.execute(params![
                    row.symbol_id,
                    row.pagerank,
                    row.in_degree,
                    row.out_degree,
                    row.betweenness,
                ])?;
            }
        }
        tx.commit()?;
        Ok(())
    }

    fn all_symbol_metrics(&self) -> Result<Vec<SymbolMetricRecord>> {
        let mut stmt = self.conn.prepare(
            "SELECT symbol_id, pagerank, in_degree, out_degree, betweenness FROM graph_metrics",
        )?;
        let rows = stmt
            .query_map([], |row| {
                Ok(SymbolMetricRecord {
                    symbol_id: row.get(0)?,
                    pagerank: row.get(1)?,
                    in_degree: row.get(2)?,
                    out_degree: row.get(3)?,
                    betweenness: row.get(4)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }

    fn replace_complexity(&mut self, rows: &[ComplexityRecord]) -> Result<()> {
        let tx = self.conn.transaction()?;
        tx.execute("DELETE FROM symbol_metrics", [])?;
        {
            let mut stmt = tx.prepare(
                "INSERT INTO symbol_metrics
                    (symbol_id, cognitive_complexity, nesting_depth, param_count, line_count,
                     return_count, bool_op_count, callback_depth, cyclomatic_density,
                     halstead_volume, halstead_difficulty, halstead_effort, halstead_bugs)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)",
            )?;
            for row in rows {
                stmt.execute(params![
                    row.symbol_id,
                    row.cognitive_complexity,
                    row.nesting_depth,
                    row.param_count,
                    row.line_count,
                    row.return_count,
                    row.bool_op_count,
                    row.callback_depth,
                    row.cyclomatic_density,
                    row.halstead_volume,
                    row.halstead_difficulty,
                    row.halstead_effort,
                    row.halstead_bugs,
                ])?;
            }
        }
        tx.commit()?;
        Ok(())
    }

    fn all_complexity(&self) -> Result<Vec<ComplexityRecord>> {
        let mut stmt = self.conn.prepare(
            "SELECT symbol_id, cognitive_complexity, nesting_depth, param_count, line_count,
                    return_count, bool_op_count, callback_depth, cyclomatic_density,
                    halstead_volume, halstead_difficulty, halstead_effort, halstead_bugs
             FROM symbol_metrics",
        )?;
        let rows = stmt
            .query_map([], |row| {
                Ok(ComplexityRecord {
                    symbol_id: row.get(0)?,
                    cognitive_complexity: row.get(1)?,
                    nesting_depth: row.get(2)?,
                    param_count: row.get(3)?,
                    line_count: row.get(4)?,
                    return_count: row.get(5)?,
                    bool_op_count: row.get(6)?,
                    callback_depth: row.get(7)?,
                    cyclomatic_density: row.get(8)?,
                    halstead_volume: row.get(9)?,
                    halstead_difficulty: row.get(10)?,
                    halstead_effort: row.get(11)?,
                    halstead_bugs: row.get(12)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }

    fn replace_clusters(&mut self, rows: &[ClusterAssignment]) -> Result<()> {
        let tx = self.conn.transaction()?;
        tx.execute("DELETE FROM clusters", [])?;
        {
            let mut stmt = tx.prepare(
                "INSERT INTO clusters (symbol_id, cluster_id, cluster_label) VALUES (?1, ?2, ?3)",
            )?;
            for row in rows {
                stmt.execute(params![row.symbol_id, row.cluster_id, row.cluster_label])?;
            }
        }
        tx.commit()?;
        Ok(())
    }

    fn all_clusters(&self) -> Result<Vec<ClusterAssignment>> {
        let mut stmt = self
            .conn
            .prepare("SELECT symbol_id, cluster_id, cluster_label FROM clusters")?;
        let rows = stmt
            .query_map([], |row| {
                Ok(ClusterAssignment {
                    symbol_id: row.get(0)?,
                    cluster_id: row.get(1)?,
                    cluster_label: row.get(2)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }

    fn insert_commits(&mut self, commits: &[GitCommit]) -> Result<()> {
        let tx = self.conn.transaction()?;
        {
            let mut stmt = tx.prepare(
                "INSERT OR IGNORE INTO git_commits (hash, author, timestamp, message)
                 VALUES (?1, ?2, ?3, ?4)",
            )?;
            for commit in commits {
                stmt.execute(params![
                    commit.hash,
                    commit.author,
                    commit.timestamp,
                    commit.message,
                ])?;
            }
        }
        tx.commit()?;
        Ok(())
    }

    fn insert_file_changes(&mut self, changes: &[GitFileChange]) -> Result<()> {
        let tx = self.conn.transaction()?;
        {
            let mut stmt = tx.prepare(
                "INSERT INTO git_file_changes (commit_hash, file_id, path, lines_added, lines_removed)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
            )?;
            for change in changes {
                stmt.execute(params![
                    change.commit_hash,
                    change.file_id,
                    change.path,
                    change.lines_added,
                    change.lines_removed,
                ])?;
            }
        }
        tx.commit()?;
        Ok(())
    }

    fn replace_cochange(&mut self, rows: &[CochangeRecord]) -> Result<()> {
        let tx = self.conn.transaction()?;
        tx.execute("DELETE FROM git_cochange", [])?;
        {
            let mut stmt = tx.prepare(
                "INSERT INTO git_cochange (file_a, file_b, count) VALUES (?1, ?2, ?3)",
            )?;
            for row in rows {
                stmt.execute(params![
                    row.file_a.to_string(),
                    row.file_b.to_string(),
                    row.count,
                ])?;
            }
        }
        tx.commit()?;
        Ok(())
    }

    fn all_cochange(&self) -> Result<Vec<CochangeRecord>> {
        let mut stmt = self
            .conn
            .prepare("SELECT file_a, file_b, count FROM git_cochange")?;
        let rows = stmt
            .query_map([], |row| {
                let file_a: String = row.get(0)?;
                let file_b: String = row.get(1)?;
                Ok(CochangeRecord {
                    file_a: file_a.parse().unwrap_or(0),
                    file_b: file_b.parse().unwrap_or(0),
                    count: row.get(2)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }

    fn replace_file_stats(&mut self, rows: &[FileStatsRecord]) -> Result<()> {
        let tx = self.conn.transaction()?;
        tx.execute("DELETE FROM file_stats", [])?;
        {
            let mut stmt = tx.prepare(
                "INSERT INTO file_stats
                    (file_id, commit_count, total_churn, distinct_authors, complexity, cochange_entropy)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            )?;
            for row in rows {
                stmt.execute(params![
                    row.file_id,
                    row.commit_count,
                    row.total_churn,
                    row.distinct_authors,
                    row.complexity,
                    row.cochange_entropy,
                ])?;
            }
        }
        tx.commit()?;
        Ok(())
    }

    fn all_file_stats(&self) -> Result<Vec<FileStatsRecord>> {
        let mut stmt = self.conn.prepare(
            "SELECT file_id, commit_count, total_churn, distinct_authors, complexity, cochange_entropy
             FROM file_stats",
        )?;
        let rows = stmt
            .query_map([], |row| {
                Ok(FileStatsRecord {
                    file_id: row.get(0)?,
                    commit_count: row.get(1)?,
                    total_churn: row.get(2)?,
                    distinct_authors: row.get(3)?,
                    complexity: row.get(4)?,
                    cochange_entropy: row.get(5)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }

    fn replace_hyperedges(&mut self, edges: &[NewHyperedge]) -> Result<()> {
        let tx = self.conn.transaction()?;
        tx.execute("DELETE FROM git_hyperedge_members", [])?;
        tx.execute("DELETE FROM git_hyperedges", [])?;
        {
            let mut insert_edge = tx.prepare(
                "INSERT INTO git_hyperedges (commit_hash, file_count, sig_hash)
                 VALUES (?1, ?2, ?3)",
            )?;
            let mut insert_member = tx.prepare(
                "INSERT INTO git_hyperedge_members (hyperedge_id, file_id, ordinal)
                 VALUES (?1, ?2, ?3)",
            )?;
            for edge in edges {
                insert_edge.execute(params![edge.commit_hash, edge.file_count, edge.sig_hash])?;
                let hyperedge_id = tx.last_insert_rowid();
                for (ordinal, file_id) in edge.members.iter().enumerate() {
                    insert_member.execute(params![hyperedge_id, file_id, ordinal as i64])?;
                }
            }
        }
        tx.commit()?;
        Ok(())
    }

    fn known_commit_hashes(&self) -> Result<HashSet<String>> {
        let mut stmt = self.conn.prepare("SELECT hash FROM git_commits")?;
        let rows = stmt
            .query_map([], |r| r.get::<_, String>(0))?
            .collect::<rusqlite::Result<HashSet<_>>>()?;
        Ok(rows)
    }

    fn file_changes_grouped_by_commit(&self) -> Result<Vec<(String, Vec<GitFileChange>)>> {
        let mut stmt = self.conn.prepare(
            "SELECT commit_hash, file_id, path, lines_added, lines_removed
             FROM git_file_changes ORDER BY commit_hash",
        )?;
        let rows = stmt
            .query_map([], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    GitFileChange {
                        commit_hash: row.get(0)?,
                        file_id: row.get(1)?,
                        path: row.get(2)?,
                        lines_added: row.get(3)?,
                        lines_removed: row.get(4)?,
                    },
                ))
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        let mut grouped: Vec<(String, Vec<GitFileChange>)> = Vec::new();
        for (hash, change) in rows {
            match grouped.last_mut() {
                Some((last_hash, changes)) if *last_hash == hash => changes.push(change),
                _ => grouped.push((hash, vec![change])),
            }
        }
        Ok(grouped)
    }

    fn truncate_content_tables(&mut self) -> Result<()> {
        // `--force`: clears symbol/edge/metric/cluster/stats tables only;
        // git tables are a separate concern (spec §4.6).
        let tx = self.conn.transaction()?;
        for table in [
            "clusters",
            "symbol_metrics",
            "graph_metrics",
            "file_edges",
            "edges",
            "symbols",
            "files",
        ] {
            tx.execute(&format!("DELETE FROM {table}"), [])?;
        }
        tx.commit()?;
        Ok(())
    }

    fn record_snapshot(&mut self, forced: bool, created_at: i64) -> Result<i64> {
        SqliteStore::record_snapshot(self, forced, created_at)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_file(path: &str) -> NewFile {
        NewFile {
            path: path.to_string(),
            language: Language::Rust,
            file_role: FileRole::Source,
            content_hash: "hash".into(),
            mtime: 100,
            line_count: 10,
        }
    }

    #[test]
    fn insert_file_then_lookup_by_path_round_trips() {
        let mut store = SqliteStore::open_in_memory().unwrap();
        let id = store.insert_file(&sample_file("a.rs")).unwrap();
        let found = store.file_by_path("a.rs").unwrap().unwrap();
        assert_eq!(found.id, id);
        assert_eq!(found.language, Language::Rust);
    }

    #[test]
    fn deleting_a_file_cascades_to_symbols_and_edges() {
        let mut store = SqliteStore::open_in_memory().unwrap();
        let file_id = store.insert_file(&sample_file("a.rs")).unwrap();
        let ids = store
            .insert_symbols(&[NewSymbol {
                file_id,
                name: "foo".into(),
                qualified_name: "foo".into(),
                kind: SymbolKind::Function,
                signature: None,
                line_start: 1,
                line_end: 2,
                docstring: None,
                visibility: Visibility::Public,
                is_exported: true,
                parent_name: None,
                default_value: None,
            }])
            .unwrap();
        store
            .replace_edges(&[EdgeRecord {
                source_symbol_id: ids[0],
                target_symbol_id: ids[0] + 999, // dangling on purpose is fine pre-FK
                kind: EdgeKind::Call,
                line: 1,
            }])
            .unwrap_err(); // FK violation on the bogus target is expected

        store.delete_file_by_path("a.rs").unwrap();
        assert!(store.all_symbols().unwrap().is_empty());
        assert!(store.all_edges().unwrap().is_empty());
    }

    #[test]
    fn parent_name_resolves_to_sibling_id_in_same_file() {
        let mut store = SqliteStore::open_in_memory().unwrap();
        let file_id = store.insert_file(&sample_file("a.rs")).unwrap();
        let ids = store
            .insert_symbols(&[
                NewSymbol {
                    file_id,
                    name: "Outer".into(),
                    qualified_name: "Outer".into(),
                    kind: SymbolKind::Class,
                    signature: None,
                    line_start: 1,
                    line_end: 10,
                    docstring: None,
                    visibility: Visibility::Public,
                    is_exported: true,
                    parent_name: None,
                    default_value: None,
                },
                NewSymbol {
                    file_id,
                    name: "inner".into(),
                    qualified_name: "Outer.inner".into(),
                    kind: SymbolKind::Method,
                    signature: None,
                    line_start: 2,
                    line_end: 4,
                    docstring: None,
                    visibility: Visibility::Public,
                    is_exported: false,
                    parent_name: Some("Outer".into()),
                    default_value: None,
                },
            ])
            .unwrap();
        let symbols = store.symbols_by_file(file_id).unwrap();
        let inner = symbols.iter().find(|s| s.name == "inner").unwrap();
        assert_eq!(inner.parent_id, Some(ids[0]));
    }

    #[test]
    fn replace_edges_drops_self_edges_and_dedupes() {
        let mut store = SqliteStore::open_in_memory().unwrap();
        let file_id = store.insert_file(&sample_file("a.rs")).unwrap();
        let ids = store
            .insert_symbols(&[
                NewSymbol {
                    file_id,
                    name: "a".into(),
                    qualified_name: "a".into(),
                    kind: SymbolKind::Function,
                    signature: None,
                    line_start: 1,
                    line_end: 2,
                    docstring: None,
                    visibility: Visibility::Public,
                    is_exported: true,
                    parent_name: None,
                    default_value: None,
                },
                NewSymbol {
                    file_id,
                    name: "b".into(),
                    qualified_name: "b".into(),
                    kind: SymbolKind::Function,
                    signature: None,
                    line_start: 3,
                    line_end: 4,
                    docstring: None,
                    visibility: Visibility::Public,
                    is_exported: true,
                    parent_name: None,
                    default_value: None,
                },
            ])
            .unwrap();
        let inserted = store
            .replace_edges(&[
                EdgeRecord {
                    source_symbol_id: ids[0],
                    target_symbol_id: ids[0],
                    kind: EdgeKind::Call,
                    line: 1,
                },
                EdgeRecord {
                    source_symbol_id: ids[0],
                    target_symbol_id: ids[1],
                    kind: EdgeKind::Call,
                    line: 1,
                },
                EdgeRecord {
                    source_symbol_id: ids[0],
                    target_symbol_id: ids[1],
                    kind: EdgeKind::Call,
                    line: 2,
                },
            ])
            .unwrap();
        assert_eq!(inserted, 1); // self-edge dropped, duplicate coalesced
        assert_eq!(store.all_edges().unwrap().len(), 1);
    }

    #[test]
    fn force_truncate_leaves_git_tables_untouched() {
        let mut store = SqliteStore::open_in_memory().unwrap();
        store
            .insert_commits(&[GitCommit {
                hash: "abc".into(),
                author: "me".into(),
                timestamp: 0,
                message: "msg".into(),
            }])
            .unwrap();
        store.insert_file(&sample_file("a.rs")).unwrap();
        store.truncate_content_tables().unwrap();
        assert!(store.all_files().unwrap().is_empty());
        assert_eq!(store.known_commit_hashes().unwrap().len(), 1);
    }

    #[test]
    fn symbols_by_names_chunks_large_id_lists() {
        let mut store = SqliteStore::open_in_memory().unwrap();
        let file_id = store.insert_file(&sample_file("a.rs")).unwrap();
        let many: Vec<NewSymbol> = (0..50)
            .map(|i| NewSymbol {
                file_id,
                name: format!("fn_{i}"),
                qualified_name: format!("fn_{i}"),
                kind: SymbolKind::Function,
                signature: None,
                line_start: i,
                line_end: i + 1,
                docstring: None,
                visibility: Visibility::Public,
                is_exported: true,
                parent_name: None,
                default_value: None,
            })
            .collect();
        store.insert_symbols(&many).unwrap();
        let names: Vec<String> = (0..50).map(|i| format!("fn_{i}")).collect();
        let found = store.symbols_by_names(&names).unwrap();
        assert_eq!(found.len(), 50);
    }
}
