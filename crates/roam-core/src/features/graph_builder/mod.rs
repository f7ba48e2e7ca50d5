//! Graph Builder (C9, spec §4.9).
//!
//! Materializes two in-memory directed graphs from store records: the
//! symbol graph (nodes = symbols, edges = resolved references) and the
//! file graph (nodes = files, edges = aggregated file edges). Both are
//! consumed by graph analytics (C10).

use std::collections::HashMap;

use petgraph::graph::{DiGraph, NodeIndex};

use roam_store::domain::{
    EdgeKind, EdgeRecord, FileEdgeKind, FileEdgeRecord, FileRecord, Language, SymbolKind,
    SymbolRecord,
};

/// Node payload for the symbol graph (spec §4.9: "name, kind,
/// qualified_name, file_path").
#[derive(Debug, Clone)]
pub struct SymbolNode {
    pub symbol_id: i64,
    pub name: String,
    pub qualified_name: String,
    pub kind: SymbolKind,
    pub file_path: String,
}

/// Node payload for the file graph.
#[derive(Debug, Clone)]
pub struct FileNode {
    pub file_id: i64,
    pub path: String,
    pub language: Language,
}

/// Directed symbol-reference graph plus an id → node index map so
/// callers can look nodes up by `symbol_id` without a linear scan.
pub struct SymbolGraph {
    pub graph: DiGraph<SymbolNode, EdgeKind>,
    pub index_of: HashMap<i64, NodeIndex>,
}

/// Directed file-reference graph plus a `file_id` → node index map.
pub struct FileGraph {
    pub graph: DiGraph<FileNode, (FileEdgeKind, i64)>,
    pub index_of: HashMap<i64, NodeIndex>,
}

/// Builds the symbol graph from store rows. Duplicate `(source, target,
/// kind)` edges are never passed in (the resolver already dedupes them,
/// spec §4.5 step 5), so this is a direct one-edge-per-record insert.
pub fn build_symbol_graph(
    symbols: &[SymbolRecord],
    edges: &[EdgeRecord],
    file_path_of: &HashMap<i64, String>,
) -> SymbolGraph {
    let mut graph = DiGraph::new();
    let mut index_of = HashMap::with_capacity(symbols.len());

    for symbol in symbols {
        let file_path = file_path_of
            .get(&symbol.file_id)
            .cloned()
            .unwrap_or_default();
        let idx = graph.add_node(SymbolNode {
            symbol_id: symbol.id,
            name: symbol.name.clone(),
            qualified_name: symbol.qualified_name.clone(),
            kind: symbol.kind,
            file_path,
        });
        index_of.insert(symbol.id, idx);
    }

    for edge in edges {
        let (Some(&src), Some(&dst)) = (
            index_of.get(&edge.source_symbol_id),
            index_of.get(&edge.target_symbol_id),
        ) else {
            continue;
        };
        graph.add_edge(src, dst, edge.kind);
    }

    SymbolGraph { graph, index_of }
}

/// Builds the file graph from store rows.
pub fn build_file_graph(files: &[FileRecord], file_edges: &[FileEdgeRecord]) -> FileGraph {
    let mut graph = DiGraph::new();
    let mut index_of = HashMap::with_capacity(files.len());

    for file in files {
        let idx = graph.add_node(FileNode {
            file_id: file.id,
            path: file.path.clone(),
            language: file.language,
        });
        index_of.insert(file.id, idx);
    }

    for edge in file_edges {
        let (Some(&src), Some(&dst)) = (
            index_of.get(&edge.source_file_id),
            index_of.get(&edge.target_file_id),
        ) else {
            continue;
        };
        graph.add_edge(src, dst, (edge.kind, edge.symbol_count));
    }

    FileGraph { graph, index_of }
}

#[cfg(test)]
mod tests {
    use super::*;
    use roam_store::domain::{FileRole, Visibility};

    fn symbol(id: i64, file_id: i64, name: &str) -> SymbolRecord {
        SymbolRecord {
            id,
            file_id,
            name: name.to_string(),
            qualified_name: name.to_string(),
            kind: SymbolKind::Function,
            signature: None,
            line_start: 1,
            line_end: 1,
            docstring: None,
            visibility: Visibility::Public,
            is_exported: true,
            parent_id: None,
            default_value: None,
        }
    }

    fn file(id: i64, path: &str) -> FileRecord {
        FileRecord {
            id,
            path: path.to_string(),
            language: Language::Rust,
            file_role: FileRole::Source,
            content_hash: "x".to_string(),
            mtime: 0,
            line_count: 10,
        }
    }

    #[test]
    fn symbol_graph_has_one_node_per_symbol_and_edge_per_record() {
        let symbols = vec![symbol(1, 10, "a"), symbol(2, 10, "b")];
        let edges = vec![EdgeRecord {
            source_symbol_id: 1,
            target_symbol_id: 2,
            kind: EdgeKind::Call,
            line: 3,
        }];
        let mut paths = HashMap::new();
        paths.insert(10, "a.rs".to_string());
        let sg = build_symbol_graph(&symbols, &edges, &paths);
        assert_eq!(sg.graph.node_count(), 2);
        assert_eq!(sg.graph.edge_count(), 1);
        assert!(sg.index_of.contains_key(&1));
    }

    #[test]
    fn dangling_edge_endpoints_are_skipped_not_panicked() {
        let symbols = vec![symbol(1, 10, "a")];
        let edges = vec![EdgeRecord {
            source_symbol_id: 1,
            target_symbol_id: 999,
            kind: EdgeKind::Call,
            line: 1,
        }];
        let sg = build_symbol_graph(&symbols, &edges, &HashMap::new());
        assert_eq!(sg.graph.edge_count(), 0);
    }

    #[test]
    fn file_graph_builds_nodes_and_edges() {
        let files = vec![file(1, "a.rs"), file(2, "b.rs")];
        let file_edges = vec![FileEdgeRecord {
            source_file_id: 1,
            target_file_id: 2,
            kind: FileEdgeKind::Imports,
            symbol_count: 2,
        }];
        let fg = build_file_graph(&files, &file_edges);
        assert_eq!(fg.graph.node_count(), 2);
        assert_eq!(fg.graph.edge_count(), 1);
    }
}
