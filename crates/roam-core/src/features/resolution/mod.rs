//! Reference Resolver (C5, spec §4.5).
//!
//! Turns the buffered [`RawReference`]s produced by extraction into
//! concrete [`EdgeRecord`]s, then aggregates symbol edges into file edges.
//! Pure in-memory logic over whatever symbol/file indexes the pipeline
//! builds from the store — no I/O here.

use std::collections::{HashMap, HashSet};

/// Name→candidates and file→top-level indexes are the resolver's hottest
/// lookup path on a large repo (every reference does at least one probe),
/// so the index itself is keyed with `ahash` rather than the default
/// SipHash-keyed `HashMap`. The indexes the pipeline hands in stay plain
/// `std::collections::HashMap` — this is an internal storage choice, not
/// part of the resolver's public surface.
use ahash::AHashMap;

use roam_store::domain::{EdgeKind, FileEdgeKind, FileEdgeRecord, SymbolKind, SymbolRecord};

use crate::features::extraction::RawReference;

/// A symbol as seen by the resolver: the subset of [`SymbolRecord`] fields
/// candidate ranking needs, plus the directory its file lives in.
#[derive(Debug, Clone)]
pub struct ResolverSymbol {
    pub id: i64,
    pub file_id: i64,
    pub name: String,
    pub kind: SymbolKind,
    pub is_exported: bool,
    pub directory: String,
}

impl ResolverSymbol {
    pub fn from_record(record: &SymbolRecord, directory: &str) -> Self {
        Self {
            id: record.id,
            file_id: record.file_id,
            name: record.name.clone(),
            kind: record.kind,
            is_exported: record.is_exported,
            directory: directory.to_string(),
        }
    }
}

/// Indexes the resolver needs: name → candidate symbols, and file_id →
/// directory (for the same-directory-exported bucket) plus file's
/// top-level symbols (for source-name fallback).
pub struct ResolverIndex {
    by_name: AHashMap<String, Vec<ResolverSymbol>>,
    top_level_by_file: AHashMap<i64, Vec<ResolverSymbol>>,
}

impl ResolverIndex {
    pub fn build(symbols: &[ResolverSymbol], parent_ids: &HashMap<i64, Option<i64>>) -> Self {
        let mut by_name: AHashMap<String, Vec<ResolverSymbol>> = AHashMap::new();
        let mut top_level_by_file: AHashMap<i64, Vec<ResolverSymbol>> = AHashMap::new();
        for sym in symbols {
            by_name.entry(sym.name.clone()).or_default().push(sym.clone());
            let has_parent = parent_ids.get(&sym.id).copied().flatten().is_some();
            if !has_parent {
                top_level_by_file.entry(sym.file_id).or_default().push(sym.clone());
            }
        }
        Self {
            by_name,
            top_level_by_file,
        }
    }

    fn candidates(&self, name: &str) -> &[ResolverSymbol] {
        self.by_name.get(name).map(|v| v.as_slice()).unwrap_or(&[])
    }
}

/// Candidate ranking buckets, lowest value wins (spec §4.5 step 2).
fn bucket(candidate: &ResolverSymbol, source_file_id: i64, source_dir: &str) -> u8 {
    if candidate.file_id == source_file_id {
        0
    } else if candidate.is_exported && candidate.directory == source_dir {
        1
    } else if candidate.is_exported {
        2
    } else {
        3
    }
}

/// Picks the best candidate for one reference, applying the full
/// tie-break chain: bucket, then callable-kind match, then lowest id.
fn pick_target<'a>(
    candidates: &'a [ResolverSymbol],
    source_file_id: i64,
    source_dir: &str,
    ref_kind: EdgeKind,
) -> Option<&'a ResolverSymbol> {
    let wants_callable = matches!(ref_kind, EdgeKind::Call);
    candidates.iter().min_by_key(|c| {
        let b = bucket(c, source_file_id, source_dir);
        let kind_rank = if wants_callable && c.kind.is_callable() {
            0
        } else {
            1
        };
        (b, kind_rank, c.id)
    })
}

/// Resolves `source_name` to a symbol id: a direct by-name lookup scoped
/// to the reference's own file, falling back to the file's sole top-level
/// symbol when the name is absent and the file is unambiguous (spec §4.5
/// step 3).
fn resolve_source<'a>(
    index: &'a ResolverIndex,
    source_name: Option<&str>,
    source_file_id: i64,
) -> Option<&'a ResolverSymbol> {
    if let Some(name) = source_name {
        if let Some(sym) = index
            .candidates(name)
            .iter()
            .find(|c| c.file_id == source_file_id)
        {
            return Some(sym);
        }
    }
    let top_level = index.top_level_by_file.get(&source_file_id)?;
    match top_level.as_slice() {
        [only] => Some(only),
        _ => None,
    }
}

/// Resolves all raw references into edges, applying self-edge drop and
/// `(source_id, target_id, kind)` deduplication (spec §4.5 steps 4-5).
pub fn resolve_references(
    references: &[RawReference],
    index: &ResolverIndex,
    directory_of_file: &HashMap<i64, String>,
    file_id_of_path: &HashMap<String, i64>,
) -> Vec<roam_store::domain::EdgeRecord> {
    let mut seen = HashSet::new();
    let mut out = Vec::new();
    for reference in references {
        let Some(&source_file_id) = file_id_of_path.get(&reference.source_file) else {
            continue;
        };
        let source_dir = directory_of_file
            .get(&source_file_id)
            .cloned()
            .unwrap_or_default();

        let Some(source_symbol) =
            resolve_source(index, reference.source_name.as_deref(), source_file_id)
        else {
            continue;
        };

        let candidates = index.candidates(&reference.target_name);
        let Some(target_symbol) = pick_target(candidates, source_file_id, &source_dir, reference.kind)
        else {
            continue;
        };

        if source_symbol.id == target_symbol.id {
            continue;
        }

        let key = (source_symbol.id, target_symbol.id, reference.kind);
        if !seen.insert(key) {
            continue;
        }

        out.push(roam_store::domain::EdgeRecord {
            source_symbol_id: source_symbol.id,
            target_symbol_id: target_symbol.id,
            kind: reference.kind,
            line: reference.line,
        });
    }
    out
}

/// Aggregates symbol edges into file edges (spec §4.5 "File edges"):
/// one row per `(source_file, target_file)` pair with `source_file !=
/// target_file`, `symbol_count` the number of distinct underlying symbol
/// edges, and `kind = imports` when any underlying kind implies import.
pub fn aggregate_file_edges(
    edges: &[roam_store::domain::EdgeRecord],
    file_id_of_symbol: &HashMap<i64, i64>,
) -> Vec<FileEdgeRecord> {
    struct Agg {
        count: i64,
        any_import: bool,
    }

    let mut aggregated: HashMap<(i64, i64), Agg> = HashMap::new();
    for edge in edges {
        let (Some(&src_file), Some(&dst_file)) = (
            file_id_of_symbol.get(&edge.source_symbol_id),
            file_id_of_symbol.get(&edge.target_symbol_id),
        ) else {
            continue;
        };
        if src_file == dst_file {
            continue;
        }
        let entry = aggregated.entry((src_file, dst_file)).or_insert(Agg {
            count: 0,
            any_import: false,
        });
        entry.count += 1;
        entry.any_import |= edge.kind.implies_import();
    }

    let mut out: Vec<FileEdgeRecord> = aggregated
        .into_iter()
        .map(|((src, dst), agg)| FileEdgeRecord {
            source_file_id: src,
            target_file_id: dst,
            kind: if agg.any_import {
                FileEdgeKind::Imports
            } else {
                FileEdgeKind::Uses
            },
            symbol_count: agg.count,
        })
        .collect();
    out.sort_by_key(|e| (e.source_file_id, e.target_file_id));
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use roam_store::domain::Visibility;

    fn sym(id: i64, file_id: i64, name: &str, kind: SymbolKind, exported: bool, dir: &str) -> ResolverSymbol {
        ResolverSymbol {
            id,
            file_id,
            name: name.to_string(),
            kind,
            is_exported: exported,
            directory: dir.to_string(),
        }
    }

    fn record(id: i64, file_id: i64, name: &str, kind: SymbolKind, exported: bool) -> SymbolRecord {
        SymbolRecord {
            id,
            file_id,
            name: name.to_string(),
            qualified_name: name.to_string(),
            kind,
            signature: None,
            line_start: 1,
            line_end: 1,
            docstring: None,
            visibility: Visibility::Public,
            is_exported: exported,
            parent_id: None,
            default_value: None,
        }
    }

    #[test]
    fn same_file_candidate_wins_over_exported_elsewhere() {
        let local = sym(1, 10, "helper", SymbolKind::Function, false, "a");
        let exported = sym(2, 20, "helper", SymbolKind::Function, true, "a");
        let candidates = vec![local.clone(), exported];
        let best = pick_target(&candidates, 10, "a", EdgeKind::Call).unwrap();
        assert_eq!(best.id, 1);
    }

    #[test]
    fn same_directory_exported_beats_any_exported() {
        let near = sym(1, 20, "helper", SymbolKind::Function, true, "a");
        let far = sym(2, 30, "helper", SymbolKind::Function, true, "b");
        let candidates = vec![far, near];
        let best = pick_target(&candidates, 10, "a", EdgeKind::Call).unwrap();
        assert_eq!(best.id, 1);
    }

    #[test]
    fn callable_kind_tie_break_prefers_function_for_call_reference() {
        let variable = sym(1, 10, "thing", SymbolKind::Variable, true, "a");
        let function = sym(2, 10, "thing", SymbolKind::Function, true, "a");
        let candidates = vec![variable, function];
        let best = pick_target(&candidates, 99, "z", EdgeKind::Call).unwrap();
        assert_eq!(best.id, 2);
    }

    #[test]
    fn self_edge_and_duplicate_are_dropped() {
        let a = ResolverSymbol {
            id: 1,
            file_id: 10,
            name: "a".into(),
            kind: SymbolKind::Function,
            is_exported: true,
            directory: "d".into(),
        };
        let symbols = vec![a];
        let parent_ids = HashMap::new();
        let index = ResolverIndex::build(&symbols, &parent_ids);
        let refs = vec![RawReference {
            source_name: Some("a".to_string()),
            target_name: "a".to_string(),
            kind: EdgeKind::Call,
            line: 1,
            source_file: "f.rs".to_string(),
        }];
        let mut dir = HashMap::new();
        dir.insert(10, "d".to_string());
        let mut path = HashMap::new();
        path.insert("f.rs".to_string(), 10);
        let edges = resolve_references(&refs, &index, &dir, &path);
        assert!(edges.is_empty());
    }

    #[test]
    fn unresolved_reference_is_silently_dropped() {
        let symbols = vec![sym(1, 10, "known", SymbolKind::Function, true, "d")];
        let parent_ids = HashMap::new();
        let index = ResolverIndex::build(&symbols, &parent_ids);
        let refs = vec![RawReference {
            source_name: Some("known".to_string()),
            target_name: "nowhere".to_string(),
            kind: EdgeKind::Call,
            line: 3,
            source_file: "f.rs".to_string(),
        }];
        let mut dir = HashMap::new();
        dir.insert(10, "d".to_string());
        let mut path = HashMap::new();
        path.insert("f.rs".to_string(), 10);
        let edges = resolve_references(&refs, &index, &dir, &path);
        assert!(edges.is_empty());
    }

    #[test]
    fn file_edges_aggregate_by_pair_and_dominant_import_kind() {
        let edges = vec![
            roam_store::domain::EdgeRecord {
                source_symbol_id: 1,
                target_symbol_id: 2,
                kind: EdgeKind::Call,
                line: 5,
            },
            roam_store::domain::EdgeRecord {
                source_symbol_id: 1,
                target_symbol_id: 3,
                kind: EdgeKind::Import,
                line: 6,
            },
        ];
        let mut file_of = HashMap::new();
        file_of.insert(1, 100);
        file_of.insert(2, 200);
        file_of.insert(3, 200);
        let file_edges = aggregate_file_edges(&edges, &file_of);
        assert_eq!(file_edges.len(), 1);
        assert_eq!(file_edges[0].symbol_count, 2);
        assert_eq!(file_edges[0].kind, FileEdgeKind::Imports);
    }

    #[test]
    fn record_conversion_preserves_identity() {
        let r = record(7, 77, "x", SymbolKind::Struct, true);
        let rs = ResolverSymbol::from_record(&r, "dir");
        assert_eq!(rs.id, 7);
        assert_eq!(rs.file_id, 77);
        assert_eq!(rs.directory, "dir");
    }
}
