//! Indexing Pipeline (C11, spec §4.11).
//!
//! Orchestrates every other component into one run: discovery → change
//! detection → parse/extract → symbol insert → reference resolution →
//! complexity → graph construction → graph analytics → git mining →
//! file stats → snapshot. Analytics tables are stop-the-world: each run
//! recomputes them from every symbol/edge currently in the store, not
//! just the files that changed (spec §9 "Stop-the-world analytics").
//!
//! Parsing and extraction of distinct files are independent, so that
//! stage runs on a rayon pool; every store write funnels back through
//! this function on the calling thread, since `CodeIndexStore` has a
//! single-writer contract (spec §5).

pub mod lock;

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use petgraph::Direction;
use rayon::prelude::*;

use roam_store::domain::{
    ClusterAssignment, CodeIndexStore, ComplexityRecord, FileRecord, FileRole, FileStatsRecord,
    GitFileChange, Language, NewFile, NewSymbol, SymbolKind, SymbolMetricRecord,
};

use crate::features::change_detection;
use crate::features::complexity;
use crate::features::discovery;
use crate::features::extraction::{ExtractedSymbol, ExtractorRegistry, RawReference};
use crate::features::git_history::{self, GitMiningResult, PathCochange, PathHyperedge};
use crate::features::graph_analytics;
use crate::features::graph_builder;
use crate::features::resolution::{self, ResolverIndex, ResolverSymbol};
use crate::shared::config::{IndexConfig, RepoDescriptor};
use crate::shared::error::{CoreError, Result, RunSummary};
use crate::shared::hashing::sha256_hex;

use lock::LockGuard;

/// Result of one completed index run.
#[derive(Debug, Clone)]
pub struct IndexOutcome {
    pub summary: RunSummary,
    pub snapshot_id: i64,
    /// Directed modularity of the Louvain assignment (spec §4.10
    /// "cluster quality"); not persisted anywhere, reported for callers
    /// that want it without recomputing clusters themselves.
    pub cluster_modularity: f64,
}

/// One repo root participating in a run, with the stored-path prefix
/// workspace mode applies (spec §6 "`<alias>/<rel_path>`").
struct RepoSource {
    root: PathBuf,
    prefix: Option<String>,
}

impl RepoSource {
    fn stored_path(&self, rel: &str) -> String {
        match &self.prefix {
            Some(prefix) => format!("{prefix}/{rel}"),
            None => rel.to_string(),
        }
    }

    /// Strips this source's alias prefix from a stored path, returning
    /// `None` if the path belongs to a different repo.
    fn strip_prefix<'a>(&self, stored: &'a str) -> Option<&'a str> {
        match &self.prefix {
            Some(prefix) => stored.strip_prefix(prefix.as_str())?.strip_prefix('/'),
            None => Some(stored),
        }
    }
}

/// Indexes a single repo rooted at `root`. The lock is taken at `root`.
pub fn index_repo(
    store: &mut dyn CodeIndexStore,
    root: &Path,
    config: &IndexConfig,
) -> Result<IndexOutcome> {
    let sources = [RepoSource {
        root: root.to_path_buf(),
        prefix: None,
    }];
    run_pipeline(store, root, &sources, config)
}

/// Indexes a workspace of several repos under distinct aliases (spec §6
/// "Workspace configuration contract"). The lock is taken at
/// `lock_root`, since a workspace has no single natural repo root.
pub fn index_workspace(
    store: &mut dyn CodeIndexStore,
    lock_root: &Path,
    repos: &[RepoDescriptor],
    config: &IndexConfig,
) -> Result<IndexOutcome> {
    let sources: Vec<RepoSource> = repos
        .iter()
        .filter(|r| r.is_valid())
        .map(|r| RepoSource {
            root: r.root.clone(),
            prefix: Some(r.alias.clone()),
        })
        .collect();
    run_pipeline(store, lock_root, &sources, config)
}

/// Per-file extraction output, computed on the rayon pool and handed
/// back to the single-writer loop below.
struct ParsedFile {
    stored_path: String,
    new_file: NewFile,
    symbols: Vec<ExtractedSymbol>,
    references: Vec<RawReference>,
    /// Complexity rows keyed by the symbol's position in `symbols`
    /// (remapped to real ids once the store assigns them).
    complexities: Vec<ComplexityRecord>,
    no_grammar: bool,
    parse_failed: bool,
}

enum FileOutcome {
    Unreadable,
    Parsed(ParsedFile),
}

fn run_pipeline(
    store: &mut dyn CodeIndexStore,
    lock_root: &Path,
    sources: &[RepoSource],
    config: &IndexConfig,
) -> Result<IndexOutcome> {
    let _lock = LockGuard::acquire(lock_root)?;
    let mut summary = RunSummary::new();

    // -- 1. discover -----------------------------------------------------
    let mut current_stored: Vec<String> = Vec::new();
    let mut abs_path_of: HashMap<String, PathBuf> = HashMap::new();
    let mut source_of: HashMap<String, usize> = HashMap::new();
    for (idx, src) in sources.iter().enumerate() {
        for rel in discovery::discover_files(&src.root, config) {
            let stored = src.stored_path(&rel);
            abs_path_of.insert(stored.clone(), src.root.join(&rel));
            source_of.insert(stored.clone(), idx);
            current_stored.push(stored);
        }
    }
    current_stored.sort();
    current_stored.dedup();
    summary.files_discovered = current_stored.len() as u64;
    tracing::info!(files = summary.files_discovered, "discovery complete");

    // -- 2. change detection (or force truncate) --------------------------
    if config.force {
        store.truncate_content_tables()?;
    }
    let stored_files: Vec<FileRecord> = if config.force {
        Vec::new()
    } else {
        store.all_files()?
    };

    let mut added = Vec::new();
    let mut modified = Vec::new();
    let mut removed = Vec::new();
    let mut unchanged = Vec::new();

    if config.force {
        added = current_stored.clone();
    } else {
        for (idx, src) in sources.iter().enumerate() {
            let current_rel: Vec<String> = current_stored
                .iter()
                .filter(|p| source_of.get(*p) == Some(&idx))
                .filter_map(|p| src.strip_prefix(p).map(str::to_string))
                .collect();
            let stored_rel: Vec<FileRecord> = stored_files
                .iter()
                .filter_map(|f| {
                    src.strip_prefix(&f.path).map(|rel| FileRecord {
                        path: rel.to_string(),
                        ..f.clone()
                    })
                })
                .collect();
            let change = change_detection::detect_changes(
                &src.root,
                &current_rel,
                &stored_rel,
                change_detection::fs_mtime_ms,
                change_detection::fs_read_and_hash,
            );
            added.extend(change.added.into_iter().map(|p| src.stored_path(&p)));
            modified.extend(change.modified.into_iter().map(|p| src.stored_path(&p)));
            removed.extend(change.removed.into_iter().map(|p| src.stored_path(&p)));
            unchanged.extend(change.unchanged.into_iter().map(|p| src.stored_path(&p)));
        }
    }

    for path in removed.iter().chain(modified.iter()) {
        store.delete_file_by_path(path)?;
    }

    // -- 3. parse + extract added/modified files on the rayon pool --------
    let registry = ExtractorRegistry::new();
    let to_process: Vec<String> = added.iter().chain(modified.iter()).cloned().collect();

    let process = |stored_path: &String| -> FileOutcome {
        process_one_file(stored_path, &abs_path_of, &registry)
    };

    let results: Vec<FileOutcome> = match config.worker_threads {
        Some(n) => {
            let pool = rayon::ThreadPoolBuilder::new()
                .num_threads(n)
                .build()
                .map_err(|e| CoreError::Io(std::io::Error::other(e.to_string())))?;
            pool.install(|| to_process.par_iter().map(process).collect())
        }
        None => to_process.par_iter().map(process).collect(),
    };

    // -- 4. single-writer insert ------------------------------------------
    let mut global_references: Vec<RawReference> = Vec::new();
    let mut global_complexities: Vec<ComplexityRecord> = Vec::new();
    let mut complexity_values_by_file: HashMap<i64, Vec<f64>> = HashMap::new();

    for outcome in results {
        match outcome {
            FileOutcome::Unreadable => summary.record_unreadable_source(),
            FileOutcome::Parsed(parsed) => {
                if parsed.no_grammar {
                    summary.record_no_grammar();
                }
                if parsed.parse_failed {
                    summary.record_parse_failure();
                }

                let file_id = store.insert_file(&parsed.new_file)?;
                summary.files_indexed += 1;

                let new_symbols: Vec<NewSymbol> = parsed
                    .symbols
                    .iter()
                    .map(|s| to_new_symbol(s, file_id))
                    .collect();
                let ids = store.insert_symbols(&new_symbols)?;
                summary.symbols_indexed += ids.len() as u64;

                for mut record in parsed.complexities {
                    let placeholder = record.symbol_id as usize;
                    if let Some(&real_id) = ids.get(placeholder) {
                        record.symbol_id = real_id;
                        complexity_values_by_file
                            .entry(file_id)
                            .or_default()
                            .push(record.cognitive_complexity as f64);
                        global_complexities.push(record);
                    }
                }

                global_references.extend(parsed.references);
            }
        }
    }

    // -- 5. re-extract references (and recompute complexity) for every
    // unchanged file, since edges/metrics are rewritten wholesale below
    // (spec §4.11 step 5).
    for stored_path in &unchanged {
        reprocess_unchanged_file(
            stored_path,
            &abs_path_of,
            &registry,
            store,
            &mut summary,
            &mut global_references,
            &mut global_complexities,
            &mut complexity_values_by_file,
        )?;
    }

    store.replace_complexity(&global_complexities)?;

    // -- 6. reference resolution -------------------------------------------
    let all_symbols = store.all_symbols()?;
    let all_files = store.all_files()?;

    let file_path_of: HashMap<i64, String> =
        all_files.iter().map(|f| (f.id, f.path.clone())).collect();
    let directory_of_file: HashMap<i64, String> = all_files
        .iter()
        .map(|f| (f.id, directory_of_path(&f.path)))
        .collect();
    let file_id_of_path: HashMap<String, i64> =
        all_files.iter().map(|f| (f.path.clone(), f.id)).collect();
    let parent_ids: HashMap<i64, Option<i64>> =
        all_symbols.iter().map(|s| (s.id, s.parent_id)).collect();

    let resolver_symbols: Vec<ResolverSymbol> = all_symbols
        .iter()
        .map(|s| {
            let dir = directory_of_file.get(&s.file_id).cloned().unwrap_or_default();
            ResolverSymbol::from_record(s, &dir)
        })
        .collect();
    let index = ResolverIndex::build(&resolver_symbols, &parent_ids);

    let edges = resolution::resolve_references(
        &global_references,
        &index,
        &directory_of_file,
        &file_id_of_path,
    );
    summary.edges_resolved = edges.len() as u64;
    store.replace_edges(&edges)?;

    let file_id_of_symbol: HashMap<i64, i64> =
        all_symbols.iter().map(|s| (s.id, s.file_id)).collect();
    let file_edges = resolution::aggregate_file_edges(&edges, &file_id_of_symbol);
    store.replace_file_edges(&file_edges)?;

    // -- 7. graph construction + analytics ---------------------------------
    let symbol_graph = graph_builder::build_symbol_graph(&all_symbols, &edges, &file_path_of);
    let scc = graph_analytics::tarjan_scc(&symbol_graph.graph);
    let pagerank = graph_analytics::pagerank(&symbol_graph.graph, &scc);
    let betweenness = graph_analytics::betweenness(&symbol_graph.graph);

    let mut metric_rows = Vec::with_capacity(symbol_graph.graph.node_count());
    for node in symbol_graph.graph.node_indices() {
        let symbol_id = symbol_graph.graph[node].symbol_id;
        let in_degree = symbol_graph
            .graph
            .edges_directed(node, Direction::Incoming)
            .count() as i64;
        let out_degree = symbol_graph
            .graph
            .edges_directed(node, Direction::Outgoing)
            .count() as i64;
        metric_rows.push(SymbolMetricRecord {
            symbol_id,
            pagerank: *pagerank.get(&node).unwrap_or(&0.0),
            in_degree,
            out_degree,
            betweenness: *betweenness.get(&node).unwrap_or(&0.0),
        });
    }
    store.replace_symbol_metrics(&metric_rows)?;

    let clusters = graph_analytics::louvain(&symbol_graph.graph);
    let labels = graph_analytics::label_clusters(&symbol_graph, &clusters, &pagerank);
    let modularity = graph_analytics::directed_modularity(&symbol_graph.graph, &clusters);
    tracing::info!(modularity, clusters = labels.len(), "graph analytics complete");

    let cluster_rows: Vec<ClusterAssignment> = clusters
        .iter()
        .map(|(node, cluster_id)| ClusterAssignment {
            symbol_id: symbol_graph.graph[*node].symbol_id,
            cluster_id: *cluster_id as i64,
            cluster_label: labels.get(cluster_id).cloned().unwrap_or_default(),
        })
        .collect();
    store.replace_clusters(&cluster_rows)?;

    // -- 8. git mining (best-effort, per repo source) ----------------------
    let mut all_cochange_pairs = Vec::new();
    let mut all_hyperedge_members = Vec::new();
    let mut git_stats_by_file: HashMap<i64, FileStatsRecord> = HashMap::new();

    for src in sources {
        match git_history::mine(
            &src.root,
            config.git_commit_limit,
            Duration::from_secs(config.git_log_timeout_secs),
        ) {
            Some(result) => {
                let known = store.known_commit_hashes()?;
                let new_commits: Vec<_> = result
                    .commits
                    .iter()
                    .filter(|c| !known.contains(&c.hash))
                    .cloned()
                    .collect();
                let new_changes: Vec<GitFileChange> = result
                    .file_changes
                    .iter()
                    .filter(|c| !known.contains(&c.commit_hash))
                    .map(|c| {
                        let stored_path = src.stored_path(&c.path);
                        let file_id = file_id_of_path.get(&stored_path).copied();
                        GitFileChange {
                            commit_hash: c.commit_hash.clone(),
                            file_id,
                            path: stored_path,
                            lines_added: c.lines_added,
                            lines_removed: c.lines_removed,
                        }
                    })
                    .collect();
                store.insert_commits(&new_commits)?;
                store.insert_file_changes(&new_changes)?;

                let prefixed = prefix_git_result(&result, src);
                let (cochange, hyperedges, file_stats) =
                    git_history::resolve_file_ids(&prefixed, &file_id_of_path);
                all_cochange_pairs.extend(cochange);
                all_hyperedge_members.extend(hyperedges);
                for stat in file_stats {
                    git_stats_by_file.insert(stat.file_id, stat);
                }
            }
            None => summary.record_git_unavailable(),
        }
    }
    store.replace_cochange(&all_cochange_pairs)?;
    store.replace_hyperedges(&all_hyperedge_members)?;

    // -- 9. file stats: merge churn (git) with average complexity ----------
    let final_file_stats: Vec<FileStatsRecord> = all_files
        .iter()
        .map(|f| {
            let existing = git_stats_by_file.get(&f.id).copied().unwrap_or_default();
            let complexity = complexity_values_by_file
                .get(&f.id)
                .map(|values| values.iter().sum::<f64>() / values.len() as f64)
                .unwrap_or(0.0);
            FileStatsRecord {
                file_id: f.id,
                complexity: round4(complexity),
                ..existing
            }
        })
        .collect();
    store.replace_file_stats(&final_file_stats)?;

    // -- 10. snapshot --------------------------------------------------------
    let snapshot_id = store.record_snapshot(config.force, chrono::Utc::now().timestamp())?;
    tracing::info!(line = %summary.summary_line(), "index run complete");

    Ok(IndexOutcome {
        summary,
        snapshot_id,
        cluster_modularity: modularity,
    })
}

fn process_one_file(
    stored_path: &str,
    abs_path_of: &HashMap<String, PathBuf>,
    registry: &ExtractorRegistry,
) -> FileOutcome {
    let abs = &abs_path_of[stored_path];
    let bytes = match std::fs::read(abs) {
        Ok(b) => b,
        Err(_) => return FileOutcome::Unreadable,
    };
    let content = String::from_utf8_lossy(&bytes).into_owned();
    let hash = sha256_hex(&bytes);
    let mtime = change_detection::fs_mtime_ms(abs).unwrap_or(0);
    let language = crate::features::parsing::language_for_path(stored_path);
    let role = classify_file_role(stored_path, language);
    let outcome = crate::features::parsing::parse(language, &content);
    let line_count = content.lines().count() as i64;

    let new_file = NewFile {
        path: stored_path.to_string(),
        language,
        file_role: role,
        content_hash: hash,
        mtime,
        line_count,
    };

    let mut symbols = Vec::new();
    let mut references = Vec::new();
    let mut complexities = Vec::new();
    let mut parse_failed = false;
    let mut no_grammar = false;

    match &outcome.tree {
        Some(tree) => match registry.get(outcome.effective_language) {
            Some(extractor) => {
                symbols = extractor.extract_symbols(tree, &outcome.effective_source, stored_path);
                references =
                    extractor.extract_references(tree, &outcome.effective_source, stored_path);
                for (idx, symbol) in symbols.iter().enumerate() {
                    if is_measured(symbol.kind) {
                        complexities.push(measure_symbol(
                            idx as i64,
                            tree.root_node(),
                            &outcome.effective_source,
                            symbol,
                        ));
                    }
                }
            }
            None => no_grammar = true,
        },
        None => {
            if matches!(language, Language::PlainText | Language::Unknown) {
                no_grammar = true;
            } else {
                parse_failed = true;
            }
        }
    }

    if language == Language::Vue {
        references.extend(crate::features::extraction::vue_template::extract_template_references(
            &content,
            stored_path,
        ));
    }

    FileOutcome::Parsed(ParsedFile {
        stored_path: stored_path.to_string(),
        new_file,
        symbols,
        references,
        complexities,
        no_grammar,
        parse_failed,
    })
}

#[allow(clippy::too_many_arguments)]
fn reprocess_unchanged_file(
    stored_path: &str,
    abs_path_of: &HashMap<String, PathBuf>,
    registry: &ExtractorRegistry,
    store: &mut dyn CodeIndexStore,
    summary: &mut RunSummary,
    global_references: &mut Vec<RawReference>,
    global_complexities: &mut Vec<ComplexityRecord>,
    complexity_values_by_file: &mut HashMap<i64, Vec<f64>>,
) -> Result<()> {
    let Some(abs) = abs_path_of.get(stored_path) else {
        return Ok(());
    };
    let Ok(bytes) = std::fs::read(abs) else {
        summary.record_unreadable_source();
        return Ok(());
    };
    let content = String::from_utf8_lossy(&bytes).into_owned();
    let language = crate::features::parsing::language_for_path(stored_path);
    let outcome = crate::features::parsing::parse(language, &content);

    let Some(file_record) = store.file_by_path(stored_path)? else {
        return Ok(());
    };

    let Some(tree) = &outcome.tree else {
        if !matches!(language, Language::PlainText | Language::Unknown) {
            summary.record_parse_failure();
        }
        return Ok(());
    };
    let Some(extractor) = registry.get(outcome.effective_language) else {
        summary.record_no_grammar();
        return Ok(());
    };

    global_references.extend(extractor.extract_references(
        tree,
        &outcome.effective_source,
        stored_path,
    ));
    if language == Language::Vue {
        global_references.extend(crate::features::extraction::vue_template::extract_template_references(
            &content,
            stored_path,
        ));
    }

    for symbol in store.symbols_by_file(file_record.id)? {
        if is_measured(symbol.kind) {
            let param_count = estimate_param_count(&symbol.signature);
            let record = complexity::analyze_symbol(
                symbol.id,
                tree.root_node(),
                &outcome.effective_source,
                symbol.line_start,
                symbol.line_end,
                param_count,
            )
            .unwrap_or_else(|| {
                let slice = slice_lines(&outcome.effective_source, symbol.line_start, symbol.line_end);
                complexity::analyze_source_fallback(symbol.id, &slice, param_count)
            });
            complexity_values_by_file
                .entry(file_record.id)
                .or_default()
                .push(record.cognitive_complexity as f64);
            global_complexities.push(record);
        }
    }

    Ok(())
}

fn is_measured(kind: SymbolKind) -> bool {
    kind.is_callable() || kind == SymbolKind::Property
}

fn measure_symbol(
    placeholder_id: i64,
    root: tree_sitter::Node,
    source: &str,
    symbol: &ExtractedSymbol,
) -> ComplexityRecord {
    let param_count = estimate_param_count(&symbol.signature);
    complexity::analyze_symbol(placeholder_id, root, source, symbol.line_start, symbol.line_end, param_count)
        .unwrap_or_else(|| {
            let slice = slice_lines(source, symbol.line_start, symbol.line_end);
            complexity::analyze_source_fallback(placeholder_id, &slice, param_count)
        })
}

fn to_new_symbol(symbol: &ExtractedSymbol, file_id: i64) -> NewSymbol {
    NewSymbol {
        file_id,
        name: symbol.name.clone(),
        qualified_name: symbol.qualified_name.clone(),
        kind: symbol.kind,
        signature: symbol.signature.clone(),
        line_start: symbol.line_start,
        line_end: symbol.line_end,
        docstring: symbol.docstring.clone(),
        visibility: symbol.visibility,
        is_exported: symbol.is_exported,
        parent_name: symbol.parent_name.clone(),
        default_value: symbol.default_value.clone(),
    }
}

/// Counts top-level parameters in a signature's parenthesized portion.
/// A heuristic, not a parse: good enough for the complexity analyzer's
/// `param_count` term, which only needs an order-of-magnitude count.
fn estimate_param_count(signature: &Option<String>) -> i64 {
    let Some(sig) = signature else { return 0 };
    let Some(open) = sig.find('(') else { return 0 };
    let rest = &sig[open + 1..];

    let mut depth = 0i32;
    let mut end = rest.len();
    for (i, c) in rest.char_indices() {
        match c {
            '(' | '[' | '<' | '{' => depth += 1,
            ')' if depth == 0 => {
                end = i;
                break;
            }
            ')' | ']' | '>' | '}' => depth -= 1,
            _ => {}
        }
    }

    let params = rest[..end].trim();
    if params.is_empty() {
        return 0;
    }

    let mut count = 1i64;
    let mut depth = 0i32;
    for c in params.chars() {
        match c {
            '(' | '[' | '<' | '{' => depth += 1,
            ')' | ']' | '>' | '}' => depth -= 1,
            ',' if depth == 0 => count += 1,
            _ => {}
        }
    }
    count
}

/// Slices 1-indexed inclusive line range `[line_start, line_end]` out of
/// `source`, for the degraded complexity fallback.
fn slice_lines(source: &str, line_start: i64, line_end: i64) -> String {
    let start = (line_start.max(1) - 1) as usize;
    let end = line_end.max(line_start).max(0) as usize;
    source
        .lines()
        .skip(start)
        .take(end.saturating_sub(start))
        .collect::<Vec<_>>()
        .join("\n")
}

fn directory_of_path(path: &str) -> String {
    match path.rfind('/') {
        Some(idx) => path[..idx].to_string(),
        None => String::new(),
    }
}

fn round4(value: f64) -> f64 {
    (value * 10_000.0).round() / 10_000.0
}

/// Classifies a discovered file's role (spec §3 "File.file_role").
/// There is no dedicated component for this in the spec's component
/// table; it is a small path/language heuristic the pipeline applies
/// itself at insert time.
fn classify_file_role(path: &str, language: Language) -> FileRole {
    let lower = path.to_ascii_lowercase();

    let looks_like_test = lower.contains("/test/")
        || lower.contains("/tests/")
        || lower.contains("__tests__")
        || lower.starts_with("test_")
        || lower.contains("/test_")
        || lower.ends_with("_test.go")
        || lower.ends_with("_test.py")
        || lower.ends_with("_test.rs")
        || lower.ends_with(".test.ts")
        || lower.ends_with(".test.js")
        || lower.ends_with(".test.tsx")
        || lower.ends_with(".spec.ts")
        || lower.ends_with(".spec.js");
    if looks_like_test {
        return FileRole::Test;
    }

    if lower.contains("/generated/") || lower.ends_with(".pb.go") || lower.ends_with("_pb2.py") {
        return FileRole::Generated;
    }

    match language {
        Language::PlainText => {
            if lower.ends_with(".md") || lower.ends_with(".markdown") || lower.ends_with(".txt") {
                FileRole::Doc
            } else {
                FileRole::Config
            }
        }
        Language::Unknown => FileRole::Other,
        _ => FileRole::Source,
    }
}

/// Re-keys a mined [`GitMiningResult`]'s paths under this source's
/// stored-path prefix, so `resolve_file_ids` can look them up against
/// the workspace-wide `file_id_of_path` map.
fn prefix_git_result(result: &GitMiningResult, src: &RepoSource) -> GitMiningResult {
    GitMiningResult {
        commits: Vec::new(),
        file_changes: Vec::new(),
        cochange: result
            .cochange
            .iter()
            .map(|pc| PathCochange {
                path_a: src.stored_path(&pc.path_a),
                path_b: src.stored_path(&pc.path_b),
                count: pc.count,
            })
            .collect(),
        hyperedges: result
            .hyperedges
            .iter()
            .map(|he| PathHyperedge {
                commit_hash: he.commit_hash.clone(),
                member_paths: he.member_paths.iter().map(|p| src.stored_path(p)).collect(),
            })
            .collect(),
        file_stats_by_path: result
            .file_stats_by_path
            .iter()
            .map(|(path, stats)| (src.stored_path(path), *stats))
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use roam_store::infrastructure::sqlite::SqliteStore;
    use std::fs;

    fn write(dir: &tempfile::TempDir, name: &str, content: &str) {
        fs::write(dir.path().join(name), content).unwrap();
    }

    #[test]
    fn indexes_two_files_and_resolves_a_cross_file_call() {
        let dir = tempfile::tempdir().unwrap();
        write(
            &dir,
            "a.rs",
            "pub fn call_b() {\n    b_helper();\n}\n",
        );
        write(&dir, "b.rs", "pub fn b_helper() -> i32 {\n    42\n}\n");

        let mut store = SqliteStore::open_in_memory().unwrap();
        let outcome = index_repo(&mut store, dir.path(), &IndexConfig::default()).unwrap();

        assert_eq!(outcome.summary.files_indexed, 2);
        assert_eq!(outcome.summary.symbols_indexed, 2);

        let edges = store.all_edges().unwrap();
        assert_eq!(edges.len(), 1);

        let file_edges = store.all_file_edges().unwrap();
        assert_eq!(file_edges.len(), 1);
        assert_eq!(file_edges[0].symbol_count, 1);
    }

    #[test]
    fn single_isolated_symbol_has_pagerank_one() {
        let dir = tempfile::tempdir().unwrap();
        write(&dir, "only.rs", "pub fn lonely() {}\n");

        let mut store = SqliteStore::open_in_memory().unwrap();
        index_repo(&mut store, dir.path(), &IndexConfig::default()).unwrap();

        let metrics = store.all_symbol_metrics().unwrap();
        assert_eq!(metrics.len(), 1);
        assert!((metrics[0].pagerank - 1.0).abs() < 1e-9);
    }

    #[test]
    fn force_reindex_is_idempotent_on_an_unchanged_tree() {
        let dir = tempfile::tempdir().unwrap();
        write(&dir, "a.rs", "pub fn one() {}\n");

        let mut store = SqliteStore::open_in_memory().unwrap();
        index_repo(&mut store, dir.path(), &IndexConfig::default()).unwrap();
        let second = index_repo(&mut store, dir.path(), &IndexConfig::forced()).unwrap();

        assert_eq!(second.summary.files_indexed, 1);
        assert_eq!(store.all_files().unwrap().len(), 1);
        assert_eq!(store.all_symbols().unwrap().len(), 1);
    }

    #[test]
    fn unchanged_file_edges_survive_a_second_run() {
        let dir = tempfile::tempdir().unwrap();
        write(&dir, "a.rs", "pub fn call_b() {\n    b_helper();\n}\n");
        write(&dir, "b.rs", "pub fn b_helper() -> i32 {\n    42\n}\n");

        let mut store = SqliteStore::open_in_memory().unwrap();
        index_repo(&mut store, dir.path(), &IndexConfig::default()).unwrap();
        // Second run: nothing changed on disk, so both files land in
        // `unchanged`. Edges must still be present afterward.
        index_repo(&mut store, dir.path(), &IndexConfig::default()).unwrap();

        let edges = store.all_edges().unwrap();
        assert_eq!(edges.len(), 1);
    }

    #[test]
    fn workspace_mode_prefixes_stored_paths_by_alias() {
        let repo_a = tempfile::tempdir().unwrap();
        let repo_b = tempfile::tempdir().unwrap();
        write(&repo_a, "x.rs", "pub fn in_a() {}\n");
        write(&repo_b, "y.rs", "pub fn in_b() {}\n");

        let repos = vec![
            RepoDescriptor::new("svc-a", repo_a.path()),
            RepoDescriptor::new("svc-b", repo_b.path()),
        ];

        let mut store = SqliteStore::open_in_memory().unwrap();
        let lock_root = tempfile::tempdir().unwrap();
        index_workspace(&mut store, lock_root.path(), &repos, &IndexConfig::default()).unwrap();

        let mut paths: Vec<String> = store.all_files().unwrap().into_iter().map(|f| f.path).collect();
        paths.sort();
        assert_eq!(paths, vec!["svc-a/x.rs".to_string(), "svc-b/y.rs".to_string()]);
    }

    #[test]
    fn classify_file_role_matches_path_and_language_heuristics() {
        assert_eq!(
            classify_file_role("src/foo_test.rs", Language::Rust),
            FileRole::Test
        );
        assert_eq!(
            classify_file_role("tests/integration.rs", Language::Rust),
            FileRole::Test
        );
        assert_eq!(
            classify_file_role("Cargo.toml", Language::PlainText),
            FileRole::Config
        );
        assert_eq!(
            classify_file_role("README.md", Language::PlainText),
            FileRole::Doc
        );
        assert_eq!(
            classify_file_role("src/lib.rs", Language::Rust),
            FileRole::Source
        );
    }

    #[test]
    fn estimate_param_count_handles_generics_and_empty_lists() {
        assert_eq!(estimate_param_count(&None), 0);
        assert_eq!(estimate_param_count(&Some("fn f()".to_string())), 0);
        assert_eq!(estimate_param_count(&Some("fn f(a: i32)".to_string())), 1);
        assert_eq!(
            estimate_param_count(&Some("fn f(a: i32, b: Vec<(i32, i32)>)".to_string())),
            2
        );
    }

    #[test]
    fn removed_file_drops_its_symbols_on_next_run() {
        let dir = tempfile::tempdir().unwrap();
        write(&dir, "a.rs", "pub fn gone() {}\n");

        let mut store = SqliteStore::open_in_memory().unwrap();
        index_repo(&mut store, dir.path(), &IndexConfig::default()).unwrap();
        assert_eq!(store.all_symbols().unwrap().len(), 1);

        fs::remove_file(dir.path().join("a.rs")).unwrap();
        index_repo(&mut store, dir.path(), &IndexConfig::default()).unwrap();
        assert!(store.all_symbols().unwrap().is_empty());
        assert!(store.all_files().unwrap().is_empty());
    }
}
