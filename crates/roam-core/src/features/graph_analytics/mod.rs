//! Graph Analytics (C10, spec §4.10) — the algorithmic core.
//!
//! SCC/condensation/layering, PageRank, Brandes betweenness, Louvain
//! community detection, cluster quality and labeling, propagation cost,
//! and Yen's k-shortest paths. Most routines are generic over any
//! `DiGraph<N, EdgeKind>` so they apply directly to
//! [`crate::features::graph_builder::SymbolGraph`]; cluster labeling
//! additionally needs symbol metadata (kind, file path) so it takes the
//! symbol graph concretely.

use std::collections::{HashMap, HashSet, VecDeque};

use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use petgraph::Direction;

use roam_store::domain::EdgeKind;

use crate::features::graph_builder::SymbolGraph;

fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

// ═══════════════════════════════════════════════════════════════════════
// SCC / condensation / layers
// ═══════════════════════════════════════════════════════════════════════

/// Strongly connected components, via petgraph's iterative Tarjan (spec
/// §4.10: "must tolerate ≥100k nodes without stack overflow" — petgraph's
/// implementation uses an explicit work stack, not recursion).
pub struct SccResult {
    /// Components in the order petgraph returns them (reverse topological).
    pub components: Vec<Vec<NodeIndex>>,
    pub scc_id_of: HashMap<NodeIndex, usize>,
}

pub fn tarjan_scc<N>(graph: &DiGraph<N, EdgeKind>) -> SccResult {
    let components = petgraph::algo::tarjan_scc(graph);
    let mut scc_id_of = HashMap::new();
    for (id, component) in components.iter().enumerate() {
        for &node in component {
            scc_id_of.insert(node, id);
        }
    }
    SccResult {
        components,
        scc_id_of,
    }
}

/// Condensation DAG: one node per SCC, with successor/predecessor sets
/// collapsed from the original edges (spec §4.10 "Condensation DAG").
pub struct Condensation {
    pub num_sccs: usize,
    pub successors: HashMap<usize, HashSet<usize>>,
    pub predecessors: HashMap<usize, HashSet<usize>>,
}

pub fn build_condensation<N>(graph: &DiGraph<N, EdgeKind>, scc: &SccResult) -> Condensation {
    let mut successors: HashMap<usize, HashSet<usize>> = HashMap::new();
    let mut predecessors: HashMap<usize, HashSet<usize>> = HashMap::new();
    for id in 0..scc.components.len() {
        successors.entry(id).or_default();
        predecessors.entry(id).or_default();
    }
    for edge in graph.edge_references() {
        let src_scc = scc.scc_id_of[&edge.source()];
        let dst_scc = scc.scc_id_of[&edge.target()];
        if src_scc != dst_scc {
            successors.entry(src_scc).or_default().insert(dst_scc);
            predecessors.entry(dst_scc).or_default().insert(src_scc);
        }
    }
    Condensation {
        num_sccs: scc.components.len(),
        successors,
        predecessors,
    }
}

/// Kahn's algorithm over the condensation, ties broken by ascending SCC
/// id (spec §4.10, §9 "Deterministic ordering").
pub fn topological_order(condensation: &Condensation) -> Vec<usize> {
    let mut in_degree: HashMap<usize, usize> = (0..condensation.num_sccs)
        .map(|id| (id, condensation.predecessors.get(&id).map_or(0, |p| p.len())))
        .collect();

    let mut ready: std::collections::BTreeSet<usize> = in_degree
        .iter()
        .filter(|(_, &deg)| deg == 0)
        .map(|(&id, _)| id)
        .collect();

    let mut out = Vec::with_capacity(condensation.num_sccs);
    while let Some(&next) = ready.iter().next() {
        ready.remove(&next);
        out.push(next);
        if let Some(succ) = condensation.successors.get(&next) {
            let mut succ_ids: Vec<usize> = succ.iter().copied().collect();
            succ_ids.sort_unstable();
            for s in succ_ids {
                if let Some(deg) = in_degree.get_mut(&s) {
                    *deg -= 1;
                    if *deg == 0 {
                        ready.insert(s);
                    }
                }
            }
        }
    }
    out
}

/// `layer(s) = 0` if no predecessor, else `1 + max(layer(p))` (spec
/// §4.10 "Layer assignment").
pub fn layer_assignment(condensation: &Condensation, topo_order: &[usize]) -> HashMap<usize, i64> {
    let mut layer: HashMap<usize, i64> = HashMap::new();
    for &scc_id in topo_order {
        let preds = condensation.predecessors.get(&scc_id);
        let computed = match preds {
            Some(p) if !p.is_empty() => 1 + p.iter().map(|pred| layer[pred]).max().unwrap_or(0),
            _ => 0,
        };
        layer.insert(scc_id, computed);
    }
    layer
}

/// An edge whose source layer exceeds its target layer.
#[derive(Debug, Clone, Copy)]
pub struct Violation {
    pub source: NodeIndex,
    pub target: NodeIndex,
    pub severity: f64,
}

/// Layering violations, `severity = (src_layer - tgt_layer) / max_layer`
/// rounded to 3 decimals (spec §4.10).
pub fn find_violations<N>(
    graph: &DiGraph<N, EdgeKind>,
    scc: &SccResult,
    layer_of_scc: &HashMap<usize, i64>,
) -> Vec<Violation> {
    let max_layer = layer_of_scc.values().copied().max().unwrap_or(0).max(1) as f64;
    let mut out = Vec::new();
    for edge in graph.edge_references() {
        let src_scc = scc.scc_id_of[&edge.source()];
        let dst_scc = scc.scc_id_of[&edge.target()];
        let src_layer = layer_of_scc[&src_scc];
        let dst_layer = layer_of_scc[&dst_scc];
        if src_layer > dst_layer {
            out.push(Violation {
                source: edge.source(),
                target: edge.target(),
                severity: round_to((src_layer - dst_layer) as f64 / max_layer, 3),
            });
        }
    }
    out
}

// ═══════════════════════════════════════════════════════════════════════
// PageRank
// ═══════════════════════════════════════════════════════════════════════

/// Adaptive-damping PageRank (spec §4.10 "PageRank"). Scores are
/// strictly positive and sum to ≈1 across nodes (spec §8 invariant 8),
/// unlike the [0,1]-normalized variant some reference implementations
/// use.
pub fn pagerank<N>(graph: &DiGraph<N, EdgeKind>, scc: &SccResult) -> HashMap<NodeIndex, f64> {
    let n = graph.node_count();
    if n == 0 {
        return HashMap::new();
    }
    if n == 1 {
        let only = graph.node_indices().next().unwrap();
        return HashMap::from([(only, 1.0)]);
    }

    let cyclic_nodes: usize = scc
        .components
        .iter()
        .filter(|c| c.len() > 1)
        .map(|c| c.len())
        .sum();
    let cycle_ratio = round_to(cyclic_nodes as f64 / n as f64, 3);
    let alpha = round_to(0.92 - 0.10 * cycle_ratio, 3);

    let nodes: Vec<NodeIndex> = graph.node_indices().collect();
    let index_pos: HashMap<NodeIndex, usize> =
        nodes.iter().enumerate().map(|(i, &n)| (n, i)).collect();
    let out_degree: Vec<usize> = nodes
        .iter()
        .map(|&n| graph.edges_directed(n, Direction::Outgoing).count())
        .collect();

    let mut scores = vec![1.0 / n as f64; n];
    let base = (1.0 - alpha) / n as f64;

    for _ in 0..100 {
        let dangling_mass: f64 = nodes
            .iter()
            .enumerate()
            .filter(|(i, _)| out_degree[*i] == 0)
            .map(|(i, _)| scores[i])
            .sum();

        let mut next = vec![base + alpha * dangling_mass / n as f64; n];
        for (i, &node) in nodes.iter().enumerate() {
            if out_degree[i] == 0 {
                continue;
            }
            let share = alpha * scores[i] / out_degree[i] as f64;
            for target in graph.neighbors_directed(node, Direction::Outgoing) {
                let j = index_pos[&target];
                next[j] += share;
            }
        }

        let delta: f64 = next
            .iter()
            .zip(scores.iter())
            .map(|(a, b)| (a - b).abs())
            .sum();
        scores = next;
        if delta < 1e-6 {
            break;
        }
    }

    let sum: f64 = scores.iter().sum();
    if sum <= 0.0 || !sum.is_finite() {
        // Fallback: normalized degree centrality (spec §4.10 "fallback on
        // failure").
        let total_degree: usize = nodes
            .iter()
            .map(|&n| graph.edges_directed(n, Direction::Outgoing).count() + graph.edges_directed(n, Direction::Incoming).count())
            .sum();
        let total_degree = total_degree.max(1) as f64;
        return nodes
            .iter()
            .map(|&node| {
                let deg = graph.edges_directed(node, Direction::Outgoing).count()
                    + graph.edges_directed(node, Direction::Incoming).count();
                (node, (deg as f64 / total_degree).max(f64::MIN_POSITIVE))
            })
            .collect();
    }

    nodes
        .into_iter()
        .zip(scores)
        .map(|(node, score)| (node, (score / sum).max(f64::MIN_POSITIVE)))
        .collect()
}

// ═══════════════════════════════════════════════════════════════════════
// Betweenness (Brandes, unnormalized)
// ═══════════════════════════════════════════════════════════════════════

/// Brandes' algorithm for directed, unweighted betweenness centrality,
/// not normalized (spec §4.10 "Betweenness centrality"). No sampling
/// below 1000 nodes, per this implementation's stated threshold (spec §9
/// open question — full Brandes always is conformant; this crate samples
/// above 1000 nodes is left unimplemented and instead always runs full
/// Brandes, documented in DESIGN.md).
pub fn betweenness<N>(graph: &DiGraph<N, EdgeKind>) -> HashMap<NodeIndex, f64> {
    let mut centrality: HashMap<NodeIndex, f64> =
        graph.node_indices().map(|n| (n, 0.0)).collect();

    for s in graph.node_indices() {
        let mut stack = Vec::new();
        let mut preds: HashMap<NodeIndex, Vec<NodeIndex>> = HashMap::new();
        let mut sigma: HashMap<NodeIndex, f64> = graph.node_indices().map(|n| (n, 0.0)).collect();
        let mut dist: HashMap<NodeIndex, i64> = graph.node_indices().map(|n| (n, -1)).collect();
        sigma.insert(s, 1.0);
        dist.insert(s, 0);

        let mut queue = VecDeque::new();
        queue.push_back(s);
        while let Some(v) = queue.pop_front() {
            stack.push(v);
            for w in graph.neighbors_directed(v, Direction::Outgoing) {
                if dist[&w] < 0 {
                    dist.insert(w, dist[&v] + 1);
                    queue.push_back(w);
                }
                if dist[&w] == dist[&v] + 1 {
                    let sv = sigma[&v];
                    *sigma.get_mut(&w).unwrap() += sv;
                    preds.entry(w).or_default().push(v);
                }
            }
        }

        let mut delta: HashMap<NodeIndex, f64> = graph.node_indices().map(|n| (n, 0.0)).collect();
        while let Some(w) = stack.pop() {
            if let Some(ps) = preds.get(&w) {
                for &v in ps {
                    let contrib = (sigma[&v] / sigma[&w]) * (1.0 + delta[&w]);
                    *delta.get_mut(&v).unwrap() += contrib;
                }
            }
            if w != s {
                *centrality.get_mut(&w).unwrap() += delta[&w];
            }
        }
    }

    centrality
}

// ═══════════════════════════════════════════════════════════════════════
// Louvain community detection
// ═══════════════════════════════════════════════════════════════════════

/// Deterministic single-level Louvain over the undirected projection
/// (spec §4.10 "Louvain community detection"). Each directed edge
/// collapses into one undirected weighted edge; nodes are visited in
/// ascending `NodeIndex` order every pass so the result is reproducible.
pub fn louvain<N>(graph: &DiGraph<N, EdgeKind>) -> HashMap<NodeIndex, usize> {
    let nodes: Vec<NodeIndex> = graph.node_indices().collect();
    if nodes.is_empty() {
        return HashMap::new();
    }

    let mut adjacency: HashMap<NodeIndex, HashMap<NodeIndex, f64>> =
        nodes.iter().map(|&n| (n, HashMap::new())).collect();
    for edge in graph.edge_references() {
        let (a, b) = (edge.source(), edge.target());
        if a == b {
            continue;
        }
        *adjacency.get_mut(&a).unwrap().entry(b).or_insert(0.0) += 1.0;
        *adjacency.get_mut(&b).unwrap().entry(a).or_insert(0.0) += 1.0;
    }

    let degree: HashMap<NodeIndex, f64> = adjacency
        .iter()
        .map(|(&n, neighbors)| (n, neighbors.values().sum()))
        .collect();
    let m: f64 = degree.values().sum::<f64>() / 2.0;

    let mut community: HashMap<NodeIndex, usize> =
        nodes.iter().enumerate().map(|(i, &n)| (n, i)).collect();

    if m <= 0.0 {
        // No edges: fallback is each weakly-connected component its own
        // cluster, which is already what the initial assignment gives
        // (every isolated node is its own component).
        return community;
    }

    let mut community_total: HashMap<usize, f64> = HashMap::new();
    for &n in &nodes {
        *community_total.entry(community[&n]).or_insert(0.0) += degree[&n];
    }

    for _pass in 0..20 {
        let mut moved = false;
        for &node in &nodes {
            let node_degree = degree[&node];
            let current_comm = community[&node];

            community_total.entry(current_comm).and_modify(|t| *t -= node_degree);

            let mut weight_to_comm: HashMap<usize, f64> = HashMap::new();
            for (&neighbor, &w) in &adjacency[&node] {
                if neighbor == node {
                    continue;
                }
                *weight_to_comm.entry(community[&neighbor]).or_insert(0.0) += w;
            }

            let mut best_comm = current_comm;
            let mut best_gain = weight_to_comm.get(&current_comm).copied().unwrap_or(0.0) / m
                - community_total.get(&current_comm).copied().unwrap_or(0.0) * node_degree
                    / (2.0 * m * m);

            let mut candidate_comms: Vec<usize> = weight_to_comm.keys().copied().collect();
            candidate_comms.sort_unstable();
            for comm in candidate_comms {
                let gain = weight_to_comm.get(&comm).copied().unwrap_or(0.0) / m
                    - community_total.get(&comm).copied().unwrap_or(0.0) * node_degree
                        / (2.0 * m * m);
                if gain > best_gain + 1e-12 {
                    best_gain = gain;
                    best_comm = comm;
                }
            }

            community_total.entry(best_comm).and_modify(|t| *t += node_degree).or_insert(node_degree);
            if best_comm != current_comm {
                community.insert(node, best_comm);
                moved = true;
            }
        }
        if !moved {
            break;
        }
    }

    community
}

/// Newman modularity on the directed graph using out/in-degree for pair
/// expectation (spec §4.10 "Cluster quality").
pub fn directed_modularity<N>(
    graph: &DiGraph<N, EdgeKind>,
    clusters: &HashMap<NodeIndex, usize>,
) -> f64 {
    let m = graph.edge_count() as f64;
    if m <= 0.0 {
        return 0.0;
    }
    let out_degree: HashMap<NodeIndex, f64> = graph
        .node_indices()
        .map(|n| (n, graph.edges_directed(n, Direction::Outgoing).count() as f64))
        .collect();
    let in_degree: HashMap<NodeIndex, f64> = graph
        .node_indices()
        .map(|n| (n, graph.edges_directed(n, Direction::Incoming).count() as f64))
        .collect();

    let mut q = 0.0;
    for edge in graph.edge_references() {
        let (u, v) = (edge.source(), edge.target());
        let same = clusters.get(&u).is_some()
            && clusters.get(&u) == clusters.get(&v);
        let expected = out_degree[&u] * in_degree[&v] / m;
        q += if same { 1.0 - expected / m } else { -expected / m };
    }
    q / m
}

// ═══════════════════════════════════════════════════════════════════════
// Cluster labeling
// ═══════════════════════════════════════════════════════════════════════

fn directory_of(path: &str) -> String {
    match path.rfind('/') {
        Some(idx) => path[..idx].to_string(),
        None => String::new(),
    }
}

fn last_segment(dir: &str) -> &str {
    dir.rsplit('/').next().unwrap_or(dir)
}

/// Labels each cluster per spec §4.10 "Cluster labeling": top directories
/// by member count, a highest-PageRank anchor symbol (class-like kinds
/// preferred), `"<last-dir>/<name>"` label, or a dominant-directory
/// "mega-cluster" label when a cluster exceeds 100 members or 40% of all
/// clustered nodes.
pub fn label_clusters(
    symbol_graph: &SymbolGraph,
    clusters: &HashMap<NodeIndex, usize>,
    pagerank: &HashMap<NodeIndex, f64>,
) -> HashMap<usize, String> {
    use roam_store::domain::SymbolKind;

    let total_clustered = clusters.len().max(1);
    let mut members_by_cluster: HashMap<usize, Vec<NodeIndex>> = HashMap::new();
    for (&node, &cluster) in clusters {
        members_by_cluster.entry(cluster).or_default().push(node);
    }

    let mut labels = HashMap::new();
    for (cluster_id, members) in &members_by_cluster {
        let mut dir_counts: HashMap<String, usize> = HashMap::new();
        for &node in members {
            let sym = &symbol_graph.graph[node];
            *dir_counts.entry(directory_of(&sym.file_path)).or_insert(0) += 1;
        }
        let mut dirs: Vec<(String, usize)> = dir_counts.into_iter().collect();
        dirs.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));

        let is_mega = members.len() > 100
            || members.len() as f64 / total_clustered as f64 > 0.40;

        if is_mega {
            let top3: Vec<String> = dirs
                .iter()
                .take(3)
                .map(|(dir, count)| {
                    let pct = (*count as f64 / members.len() as f64 * 100.0).round() as i64;
                    format!("{} {}%", last_segment(dir), pct)
                })
                .collect();
            labels.insert(*cluster_id, top3.join(" + "));
            continue;
        }

        let anchor = members
            .iter()
            .filter(|&&n| {
                matches!(
                    symbol_graph.graph[n].kind,
                    SymbolKind::Class
                        | SymbolKind::Struct
                        | SymbolKind::Interface
                        | SymbolKind::Enum
                        | SymbolKind::Trait
                        | SymbolKind::Module
                )
            })
            .max_by(|&&a, &&b| {
                pagerank
                    .get(&a)
                    .unwrap_or(&0.0)
                    .partial_cmp(pagerank.get(&b).unwrap_or(&0.0))
                    .unwrap()
            })
            .or_else(|| {
                members.iter().max_by(|&&a, &&b| {
                    pagerank
                        .get(&a)
                        .unwrap_or(&0.0)
                        .partial_cmp(pagerank.get(&b).unwrap_or(&0.0))
                        .unwrap()
                })
            });

        let label = match (dirs.first(), anchor) {
            (Some((dir, _)), Some(&node)) if !dir.is_empty() => {
                format!("{}/{}", last_segment(dir), symbol_graph.graph[node].name)
            }
            (_, Some(&node)) => symbol_graph.graph[node].name.clone(),
            _ => format!("cluster-{cluster_id}"),
        };
        labels.insert(*cluster_id, label);
    }
    labels
}

// ═══════════════════════════════════════════════════════════════════════
// Propagation cost
// ═══════════════════════════════════════════════════════════════════════

/// For each node, BFS over outgoing edges; sum `(|reachable| - 1)` across
/// all nodes, divide by `n(n-1)`, round to 4 decimals (spec §4.10
/// "Propagation cost").
pub fn propagation_cost<N>(graph: &DiGraph<N, EdgeKind>) -> f64 {
    let n = graph.node_count();
    if n <= 1 {
        return 0.0;
    }
    let mut total = 0i64;
    for start in graph.node_indices() {
        let mut visited: HashSet<NodeIndex> = HashSet::new();
        visited.insert(start);
        let mut queue = VecDeque::new();
        queue.push_back(start);
        while let Some(v) = queue.pop_front() {
            for w in graph.neighbors_directed(v, Direction::Outgoing) {
                if visited.insert(w) {
                    queue.push_back(w);
                }
            }
        }
        total += visited.len() as i64 - 1;
    }
    round_to(total as f64 / (n as f64 * (n - 1) as f64), 4)
}

/// Algebraic connectivity (Fiedler eigenvalue of the undirected Laplacian).
/// Spec §9 leaves this an open question ("declared but returns 0.0");
/// this workspace keeps that behavior (see `DESIGN.md`) rather than pull in
/// an eigensolver dependency for a metric no in-scope consumer reads.
pub fn algebraic_connectivity<N>(_graph: &DiGraph<N, EdgeKind>) -> f64 {
    0.0
}

// ═══════════════════════════════════════════════════════════════════════
// Yen's k-shortest paths
// ═══════════════════════════════════════════════════════════════════════

fn path_weight(graph: &DiGraph<impl Sized, EdgeKind>, path: &[NodeIndex]) -> f64 {
    path.windows(2)
        .map(|pair| {
            graph
                .edges_connecting(pair[0], pair[1])
                .map(|e| e.weight().path_weight())
                .fold(f64::INFINITY, f64::min)
        })
        .sum()
}

/// BFS shortest path honoring excluded nodes/edges, optionally treating
/// the graph as undirected (spec §4.10 step 1 fallback).
fn bfs_path<N>(
    graph: &DiGraph<N, EdgeKind>,
    source: NodeIndex,
    target: NodeIndex,
    excluded_nodes: &HashSet<NodeIndex>,
    excluded_edges: &HashSet<(NodeIndex, NodeIndex)>,
    undirected: bool,
) -> Option<Vec<NodeIndex>> {
    if excluded_nodes.contains(&source) || excluded_nodes.contains(&target) {
        return None;
    }
    let mut visited: HashSet<NodeIndex> = HashSet::new();
    visited.insert(source);
    let mut parent: HashMap<NodeIndex, NodeIndex> = HashMap::new();
    let mut queue = VecDeque::new();
    queue.push_back(source);

    while let Some(v) = queue.pop_front() {
        if v == target {
            break;
        }
        let mut neighbors: Vec<NodeIndex> =
            graph.neighbors_directed(v, Direction::Outgoing).collect();
        if undirected {
            neighbors.extend(graph.neighbors_directed(v, Direction::Incoming));
        }
        for w in neighbors {
            if excluded_nodes.contains(&w) || visited.contains(&w) {
                continue;
            }
            if excluded_edges.contains(&(v, w)) || (undirected && excluded_edges.contains(&(w, v))) {
                continue;
            }
            visited.insert(w);
            parent.insert(w, v);
            queue.push_back(w);
        }
    }

    if !visited.contains(&target) {
        return None;
    }
    let mut path = vec![target];
    let mut cur = target;
    while cur != source {
        cur = parent[&cur];
        path.push(cur);
    }
    path.reverse();
    Some(path)
}

/// Yen's k-shortest paths, implemented with exclusion-set BFS rather
/// than the mutate-and-restore approach some reference implementations
/// use (spec §9 "In-place mutation during Yen's" suggests a mutation
/// log; passing exclusions as BFS parameters gets the same "graph state
/// identical before/after" invariant for free, with no restore step to
/// get wrong).
pub fn k_shortest_paths<N>(
    graph: &DiGraph<N, EdgeKind>,
    source: NodeIndex,
    target: NodeIndex,
    k: usize,
) -> Vec<Vec<NodeIndex>> {
    let Some(first) = bfs_path(graph, source, target, &HashSet::new(), &HashSet::new(), false) else {
        return bfs_path(graph, source, target, &HashSet::new(), &HashSet::new(), true)
            .into_iter()
            .collect();
    };

    let mut accepted = vec![first];
    let mut candidates: Vec<Vec<NodeIndex>> = Vec::new();

    while accepted.len() < k {
        let prev = accepted.last().unwrap().clone();
        for i in 0..prev.len().saturating_sub(1) {
            let spur_node = prev[i];
            let root_path = &prev[..=i];

            let mut excluded_edges = HashSet::new();
            for path in &accepted {
                if path.len() > i && path[..=i] == *root_path {
                    excluded_edges.insert((path[i], path[i + 1]));
                }
            }
            let excluded_nodes: HashSet<NodeIndex> = root_path[..i].iter().copied().collect();

            if let Some(spur_path) =
                bfs_path(graph, spur_node, target, &excluded_nodes, &excluded_edges, false)
            {
                let mut total_path = root_path[..i].to_vec();
                total_path.extend(spur_path);
                if !accepted.contains(&total_path) && !candidates.contains(&total_path) {
                    candidates.push(total_path);
                }
            }
        }

        if candidates.is_empty() {
            break;
        }
        candidates.sort_by(|a, b| {
            let wa = path_weight(graph, a);
            let wb = path_weight(graph, b);
            wa.partial_cmp(&wb)
                .unwrap()
                .then_with(|| a.len().cmp(&b.len()))
        });
        accepted.push(candidates.remove(0));
    }

    accepted
}

#[cfg(test)]
mod tests {
    use super::*;
    use roam_store::domain::{SymbolKind, Visibility};

    fn chain_graph(n: usize) -> DiGraph<(), EdgeKind> {
        let mut g = DiGraph::new();
        let nodes: Vec<_> = (0..n).map(|_| g.add_node(())).collect();
        for i in 0..n - 1 {
            g.add_edge(nodes[i], nodes[i + 1], EdgeKind::Call);
        }
        g
    }

    #[test]
    fn chain_layers_increase_by_one() {
        let g = chain_graph(4);
        let scc = tarjan_scc(&g);
        let condensation = build_condensation(&g, &scc);
        let topo = topological_order(&condensation);
        let layer_of_scc = layer_assignment(&condensation, &topo);
        for (i, node) in g.node_indices().enumerate() {
            let scc_id = scc.scc_id_of[&node];
            assert_eq!(layer_of_scc[&scc_id], i as i64);
        }
        let violations = find_violations(&g, &scc, &layer_of_scc);
        assert!(violations.is_empty());
    }

    #[test]
    fn three_cycle_is_one_scc_with_equal_layers() {
        let mut g = DiGraph::new();
        let a = g.add_node(());
        let b = g.add_node(());
        let c = g.add_node(());
        g.add_edge(a, b, EdgeKind::Call);
        g.add_edge(b, c, EdgeKind::Call);
        g.add_edge(c, a, EdgeKind::Call);

        let scc = tarjan_scc(&g);
        assert_eq!(scc.components.len(), 1);
        assert_eq!(scc.components[0].len(), 3);

        let cost = propagation_cost(&g);
        assert!(cost > 0.5, "expected >0.5, got {cost}");
    }

    #[test]
    fn single_node_pagerank_is_one() {
        let mut g: DiGraph<(), EdgeKind> = DiGraph::new();
        g.add_node(());
        let scc = tarjan_scc(&g);
        let pr = pagerank(&g, &scc);
        assert_eq!(pr.len(), 1);
        assert!((pr.values().next().unwrap() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn pagerank_sums_to_approximately_one() {
        let g = chain_graph(5);
        let scc = tarjan_scc(&g);
        let pr = pagerank(&g, &scc);
        let sum: f64 = pr.values().sum();
        assert!((sum - 1.0).abs() < 1e-3);
        assert!(pr.values().all(|&v| v > 0.0 && v.is_finite()));
    }

    #[test]
    fn empty_graph_produces_no_layers() {
        let g: DiGraph<(), EdgeKind> = DiGraph::new();
        let scc = tarjan_scc(&g);
        let condensation = build_condensation(&g, &scc);
        let topo = topological_order(&condensation);
        let layers = layer_assignment(&condensation, &topo);
        assert!(layers.is_empty());
    }

    #[test]
    fn single_node_propagation_cost_is_zero() {
        let mut g: DiGraph<(), EdgeKind> = DiGraph::new();
        g.add_node(());
        assert_eq!(propagation_cost(&g), 0.0);
    }

    #[test]
    fn algebraic_connectivity_is_unspecified_zero() {
        let g = chain_graph(4);
        assert_eq!(algebraic_connectivity(&g), 0.0);
    }

    #[test]
    fn chain_k_shortest_paths_finds_single_path() {
        let g = chain_graph(4);
        let nodes: Vec<_> = g.node_indices().collect();
        let paths = k_shortest_paths(&g, nodes[0], nodes[3], 1);
        assert_eq!(paths.len(), 1);
        assert_eq!(paths[0], nodes);
    }

    #[test]
    fn diamond_graph_yields_two_distinct_paths() {
        let mut g: DiGraph<(), EdgeKind> = DiGraph::new();
        let n0 = g.add_node(());
        let n1 = g.add_node(());
        let n2 = g.add_node(());
        let n3 = g.add_node(());
        g.add_edge(n0, n1, EdgeKind::Call);
        g.add_edge(n0, n2, EdgeKind::Call);
        g.add_edge(n1, n3, EdgeKind::Call);
        g.add_edge(n2, n3, EdgeKind::Call);

        let paths = k_shortest_paths(&g, n0, n3, 3);
        assert_eq!(paths.len(), 2);
        for path in &paths {
            assert_eq!(path[0], n0);
            assert_eq!(*path.last().unwrap(), n3);
        }
        assert_ne!(paths[0], paths[1]);

        let scc = tarjan_scc(&g);
        let condensation = build_condensation(&g, &scc);
        let topo = topological_order(&condensation);
        let layers = layer_assignment(&condensation, &topo);
        assert_eq!(layers[&scc.scc_id_of[&n3]], 2);
    }

    #[test]
    fn betweenness_is_nonnegative_and_zero_for_endpoints_of_chain() {
        let g = chain_graph(3);
        let nodes: Vec<_> = g.node_indices().collect();
        let bc = betweenness(&g);
        assert!(bc.values().all(|&v| v >= 0.0));
        assert!(bc[&nodes[1]] > 0.0);
    }

    #[test]
    fn louvain_groups_a_fully_connected_triangle_together() {
        let mut g: DiGraph<(), EdgeKind> = DiGraph::new();
        let a = g.add_node(());
        let b = g.add_node(());
        let c = g.add_node(());
        g.add_edge(a, b, EdgeKind::Call);
        g.add_edge(b, c, EdgeKind::Call);
        g.add_edge(c, a, EdgeKind::Call);
        let communities = louvain(&g);
        assert_eq!(communities[&a], communities[&b]);
        assert_eq!(communities[&b], communities[&c]);
    }

    #[test]
    fn modularity_is_zero_for_edgeless_graph() {
        let g: DiGraph<(), EdgeKind> = DiGraph::new();
        let clusters = HashMap::new();
        assert_eq!(directed_modularity(&g, &clusters), 0.0);
    }

    fn sym_node(name: &str, kind: SymbolKind, file_path: &str) -> crate::features::graph_builder::SymbolNode {
        crate::features::graph_builder::SymbolNode {
            symbol_id: 0,
            name: name.to_string(),
            qualified_name: name.to_string(),
            kind,
            file_path: file_path.to_string(),
        }
    }

    #[test]
    fn cluster_label_prefers_anchor_symbol_in_directory() {
        let mut graph = DiGraph::new();
        let cls = graph.add_node(sym_node("Widget", SymbolKind::Struct, "ui/widget.rs"));
        let helper = graph.add_node(sym_node("helper", SymbolKind::Function, "ui/widget.rs"));
        graph.add_edge(helper, cls, EdgeKind::Call);
        let symbol_graph = SymbolGraph {
            graph,
            index_of: HashMap::new(),
        };

        let mut clusters = HashMap::new();
        clusters.insert(cls, 0);
        clusters.insert(helper, 0);
        let mut pagerank_map = HashMap::new();
        pagerank_map.insert(cls, 0.6);
        pagerank_map.insert(helper, 0.4);

        let labels = label_clusters(&symbol_graph, &clusters, &pagerank_map);
        assert_eq!(labels[&0], "ui/Widget");
    }

    #[allow(dead_code)]
    fn silence_unused_visibility_import() -> Visibility {
        Visibility::Public
    }
}
