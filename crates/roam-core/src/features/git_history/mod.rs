//! Git Miner (C8, spec §4.8).
//!
//! Parses `git log --numstat --no-merges` output into commits, file
//! changes, co-change pairs with normalized entropy, commit hyperedges,
//! and per-file stats. Best-effort: any failure (non-repo, git missing,
//! timeout) yields `None` rather than an error (spec §7 "git invocation
//! failed or non-repo").
//!
//! Everything here operates on file *paths*; `file_id` is a store
//! concern the indexing pipeline (C11) resolves via [`resolve_file_ids`]
//! after looking paths up against the files table.

use std::collections::HashMap;
use std::path::Path;
use std::process::{Command, Stdio};
use std::time::Duration;

use roam_store::domain::{CochangeRecord, FileStatsRecord, GitCommit, GitFileChange, NewHyperedge};

use crate::shared::hashing::sha256_hex;

/// Path-keyed co-change pair, `path_a < path_b` lexicographically.
#[derive(Debug, Clone)]
pub struct PathCochange {
    pub path_a: String,
    pub path_b: String,
    pub count: i64,
}

/// Path-keyed hyperedge: one commit's full touched-file set.
#[derive(Debug, Clone)]
pub struct PathHyperedge {
    pub commit_hash: String,
    pub member_paths: Vec<String>,
}

/// Everything the git miner produces in one run, keyed by path until the
/// pipeline resolves ids.
#[derive(Debug, Clone, Default)]
pub struct GitMiningResult {
    pub commits: Vec<GitCommit>,
    pub file_changes: Vec<GitFileChange>,
    pub cochange: Vec<PathCochange>,
    pub hyperedges: Vec<PathHyperedge>,
    pub file_stats_by_path: HashMap<String, FileStatsRecord>,
}

/// Spawn-then-poll subprocess call with a hard timeout (spec §5
/// "Cancellation / timeouts"). Returns `None` on spawn failure, non-zero
/// exit, or timeout — all treated as "git unavailable", never fatal.
///
/// `git log --numstat` on a real repo with `-n 5000` easily produces more
/// than one pipe buffer's worth of output (~64 KiB on Linux): polling
/// `try_wait()` without draining stdout concurrently would deadlock once
/// git blocks on a full pipe, well before the timeout ever fires. A
/// dedicated reader thread drains stdout while the main thread polls.
fn run_git(root: &Path, args: &[&str], timeout: Duration) -> Option<String> {
    let mut child = Command::new("git")
        .arg("-C")
        .arg(root)
        .args(args)
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .spawn()
        .ok()?;

    let mut stdout = child.stdout.take()?;
    let (tx, rx) = std::sync::mpsc::channel();
    std::thread::spawn(move || {
        use std::io::Read;
        let mut buf = String::new();
        let _ = stdout.read_to_string(&mut buf);
        let _ = tx.send(buf);
    });

    let start = std::time::Instant::now();
    loop {
        match child.try_wait().ok()? {
            Some(status) => {
                if !status.success() {
                    return None;
                }
                break;
            }
            None => {
                if start.elapsed() > timeout {
                    let _ = child.kill();
                    return None;
                }
                std::thread::sleep(Duration::from_millis(20));
            }
        }
    }

    rx.recv_timeout(Duration::from_secs(5)).ok()
}

/// Normalizes a numstat rename entry `old/{a => b}/tail` or `{a =>
/// b}` to its new path.
fn normalize_rename(path: &str) -> String {
    if let Some(start) = path.find('{') {
        if let Some(end) = path.find('}') {
            let prefix = &path[..start];
            let inner = &path[start + 1..end];
            let suffix = &path[end + 1..];
            if let Some((_, new)) = inner.split_once("=>") {
                return format!("{prefix}{}{suffix}", new.trim());
            }
        }
    }
    if let Some((_, new)) = path.split_once(" => ") {
        return new.trim().to_string();
    }
    path.to_string()
}

struct ParsedCommit {
    commit: GitCommit,
    changes: Vec<GitFileChange>,
}

/// Parses the `COMMIT:<hash>|<author>|<ts>|<subject>` + numstat block
/// format (spec §4.8, §6).
fn parse_log(raw: &str) -> Vec<ParsedCommit> {
    let mut out = Vec::new();
    let mut current: Option<ParsedCommit> = None;

    for line in raw.lines() {
        if let Some(rest) = line.strip_prefix("COMMIT:") {
            if let Some(parsed) = current.take() {
                out.push(parsed);
            }
            let mut parts = rest.splitn(4, '|');
            let hash = parts.next().unwrap_or("").to_string();
            let author = parts.next().unwrap_or("").to_string();
            let timestamp = parts.next().and_then(|t| t.parse().ok()).unwrap_or(0);
            let message = parts.next().unwrap_or("").to_string();
            if hash.is_empty() {
                continue;
            }
            current = Some(ParsedCommit {
                commit: GitCommit {
                    hash,
                    author,
                    timestamp,
                    message,
                },
                changes: Vec::new(),
            });
            continue;
        }
        if line.trim().is_empty() {
            continue;
        }
        let mut fields = line.splitn(3, '\t');
        let (Some(added), Some(removed), Some(path)) = (fields.next(), fields.next(), fields.next())
        else {
            continue;
        };
        let Some(parsed) = current.as_mut() else {
            continue;
        };
        let lines_added = added.parse().unwrap_or(0);
        let lines_removed = removed.parse().unwrap_or(0);
        let normalized_path = normalize_rename(path).replace('\\', "/");
        parsed.changes.push(GitFileChange {
            commit_hash: parsed.commit.hash.clone(),
            file_id: None,
            path: normalized_path,
            lines_added,
            lines_removed,
        });
    }
    if let Some(parsed) = current.take() {
        out.push(parsed);
    }
    out
}

/// Shannon-style normalized entropy over a partner multiset (spec §4.8
/// "Entropy"). Files with ≤1 partner get 0.0.
fn cochange_entropy(partner_counts: &[i64]) -> f64 {
    if partner_counts.len() <= 1 {
        return 0.0;
    }
    let total: f64 = partner_counts.iter().sum::<i64>() as f64;
    if total <= 0.0 {
        return 0.0;
    }
    let sum_sq: f64 = partner_counts
        .iter()
        .map(|&c| {
            let p = c as f64 / total;
            p * p
        })
        .sum();
    let h = -sum_sq.log2();
    let max_h = (partner_counts.len() as f64).log2();
    if max_h <= 0.0 {
        0.0
    } else {
        (h / max_h).clamp(0.0, 1.0)
    }
}

/// Runs `git log --numstat --no-merges` and derives the full
/// [`GitMiningResult`] (spec §4.8). Best-effort: returns `None` on any
/// failure so the caller can treat the git step as skipped, not fatal.
pub fn mine(root: &Path, commit_limit: usize, log_timeout: Duration) -> Option<GitMiningResult> {
    if !root.join(".git").exists() {
        return None;
    }
    let limit_arg = commit_limit.to_string();
    let raw = run_git(
        root,
        &[
            "log",
            "--numstat",
            "--no-merges",
            "--pretty=format:COMMIT:%H|%an|%at|%s",
            "-n",
            &limit_arg,
        ],
        log_timeout,
    )?;

    let parsed_commits = parse_log(&raw);

    let mut commits = Vec::new();
    let mut file_changes = Vec::new();
    let mut cochange_counts: HashMap<(String, String), i64> = HashMap::new();
    let mut partner_counts: HashMap<String, HashMap<String, i64>> = HashMap::new();
    let mut hyperedges = Vec::new();
    let mut file_stats: HashMap<String, (i64, i64, std::collections::HashSet<String>)> = HashMap::new();

    for parsed in &parsed_commits {
        commits.push(parsed.commit.clone());

        let touched_paths: Vec<String> = parsed
            .changes
            .iter()
            .map(|c| c.path.clone())
            .collect::<std::collections::BTreeSet<_>>()
            .into_iter()
            .collect();

        for change in &parsed.changes {
            file_changes.push(change.clone());
            let entry = file_stats
                .entry(change.path.clone())
                .or_insert((0, 0, std::collections::HashSet::new()));
            entry.0 += 1;
            entry.1 += change.lines_added + change.lines_removed;
            entry.2.insert(parsed.commit.author.clone());
        }

        // Co-change pairs: commits touching 2-100 files (spec §4.8).
        if touched_paths.len() >= 2 && touched_paths.len() <= 100 {
            for i in 0..touched_paths.len() {
                for j in (i + 1)..touched_paths.len() {
                    let (a, b) = (touched_paths[i].clone(), touched_paths[j].clone());
                    *cochange_counts.entry((a.clone(), b.clone())).or_insert(0) += 1;
                    *partner_counts.entry(a.clone()).or_default().entry(b.clone()).or_insert(0) += 1;
                    *partner_counts.entry(b).or_default().entry(a).or_insert(0) += 1;
                }
            }
        }

        if !touched_paths.is_empty() {
            hyperedges.push(PathHyperedge {
                commit_hash: parsed.commit.hash.clone(),
                member_paths: touched_paths,
            });
        }
    }

    let file_stats_by_path: HashMap<String, FileStatsRecord> = file_stats
        .into_iter()
        .map(|(path, (commit_count, churn, authors))| {
            let entropy = partner_counts
                .get(&path)
                .map(|m| cochange_entropy(&m.values().copied().collect::<Vec<_>>()))
                .unwrap_or(0.0);
            (
                path,
                FileStatsRecord {
                    file_id: 0,
                    commit_count,
                    total_churn: churn,
                    distinct_authors: authors.len() as i64,
                    complexity: 0.0,
                    cochange_entropy: entropy,
                },
            )
        })
        .collect();

    Some(GitMiningResult {
        commits,
        file_changes,
        cochange: cochange_counts
            .into_iter()
            .map(|((path_a, path_b), count)| PathCochange { path_a, path_b, count })
            .collect(),
        hyperedges,
        file_stats_by_path,
    })
}

/// Resolves path-keyed co-change pairs and hyperedges against a
/// `path -> file_id` map, dropping pairs/members whose file is no longer
/// tracked (spec §8 invariant 6: `file_a < file_b` in every stored
/// pair). Hyperedge `sig_hash` is the first 16 hex chars of SHA-256 over
/// the sorted member ids joined by `|` (spec §4.8).
pub fn resolve_file_ids(
    result: &GitMiningResult,
    file_id_of_path: &HashMap<String, i64>,
) -> (Vec<CochangeRecord>, Vec<NewHyperedge>, Vec<FileStatsRecord>) {
    let cochange = result
        .cochange
        .iter()
        .filter_map(|pc| {
            let a = *file_id_of_path.get(&pc.path_a)?;
            let b = *file_id_of_path.get(&pc.path_b)?;
            let (file_a, file_b) = if a < b { (a, b) } else { (b, a) };
            Some(CochangeRecord {
                file_a,
                file_b,
                count: pc.count,
            })
        })
        .collect();

    let hyperedges = result
        .hyperedges
        .iter()
        .filter_map(|he| {
            let mut ids: Vec<i64> = he
                .member_paths
                .iter()
                .filter_map(|p| file_id_of_path.get(p).copied())
                .collect();
            if ids.is_empty() {
                return None;
            }
            ids.sort_unstable();
            let sig_input = ids.iter().map(|id| id.to_string()).collect::<Vec<_>>().join("|");
            Some(NewHyperedge {
                commit_hash: he.commit_hash.clone(),
                file_count: ids.len() as i64,
                sig_hash: sha256_hex(sig_input.as_bytes())[..16].to_string(),
                members: ids,
            })
        })
        .collect();

    let file_stats = result
        .file_stats_by_path
        .iter()
        .filter_map(|(path, stats)| {
            let file_id = *file_id_of_path.get(path)?;
            Some(FileStatsRecord {
                file_id,
                ..*stats
            })
        })
        .collect();

    (cochange, hyperedges, file_stats)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_commit_header_and_numstat_lines() {
        let raw = "COMMIT:abc123|Jane|1700000000|Fix bug\n2\t1\tsrc/a.rs\n0\t5\tsrc/b.rs\n";
        let parsed = parse_log(raw);
        assert_eq!(parsed.len(), 1);
        assert_eq!(parsed[0].commit.hash, "abc123");
        assert_eq!(parsed[0].commit.author, "Jane");
        assert_eq!(parsed[0].changes.len(), 2);
        assert_eq!(parsed[0].changes[0].lines_added, 2);
    }

    #[test]
    fn normalizes_rename_entries_to_new_path() {
        assert_eq!(normalize_rename("src/{old.rs => new.rs}"), "src/new.rs");
        assert_eq!(normalize_rename("old.rs => new.rs"), "new.rs");
        assert_eq!(normalize_rename("unchanged.rs"), "unchanged.rs");
    }

    #[test]
    fn cochange_entropy_matches_spec_scenario_7() {
        let entropy = cochange_entropy(&[2, 1]);
        assert!(entropy > 0.0);
        assert!(entropy <= 1.0);
    }

    #[test]
    fn cochange_entropy_zero_for_single_partner() {
        assert_eq!(cochange_entropy(&[5]), 0.0);
        assert_eq!(cochange_entropy(&[]), 0.0);
    }

    #[test]
    fn spec_scenario_7_two_commits_touch_ab_one_touches_ac() {
        let raw = "COMMIT:c1|A|1|m1\n1\t0\ta.rs\n1\t0\tb.rs\n\
                   COMMIT:c2|A|2|m2\n1\t0\ta.rs\n1\t0\tb.rs\n\
                   COMMIT:c3|A|3|m3\n1\t0\ta.rs\n1\t0\tc.rs\n";
        let parsed = parse_log(raw);
        let mut cochange_counts: HashMap<(String, String), i64> = HashMap::new();
        for p in &parsed {
            let touched: Vec<String> = p.changes.iter().map(|c| c.path.clone()).collect();
            let mut sorted = touched.clone();
            sorted.sort();
            for i in 0..sorted.len() {
                for j in (i + 1)..sorted.len() {
                    *cochange_counts
                        .entry((sorted[i].clone(), sorted[j].clone()))
                        .or_insert(0) += 1;
                }
            }
        }
        assert_eq!(cochange_counts.get(&("a.rs".to_string(), "b.rs".to_string())), Some(&2));
        assert_eq!(cochange_counts.get(&("a.rs".to_string(), "c.rs".to_string())), Some(&1));
    }

    #[test]
    fn resolve_file_ids_orders_pairs_and_hashes_hyperedge_members() {
        let mut result = GitMiningResult::default();
        result.cochange.push(PathCochange {
            path_a: "b.rs".to_string(),
            path_b: "a.rs".to_string(),
            count: 3,
        });
        result.hyperedges.push(PathHyperedge {
            commit_hash: "c1".to_string(),
            member_paths: vec!["a.rs".to_string(), "b.rs".to_string()],
        });

        let mut ids = HashMap::new();
        ids.insert("a.rs".to_string(), 10);
        ids.insert("b.rs".to_string(), 20);

        let (cochange, hyperedges, _) = resolve_file_ids(&result, &ids);
        assert_eq!(cochange[0].file_a, 10);
        assert_eq!(cochange[0].file_b, 20);
        assert_eq!(hyperedges[0].members, vec![10, 20]);
        assert_eq!(hyperedges[0].sig_hash.len(), 16);
    }
}
