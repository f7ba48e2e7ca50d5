//! File Discovery (C1, spec §4.1).
//!
//! Enumerates candidate source files under a repo root. Prefers `git
//! ls-files --cached --others --exclude-standard` (spec §6); falls back to
//! a recursive walk via the `ignore` crate when the root is not a git
//! checkout or the subprocess fails. Both paths funnel through the same
//! skiplist, 1 MB size filter, and final lexicographic sort so discovery
//! output never depends on which path produced the raw listing.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::time::Duration;

use ignore::WalkBuilder;

use crate::shared::config::IndexConfig;

/// Directories never descended into, regardless of `.gitignore` contents.
const SKIP_DIRS: &[&str] = &[
    ".git",
    "node_modules",
    "target",
    "dist",
    "build",
    ".venv",
    "venv",
    "__pycache__",
    ".mypy_cache",
    ".pytest_cache",
    ".cache",
    ".next",
    ".nuxt",
];

/// Exact lockfile names excluded regardless of extension.
const SKIP_LOCKFILES: &[&str] = &[
    "Cargo.lock",
    "package-lock.json",
    "yarn.lock",
    "pnpm-lock.yaml",
    "poetry.lock",
    "Gemfile.lock",
    "composer.lock",
];

/// Extensions never treated as source (binaries, images, archives,
/// minified bundles, databases, fonts, compiled artifacts).
const SKIP_EXTENSIONS: &[&str] = &[
    "png", "jpg", "jpeg", "gif", "bmp", "ico", "svg", "webp", "zip", "tar", "gz", "bz2", "xz",
    "7z", "rar", "db", "sqlite", "sqlite3", "woff", "woff2", "ttf", "otf", "eot", "so", "dylib",
    "dll", "exe", "o", "a", "class", "jar", "pyc", "wasm", "pdf", "mp3", "mp4", "mov", "avi",
    "webm",
];

fn is_minified(name: &str) -> bool {
    name.ends_with(".min.js") || name.ends_with(".min.css") || name.ends_with(".bundle.js")
}

fn should_skip_dir(name: &str) -> bool {
    SKIP_DIRS.contains(&name) || (name.starts_with('.') && name != "." && name != "..")
}

fn should_skip_file(path: &Path) -> bool {
    let name = match path.file_name().and_then(|n| n.to_str()) {
        Some(n) => n,
        None => return true,
    };
    if SKIP_LOCKFILES.contains(&name) || is_minified(name) {
        return true;
    }
    if let Some(ext) = path.extension().and_then(|e| e.to_str()) {
        if SKIP_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()) {
            return true;
        }
    }
    false
}

fn normalize(root: &Path, path: &Path) -> Option<String> {
    let rel = path.strip_prefix(root).ok()?;
    let s = rel.to_string_lossy().replace('\\', "/");
    if s.is_empty() {
        None
    } else {
        Some(s)
    }
}

/// Runs `git ls-files --cached --others --exclude-standard` under `root`
/// with a bounded timeout (spec §5, §6). Returns `None` on any failure —
/// not a repo, git missing, non-zero exit, or timeout.
///
/// A large repo's file listing can exceed the OS pipe buffer, so stdout
/// is drained on a reader thread concurrently with the `try_wait` polling
/// loop below — reading it only after the loop would risk deadlocking on
/// a full pipe well before the timeout ever fires (same reasoning as the
/// git miner's `run_git`, spec §5 "Cancellation / timeouts").
fn discover_via_git(root: &Path, timeout: Duration) -> Option<Vec<String>> {
    let mut child = Command::new("git")
        .arg("-C")
        .arg(root)
        .args(["ls-files", "--cached", "--others", "--exclude-standard", "-z"])
        .stdout(std::process::Stdio::piped())
        .stderr(std::process::Stdio::null())
        .spawn()
        .ok()?;

    let mut stdout = child.stdout.take()?;
    let (tx, rx) = std::sync::mpsc::channel();
    std::thread::spawn(move || {
        use std::io::Read;
        let mut buf = Vec::new();
        let _ = stdout.read_to_end(&mut buf);
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

    let buf = rx.recv_timeout(Duration::from_secs(5)).ok()?;
    let text = String::from_utf8_lossy(&buf);
    Some(
        text.split('\0')
            .filter(|s| !s.is_empty())
            .map(|s| s.replace('\\', "/"))
            .collect(),
    )
}

/// Recursive-walk fallback using the `ignore` crate (respects
/// `.gitignore`-style rules even outside a checkout).
fn discover_via_walk(root: &Path) -> Vec<String> {
    let mut out = Vec::new();
    let walker = WalkBuilder::new(root)
        .hidden(false)
        .filter_entry(|entry| {
            if entry.file_type().map(|t| t.is_dir()).unwrap_or(false) {
                if let Some(name) = entry.file_name().to_str() {
                    return !should_skip_dir(name);
                }
            }
            true
        })
        .build();
    for entry in walker.flatten() {
        if entry.file_type().map(|t| t.is_file()).unwrap_or(false) {
            if let Some(rel) = normalize(root, entry.path()) {
                out.push(rel);
            }
        }
    }
    out
}

/// Applies the shared skiplist + size filter, then dedupes and sorts.
fn finalize(root: &Path, candidates: Vec<String>, max_size: u64) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut out: Vec<String> = candidates
        .into_iter()
        .filter(|rel| {
            let full = root.join(rel);
            if should_skip_file(&full) {
                return false;
            }
            for comp in Path::new(rel).components() {
                if let std::path::Component::Normal(c) = comp {
                    if let Some(name) = c.to_str() {
                        if should_skip_dir(name) {
                            return false;
                        }
                    }
                }
            }
            match full.metadata() {
                Ok(meta) => meta.len() <= max_size,
                Err(_) => false,
            }
        })
        .filter(|rel| seen.insert(rel.clone()))
        .collect();
    out.sort();
    out
}

/// Enumerates repo-relative, forward-slash paths under `root` (spec §4.1).
/// Deterministic: sorted lexicographically.
pub fn discover_files(root: &Path, config: &IndexConfig) -> Vec<String> {
    let timeout = Duration::from_secs(config.git_ls_files_timeout_secs);
    let raw = discover_via_git(root, timeout).unwrap_or_else(|| discover_via_walk(root));
    finalize(root, raw, config.max_file_size_bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn discovery_skips_skiplist_dirs_and_lockfiles() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        fs::create_dir_all(root.join("node_modules")).unwrap();
        fs::write(root.join("node_modules/x.js"), "x").unwrap();
        fs::write(root.join("Cargo.lock"), "x").unwrap();
        fs::write(root.join("main.rs"), "fn main() {}").unwrap();

        let files = discover_files(root, &IndexConfig::default());
        assert_eq!(files, vec!["main.rs".to_string()]);
    }

    #[test]
    fn discovery_drops_files_over_size_cap() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        fs::write(root.join("small.rs"), "fn f() {}").unwrap();
        fs::write(root.join("big.rs"), vec![b'a'; 200]).unwrap();

        let mut cfg = IndexConfig::default();
        cfg.max_file_size_bytes = 100;
        let files = discover_files(root, &cfg);
        assert_eq!(files, vec!["small.rs".to_string()]);
    }

    #[test]
    fn discovery_output_is_sorted_and_deterministic() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        fs::write(root.join("z.rs"), "").unwrap();
        fs::write(root.join("a.rs"), "").unwrap();
        fs::write(root.join("m.rs"), "").unwrap();
        let files = discover_files(root, &IndexConfig::default());
        assert_eq!(files, vec!["a.rs".to_string(), "m.rs".to_string(), "z.rs".to_string()]);
    }

    #[test]
    fn discovery_skips_hidden_directories() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        fs::create_dir_all(root.join(".venv")).unwrap();
        fs::write(root.join(".venv/lib.py"), "").unwrap();
        fs::write(root.join("app.py"), "").unwrap();
        let files = discover_files(root, &IndexConfig::default());
        assert_eq!(files, vec!["app.py".to_string()]);
    }
}
