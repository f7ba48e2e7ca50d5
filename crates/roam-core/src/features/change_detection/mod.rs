//! Change Detector (C2, spec §4.2).
//!
//! mtime is a cheap screen; SHA-256 is only computed for the subset whose
//! mtime moved, which is the hot-path optimization for large trees.

use std::collections::HashMap;
use std::path::Path;

use roam_store::domain::FileRecord;
use roam_store::domain::FileChangeSet;

use crate::shared::hashing::sha256_hex;

/// mtime deltas below this are treated as unchanged (spec §4.2: "differs by
/// ≥1 ms").
const MTIME_EPSILON_MS: i64 = 1;

/// Classifies `current` (freshly discovered paths) against `stored` (the
/// prior file table) by mtime-then-hash (spec §4.2).
///
/// `read_mtime` and `read_and_hash` abstract the filesystem so tests can
/// inject synthetic clocks; production callers pass closures backed by
/// `std::fs::metadata`/file reads.
pub fn detect_changes(
    root: &Path,
    current: &[String],
    stored: &[FileRecord],
    read_mtime_ms: impl Fn(&Path) -> Option<i64>,
    read_and_hash: impl Fn(&Path) -> Option<String>,
) -> FileChangeSet {
    let stored_by_path: HashMap<&str, &FileRecord> =
        stored.iter().map(|f| (f.path.as_str(), f)).collect();
    let current_set: std::collections::HashSet<&str> =
        current.iter().map(|s| s.as_str()).collect();

    let mut out = FileChangeSet::default();

    for path in current {
        match stored_by_path.get(path.as_str()) {
            None => out.added.push(path.clone()),
            Some(record) => {
                let full = root.join(path);
                let mtime_ms = read_mtime_ms(&full);
                let changed = match mtime_ms {
                    Some(m) if (m - record.mtime).abs() >= MTIME_EPSILON_MS => {
                        match read_and_hash(&full) {
                            Some(hash) => hash != record.content_hash,
                            None => true, // unreadable: treat as changed, extraction will skip it
                        }
                    }
                    Some(_) => false,
                    None => true, // file vanished between discovery and stat
                };
                if changed {
                    out.modified.push(path.clone());
                } else {
                    out.unchanged.push(path.clone());
                }
            }
        }
    }

    for record in stored {
        if !current_set.contains(record.path.as_str()) {
            out.removed.push(record.path.clone());
        }
    }

    out
}

/// Production mtime reader: filesystem mtime in milliseconds.
pub fn fs_mtime_ms(path: &Path) -> Option<i64> {
    let meta = std::fs::metadata(path).ok()?;
    let modified = meta.modified().ok()?;
    let dur = modified
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default();
    Some(dur.as_millis() as i64)
}

/// Production hasher: reads the file and returns its SHA-256 hex digest.
pub fn fs_read_and_hash(path: &Path) -> Option<String> {
    let bytes = std::fs::read(path).ok()?;
    Some(sha256_hex(&bytes))
}

#[cfg(test)]
mod tests {
    use super::*;
    use roam_store::domain::{FileRole, Language};

    fn record(path: &str, mtime: i64, hash: &str) -> FileRecord {
        FileRecord {
            id: 1,
            path: path.to_string(),
            language: Language::Rust,
            file_role: FileRole::Source,
            content_hash: hash.to_string(),
            mtime,
            line_count: 1,
        }
    }

    #[test]
    fn new_path_is_added() {
        let set = detect_changes(
            Path::new("/root"),
            &["a.rs".to_string()],
            &[],
            |_| Some(100),
            |_| Some("h".to_string()),
        );
        assert_eq!(set.added, vec!["a.rs".to_string()]);
    }

    #[test]
    fn missing_path_is_removed() {
        let stored = vec![record("gone.rs", 0, "h")];
        let set = detect_changes(Path::new("/root"), &[], &stored, |_| None, |_| None);
        assert_eq!(set.removed, vec!["gone.rs".to_string()]);
    }

    #[test]
    fn mtime_only_touch_with_identical_hash_is_unchanged() {
        let stored = vec![record("a.rs", 100, "samehash")];
        let set = detect_changes(
            Path::new("/root"),
            &["a.rs".to_string()],
            &stored,
            |_| Some(500), // mtime moved
            |_| Some("samehash".to_string()), // but content identical
        );
        assert_eq!(set.unchanged, vec!["a.rs".to_string()]);
        assert!(set.modified.is_empty());
    }

    #[test]
    fn hash_change_marks_modified() {
        let stored = vec![record("a.rs", 100, "oldhash")];
        let set = detect_changes(
            Path::new("/root"),
            &["a.rs".to_string()],
            &stored,
            |_| Some(500),
            |_| Some("newhash".to_string()),
        );
        assert_eq!(set.modified, vec!["a.rs".to_string()]);
    }

    #[test]
    fn mtime_within_epsilon_skips_hashing_and_is_unchanged() {
        let stored = vec![record("a.rs", 100, "h")];
        let hashed = std::cell::Cell::new(false);
        let set = detect_changes(
            Path::new("/root"),
            &["a.rs".to_string()],
            &stored,
            |_| Some(100),
            |_| {
                hashed.set(true);
                Some("h".to_string())
            },
        );
        assert_eq!(set.unchanged, vec!["a.rs".to_string()]);
        assert!(!hashed.get(), "hot-path optimization: hash should not run when mtime is unchanged");
    }
}
