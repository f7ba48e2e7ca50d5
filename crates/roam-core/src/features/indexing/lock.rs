//! Advisory index lock (spec §5 "Concurrency / Locking").
//!
//! A plaintext PID file at `<root>/.roam/index.lock`. Stale locks (owning
//! process no longer alive) are reclaimed automatically; a live owner
//! aborts the run with [`CoreError::LockContended`].

use std::fs;
use std::path::{Path, PathBuf};

use crate::shared::error::{CoreError, Result};

#[cfg(unix)]
fn pid_is_alive(pid: i32) -> bool {
    // Signal 0 sends nothing, just checks permission/existence (spec §5).
    unsafe { libc::kill(pid, 0) == 0 }
}

#[cfg(not(unix))]
fn pid_is_alive(_pid: i32) -> bool {
    // No portable liveness check off unix; assume alive so a stuck lock
    // never gets silently reclaimed out from under a real owner.
    true
}

fn current_pid() -> i32 {
    std::process::id() as i32
}

/// Holds the lock for the lifetime of one index run; released on drop.
pub struct LockGuard {
    path: PathBuf,
}

impl LockGuard {
    /// Acquires the lock under `root/.roam/index.lock`, reclaiming it first
    /// if the recorded pid is no longer alive.
    pub fn acquire(root: &Path) -> Result<Self> {
        let dir = root.join(".roam");
        fs::create_dir_all(&dir)?;
        let path = dir.join("index.lock");

        if let Ok(contents) = fs::read_to_string(&path) {
            if let Ok(pid) = contents.trim().parse::<i32>() {
                if pid_is_alive(pid) {
                    return Err(CoreError::LockContended {
                        lock_path: path.display().to_string(),
                        pid,
                    });
                }
            }
        }

        fs::write(&path, current_pid().to_string())?;
        Ok(Self { path })
    }
}

impl Drop for LockGuard {
    fn drop(&mut self) {
        let _ = fs::remove_file(&self.path);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn acquire_then_release_leaves_no_lock_file() {
        let dir = tempfile::tempdir().unwrap();
        {
            let _guard = LockGuard::acquire(dir.path()).unwrap();
            assert!(dir.path().join(".roam/index.lock").exists());
        }
        assert!(!dir.path().join(".roam/index.lock").exists());
    }

    #[test]
    fn stale_lock_from_a_dead_pid_is_reclaimed() {
        let dir = tempfile::tempdir().unwrap();
        let roam_dir = dir.path().join(".roam");
        fs::create_dir_all(&roam_dir).unwrap();
        // A pid essentially guaranteed not to be alive in this process tree.
        fs::write(roam_dir.join("index.lock"), "999999999").unwrap();
        let guard = LockGuard::acquire(dir.path());
        assert!(guard.is_ok());
    }

    #[cfg(unix)]
    #[test]
    fn live_pid_contends_the_lock() {
        let dir = tempfile::tempdir().unwrap();
        let roam_dir = dir.path().join(".roam");
        fs::create_dir_all(&roam_dir).unwrap();
        fs::write(roam_dir.join("index.lock"), current_pid().to_string()).unwrap();
        let err = LockGuard::acquire(dir.path()).unwrap_err();
        assert!(matches!(err, CoreError::LockContended { .. }));
    }
}
