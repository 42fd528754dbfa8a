//! Lock file management for single-instance enforcement.
//!
//! Only one `salahtime watch` may rewrite the widget file at a time. The lock
//! file holds the owner's PID so a lock left behind by a crashed process can
//! be told apart from a live one.

use anyhow::{Context, Result, bail};
use fs2::FileExt;
use std::fs::{File, OpenOptions};
use std::io::{Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use crate::common::constants::LOCK_FILE_NAME;
use crate::common::utils::{self, private_path};

/// An acquired instance lock. The file is unlocked and removed on drop.
#[derive(Debug)]
pub struct InstanceLock {
    file: File,
    path: PathBuf,
}

impl InstanceLock {
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for InstanceLock {
    fn drop(&mut self) {
        let _ = self.file.unlock();
        let _ = std::fs::remove_file(&self.path);
    }
}

/// Default lock location: `$XDG_RUNTIME_DIR/salahtime.lock`, or `/tmp`.
pub fn default_lock_path() -> PathBuf {
    let runtime_dir = std::env::var("XDG_RUNTIME_DIR").unwrap_or_else(|_| "/tmp".to_string());
    PathBuf::from(runtime_dir).join(LOCK_FILE_NAME)
}

/// Acquire an exclusive lock on `lock_path`.
///
/// A lock whose owner is no longer running is removed and the acquisition is
/// retried once. A live owner is an error.
pub fn acquire_lock(lock_path: &Path) -> Result<InstanceLock> {
    if let Some(lock) = try_acquire(lock_path)? {
        return Ok(lock);
    }

    handle_lock_conflict(lock_path)?;

    match try_acquire(lock_path)? {
        Some(lock) => Ok(lock),
        None => bail!(
            "Failed to acquire {} after removing a stale lock",
            private_path(lock_path)
        ),
    }
}

fn try_acquire(lock_path: &Path) -> Result<Option<InstanceLock>> {
    if let Some(parent) = lock_path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", private_path(parent)))?;
    }

    // Open without truncating: the current owner's PID must stay readable
    // until the lock is ours.
    let mut file = OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(false)
        .open(lock_path)
        .with_context(|| format!("Failed to open {}", private_path(lock_path)))?;

    if file.try_lock_exclusive().is_err() {
        return Ok(None);
    }

    file.set_len(0)?;
    file.seek(SeekFrom::Start(0))?;
    writeln!(&file, "{}", std::process::id())?;
    file.flush()?;

    Ok(Some(InstanceLock {
        file,
        path: lock_path.to_path_buf(),
    }))
}

/// Inspect a held lock. Returns `Ok(())` when the lock was stale and has been
/// removed; errors when its owner is still running.
fn handle_lock_conflict(lock_path: &Path) -> Result<()> {
    let content = match std::fs::read_to_string(lock_path) {
        Ok(content) => content,
        // Already cleaned up by its owner
        Err(_) => return Ok(()),
    };

    let Ok(pid) = content.trim().parse::<u32>() else {
        log_warning!("Lock file contains invalid PID, removing stale lock");
        let _ = std::fs::remove_file(lock_path);
        return Ok(());
    };

    if pid != std::process::id() && !utils::is_process_running(pid) {
        log_warning!("Removing stale lock file (process {pid} no longer running)");
        let _ = std::fs::remove_file(lock_path);
        return Ok(());
    }

    bail!("salahtime watch is already running (PID: {pid})")
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_lock_records_pid_and_is_removed_on_drop() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join(LOCK_FILE_NAME);

        let lock = acquire_lock(&path).unwrap();
        let content = std::fs::read_to_string(lock.path()).unwrap();
        assert_eq!(content.trim(), std::process::id().to_string());

        drop(lock);
        assert!(!path.exists());
    }

    #[test]
    fn test_second_acquire_fails_while_held() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(LOCK_FILE_NAME);

        let _lock = acquire_lock(&path).unwrap();
        let err = acquire_lock(&path).unwrap_err();
        assert!(err.to_string().contains("already running"));
        // The owner's lock file survives the failed attempt
        assert!(path.exists());
    }

    #[test]
    fn test_unlocked_leftover_file_is_reused() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(LOCK_FILE_NAME);
        std::fs::write(&path, "4294967295\n").unwrap();

        let lock = acquire_lock(&path).unwrap();
        let content = std::fs::read_to_string(lock.path()).unwrap();
        assert_eq!(content.trim(), std::process::id().to_string());
    }

    #[test]
    fn test_stale_conflict_is_cleared() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(LOCK_FILE_NAME);
        std::fs::write(&path, "4294967295\n").unwrap();
        assert!(handle_lock_conflict(&path).is_ok());
        assert!(!path.exists());

        std::fs::write(&path, "not a pid\n").unwrap();
        assert!(handle_lock_conflict(&path).is_ok());
        assert!(!path.exists());
    }
}
