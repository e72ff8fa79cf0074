//! Repository-wide lock.
//!
//! Every command working on an initialized repository holds an exclusive
//! advisory lock on `.bitlet/lock` until it finishes. The OS releases the
//! lock when the process exits, so a crashed command never leaves a stale
//! lock behind.

use anyhow::Context;
use file_guard::{FileGuard, Lock};
use std::fs::{File, OpenOptions};
use std::path::Path;
use std::time::{Duration, Instant};

pub const LOCK_FILE_NAME: &str = "lock";

const POLL_INTERVAL: Duration = Duration::from_millis(10);
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Held for the lifetime of the value
#[derive(Debug)]
pub struct RepositoryLock {
    _guard: FileGuard<Box<File>>,
}

impl RepositoryLock {
    pub fn acquire(metadata_path: &Path) -> anyhow::Result<Self> {
        Self::acquire_with_timeout(metadata_path, DEFAULT_TIMEOUT)
    }

    /// Polls until the lock is free or `timeout` expires
    pub fn acquire_with_timeout(metadata_path: &Path, timeout: Duration) -> anyhow::Result<Self> {
        let lock_path = metadata_path.join(LOCK_FILE_NAME);
        let start = Instant::now();

        loop {
            let file = OpenOptions::new()
                .create(true)
                .write(true)
                .truncate(false)
                .open(&lock_path)
                .with_context(|| format!("failed to open lock file at {:?}", lock_path))?;

            match file_guard::try_lock(Box::new(file), Lock::Exclusive, 0, 1) {
                Ok(guard) => {
                    tracing::debug!(path = ?lock_path, "acquired repository lock");
                    return Ok(RepositoryLock { _guard: guard });
                }
                Err(_) if start.elapsed() >= timeout => {
                    anyhow::bail!(
                        "unable to lock {:?}: another bitlet process is running",
                        lock_path
                    );
                }
                Err(_) => std::thread::sleep(POLL_INTERVAL),
            }
        }
    }
}
