//! Single-flight guard for update runs.
//!
//! Two layers: an in-process mutex stops overlapping runs inside one steward
//! process (the watch loop and a signal-triggered check, for instance), and an
//! exclusive OS file lock on `<state_dir>/update.lock` stops a manual
//! `steward update` from racing a running `steward watch`.
//!
//! Acquisition never waits. A run that finds the guard held is rejected.
//! The in-process half can be taken on its own with [`UpdateGuard::try_begin`]
//! so a run that turns out to be a no-op never touches the lock file.

use anyhow::{Context, Result};
use fs4::fs_std::FileExt;
use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::debug;

/// Hands out at most one [`UpdatePermit`] at a time.
#[derive(Debug, Clone)]
pub struct UpdateGuard {
    local: Arc<Mutex<()>>,
    lock_path: PathBuf,
}

/// The in-process half of a permit. Creates nothing on disk.
#[derive(Debug)]
pub struct LocalPermit {
    local: OwnedMutexGuard<()>,
    lock_path: PathBuf,
}

/// Proof that the holder is the only update run. Released on drop.
#[derive(Debug)]
pub struct UpdatePermit {
    _local: OwnedMutexGuard<()>,
    /// The OS lock is held for as long as this handle stays open.
    _file: File,
    lock_path: PathBuf,
}

impl Drop for UpdatePermit {
    fn drop(&mut self) {
        debug!(lock = %self.lock_path.display(), "Update lock released");
    }
}

impl UpdateGuard {
    pub fn new(lock_path: impl Into<PathBuf>) -> Self {
        Self {
            local: Arc::new(Mutex::new(())),
            lock_path: lock_path.into(),
        }
    }

    pub fn lock_path(&self) -> &Path {
        &self.lock_path
    }

    /// Try to become the active update run.
    ///
    /// Returns `Ok(None)` when another run (in this or another process) holds
    /// the guard. Errors only when the lock file itself cannot be opened.
    pub async fn try_acquire(&self) -> Result<Option<UpdatePermit>> {
        match self.try_begin() {
            Some(local) => local.try_lock().await,
            None => Ok(None),
        }
    }

    /// Take only the in-process mutex.
    pub fn try_begin(&self) -> Option<LocalPermit> {
        let Ok(local) = Arc::clone(&self.local).try_lock_owned() else {
            debug!("Update already running in this process");
            return None;
        };
        Some(LocalPermit {
            local,
            lock_path: self.lock_path.clone(),
        })
    }
}

impl LocalPermit {
    /// Upgrade to a full permit by taking the OS file lock.
    ///
    /// Returns `Ok(None)` when another process holds the lock; the in-process
    /// mutex is released in that case.
    pub async fn try_lock(self) -> Result<Option<UpdatePermit>> {
        let lock_path = self.lock_path.clone();
        let file = tokio::task::spawn_blocking(move || -> Result<Option<File>> {
            if let Some(parent) = lock_path.parent() {
                std::fs::create_dir_all(parent).with_context(|| {
                    format!("Failed to create lock directory: {}", parent.display())
                })?;
            }

            let file = OpenOptions::new()
                .create(true)
                .write(true)
                .truncate(false)
                .open(&lock_path)
                .with_context(|| format!("Failed to open lock file: {}", lock_path.display()))?;

            match file.try_lock_exclusive() {
                Ok(true) => Ok(Some(file)),
                Ok(false) => Ok(None),
                Err(e) if e.kind() == std::io::ErrorKind::WouldBlock => Ok(None),
                Err(e) => Err(anyhow::Error::from(e)
                    .context(format!("Failed to lock {}", lock_path.display()))),
            }
        })
        .await
        .context("spawn_blocking panicked")??;

        let Some(file) = file else {
            debug!("Update lock held by another process");
            return Ok(None);
        };

        debug!(lock = %self.lock_path.display(), "Update lock acquired");
        Ok(Some(UpdatePermit {
            _local: self.local,
            _file: file,
            lock_path: self.lock_path,
        }))
    }
}
