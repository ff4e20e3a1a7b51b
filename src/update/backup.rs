//! Snapshots of the active install and selective restore of user data.
//!
//! A snapshot is a full copy of `server_dir` under `backup_dir`, named after
//! the UTC time it was taken (`2026-10-19T12-30-05Z`). Snapshots are never
//! pruned automatically; [`BackupManager::prune`] is caller-initiated.

use crate::config::StewardConfig;
use crate::utils::fs::{copy_dir, copy_path, ensure_dir};
use crate::utils::roots::ManagedRoots;
use anyhow::{Context, Result};
use chrono::Utc;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, info, warn};

/// A snapshot directory under the backup root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot {
    pub name: String,
    pub path: PathBuf,
}

/// What a restore carried over.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RestoreReport {
    pub restored: Vec<String>,
    /// Configured items the snapshot did not contain.
    pub missing: Vec<String>,
}

/// Creates, restores, lists and prunes install snapshots.
#[derive(Debug, Clone)]
pub struct BackupManager {
    server_dir: PathBuf,
    backup_dir: PathBuf,
    roots: ManagedRoots,
    owner: Option<String>,
    preserve: Vec<String>,
}

impl BackupManager {
    pub fn new(config: &StewardConfig) -> Self {
        Self {
            server_dir: config.server_dir.clone(),
            backup_dir: config.backup_dir.clone(),
            roots: config.managed_roots(),
            owner: config.owner.clone(),
            preserve: config.preserve.clone(),
        }
    }

    pub fn roots(&self) -> &ManagedRoots {
        &self.roots
    }

    pub fn preserve(&self) -> &[String] {
        &self.preserve
    }

    /// Snapshot the active install.
    ///
    /// Returns `Ok(None)` without touching anything when there is no install
    /// yet. A copy failure removes the partial snapshot before the error is
    /// returned.
    pub async fn backup(&self) -> Result<Option<PathBuf>> {
        if !fs::try_exists(&self.server_dir).await.unwrap_or(false) {
            info!("No install at {}, skipping backup", self.server_dir.display());
            return Ok(None);
        }

        ensure_dir(&self.backup_dir)?;
        let snapshot = self.next_snapshot_path().await;
        info!("Backing up {} to {}", self.server_dir.display(), snapshot.display());

        let src = self.server_dir.clone();
        let dst = snapshot.clone();
        let copied = tokio::task::spawn_blocking(move || copy_dir(&src, &dst))
            .await
            .context("Backup task panicked")
            .and_then(|r| r);

        if let Err(e) = copied {
            warn!("Backup failed, removing partial snapshot {}", snapshot.display());
            if let Err(cleanup) = self.roots.remove_tree(&snapshot).await {
                warn!("Failed to remove partial snapshot: {:#}", cleanup);
            }
            return Err(e.context(format!("Failed to back up {}", self.server_dir.display())));
        }

        self.roots.change_ownership(&snapshot, self.owner.as_deref()).await?;
        Ok(Some(snapshot))
    }

    /// Copy the configured user-data items from `snapshot` into `target`.
    ///
    /// Directories are merged into what the new install ships, files are
    /// overwritten. Items absent from the snapshot are skipped with a warning.
    pub async fn restore(&self, snapshot: &Path, target: &Path) -> Result<RestoreReport> {
        let mut report = RestoreReport::default();

        for item in &self.preserve {
            let src = snapshot.join(item);
            if !fs::try_exists(&src).await.unwrap_or(false) {
                warn!("'{}' not present in snapshot {}, skipping", item, snapshot.display());
                report.missing.push(item.clone());
                continue;
            }

            let dst = target.join(item);
            let src_clone = src.clone();
            let dst_clone = dst.clone();
            tokio::task::spawn_blocking(move || copy_path(&src_clone, &dst_clone))
                .await
                .context("Restore task panicked")?
                .with_context(|| format!("Failed to restore '{item}'"))?;

            debug!("Restored {}", item);
            report.restored.push(item.clone());
        }

        info!(
            "Restored {} item(s) from {}",
            report.restored.len(),
            snapshot.display()
        );
        Ok(report)
    }

    /// Snapshots under the backup root, oldest first.
    pub async fn list(&self) -> Result<Vec<Snapshot>> {
        let mut snapshots = Vec::new();

        let mut entries = match fs::read_dir(&self.backup_dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(snapshots),
            Err(e) => {
                return Err(e).with_context(|| {
                    format!("Failed to read backup directory {}", self.backup_dir.display())
                });
            }
        };

        while let Some(entry) = entries.next_entry().await? {
            if !entry.file_type().await?.is_dir() {
                continue;
            }
            let name = entry.file_name().to_string_lossy().into_owned();
            if name.starts_with('.') {
                continue;
            }
            snapshots.push(Snapshot {
                name,
                path: entry.path(),
            });
        }

        snapshots.sort_by(|a, b| {
            snapshot_order(&a.name)
                .cmp(&snapshot_order(&b.name))
                .then_with(|| a.name.cmp(&b.name))
        });
        Ok(snapshots)
    }

    /// Delete all but the newest `keep` snapshots. Returns the removed paths.
    pub async fn prune(&self, keep: usize) -> Result<Vec<PathBuf>> {
        let snapshots = self.list().await?;
        let excess = snapshots.len().saturating_sub(keep);
        let mut removed = Vec::with_capacity(excess);

        for snapshot in snapshots.into_iter().take(excess) {
            self.roots.remove_tree(&snapshot.path).await?;
            info!("Pruned snapshot {}", snapshot.name);
            removed.push(snapshot.path);
        }

        Ok(removed)
    }

    async fn next_snapshot_path(&self) -> PathBuf {
        let base = snapshot_name(Utc::now());
        let mut candidate = self.backup_dir.join(&base);
        let mut n = 1;
        while fs::try_exists(&candidate).await.unwrap_or(false) {
            candidate = self.backup_dir.join(format!("{base}-{n}"));
            n += 1;
        }
        candidate
    }
}

/// RFC 3339 UTC timestamp with `:` replaced so it is a valid file name everywhere.
#[must_use]
pub fn snapshot_name(at: chrono::DateTime<Utc>) -> String {
    at.format("%Y-%m-%dT%H-%M-%SZ").to_string()
}

/// Sort key for snapshot names: the timestamp, then the collision suffix
/// (`...Z-2` before `...Z-10`).
fn snapshot_order(name: &str) -> (&str, u64) {
    match name.rsplit_once('-') {
        Some((base, suffix)) if base.ends_with('Z') => match suffix.parse() {
            Ok(n) => (base, n),
            Err(_) => (name, 0),
        },
        _ => (name, 0),
    }
}
