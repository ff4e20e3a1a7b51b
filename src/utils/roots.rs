//! Guard rails for destructive filesystem operations
//!
//! Steward owns exactly three directory trees: the active install
//! (`server_dir`), the staging area (`temp_dir`) and the snapshot store
//! (`backup_dir`). Every recursive delete and every ownership change is checked
//! against these roots before it runs:
//!
//! - [`ManagedRoots::remove_tree`] only accepts a *proper* subdirectory of a
//!   root; the roots themselves can never be deleted.
//! - [`ManagedRoots::change_ownership`] accepts a root or anything under it.
//!
//! A rejected path raises [`StewardError::RestrictedPath`], which callers treat
//! as a hard stop.

use crate::core::StewardError;
use anyhow::{Context, Result, bail};
use std::path::{Component, Path, PathBuf};
use tracing::{debug, warn};

/// The set of directories steward is allowed to modify destructively.
#[derive(Debug, Clone)]
pub struct ManagedRoots {
    roots: Vec<PathBuf>,
}

impl ManagedRoots {
    /// Build a guard over the given roots. Roots are normalized lexically.
    pub fn new<I, P>(roots: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: AsRef<Path>,
    {
        Self {
            roots: roots.into_iter().map(|r| normalize(r.as_ref())).collect(),
        }
    }

    /// The normalized roots.
    #[must_use]
    pub fn roots(&self) -> &[PathBuf] {
        &self.roots
    }

    /// Whether `path` is a root or lies underneath one.
    #[must_use]
    pub fn contains(&self, path: &Path) -> bool {
        if !path.is_absolute() {
            return false;
        }
        let path = normalize(path);
        self.roots.iter().any(|root| path.starts_with(root))
    }

    /// Whether `path` lies strictly underneath a root (the root itself excluded).
    #[must_use]
    pub fn is_strictly_inside(&self, path: &Path) -> bool {
        if !path.is_absolute() {
            return false;
        }
        let path = normalize(path);
        self.roots.iter().any(|root| path != *root && path.starts_with(root))
    }

    /// Reject anything that is not a proper subdirectory of a root.
    pub fn ensure_removable(&self, path: &Path) -> Result<PathBuf> {
        if self.is_strictly_inside(path) {
            Ok(normalize(path))
        } else {
            Err(StewardError::RestrictedPath {
                path: path.to_path_buf(),
            }
            .into())
        }
    }

    /// Reject anything outside the roots (a root itself is accepted).
    pub fn ensure_managed(&self, path: &Path) -> Result<PathBuf> {
        if self.contains(path) {
            Ok(normalize(path))
        } else {
            Err(StewardError::RestrictedPath {
                path: path.to_path_buf(),
            }
            .into())
        }
    }

    /// Guarded recursive delete.
    ///
    /// A missing path is not an error. The native recursive remove is tried
    /// first; if it fails, `rm -rf` (or `rmdir /s /q` on Windows) is invoked as
    /// a fallback.
    pub async fn remove_tree(&self, path: &Path) -> Result<()> {
        let target = self.ensure_removable(path)?;

        let metadata = match tokio::fs::symlink_metadata(&target).await {
            Ok(m) => m,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(()),
            Err(e) => {
                return Err(StewardError::filesystem("stat", &target, e).into());
            }
        };

        let native = if metadata.is_dir() {
            tokio::fs::remove_dir_all(&target).await
        } else {
            tokio::fs::remove_file(&target).await
        };

        match native {
            Ok(()) => {
                debug!("Removed {}", target.display());
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => {
                warn!(
                    "Native remove of {} failed ({}), falling back to external command",
                    target.display(),
                    e
                );
                remove_with_command(&target).await
            }
        }
    }

    /// Recursively set `owner` (`user` or `user:group`) on a managed path.
    ///
    /// A no-op when `owner` is `None` and on Windows.
    pub async fn change_ownership(&self, path: &Path, owner: Option<&str>) -> Result<()> {
        let target = self.ensure_managed(path)?;

        let Some(owner) = owner else {
            debug!("No owner configured, leaving ownership of {} unchanged", target.display());
            return Ok(());
        };

        if !is_valid_owner(owner) {
            return Err(StewardError::Config(format!("invalid owner specification '{owner}'")).into());
        }

        chown_recursive(&target, owner).await
    }
}

#[cfg(unix)]
async fn chown_recursive(target: &Path, owner: &str) -> Result<()> {
    debug!("Setting ownership of {} to {}", target.display(), owner);

    let output = tokio::process::Command::new("chown")
        .arg("-R")
        .arg(owner)
        .arg(target)
        .output()
        .await
        .context("Failed to execute chown command")?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        bail!("Failed to set ownership of {}: {}", target.display(), stderr.trim());
    }

    Ok(())
}

#[cfg(not(unix))]
async fn chown_recursive(target: &Path, _owner: &str) -> Result<()> {
    debug!("Ownership changes are not supported on this platform, skipping {}", target.display());
    Ok(())
}

async fn remove_with_command(target: &Path) -> Result<()> {
    let output = if cfg!(windows) {
        tokio::process::Command::new("cmd")
            .args(["/C", "rmdir", "/s", "/q"])
            .arg(target)
            .output()
            .await
    } else {
        tokio::process::Command::new("rm").arg("-rf").arg(target).output().await
    }
    .with_context(|| format!("Failed to spawn remove command for {}", target.display()))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        bail!("Failed to remove {}: {}", target.display(), stderr.trim());
    }

    Ok(())
}

/// `user` or `user:group` made of portable name characters, never starting with `-`.
fn is_valid_owner(owner: &str) -> bool {
    let valid_part = |part: &str| {
        !part.is_empty()
            && !part.starts_with('-')
            && part.chars().all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.'))
    };

    match owner.split_once(':') {
        Some((user, group)) => valid_part(user) && valid_part(group),
        None => valid_part(owner),
    }
}

/// Lexical normalization: drops `.` and resolves `..` against preceding components.
fn normalize(path: &Path) -> PathBuf {
    let mut components: Vec<Component<'_>> = Vec::new();

    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if matches!(components.last(), Some(Component::Normal(_))) {
                    components.pop();
                }
            }
            c => components.push(c),
        }
    }

    components.iter().collect()
}
