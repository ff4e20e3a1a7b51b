//! Zip extraction.
//!
//! Server archives are unpacked into `<target>.partial` and renamed onto
//! `<target>` only when every entry has been written. Entries whose names
//! would escape the destination (absolute paths, `..`) are rejected.

use crate::core::StewardError;
use crate::utils::fs::ensure_dir;
use anyhow::{Context, Result};
use std::fs::File;
use std::io::{Read, Seek};
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use zip::ZipArchive;

/// Unpack `archive` into `target`, staging through `<target>.partial`.
///
/// Any leftover `.partial` directory from an interrupted run must have been
/// removed by the caller; the staging directory is expected not to exist.
pub async fn extract_archive(archive: &Path, target: &Path) -> Result<()> {
    let archive = archive.to_path_buf();
    let target = target.to_path_buf();
    let staging = partial_path(&target);

    info!("Extracting {} into {}", archive.display(), target.display());

    let staging_clone = staging.clone();
    let count = tokio::task::spawn_blocking(move || -> Result<usize> {
        let file = File::open(&archive)
            .map_err(|e| StewardError::filesystem("open", &archive, e))?;
        let mut zip = ZipArchive::new(file)
            .with_context(|| format!("Failed to read zip archive {}", archive.display()))?;
        unpack(&mut zip, "", &staging_clone)
    })
    .await
    .context("Extraction task panicked")??;

    tokio::fs::rename(&staging, &target)
        .await
        .map_err(|e| StewardError::filesystem("rename", &target, e))?;

    debug!("Extracted {} entries into {}", count, target.display());
    Ok(())
}

/// Where an extraction into `target` is staged.
#[must_use]
pub fn partial_path(target: &Path) -> PathBuf {
    let mut staging = target.as_os_str().to_owned();
    staging.push(".partial");
    PathBuf::from(staging)
}

/// Write every entry under `prefix` (a `/`-terminated directory inside the
/// archive, or `""` for everything) into `dest`, with `prefix` stripped.
///
/// Returns the number of files written. Unix permission bits recorded in the
/// archive are applied so the server binary stays executable.
pub fn unpack<R: Read + Seek>(zip: &mut ZipArchive<R>, prefix: &str, dest: &Path) -> Result<usize> {
    ensure_dir(dest)?;
    let mut written = 0;

    for i in 0..zip.len() {
        let mut entry = zip.by_index(i).context("Failed to read zip entry")?;

        let Some(name) = entry.enclosed_name() else {
            return Err(StewardError::Parse(format!(
                "archive entry '{}' escapes the extraction directory",
                entry.name()
            ))
            .into());
        };

        let Ok(relative) = name.strip_prefix(prefix.trim_end_matches('/')) else {
            continue;
        };
        if relative.as_os_str().is_empty() {
            continue;
        }

        let out = dest.join(relative);
        if entry.is_dir() {
            ensure_dir(&out)?;
            continue;
        }

        if let Some(parent) = out.parent() {
            ensure_dir(parent)?;
        }
        let mut file = File::create(&out).map_err(|e| StewardError::filesystem("create", &out, e))?;
        std::io::copy(&mut entry, &mut file)
            .map_err(|e| StewardError::filesystem("write", &out, e))?;

        #[cfg(unix)]
        if let Some(mode) = entry.unix_mode().filter(|m| m & 0o777 != 0) {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(&out, std::fs::Permissions::from_mode(mode & 0o777))
                .map_err(|e| StewardError::filesystem("chmod", &out, e))?;
        }

        written += 1;
    }

    Ok(written)
}
