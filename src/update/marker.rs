//! The persisted "last successfully installed version".

use crate::core::StewardError;
use crate::utils::fs::safe_write;
use anyhow::Result;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Single-line file recording the installed version.
///
/// Only written after an install has fully completed, so it never describes a
/// partially applied update.
#[derive(Debug, Clone)]
pub struct VersionMarker {
    path: PathBuf,
}

impl VersionMarker {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The recorded version, or `None` when nothing has been installed yet.
    pub async fn read(&self) -> Result<Option<String>> {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(content) => {
                let version = content.trim();
                Ok((!version.is_empty()).then(|| version.to_string()))
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(StewardError::filesystem("read", &self.path, e).into()),
        }
    }

    pub async fn write(&self, version: &str) -> Result<()> {
        let path = self.path.clone();
        let content = format!("{version}\n");
        tokio::task::spawn_blocking(move || safe_write(&path, &content)).await??;
        debug!("Recorded installed version {}", version);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_missing_marker_reads_as_none() {
        let temp = tempdir().unwrap();
        let marker = VersionMarker::new(temp.path().join("state/installed_version.txt"));
        assert_eq!(marker.read().await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_write_then_read() {
        let temp = tempdir().unwrap();
        let marker = VersionMarker::new(temp.path().join("state/installed_version.txt"));

        marker.write("1.21.0.03").await.unwrap();
        assert_eq!(marker.read().await.unwrap().as_deref(), Some("1.21.0.03"));
        assert_eq!(std::fs::read_to_string(marker.path()).unwrap(), "1.21.0.03\n");
    }

    #[tokio::test]
    async fn test_blank_marker_reads_as_none() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("installed_version.txt");
        std::fs::write(&path, "  \n").unwrap();
        assert_eq!(VersionMarker::new(path).read().await.unwrap(), None);
    }
}
