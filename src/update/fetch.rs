//! Streaming artifact downloads.
//!
//! Archives are streamed chunk by chunk into a `<dest>.part` sibling which is
//! renamed onto `dest` only once the body has been fully written, so a file at
//! `dest` is always complete. Transport failures are retried with exponential
//! backoff; HTTP status errors and local I/O errors are not.

use crate::config::StewardConfig;
use crate::constants::{
    DOWNLOAD_ATTEMPTS, DOWNLOAD_BACKOFF_MAX_MS, DOWNLOAD_BACKOFF_START_MS, USER_AGENT,
};
use crate::core::StewardError;
use crate::utils::fs::ensure_parent_dir;
use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use std::future::Future;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tokio_retry::RetryIf;
use tokio_retry::strategy::ExponentialBackoff;
use tracing::{debug, info, warn};

/// Downloads a remote artifact to a local path.
pub trait ArtifactFetcher: Send + Sync {
    fn fetch(&self, url: &str, dest: &Path) -> impl Future<Output = Result<()>> + Send;
}

/// [`ArtifactFetcher`] over HTTP(S).
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: reqwest::Client,
    show_progress: bool,
}

impl HttpFetcher {
    pub fn new(timeout: Duration) -> Result<Self> {
        // The timeout bounds connection setup and each read, not the whole transfer.
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .connect_timeout(timeout)
            .read_timeout(timeout)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            client,
            show_progress: false,
        })
    }

    pub fn from_config(config: &StewardConfig) -> Result<Self> {
        Self::new(config.request_timeout())
    }

    /// Show a progress bar on stderr while downloading.
    #[must_use]
    pub fn with_progress(mut self, show_progress: bool) -> Self {
        self.show_progress = show_progress;
        self
    }

    async fn download_once(&self, url: &str, part: &Path) -> Result<()> {
        let network = |reason: String| StewardError::Network {
            url: url.to_string(),
            reason,
        };

        let mut response =
            self.client.get(url).send().await.map_err(|e| network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            // Not retried: a 404 stays a 404.
            return Err(anyhow::anyhow!("Download of {url} failed with HTTP {status}"));
        }

        let progress = self.progress_bar(response.content_length());
        progress.set_message("Downloading");

        let mut file = tokio::fs::File::create(part)
            .await
            .map_err(|e| StewardError::filesystem("create", part, e))?;

        while let Some(chunk) = response.chunk().await.map_err(|e| network(e.to_string()))? {
            file.write_all(&chunk)
                .await
                .map_err(|e| StewardError::filesystem("write", part, e))?;
            progress.inc(chunk.len() as u64);
        }

        file.flush().await.map_err(|e| StewardError::filesystem("flush", part, e))?;
        file.sync_all().await.map_err(|e| StewardError::filesystem("sync", part, e))?;
        progress.finish_and_clear();

        Ok(())
    }

    fn progress_bar(&self, len: Option<u64>) -> ProgressBar {
        if !self.show_progress {
            return ProgressBar::hidden();
        }

        let Some(len) = len else {
            return ProgressBar::new_spinner();
        };

        let bar = ProgressBar::new(len);
        if let Ok(style) = ProgressStyle::with_template(
            "{msg} [{bar:40.cyan/blue}] {bytes}/{total_bytes} ({eta})",
        ) {
            bar.set_style(style.progress_chars("=> "));
        }
        bar
    }
}

impl ArtifactFetcher for HttpFetcher {
    async fn fetch(&self, url: &str, dest: &Path) -> Result<()> {
        ensure_parent_dir(dest)?;
        let part = part_path(dest);

        let strategy = ExponentialBackoff::from_millis(DOWNLOAD_BACKOFF_START_MS)
            .max_delay(Duration::from_millis(DOWNLOAD_BACKOFF_MAX_MS))
            .take(DOWNLOAD_ATTEMPTS.saturating_sub(1));

        info!("Downloading {}", url);
        let result = RetryIf::start(
            strategy,
            || self.download_once(url, &part),
            |e: &anyhow::Error| {
                let retry = is_transport_error(e);
                if retry {
                    warn!("Download attempt failed, retrying: {:#}", e);
                }
                retry
            },
        )
        .await;

        if let Err(e) = result {
            if let Err(cleanup) = tokio::fs::remove_file(&part).await
                && cleanup.kind() != std::io::ErrorKind::NotFound
            {
                debug!("Failed to remove partial download {}: {}", part.display(), cleanup);
            }
            return Err(e);
        }

        tokio::fs::rename(&part, dest)
            .await
            .map_err(|e| StewardError::filesystem("rename", dest, e))?;

        debug!("Saved {}", dest.display());
        Ok(())
    }
}

fn is_transport_error(error: &anyhow::Error) -> bool {
    matches!(error.downcast_ref::<StewardError>(), Some(StewardError::Network { .. }))
}

/// `<dest>.part`
fn part_path(dest: &Path) -> PathBuf {
    let mut part = dest.as_os_str().to_owned();
    part.push(".part");
    PathBuf::from(part)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_part_path_appends_suffix() {
        assert_eq!(
            part_path(Path::new("/tmp/bedrock-server-1.2.3.zip")),
            PathBuf::from("/tmp/bedrock-server-1.2.3.zip.part")
        );
    }

    #[test]
    fn test_only_transport_errors_are_retried() {
        let network = anyhow::Error::from(StewardError::Network {
            url: "https://example.com".into(),
            reason: "connection reset".into(),
        });
        assert!(is_transport_error(&network));

        let status = anyhow::anyhow!("Download of x failed with HTTP 404 Not Found");
        assert!(!is_transport_error(&status));

        let io = anyhow::Error::from(StewardError::filesystem(
            "write",
            "/tmp/x",
            std::io::Error::other("disk full"),
        ));
        assert!(!is_transport_error(&io));
    }

    #[tokio::test]
    async fn test_unreachable_host_fails_without_leaving_files() {
        let temp = tempfile::tempdir().unwrap();
        let dest = temp.path().join("bedrock-server-1.0.0.zip");
        let fetcher = HttpFetcher::new(Duration::from_secs(2)).unwrap();

        // Port 9 on localhost is the discard port; nothing listens there in CI.
        let result = fetcher.fetch("http://127.0.0.1:9/bedrock-server-1.0.0.zip", &dest).await;

        assert!(result.is_err());
        assert!(!dest.exists());
        assert!(!part_path(&dest).exists());
    }
}
