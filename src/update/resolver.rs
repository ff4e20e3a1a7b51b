//! Remote version resolution.
//!
//! The official download page embeds a direct link to each platform's server
//! archive. The link's file name carries the version
//! (`bedrock-server-1.21.0.03.zip`), so resolving the latest release is a
//! regex match over the page body followed by a second match on the file name.

use crate::config::StewardConfig;
use crate::constants::{ARTIFACT_VERSION_PATTERN, USER_AGENT};
use crate::core::StewardError;
use anyhow::{Context, Result};
use regex::Regex;
use std::future::Future;
use std::sync::OnceLock;
use std::time::Duration;
use tracing::{debug, warn};

/// A published server build.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Release {
    /// Version string extracted from the archive file name.
    pub version: String,
    /// Direct download location of the archive.
    pub url: String,
}

/// Something that can tell the orchestrator which release is current.
///
/// `Ok(None)` means "no result": the artifact was found but no version could
/// be derived from it. Callers treat that as "no update available".
pub trait ReleaseSource: Send + Sync {
    fn latest(&self) -> impl Future<Output = Result<Option<Release>>> + Send;
}

/// Resolves the latest release by scraping the download page.
#[derive(Debug, Clone)]
pub struct RemoteVersionResolver {
    client: reqwest::Client,
    page_url: String,
    link_pattern: Regex,
}

impl RemoteVersionResolver {
    pub fn new(page_url: impl Into<String>, link_pattern: &str, timeout: Duration) -> Result<Self> {
        let link_pattern = Regex::new(link_pattern)
            .map_err(|e| StewardError::Config(format!("invalid artifact pattern: {e}")))?;

        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            client,
            page_url: page_url.into(),
            link_pattern,
        })
    }

    pub fn from_config(config: &StewardConfig) -> Result<Self> {
        Self::new(
            config.download_page_url.clone(),
            &config.artifact_pattern,
            config.request_timeout(),
        )
    }

    /// Fetch the download page and extract the release.
    ///
    /// # Errors
    ///
    /// - [`StewardError::Network`] on transport failure or a non-success status
    /// - [`StewardError::Parse`] when no artifact link is present in the page
    pub async fn resolve(&self) -> Result<Option<Release>> {
        debug!("Fetching download page {}", self.page_url);

        let response = self
            .client
            .get(&self.page_url)
            .send()
            .await
            .map_err(|e| StewardError::Network {
                url: self.page_url.clone(),
                reason: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(StewardError::Network {
                url: self.page_url.clone(),
                reason: format!("HTTP {status}"),
            }
            .into());
        }

        let body = response.text().await.map_err(|e| StewardError::Network {
            url: self.page_url.clone(),
            reason: format!("failed to read body: {e}"),
        })?;

        parse_release(&body, &self.link_pattern)
    }
}

impl ReleaseSource for RemoteVersionResolver {
    async fn latest(&self) -> Result<Option<Release>> {
        self.resolve().await
    }
}

/// Find the first artifact link in `body` and derive its version.
///
/// # Examples
///
/// ```rust
/// use bedrock_steward::update::resolver::parse_release;
/// use regex::Regex;
///
/// let pattern = Regex::new(r"https://\S+/bedrock-server-[0-9.]+\.zip").unwrap();
/// let page = r#"<a href="https://cdn.example.com/bin-linux/bedrock-server-1.21.0.03.zip">"#;
/// let release = parse_release(page, &pattern).unwrap().unwrap();
/// assert_eq!(release.version, "1.21.0.03");
/// ```
pub fn parse_release(body: &str, link_pattern: &Regex) -> Result<Option<Release>> {
    let Some(found) = link_pattern.find(body) else {
        return Err(StewardError::Parse(
            "download page does not contain a server archive link".to_string(),
        )
        .into());
    };

    let url = found.as_str().to_string();
    match version_from_url(&url) {
        Some(version) => {
            debug!("Resolved release {} at {}", version, url);
            Ok(Some(Release { version, url }))
        }
        None => {
            warn!("Artifact link {} does not carry a recognizable version", url);
            Ok(None)
        }
    }
}

/// Extract the version embedded in an artifact file name.
#[must_use]
pub fn version_from_url(url: &str) -> Option<String> {
    static VERSION: OnceLock<Option<Regex>> = OnceLock::new();
    let version = VERSION.get_or_init(|| Regex::new(ARTIFACT_VERSION_PATTERN).ok()).as_ref()?;

    let file_name = url.rsplit('/').next().unwrap_or(url);
    version.captures(file_name).and_then(|c| c.get(1)).map(|m| m.as_str().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::{LINUX_ARTIFACT_PATTERN, WINDOWS_ARTIFACT_PATTERN};

    const PAGE: &str = r#"
        <div class="downloads">
          <a href="https://www.minecraft.net/bedrockdedicatedserver/bin-win/bedrock-server-1.21.44.01.zip">Windows</a>
          <a href="https://www.minecraft.net/bedrockdedicatedserver/bin-linux/bedrock-server-1.21.44.01.zip">Linux</a>
        </div>
    "#;

    #[test]
    fn test_parse_linux_release() {
        let pattern = Regex::new(LINUX_ARTIFACT_PATTERN).unwrap();
        let release = parse_release(PAGE, &pattern).unwrap().unwrap();

        assert_eq!(release.version, "1.21.44.01");
        assert!(release.url.contains("/bin-linux/"));
    }

    #[test]
    fn test_parse_windows_release() {
        let pattern = Regex::new(WINDOWS_ARTIFACT_PATTERN).unwrap();
        let release = parse_release(PAGE, &pattern).unwrap().unwrap();
        assert!(release.url.contains("/bin-win/"));
    }

    #[test]
    fn test_missing_link_is_parse_error() {
        let pattern = Regex::new(LINUX_ARTIFACT_PATTERN).unwrap();
        let err = parse_release("<html>maintenance</html>", &pattern).unwrap_err();
        assert!(matches!(err.downcast_ref::<StewardError>(), Some(StewardError::Parse(_))));
    }

    #[test]
    fn test_link_without_version_is_no_result() {
        let pattern = Regex::new(r"https://\S+/bin-linux/[^\s<>]+\.zip").unwrap();
        let page = "https://cdn.example.com/bin-linux/bedrock-server-latest.zip";
        assert_eq!(parse_release(page, &pattern).unwrap(), None);
    }

    #[test]
    fn test_version_from_url() {
        assert_eq!(
            version_from_url("https://x/bin-linux/bedrock-server-1.2.3.zip").as_deref(),
            Some("1.2.3")
        );
        assert_eq!(version_from_url("name-1.2.3.zip").as_deref(), Some("1.2.3"));
        assert_eq!(version_from_url("name-1.zip"), None);
        assert_eq!(version_from_url("name-1.2.3.tar.gz"), None);
    }
}
