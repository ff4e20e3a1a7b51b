//! A single configuration source.
//!
//! Every field is optional so that a layer only says what its source actually
//! specified. Layers are validated on their own before they are merged, which
//! lets an error point at the file or flag that introduced the bad value.

use crate::constants::{
    DEFAULT_CHECK_INTERVAL_SECS, DEFAULT_DOWNLOAD_PAGE_URL, DEFAULT_PRESERVE,
    DEFAULT_REQUEST_TIMEOUT_SECS, DEFAULT_RESTART_GRACE, default_artifact_pattern,
    default_server_executable,
};
use crate::core::StewardError;
use crate::utils::platform::default_data_dir;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Component, Path, PathBuf};
use tokio::fs;

/// One layer of steward configuration (defaults, file, or command line).
///
/// # File format
///
/// ```toml
/// server_dir = "/srv/bedrock/server"
/// temp_dir = "/srv/bedrock/tmp"
/// backup_dir = "/srv/bedrock/backups"
/// owner = "minecraft:minecraft"
/// webhook_url = "https://discord.com/api/webhooks/..."
/// preserve = ["worlds", "server.properties", "allowlist.json"]
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigLayer {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub server_dir: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temp_dir: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub backup_dir: Option<PathBuf>,
    /// Where the version marker, pid file, update lock and server log live.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state_dir: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub download_page_url: Option<String>,
    /// Regex locating the platform's server archive link on the download page.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub artifact_pattern: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub webhook_url: Option<String>,
    /// `user` or `user:group` applied recursively on POSIX after installs and backups.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub server_executable: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub restart_grace_secs: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub check_interval_secs: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_timeout_secs: Option<u64>,
    /// User-data items (relative to the install root) restored after a swap.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preserve: Option<Vec<String>>,
}

impl ConfigLayer {
    /// Built-in defaults. Directory roots live under the steward data directory
    /// (`~/.bedrock-steward` on Unix).
    pub fn defaults() -> Result<Self> {
        let base = default_data_dir()?;
        Ok(Self {
            server_dir: Some(base.join("server")),
            temp_dir: Some(base.join("tmp")),
            backup_dir: Some(base.join("backups")),
            state_dir: Some(base.join("state")),
            download_page_url: Some(DEFAULT_DOWNLOAD_PAGE_URL.to_string()),
            artifact_pattern: Some(default_artifact_pattern().to_string()),
            webhook_url: None,
            owner: None,
            server_executable: Some(default_server_executable().to_string()),
            restart_grace_secs: Some(DEFAULT_RESTART_GRACE.as_secs()),
            check_interval_secs: Some(DEFAULT_CHECK_INTERVAL_SECS),
            request_timeout_secs: Some(DEFAULT_REQUEST_TIMEOUT_SECS),
            preserve: Some(DEFAULT_PRESERVE.iter().map(ToString::to_string).collect()),
        })
    }

    /// Default config file location.
    ///
    /// - **Unix/macOS**: `~/.bedrock-steward/config.toml`
    /// - **Windows**: `%LOCALAPPDATA%\bedrock-steward\config.toml`
    pub fn default_path() -> Result<PathBuf> {
        Ok(default_data_dir()?.join("config.toml"))
    }

    /// Load a layer from a TOML file.
    pub async fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read config from {}", path.display()))?;

        let layer: Self = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config from {}", path.display()))?;

        layer.validate(&path.display().to_string())?;
        Ok(layer)
    }

    /// Load the file layer.
    ///
    /// An explicitly given path must exist. The default path is optional: when
    /// it is missing an empty layer is returned.
    pub async fn load_optional(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load_from(path).await,
            None => {
                let path = Self::default_path()?;
                if path.exists() {
                    Self::load_from(&path).await
                } else {
                    Ok(Self::default())
                }
            }
        }
    }

    /// Overlay `higher` onto `self`, field by field. Values set in `higher` win.
    #[must_use]
    pub fn merge(self, higher: Self) -> Self {
        Self {
            server_dir: higher.server_dir.or(self.server_dir),
            temp_dir: higher.temp_dir.or(self.temp_dir),
            backup_dir: higher.backup_dir.or(self.backup_dir),
            state_dir: higher.state_dir.or(self.state_dir),
            download_page_url: higher.download_page_url.or(self.download_page_url),
            artifact_pattern: higher.artifact_pattern.or(self.artifact_pattern),
            webhook_url: higher.webhook_url.or(self.webhook_url),
            owner: higher.owner.or(self.owner),
            server_executable: higher.server_executable.or(self.server_executable),
            restart_grace_secs: higher.restart_grace_secs.or(self.restart_grace_secs),
            check_interval_secs: higher.check_interval_secs.or(self.check_interval_secs),
            request_timeout_secs: higher.request_timeout_secs.or(self.request_timeout_secs),
            preserve: higher.preserve.or(self.preserve),
        }
    }

    /// Check the values this layer sets. `source` names the layer in errors.
    pub fn validate(&self, source: &str) -> Result<()> {
        let invalid = |msg: String| -> anyhow::Error {
            StewardError::Config(format!("{source}: {msg}")).into()
        };

        if let Some(pattern) = &self.artifact_pattern {
            regex::Regex::new(pattern)
                .map_err(|e| invalid(format!("artifact_pattern is not a valid regex: {e}")))?;
        }

        for (key, url) in [
            ("download_page_url", &self.download_page_url),
            ("webhook_url", &self.webhook_url),
        ] {
            if let Some(url) = url
                && !(url.starts_with("http://") || url.starts_with("https://"))
            {
                return Err(invalid(format!("{key} must be an http(s) URL, got '{url}'")));
            }
        }

        for (key, value) in [
            ("check_interval_secs", self.check_interval_secs),
            ("request_timeout_secs", self.request_timeout_secs),
        ] {
            if value == Some(0) {
                return Err(invalid(format!("{key} must be greater than zero")));
            }
        }

        if let Some(exe) = &self.server_executable
            && !is_plain_relative(Path::new(exe))
        {
            return Err(invalid(format!(
                "server_executable must be a path relative to server_dir, got '{exe}'"
            )));
        }

        if let Some(items) = &self.preserve {
            for item in items {
                if !is_plain_relative(Path::new(item)) {
                    return Err(invalid(format!(
                        "preserve entries must be relative paths inside the install, got '{item}'"
                    )));
                }
            }
        }

        if let Some(owner) = &self.owner
            && owner.trim().is_empty()
        {
            return Err(invalid("owner must not be empty".to_string()));
        }

        Ok(())
    }
}

/// A non-empty relative path made only of normal components.
fn is_plain_relative(path: &Path) -> bool {
    path.components().next().is_some()
        && path.components().all(|c| matches!(c, Component::Normal(_)))
}
