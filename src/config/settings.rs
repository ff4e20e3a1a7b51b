//! The effective, fully-resolved configuration.

use super::ConfigLayer;
use crate::constants::{
    PID_FILE, SERVER_LOG_FILE, UPDATE_LOCK_FILE, UPLOADS_DIR, VERSION_MARKER_FILE,
};
use crate::core::StewardError;
use crate::utils::platform::resolve_path;
use crate::utils::roots::ManagedRoots;
use anyhow::{Context, Result};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Configuration after merging defaults, the config file and CLI overrides.
///
/// All directories are absolute and `~`-expanded. The three managed roots
/// (`server_dir`, `temp_dir`, `backup_dir`) and `state_dir` are pairwise
/// disjoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StewardConfig {
    pub server_dir: PathBuf,
    pub temp_dir: PathBuf,
    pub backup_dir: PathBuf,
    pub state_dir: PathBuf,
    pub download_page_url: String,
    pub artifact_pattern: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub webhook_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub owner: Option<String>,
    pub server_executable: String,
    pub restart_grace_secs: u64,
    pub check_interval_secs: u64,
    pub request_timeout_secs: u64,
    pub preserve: Vec<String>,
}

impl StewardConfig {
    /// Merge the three layers (cli > file > defaults) and validate the result.
    ///
    /// Each layer is validated on its own first so errors name their source.
    ///
    /// # Examples
    ///
    /// ```rust,no_run
    /// use bedrock_steward::config::{ConfigLayer, StewardConfig};
    /// use std::path::PathBuf;
    ///
    /// # fn example() -> anyhow::Result<()> {
    /// let cli = ConfigLayer {
    ///     server_dir: Some(PathBuf::from("/srv/bedrock/server")),
    ///     ..Default::default()
    /// };
    /// let config = StewardConfig::resolve(ConfigLayer::defaults()?, ConfigLayer::default(), cli)?;
    /// assert_eq!(config.server_dir, PathBuf::from("/srv/bedrock/server"));
    /// # Ok(())
    /// # }
    /// ```
    pub fn resolve(defaults: ConfigLayer, file: ConfigLayer, cli: ConfigLayer) -> Result<Self> {
        defaults.validate("built-in defaults")?;
        file.validate("config file")?;
        cli.validate("command line")?;

        let merged = defaults.merge(file).merge(cli);
        Self::from_layer(merged)
    }

    /// Build from a single, already merged layer.
    pub fn from_layer(layer: ConfigLayer) -> Result<Self> {
        let config = Self {
            server_dir: expand_dir("server_dir", layer.server_dir)?,
            temp_dir: expand_dir("temp_dir", layer.temp_dir)?,
            backup_dir: expand_dir("backup_dir", layer.backup_dir)?,
            state_dir: expand_dir("state_dir", layer.state_dir)?,
            download_page_url: required("download_page_url", layer.download_page_url)?,
            artifact_pattern: required("artifact_pattern", layer.artifact_pattern)?,
            webhook_url: layer.webhook_url,
            owner: layer.owner,
            server_executable: required("server_executable", layer.server_executable)?,
            restart_grace_secs: required("restart_grace_secs", layer.restart_grace_secs)?,
            check_interval_secs: required("check_interval_secs", layer.check_interval_secs)?,
            request_timeout_secs: required("request_timeout_secs", layer.request_timeout_secs)?,
            preserve: layer.preserve.unwrap_or_default(),
        };

        config.validate()?;
        Ok(config)
    }

    /// Check the invariants that only hold across fields.
    pub fn validate(&self) -> Result<()> {
        let roots = [
            ("server_dir", &self.server_dir),
            ("temp_dir", &self.temp_dir),
            ("backup_dir", &self.backup_dir),
            ("state_dir", &self.state_dir),
        ];

        for (i, (name_a, a)) in roots.iter().enumerate() {
            for (name_b, b) in roots.iter().skip(i + 1) {
                if a.starts_with(b) || b.starts_with(a) {
                    return Err(StewardError::Config(format!(
                        "{name_a} ({}) and {name_b} ({}) must be disjoint directories",
                        a.display(),
                        b.display()
                    ))
                    .into());
                }
            }
        }

        Ok(())
    }

    /// Guard over the three directories steward may modify destructively.
    #[must_use]
    pub fn managed_roots(&self) -> ManagedRoots {
        ManagedRoots::new([&self.server_dir, &self.temp_dir, &self.backup_dir])
    }

    #[must_use]
    pub fn marker_path(&self) -> PathBuf {
        self.state_dir.join(VERSION_MARKER_FILE)
    }

    #[must_use]
    pub fn pid_file(&self) -> PathBuf {
        self.state_dir.join(PID_FILE)
    }

    #[must_use]
    pub fn lock_file(&self) -> PathBuf {
        self.state_dir.join(UPDATE_LOCK_FILE)
    }

    #[must_use]
    pub fn server_log(&self) -> PathBuf {
        self.state_dir.join(SERVER_LOG_FILE)
    }

    /// Full path of the server executable inside the install root.
    #[must_use]
    pub fn executable_path(&self) -> PathBuf {
        self.server_dir.join(&self.server_executable)
    }

    /// Where uploaded pack archives are staged before installation.
    #[must_use]
    pub fn uploads_dir(&self) -> PathBuf {
        self.temp_dir.join(UPLOADS_DIR)
    }

    #[must_use]
    pub const fn restart_grace(&self) -> Duration {
        Duration::from_secs(self.restart_grace_secs)
    }

    #[must_use]
    pub const fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    #[must_use]
    pub const fn check_interval(&self) -> Duration {
        Duration::from_secs(self.check_interval_secs)
    }

    /// Render as TOML for `steward config show`.
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).context("Failed to serialize effective configuration")
    }
}

fn required<T>(key: &str, value: Option<T>) -> Result<T> {
    value.ok_or_else(|| StewardError::Config(format!("{key} is not set")).into())
}

fn expand_dir(key: &str, value: Option<PathBuf>) -> Result<PathBuf> {
    let raw = required(key, value)?;
    let expanded = resolve_path(&raw.to_string_lossy())
        .with_context(|| format!("Failed to expand {key}"))?;

    if !expanded.is_absolute() {
        return Err(StewardError::Config(format!(
            "{key} must be an absolute path, got '{}'",
            expanded.display()
        ))
        .into());
    }

    Ok(strip_trailing(&expanded))
}

/// Rebuild from components so `a/b/` and `a/b` compare equal.
fn strip_trailing(path: &Path) -> PathBuf {
    path.components().collect()
}
