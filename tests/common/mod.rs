//! Shared fixtures for the CLI integration suite.
//!
//! [`TestServer`] lays out an isolated steward environment (install root,
//! temp, backup and state directories plus a config file) inside a temp
//! directory and runs the `steward` binary against it.

// Not every helper is used by every test module
#![allow(dead_code)]

use anyhow::{Context, Result};
use assert_cmd::Command;
use bedrock_steward::config::ConfigLayer;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

pub struct TestServer {
    _temp_dir: TempDir,
    root: PathBuf,
    config_path: PathBuf,
}

/// Captured result of one `steward` invocation.
#[derive(Debug)]
pub struct CommandOutput {
    pub stdout: String,
    pub stderr: String,
    pub success: bool,
    pub code: Option<i32>,
}

impl TestServer {
    /// A fresh environment with an empty install root.
    ///
    /// The download page points at a closed local port so any update check
    /// fails fast without leaving the machine.
    pub fn new() -> Result<Self> {
        let temp_dir = TempDir::new()?;
        let root = temp_dir.path().to_path_buf();
        let config_path = root.join("steward.toml");

        let layer = ConfigLayer {
            server_dir: Some(root.join("server")),
            temp_dir: Some(root.join("tmp")),
            backup_dir: Some(root.join("backups")),
            state_dir: Some(root.join("state")),
            download_page_url: Some("http://127.0.0.1:9/download".to_string()),
            restart_grace_secs: Some(0),
            request_timeout_secs: Some(5),
            ..ConfigLayer::default()
        };
        fs::write(&config_path, toml::to_string(&layer)?)?;
        fs::create_dir_all(root.join("server"))?;

        Ok(Self {
            _temp_dir: temp_dir,
            root,
            config_path,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn server_dir(&self) -> PathBuf {
        self.root.join("server")
    }

    pub fn backup_dir(&self) -> PathBuf {
        self.root.join("backups")
    }

    pub fn state_dir(&self) -> PathBuf {
        self.root.join("state")
    }

    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    /// Create `worlds/<name>` in the install root.
    pub fn add_world(&self, name: &str) -> Result<PathBuf> {
        let dir = self.server_dir().join("worlds").join(name);
        fs::create_dir_all(dir.join("db"))?;
        Ok(dir)
    }

    pub fn write_properties(&self, content: &str) -> Result<()> {
        fs::write(self.server_dir().join("server.properties"), content)?;
        Ok(())
    }

    pub fn read_properties(&self) -> Result<String> {
        fs::read_to_string(self.server_dir().join("server.properties"))
            .context("Failed to read server.properties")
    }

    /// A `steward` command wired to this environment.
    ///
    /// `HOME` points into the temp directory so no real config is picked up.
    pub fn command(&self) -> Command {
        let mut cmd = Command::cargo_bin("steward").expect("steward binary is built");
        cmd.current_dir(&self.root)
            .env("STEWARD_CONFIG", &self.config_path)
            .env("HOME", &self.root)
            .env("NO_COLOR", "1")
            .env_remove("RUST_LOG");
        cmd
    }

    pub fn run(&self, args: &[&str]) -> Result<CommandOutput> {
        let output = self.command().args(args).output().context("Failed to run steward")?;

        Ok(CommandOutput {
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
            success: output.status.success(),
            code: output.status.code(),
        })
    }
}
