//! Test utilities for steward
//!
//! Helpers shared by unit tests and the integration suite (enabled there via
//! the `test-utils` feature):
//!
//! - [`init_test_logging`] - one-time tracing setup that writes through the test harness
//! - [`test_config`] - a [`StewardConfig`] whose roots all live under one temp directory
//! - [`zip_fixture`] - build small zip archives from in-memory entries
//! - [`pack_manifest`] - render a pack `manifest.json`
//!
//! # Example
//!
//! ```rust,no_run
//! use bedrock_steward::test_utils::{test_config, zip_fixture};
//! use tempfile::tempdir;
//!
//! let temp = tempdir().unwrap();
//! let config = test_config(temp.path());
//! zip_fixture(&temp.path().join("build.zip"), &[("bedrock_server", "binary")]);
//! assert!(config.server_dir.starts_with(temp.path()));
//! ```

use crate::config::StewardConfig;
use crate::constants::{
    DEFAULT_CHECK_INTERVAL_SECS, DEFAULT_PRESERVE, LINUX_ARTIFACT_PATTERN,
    default_server_executable,
};
use std::io::Write;
use std::path::Path;
use std::sync::Once;
use tracing::Level;
use tracing_subscriber::EnvFilter;
use zip::write::SimpleFileOptions;

/// Global flag to ensure logging is only initialized once in tests
static INIT_LOGGING: Once = Once::new();

/// Initialize logging for tests.
///
/// Only the first call has an effect. Uses `level` when given, otherwise
/// `RUST_LOG`; with neither, tests run silently.
///
/// ```bash
/// RUST_LOG=bedrock_steward=debug cargo test
/// ```
pub fn init_test_logging(level: Option<Level>) {
    INIT_LOGGING.call_once(|| {
        let filter = if let Some(level) = level {
            EnvFilter::new(level.to_string())
        } else if std::env::var("RUST_LOG").is_ok() {
            EnvFilter::from_default_env()
        } else {
            return;
        };

        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .with_target(true)
            .with_thread_ids(false)
            .try_init();
    });
}

/// Configuration rooted at `base`: `server/`, `tmp/`, `backups/`, `state/`.
///
/// No owner, no webhook, zero restart grace. Built directly so it does not
/// depend on the home directory.
pub fn test_config(base: &Path) -> StewardConfig {
    StewardConfig {
        server_dir: base.join("server"),
        temp_dir: base.join("tmp"),
        backup_dir: base.join("backups"),
        state_dir: base.join("state"),
        download_page_url: "https://example.invalid/download".to_string(),
        artifact_pattern: LINUX_ARTIFACT_PATTERN.to_string(),
        webhook_url: None,
        owner: None,
        server_executable: default_server_executable().to_string(),
        restart_grace_secs: 0,
        check_interval_secs: DEFAULT_CHECK_INTERVAL_SECS,
        request_timeout_secs: 5,
        preserve: DEFAULT_PRESERVE.iter().map(ToString::to_string).collect(),
    }
}

/// Write a zip archive at `path` containing `entries` (`name`, `content`).
///
/// Names ending in `/` become directory entries. Panics on I/O errors.
pub fn zip_fixture(path: &Path, entries: &[(&str, &str)]) {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).unwrap();
    }

    let file = std::fs::File::create(path).unwrap();
    let mut zip = zip::ZipWriter::new(file);
    let options = SimpleFileOptions::default().unix_permissions(0o755);

    for (name, content) in entries {
        if name.ends_with('/') {
            zip.add_directory(*name, options).unwrap();
        } else {
            zip.start_file(*name, options).unwrap();
            zip.write_all(content.as_bytes()).unwrap();
        }
    }

    zip.finish().unwrap();
}

/// A pack `manifest.json` with one module of `module_type`.
pub fn pack_manifest(name: &str, uuid: &str, version: [u32; 3], module_type: &str) -> String {
    serde_json::json!({
        "format_version": 2,
        "header": {
            "name": name,
            "description": format!("{name} test pack"),
            "uuid": uuid,
            "version": version,
            "min_engine_version": [1, 20, 0]
        },
        "modules": [{
            "type": module_type,
            "uuid": "5f2b8c9e-0000-4000-8000-000000000001",
            "version": version
        }]
    })
    .to_string()
}
