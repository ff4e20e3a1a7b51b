//! bedrock-steward - Bedrock Dedicated Server lifecycle manager
//!
//! Keeps one Bedrock Dedicated Server installation up to date and running:
//! it detects new upstream releases, swaps in new server builds while keeping
//! worlds and configuration, supervises the server process, and installs
//! behavior/resource packs into worlds.
//!
//! # Architecture Overview
//!
//! Three directory roots are owned by steward and are the only places it will
//! ever delete from or change ownership of:
//!
//! - `server_dir` - the active installation
//! - `temp_dir` - downloads, extractions, retired installs and pack uploads
//! - `backup_dir` - timestamped snapshots of the installation
//!
//! A fourth directory, `state_dir`, holds the version marker, the pid file,
//! the update lock and the server log.
//!
//! # Core Modules
//!
//! - [`update`] - the check → stop → backup → fetch → extract → swap →
//!   restore → restart pipeline and its rollback policy
//! - [`supervisor`] - start/stop/restart/liveness of the server process
//! - [`packs`] - pack manifests, per-world registries and the pack installer
//! - [`server`] - `server.properties` and world selection
//! - [`config`] - layered configuration (defaults, file, command line)
//! - [`core`] - error taxonomy and the `{success, message}` outcome type
//! - [`cli`] - the `steward` command-line interface
//! - [`utils`] - filesystem helpers and the managed-root guard
//!
//! # Example
//!
//! ```rust,no_run
//! use bedrock_steward::config::{ConfigLayer, StewardConfig};
//! use bedrock_steward::supervisor::ProcessSupervisor;
//! use bedrock_steward::update::ServerUpdater;
//! use std::sync::Arc;
//!
//! # async fn example() -> anyhow::Result<()> {
//! let config = StewardConfig::resolve(
//!     ConfigLayer::defaults()?,
//!     ConfigLayer::load_optional(None).await?,
//!     ConfigLayer::default(),
//! )?;
//! let supervisor = Arc::new(ProcessSupervisor::new(&config));
//! let updater = ServerUpdater::from_config(&config, supervisor, false)?;
//!
//! let outcome = updater.check_and_install().await;
//! println!("{}: {}", outcome.success, outcome.message);
//! # Ok(())
//! # }
//! ```

pub mod cli;
pub mod config;
pub mod constants;
pub mod core;
pub mod packs;
pub mod server;
pub mod supervisor;
pub mod update;
pub mod utils;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
