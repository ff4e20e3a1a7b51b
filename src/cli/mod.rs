//! Command-line interface for steward.
//!
//! Each command lives in its own module with a clap `Args`/`Subcommand`
//! structure and an `execute` method taking the resolved
//! [`CommandContext`].
//!
//! # Available Commands
//!
//! ## Server lifecycle
//! - `update` - check for a new release and install it
//! - `watch` - run `update` on an interval until interrupted
//! - `start` / `stop` / `restart` / `status` - control the server process
//!
//! ## Server content
//! - `properties` - read and edit `server.properties`
//! - `worlds` - list worlds and choose the active one
//! - `packs` - install behavior/resource pack archives into a world
//! - `backups` - list and prune install snapshots
//!
//! ## Configuration
//! - `config` - show the effective configuration
//!
//! # Configuration layering
//!
//! Settings are merged field by field: built-in defaults, then the TOML file
//! (`--config`, `STEWARD_CONFIG`, or `~/.bedrock-steward/config.toml`), then
//! the directory and webhook flags given on the command line.
//!
//! ```bash
//! steward --server-dir /srv/bedrock update
//! steward -c /etc/steward.toml watch --interval 900 --keep-alive
//! steward packs install ./addon.mcaddon --world "Bedrock level"
//! ```

mod backups;
mod common;
mod config;
mod packs;
mod properties;
mod server;
mod update;
mod watch;
mod worlds;

#[cfg(test)]
mod tests;

pub use common::CommandContext;

use crate::config::{ConfigLayer, StewardConfig};
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::io::IsTerminal;
use std::path::{Path, PathBuf};
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(
    name = "steward",
    about = "Update, back up and supervise a Bedrock Dedicated Server",
    version,
    long_about = "steward keeps a Bedrock Dedicated Server installation up to date. It swaps in \
                  new releases while preserving worlds and configuration, supervises the server \
                  process, and installs behavior/resource packs into worlds."
)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable debug logging (equivalent to `RUST_LOG=debug`).
    #[arg(short, long, global = true, conflicts_with = "quiet")]
    verbose: bool,

    /// Only log warnings and errors.
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Path to the configuration file.
    ///
    /// Defaults to `~/.bedrock-steward/config.toml`; a missing default file is
    /// fine, a missing explicit file is an error.
    #[arg(short, long, global = true, env = "STEWARD_CONFIG")]
    config: Option<PathBuf>,

    /// Install root of the server (overrides the config file).
    #[arg(long, global = true)]
    server_dir: Option<PathBuf>,

    /// Staging area for downloads, extractions and uploads.
    #[arg(long, global = true)]
    temp_dir: Option<PathBuf>,

    /// Where install snapshots are written.
    #[arg(long, global = true)]
    backup_dir: Option<PathBuf>,

    /// Where the version marker, pid file, lock and server log live.
    #[arg(long, global = true)]
    state_dir: Option<PathBuf>,

    /// Webhook receiving `{"content": ...}` update notifications.
    #[arg(long, global = true)]
    webhook_url: Option<String>,

    /// Disable download progress bars.
    #[arg(long, global = true)]
    no_progress: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Check for a new server release and install it if there is one.
    Update(update::UpdateCommand),

    /// Periodically check for updates until interrupted.
    Watch(watch::WatchCommand),

    /// Start the server if it is not running.
    Start,

    /// Ask the server to shut down.
    Stop,

    /// Stop the server, wait for the grace period, and start it again.
    Restart,

    /// Show whether the server is running and which version is installed.
    Status,

    /// Read or edit `server.properties`.
    Properties(properties::PropertiesCommand),

    /// List worlds or choose the one the server loads.
    Worlds(worlds::WorldsCommand),

    /// Install behavior and resource packs.
    Packs(packs::PacksCommand),

    /// Manage install snapshots.
    Backups(backups::BackupsCommand),

    /// Inspect the effective configuration.
    Config(config::ConfigCommand),
}

impl Cli {
    /// Execute the parsed command.
    pub async fn execute(self) -> Result<()> {
        self.init_logging();

        let config_path = self.config_file_path()?;
        let config = self.load_config(config_path.as_deref()).await?;
        debug!("Effective configuration: {:?}", config);

        let ctx = CommandContext::new(config, config_path, self.show_progress());

        match self.command {
            Commands::Update(cmd) => cmd.execute(&ctx).await,
            Commands::Watch(cmd) => cmd.execute(&ctx).await,
            Commands::Start => server::start(&ctx).await,
            Commands::Stop => server::stop(&ctx).await,
            Commands::Restart => server::restart(&ctx).await,
            Commands::Status => server::status(&ctx).await,
            Commands::Properties(cmd) => cmd.execute(&ctx).await,
            Commands::Worlds(cmd) => cmd.execute(&ctx).await,
            Commands::Packs(cmd) => cmd.execute(&ctx).await,
            Commands::Backups(cmd) => cmd.execute(&ctx).await,
            Commands::Config(cmd) => cmd.execute(&ctx),
        }
    }

    /// `RUST_LOG` wins; otherwise `-v` means debug, `-q` warn, default info.
    fn log_filter(&self) -> EnvFilter {
        if std::env::var("RUST_LOG").is_ok() {
            return EnvFilter::from_default_env();
        }
        let level = if self.verbose {
            "debug"
        } else if self.quiet {
            "warn"
        } else {
            "info"
        };
        EnvFilter::new(level)
    }

    fn init_logging(&self) {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(self.log_filter())
            .with_writer(std::io::stderr)
            .with_target(self.verbose)
            .try_init();
    }

    fn show_progress(&self) -> bool {
        !self.no_progress && !self.quiet && std::io::stderr().is_terminal()
    }

    /// Overrides given on the command line, relative paths made absolute.
    fn cli_layer(&self) -> Result<ConfigLayer> {
        let cwd = std::env::current_dir().context("Failed to determine the current directory")?;
        let absolute = |path: &Option<PathBuf>| path.as_ref().map(|p| absolutize(&cwd, p));

        Ok(ConfigLayer {
            server_dir: absolute(&self.server_dir),
            temp_dir: absolute(&self.temp_dir),
            backup_dir: absolute(&self.backup_dir),
            state_dir: absolute(&self.state_dir),
            webhook_url: self.webhook_url.clone(),
            ..ConfigLayer::default()
        })
    }

    fn config_file_path(&self) -> Result<Option<PathBuf>> {
        match &self.config {
            Some(path) => {
                let cwd =
                    std::env::current_dir().context("Failed to determine the current directory")?;
                Ok(Some(absolutize(&cwd, path)))
            }
            None => Ok(None),
        }
    }

    async fn load_config(&self, config_path: Option<&Path>) -> Result<StewardConfig> {
        let defaults = ConfigLayer::defaults()?;
        let file = ConfigLayer::load_optional(config_path).await?;
        StewardConfig::resolve(defaults, file, self.cli_layer()?)
    }
}

fn absolutize(cwd: &Path, path: &Path) -> PathBuf {
    let text = path.to_string_lossy();
    if path.is_absolute() || text.starts_with('~') || text.starts_with('$') {
        path.to_path_buf()
    } else {
        cwd.join(path)
    }
}
