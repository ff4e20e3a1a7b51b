//! State shared by every command.

use crate::config::StewardConfig;
use crate::core::Outcome;
use crate::supervisor::ProcessSupervisor;
use crate::update::ServerUpdater;
use anyhow::Result;
use colored::Colorize;
use std::path::PathBuf;
use std::sync::Arc;

/// Resolved configuration plus presentation flags for one invocation.
#[derive(Debug)]
pub struct CommandContext {
    pub config: StewardConfig,
    /// The config file given on the command line, if any.
    pub config_path: Option<PathBuf>,
    pub show_progress: bool,
}

impl CommandContext {
    #[must_use]
    pub fn new(config: StewardConfig, config_path: Option<PathBuf>, show_progress: bool) -> Self {
        Self {
            config,
            config_path,
            show_progress,
        }
    }

    /// A supervisor adopting whatever pid the pid file records.
    #[must_use]
    pub fn supervisor(&self) -> Arc<ProcessSupervisor> {
        Arc::new(ProcessSupervisor::new(&self.config))
    }

    pub fn updater(&self, supervisor: Arc<ProcessSupervisor>) -> Result<ServerUpdater> {
        ServerUpdater::from_config(&self.config, supervisor, self.show_progress)
    }
}

/// Print a successful outcome, or turn a failed one into an error so the
/// process exits with status 1.
pub fn report(outcome: Outcome) -> Result<()> {
    if outcome.success {
        println!("{} {}", "✓".green(), outcome.message);
        Ok(())
    } else {
        Err(anyhow::anyhow!(outcome.message))
    }
}
