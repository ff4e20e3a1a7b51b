//! `steward config show|path`.

use super::common::CommandContext;
use crate::config::ConfigLayer;
use anyhow::Result;
use clap::{Args, Subcommand};

#[derive(Args, Debug)]
pub struct ConfigCommand {
    #[command(subcommand)]
    command: Option<ConfigSubcommands>,
}

#[derive(Subcommand, Debug)]
enum ConfigSubcommands {
    /// Print the effective configuration as TOML (the default).
    Show,

    /// Print the path of the configuration file in use.
    Path,
}

impl ConfigCommand {
    pub fn execute(self, ctx: &CommandContext) -> Result<()> {
        match self.command {
            Some(ConfigSubcommands::Show) | None => print!("{}", ctx.config.to_toml()?),
            Some(ConfigSubcommands::Path) => {
                let path = match &ctx.config_path {
                    Some(path) => path.clone(),
                    None => ConfigLayer::default_path()?,
                };
                println!("{}", path.display());
            }
        }
        Ok(())
    }
}
