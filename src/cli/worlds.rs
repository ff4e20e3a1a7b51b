//! `steward worlds list|activate`.

use super::common::CommandContext;
use crate::constants::{LEVEL_NAME_KEY, SERVER_PROPERTIES_FILE};
use crate::core::StewardError;
use crate::server::{ServerProperties, activate_world, list_worlds};
use anyhow::Result;
use clap::{Args, Subcommand};
use colored::Colorize;

#[derive(Args, Debug)]
pub struct WorldsCommand {
    #[command(subcommand)]
    command: WorldsSubcommands,
}

#[derive(Subcommand, Debug)]
enum WorldsSubcommands {
    /// List world folders; the active one is marked with `*`.
    List,

    /// Make the server load NAME on its next start.
    Activate { name: String },
}

impl WorldsCommand {
    pub async fn execute(self, ctx: &CommandContext) -> Result<()> {
        let server_dir = &ctx.config.server_dir;

        match self.command {
            WorldsSubcommands::List => {
                let properties =
                    ServerProperties::load(&server_dir.join(SERVER_PROPERTIES_FILE)).await?;
                let active = properties.get(LEVEL_NAME_KEY);

                let worlds = list_worlds(server_dir).await?;
                if worlds.is_empty() {
                    println!("No worlds found in {}", server_dir.display());
                }
                for world in worlds {
                    if Some(world.as_str()) == active {
                        println!("* {}", world.bold());
                    } else {
                        println!("  {world}");
                    }
                }
                Ok(())
            }
            WorldsSubcommands::Activate { name } => {
                if activate_world(server_dir, &name).await? {
                    println!("{} '{}' will be loaded on the next start", "✓".green(), name);
                    Ok(())
                } else {
                    Err(StewardError::WorldNotFound(name).into())
                }
            }
        }
    }
}
