//! `steward backups list|prune`.

use super::common::CommandContext;
use crate::update::BackupManager;
use anyhow::Result;
use clap::{Args, Subcommand};
use colored::Colorize;

#[derive(Args, Debug)]
pub struct BackupsCommand {
    #[command(subcommand)]
    command: BackupsSubcommands,
}

#[derive(Subcommand, Debug)]
enum BackupsSubcommands {
    /// List snapshots, oldest first.
    List,

    /// Delete all but the newest KEEP snapshots.
    Prune {
        #[arg(long)]
        keep: usize,
    },
}

impl BackupsCommand {
    pub async fn execute(self, ctx: &CommandContext) -> Result<()> {
        let manager = BackupManager::new(&ctx.config);

        match self.command {
            BackupsSubcommands::List => {
                let snapshots = manager.list().await?;
                if snapshots.is_empty() {
                    println!("No snapshots in {}", ctx.config.backup_dir.display());
                }
                for snapshot in snapshots {
                    println!("{}  {}", snapshot.name.bold(), snapshot.path.display());
                }
            }
            BackupsSubcommands::Prune { keep } => {
                let removed = manager.prune(keep).await?;
                println!("{} Removed {} snapshot(s)", "✓".green(), removed.len());
            }
        }
        Ok(())
    }
}
