//! `steward packs install`.

use super::common::{CommandContext, report};
use crate::packs::{PackCategory, PackInstaller};
use crate::utils::fs::ensure_dir;
use anyhow::{Context, Result};
use clap::{Args, Subcommand, ValueEnum};
use std::path::{Path, PathBuf};
use tracing::debug;

#[derive(Args, Debug)]
pub struct PacksCommand {
    #[command(subcommand)]
    command: PacksSubcommands,
}

#[derive(Subcommand, Debug)]
enum PacksSubcommands {
    /// Install a `.mcpack`/`.mcaddon`/`.zip` archive into a world.
    ///
    /// The archive is copied into the staging area first; the original file
    /// is left untouched.
    Install {
        archive: PathBuf,

        /// World whose registry receives the packs.
        #[arg(short, long)]
        world: String,

        /// Category for a single pack whose manifest does not declare one.
        #[arg(long, value_enum)]
        category: Option<CategoryArg>,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum CategoryArg {
    #[value(alias = "bp", alias = "behaviour")]
    Behavior,
    #[value(alias = "rp")]
    Resource,
}

impl From<CategoryArg> for PackCategory {
    fn from(arg: CategoryArg) -> Self {
        match arg {
            CategoryArg::Behavior => Self::Behavior,
            CategoryArg::Resource => Self::Resource,
        }
    }
}

impl PacksCommand {
    pub async fn execute(self, ctx: &CommandContext) -> Result<()> {
        match self.command {
            PacksSubcommands::Install {
                archive,
                world,
                category,
            } => {
                let upload = stage_upload(&ctx.config.uploads_dir(), &archive).await?;
                let installer = PackInstaller::new(&ctx.config);
                report(installer.install(&upload, &world, category.map(Into::into)).await)
            }
        }
    }
}

/// Copy the user's archive into `uploads_dir` under a unique name.
async fn stage_upload(uploads_dir: &Path, archive: &Path) -> Result<PathBuf> {
    ensure_dir(uploads_dir)?;

    let file_name = archive
        .file_name()
        .with_context(|| format!("{} is not a file", archive.display()))?
        .to_string_lossy();
    let staged = uploads_dir.join(format!("{}-{file_name}", uuid::Uuid::new_v4().simple()));

    tokio::fs::copy(archive, &staged)
        .await
        .with_context(|| format!("Failed to read pack archive {}", archive.display()))?;
    debug!("Staged {} as {}", archive.display(), staged.display());
    Ok(staged)
}
