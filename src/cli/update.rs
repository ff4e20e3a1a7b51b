//! One-shot update check.

use super::common::{CommandContext, report};
use anyhow::Result;
use clap::Args;

#[derive(Args, Debug)]
pub struct UpdateCommand {}

impl UpdateCommand {
    /// Run `check_and_install` once; a failed outcome exits with status 1.
    pub async fn execute(self, ctx: &CommandContext) -> Result<()> {
        let updater = ctx.updater(ctx.supervisor())?;
        report(updater.check_and_install().await)
    }
}
