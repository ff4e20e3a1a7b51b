//! Periodic update checks.

use super::common::CommandContext;
use crate::update::UpdateScheduler;
use anyhow::Result;
use clap::Args;
use std::time::Duration;
use tokio::signal;
use tracing::{debug, info, warn};

#[derive(Args, Debug)]
pub struct WatchCommand {
    /// Seconds between checks (defaults to `check_interval_secs`).
    #[arg(long, value_parser = clap::value_parser!(u64).range(1..))]
    interval: Option<u64>,

    /// Start the server whenever a tick finds it not running.
    #[arg(long)]
    keep_alive: bool,
}

impl WatchCommand {
    /// Check on every tick until Ctrl-C or SIGTERM.
    ///
    /// A signal received mid-check is acted on once that check returns.
    pub async fn execute(self, ctx: &CommandContext) -> Result<()> {
        let period = self.interval.map_or(ctx.config.check_interval(), Duration::from_secs);
        let updater = ctx.updater(ctx.supervisor())?;

        info!("Checking for updates every {:?}", period);
        let checks = UpdateScheduler::new(&updater, period)
            .keep_alive(self.keep_alive)
            .run(shutdown_signal())
            .await;
        debug!("Ran {} update checks", checks);
        Ok(())
    }
}

async fn shutdown_signal() {
    #[cfg(unix)]
    {
        tokio::select! {
            () = ctrl_c() => {},
            () = terminate() => {},
        }
    }

    #[cfg(not(unix))]
    {
        ctrl_c().await;
    }
}

async fn ctrl_c() {
    if let Err(err) = signal::ctrl_c().await {
        warn!(?err, "failed to install Ctrl+C handler");
        std::future::pending::<()>().await;
    }
}

#[cfg(unix)]
async fn terminate() {
    use tokio::signal::unix::{SignalKind, signal};

    match signal(SignalKind::terminate()) {
        Ok(mut term) => {
            term.recv().await;
        }
        Err(err) => {
            warn!(?err, "failed to install SIGTERM handler");
            std::future::pending::<()>().await;
        }
    }
}
