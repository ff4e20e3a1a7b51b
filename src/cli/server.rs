//! `start`, `stop`, `restart` and `status`.

use super::common::CommandContext;
use crate::supervisor::ServerControl;
use crate::update::VersionMarker;
use anyhow::Result;
use colored::Colorize;

pub async fn start(ctx: &CommandContext) -> Result<()> {
    let supervisor = ctx.supervisor();
    supervisor.start().await?;
    print_state(ctx, supervisor.is_running().await, supervisor.pid().await);
    Ok(())
}

pub async fn stop(ctx: &CommandContext) -> Result<()> {
    let supervisor = ctx.supervisor();
    if supervisor.pid().await.is_none() {
        println!("Server is not running");
        return Ok(());
    }
    supervisor.stop().await?;
    println!("{} Stop requested", "✓".green());
    Ok(())
}

pub async fn restart(ctx: &CommandContext) -> Result<()> {
    let supervisor = ctx.supervisor();
    supervisor.restart().await?;
    print_state(ctx, supervisor.is_running().await, supervisor.pid().await);
    Ok(())
}

pub async fn status(ctx: &CommandContext) -> Result<()> {
    let supervisor = ctx.supervisor();
    let running = supervisor.is_running().await;
    print_state(ctx, running, supervisor.pid().await);

    let version = VersionMarker::new(ctx.config.marker_path()).read().await?;
    match version {
        Some(version) => println!("Installed version: {}", version.bold()),
        None => println!("Installed version: {}", "none".dimmed()),
    }
    println!("Install root: {}", ctx.config.server_dir.display());
    Ok(())
}

fn print_state(ctx: &CommandContext, running: bool, pid: Option<u32>) {
    match (running, pid) {
        (true, Some(pid)) => println!("Server is {} (pid {pid})", "running".green()),
        (true, None) => println!("Server is {}", "running".green()),
        (false, _) if !ctx.config.executable_path().exists() => println!(
            "Server is {} (no executable at {}; run `steward update` first)",
            "not installed".yellow(),
            ctx.config.executable_path().display()
        ),
        (false, _) => println!("Server is {}", "stopped".red()),
    }
}
