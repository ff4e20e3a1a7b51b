//! `steward` - Bedrock Dedicated Server steward
//!
//! Entry point: parses arguments, runs the command, and turns any error that
//! reaches here into a readable message and exit status 1.

use anyhow::Result;
use bedrock_steward::cli;
use bedrock_steward::core::user_friendly_error;
use clap::Parser;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = cli::Cli::parse();

    // Set up colored output for Windows
    #[cfg(windows)]
    colored::control::set_virtual_terminal(true).ok();

    match cli.execute().await {
        Ok(()) => Ok(()),
        Err(e) => {
            user_friendly_error(e).display();
            std::process::exit(1);
        }
    }
}
