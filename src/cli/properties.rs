//! `steward properties get|set`.

use super::common::CommandContext;
use crate::constants::SERVER_PROPERTIES_FILE;
use crate::core::StewardError;
use crate::server::{ServerProperties, read_properties};
use anyhow::Result;
use clap::{Args, Subcommand};
use colored::Colorize;

#[derive(Args, Debug)]
pub struct PropertiesCommand {
    #[command(subcommand)]
    command: PropertiesSubcommands,
}

#[derive(Subcommand, Debug)]
enum PropertiesSubcommands {
    /// Print one property, or every property when no key is given.
    Get {
        key: Option<String>,
    },

    /// Set one or more properties.
    ///
    /// ```bash
    /// steward properties set gamemode=creative max-players=5
    /// ```
    Set {
        #[arg(required = true, value_parser = parse_assignment)]
        assignments: Vec<(String, String)>,
    },
}

fn parse_assignment(raw: &str) -> Result<(String, String), String> {
    match raw.split_once('=') {
        Some((key, value)) if !key.trim().is_empty() => {
            Ok((key.trim().to_string(), value.trim().to_string()))
        }
        _ => Err(format!("expected KEY=VALUE, got '{raw}'")),
    }
}

impl PropertiesCommand {
    pub async fn execute(self, ctx: &CommandContext) -> Result<()> {
        let path = ctx.config.server_dir.join(SERVER_PROPERTIES_FILE);

        match self.command {
            PropertiesSubcommands::Get { key: None } => {
                for (key, value) in read_properties(&path).await? {
                    println!("{key}={value}");
                }
            }
            PropertiesSubcommands::Get { key: Some(key) } => {
                let properties = ServerProperties::load(&path).await?;
                let value = properties.get(&key).ok_or_else(|| {
                    StewardError::Config(format!(
                        "property '{key}' is not set in {}",
                        path.display()
                    ))
                })?;
                println!("{value}");
            }
            PropertiesSubcommands::Set { assignments } => {
                let mut properties = ServerProperties::load(&path).await?;
                for (key, value) in &assignments {
                    properties.set(key, value)?;
                }
                properties.save().await?;
                let noun = if assignments.len() == 1 { "property" } else { "properties" };
                println!("{} Updated {} {noun}", "✓".green(), assignments.len());
            }
        }
        Ok(())
    }
}
