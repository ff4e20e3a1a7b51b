//! Layered configuration for steward
//!
//! Configuration comes from three sources, merged field by field with the
//! precedence **command line > config file > built-in defaults**:
//!
//! 1. [`ConfigLayer::defaults`] - directories under `~/.bedrock-steward`,
//!    the official download page, a 3 second restart grace
//! 2. the TOML file at `~/.bedrock-steward/config.toml` (or `--config` /
//!    `STEWARD_CONFIG`)
//! 3. directory and webhook overrides given on the command line
//!
//! Each [`ConfigLayer`] is validated on its own, then
//! [`StewardConfig::resolve`] merges them and checks the cross-field
//! invariants (absolute paths, disjoint managed roots).
//!
//! # Example config file
//!
//! ```toml
//! server_dir = "~/bedrock/server"
//! temp_dir = "~/bedrock/tmp"
//! backup_dir = "~/bedrock/backups"
//! owner = "minecraft:minecraft"
//! check_interval_secs = 1800
//! ```

mod layer;
mod settings;

pub use layer::ConfigLayer;
pub use settings::StewardConfig;
