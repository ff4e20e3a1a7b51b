//! Integration test suite for steward
//!
//! End-to-end tests that run the `steward` binary against an isolated
//! install laid out in a temp directory. No test reaches the network: the
//! configured download page is a closed local port.
//!
//! # Running Integration Tests
//!
//! ```bash
//! cargo test --test integration
//! ```
//!
//! # Test Organization
//!
//! - **cli_config**: configuration layering and `config show|path`
//! - **cli_content**: `properties` and `worlds`
//! - **cli_packs**: `packs install`
//! - **cli_server**: `status`, `start`, `stop`, `update` and `backups`

// Shared test utilities (from parent tests/ directory)
#[path = "../common/mod.rs"]
mod common;

mod cli_config;
mod cli_content;
mod cli_packs;
mod cli_server;
