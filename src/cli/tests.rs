//! Argument parsing and configuration layering for the CLI.

use super::{Cli, Commands, absolutize};
use clap::Parser;
use serial_test::serial;
use std::path::{Path, PathBuf};

#[test]
fn test_cli_parsing() {
    assert!(Cli::try_parse_from(["steward", "--help"]).is_err());
    assert!(Cli::try_parse_from(["steward"]).is_err());

    let cli = Cli::try_parse_from(["steward", "status"]).unwrap();
    assert!(matches!(cli.command, Commands::Status));
}

#[test]
fn test_verbose_and_quiet_conflict() {
    assert!(Cli::try_parse_from(["steward", "-v", "-q", "status"]).is_err());

    let cli = Cli::try_parse_from(["steward", "update", "--verbose"]).unwrap();
    assert!(cli.verbose);
    assert!(!cli.quiet);
}

#[test]
fn test_global_directory_overrides() {
    let cli = Cli::try_parse_from([
        "steward",
        "--server-dir",
        "/srv/bedrock",
        "backups",
        "--backup-dir",
        "/srv/snapshots",
        "list",
    ])
    .unwrap();

    let layer = cli.cli_layer().unwrap();
    assert_eq!(layer.server_dir, Some(PathBuf::from("/srv/bedrock")));
    assert_eq!(layer.backup_dir, Some(PathBuf::from("/srv/snapshots")));
    assert_eq!(layer.temp_dir, None);
    assert_eq!(layer.artifact_pattern, None);
}

#[test]
fn test_watch_interval_must_be_positive() {
    assert!(Cli::try_parse_from(["steward", "watch", "--interval", "0"]).is_err());

    let cli =
        Cli::try_parse_from(["steward", "watch", "--interval", "60", "--keep-alive"]).unwrap();
    assert!(matches!(cli.command, Commands::Watch(_)));
}

#[test]
fn test_packs_install_arguments() {
    let cli = Cli::try_parse_from([
        "steward",
        "packs",
        "install",
        "addon.mcpack",
        "--world",
        "Bedrock level",
        "--category",
        "rp",
    ]);
    assert!(cli.is_ok());

    let missing_world = Cli::try_parse_from(["steward", "packs", "install", "addon.mcpack"]);
    assert!(missing_world.is_err());

    let bad_category = Cli::try_parse_from([
        "steward", "packs", "install", "a.zip", "--world", "w", "--category", "skins",
    ]);
    assert!(bad_category.is_err());
}

#[test]
fn test_properties_set_requires_assignment() {
    assert!(Cli::try_parse_from(["steward", "properties", "set"]).is_err());
    assert!(Cli::try_parse_from(["steward", "properties", "set", "gamemode"]).is_err());
    assert!(Cli::try_parse_from(["steward", "properties", "set", "gamemode=creative"]).is_ok());
}

#[test]
#[serial]
fn test_log_filter_levels() {
    let quiet = Cli::try_parse_from(["steward", "-q", "status"]).unwrap();
    let verbose = Cli::try_parse_from(["steward", "-v", "status"]).unwrap();

    if std::env::var("RUST_LOG").is_err() {
        assert_eq!(quiet.log_filter().to_string(), "warn");
        assert_eq!(verbose.log_filter().to_string(), "debug");
    }
}

#[test]
#[serial]
fn test_rust_log_overrides_flags() {
    let cli = Cli::try_parse_from(["steward", "-v", "status"]).unwrap();
    let previous = std::env::var("RUST_LOG").ok();

    // SAFETY: every test reading RUST_LOG is #[serial]
    unsafe { std::env::set_var("RUST_LOG", "bedrock_steward=trace") };
    let filter = cli.log_filter().to_string();
    match previous {
        Some(value) => unsafe { std::env::set_var("RUST_LOG", value) },
        None => unsafe { std::env::remove_var("RUST_LOG") },
    }

    assert_eq!(filter, "bedrock_steward=trace");
}

#[cfg(unix)]
#[test]
fn test_absolutize() {
    let cwd = Path::new("/work");
    assert_eq!(absolutize(cwd, Path::new("data/server")), PathBuf::from("/work/data/server"));
    assert_eq!(absolutize(cwd, Path::new("/srv/x")), PathBuf::from("/srv/x"));
    assert_eq!(absolutize(cwd, Path::new("~/bedrock")), PathBuf::from("~/bedrock"));
}
