//! `steward config` and configuration layering.

use crate::common::TestServer;
use predicates::prelude::*;

#[test]
fn test_config_show_prints_effective_values() {
    let server = TestServer::new().unwrap();

    server
        .command()
        .args(["config", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("server_dir"))
        .stdout(predicate::str::contains("restart_grace_secs = 0"))
        .stdout(predicate::str::contains("worlds"));
}

#[test]
fn test_cli_flag_overrides_file() {
    let server = TestServer::new().unwrap();
    let custom = server.root().join("elsewhere");

    let output = server
        .run(&["--server-dir", custom.to_str().unwrap(), "config"])
        .unwrap();

    assert!(output.success, "{}", output.stderr);
    assert!(output.stdout.contains("elsewhere"));
}

#[test]
fn test_overlapping_roots_rejected() {
    let server = TestServer::new().unwrap();
    let nested = server.server_dir().join("tmp");

    let output = server
        .run(&["--temp-dir", nested.to_str().unwrap(), "config", "show"])
        .unwrap();

    assert!(!output.success);
    assert_eq!(output.code, Some(1));
    assert!(output.stderr.contains("disjoint"), "{}", output.stderr);
}

#[test]
fn test_unknown_config_key_rejected() {
    let server = TestServer::new().unwrap();
    std::fs::write(server.config_path(), "server_dirr = \"/srv\"\n").unwrap();

    server
        .command()
        .args(["config", "show"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("server_dirr"));
}

#[test]
fn test_missing_explicit_config_file_fails() {
    let server = TestServer::new().unwrap();

    server
        .command()
        .args(["--config", "does-not-exist.toml", "config", "show"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("does-not-exist.toml"));
}

#[test]
fn test_config_path_subcommand() {
    let server = TestServer::new().unwrap();

    server
        .command()
        .args(["config", "path"])
        .assert()
        .success()
        .stdout(predicate::str::contains("steward.toml"));
}
