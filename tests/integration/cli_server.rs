//! `status`, `start`, `stop`, `update` and `backups` against an isolated install.

use crate::common::TestServer;
use predicates::prelude::*;

#[test]
fn test_status_without_install() {
    let server = TestServer::new().unwrap();

    server
        .command()
        .arg("status")
        .assert()
        .success()
        .stdout(predicate::str::contains("not installed"))
        .stdout(predicate::str::contains("Installed version: none"));
}

#[test]
fn test_start_without_executable_is_not_an_error() {
    let server = TestServer::new().unwrap();

    server.command().arg("start").assert().success();
    assert!(!server.state_dir().join("server.pid").exists());
}

#[test]
fn test_stop_when_nothing_tracked() {
    let server = TestServer::new().unwrap();

    server
        .command()
        .arg("stop")
        .assert()
        .success()
        .stdout(predicate::str::contains("not running"));
}

#[test]
fn test_update_check_failure_exits_nonzero_without_changes() {
    let server = TestServer::new().unwrap();
    server.add_world("Survival").unwrap();

    let output = server.run(&["update"]).unwrap();

    assert_eq!(output.code, Some(1));
    assert!(output.stderr.contains("Update check failed"), "{}", output.stderr);
    assert!(!server.state_dir().join("installed_version.txt").exists());
    assert!(!server.backup_dir().exists());
    assert!(server.server_dir().join("worlds/Survival/db").is_dir());
}

#[test]
fn test_backups_list_and_prune() {
    let server = TestServer::new().unwrap();
    for name in ["2026-01-01T00-00-00Z", "2026-02-01T00-00-00Z", "2026-03-01T00-00-00Z"] {
        std::fs::create_dir_all(server.backup_dir().join(name).join("worlds")).unwrap();
    }

    let output = server.run(&["backups", "list"]).unwrap();
    assert!(output.success, "{}", output.stderr);
    let names: Vec<&str> =
        output.stdout.lines().filter_map(|l| l.split_whitespace().next()).collect();
    assert_eq!(names, ["2026-01-01T00-00-00Z", "2026-02-01T00-00-00Z", "2026-03-01T00-00-00Z"]);

    server.command().args(["backups", "prune", "--keep", "1"]).assert().success();

    assert!(!server.backup_dir().join("2026-01-01T00-00-00Z").exists());
    assert!(!server.backup_dir().join("2026-02-01T00-00-00Z").exists());
    assert!(server.backup_dir().join("2026-03-01T00-00-00Z").is_dir());
}
