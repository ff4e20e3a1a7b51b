//! `steward properties` and `steward worlds`.

use crate::common::TestServer;
use predicates::prelude::*;

#[test]
fn test_properties_get_and_set() {
    let server = TestServer::new().unwrap();
    server
        .write_properties("# header\nserver-name=Dedicated Server\ngamemode=survival\n")
        .unwrap();

    server
        .command()
        .args(["properties", "get", "gamemode"])
        .assert()
        .success()
        .stdout("survival\n");

    server
        .command()
        .args(["properties", "set", "gamemode=creative", "max-players=4"])
        .assert()
        .success();

    assert_eq!(
        server.read_properties().unwrap(),
        "# header\nserver-name=Dedicated Server\ngamemode=creative\nmax-players=4\n"
    );

    server
        .command()
        .args(["properties", "get"])
        .assert()
        .success()
        .stdout(predicate::str::contains("max-players=4"))
        .stdout(predicate::str::contains("# header").not());
}

#[test]
fn test_properties_get_unknown_key_fails() {
    let server = TestServer::new().unwrap();
    server.write_properties("gamemode=survival\n").unwrap();

    let output = server.run(&["properties", "get", "difficulty"]).unwrap();
    assert_eq!(output.code, Some(1));
    assert!(output.stderr.contains("difficulty"));
}

#[test]
fn test_worlds_list_marks_active() {
    let server = TestServer::new().unwrap();
    server.add_world("Survival").unwrap();
    server.add_world("Creative").unwrap();
    server.write_properties("level-name=Survival\n").unwrap();

    let output = server.run(&["worlds", "list"]).unwrap();

    assert!(output.success, "{}", output.stderr);
    let lines: Vec<&str> = output.stdout.lines().collect();
    assert_eq!(lines, ["  Creative", "* Survival"]);
}

#[test]
fn test_worlds_activate() {
    let server = TestServer::new().unwrap();
    server.add_world("Creative").unwrap();
    server.write_properties("level-name=Bedrock level\n").unwrap();

    server.command().args(["worlds", "activate", "Creative"]).assert().success();
    assert_eq!(server.read_properties().unwrap(), "level-name=Creative\n");

    server
        .command()
        .args(["worlds", "activate", "Missing"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("World 'Missing' does not exist"));
    assert_eq!(server.read_properties().unwrap(), "level-name=Creative\n");
}
