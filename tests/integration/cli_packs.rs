//! `steward packs install`.

use crate::common::TestServer;
use bedrock_steward::test_utils::{pack_manifest, zip_fixture};
use predicates::prelude::*;

const PACK_UUID: &str = "3c9d2f6e-8a41-4b7c-9e0d-1f2a3b4c5d6e";

#[test]
fn test_install_single_pack() {
    let server = TestServer::new().unwrap();
    let world = server.add_world("Survival").unwrap();
    let archive = server.root().join("mobs.mcpack");
    let manifest = pack_manifest("Better Mobs", PACK_UUID, [1, 2, 0], "data");
    zip_fixture(&archive, &[("manifest.json", &manifest), ("entities/cow.json", "{}")]);

    server
        .command()
        .args(["packs", "install", "mobs.mcpack", "--world", "Survival"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Better Mobs"));

    assert!(server.server_dir().join("behavior_packs/Better_Mobs/entities/cow.json").is_file());
    let registry: serde_json::Value = serde_json::from_str(
        &std::fs::read_to_string(world.join("world_behavior_packs.json")).unwrap(),
    )
    .unwrap();
    assert_eq!(registry, serde_json::json!([{"pack_id": PACK_UUID, "version": [1, 2, 0]}]));

    // The user's file is untouched; the staged copy is gone
    assert!(archive.is_file());
    let uploads = server.root().join("tmp/uploads");
    assert_eq!(std::fs::read_dir(uploads).unwrap().count(), 0);
}

#[test]
fn test_install_into_missing_world_fails() {
    let server = TestServer::new().unwrap();
    let archive = server.root().join("mobs.mcpack");
    let manifest = pack_manifest("Better Mobs", PACK_UUID, [1, 0, 0], "data");
    zip_fixture(&archive, &[("manifest.json", &manifest)]);

    server
        .command()
        .args(["packs", "install", "mobs.mcpack", "--world", "Nowhere"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Nowhere"));

    assert!(!server.server_dir().join("behavior_packs").exists());
}

#[test]
fn test_category_flag_for_unclassified_pack() {
    let server = TestServer::new().unwrap();
    server.add_world("Survival").unwrap();
    let archive = server.root().join("skins.zip");
    let manifest = pack_manifest("Skins", PACK_UUID, [1, 0, 0], "skin_pack");
    zip_fixture(&archive, &[("manifest.json", &manifest)]);

    server
        .command()
        .args(["packs", "install", "skins.zip", "--world", "Survival"])
        .assert()
        .failure();

    server
        .command()
        .args(["packs", "install", "skins.zip", "--world", "Survival", "--category", "resource"])
        .assert()
        .success();

    assert!(server.server_dir().join("resource_packs/Skins/manifest.json").is_file());
}

#[test]
fn test_missing_archive_fails() {
    let server = TestServer::new().unwrap();
    server.add_world("Survival").unwrap();

    server
        .command()
        .args(["packs", "install", "nope.mcpack", "--world", "Survival"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("nope.mcpack"));
}
