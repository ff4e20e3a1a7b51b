//! World folders under `worlds/` and switching the active one.

use super::properties::ServerProperties;
use crate::constants::{LEVEL_NAME_KEY, SERVER_PROPERTIES_FILE, WORLDS_DIR};
use anyhow::{Context, Result};
use std::path::{Component, Path};
use tracing::{info, warn};
use walkdir::WalkDir;

/// Names of the world directories in the install at `server_dir`, sorted.
///
/// A missing `worlds/` folder yields an empty list.
pub async fn list_worlds(server_dir: &Path) -> Result<Vec<String>> {
    let worlds_dir = server_dir.join(WORLDS_DIR);
    tokio::task::spawn_blocking(move || -> Result<Vec<String>> {
        if !worlds_dir.is_dir() {
            return Ok(Vec::new());
        }

        let mut names = Vec::new();
        for entry in WalkDir::new(&worlds_dir).min_depth(1).max_depth(1) {
            let entry = entry
                .with_context(|| format!("Failed to read {}", worlds_dir.display()))?;
            if entry.file_type().is_dir() {
                names.push(entry.file_name().to_string_lossy().into_owned());
            }
        }
        names.sort();
        Ok(names)
    })
    .await
    .context("World listing task panicked")?
}

/// Point `level-name` at `name`.
///
/// Returns `false` without touching `server.properties` when no such world
/// exists.
pub async fn activate_world(server_dir: &Path, name: &str) -> Result<bool> {
    let mut components = Path::new(name).components();
    let plain = matches!((components.next(), components.next()), (Some(Component::Normal(_)), None));
    if !plain || !server_dir.join(WORLDS_DIR).join(name).is_dir() {
        warn!("World '{}' does not exist", name);
        return Ok(false);
    }

    let mut properties = ServerProperties::load(&server_dir.join(SERVER_PROPERTIES_FILE)).await?;
    properties.set(LEVEL_NAME_KEY, name)?;
    properties.save().await?;

    info!("Activated world '{}'", name);
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_list_worlds_sorted_dirs_only() {
        let temp = tempdir().unwrap();
        let worlds = temp.path().join("worlds");
        std::fs::create_dir_all(worlds.join("Zeta/db")).unwrap();
        std::fs::create_dir_all(worlds.join("Alpha")).unwrap();
        std::fs::write(worlds.join("stray.txt"), "x").unwrap();

        assert_eq!(list_worlds(temp.path()).await.unwrap(), ["Alpha", "Zeta"]);
    }

    #[tokio::test]
    async fn test_list_without_worlds_dir() {
        let temp = tempdir().unwrap();
        assert!(list_worlds(temp.path()).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_activate_sets_level_name() {
        let temp = tempdir().unwrap();
        std::fs::create_dir_all(temp.path().join("worlds/Creative")).unwrap();
        let props = temp.path().join("server.properties");
        std::fs::write(&props, "level-name=Bedrock level\nmax-players=10\n").unwrap();

        assert!(activate_world(temp.path(), "Creative").await.unwrap());
        assert_eq!(
            std::fs::read_to_string(&props).unwrap(),
            "level-name=Creative\nmax-players=10\n"
        );
    }

    #[tokio::test]
    async fn test_activate_missing_world() {
        let temp = tempdir().unwrap();
        let props = temp.path().join("server.properties");
        std::fs::write(&props, "level-name=Bedrock level\n").unwrap();

        assert!(!activate_world(temp.path(), "Nowhere").await.unwrap());
        assert!(!activate_world(temp.path(), "..").await.unwrap());
        assert_eq!(std::fs::read_to_string(&props).unwrap(), "level-name=Bedrock level\n");
    }
}
