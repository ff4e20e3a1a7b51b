//! Per-world pack registries (`world_behavior_packs.json`,
//! `world_resource_packs.json`).

use super::manifest::PackVersion;
use crate::core::StewardError;
use crate::utils::fs::safe_write;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// One enabled pack. Unknown keys (`subpacks`, ...) are carried through.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegistryEntry {
    pub pack_id: String,
    pub version: PackVersion,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl RegistryEntry {
    pub fn new(pack_id: impl Into<String>, version: PackVersion) -> Self {
        Self {
            pack_id: pack_id.into(),
            version,
            extra: serde_json::Map::new(),
        }
    }
}

/// Ordered list of packs enabled for one world and category.
///
/// Holds at most one entry per `pack_id`.
#[derive(Debug, Clone)]
pub struct WorldPackRegistry {
    path: PathBuf,
    entries: Vec<RegistryEntry>,
}

impl WorldPackRegistry {
    /// Read the registry at `path`; a missing or blank file is an empty registry.
    pub async fn load(path: &Path) -> Result<Self> {
        let entries = match tokio::fs::read_to_string(path).await {
            Ok(content) if content.trim().is_empty() => Vec::new(),
            Ok(content) => serde_json::from_str(&content).map_err(|e| {
                StewardError::Parse(format!("malformed pack registry {}: {e}", path.display()))
            })?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Vec::new(),
            Err(e) => return Err(StewardError::filesystem("read", path, e).into()),
        };

        Ok(Self {
            path: path.to_path_buf(),
            entries,
        })
    }

    pub fn entries(&self) -> &[RegistryEntry] {
        &self.entries
    }

    /// Replace any entry with the same `pack_id` by appending `entry`.
    pub fn upsert(&mut self, entry: RegistryEntry) {
        self.entries.retain(|e| e.pack_id != entry.pack_id);
        self.entries.push(entry);
    }

    /// Drop the entry for `pack_id`. Returns whether one existed.
    pub fn remove(&mut self, pack_id: &str) -> bool {
        let before = self.entries.len();
        self.entries.retain(|e| e.pack_id != pack_id);
        self.entries.len() != before
    }

    pub async fn save(&self) -> Result<()> {
        let content = serde_json::to_string_pretty(&self.entries)
            .context("Failed to serialize pack registry")?;
        let path = self.path.clone();
        tokio::task::spawn_blocking(move || safe_write(&path, &content))
            .await
            .context("Registry write task panicked")??;
        Ok(())
    }
}
