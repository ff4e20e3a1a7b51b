//! Installs uploaded pack archives into the active server.
//!
//! An archive holds either one pack (a single `manifest.json`) or a bundle of
//! several (`.mcaddon`-style, one manifest per pack folder). Each pack is
//! extracted to `behavior_packs/<name>` or `resource_packs/<name>` and
//! registered in the target world's registry file. A pack that cannot be
//! classified or parsed is skipped with a warning. The upload is always
//! deleted afterwards.

use super::manifest::{PackCategory, PackManifest};
use super::registry::{RegistryEntry, WorldPackRegistry};
use crate::config::StewardConfig;
use crate::constants::{PACK_MANIFEST_FILE, WORLDS_DIR};
use crate::core::{Outcome, StewardError};
use crate::update::extract::unpack;
use crate::utils::roots::ManagedRoots;
use anyhow::{Context, Result};
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use zip::ZipArchive;

/// A `manifest.json` found inside an archive.
#[derive(Debug)]
struct FoundManifest {
    /// Directory of the manifest inside the archive, `/`-terminated, or `""`.
    prefix: String,
    content: Vec<u8>,
}

/// A pack that made it into the install and the registry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstalledPack {
    pub name: String,
    pub uuid: String,
    pub category: PackCategory,
    pub dir: PathBuf,
}

/// Merges pack archives into the install under `server_dir`.
#[derive(Debug, Clone)]
pub struct PackInstaller {
    server_dir: PathBuf,
    roots: ManagedRoots,
}

impl PackInstaller {
    pub fn new(config: &StewardConfig) -> Self {
        Self {
            server_dir: config.server_dir.clone(),
            roots: config.managed_roots(),
        }
    }

    /// Install every pack in `archive` for `world`.
    ///
    /// `requested` is used as the category of a single-pack archive whose
    /// manifest does not declare one; bundles ignore it. Succeeds when at least
    /// one pack was applied. `archive` is deleted in every case.
    pub async fn install(
        &self,
        archive: &Path,
        world: &str,
        requested: Option<PackCategory>,
    ) -> Outcome {
        let outcome = match self.install_all(archive, world, requested).await {
            Ok(outcome) => outcome,
            Err(e) => {
                warn!("Pack installation failed: {:#}", e);
                Outcome::from_error("Pack installation failed", &e)
            }
        };

        if let Err(e) = self.roots.remove_tree(archive).await {
            warn!("Failed to remove uploaded archive {}: {:#}", archive.display(), e);
        }

        outcome
    }

    async fn install_all(
        &self,
        archive: &Path,
        world: &str,
        requested: Option<PackCategory>,
    ) -> Result<Outcome> {
        let world_dir = self.world_dir(world)?;
        if !tokio::fs::try_exists(&world_dir).await.unwrap_or(false) {
            return Err(StewardError::WorldNotFound(world.to_string()).into());
        }

        let archive_path = archive.to_path_buf();
        let manifests = tokio::task::spawn_blocking(move || find_manifests(&archive_path))
            .await
            .context("Archive scan task panicked")??;

        if manifests.is_empty() {
            return Err(StewardError::Parse(format!(
                "no {PACK_MANIFEST_FILE} found in {}",
                archive.display()
            ))
            .into());
        }

        let is_bundle = manifests.len() > 1;
        let upload_name = archive.file_stem().map(|s| s.to_string_lossy().into_owned());
        debug!("Found {} pack manifest(s), bundle = {}", manifests.len(), is_bundle);

        let mut installed = Vec::new();
        let mut skipped = Vec::new();

        for found in manifests {
            let label = if found.prefix.is_empty() { "<root>" } else { found.prefix.as_str() };

            let manifest = match PackManifest::parse(&found.content) {
                Ok(manifest) => manifest,
                Err(e) => {
                    warn!("Skipping pack at {}: {:#}", label, e);
                    skipped.push(format!("{label}: {e:#}"));
                    continue;
                }
            };

            let fallback = if is_bundle { None } else { requested };
            let Some(category) = classify(&manifest, fallback, upload_name.as_deref(), &found.prefix)
            else {
                warn!("Skipping pack '{}': cannot tell whether it is behavior or resource", label);
                skipped.push(format!("{label}: unknown pack category"));
                continue;
            };

            match self.apply(archive, &found.prefix, &manifest, category, &world_dir).await {
                Ok(pack) => {
                    info!("Installed {} pack '{}' ({})", pack.category, pack.name, pack.uuid);
                    installed.push(pack);
                }
                Err(e) => {
                    warn!("Failed to install pack at {}: {:#}", label, e);
                    skipped.push(format!("{label}: {e:#}"));
                }
            }
        }

        Ok(summarize(world, &installed, &skipped))
    }

    fn world_dir(&self, world: &str) -> Result<PathBuf> {
        let mut components = Path::new(world).components();
        match (components.next(), components.next()) {
            (Some(std::path::Component::Normal(_)), None) => {
                Ok(self.server_dir.join(WORLDS_DIR).join(world))
            }
            _ => Err(StewardError::WorldNotFound(world.to_string()).into()),
        }
    }

    /// Extract one pack and register it; the extracted folder is removed again
    /// if the registry cannot be updated.
    async fn apply(
        &self,
        archive: &Path,
        prefix: &str,
        manifest: &PackManifest,
        category: PackCategory,
        world_dir: &Path,
    ) -> Result<InstalledPack> {
        let dir = self.server_dir.join(category.install_dir()).join(manifest.dir_name());
        self.roots.remove_tree(&dir).await?;

        let archive_path = archive.to_path_buf();
        let prefix_owned = prefix.to_string();
        let dest = dir.clone();
        tokio::task::spawn_blocking(move || -> Result<usize> {
            let file = File::open(&archive_path)
                .map_err(|e| StewardError::filesystem("open", &archive_path, e))?;
            let mut zip = ZipArchive::new(file).context("Failed to reopen pack archive")?;
            unpack(&mut zip, &prefix_owned, &dest)
        })
        .await
        .context("Pack extraction task panicked")??;

        if let Err(e) = register(world_dir, category, manifest).await {
            warn!("Registry update failed, removing {}", dir.display());
            if let Err(cleanup) = self.roots.remove_tree(&dir).await {
                warn!("Failed to remove {}: {:#}", dir.display(), cleanup);
            }
            return Err(e);
        }

        Ok(InstalledPack {
            name: if manifest.name.is_empty() { manifest.uuid.clone() } else { manifest.name.clone() },
            uuid: manifest.uuid.clone(),
            category,
            dir,
        })
    }
}

async fn register(world_dir: &Path, category: PackCategory, manifest: &PackManifest) -> Result<()> {
    let path = world_dir.join(category.registry_file());
    let mut registry = WorldPackRegistry::load(&path).await?;
    registry.upsert(RegistryEntry::new(manifest.uuid.clone(), manifest.version));
    registry.save().await
}

/// Module types first, then the requested category (single packs only), then
/// folder names (the manifest's directory, then the upload's file name).
fn classify(
    manifest: &PackManifest,
    requested: Option<PackCategory>,
    upload_name: Option<&str>,
    prefix: &str,
) -> Option<PackCategory> {
    if let Some(category) = manifest.declared_category() {
        return Some(category);
    }
    if let Some(category) = requested {
        return Some(category);
    }

    let segments: Vec<&str> = upload_name
        .into_iter()
        .chain(prefix.split('/').filter(|s| !s.is_empty()))
        .collect();
    let guess = PackCategory::from_path_hint(segments);
    if let Some(category) = guess {
        debug!("Classified pack at '{}' as {} from its path", prefix, category);
    }
    guess
}

/// Every `manifest.json` that is not nested inside another pack's folder.
fn find_manifests(archive: &Path) -> Result<Vec<FoundManifest>> {
    let file = File::open(archive).map_err(|e| StewardError::filesystem("open", archive, e))?;
    let mut zip = ZipArchive::new(file)
        .map_err(|e| StewardError::Parse(format!("not a valid pack archive: {e}")))?;

    let mut prefixes: Vec<(usize, String)> = Vec::new();
    for i in 0..zip.len() {
        let entry = zip.by_index(i).context("Failed to read zip entry")?;
        if entry.is_dir() {
            continue;
        }
        let Some(name) = entry.enclosed_name() else {
            continue;
        };
        if name.file_name().and_then(|n| n.to_str()) != Some(PACK_MANIFEST_FILE) {
            continue;
        }

        let prefix = name
            .parent()
            .map(|p| {
                let joined = p
                    .components()
                    .map(|c| c.as_os_str().to_string_lossy().into_owned())
                    .collect::<Vec<_>>()
                    .join("/");
                if joined.is_empty() { joined } else { format!("{joined}/") }
            })
            .unwrap_or_default();
        prefixes.push((i, prefix));
    }

    // Shallowest first so nested manifests can be recognized as belonging to
    // an outer pack.
    prefixes.sort_by_key(|(_, prefix)| prefix.matches('/').count());
    let mut kept: Vec<(usize, String)> = Vec::new();
    for (index, prefix) in prefixes {
        if kept.iter().any(|(_, outer)| prefix.starts_with(outer.as_str())) {
            debug!("Ignoring nested manifest under '{}'", prefix);
            continue;
        }
        kept.push((index, prefix));
    }

    let mut found = Vec::with_capacity(kept.len());
    for (index, prefix) in kept {
        let mut entry = zip.by_index(index).context("Failed to read zip entry")?;
        let mut content = Vec::new();
        entry.read_to_end(&mut content).context("Failed to read manifest.json")?;
        found.push(FoundManifest { prefix, content });
    }
    Ok(found)
}

fn summarize(world: &str, installed: &[InstalledPack], skipped: &[String]) -> Outcome {
    if installed.is_empty() {
        let reason = if skipped.is_empty() { "nothing to install".to_string() } else { skipped.join("; ") };
        return Outcome::failure(format!("No packs were installed into '{world}': {reason}"));
    }

    let names = installed
        .iter()
        .map(|p| format!("{} ({})", p.name, p.category))
        .collect::<Vec<_>>()
        .join(", ");
    let mut message = format!("Installed {} pack(s) into '{world}': {names}", installed.len());
    if !skipped.is_empty() {
        message.push_str(&format!("; skipped {}: {}", skipped.len(), skipped.join("; ")));
    }
    Outcome::success(message)
}
