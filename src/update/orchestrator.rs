//! The check-and-install pipeline.
//!
//! One call to [`UpdateOrchestrator::check_and_install`] walks the stages in
//! [`UpdateStage`] order. Every error from `Stopping` onward lands in a single
//! failure handler that tries to bring the server back up and reports the
//! original error. Nothing escapes as an `Err`: the caller always gets an
//! [`Outcome`].

use super::backup::BackupManager;
use super::extract::{extract_archive, partial_path};
use super::fetch::ArtifactFetcher;
use super::guard::UpdateGuard;
use super::marker::VersionMarker;
use super::notify::Notifier;
use super::resolver::{Release, ReleaseSource};
use super::stage::UpdateStage;
use crate::config::StewardConfig;
use crate::core::{Outcome, StewardError};
use crate::supervisor::ServerControl;
use crate::utils::fs::ensure_dir;
use crate::utils::roots::ManagedRoots;
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{debug, error, info, warn};

/// Sequences resolve → stop → backup → fetch → extract → swap → restore →
/// chown → start for one installation.
pub struct UpdateOrchestrator<S, F, C> {
    source: S,
    fetcher: F,
    supervisor: Arc<C>,
    backups: BackupManager,
    marker: VersionMarker,
    notifier: Notifier,
    guard: UpdateGuard,
    roots: ManagedRoots,
    server_dir: PathBuf,
    temp_dir: PathBuf,
    owner: Option<String>,
    stage: watch::Sender<UpdateStage>,
}

impl<S, F, C> UpdateOrchestrator<S, F, C>
where
    S: ReleaseSource,
    F: ArtifactFetcher,
    C: ServerControl,
{
    pub fn new(config: &StewardConfig, source: S, fetcher: F, supervisor: Arc<C>) -> Self {
        let (stage, _) = watch::channel(UpdateStage::Idle);
        Self {
            source,
            fetcher,
            supervisor,
            backups: BackupManager::new(config),
            marker: VersionMarker::new(config.marker_path()),
            notifier: Notifier::disabled(),
            guard: UpdateGuard::new(config.lock_file()),
            roots: config.managed_roots(),
            server_dir: config.server_dir.clone(),
            temp_dir: config.temp_dir.clone(),
            owner: config.owner.clone(),
            stage,
        }
    }

    #[must_use]
    pub fn with_notifier(mut self, notifier: Notifier) -> Self {
        self.notifier = notifier;
        self
    }

    /// Share a guard with another orchestrator over the same installation.
    #[must_use]
    pub fn with_guard(mut self, guard: UpdateGuard) -> Self {
        self.guard = guard;
        self
    }

    pub fn supervisor(&self) -> &Arc<C> {
        &self.supervisor
    }

    pub fn marker(&self) -> &VersionMarker {
        &self.marker
    }

    /// Observe stage transitions.
    pub fn subscribe(&self) -> watch::Receiver<UpdateStage> {
        self.stage.subscribe()
    }

    pub fn stage(&self) -> UpdateStage {
        *self.stage.borrow()
    }

    fn enter(&self, stage: UpdateStage) {
        debug!("Update stage: {}", stage);
        self.stage.send_replace(stage);
    }

    /// Install the latest release if it differs from the installed one.
    ///
    /// - resolution failure or "no result" → `success = false`, nothing touched
    /// - same version → `success = true`, nothing touched
    /// - another run in flight → `success = false`, nothing touched
    /// - otherwise the full pipeline; failures restart the server and report
    ///
    /// The version comparison runs under the in-process guard only. The lock
    /// file is taken once an install is due, and the marker is read again
    /// under it in case another process finished the same install meanwhile.
    pub async fn check_and_install(&self) -> Outcome {
        let Some(local) = self.guard.try_begin() else {
            return rejected();
        };

        self.enter(UpdateStage::CheckingVersion);
        let release = match self.pending_release().await {
            Ok(Pending::Install(release)) => release,
            Ok(Pending::UpToDate(version)) => return self.up_to_date(&version),
            Err(outcome) => return outcome,
        };

        let _permit = match local.try_lock().await {
            Ok(Some(permit)) => permit,
            Ok(None) => {
                self.enter(UpdateStage::Failed);
                return rejected();
            }
            Err(e) => {
                error!("Failed to acquire update lock: {:#}", e);
                self.enter(UpdateStage::Failed);
                return Outcome::from_error("Update check failed", &e);
            }
        };

        let installed = match self.installed_version().await {
            Ok(installed) => installed,
            Err(outcome) => return outcome,
        };
        if installed.as_deref() == Some(release.version.as_str()) {
            return self.up_to_date(&release.version);
        }

        self.run(&release, installed.as_deref()).await
    }

    async fn pending_release(&self) -> std::result::Result<Pending, Outcome> {
        let release = match self.source.latest().await {
            Ok(Some(release)) => release,
            Ok(None) => {
                warn!("Latest release carries no recognizable version");
                self.enter(UpdateStage::Failed);
                return Err(Outcome::failure(
                    "Update check failed: could not determine the latest version",
                ));
            }
            Err(e) => {
                warn!("Update check failed: {:#}", e);
                self.enter(UpdateStage::Failed);
                return Err(Outcome::from_error("Update check failed", &e));
            }
        };

        let installed = self.installed_version().await?;
        if installed.as_deref() == Some(release.version.as_str()) {
            Ok(Pending::UpToDate(release.version))
        } else {
            Ok(Pending::Install(release))
        }
    }

    async fn installed_version(&self) -> std::result::Result<Option<String>, Outcome> {
        self.marker.read().await.map_err(|e| {
            warn!("Could not read installed version: {:#}", e);
            self.enter(UpdateStage::Failed);
            Outcome::from_error("Update check failed", &e)
        })
    }

    fn up_to_date(&self, version: &str) -> Outcome {
        info!("Server is up to date ({})", version);
        self.enter(UpdateStage::UpToDate);
        Outcome::success(format!("Already up to date ({version})"))
    }

    async fn run(&self, release: &Release, installed: Option<&str>) -> Outcome {
        let from = installed.unwrap_or("none");
        info!("Updating server: {} -> {}", from, release.version);
        self.notifier
            .send(&format!("Server update starting: {from} -> {}", release.version))
            .await;

        let outcome = match self.install(release).await {
            Ok(()) => {
                self.enter(UpdateStage::Done);
                info!("Server updated to {}", release.version);
                Outcome::success(format!("Updated to {}", release.version))
            }
            Err(e) => self.fail(e).await,
        };

        self.notifier.send(&outcome.message).await;
        outcome
    }

    async fn install(&self, release: &Release) -> Result<()> {
        self.enter(UpdateStage::Stopping);
        self.supervisor.stop().await.context("Failed to stop server")?;

        self.enter(UpdateStage::BackingUp);
        let snapshot = self.backups.backup().await?;

        let staged = self.temp_dir.join(&release.version);
        if tokio::fs::try_exists(&staged).await.unwrap_or(false) {
            info!("Reusing existing extraction at {}", staged.display());
        } else {
            self.stage_release(release, &staged).await?;
        }

        self.enter(UpdateStage::Swapping);
        let retired = self.swap_in(&staged).await?;

        if let Err(e) = self.finish_swap(snapshot.as_deref()).await {
            self.roll_back(retired.as_deref()).await;
            return Err(e);
        }

        if let Some(retired) = retired
            && let Err(e) = self.roots.remove_tree(&retired).await
        {
            warn!("Failed to remove previous install {}: {:#}", retired.display(), e);
        }

        self.marker.write(&release.version).await?;

        self.enter(UpdateStage::Starting);
        self.supervisor.start().await.context("Failed to start server")?;
        Ok(())
    }

    /// Download and unpack `release` into `staged`.
    async fn stage_release(&self, release: &Release, staged: &Path) -> Result<()> {
        ensure_dir(&self.temp_dir)?;

        self.enter(UpdateStage::Fetching);
        let archive = self.temp_dir.join(format!("bedrock-server-{}.zip", release.version));
        self.fetcher
            .fetch(&release.url, &archive)
            .await
            .with_context(|| format!("Failed to download {}", release.url))?;

        self.enter(UpdateStage::Extracting);
        self.roots.remove_tree(&partial_path(staged)).await?;
        extract_archive(&archive, staged).await?;

        if let Err(e) = self.roots.remove_tree(&archive).await {
            warn!("Failed to remove downloaded archive {}: {:#}", archive.display(), e);
        }
        Ok(())
    }

    /// Rename `staged` onto the install root.
    ///
    /// The current install is retired into the temp root first and returned so
    /// it can be restored if anything later fails. If the staged tree cannot be
    /// moved into place the retired tree is put back before returning the error.
    async fn swap_in(&self, staged: &Path) -> Result<Option<PathBuf>> {
        let retired = if tokio::fs::try_exists(&self.server_dir).await.unwrap_or(false) {
            let retired = self.temp_dir.join(format!("retired-{}", uuid::Uuid::new_v4().simple()));
            tokio::fs::rename(&self.server_dir, &retired)
                .await
                .map_err(|e| StewardError::filesystem("rename", &self.server_dir, e))?;
            debug!("Retired previous install to {}", retired.display());
            Some(retired)
        } else {
            None
        };

        if let Some(parent) = self.server_dir.parent() {
            ensure_dir(parent)?;
        }

        if let Err(e) = tokio::fs::rename(staged, &self.server_dir).await {
            if let Some(retired) = &retired
                && let Err(back) = tokio::fs::rename(retired, &self.server_dir).await
            {
                error!(
                    fatal = true,
                    "Could not put previous install back from {}: {}",
                    retired.display(),
                    back
                );
            }
            return Err(StewardError::filesystem("rename", staged, e).into());
        }

        info!("Swapped new install into {}", self.server_dir.display());
        Ok(retired)
    }

    async fn finish_swap(&self, snapshot: Option<&Path>) -> Result<()> {
        self.enter(UpdateStage::Restoring);
        if let Some(snapshot) = snapshot {
            self.backups.restore(snapshot, &self.server_dir).await?;
        } else {
            debug!("No snapshot taken, nothing to restore");
        }

        self.enter(UpdateStage::ChangingOwnership);
        self.roots.change_ownership(&self.server_dir, self.owner.as_deref()).await
    }

    /// Put the retired install back after a post-swap failure.
    async fn roll_back(&self, retired: Option<&Path>) {
        warn!("Rolling back to the previous install");

        let failed = self.temp_dir.join(format!("failed-{}", uuid::Uuid::new_v4().simple()));
        if let Err(e) = tokio::fs::rename(&self.server_dir, &failed).await {
            error!(fatal = true, "Could not move failed install aside: {}", e);
            return;
        }

        if let Some(retired) = retired
            && let Err(e) = tokio::fs::rename(retired, &self.server_dir).await
        {
            error!(
                fatal = true,
                "Could not restore previous install from {}: {}",
                retired.display(),
                e
            );
            return;
        }

        if let Err(e) = self.roots.remove_tree(&failed).await {
            warn!("Failed to remove failed install {}: {:#}", failed.display(), e);
        }
    }

    async fn fail(&self, error: anyhow::Error) -> Outcome {
        error!(fatal = true, "Update failed: {:#}", error);
        self.enter(UpdateStage::Failed);

        if let Err(restart) = self.supervisor.restart().await {
            error!("Restart after failed update also failed: {:#}", restart);
        }

        Outcome::from_error("Update failed", &error)
    }
}

enum Pending {
    Install(Release),
    UpToDate(String),
}

fn rejected() -> Outcome {
    warn!("Update requested while another update is running");
    Outcome::from_error("Update rejected", &StewardError::UpdateInProgress.into())
}
