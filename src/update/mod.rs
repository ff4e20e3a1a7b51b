//! Server update pipeline
//!
//! Keeps the installed Bedrock Dedicated Server in step with the latest
//! upstream release without losing worlds or configuration.
//!
//! # Pipeline
//!
//! 1. **Resolve** ([`resolver`]) the latest release from the download page
//! 2. **Compare** with the version marker ([`marker`]); equal means done
//! 3. **Stop** the server through the supervisor
//! 4. **Back up** ([`backup`]) the whole install into a timestamped snapshot
//! 5. **Fetch** ([`fetch`]) and **extract** ([`extract`]) the new build into
//!    `<temp_dir>/<version>`, unless a complete extraction is already there
//! 6. **Swap** the new tree onto `server_dir` by rename
//! 7. **Restore** worlds, packs and config files from the snapshot
//! 8. **Chown** the install (POSIX only), write the marker, **start** the server
//!
//! [`UpdateOrchestrator`] sequences these steps behind a single-flight
//! [`guard`] and publishes its [`UpdateStage`] on a watch channel.
//! [`UpdateScheduler`] repeats the check on an interval and never abandons a
//! running check on shutdown.
//!
//! # Failure policy
//!
//! Errors from step 3 onward restart the server and produce
//! `Outcome { success: false }`. A failure after the swap moves the previous
//! install back into place. The marker is written only when the install has
//! fully succeeded.

pub mod backup;
pub mod extract;
pub mod fetch;
pub mod guard;
pub mod marker;
pub mod notify;
pub mod orchestrator;
pub mod resolver;
pub mod schedule;
pub mod stage;


pub use backup::{BackupManager, RestoreReport, Snapshot};
pub use fetch::{ArtifactFetcher, HttpFetcher};
pub use guard::{LocalPermit, UpdateGuard, UpdatePermit};
pub use marker::VersionMarker;
pub use notify::Notifier;
pub use orchestrator::UpdateOrchestrator;
pub use resolver::{Release, ReleaseSource, RemoteVersionResolver};
pub use schedule::UpdateScheduler;
pub use stage::UpdateStage;

use crate::config::StewardConfig;
use crate::supervisor::ProcessSupervisor;
use anyhow::Result;
use std::sync::Arc;

/// The production wiring: HTTP resolver and fetcher, OS process supervisor.
pub type ServerUpdater = UpdateOrchestrator<RemoteVersionResolver, HttpFetcher, ProcessSupervisor>;

impl ServerUpdater {
    /// Wire up the production collaborators from `config`.
    pub fn from_config(
        config: &StewardConfig,
        supervisor: Arc<ProcessSupervisor>,
        show_progress: bool,
    ) -> Result<Self> {
        let resolver = RemoteVersionResolver::from_config(config)?;
        let fetcher = HttpFetcher::from_config(config)?.with_progress(show_progress);
        let notifier = Notifier::from_config(config)?;

        Ok(Self::new(config, resolver, fetcher, supervisor).with_notifier(notifier))
    }
}
