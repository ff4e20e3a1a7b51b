//! Periodic update checks.
//!
//! [`UpdateScheduler`] drives one orchestrator on a fixed interval. Checks
//! are strictly sequential: a tick is only taken after the previous check has
//! returned, and ticks missed while a check runs are skipped.
//!
//! Shutdown is only honored between checks. A shutdown request that arrives
//! while a check is running lets that check finish, so an install is never
//! abandoned halfway through its stop → swap → restore → start sequence.

use super::fetch::ArtifactFetcher;
use super::orchestrator::UpdateOrchestrator;
use super::resolver::ReleaseSource;
use crate::supervisor::ServerControl;
use std::future::Future;
use std::time::Duration;
use tokio::time::MissedTickBehavior;
use tracing::{error, info, warn};

pub struct UpdateScheduler<'a, S, F, C> {
    orchestrator: &'a UpdateOrchestrator<S, F, C>,
    period: Duration,
    keep_alive: bool,
}

impl<'a, S, F, C> UpdateScheduler<'a, S, F, C>
where
    S: ReleaseSource,
    F: ArtifactFetcher,
    C: ServerControl,
{
    pub fn new(orchestrator: &'a UpdateOrchestrator<S, F, C>, period: Duration) -> Self {
        Self {
            orchestrator,
            period,
            keep_alive: false,
        }
    }

    /// Start the server before a check whenever it is found not running.
    #[must_use]
    pub fn keep_alive(mut self, keep_alive: bool) -> Self {
        self.keep_alive = keep_alive;
        self
    }

    /// Check on every tick until `shutdown` resolves. Returns the number of
    /// checks that ran.
    pub async fn run(&self, shutdown: impl Future<Output = ()>) -> usize {
        let mut ticker = tokio::time::interval(self.period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        tokio::pin!(shutdown);
        let mut checks = 0;

        loop {
            tokio::select! {
                biased;
                () = &mut shutdown => {
                    info!("Shutdown requested, stopping update checks");
                    break;
                }
                _ = ticker.tick() => {}
            }

            let check = self.check();
            tokio::pin!(check);

            let stopping = tokio::select! {
                biased;
                () = &mut check => false,
                () = &mut shutdown => {
                    info!("Shutdown requested, waiting for the running check to finish");
                    check.await;
                    true
                }
            };

            checks += 1;
            if stopping {
                info!("Update checks stopped");
                break;
            }
        }

        checks
    }

    async fn check(&self) {
        let supervisor = self.orchestrator.supervisor();
        if self.keep_alive && !supervisor.is_running().await {
            info!("Server is not running, starting it");
            if let Err(e) = supervisor.start().await {
                warn!("Keep-alive start failed: {:#}", e);
            }
        }

        let outcome = self.orchestrator.check_and_install().await;
        if outcome.success {
            info!("{}", outcome.message);
        } else {
            error!("{}", outcome.message);
        }
    }
}
