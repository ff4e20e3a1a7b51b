//! Process supervision for the game server
//!
//! [`ProcessSupervisor`] owns the single server process: it launches the
//! executable detached from steward, tracks its pid, probes liveness and
//! requests graceful termination. The pid is mirrored to
//! `<state_dir>/server.pid` so that separate `steward` invocations (`start`
//! now, `status` later) agree on which process is the server.
//!
//! Callers only request transitions through [`ServerControl`]; nothing else
//! in the crate touches the OS process.
//!
//! # Tracked state
//!
//! | Tracked pid | Probe result | `is_running` | Tracked pid after |
//! |-------------|--------------|--------------|-------------------|
//! | none        | -            | `false`      | none              |
//! | some        | alive        | `true`       | kept              |
//! | some        | no such pid  | `false`      | cleared           |
//! | some        | probe error  | `false`      | kept              |

pub mod platform;

use crate::config::StewardConfig;
use crate::core::StewardError;
use crate::utils::fs::{ensure_parent_dir, safe_write};
use anyhow::{Context, Result};
use platform::Probe;
use std::fs::OpenOptions;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::time::Duration;
use tokio::process::Child;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

/// Lifecycle operations on the supervised server.
pub trait ServerControl: Send + Sync {
    /// Launch the server unless it is already running.
    fn start(&self) -> impl Future<Output = Result<()>> + Send;
    /// Ask the server to terminate. Does not wait for it to exit.
    fn stop(&self) -> impl Future<Output = Result<()>> + Send;
    /// Stop, wait out the grace period, start.
    fn restart(&self) -> impl Future<Output = Result<()>> + Send;
    fn is_running(&self) -> impl Future<Output = bool> + Send;
}

#[derive(Debug)]
struct Tracked {
    pid: u32,
    /// Present only when this supervisor spawned the process.
    child: Option<Child>,
}

/// Supervises one server process.
#[derive(Debug)]
pub struct ProcessSupervisor {
    install_root: PathBuf,
    executable: PathBuf,
    pid_file: PathBuf,
    log_file: PathBuf,
    grace: Duration,
    tracked: Mutex<Option<Tracked>>,
}

impl ProcessSupervisor {
    /// Build a supervisor, adopting the pid recorded by an earlier invocation.
    ///
    /// The adopted pid is not trusted: every operation re-probes it first.
    pub fn new(config: &StewardConfig) -> Self {
        Self::with_paths(
            config.server_dir.clone(),
            config.executable_path(),
            config.pid_file(),
            config.server_log(),
            config.restart_grace(),
        )
    }

    pub fn with_paths(
        install_root: PathBuf,
        executable: PathBuf,
        pid_file: PathBuf,
        log_file: PathBuf,
        grace: Duration,
    ) -> Self {
        let adopted = read_pid_file(&pid_file).map(|pid| {
            debug!("Adopted server pid {} from {}", pid, pid_file.display());
            Tracked { pid, child: None }
        });

        Self {
            install_root,
            executable,
            pid_file,
            log_file,
            grace,
            tracked: Mutex::new(adopted),
        }
    }

    /// The tracked pid, if any. Not liveness-checked.
    pub async fn pid(&self) -> Option<u32> {
        self.tracked.lock().await.as_ref().map(|t| t.pid)
    }

    fn clear(&self, tracked: &mut Option<Tracked>) {
        *tracked = None;
        if let Err(e) = std::fs::remove_file(&self.pid_file)
            && e.kind() != std::io::ErrorKind::NotFound
        {
            warn!("Failed to remove pid file {}: {}", self.pid_file.display(), e);
        }
    }

    /// Probe the tracked process, clearing it when the OS says it is gone.
    fn check_alive(&self, tracked: &mut Option<Tracked>) -> bool {
        let Some(current) = tracked.as_mut() else {
            return false;
        };
        let pid = current.pid;

        if let Some(child) = current.child.as_mut() {
            match child.try_wait() {
                Ok(Some(status)) => {
                    info!("Server (pid {}) exited with {}", pid, status);
                    self.clear(tracked);
                    return false;
                }
                Ok(None) => return true,
                Err(e) => debug!("try_wait failed for pid {}: {}", pid, e),
            }
        }

        match platform::probe(pid) {
            Probe::Alive => true,
            Probe::Gone => {
                debug!("Tracked pid {} no longer exists", pid);
                self.clear(tracked);
                false
            }
            Probe::Unknown(reason) => {
                warn!("Could not probe pid {}: {}", pid, reason);
                false
            }
        }
    }

    fn spawn(&self) -> Result<Child> {
        ensure_parent_dir(&self.log_file)?;
        let log = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.log_file)
            .map_err(|e| StewardError::filesystem("open", &self.log_file, e))?;
        let log_err = log.try_clone().context("Failed to duplicate server log handle")?;

        let mut command = Command::new(&self.executable);
        command
            .current_dir(&self.install_root)
            .stdin(Stdio::null())
            .stdout(Stdio::from(log))
            .stderr(Stdio::from(log_err));
        platform::detach(&mut command, &self.install_root);

        tokio::process::Command::from(command).spawn().map_err(|e| {
            StewardError::Process(format!("failed to launch {}: {e}", self.executable.display()))
                .into()
        })
    }

    /// Wait for a terminated child in the background so it does not linger as
    /// a zombie. The exit itself is never awaited by the caller.
    fn reap(pid: u32, mut child: Child) {
        tokio::spawn(async move {
            match child.wait().await {
                Ok(status) => debug!("Server (pid {}) exited with {}", pid, status),
                Err(e) => debug!("Failed to reap pid {}: {}", pid, e),
            }
        });
    }
}

impl ServerControl for ProcessSupervisor {
    async fn start(&self) -> Result<()> {
        let mut tracked = self.tracked.lock().await;

        if self.check_alive(&mut tracked) {
            info!("Server already running (pid {})", tracked.as_ref().map_or(0, |t| t.pid));
            return Ok(());
        }
        // A pid we could not probe is stale as far as start is concerned.
        if tracked.is_some() {
            self.clear(&mut tracked);
        }

        if !self.executable.exists() {
            warn!(
                "Server executable {} not found; nothing to start until an install completes",
                self.executable.display()
            );
            return Ok(());
        }

        let child = self.spawn()?;
        let Some(pid) = child.id() else {
            return Err(StewardError::Process("server exited before its pid was read".into()).into());
        };
        info!("Started server (pid {})", pid);

        if let Err(e) = safe_write(&self.pid_file, &format!("{pid}\n")) {
            warn!("Failed to record pid file {}: {:#}", self.pid_file.display(), e);
        }
        *tracked = Some(Tracked {
            pid,
            child: Some(child),
        });
        Ok(())
    }

    async fn stop(&self) -> Result<()> {
        let mut tracked = self.tracked.lock().await;

        let Some(current) = tracked.take() else {
            debug!("No server process tracked, nothing to stop");
            return Ok(());
        };
        let pid = current.pid;

        match platform::terminate(pid) {
            Ok(()) => info!("Sent termination request to server (pid {})", pid),
            Err(e) => warn!("Could not signal pid {}, treating it as gone: {:#}", pid, e),
        }

        if let Some(child) = current.child {
            Self::reap(pid, child);
        }

        self.clear(&mut tracked);
        Ok(())
    }

    async fn restart(&self) -> Result<()> {
        self.stop().await?;
        debug!("Waiting {:?} before restarting", self.grace);
        tokio::time::sleep(self.grace).await;
        self.start().await
    }

    async fn is_running(&self) -> bool {
        let mut tracked = self.tracked.lock().await;
        self.check_alive(&mut tracked)
    }
}

fn read_pid_file(path: &Path) -> Option<u32> {
    let content = std::fs::read_to_string(path).ok()?;
    match content.trim().parse::<u32>() {
        Ok(pid) if pid > 0 => Some(pid),
        _ => {
            warn!("Ignoring malformed pid file {}", path.display());
            None
        }
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use std::os::unix::fs::PermissionsExt;
    use tempfile::{TempDir, tempdir};

    struct Fixture {
        _temp: TempDir,
        install: PathBuf,
        pid_file: PathBuf,
        log_file: PathBuf,
    }

    fn fixture() -> Fixture {
        let temp = tempdir().unwrap();
        let install = temp.path().join("server");
        std::fs::create_dir_all(&install).unwrap();
        Fixture {
            pid_file: temp.path().join("state/server.pid"),
            log_file: temp.path().join("state/server.log"),
            install,
            _temp: temp,
        }
    }

    fn write_script(path: &Path, body: &str) {
        std::fs::write(path, format!("#!/bin/sh\n{body}\n")).unwrap();
        std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o755)).unwrap();
    }

    fn supervisor(f: &Fixture) -> ProcessSupervisor {
        ProcessSupervisor::with_paths(
            f.install.clone(),
            f.install.join("bedrock_server"),
            f.pid_file.clone(),
            f.log_file.clone(),
            Duration::from_millis(50),
        )
    }

    #[tokio::test]
    async fn test_start_without_executable_is_silent_noop() {
        let f = fixture();
        let sup = supervisor(&f);

        sup.start().await.unwrap();
        assert!(sup.pid().await.is_none());
        assert!(!sup.is_running().await);
    }

    #[tokio::test]
    async fn test_start_stop_cycle() {
        let f = fixture();
        write_script(&f.install.join("bedrock_server"), "echo started\nexec sleep 30");
        let sup = supervisor(&f);

        sup.start().await.unwrap();
        let pid = sup.pid().await.unwrap();
        assert!(sup.is_running().await);
        assert_eq!(std::fs::read_to_string(&f.pid_file).unwrap().trim(), pid.to_string());

        // Starting again keeps the same process
        sup.start().await.unwrap();
        assert_eq!(sup.pid().await, Some(pid));

        sup.stop().await.unwrap();
        assert!(sup.pid().await.is_none());
        assert!(!f.pid_file.exists());
    }

    #[tokio::test]
    async fn test_exited_child_is_detected() {
        let f = fixture();
        write_script(&f.install.join("bedrock_server"), "exit 0");
        let sup = supervisor(&f);

        sup.start().await.unwrap();
        tokio::time::sleep(Duration::from_millis(300)).await;

        assert!(!sup.is_running().await);
        assert!(sup.pid().await.is_none());
    }

    #[tokio::test]
    async fn test_stale_adopted_pid_is_cleared() {
        let f = fixture();
        let mut child = Command::new("true").spawn().unwrap();
        let dead_pid = child.id();
        child.wait().unwrap();

        std::fs::create_dir_all(f.pid_file.parent().unwrap()).unwrap();
        std::fs::write(&f.pid_file, format!("{dead_pid}\n")).unwrap();

        let sup = supervisor(&f);
        assert_eq!(sup.pid().await, Some(dead_pid));
        assert!(!sup.is_running().await);
        assert!(sup.pid().await.is_none());
        assert!(!f.pid_file.exists());
    }

    #[cfg(target_os = "linux")]
    #[tokio::test]
    async fn test_stopped_child_is_reaped() {
        let f = fixture();
        write_script(&f.install.join("bedrock_server"), "exec sleep 30");
        let sup = supervisor(&f);

        sup.start().await.unwrap();
        let pid = sup.pid().await.unwrap();
        sup.stop().await.unwrap();

        // A zombie keeps its /proc entry until it is waited on
        let proc_entry = PathBuf::from(format!("/proc/{pid}"));
        for _ in 0..100 {
            if !proc_entry.exists() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
        assert!(!proc_entry.exists(), "pid {pid} was not reaped");
    }

    #[tokio::test]
    async fn test_stop_without_pid_is_noop() {
        let f = fixture();
        supervisor(&f).stop().await.unwrap();
    }

    #[tokio::test]
    async fn test_restart_launches_new_process() {
        let f = fixture();
        write_script(&f.install.join("bedrock_server"), "exec sleep 30");
        let sup = supervisor(&f);

        sup.start().await.unwrap();
        let first = sup.pid().await.unwrap();
        sup.restart().await.unwrap();
        let second = sup.pid().await.unwrap();

        assert_ne!(first, second);
        assert!(sup.is_running().await);
        sup.stop().await.unwrap();
    }

    #[tokio::test]
    async fn test_child_output_goes_to_log() {
        let f = fixture();
        write_script(&f.install.join("bedrock_server"), "echo hello from server");
        let sup = supervisor(&f);

        sup.start().await.unwrap();
        tokio::time::sleep(Duration::from_millis(300)).await;

        let log = std::fs::read_to_string(&f.log_file).unwrap();
        assert!(log.contains("hello from server"));
    }

    #[test]
    fn test_malformed_pid_file_is_ignored() {
        let f = fixture();
        std::fs::create_dir_all(f.pid_file.parent().unwrap()).unwrap();
        std::fs::write(&f.pid_file, "not a pid").unwrap();
        assert_eq!(read_pid_file(&f.pid_file), None);
    }
}
