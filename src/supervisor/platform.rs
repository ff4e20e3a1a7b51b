//! OS primitives behind the supervisor: liveness probes, graceful termination
//! and detached spawning.
//!
//! POSIX uses signals (`kill(pid, 0)` to probe, `SIGTERM` to stop). Windows
//! goes through `tasklist`/`taskkill` keyed on the pid.

use crate::core::StewardError;
use anyhow::Result;
use std::path::Path;
use std::process::Command;
use tracing::debug;

/// Result of probing a pid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Probe {
    Alive,
    /// The OS reported there is no such process.
    Gone,
    /// The probe itself failed.
    Unknown(String),
}

#[cfg(unix)]
pub fn probe(pid: u32) -> Probe {
    let Some(pid) = signal_target(pid) else {
        return Probe::Unknown(format!("pid {pid} is out of range"));
    };

    // SAFETY: signal 0 performs no action; pid is validated to be a positive i32.
    #[allow(unsafe_code)]
    let ret = unsafe { libc::kill(pid, 0) };
    if ret == 0 {
        return Probe::Alive;
    }

    let errno = std::io::Error::last_os_error();
    if errno.raw_os_error() == Some(libc::ESRCH) {
        Probe::Gone
    } else {
        Probe::Unknown(errno.to_string())
    }
}

/// Send `SIGTERM` without waiting for the process to exit.
///
/// A process that no longer exists counts as terminated.
#[cfg(unix)]
pub fn terminate(pid: u32) -> Result<()> {
    let Some(target) = signal_target(pid) else {
        return Err(StewardError::Process(format!("refusing to signal pid {pid}")).into());
    };

    debug!("sending SIGTERM to pid {pid}");
    // SAFETY: kill() with a validated positive pid and a valid signal.
    #[allow(unsafe_code)]
    let ret = unsafe { libc::kill(target, libc::SIGTERM) };
    if ret != 0 {
        let errno = std::io::Error::last_os_error();
        if errno.raw_os_error() == Some(libc::ESRCH) {
            debug!("pid {pid} already exited before SIGTERM");
        } else {
            return Err(StewardError::Process(format!(
                "failed to send SIGTERM to pid {pid}: {errno}"
            ))
            .into());
        }
    }
    Ok(())
}

/// Positive pids only: 0 and negative values address process groups.
#[cfg(unix)]
fn signal_target(pid: u32) -> Option<libc::pid_t> {
    libc::pid_t::try_from(pid).ok().filter(|p| *p > 0)
}

#[cfg(windows)]
pub fn probe(pid: u32) -> Probe {
    let output = Command::new("tasklist")
        .args(["/FI", &format!("PID eq {pid}"), "/NH", "/FO", "CSV"])
        .output();

    match output {
        Ok(output) if output.status.success() => {
            let stdout = String::from_utf8_lossy(&output.stdout);
            let needle = format!("\"{pid}\"");
            if stdout.contains(&needle) { Probe::Alive } else { Probe::Gone }
        }
        Ok(output) => Probe::Unknown(String::from_utf8_lossy(&output.stderr).trim().to_string()),
        Err(e) => Probe::Unknown(e.to_string()),
    }
}

#[cfg(windows)]
pub fn terminate(pid: u32) -> Result<()> {
    debug!("requesting termination of pid {pid}");
    let graceful = Command::new("taskkill").args(["/PID", &pid.to_string(), "/T"]).output();

    if matches!(&graceful, Ok(o) if o.status.success()) {
        return Ok(());
    }
    if probe(pid) == Probe::Gone {
        return Ok(());
    }

    // Console servers without a window ignore the close request.
    let forced = Command::new("taskkill")
        .args(["/PID", &pid.to_string(), "/T", "/F"])
        .output()
        .map_err(|e| StewardError::Process(format!("failed to run taskkill: {e}")))?;

    if !forced.status.success() && probe(pid) != Probe::Gone {
        return Err(StewardError::Process(format!(
            "taskkill failed for pid {pid}: {}",
            String::from_utf8_lossy(&forced.stderr).trim()
        ))
        .into());
    }
    Ok(())
}

/// Configure `command` so the child outlives the supervising process.
///
/// On POSIX the child gets its own process group (so a Ctrl-C aimed at
/// steward does not reach it) and `LD_LIBRARY_PATH` pointing at the install
/// root, where the server ships its shared libraries.
pub fn detach(command: &mut Command, install_root: &Path) {
    #[cfg(unix)]
    {
        use std::os::unix::process::CommandExt;
        command.process_group(0);
        command.env("LD_LIBRARY_PATH", install_root);
    }

    #[cfg(windows)]
    {
        use std::os::windows::process::CommandExt;
        const CREATE_NEW_PROCESS_GROUP: u32 = 0x0000_0200;
        const DETACHED_PROCESS: u32 = 0x0000_0008;
        command.creation_flags(CREATE_NEW_PROCESS_GROUP | DETACHED_PROCESS);
        let _ = install_root;
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    #[test]
    fn test_probe_self_is_alive() {
        assert_eq!(probe(std::process::id()), Probe::Alive);
    }

    #[test]
    fn test_probe_reaped_child_is_gone() {
        let mut child = Command::new("true").spawn().unwrap();
        let pid = child.id();
        child.wait().unwrap();
        assert_eq!(probe(pid), Probe::Gone);
    }

    #[test]
    fn test_zero_pid_is_never_signalled() {
        assert!(matches!(probe(0), Probe::Unknown(_)));
        assert!(terminate(0).is_err());
    }

    #[test]
    fn test_terminate_gone_process_is_ok() {
        let mut child = Command::new("true").spawn().unwrap();
        let pid = child.id();
        child.wait().unwrap();
        terminate(pid).unwrap();
    }
}
