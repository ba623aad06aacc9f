//! Synchronous kill delivery by raw pid
//!
//! The shutdown sweep runs on exit paths where no async runtime can be
//! entered (a panic hook, the tail of a signal handler task). Delivery here
//! is plain blocking syscalls keyed by pid, independent of the
//! [`SpawnedChild`](crate::SpawnedChild) handle.

use tracing::{debug, warn};

use crate::error::{ProcessError, Result};

/// Deliver a forceful kill (SIGKILL-equivalent) to `pid`.
///
/// A process that is already gone counts as success; the goal of every
/// caller is "this pid must not outlive us", which a dead process already
/// satisfies.
///
/// - Unix: `kill(pid, SIGKILL)` via nix; ESRCH maps to success
/// - Windows: `taskkill /pid <pid> /f`
pub fn deliver_kill(pid: u32) -> Result<()> {
    #[cfg(unix)]
    {
        use nix::errno::Errno;
        use nix::sys::signal::{kill, Signal};
        use nix::unistd::Pid;

        match kill(Pid::from_raw(pid as i32), Signal::SIGKILL) {
            Ok(()) => {
                debug!(pid = %pid, "Sent SIGKILL");
                Ok(())
            }
            Err(Errno::ESRCH) => {
                debug!(pid = %pid, "Kill skipped, no such process");
                Ok(())
            }
            Err(e) => {
                warn!(pid = %pid, error = %e, "Kill signal refused");
                Err(ProcessError::KillFailed {
                    pid,
                    reason: e.to_string(),
                })
            }
        }
    }

    #[cfg(windows)]
    {
        use std::process::{Command, Stdio};

        let status = Command::new("taskkill")
            .args(["/pid", &pid.to_string(), "/f"])
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .map_err(|e| ProcessError::KillFailed {
                pid,
                reason: e.to_string(),
            })?;

        // taskkill exits 128 when the pid does not exist; already-gone is
        // success, same as the Unix branch.
        if status.success() || status.code() == Some(128) {
            debug!(pid = %pid, "taskkill delivered");
            Ok(())
        } else {
            warn!(pid = %pid, ?status, "taskkill refused");
            Err(ProcessError::KillFailed {
                pid,
                reason: format!("taskkill exited with {status}"),
            })
        }
    }
}
