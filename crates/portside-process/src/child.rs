//! Spawned child process wrapper

use std::io;
use std::time::Instant;
use tokio::process::{Child, ChildStderr, ChildStdout};
use tracing::{debug, warn};

use crate::{
    config::Port,
    error::{ProcessError, Result},
};

/// Wrapper around one spawned emulator process.
///
/// Owns the OS process handle for its lifetime. The output pipes are
/// surrendered to the reader exactly once via [`take_stdout`] and
/// [`take_stderr`]; whoever ends up holding the wrapper is responsible for
/// reaping the process with [`wait`].
///
/// [`take_stdout`]: Self::take_stdout
/// [`take_stderr`]: Self::take_stderr
/// [`wait`]: Self::wait
pub struct SpawnedChild {
    child: Child,
    key: Port,
    pid: u32,
    spawned_at: Instant,
}

impl SpawnedChild {
    pub(crate) fn new(child: Child, key: Port, pid: u32) -> Self {
        Self {
            child,
            key,
            pid,
            spawned_at: Instant::now(),
        }
    }

    /// OS process id
    pub fn pid(&self) -> u32 {
        self.pid
    }

    /// Logical key this process was launched under
    pub fn key(&self) -> Port {
        self.key
    }

    /// Spawn time
    pub fn spawned_at(&self) -> Instant {
        self.spawned_at
    }

    /// Take the stdout pipe. Yields `Some` exactly once.
    pub fn take_stdout(&mut self) -> Option<ChildStdout> {
        self.child.stdout.take()
    }

    /// Take the stderr pipe. Yields `Some` exactly once.
    pub fn take_stderr(&mut self) -> Option<ChildStderr> {
        self.child.stderr.take()
    }

    /// Check liveness without blocking
    pub fn is_running(&mut self) -> bool {
        matches!(self.child.try_wait(), Ok(None))
    }

    /// Wait for the process to exit and reap it
    pub async fn wait(&mut self) -> io::Result<std::process::ExitStatus> {
        self.child.wait().await
    }

    /// Forcefully terminate the process.
    ///
    /// Idempotent: killing a process that has already exited (or was
    /// already killed) is a no-op, not an error.
    pub async fn kill(&mut self) -> Result<()> {
        if let Ok(Some(status)) = self.child.try_wait() {
            debug!(pid = %self.pid, ?status, "Kill skipped, process already exited");
            return Ok(());
        }

        match self.child.kill().await {
            Ok(()) => {
                debug!(pid = %self.pid, key = %self.key, "Emulator process killed");
                Ok(())
            }
            // Raced with the exit: the handle was already reaped.
            Err(e) if e.kind() == io::ErrorKind::InvalidInput => Ok(()),
            Err(e) => {
                warn!(pid = %self.pid, error = %e, "Failed to kill emulator process");
                Err(ProcessError::KillFailed {
                    pid: self.pid,
                    reason: e.to_string(),
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LaunchSpec;
    use crate::spawn::spawn;

    #[tokio::test]
    async fn test_is_running() {
        let spec = LaunchSpec::new("sleep", 9324).args(["1"]);
        let mut child = spawn(&spec).unwrap();
        assert!(child.is_running());

        child.wait().await.unwrap();
        assert!(!child.is_running());
    }

    #[tokio::test]
    async fn test_kill_is_idempotent() {
        let spec = LaunchSpec::new("sleep", 9324).args(["30"]);
        let mut child = spawn(&spec).unwrap();
        assert!(child.is_running());

        child.kill().await.unwrap();
        child.wait().await.unwrap();

        // Second kill on a dead process is a no-op.
        child.kill().await.unwrap();
        assert!(!child.is_running());
    }

    #[tokio::test]
    async fn test_take_stdout_once() {
        let spec = LaunchSpec::new("echo", 9324).args(["hi"]);
        let mut child = spawn(&spec).unwrap();
        assert!(child.take_stdout().is_some());
        assert!(child.take_stdout().is_none());
        child.wait().await.unwrap();
    }
}
