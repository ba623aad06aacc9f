//! Managed instance state

use std::time::Instant;

use parking_lot::Mutex;
use portside_process::{deliver_kill, Port};
use tracing::debug;

/// Lifecycle state of one logical key.
///
/// `Idle` is never stored on an instance; it is what
/// [`Supervisor::state`](crate::Supervisor::state) reports for a key with
/// no live instance (never started, fully stopped, or failed and freed).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleState {
    /// No instance for this key
    Idle,
    /// Spawned, waiting for the readiness line
    Starting,
    /// Readiness confirmed, output forwarding attached
    Ready,
    /// Kill in flight
    Stopping,
    /// Terminated (explicitly or by itself)
    Stopped,
    /// Never reached Ready (spawn error, early exit, or timeout)
    Failed,
}

/// One supervised emulator process.
///
/// The instance does not own the OS handle; the start call (before
/// readiness) and the forwarding task (after) do, and they also reap it.
/// The instance carries what every other party needs: identity, the pid
/// for kill delivery, and the lifecycle state.
#[derive(Debug)]
pub struct Instance {
    key: Port,
    pid: u32,
    spawned_at: Instant,
    state: Mutex<LifecycleState>,
}

impl Instance {
    pub(crate) fn new(key: Port, pid: u32, spawned_at: Instant) -> Self {
        Self {
            key,
            pid,
            spawned_at,
            state: Mutex::new(LifecycleState::Starting),
        }
    }

    /// Logical key
    pub fn key(&self) -> Port {
        self.key
    }

    /// OS process id
    pub fn pid(&self) -> u32 {
        self.pid
    }

    /// Spawn time
    pub fn spawned_at(&self) -> Instant {
        self.spawned_at
    }

    /// Current lifecycle state
    pub fn state(&self) -> LifecycleState {
        *self.state.lock()
    }

    pub(crate) fn set_state(&self, state: LifecycleState) {
        let mut current = self.state.lock();
        let from = *current;
        debug!(key = %self.key, ?from, to = ?state, "Instance state transition");
        *current = state;
    }

    /// Kill the underlying process.
    ///
    /// Idempotent: an instance already stopped (or stopping) is left alone.
    /// Callers reach here only after removing the instance from the
    /// registry, so each live process receives at most one kill.
    pub(crate) fn kill(&self) -> portside_process::Result<()> {
        {
            let mut state = self.state.lock();
            if matches!(*state, LifecycleState::Stopping | LifecycleState::Stopped) {
                return Ok(());
            }
            *state = LifecycleState::Stopping;
        }

        let delivered = deliver_kill(self.pid);
        self.set_state(LifecycleState::Stopped);
        delivered
    }
}
