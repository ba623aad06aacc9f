//! Host lifecycle hooks
//!
//! A hosting program (a dev server, a test harness, an offline CLI) has
//! its own before-start / before-stop lifecycle events. [`HostHooks`] is
//! the adapter it wires them to; the supervisor neither knows nor cares
//! how the host names or sequences those events.

use portside_process::{LaunchSpec, Port};
use tracing::warn;

use crate::error::StartError;
use crate::supervisor::Supervisor;

/// Start/stop adapter over a fixed set of launch specifications
pub struct HostHooks {
    supervisor: Supervisor,
    specs: Vec<LaunchSpec>,
}

impl HostHooks {
    /// Wrap `supervisor` with the specs to launch on host start
    pub fn new(supervisor: Supervisor, specs: Vec<LaunchSpec>) -> Self {
        Self { supervisor, specs }
    }

    /// Start every configured emulator; invoked by the host before its own
    /// startup completes.
    ///
    /// Specs start in order; the first failure aborts and propagates
    /// (already-started instances stay up and remain covered by the
    /// shutdown sweep).
    pub async fn on_before_start(&self) -> Result<Vec<Port>, StartError> {
        let mut started = Vec::with_capacity(self.specs.len());
        for spec in &self.specs {
            started.push(self.supervisor.start(spec.clone()).await?);
        }
        Ok(started)
    }

    /// Stop every configured emulator; invoked by the host as it shuts
    /// down. Kill refusals are logged and do not stop the loop.
    pub fn on_before_stop(&self) {
        for spec in &self.specs {
            if let Err(e) = self.supervisor.stop(spec.key()) {
                warn!(key = %spec.key(), error = %e, "Stop failed during host shutdown");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::instance::LifecycleState;
    use crate::sink::MemorySink;
    use portside_process::ReadinessProbe;
    use std::sync::Arc;
    use std::time::Duration;

    fn banner_spec(key: u16) -> LaunchSpec {
        LaunchSpec::new("/bin/sh", key)
            .args(["-c", "echo up; sleep 30"])
            .readiness(ReadinessProbe::contains("up"))
            .start_timeout(Duration::from_secs(10))
    }

    #[tokio::test]
    #[cfg(unix)]
    async fn test_hooks_start_and_stop_all_specs() {
        let supervisor = Supervisor::with_sink(Arc::new(MemorySink::new()));
        let hooks = HostHooks::new(
            supervisor.clone(),
            vec![banner_spec(9324), banner_spec(9001)],
        );

        let started = hooks.on_before_start().await.unwrap();
        assert_eq!(started.len(), 2);
        assert_eq!(supervisor.state(Port::new(9324)), LifecycleState::Ready);
        assert_eq!(supervisor.state(Port::new(9001)), LifecycleState::Ready);

        hooks.on_before_stop();
        assert_eq!(supervisor.state(Port::new(9324)), LifecycleState::Idle);
        assert_eq!(supervisor.state(Port::new(9001)), LifecycleState::Idle);
    }

    #[tokio::test]
    async fn test_hooks_propagate_start_failure() {
        let supervisor = Supervisor::with_sink(Arc::new(MemorySink::new()));
        let hooks = HostHooks::new(supervisor, vec![LaunchSpec::new("", 9324)]);

        assert!(matches!(
            hooks.on_before_start().await,
            Err(StartError::ConfigInvalid(_))
        ));
    }
}
