//! Supervisor - emulator lifecycle orchestration

use std::sync::Arc;
use std::time::Duration;

use portside_process::{spawn, LaunchSpec, Port, ProcessError, SpawnedChild};
use tokio::io::{AsyncBufReadExt, BufReader, Lines};
use tokio::process::{ChildStderr, ChildStdout};
use tracing::{debug, error, info, warn};

use crate::error::{StartError, StopError};
use crate::instance::{Instance, LifecycleState};
use crate::readiness::{ReadinessScanner, ScanOutcome};
use crate::registry::InstanceRegistry;
use crate::sink::{LogSink, TracingSink};

/// Bound applied to the readiness wait when the spec does not set one.
/// An emulator that never prints its banner must fail the start call, not
/// hang program startup.
pub const DEFAULT_START_TIMEOUT: Duration = Duration::from_secs(30);

/// Orchestrates spawn, readiness wait, registration, output forwarding,
/// and teardown for any number of emulator instances, each keyed by its
/// listening port.
///
/// Cheap to clone; clones share the registry and sink.
///
/// # Examples
/// ```no_run
/// use portside_process::{LaunchSpec, ReadinessProbe};
/// use portside_supervisor::Supervisor;
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let supervisor = Supervisor::new();
/// let spec = LaunchSpec::new("java", 9324)
///     .args(["-jar", "elasticmq-server.jar"])
///     .readiness(ReadinessProbe::contains("ElasticMQ server (1.5.7) started"));
///
/// let key = supervisor.start(spec).await?;
/// supervisor.stop(key)?;
/// # Ok(())
/// # }
/// ```
pub struct Supervisor {
    registry: Arc<InstanceRegistry>,
    sink: Arc<dyn LogSink>,
}

impl Supervisor {
    /// Create a supervisor logging through `tracing`
    pub fn new() -> Self {
        Self::with_sink(Arc::new(TracingSink))
    }

    /// Create a supervisor with a custom logging sink
    pub fn with_sink(sink: Arc<dyn LogSink>) -> Self {
        Self {
            registry: Arc::new(InstanceRegistry::new()),
            sink,
        }
    }

    /// The shared instance registry (handed to the shutdown coordinator)
    pub fn registry(&self) -> Arc<InstanceRegistry> {
        Arc::clone(&self.registry)
    }

    /// Lifecycle state of `key`; `Idle` when no instance is live
    pub fn state(&self, key: Port) -> LifecycleState {
        self.registry
            .lookup(key)
            .map(|instance| instance.state())
            .unwrap_or(LifecycleState::Idle)
    }

    /// Launch the process described by `spec` and wait for it to become
    /// ready.
    ///
    /// If the key already has a live instance (ready or still starting),
    /// that instance is stopped first; two processes never share a key.
    /// On readiness the instance stays registered, its remaining output is
    /// forwarded to the sink for the rest of its life, and its eventual
    /// exit is observed and reported. On any failure nothing stays
    /// registered and the captured startup log rides on the error.
    pub async fn start(&self, spec: LaunchSpec) -> Result<Port, StartError> {
        spec.validate().map_err(|e| match e {
            ProcessError::InvalidConfig(msg) => StartError::ConfigInvalid(msg),
            other => StartError::Spawn(other),
        })?;

        let key = spec.key();

        if self.registry.lookup(key).is_some() {
            self.sink
                .log(&format!("portside: replacing instance on port {key}"));
            if let Err(e) = self.stop(key) {
                warn!(key = %key, error = %e, "Stop of prior instance failed, continuing");
            }
        }

        let mut child = spawn(&spec)?;
        let instance = Arc::new(Instance::new(key, child.pid(), child.spawned_at()));

        // Registered from spawn time: a concurrent start on the same key
        // displaces (and stops) this instance instead of racing it, and
        // the shutdown sweep already covers the readiness-wait phase.
        if let Some(displaced) = self.registry.register(Arc::clone(&instance)) {
            warn!(key = %key, pid = %displaced.pid(), "Displacing concurrently started instance");
            if let Err(e) = displaced.kill() {
                warn!(key = %key, error = %e, "Kill of displaced instance failed, continuing");
            }
        }

        // The stderr pipe needs a reader from spawn time; an emulator that
        // chatters on stderr during boot would otherwise stall on a full
        // pipe before ever printing its banner.
        if let Some(stderr) = child.take_stderr() {
            tokio::spawn(forward_stderr(
                key,
                BufReader::new(stderr).lines(),
                Arc::clone(&self.sink),
            ));
        }

        let stdout = match child.take_stdout() {
            Some(stdout) => stdout,
            None => {
                self.abandon_start(&instance, &mut child).await;
                return Err(StartError::Io(std::io::Error::new(
                    std::io::ErrorKind::BrokenPipe,
                    "stdout pipe unavailable",
                )));
            }
        };

        let mut lines = BufReader::new(stdout).lines();
        let mut scanner = ReadinessScanner::new(spec.probe().clone());
        let timeout = spec.timeout().unwrap_or(DEFAULT_START_TIMEOUT);

        let scanned =
            tokio::time::timeout(timeout, scanner.scan(&mut lines, self.sink.as_ref())).await;

        match scanned {
            Err(_elapsed) => {
                self.abandon_start(&instance, &mut child).await;
                instance.set_state(LifecycleState::Failed);
                self.sink.log(&format!(
                    "portside: emulator on port {key} not ready after {}s, giving up",
                    timeout.as_secs()
                ));
                Err(StartError::StartupTimeout {
                    timeout,
                    startup_log: scanner.into_startup_log(),
                })
            }
            Ok(Err(e)) => {
                self.abandon_start(&instance, &mut child).await;
                instance.set_state(LifecycleState::Failed);
                Err(StartError::Io(e))
            }
            Ok(Ok(ScanOutcome::StreamEnded)) => {
                self.registry.remove_if_same(key, &instance);
                // Reap for the exit code; kill first covers the corner
                // where the child closed stdout but is still running.
                if let Err(e) = child.kill().await {
                    warn!(key = %key, error = %e, "Kill after early stream end failed");
                }
                let exit_code = child.wait().await.ok().and_then(|status| status.code());
                instance.set_state(LifecycleState::Failed);
                self.sink.log(&format!(
                    "portside: emulator on port {key} exited before becoming ready"
                ));
                Err(StartError::ExitedBeforeReady {
                    exit_code,
                    startup_log: scanner.into_startup_log(),
                })
            }
            Ok(Ok(ScanOutcome::Ready)) => {
                instance.set_state(LifecycleState::Ready);
                info!(key = %key, pid = %instance.pid(), "Emulator ready");
                self.sink
                    .log(&format!("portside: emulator on port {key} started"));
                tokio::spawn(forward_and_reap(
                    child,
                    lines,
                    Arc::clone(&instance),
                    Arc::clone(&self.registry),
                    Arc::clone(&self.sink),
                ));
                Ok(key)
            }
        }
    }

    /// Stop the instance registered under `key`.
    ///
    /// A key with no live instance is a successful no-op, which also makes
    /// repeated stops idempotent. Removal from the registry precedes the
    /// kill, so a concurrent sweep or caller sees either a live instance
    /// or nothing, never a half-stopped one.
    pub fn stop(&self, key: Port) -> Result<(), StopError> {
        let Some(instance) = self.registry.unregister(key) else {
            debug!(key = %key, "Stop requested for key with no live instance");
            return Ok(());
        };

        let killed = instance.kill();
        self.sink
            .log(&format!("portside: emulator on port {key} stopped"));

        killed.map_err(|source| {
            error!(key = %key, error = %source, "Kill failed");
            StopError::KillFailed { key, source }
        })
    }

    /// Stop every live instance: the shutdown sweep body.
    ///
    /// Each instance is removed-then-killed exactly once even when sweeps
    /// run concurrently; kill refusals are logged and never halt the
    /// sweep.
    pub fn stop_all(&self) {
        for instance in self.registry.all() {
            let key = instance.key();
            if self.registry.remove_if_same(key, &instance).is_some() {
                if let Err(e) = instance.kill() {
                    warn!(key = %key, error = %e, "Kill failed during sweep, continuing");
                }
                self.sink
                    .log(&format!("portside: emulator on port {key} stopped"));
            }
        }
    }

    async fn abandon_start(&self, instance: &Arc<Instance>, child: &mut SpawnedChild) {
        self.registry.remove_if_same(instance.key(), instance);
        if let Err(e) = child.kill().await {
            warn!(key = %instance.key(), error = %e, "Kill of abandoned start failed");
        }
    }
}

impl Clone for Supervisor {
    fn clone(&self) -> Self {
        Self {
            registry: Arc::clone(&self.registry),
            sink: Arc::clone(&self.sink),
        }
    }
}

impl Default for Supervisor {
    fn default() -> Self {
        Self::new()
    }
}

/// Post-ready phase of a managed process: relay the rest of stdout to the
/// sink, then reap the process and report how it ended.
///
/// An instance still registered when its process exits died on its own:
/// the key is freed and the exit reported. An instance already removed was
/// stopped deliberately and only needs its reap.
async fn forward_and_reap(
    mut child: SpawnedChild,
    mut stdout_lines: Lines<BufReader<ChildStdout>>,
    instance: Arc<Instance>,
    registry: Arc<InstanceRegistry>,
    sink: Arc<dyn LogSink>,
) {
    let key = instance.key();

    while let Ok(Some(line)) = stdout_lines.next_line().await {
        sink.log(&format!("[{key}] {line}"));
    }

    let exit_code = child.wait().await.ok().and_then(|status| status.code());

    if registry.remove_if_same(key, &instance).is_some() {
        instance.set_state(LifecycleState::Stopped);
        warn!(key = %key, exit_code = ?exit_code, "Emulator exited unexpectedly");
        match exit_code {
            Some(code) => sink.log(&format!(
                "portside: emulator on port {key} exited with code {code}"
            )),
            None => sink.log(&format!(
                "portside: emulator on port {key} was terminated by a signal"
            )),
        }
    } else {
        debug!(key = %key, exit_code = ?exit_code, "Emulator reaped after stop");
    }
}

/// Relay stderr to the sink from spawn time until the pipe closes.
async fn forward_stderr(
    key: Port,
    mut lines: Lines<BufReader<ChildStderr>>,
    sink: Arc<dyn LogSink>,
) {
    while let Ok(Some(line)) = lines.next_line().await {
        sink.log(&format!("[{key}] {line}"));
    }
}
