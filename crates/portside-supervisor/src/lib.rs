//! Emulator lifecycle supervision for Portside
//!
//! This crate supervises local cloud-service emulators (message-queue
//! servers, mail-capture servers, local database engines): it launches
//! them, waits deterministically for their readiness banner, tracks them
//! by listening port, forwards their output, and guarantees they are
//! terminated on every exit path of the hosting program.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                          Host program                        │
//! │        before-start ──► HostHooks ◄── before-stop            │
//! ├──────────────────────────────────────────────────────────────┤
//! │                          Supervisor                          │
//! │   start(spec): spawn ─► ReadinessScanner ─► register ─►      │
//! │                forward output until exit, then reap          │
//! │   stop(key):   unregister ─► kill                            │
//! ├───────────────────────────┬──────────────────────────────────┤
//! │      InstanceRegistry     │        ShutdownCoordinator       │
//! │   port ─► live instance   │   SIGINT/SIGTERM/SIGHUP/USR1/2,  │
//! │   (shared, per-key ops)   │   panic hook, drop guard ─►      │
//! │                           │   sweep: stop every instance     │
//! └───────────────────────────┴──────────────────────────────────┘
//! ```
//!
//! # Module Organization
//!
//! - `readiness`: banner detection over the child's output stream
//! - `instance`: per-instance lifecycle state
//! - `registry`: key-to-instance map shared with the shutdown sweep
//! - `supervisor`: the start/stop/forward orchestration
//! - `shutdown`: process-wide termination hooks
//! - `hooks`: host before-start/before-stop adapter
//! - `sink`: the logging sink the host observes output through
//! - `error`: error types and result aliases

pub mod error;
pub mod hooks;
pub mod instance;
pub mod readiness;
pub mod registry;
pub mod shutdown;
pub mod sink;
pub mod supervisor;

pub use error::{ShutdownError, StartError, StopError};
pub use hooks::HostHooks;
pub use instance::{Instance, LifecycleState};
pub use readiness::{ReadinessScanner, ScanOutcome, STARTUP_CAPTURE_LIMIT};
pub use registry::InstanceRegistry;
pub use shutdown::{ShutdownCoordinator, SweepGuard};
pub use sink::{LogSink, MemorySink, TracingSink};
pub use supervisor::{Supervisor, DEFAULT_START_TIMEOUT};

// The process-level types travel with the supervisor API.
pub use portside_process::{LaunchSpec, Port, ProcessError, ReadinessProbe, SpawnedChild};
