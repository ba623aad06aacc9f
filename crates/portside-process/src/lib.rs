//! # portside-process
//!
//! **Purpose**: Emulator process spawning and signal delivery for Portside
//!
//! Provides the launch specification type, async process creation with full
//! stdio control, pid tracking, idempotent kill, and runtime-free kill
//! delivery by raw pid for exit-path cleanup.
//!
//! ## Features
//!
//! - **Launch Specs**: Builder-style immutable description of one launch
//!   (command, args, cwd, environment overlay, readiness probe, timeout)
//! - **Logical Keys**: Instances keyed by listening port through a single
//!   canonical [`Port`] type
//! - **Process Spawning**: Async spawn with null stdin and piped
//!   stdout/stderr handed to the caller
//! - **Idempotent Kill**: Killing an already-dead child is a no-op
//! - **Raw Signal Delivery**: Blocking SIGKILL by pid, callable where no
//!   async runtime exists (panic hooks, exit paths)
//!
//! ## Usage
//!
//! ```rust,no_run
//! use portside_process::{spawn, LaunchSpec, ReadinessProbe};
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let spec = LaunchSpec::new("java", 9324)
//!     .args(["-jar", "elasticmq-server.jar"])
//!     .readiness(ReadinessProbe::contains("started"));
//!
//! let mut child = spawn(&spec)?;
//! child.kill().await?;
//! # Ok(())
//! # }
//! ```

pub mod child;
pub mod config;
pub mod error;
pub mod signal;
pub mod spawn;

pub use child::SpawnedChild;
pub use config::{LaunchSpec, Port, ReadinessProbe};
pub use error::{ProcessError, Result};
pub use signal::deliver_kill;
pub use spawn::spawn;
