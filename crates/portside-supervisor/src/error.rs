//! Error types for supervision

use std::io;
use std::time::Duration;

use portside_process::{Port, ProcessError};
use thiserror::Error;

/// Why a start call failed.
///
/// The variants that cover the readiness wait carry the captured startup
/// log so a failed boot can be diagnosed without reproducing it. A process
/// that dies after reaching Ready is not a start error; it is reported
/// through the logging sink and frees its key for a fresh start.
#[derive(Debug, Error)]
pub enum StartError {
    /// A required launch parameter is missing or malformed
    #[error("Invalid launch configuration: {0}")]
    ConfigInvalid(String),

    /// The OS could not create the process
    #[error(transparent)]
    Spawn(#[from] ProcessError),

    /// The readiness line never appeared within the allotted time
    #[error("Emulator did not become ready within {timeout:?} ({} startup lines captured)", .startup_log.len())]
    StartupTimeout {
        /// The bound that elapsed
        timeout: Duration,
        /// Output captured during the wait
        startup_log: Vec<String>,
    },

    /// The process exited before the readiness line appeared
    #[error("Emulator exited before becoming ready (exit code {exit_code:?}, {} startup lines captured)", .startup_log.len())]
    ExitedBeforeReady {
        /// Exit code, when the process exited normally
        exit_code: Option<i32>,
        /// Output captured during the wait
        startup_log: Vec<String>,
    },

    /// Reading the output stream failed
    #[error("Failed reading emulator output: {0}")]
    Io(#[from] io::Error),
}

impl StartError {
    /// The startup log attached to readiness failures
    pub fn startup_log(&self) -> &[String] {
        match self {
            Self::StartupTimeout { startup_log, .. }
            | Self::ExitedBeforeReady { startup_log, .. } => startup_log,
            _ => &[],
        }
    }
}

/// Why a stop call failed.
///
/// Best-effort by design: by the time a `KillFailed` is returned the
/// instance is already out of the registry and cleanup has continued.
#[derive(Debug, Error)]
pub enum StopError {
    /// The OS refused the termination signal
    #[error("Failed to stop emulator on port {key}: {source}")]
    KillFailed {
        /// Key of the instance the kill was aimed at
        key: Port,
        /// Underlying signal delivery failure
        source: ProcessError,
    },
}

/// Why shutdown-hook installation failed
#[derive(Debug, Error)]
pub enum ShutdownError {
    /// The OS rejected a signal-handler registration
    #[error("Failed to install termination handler: {0}")]
    Install(#[from] io::Error),
}
