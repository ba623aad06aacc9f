//! Error types for process control

use std::io;
use thiserror::Error;

/// Process control errors
#[derive(Debug, Error)]
pub enum ProcessError {
    /// OS could not create the process
    #[error("Failed to spawn process: {0}")]
    SpawnFailed(#[from] io::Error),

    /// A required launch parameter is missing or malformed
    #[error("Invalid launch specification: {0}")]
    InvalidConfig(String),

    /// The OS refused the termination signal
    #[error("Failed to kill process (pid {pid}): {reason}")]
    KillFailed { pid: u32, reason: String },
}

/// Result type for process operations
pub type Result<T> = std::result::Result<T, ProcessError>;
