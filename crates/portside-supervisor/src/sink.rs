//! Logging sink for emulator output and lifecycle events
//!
//! The supervisor reports everything user-visible through one `log(line)`
//! capability so the hosting program can route emulator output to its own
//! CLI surface. Diagnostic logging stays on `tracing` and is unaffected by
//! the sink choice.

use parking_lot::Mutex;
use tracing::info;

/// Destination for startup lines, forwarded output, and lifecycle events
pub trait LogSink: Send + Sync {
    /// Write one line
    fn log(&self, line: &str);
}

/// Default sink forwarding to `tracing::info!`
#[derive(Debug, Default)]
pub struct TracingSink;

impl LogSink for TracingSink {
    fn log(&self, line: &str) {
        info!("{line}");
    }
}

/// Sink collecting lines in memory.
///
/// Used by tests and by hosts that render output themselves.
#[derive(Debug, Default)]
pub struct MemorySink {
    lines: Mutex<Vec<String>>,
}

impl MemorySink {
    /// Create an empty sink
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of everything logged so far
    pub fn lines(&self) -> Vec<String> {
        self.lines.lock().clone()
    }

    /// Whether any collected line contains `needle`
    pub fn contains(&self, needle: &str) -> bool {
        self.lines.lock().iter().any(|l| l.contains(needle))
    }
}

impl LogSink for MemorySink {
    fn log(&self, line: &str) {
        self.lines.lock().push(line.to_string());
    }
}
