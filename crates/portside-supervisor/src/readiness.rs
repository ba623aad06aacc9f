//! Readiness detection from a line-oriented output stream

use std::collections::VecDeque;
use std::io;

use portside_process::ReadinessProbe;
use tokio::io::{AsyncBufRead, Lines};
use tracing::debug;

use crate::sink::LogSink;

/// Cap on the number of startup lines retained for failure diagnostics.
/// Oldest lines are evicted first; a chatty emulator cannot grow the
/// capture without bound while the banner is still pending.
pub const STARTUP_CAPTURE_LIMIT: usize = 256;

/// How a readiness scan ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanOutcome {
    /// The probe matched a line; the stream has not been read past it
    Ready,
    /// The stream reached EOF without the probe matching
    StreamEnded,
}

/// Scans a process output stream until a readiness probe first matches.
///
/// The scanner borrows the caller's [`Lines`] handle rather than owning the
/// stream: on a match it stops reading immediately, and the same handle is
/// then given to the continuous forwarder. The pipe is never left without a
/// consumer, and no line between the banner and the handoff is lost.
///
/// Every scanned line is appended to a bounded capture buffer (the startup
/// log, reported on failure) and forwarded to the sink as it arrives.
pub struct ReadinessScanner {
    probe: ReadinessProbe,
    captured: VecDeque<String>,
}

impl ReadinessScanner {
    /// Create a scanner for `probe`
    pub fn new(probe: ReadinessProbe) -> Self {
        Self {
            probe,
            captured: VecDeque::new(),
        }
    }

    /// Consume lines until the probe matches or the stream ends.
    ///
    /// Short-circuits on the first match: the matching line is captured and
    /// forwarded, and no further line is pulled from `lines`. The caller
    /// bounds the whole call with a timeout; when that timeout drops this
    /// future, everything captured so far remains readable on the scanner.
    pub async fn scan<R>(
        &mut self,
        lines: &mut Lines<R>,
        sink: &dyn LogSink,
    ) -> io::Result<ScanOutcome>
    where
        R: AsyncBufRead + Unpin,
    {
        while let Some(line) = lines.next_line().await? {
            sink.log(&line);
            let matched = self.probe.matches(&line);
            if self.captured.len() == STARTUP_CAPTURE_LIMIT {
                self.captured.pop_front();
            }
            self.captured.push_back(line);

            if matched {
                debug!(
                    lines_scanned = self.captured.len(),
                    "Readiness probe matched"
                );
                return Ok(ScanOutcome::Ready);
            }
        }

        debug!(
            lines_scanned = self.captured.len(),
            "Stream ended before readiness probe matched"
        );
        Ok(ScanOutcome::StreamEnded)
    }

    /// Snapshot of the startup log captured so far
    pub fn captured_lines(&self) -> Vec<String> {
        self.captured.iter().cloned().collect()
    }

    /// Consume the scanner, yielding the startup log
    pub fn into_startup_log(self) -> Vec<String> {
        self.captured.into_iter().collect()
    }
}
