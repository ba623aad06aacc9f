//! Launch specification for an emulator process

use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use crate::error::{ProcessError, Result};

/// Logical key of a managed emulator instance.
///
/// Every instance is identified by the port it listens on. Keeping the key
/// a dedicated type (rather than a bare number or string) means one
/// canonical representation everywhere: registry lookups, log lines, and
/// replacement checks all agree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Port(u16);

impl Port {
    /// Create a key from a port number
    pub const fn new(port: u16) -> Self {
        Self(port)
    }

    /// The underlying port number
    pub const fn get(&self) -> u16 {
        self.0
    }
}

impl From<u16> for Port {
    fn from(port: u16) -> Self {
        Self(port)
    }
}

impl fmt::Display for Port {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Line predicate deciding when a spawned emulator has finished starting.
///
/// The probe is evaluated against each line the process writes to stdout
/// until it matches once. Most emulators print a fixed banner, so the
/// common constructor is [`ReadinessProbe::contains`]:
///
/// ```
/// use portside_process::ReadinessProbe;
///
/// let probe = ReadinessProbe::contains("ElasticMQ server (1.5.7) started");
/// assert!(probe.matches("=== ElasticMQ server (1.5.7) started in 1205 ms ==="));
/// assert!(!probe.matches("Loading queues"));
/// ```
#[derive(Clone)]
pub struct ReadinessProbe {
    predicate: Arc<dyn Fn(&str) -> bool + Send + Sync>,
}

impl ReadinessProbe {
    /// Probe matching any line that contains `needle` literally
    pub fn contains(needle: impl Into<String>) -> Self {
        let needle = needle.into();
        Self {
            predicate: Arc::new(move |line| line.contains(&needle)),
        }
    }

    /// Probe backed by an arbitrary predicate
    pub fn custom<F>(predicate: F) -> Self
    where
        F: Fn(&str) -> bool + Send + Sync + 'static,
    {
        Self {
            predicate: Arc::new(predicate),
        }
    }

    /// Evaluate the probe against one output line
    pub fn matches(&self, line: &str) -> bool {
        (self.predicate)(line)
    }
}

impl fmt::Debug for ReadinessProbe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReadinessProbe").finish_non_exhaustive()
    }
}

/// Specification for launching one emulator process.
///
/// Immutable once handed to the supervisor: all fields are private and the
/// builder consumes `self`.
#[derive(Debug, Clone)]
pub struct LaunchSpec {
    command: String,
    args: Vec<String>,
    working_dir: Option<PathBuf>,
    env: HashMap<String, String>,
    key: Port,
    readiness: ReadinessProbe,
    start_timeout: Option<Duration>,
}

impl LaunchSpec {
    /// Create a specification for `command`, keyed by `key`.
    ///
    /// The default readiness probe matches the first line the process
    /// prints; callers supervising a real emulator set a banner probe via
    /// [`readiness`](Self::readiness).
    pub fn new(command: impl Into<String>, key: impl Into<Port>) -> Self {
        Self {
            command: command.into(),
            args: vec![],
            working_dir: None,
            env: HashMap::new(),
            key: key.into(),
            readiness: ReadinessProbe::custom(|_| true),
            start_timeout: None,
        }
    }

    /// Set command arguments
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args = args.into_iter().map(Into::into).collect();
        self
    }

    /// Set working directory
    pub fn working_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_dir = Some(dir.into());
        self
    }

    /// Add an environment variable on top of the parent environment
    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.insert(key.into(), value.into());
        self
    }

    /// Set the readiness probe
    pub fn readiness(mut self, probe: ReadinessProbe) -> Self {
        self.readiness = probe;
        self
    }

    /// Bound the wait for the readiness line
    pub fn start_timeout(mut self, timeout: Duration) -> Self {
        self.start_timeout = Some(timeout);
        self
    }

    /// Executable path
    pub fn command(&self) -> &str {
        &self.command
    }

    /// Ordered argument list
    pub fn arg_list(&self) -> &[String] {
        &self.args
    }

    /// Working directory, if overridden
    pub fn working_dir_path(&self) -> Option<&PathBuf> {
        self.working_dir.as_ref()
    }

    /// Environment overlay
    pub fn env_overlay(&self) -> &HashMap<String, String> {
        &self.env
    }

    /// Logical key
    pub fn key(&self) -> Port {
        self.key
    }

    /// Readiness probe
    pub fn probe(&self) -> &ReadinessProbe {
        &self.readiness
    }

    /// Configured startup timeout, if any
    pub fn timeout(&self) -> Option<Duration> {
        self.start_timeout
    }

    /// Reject specs that cannot possibly spawn.
    ///
    /// Surfaced before any spawn attempt so a missing launch parameter
    /// fails the start call, not the child process.
    pub fn validate(&self) -> Result<()> {
        if self.command.trim().is_empty() {
            return Err(ProcessError::InvalidConfig(
                "launch command is mandatory".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_port_display_matches_number() {
        let key = Port::new(9324);
        assert_eq!(key.to_string(), "9324");
        assert_eq!(key.get(), 9324);
    }

    #[test]
    fn test_contains_probe() {
        let probe = ReadinessProbe::contains("server started");
        assert!(probe.matches("=== server started in 300 ms ==="));
        assert!(!probe.matches("server starting"));
    }

    #[test]
    fn test_custom_probe() {
        let probe = ReadinessProbe::custom(|line| line.len() > 10);
        assert!(probe.matches("a long enough line"));
        assert!(!probe.matches("short"));
    }

    #[test]
    fn test_validate_rejects_empty_command() {
        let spec = LaunchSpec::new("", 9324);
        assert!(matches!(
            spec.validate(),
            Err(ProcessError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_builder_accumulates() {
        let spec = LaunchSpec::new("java", 9324)
            .args(["-jar", "elasticmq-server.jar"])
            .working_dir("/tmp")
            .env("JAVA_OPTS", "-Xmx256m")
            .start_timeout(std::time::Duration::from_secs(2));

        assert_eq!(spec.command(), "java");
        assert_eq!(spec.arg_list().len(), 2);
        assert_eq!(spec.key(), Port::new(9324));
        assert!(spec.timeout().is_some());
        assert_eq!(
            spec.env_overlay().get("JAVA_OPTS").map(String::as_str),
            Some("-Xmx256m")
        );
        assert!(spec.validate().is_ok());
    }
}
