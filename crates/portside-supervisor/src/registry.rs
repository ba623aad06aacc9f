//! Registry of live emulator instances

use std::sync::Arc;

use dashmap::DashMap;
use portside_process::Port;
use tracing::debug;

use crate::instance::Instance;

/// Key-to-instance map for every live supervised process.
///
/// Invariant: an instance is reachable here if and only if its process is
/// believed alive. Every termination path removes the entry before
/// delivering the kill, so a lookup never returns a handle to a process
/// that is already being torn down.
///
/// Shared between the supervisor and the shutdown coordinator; all
/// operations are safe under concurrent registration, explicit stops, and
/// the shutdown sweep.
#[derive(Debug, Default)]
pub struct InstanceRegistry {
    instances: DashMap<Port, Arc<Instance>>,
}

impl InstanceRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `instance` under its key, returning any displaced prior
    /// instance.
    ///
    /// The caller stops a displaced instance; the registry never silently
    /// drops a live process.
    pub fn register(&self, instance: Arc<Instance>) -> Option<Arc<Instance>> {
        let key = instance.key();
        debug!(key = %key, pid = %instance.pid(), "Registering instance");
        self.instances.insert(key, instance)
    }

    /// Look up the live instance for `key`
    pub fn lookup(&self, key: Port) -> Option<Arc<Instance>> {
        self.instances.get(&key).map(|entry| Arc::clone(&*entry))
    }

    /// Remove the entry for `key` without killing it.
    ///
    /// Used once a process has been observed to exit on its own, and by
    /// stop paths that kill after removal.
    pub fn unregister(&self, key: Port) -> Option<Arc<Instance>> {
        self.instances.remove(&key).map(|(_, instance)| instance)
    }

    /// Remove the entry for `key` only if it is still `instance`.
    ///
    /// The linearization point for exit observers and the shutdown sweep:
    /// of all concurrent callers naming the same instance, exactly one
    /// gets `Some` back, and a replacement instance registered under the
    /// same key in the meantime is left untouched.
    pub fn remove_if_same(&self, key: Port, instance: &Arc<Instance>) -> Option<Arc<Instance>> {
        self.instances
            .remove_if(&key, |_, current| Arc::ptr_eq(current, instance))
            .map(|(_, removed)| removed)
    }

    /// Snapshot of every live instance, for the shutdown sweep
    pub fn all(&self) -> Vec<Arc<Instance>> {
        self.instances
            .iter()
            .map(|entry| Arc::clone(&*entry))
            .collect()
    }

    /// Number of live instances
    pub fn len(&self) -> usize {
        self.instances.len()
    }

    /// Whether no instance is live
    pub fn is_empty(&self) -> bool {
        self.instances.is_empty()
    }
}
