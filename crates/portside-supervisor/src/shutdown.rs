//! Process-wide termination hooks
//!
//! Whatever way the hosting program dies, every registered emulator must
//! die with it. The coordinator covers the termination paths a parent
//! process has: interrupt and termination signals, user signals 1/2,
//! hangup, an unhandled panic, and ordinary return from main (via the
//! drop guard). It is an explicit object with its own install/uninstall
//! lifecycle; nothing is registered behind the host's back at
//! construction time.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::error::ShutdownError;
use crate::registry::InstanceRegistry;
use crate::sink::LogSink;

/// Installs process-wide termination handlers that stop every registered
/// instance exactly once before the termination proceeds.
///
/// The sweep never suppresses the termination itself: after cleanup the
/// original signal is re-raised with its default disposition, and a panic
/// continues into the previously installed panic hook.
pub struct ShutdownCoordinator {
    registry: Arc<InstanceRegistry>,
    sink: Arc<dyn LogSink>,
    swept: Arc<AtomicBool>,
    armed: Arc<AtomicBool>,
    listener: Mutex<Option<JoinHandle<()>>>,
}

impl ShutdownCoordinator {
    /// Create a coordinator over `registry`. Nothing is installed yet.
    pub fn new(registry: Arc<InstanceRegistry>, sink: Arc<dyn LogSink>) -> Self {
        Self {
            registry,
            sink,
            swept: Arc::new(AtomicBool::new(false)),
            armed: Arc::new(AtomicBool::new(false)),
            listener: Mutex::new(None),
        }
    }

    /// Install the termination hooks. Idempotent; must be called from
    /// within a tokio runtime (the signal listener is a spawned task).
    pub fn install(&self) -> Result<(), ShutdownError> {
        let mut listener = self.listener.lock();
        if listener.is_some() {
            return Ok(());
        }

        if !self.armed.swap(true, Ordering::SeqCst) {
            self.install_panic_hook();
        }

        *listener = Some(self.spawn_signal_listener()?);
        debug!("Shutdown hooks installed");
        Ok(())
    }

    /// Remove the signal listener and disarm the panic-hook sweep.
    ///
    /// The panic hook itself stays chained (hooks installed after ours
    /// would be lost by restoring), but a disarmed hook only delegates to
    /// its predecessor.
    pub fn uninstall(&self) {
        if let Some(handle) = self.listener.lock().take() {
            handle.abort();
        }
        self.armed.store(false, Ordering::SeqCst);
        debug!("Shutdown hooks uninstalled");
    }

    /// Run the shutdown sweep now.
    ///
    /// The first trigger wins, from whichever path: an explicit call, a
    /// signal, a panic, or the drop guard. Later triggers are no-ops, so
    /// a second signal arriving during cleanup cannot start a second
    /// concurrent sweep.
    pub fn sweep(&self) {
        if self.swept.swap(true, Ordering::SeqCst) {
            return;
        }
        sweep_registry(&self.registry, self.sink.as_ref());
    }

    /// Guard that runs the sweep when dropped, covering ordinary return
    /// from main. Shares the once-only latch with every other trigger.
    pub fn sweep_on_drop(&self) -> SweepGuard {
        SweepGuard {
            registry: Arc::clone(&self.registry),
            sink: Arc::clone(&self.sink),
            swept: Arc::clone(&self.swept),
        }
    }

    fn install_panic_hook(&self) {
        let registry = Arc::clone(&self.registry);
        let sink = Arc::clone(&self.sink);
        let swept = Arc::clone(&self.swept);
        let armed = Arc::clone(&self.armed);
        let previous = std::panic::take_hook();

        std::panic::set_hook(Box::new(move |info| {
            if armed.load(Ordering::SeqCst) && !swept.swap(true, Ordering::SeqCst) {
                sweep_registry(&registry, sink.as_ref());
            }
            previous(info);
        }));
    }

    #[cfg(unix)]
    fn spawn_signal_listener(&self) -> Result<JoinHandle<()>, ShutdownError> {
        use tokio::signal::unix::{signal, SignalKind};

        let mut sigint = signal(SignalKind::interrupt())?;
        let mut sigterm = signal(SignalKind::terminate())?;
        let mut sighup = signal(SignalKind::hangup())?;
        let mut sigusr1 = signal(SignalKind::user_defined1())?;
        let mut sigusr2 = signal(SignalKind::user_defined2())?;

        let registry = Arc::clone(&self.registry);
        let sink = Arc::clone(&self.sink);
        let swept = Arc::clone(&self.swept);

        Ok(tokio::spawn(async move {
            let signum = tokio::select! {
                _ = sigint.recv() => nix::sys::signal::Signal::SIGINT,
                _ = sigterm.recv() => nix::sys::signal::Signal::SIGTERM,
                _ = sighup.recv() => nix::sys::signal::Signal::SIGHUP,
                _ = sigusr1.recv() => nix::sys::signal::Signal::SIGUSR1,
                _ = sigusr2.recv() => nix::sys::signal::Signal::SIGUSR2,
            };

            info!(signal = %signum, "Termination signal received, stopping all emulators");
            if !swept.swap(true, Ordering::SeqCst) {
                sweep_registry(&registry, sink.as_ref());
            }

            // Cleanup done; let the signal take its ultimate effect.
            unsafe {
                let _ = nix::sys::signal::signal(signum, nix::sys::signal::SigHandler::SigDfl);
            }
            let _ = nix::sys::signal::raise(signum);
        }))
    }

    #[cfg(not(unix))]
    fn spawn_signal_listener(&self) -> Result<JoinHandle<()>, ShutdownError> {
        let registry = Arc::clone(&self.registry);
        let sink = Arc::clone(&self.sink);
        let swept = Arc::clone(&self.swept);

        Ok(tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                info!("Interrupt received, stopping all emulators");
                if !swept.swap(true, Ordering::SeqCst) {
                    sweep_registry(&registry, sink.as_ref());
                }
                std::process::exit(130);
            }
        }))
    }
}

/// Guard returned by [`ShutdownCoordinator::sweep_on_drop`]
pub struct SweepGuard {
    registry: Arc<InstanceRegistry>,
    sink: Arc<dyn LogSink>,
    swept: Arc<AtomicBool>,
}

impl Drop for SweepGuard {
    fn drop(&mut self) {
        if !self.swept.swap(true, Ordering::SeqCst) {
            sweep_registry(&self.registry, self.sink.as_ref());
        }
    }
}

/// Kill-all over the registry, synchronous so it can run where no async
/// runtime can be entered (a panic hook, the tail of the signal task).
/// Removal precedes the kill for each instance, and each live instance is
/// killed at most once even under concurrent sweeps.
fn sweep_registry(registry: &InstanceRegistry, sink: &dyn LogSink) {
    for instance in registry.all() {
        let key = instance.key();
        if registry.remove_if_same(key, &instance).is_some() {
            if let Err(e) = instance.kill() {
                warn!(key = %key, error = %e, "Kill failed during sweep, continuing");
            }
            sink.log(&format!("portside: emulator on port {key} stopped"));
        }
    }
}
