use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::sync::{Arc, Weak};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use tracing::{debug, info};

use crate::error::{IngestError, Result};
use crate::shutdown::ShutdownSignal;

/// Answers whether the host's primary thread is still running.
pub trait LivenessProbe: Send + 'static {
    fn is_alive(&self) -> bool;
}

/// [`LivenessProbe`] backed by a closure.
pub struct FnProbe<F>(F);

/// Wrap a closure as a [`LivenessProbe`].
pub fn probe_fn<F>(f: F) -> FnProbe<F>
where
    F: Fn() -> bool + Send + 'static,
{
    FnProbe(f)
}

impl<F> LivenessProbe for FnProbe<F>
where
    F: Fn() -> bool + Send + 'static,
{
    fn is_alive(&self) -> bool {
        (self.0)()
    }
}

/// Held by the primary thread for as long as it runs.
///
/// Dropping the guard (normal return or unwind) flips every
/// [`PrimaryLiveness`] created with it to "not alive".
#[derive(Debug)]
pub struct PrimaryThreadGuard {
    _token: Arc<()>,
}

/// Probe side of a [`PrimaryThreadGuard`].
#[derive(Debug, Clone)]
pub struct PrimaryLiveness {
    token: Weak<()>,
}

impl PrimaryThreadGuard {
    pub fn new() -> (Self, PrimaryLiveness) {
        let token = Arc::new(());
        let liveness = PrimaryLiveness {
            token: Arc::downgrade(&token),
        };
        (Self { _token: token }, liveness)
    }
}

impl LivenessProbe for PrimaryLiveness {
    fn is_alive(&self) -> bool {
        self.token.strong_count() > 0
    }
}

/// Why a monitor stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MonitorExit {
    /// The primary thread was gone; the listener was told to stop.
    PrimaryExited,
    /// The monitor was cancelled or the listener had already stopped.
    Cancelled,
}

/// Cancels a [`LivenessMonitor`]. Dropping it has the same effect.
#[derive(Debug)]
pub struct MonitorCancel {
    _tx: Sender<()>,
}

impl MonitorCancel {
    /// Cancel the monitor. The wait in progress ends immediately.
    pub fn cancel(self) {}
}

/// Watches the primary thread and stops the listener once it is gone.
pub struct LivenessMonitor<P> {
    probe: P,
    interval: Duration,
    shutdown: ShutdownSignal,
    cancel: Receiver<()>,
}

impl<P: LivenessProbe> LivenessMonitor<P> {
    pub fn new(probe: P, interval: Duration, shutdown: ShutdownSignal) -> (Self, MonitorCancel) {
        let (tx, rx) = mpsc::channel();
        let monitor = Self {
            probe,
            interval,
            shutdown,
            cancel: rx,
        };
        (monitor, MonitorCancel { _tx: tx })
    }

    /// Check every `interval` until the primary thread exits, the listener
    /// stops on its own, or the monitor is cancelled (blocking).
    pub fn run(self) -> MonitorExit {
        loop {
            match self.cancel.recv_timeout(self.interval) {
                Err(RecvTimeoutError::Timeout) => {}
                Ok(()) | Err(RecvTimeoutError::Disconnected) => {
                    debug!("liveness monitor cancelled");
                    return MonitorExit::Cancelled;
                }
            }

            if self.shutdown.is_triggered() {
                debug!("listener already stopped; liveness monitor standing down");
                return MonitorExit::Cancelled;
            }

            if !self.probe.is_alive() {
                info!("primary thread exited");
                self.shutdown.trigger("primary thread exited");
                return MonitorExit::PrimaryExited;
            }
        }
    }

    /// Run on a dedicated `livelink-liveness` thread.
    pub fn spawn(self) -> Result<JoinHandle<MonitorExit>> {
        thread::Builder::new()
            .name("livelink-liveness".to_string())
            .spawn(move || self.run())
            .map_err(|source| IngestError::Spawn {
                name: "liveness",
                source,
            })
    }
}

impl<P> std::fmt::Debug for LivenessMonitor<P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LivenessMonitor")
            .field("interval", &self.interval)
            .field("shutdown", &self.shutdown)
            .finish()
    }
}
