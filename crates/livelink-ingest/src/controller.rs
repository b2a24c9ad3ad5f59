use std::any::Any;
use std::net::SocketAddr;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use bytes::Bytes;
use tracing::{debug, error, info, warn};

use crate::config::IngestConfig;
use crate::error::{ImportError, IngestError, Result};
use crate::importer::PayloadImporter;
use crate::listener::{ListenerExit, SessionListener};
use crate::mailbox::Mailbox;
use crate::monitor::{LivenessMonitor, LivenessProbe, MonitorCancel, MonitorExit};
use crate::scheduler::{HostScheduler, TickControl};
use crate::shutdown::ShutdownSignal;

/// Result of one [`IngestionController::poll_once`].
#[derive(Debug)]
pub enum PollOutcome {
    /// Nothing was pending.
    Empty,
    /// The payload was handed to the importer, which accepted it.
    Imported(Bytes),
    /// The importer failed or panicked on the payload.
    Failed { payload: Bytes, error: ImportError },
}

impl PollOutcome {
    /// Payload taken from the mailbox by this poll, if any.
    pub fn payload(&self) -> Option<&Bytes> {
        match self {
            PollOutcome::Empty => None,
            PollOutcome::Imported(payload) | PollOutcome::Failed { payload, .. } => Some(payload),
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, PollOutcome::Empty)
    }
}

struct Shared {
    mailbox: Arc<Mailbox>,
    importer: Box<dyn PayloadImporter>,
    stopped: AtomicBool,
}

impl Shared {
    fn poll_once(&self) -> PollOutcome {
        let Some(payload) = self.mailbox.take() else {
            return PollOutcome::Empty;
        };

        match catch_unwind(AssertUnwindSafe(|| self.importer.import(&payload))) {
            Ok(Ok(())) => {
                info!(size = payload.len(), "payload imported");
                PollOutcome::Imported(payload)
            }
            Ok(Err(err)) => {
                warn!(size = payload.len(), error = %err, "payload import failed");
                PollOutcome::Failed {
                    payload,
                    error: err,
                }
            }
            Err(panic) => {
                let err = ImportError::Panicked(panic_message(panic.as_ref()));
                error!(size = payload.len(), error = %err, "importer panicked");
                PollOutcome::Failed {
                    payload,
                    error: err,
                }
            }
        }
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic payload".to_string()
    }
}

/// Runs the ingestion server for one host session.
///
/// Owns the listener thread, the liveness monitor thread, and the mailbox
/// between them. Payloads reach the host only through
/// [`poll_once`](Self::poll_once), normally driven by the callback
/// [`register`](Self::register) installs on the host scheduler.
///
/// Dropping the controller stops both threads and closes the socket.
pub struct IngestionController {
    shared: Arc<Shared>,
    local_addr: SocketAddr,
    shutdown: ShutdownSignal,
    poll_interval: Duration,
    listener: Option<JoinHandle<ListenerExit>>,
    monitor: Option<(MonitorCancel, JoinHandle<MonitorExit>)>,
}

impl IngestionController {
    /// Start the server and register its poll callback with `scheduler`.
    ///
    /// Fails when the address cannot be bound; nothing keeps running then.
    pub fn start<I, P>(
        config: IngestConfig,
        importer: I,
        probe: P,
        scheduler: &dyn HostScheduler,
    ) -> Result<Self>
    where
        I: PayloadImporter,
        P: LivenessProbe,
    {
        let controller = Self::spawn(config, importer, probe)?;
        controller.register(scheduler);
        Ok(controller)
    }

    /// Start the listener and monitor threads without registering a poll
    /// callback. The caller drives [`poll_once`](Self::poll_once).
    pub fn spawn<I, P>(config: IngestConfig, importer: I, probe: P) -> Result<Self>
    where
        I: PayloadImporter,
        P: LivenessProbe,
    {
        let listener = SessionListener::bind(&config)?;
        let local_addr = listener.local_addr();
        let shutdown = listener.shutdown_signal();

        let mailbox = Arc::new(Mailbox::new(config.delivery));
        let shared = Arc::new(Shared {
            mailbox: Arc::clone(&mailbox),
            importer: Box::new(importer),
            stopped: AtomicBool::new(false),
        });

        let listener = thread::Builder::new()
            .name("livelink-listener".to_string())
            .spawn(move || {
                listener.run(move |payload| {
                    mailbox.deliver(payload);
                })
            })
            .map_err(|source| IngestError::Spawn {
                name: "listener",
                source,
            })?;

        let (monitor, cancel) =
            LivenessMonitor::new(probe, config.liveness_interval, shutdown.clone());
        let monitor = match monitor.spawn() {
            Ok(handle) => handle,
            Err(err) => {
                shutdown.trigger("liveness monitor failed to start");
                let _ = listener.join();
                return Err(err);
            }
        };

        info!(
            addr = %local_addr,
            framing = %config.framing,
            delivery = ?config.delivery,
            "ingestion started"
        );

        Ok(Self {
            shared,
            local_addr,
            shutdown,
            poll_interval: config.poll_interval,
            listener: Some(listener),
            monitor: Some((cancel, monitor)),
        })
    }

    /// Register the recurring poll with `scheduler`.
    ///
    /// The callback cancels itself once the controller is dropped, or once it
    /// is stopped and the mailbox has been drained.
    pub fn register(&self, scheduler: &dyn HostScheduler) {
        let shared: Weak<Shared> = Arc::downgrade(&self.shared);
        scheduler.register_recurring(
            self.poll_interval,
            Box::new(move || {
                let Some(shared) = shared.upgrade() else {
                    return TickControl::Cancel;
                };
                shared.poll_once();
                if shared.stopped.load(Ordering::SeqCst) && shared.mailbox.is_empty() {
                    debug!("poll callback unregistered");
                    TickControl::Cancel
                } else {
                    TickControl::Continue
                }
            }),
        );
    }

    /// Put a payload in the mailbox as if a session had completed.
    pub fn deliver_payload(&self, payload: Bytes) {
        self.shared.mailbox.deliver(payload);
    }

    /// Take the pending payload, if any, and import it. Never blocks on
    /// the network and never propagates an importer failure.
    pub fn poll_once(&self) -> PollOutcome {
        self.shared.poll_once()
    }

    /// Address the listener is bound to.
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// True while the listener thread is still accepting sessions.
    pub fn is_listening(&self) -> bool {
        self.listener
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }

    /// Number of payloads waiting to be polled.
    pub fn pending(&self) -> usize {
        self.shared.mailbox.len()
    }

    /// Payloads overwritten or evicted before anyone polled them.
    pub fn dropped(&self) -> u64 {
        self.shared.mailbox.dropped_count()
    }

    /// Signal shared with the listener; triggering it stops ingestion.
    pub fn shutdown_signal(&self) -> ShutdownSignal {
        self.shutdown.clone()
    }

    /// Stop the monitor and the listener and wait for both threads.
    ///
    /// Payloads still in the mailbox stay pollable. Returns how the listener
    /// ended, or `None` if it was already joined or panicked.
    pub fn stop(&mut self) -> Option<ListenerExit> {
        self.shared.stopped.store(true, Ordering::SeqCst);

        if let Some((cancel, handle)) = self.monitor.take() {
            cancel.cancel();
            if handle.join().is_err() {
                error!("liveness monitor thread panicked");
            }
        }

        let handle = self.listener.take()?;
        self.shutdown.trigger("ingestion stopped");
        match handle.join() {
            Ok(exit) => {
                info!(addr = %self.local_addr, ?exit, "ingestion stopped");
                Some(exit)
            }
            Err(_) => {
                error!("listener thread panicked");
                None
            }
        }
    }
}

impl Drop for IngestionController {
    fn drop(&mut self) {
        self.stop();
    }
}

impl std::fmt::Debug for IngestionController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IngestionController")
            .field("addr", &self.local_addr)
            .field("listening", &self.is_listening())
            .field("pending", &self.pending())
            .finish()
    }
}
