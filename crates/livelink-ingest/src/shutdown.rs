use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use livelink_frame::{FrameConfig, FramingMode, PayloadWriter};
use livelink_transport::TcpEndpoint;
use tracing::{debug, info};

/// Cancellation signal for a [`SessionListener`](crate::SessionListener).
///
/// The listener blocks in `accept`, which no flag can interrupt, so
/// [`trigger`](Self::trigger) also opens a short wake-up connection to the
/// listener's own address and sends a stop request in the listener's
/// framing. Blocked session reads notice the flag through their read
/// timeout.
#[derive(Clone)]
pub struct ShutdownSignal {
    inner: Arc<Inner>,
}

struct Inner {
    triggered: AtomicBool,
    addr: SocketAddr,
    framing: FramingMode,
    frame: FrameConfig,
    wake_timeout: Duration,
}

impl ShutdownSignal {
    /// Signal for a listener bound to `addr`.
    pub fn new(
        addr: SocketAddr,
        framing: FramingMode,
        frame: FrameConfig,
        wake_timeout: Duration,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                triggered: AtomicBool::new(false),
                addr,
                framing,
                frame,
                wake_timeout,
            }),
        }
    }

    /// True once the listener has been asked to stop, or has stopped.
    pub fn is_triggered(&self) -> bool {
        self.inner.triggered.load(Ordering::SeqCst)
    }

    /// Set the flag without waking the listener.
    ///
    /// Used by the listener itself when it exits on its own, so other
    /// watchers stand down. Returns true if this call set the flag.
    pub fn mark(&self) -> bool {
        !self.inner.triggered.swap(true, Ordering::SeqCst)
    }

    /// Ask the listener to stop and wake it up.
    ///
    /// Only the first call wakes the listener. Returns true if this call
    /// triggered the shutdown.
    pub fn trigger(&self, reason: &str) -> bool {
        if !self.mark() {
            return false;
        }
        info!(addr = %self.inner.addr, reason, "stopping listener");
        self.wake();
        true
    }

    /// Listener address this signal wakes.
    pub fn addr(&self) -> SocketAddr {
        self.inner.addr
    }

    fn wake(&self) {
        let inner = &self.inner;
        // Failures mean the listener is already gone.
        let stream = match TcpEndpoint::connect_timeout(inner.addr, inner.wake_timeout) {
            Ok(stream) => stream,
            Err(err) => {
                debug!(error = %err, "wake-up connection failed; listener already closed");
                return;
            }
        };
        let frame = FrameConfig {
            write_timeout: Some(inner.wake_timeout),
            ..inner.frame.clone()
        };
        let result = PayloadWriter::with_config_link(stream, inner.framing, frame)
            .and_then(|mut writer| {
                writer.send_stop()?;
                writer.finish()
            });
        if let Err(err) = result {
            debug!(error = %err, "wake-up stop request not delivered");
        }
    }
}

impl std::fmt::Debug for ShutdownSignal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ShutdownSignal")
            .field("addr", &self.inner.addr)
            .field("framing", &self.inner.framing)
            .field("triggered", &self.is_triggered())
            .finish()
    }
}
