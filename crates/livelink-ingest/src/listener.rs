use std::net::SocketAddr;
use std::thread;
use std::time::Duration;

use bytes::Bytes;
use livelink_frame::{FrameConfig, FrameError, FramingMode, SessionEvent, SessionReader};
use livelink_transport::{LinkStream, TcpEndpoint};
use tracing::{debug, info, warn};

use crate::config::IngestConfig;
use crate::error::Result;
use crate::shutdown::ShutdownSignal;

/// Pause after a failed `accept` so a persistent error cannot spin.
const ACCEPT_BACKOFF: Duration = Duration::from_millis(50);

/// Why a listener stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListenerExit {
    /// A producer sent the sentinel or a STOP frame.
    RemoteStop,
    /// The [`ShutdownSignal`] fired.
    Cancelled,
}

enum SessionEnd {
    Closed { delivered: usize },
    Stop,
    Cancelled,
}

/// Accepts producer sessions one at a time and delivers their payloads.
///
/// A session is fully read and its payloads delivered before the next
/// connection is accepted, so at most one delivery is ever in flight.
pub struct SessionListener {
    endpoint: TcpEndpoint,
    framing: FramingMode,
    frame: FrameConfig,
    shutdown: ShutdownSignal,
    next_session: u64,
}

impl SessionListener {
    /// Bind the configured address. Fails if it is already in use.
    pub fn bind(config: &IngestConfig) -> Result<Self> {
        let endpoint = TcpEndpoint::bind(config.addr)?;
        let shutdown = ShutdownSignal::new(
            endpoint.local_addr(),
            config.framing,
            config.frame.clone(),
            config.wake_timeout,
        );
        Ok(Self {
            endpoint,
            framing: config.framing,
            frame: config.session_frame_config(),
            shutdown,
            next_session: 0,
        })
    }

    /// Bound address (with the real port when bound to port 0).
    pub fn local_addr(&self) -> SocketAddr {
        self.endpoint.local_addr()
    }

    /// Signal that stops this listener from another thread.
    pub fn shutdown_signal(&self) -> ShutdownSignal {
        self.shutdown.clone()
    }

    /// Serve sessions until a stop request or the shutdown signal (blocking).
    ///
    /// Session I/O failures are logged and the session abandoned; only a
    /// stop ends the loop. The listening socket closes on return.
    pub fn run<F>(mut self, mut deliver: F) -> ListenerExit
    where
        F: FnMut(Bytes),
    {
        info!(
            addr = %self.local_addr(),
            framing = %self.framing,
            "asset listener running"
        );

        loop {
            let stream = match self.endpoint.accept() {
                Ok(stream) => stream,
                Err(err) => {
                    if self.shutdown.is_triggered() {
                        return self.finish(ListenerExit::Cancelled);
                    }
                    warn!(error = %err, "accept failed");
                    thread::sleep(ACCEPT_BACKOFF);
                    continue;
                }
            };

            if self.shutdown.is_triggered() {
                return self.finish(ListenerExit::Cancelled);
            }

            self.next_session += 1;
            let session = self.next_session;
            debug!(session, peer = ?stream.peer_addr(), "session started");

            match self.run_session(session, stream, &mut deliver) {
                Ok(SessionEnd::Closed { delivered }) => {
                    debug!(session, delivered, "session finished");
                }
                Ok(SessionEnd::Stop) => {
                    info!(session, "stop requested by producer");
                    return self.finish(ListenerExit::RemoteStop);
                }
                Ok(SessionEnd::Cancelled) => {
                    debug!(session, "session interrupted by shutdown");
                    return self.finish(ListenerExit::Cancelled);
                }
                Err(err) => {
                    warn!(session, error = %err, "session abandoned");
                }
            }
        }
    }

    fn run_session<F>(
        &self,
        session: u64,
        stream: LinkStream,
        deliver: &mut F,
    ) -> std::result::Result<SessionEnd, FrameError>
    where
        F: FnMut(Bytes),
    {
        let mut reader = SessionReader::with_config_link(stream, self.framing, self.frame.clone())?;
        let mut delivered = 0usize;

        // The flag is checked after every read, whether it timed out or
        // carried bytes, so a trickling producer cannot hold the thread.
        loop {
            match reader.poll_event() {
                Ok(Some(SessionEvent::Payload(payload))) => {
                    debug!(session, size = payload.len(), "payload complete");
                    deliver(payload);
                    delivered += 1;
                }
                Ok(Some(SessionEvent::Stop)) => return Ok(SessionEnd::Stop),
                Ok(Some(SessionEvent::Closed)) => return Ok(SessionEnd::Closed { delivered }),
                Ok(None) => {}
                Err(err) if err.is_timeout() => {}
                Err(err) => return Err(err),
            }
            if self.shutdown.is_triggered() {
                return Ok(SessionEnd::Cancelled);
            }
        }
    }

    fn finish(self, exit: ListenerExit) -> ListenerExit {
        self.shutdown.mark();
        info!(addr = %self.local_addr(), ?exit, sessions = self.next_session, "asset listener stopped");
        exit
    }
}

impl std::fmt::Debug for SessionListener {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionListener")
            .field("addr", &self.local_addr())
            .field("framing", &self.framing)
            .finish()
    }
}
