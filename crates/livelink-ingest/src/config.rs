use std::net::SocketAddr;
use std::time::Duration;

use bytes::Bytes;
use livelink_frame::{FrameConfig, FramingMode};
use livelink_transport::DEFAULT_ADDR;

/// How the mailbox treats payloads nobody has polled yet.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DeliveryPolicy {
    /// Keep only the newest payload; an unconsumed one is overwritten.
    #[default]
    LatestOnly,
    /// Queue up to `n` payloads, dropping the oldest when full.
    Bounded(usize),
}

impl DeliveryPolicy {
    /// Number of payloads the mailbox holds at once.
    pub fn capacity(self) -> usize {
        match self {
            DeliveryPolicy::LatestOnly => 1,
            DeliveryPolicy::Bounded(n) => n.max(1),
        }
    }
}

/// Configuration for an [`IngestionController`](crate::IngestionController).
#[derive(Debug, Clone)]
pub struct IngestConfig {
    /// Listening address. Default: `127.0.0.1:28888`.
    pub addr: SocketAddr,
    /// Wire format expected from producers. Default: legacy.
    pub framing: FramingMode,
    /// Framing limits and the sentinel token.
    pub frame: FrameConfig,
    /// Read timeout on session sockets; bounds how long a blocked read takes
    /// to notice a shutdown. Default: 250 ms.
    pub session_poll_interval: Duration,
    /// How often the primary thread is checked. Default: 3 s.
    pub liveness_interval: Duration,
    /// Cadence of the host scheduler poll. Default: 1 s.
    pub poll_interval: Duration,
    /// Mailbox policy. Default: latest only.
    pub delivery: DeliveryPolicy,
    /// Connect timeout for the shutdown wake-up connection. Default: 1 s.
    pub wake_timeout: Duration,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            addr: DEFAULT_ADDR,
            framing: FramingMode::Legacy,
            frame: FrameConfig::default(),
            session_poll_interval: Duration::from_millis(250),
            liveness_interval: Duration::from_secs(3),
            poll_interval: Duration::from_secs(1),
            delivery: DeliveryPolicy::LatestOnly,
            wake_timeout: Duration::from_secs(1),
        }
    }
}

impl IngestConfig {
    /// Override the listening address.
    pub fn with_addr(mut self, addr: SocketAddr) -> Self {
        self.addr = addr;
        self
    }

    /// Override the wire format.
    pub fn with_framing(mut self, framing: FramingMode) -> Self {
        self.framing = framing;
        self
    }

    /// Override the legacy sentinel token.
    pub fn with_sentinel(mut self, sentinel: impl Into<Bytes>) -> Self {
        self.frame.sentinel = sentinel.into();
        self
    }

    /// Override the mailbox policy.
    pub fn with_delivery(mut self, delivery: DeliveryPolicy) -> Self {
        self.delivery = delivery;
        self
    }

    /// Override the liveness check interval.
    pub fn with_liveness_interval(mut self, interval: Duration) -> Self {
        self.liveness_interval = interval;
        self
    }

    /// Override the scheduler poll cadence.
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Override the session read timeout.
    pub fn with_session_poll_interval(mut self, interval: Duration) -> Self {
        self.session_poll_interval = interval;
        self
    }

    /// Frame configuration for session sockets, with the read timeout applied.
    pub(crate) fn session_frame_config(&self) -> FrameConfig {
        FrameConfig {
            read_timeout: Some(self.session_poll_interval),
            ..self.frame.clone()
        }
    }
}
