/// Errors that can occur while framing or deframing payloads.
#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    /// The frame header contains an invalid magic number.
    #[error("invalid frame magic (expected 0x4D4C \"ML\")")]
    InvalidMagic,

    /// The frame header names a kind this end does not understand.
    #[error("unknown frame kind {0}")]
    UnknownKind(u16),

    /// The payload exceeds the configured maximum size.
    #[error("payload too large ({size} bytes, max {max})")]
    PayloadTooLarge { size: usize, max: usize },

    /// The payload is byte-identical to the reserved sentinel token.
    #[error("payload collides with the reserved sentinel token")]
    ReservedSentinel,

    /// An I/O error occurred while reading or writing frames.
    #[error("frame I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The connection was closed before a complete frame was received.
    #[error("connection closed (incomplete frame)")]
    ConnectionClosed,
}

impl FrameError {
    /// True for read timeouts, which only mean "nothing arrived yet".
    pub fn is_timeout(&self) -> bool {
        matches!(
            self,
            FrameError::Io(err) if matches!(
                err.kind(),
                std::io::ErrorKind::WouldBlock | std::io::ErrorKind::TimedOut
            )
        )
    }
}

pub(crate) fn transport_to_frame_error(err: livelink_transport::TransportError) -> FrameError {
    match err {
        livelink_transport::TransportError::Io(io)
        | livelink_transport::TransportError::Accept(io) => FrameError::Io(io),
        livelink_transport::TransportError::Bind { source, .. }
        | livelink_transport::TransportError::Connect { source, .. } => FrameError::Io(source),
    }
}

pub type Result<T> = std::result::Result<T, FrameError>;
