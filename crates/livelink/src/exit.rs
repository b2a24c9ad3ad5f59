use std::fmt;
use std::io;

use livelink_asset::AssetError;
use livelink_frame::FrameError;
use livelink_ingest::IngestError;
use livelink_transport::TransportError;

pub const SUCCESS: i32 = 0;
pub const FAILURE: i32 = 1;
pub const TRANSPORT_ERROR: i32 = 3;
pub const PERMISSION_DENIED: i32 = 50;
pub const DATA_INVALID: i32 = 60;
pub const USAGE: i32 = 64;
pub const TIMEOUT: i32 = 124;
pub const INTERNAL: i32 = 125;

pub type CliResult<T> = Result<T, CliError>;

#[derive(Debug)]
pub struct CliError {
    pub code: i32,
    pub message: String,
}

impl CliError {
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for CliError {}

pub fn io_error(context: &str, err: io::Error) -> CliError {
    let code = match err.kind() {
        io::ErrorKind::PermissionDenied => PERMISSION_DENIED,
        io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock => TIMEOUT,
        io::ErrorKind::ConnectionRefused => FAILURE,
        io::ErrorKind::AddrInUse | io::ErrorKind::AddrNotAvailable => TRANSPORT_ERROR,
        _ => INTERNAL,
    };
    CliError::new(code, format!("{context}: {err}"))
}

pub fn transport_error(context: &str, err: TransportError) -> CliError {
    match err {
        TransportError::Bind { addr, source } | TransportError::Connect { addr, source } => {
            io_error(&format!("{context} ({addr})"), source)
        }
        TransportError::Accept(source) | TransportError::Io(source) => io_error(context, source),
    }
}

pub fn frame_error(context: &str, err: FrameError) -> CliError {
    match err {
        FrameError::Io(source) => io_error(context, source),
        FrameError::PayloadTooLarge { .. }
        | FrameError::ReservedSentinel
        | FrameError::InvalidMagic
        | FrameError::UnknownKind(_) => CliError::new(DATA_INVALID, format!("{context}: {err}")),
        FrameError::ConnectionClosed => CliError::new(FAILURE, format!("{context}: {err}")),
    }
}

pub fn asset_error(context: &str, err: AssetError) -> CliError {
    CliError::new(DATA_INVALID, format!("{context}: {err}"))
}

pub fn ingest_error(context: &str, err: IngestError) -> CliError {
    match err {
        IngestError::Transport(err) => transport_error(context, err),
        IngestError::Frame(err) => frame_error(context, err),
        IngestError::Spawn { .. } => CliError::new(INTERNAL, format!("{context}: {err}")),
    }
}

#[cfg(test)]
mod tests {
    use std::net::{Ipv4Addr, SocketAddr};

    use super::*;

    #[test]
    fn bind_conflict_maps_to_transport_code() {
        let err = TransportError::Bind {
            addr: SocketAddr::from((Ipv4Addr::LOCALHOST, 28888)),
            source: io::Error::from(io::ErrorKind::AddrInUse),
        };
        let cli = ingest_error("serve failed", IngestError::Transport(err));
        assert_eq!(cli.code, TRANSPORT_ERROR);
        assert!(cli.message.contains("127.0.0.1:28888"));
    }

    #[test]
    fn refused_connect_is_plain_failure() {
        let err = TransportError::Connect {
            addr: SocketAddr::from((Ipv4Addr::LOCALHOST, 1)),
            source: io::Error::from(io::ErrorKind::ConnectionRefused),
        };
        assert_eq!(transport_error("connect failed", err).code, FAILURE);
    }

    #[test]
    fn sentinel_payload_is_invalid_data() {
        assert_eq!(
            frame_error("send failed", FrameError::ReservedSentinel).code,
            DATA_INVALID
        );
    }
}
