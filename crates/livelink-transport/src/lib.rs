//! Loopback TCP transport for LiveLink asset ingestion.
//!
//! Producers (the asset browser) connect to a fixed local port and stream a
//! payload; the add-on side listens. This is the lowest layer of the
//! workspace. Everything else builds on the [`TcpEndpoint`] listener and the
//! [`LinkStream`] it hands out.

pub mod error;
pub mod stream;
pub mod tcp;

pub use error::{Result, TransportError};
pub use stream::LinkStream;
pub use tcp::{TcpEndpoint, DEFAULT_ADDR, DEFAULT_PORT};
