use std::net::{Ipv4Addr, SocketAddr, SocketAddrV4, TcpListener, TcpStream};
use std::time::Duration;

use tracing::{debug, info};

use crate::error::{Result, TransportError};
use crate::stream::LinkStream;

/// Port the asset browser connects to.
pub const DEFAULT_PORT: u16 = 28888;

/// Default listening address: loopback only, fixed port.
pub const DEFAULT_ADDR: SocketAddr =
    SocketAddr::V4(SocketAddrV4::new(Ipv4Addr::LOCALHOST, DEFAULT_PORT));

/// Loopback TCP listening endpoint.
///
/// Owns the listening socket for as long as it lives; dropping the endpoint
/// closes the socket, after which connection attempts are refused.
pub struct TcpEndpoint {
    listener: TcpListener,
    addr: SocketAddr,
}

impl TcpEndpoint {
    /// Bind and listen on `addr`.
    ///
    /// There is no retry and no port search: an address already in use is a
    /// [`TransportError::Bind`].
    pub fn bind(addr: SocketAddr) -> Result<Self> {
        let listener =
            TcpListener::bind(addr).map_err(|e| TransportError::Bind { addr, source: e })?;
        // Resolves port 0 to the ephemeral port actually assigned.
        let addr = listener
            .local_addr()
            .map_err(|e| TransportError::Bind { addr, source: e })?;

        info!(%addr, "listening for asset producers");

        Ok(Self { listener, addr })
    }

    /// Accept an incoming connection (blocking).
    pub fn accept(&self) -> Result<LinkStream> {
        let (stream, peer) = self.listener.accept().map_err(TransportError::Accept)?;
        debug!(%peer, "accepted connection");
        Ok(LinkStream::from_tcp(stream))
    }

    /// Connect to a listening endpoint (blocking).
    pub fn connect(addr: SocketAddr) -> Result<LinkStream> {
        let stream =
            TcpStream::connect(addr).map_err(|e| TransportError::Connect { addr, source: e })?;
        debug!(%addr, "connected to listener");
        Ok(LinkStream::from_tcp(stream))
    }

    /// Connect with an upper bound on the connection handshake.
    pub fn connect_timeout(addr: SocketAddr, timeout: Duration) -> Result<LinkStream> {
        let stream = TcpStream::connect_timeout(&addr, timeout)
            .map_err(|e| TransportError::Connect { addr, source: e })?;
        debug!(%addr, "connected to listener");
        Ok(LinkStream::from_tcp(stream))
    }

    /// The address this endpoint is bound to.
    pub fn local_addr(&self) -> SocketAddr {
        self.addr
    }
}

impl Drop for TcpEndpoint {
    fn drop(&mut self) {
        debug!(addr = %self.addr, "closing listening socket");
    }
}

impl std::fmt::Debug for TcpEndpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TcpEndpoint")
            .field("addr", &self.addr)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{ErrorKind, Read, Write};

    fn loopback_any() -> SocketAddr {
        SocketAddr::from((Ipv4Addr::LOCALHOST, 0))
    }

    #[test]
    fn test_bind_accept_connect() {
        let listener = TcpEndpoint::bind(loopback_any()).unwrap();
        let addr = listener.local_addr();
        assert_ne!(addr.port(), 0);

        let handle = std::thread::spawn(move || {
            let mut client = TcpEndpoint::connect(addr).unwrap();
            client.write_all(b"hello").unwrap();
            client.finish().unwrap();
        });

        let mut server = listener.accept().unwrap();
        let mut buf = Vec::new();
        server.read_to_end(&mut buf).unwrap();
        assert_eq!(buf, b"hello");

        handle.join().unwrap();
    }

    #[test]
    fn test_bind_address_in_use() {
        let first = TcpEndpoint::bind(loopback_any()).unwrap();
        let result = TcpEndpoint::bind(first.local_addr());
        match result {
            Err(TransportError::Bind { addr, source }) => {
                assert_eq!(addr, first.local_addr());
                assert_eq!(source.kind(), ErrorKind::AddrInUse);
            }
            other => panic!("expected bind failure, got {other:?}"),
        }
    }

    #[test]
    fn test_connect_after_drop_is_refused() {
        let listener = TcpEndpoint::bind(loopback_any()).unwrap();
        let addr = listener.local_addr();
        drop(listener);

        let err = TcpEndpoint::connect(addr).unwrap_err();
        assert!(matches!(err, TransportError::Connect { .. }));
        assert_eq!(err.io_error().kind(), ErrorKind::ConnectionRefused);
    }

    #[test]
    fn test_default_addr_is_loopback() {
        assert!(DEFAULT_ADDR.ip().is_loopback());
        assert_eq!(DEFAULT_ADDR.port(), 28888);
    }
}
