use std::io::{ErrorKind, Write};

use bytes::BytesMut;
use livelink_transport::LinkStream;

use crate::codec::{encode_frame, FrameConfig, FrameKind};
use crate::error::{transport_to_frame_error, FrameError, Result};
use crate::mode::FramingMode;

/// Producer side: writes payloads and stop requests to any `Write` stream.
pub struct PayloadWriter<T> {
    inner: T,
    mode: FramingMode,
    buf: BytesMut,
    config: FrameConfig,
}

impl<T: Write> PayloadWriter<T> {
    /// Create a writer with default configuration.
    pub fn new(inner: T, mode: FramingMode) -> Self {
        Self::with_config(inner, mode, FrameConfig::default())
    }

    /// Create a writer with explicit configuration.
    pub fn with_config(inner: T, mode: FramingMode, config: FrameConfig) -> Self {
        Self {
            inner,
            mode,
            buf: BytesMut::new(),
            config,
        }
    }

    /// Send one payload.
    ///
    /// In legacy mode the bytes go out raw and the payload only completes
    /// once the connection is closed, so one payload per connection.
    pub fn send_payload(&mut self, payload: &[u8]) -> Result<()> {
        match self.mode {
            FramingMode::Legacy => {
                if payload == self.config.sentinel.as_ref() {
                    return Err(FrameError::ReservedSentinel);
                }
                self.write_all(payload)
            }
            FramingMode::LengthPrefixed => {
                if payload.len() > self.config.max_payload_size {
                    return Err(FrameError::PayloadTooLarge {
                        size: payload.len(),
                        max: self.config.max_payload_size,
                    });
                }
                self.buf.clear();
                encode_frame(FrameKind::Payload, payload, &mut self.buf)?;
                let frame = self.buf.split();
                self.write_all(&frame)
            }
        }
    }

    /// Ask the listener to stop.
    pub fn send_stop(&mut self) -> Result<()> {
        match self.mode {
            FramingMode::Legacy => {
                let sentinel = self.config.sentinel.clone();
                self.write_all(&sentinel)
            }
            FramingMode::LengthPrefixed => {
                self.buf.clear();
                encode_frame(FrameKind::Stop, &[], &mut self.buf)?;
                let frame = self.buf.split();
                self.write_all(&frame)
            }
        }
    }

    fn write_all(&mut self, bytes: &[u8]) -> Result<()> {
        let mut offset = 0usize;
        while offset < bytes.len() {
            match self.inner.write(&bytes[offset..]) {
                Ok(0) => return Err(FrameError::ConnectionClosed),
                Ok(n) => offset += n,
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => return Err(FrameError::Io(err)),
            }
        }
        self.flush()
    }

    /// Flush the underlying stream.
    pub fn flush(&mut self) -> Result<()> {
        loop {
            match self.inner.flush() {
                Ok(()) => return Ok(()),
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => return Err(FrameError::Io(err)),
            }
        }
    }

    /// Framing mode of this writer.
    pub fn mode(&self) -> FramingMode {
        self.mode
    }

    /// Consume the writer and return the inner stream.
    pub fn into_inner(self) -> T {
        self.inner
    }
}

impl PayloadWriter<LinkStream> {
    /// Create a writer for a `LinkStream` and apply the write timeout from config.
    pub fn with_config_link(
        inner: LinkStream,
        mode: FramingMode,
        config: FrameConfig,
    ) -> Result<Self> {
        inner
            .set_write_timeout(config.write_timeout)
            .map_err(transport_to_frame_error)?;
        Ok(Self::with_config(inner, mode, config))
    }

    /// Flush and close the write half, completing a legacy payload.
    pub fn finish(mut self) -> Result<()> {
        self.flush()?;
        self.inner.finish().map_err(transport_to_frame_error)
    }
}

#[cfg(test)]
mod tests {
    use bytes::Bytes;

    use super::*;
    use crate::codec::{decode_frame, DEFAULT_MAX_PAYLOAD, HEADER_SIZE};
    use crate::reader::{SessionEvent, SessionReader};

    #[test]
    fn legacy_payload_is_raw() {
        let mut writer = PayloadWriter::new(Vec::new(), FramingMode::Legacy);
        writer.send_payload(br#"{"a":1}"#).unwrap();
        assert_eq!(writer.into_inner(), br#"{"a":1}"#);
    }

    #[test]
    fn legacy_stop_is_sentinel() {
        let mut writer = PayloadWriter::new(Vec::new(), FramingMode::Legacy);
        writer.send_stop().unwrap();
        assert_eq!(writer.into_inner(), b"Bye Megascans");
    }

    #[test]
    fn legacy_rejects_sentinel_payload() {
        let mut writer = PayloadWriter::new(Vec::new(), FramingMode::Legacy);
        let err = writer.send_payload(b"Bye Megascans").unwrap_err();
        assert!(matches!(err, FrameError::ReservedSentinel));
        assert!(writer.into_inner().is_empty());
    }

    #[test]
    fn prefixed_payload_and_stop() {
        let mut writer = PayloadWriter::new(Vec::new(), FramingMode::LengthPrefixed);
        writer.send_payload(b"Bye Megascans").unwrap();
        writer.send_stop().unwrap();

        let wire = writer.into_inner();
        assert_eq!(wire.len(), 2 * HEADER_SIZE + 13);

        let mut buf = BytesMut::from(&wire[..]);
        let first = decode_frame(&mut buf, DEFAULT_MAX_PAYLOAD).unwrap().unwrap();
        assert_eq!(first.kind, FrameKind::Payload);
        let second = decode_frame(&mut buf, DEFAULT_MAX_PAYLOAD).unwrap().unwrap();
        assert_eq!(second.kind, FrameKind::Stop);
    }

    #[test]
    fn prefixed_rejects_oversized_payload() {
        let config = FrameConfig {
            max_payload_size: 4,
            ..FrameConfig::default()
        };
        let mut writer = PayloadWriter::with_config(Vec::new(), FramingMode::LengthPrefixed, config);
        let err = writer.send_payload(b"too long").unwrap_err();
        assert!(matches!(err, FrameError::PayloadTooLarge { size: 8, max: 4 }));
    }

    #[test]
    fn short_writes_are_completed() {
        let mut writer = PayloadWriter::new(OneByteWriter::default(), FramingMode::Legacy);
        writer.send_payload(b"chunked").unwrap();
        assert_eq!(writer.into_inner().written, b"chunked");
    }

    #[derive(Default)]
    struct OneByteWriter {
        written: Vec<u8>,
    }

    impl Write for OneByteWriter {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            match buf.first() {
                Some(b) => {
                    self.written.push(*b);
                    Ok(1)
                }
                None => Ok(0),
            }
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn roundtrip_over_tcp() {
        use std::net::{Ipv4Addr, SocketAddr};

        let listener =
            livelink_transport::TcpEndpoint::bind(SocketAddr::from((Ipv4Addr::LOCALHOST, 0)))
                .unwrap();
        let addr = listener.local_addr();

        let server = std::thread::spawn(move || {
            let stream = listener.accept().unwrap();
            let mut reader = SessionReader::new(stream, FramingMode::Legacy);
            reader.next_event().unwrap()
        });

        let stream = livelink_transport::TcpEndpoint::connect(addr).unwrap();
        let mut writer =
            PayloadWriter::with_config_link(stream, FramingMode::Legacy, FrameConfig::default())
                .unwrap();
        writer.send_payload(br#"[{"id":"x"}]"#).unwrap();
        writer.finish().unwrap();

        assert_eq!(
            server.join().unwrap(),
            SessionEvent::Payload(Bytes::from_static(br#"[{"id":"x"}]"#))
        );
    }
}
