use std::io::{ErrorKind, Read};

use bytes::{Bytes, BytesMut};
use livelink_transport::LinkStream;

use crate::accumulator::{FrameAccumulator, FrameResult};
use crate::codec::{decode_frame, FrameConfig, FrameKind};
use crate::error::{transport_to_frame_error, FrameError, Result};
use crate::mode::FramingMode;

/// What the next step of a session produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    /// A complete payload.
    Payload(Bytes),
    /// The producer asked the listener to stop.
    Stop,
    /// The session ended cleanly with nothing more to deliver.
    Closed,
}

/// Reads session events from any `Read` stream in either framing mode.
///
/// Partial reads are handled internally. A read error (including a read
/// timeout) leaves the internal state intact, so calling
/// [`next_event`](Self::next_event) again resumes where it stopped.
pub struct SessionReader<T> {
    inner: T,
    mode: FramingMode,
    accumulator: FrameAccumulator,
    buf: BytesMut,
    chunk: Vec<u8>,
    config: FrameConfig,
    finished: bool,
}

impl<T: Read> SessionReader<T> {
    /// Create a reader with default configuration.
    pub fn new(inner: T, mode: FramingMode) -> Self {
        Self::with_config(inner, mode, FrameConfig::default())
    }

    /// Create a reader with explicit configuration.
    pub fn with_config(inner: T, mode: FramingMode, config: FrameConfig) -> Self {
        Self {
            inner,
            mode,
            accumulator: FrameAccumulator::with_sentinel(config.sentinel.clone()),
            buf: BytesMut::new(),
            chunk: vec![0u8; config.read_chunk_size.max(1)],
            config,
            finished: false,
        }
    }

    /// Read until the next session event (blocking).
    pub fn next_event(&mut self) -> Result<SessionEvent> {
        loop {
            if let Some(event) = self.poll_event()? {
                return Ok(event);
            }
        }
    }

    /// Perform at most one read and report the event it completed, if any.
    ///
    /// `Ok(None)` means bytes arrived but no event is complete yet, which
    /// gives callers a point to check for cancellation between chunks.
    pub fn poll_event(&mut self) -> Result<Option<SessionEvent>> {
        if self.finished {
            return Ok(Some(SessionEvent::Closed));
        }
        match self.mode {
            FramingMode::Legacy => self.poll_legacy(),
            FramingMode::LengthPrefixed => self.poll_prefixed(),
        }
    }

    fn poll_legacy(&mut self) -> Result<Option<SessionEvent>> {
        let read = self.read_chunk()?;
        match self.accumulator.feed(&self.chunk[..read]) {
            FrameResult::Continue => Ok(None),
            FrameResult::SentinelStop => {
                self.finished = true;
                Ok(Some(SessionEvent::Stop))
            }
            FrameResult::FrameComplete(payload) => {
                self.finished = true;
                Ok(Some(SessionEvent::Payload(payload)))
            }
        }
    }

    fn poll_prefixed(&mut self) -> Result<Option<SessionEvent>> {
        if let Some(event) = self.decode_buffered()? {
            return Ok(Some(event));
        }

        let read = self.read_chunk()?;
        if read == 0 {
            self.finished = true;
            if self.buf.is_empty() {
                return Ok(Some(SessionEvent::Closed));
            }
            return Err(FrameError::ConnectionClosed);
        }

        self.buf.extend_from_slice(&self.chunk[..read]);
        self.decode_buffered()
    }

    fn decode_buffered(&mut self) -> Result<Option<SessionEvent>> {
        let Some(frame) = decode_frame(&mut self.buf, self.config.max_payload_size)? else {
            return Ok(None);
        };
        Ok(Some(match frame.kind {
            FrameKind::Payload => SessionEvent::Payload(frame.payload),
            FrameKind::Stop => {
                self.finished = true;
                SessionEvent::Stop
            }
        }))
    }

    fn read_chunk(&mut self) -> Result<usize> {
        loop {
            match self.inner.read(&mut self.chunk) {
                Ok(n) => return Ok(n),
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => return Err(FrameError::Io(err)),
            }
        }
    }

    /// Bytes received but not yet delivered.
    pub fn pending_len(&self) -> usize {
        match self.mode {
            FramingMode::Legacy => self.accumulator.buffered_len(),
            FramingMode::LengthPrefixed => self.buf.len(),
        }
    }

    /// Framing mode of this reader.
    pub fn mode(&self) -> FramingMode {
        self.mode
    }

    /// Borrow the underlying stream.
    pub fn get_ref(&self) -> &T {
        &self.inner
    }

    /// Consume the reader and return the inner stream.
    pub fn into_inner(self) -> T {
        self.inner
    }
}

impl SessionReader<LinkStream> {
    /// Create a reader for a `LinkStream` and apply the read timeout from config.
    pub fn with_config_link(
        inner: LinkStream,
        mode: FramingMode,
        config: FrameConfig,
    ) -> Result<Self> {
        inner
            .set_read_timeout(config.read_timeout)
            .map_err(transport_to_frame_error)?;
        Ok(Self::with_config(inner, mode, config))
    }
}
