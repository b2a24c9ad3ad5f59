use bytes::{Bytes, BytesMut};

/// Reserved stop token of the legacy protocol.
pub const DEFAULT_SENTINEL: &[u8] = b"Bye Megascans";

/// Outcome of feeding one chunk to a [`FrameAccumulator`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FrameResult {
    /// More bytes are needed.
    Continue,
    /// The chunk was the sentinel token: the listener must stop.
    SentinelStop,
    /// The peer closed the connection; this is the whole payload.
    FrameComplete(Bytes),
}

/// Legacy close-delimited framing state machine. Performs no I/O.
///
/// Each non-empty chunk is either the sentinel (exact byte match, in any
/// position) or payload data. A zero-length chunk means the peer closed the
/// connection and completes the frame, even if nothing was ever received.
#[derive(Debug)]
pub struct FrameAccumulator {
    sentinel: Bytes,
    buf: BytesMut,
    chunks: usize,
}

impl Default for FrameAccumulator {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameAccumulator {
    /// Accumulator matching [`DEFAULT_SENTINEL`].
    pub fn new() -> Self {
        Self::with_sentinel(Bytes::from_static(DEFAULT_SENTINEL))
    }

    /// Accumulator matching a custom sentinel.
    ///
    /// An empty sentinel never matches: a zero-length chunk always means
    /// end of stream.
    pub fn with_sentinel(sentinel: impl Into<Bytes>) -> Self {
        Self {
            sentinel: sentinel.into(),
            buf: BytesMut::new(),
            chunks: 0,
        }
    }

    /// Feed the next chunk read from the connection.
    pub fn feed(&mut self, chunk: &[u8]) -> FrameResult {
        if chunk.is_empty() {
            self.chunks = 0;
            return FrameResult::FrameComplete(self.buf.split().freeze());
        }

        if chunk == self.sentinel.as_ref() {
            tracing::debug!(
                discarded = self.buf.len(),
                first_chunk = self.chunks == 0,
                "sentinel received"
            );
            self.buf.clear();
            self.chunks = 0;
            return FrameResult::SentinelStop;
        }

        self.buf.extend_from_slice(chunk);
        self.chunks += 1;
        FrameResult::Continue
    }

    /// Bytes accumulated so far.
    pub fn buffered_len(&self) -> usize {
        self.buf.len()
    }

    /// Data chunks accepted since the last completed frame.
    pub fn chunks_seen(&self) -> usize {
        self.chunks
    }

    /// The sentinel this accumulator matches.
    pub fn sentinel(&self) -> &[u8] {
        &self.sentinel
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chunks_concatenate_into_frame() {
        let mut acc = FrameAccumulator::new();
        assert_eq!(acc.feed(b"part1"), FrameResult::Continue);
        assert_eq!(acc.feed(b"part2"), FrameResult::Continue);
        assert_eq!(acc.feed(b"-tail"), FrameResult::Continue);
        assert_eq!(acc.chunks_seen(), 3);

        assert_eq!(
            acc.feed(b""),
            FrameResult::FrameComplete(Bytes::from_static(b"part1part2-tail"))
        );
    }

    #[test]
    fn many_small_chunks() {
        let payload: Vec<u8> = (0..4096u32).map(|i| (i % 251) as u8).collect();
        let mut acc = FrameAccumulator::new();
        for chunk in payload.chunks(7) {
            assert_eq!(acc.feed(chunk), FrameResult::Continue);
        }
        assert_eq!(acc.buffered_len(), payload.len());
        assert_eq!(acc.feed(&[]), FrameResult::FrameComplete(Bytes::from(payload)));
    }

    #[test]
    fn sentinel_as_first_chunk_stops() {
        let mut acc = FrameAccumulator::new();
        assert_eq!(acc.feed(b"Bye Megascans"), FrameResult::SentinelStop);
        assert_eq!(acc.buffered_len(), 0);
    }

    #[test]
    fn sentinel_after_data_discards_buffer() {
        let mut acc = FrameAccumulator::new();
        assert_eq!(acc.feed(br#"[{"id":"#), FrameResult::Continue);
        assert_eq!(acc.feed(b"Bye Megascans"), FrameResult::SentinelStop);
        assert_eq!(acc.buffered_len(), 0);

        // Nothing from before the sentinel leaks into a later frame.
        assert_eq!(acc.feed(b""), FrameResult::FrameComplete(Bytes::new()));
    }

    #[test]
    fn sentinel_must_match_exactly() {
        let mut acc = FrameAccumulator::new();
        assert_eq!(acc.feed(b"Bye Megascans\n"), FrameResult::Continue);
        assert_eq!(acc.feed(b"Bye"), FrameResult::Continue);
        assert_eq!(
            acc.feed(b""),
            FrameResult::FrameComplete(Bytes::from_static(b"Bye Megascans\nBye"))
        );
    }

    #[test]
    fn empty_session_completes_with_empty_frame() {
        let mut acc = FrameAccumulator::new();
        assert_eq!(acc.feed(b""), FrameResult::FrameComplete(Bytes::new()));
    }

    #[test]
    fn accumulator_is_reusable_after_completion() {
        let mut acc = FrameAccumulator::new();
        acc.feed(b"one");
        assert_eq!(
            acc.feed(b""),
            FrameResult::FrameComplete(Bytes::from_static(b"one"))
        );
        acc.feed(b"two");
        assert_eq!(
            acc.feed(b""),
            FrameResult::FrameComplete(Bytes::from_static(b"two"))
        );
    }

    #[test]
    fn custom_sentinel() {
        let mut acc = FrameAccumulator::with_sentinel(Bytes::from_static(b"STOP"));
        assert_eq!(acc.sentinel(), b"STOP");
        assert_eq!(acc.feed(b"Bye Megascans"), FrameResult::Continue);
        assert_eq!(acc.feed(b"STOP"), FrameResult::SentinelStop);
    }

    #[test]
    fn empty_sentinel_never_matches() {
        let mut acc = FrameAccumulator::with_sentinel(Bytes::new());
        assert_eq!(acc.feed(b"x"), FrameResult::Continue);
        assert_eq!(
            acc.feed(b""),
            FrameResult::FrameComplete(Bytes::from_static(b"x"))
        );
    }
}
