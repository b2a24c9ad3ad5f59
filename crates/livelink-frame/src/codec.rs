use bytes::{Buf, BufMut, Bytes, BytesMut};

use crate::accumulator::DEFAULT_SENTINEL;
use crate::error::{FrameError, Result};

/// Frame header: magic (2) + length (4) + kind (2) = 8 bytes.
pub const HEADER_SIZE: usize = 8;

/// Magic bytes: "ML" (0x4D 0x4C).
pub const MAGIC: [u8; 2] = [0x4D, 0x4C];

/// Default maximum payload size for length-prefixed frames: 64 MiB.
pub const DEFAULT_MAX_PAYLOAD: usize = 64 * 1024 * 1024;

/// Bytes requested from the socket per read.
pub const READ_CHUNK_SIZE: usize = 8 * 1024;

/// What a length-prefixed frame carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameKind {
    /// A complete asset payload.
    Payload,
    /// Request to stop the listener. Carries no payload.
    Stop,
}

impl FrameKind {
    /// Wire code of this kind.
    pub const fn code(self) -> u16 {
        match self {
            FrameKind::Payload => 1,
            FrameKind::Stop => 2,
        }
    }

    /// Kind for a wire code, if known.
    pub fn from_code(code: u16) -> Option<Self> {
        match code {
            1 => Some(FrameKind::Payload),
            2 => Some(FrameKind::Stop),
            _ => None,
        }
    }
}

/// A decoded length-prefixed frame.
#[derive(Debug, Clone)]
pub struct Frame {
    /// What the frame means.
    pub kind: FrameKind,
    /// The frame payload (empty for STOP).
    pub payload: Bytes,
}

impl Frame {
    /// Create a payload frame.
    pub fn payload(payload: impl Into<Bytes>) -> Self {
        Self {
            kind: FrameKind::Payload,
            payload: payload.into(),
        }
    }

    /// Create a stop frame.
    pub fn stop() -> Self {
        Self {
            kind: FrameKind::Stop,
            payload: Bytes::new(),
        }
    }

    /// The total wire size of this frame (header + payload).
    pub fn wire_size(&self) -> usize {
        HEADER_SIZE + self.payload.len()
    }
}

/// Append one length-prefixed frame to `dst`.
///
/// Layout, all integers little-endian:
///
/// | offset | size | field                  |
/// |--------|------|------------------------|
/// | 0      | 2    | `"ML"`                 |
/// | 2      | 4    | payload length         |
/// | 6      | 2    | [`FrameKind`] code     |
/// | 8      | n    | payload                |
pub fn encode_frame(kind: FrameKind, payload: &[u8], dst: &mut BytesMut) -> Result<()> {
    let len = u32::try_from(payload.len()).map_err(|_| FrameError::PayloadTooLarge {
        size: payload.len(),
        max: u32::MAX as usize,
    })?;
    dst.reserve(HEADER_SIZE + payload.len());
    dst.put_slice(&MAGIC);
    dst.put_u32_le(len);
    dst.put_u16_le(kind.code());
    dst.put_slice(payload);
    Ok(())
}

/// Split the next complete frame off the front of `src`.
///
/// Header errors surface as soon as the 8 header bytes are buffered, before
/// the payload arrives. `Ok(None)` leaves `src` untouched.
pub fn decode_frame(src: &mut BytesMut, max_payload: usize) -> Result<Option<Frame>> {
    let Some(mut header) = src.get(..HEADER_SIZE) else {
        return Ok(None);
    };

    if header.get_u16() != u16::from_be_bytes(MAGIC) {
        return Err(FrameError::InvalidMagic);
    }
    let payload_len = header.get_u32_le() as usize;
    let code = header.get_u16_le();
    let kind = FrameKind::from_code(code).ok_or(FrameError::UnknownKind(code))?;

    if payload_len > max_payload {
        return Err(FrameError::PayloadTooLarge {
            size: payload_len,
            max: max_payload,
        });
    }
    if src.len() < HEADER_SIZE + payload_len {
        return Ok(None);
    }

    src.advance(HEADER_SIZE);
    Ok(Some(Frame {
        kind,
        payload: src.split_to(payload_len).freeze(),
    }))
}

/// Configuration shared by session readers and payload writers.
#[derive(Debug, Clone)]
pub struct FrameConfig {
    /// Maximum length-prefixed payload size in bytes. Default: 64 MiB.
    ///
    /// Legacy framing is unbounded and ignores this limit.
    pub max_payload_size: usize,
    /// Bytes requested per socket read. Default: 8 KiB.
    pub read_chunk_size: usize,
    /// Reserved stop token for legacy framing.
    pub sentinel: Bytes,
    /// Read timeout for blocking operations.
    pub read_timeout: Option<std::time::Duration>,
    /// Write timeout for blocking operations.
    pub write_timeout: Option<std::time::Duration>,
}

impl Default for FrameConfig {
    fn default() -> Self {
        Self {
            max_payload_size: DEFAULT_MAX_PAYLOAD,
            read_chunk_size: READ_CHUNK_SIZE,
            sentinel: Bytes::from_static(DEFAULT_SENTINEL),
            read_timeout: None,
            write_timeout: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decode(buf: &mut BytesMut) -> Result<Option<Frame>> {
        decode_frame(buf, DEFAULT_MAX_PAYLOAD)
    }

    #[test]
    fn asset_payload_survives_framing() {
        let payload = br#"[{"id":"abc"}]"#;
        let mut wire = BytesMut::new();
        encode_frame(FrameKind::Payload, payload, &mut wire).unwrap();
        assert_eq!(wire.len(), HEADER_SIZE + payload.len());
        assert_eq!(&wire[..2], b"ML");

        let frame = decode(&mut wire).unwrap().expect("complete frame");
        assert_eq!(frame.kind, FrameKind::Payload);
        assert_eq!(frame.payload.as_ref(), payload);
        assert!(wire.is_empty());
    }

    #[test]
    fn stop_is_a_bare_header() {
        let mut wire = BytesMut::new();
        encode_frame(FrameKind::Stop, b"", &mut wire).unwrap();
        assert_eq!(wire.as_ref(), &[0x4D, 0x4C, 0, 0, 0, 0, 2, 0]);

        let frame = decode(&mut wire).unwrap().expect("complete frame");
        assert_eq!(frame.kind, FrameKind::Stop);
        assert!(frame.payload.is_empty());
    }

    #[test]
    fn sentinel_text_is_ordinary_payload() {
        let mut wire = BytesMut::new();
        encode_frame(FrameKind::Payload, DEFAULT_SENTINEL, &mut wire).unwrap();

        let frame = decode(&mut wire).unwrap().expect("complete frame");
        assert_eq!(frame.kind, FrameKind::Payload);
        assert_eq!(frame.payload.as_ref(), DEFAULT_SENTINEL);
    }

    #[test]
    fn short_header_waits_without_consuming() {
        let mut wire = BytesMut::from(&[0x4D, 0x4C, 0x00][..]);
        assert!(decode(&mut wire).unwrap().is_none());
        assert_eq!(wire.len(), 3);
    }

    #[test]
    fn partial_payload_waits_for_more_bytes() {
        let mut wire = BytesMut::new();
        encode_frame(FrameKind::Payload, b"hello", &mut wire).unwrap();
        let rest = wire.split_off(HEADER_SIZE + 2);

        assert!(decode(&mut wire).unwrap().is_none());
        wire.unsplit(rest);
        assert_eq!(decode(&mut wire).unwrap().unwrap().payload.as_ref(), b"hello");
    }

    #[test]
    fn legacy_bytes_fail_the_magic_check() {
        let mut wire = BytesMut::from(&b"Bye Megascans"[..]);
        assert!(matches!(decode(&mut wire), Err(FrameError::InvalidMagic)));
    }

    #[test]
    fn unknown_kind_code_is_rejected() {
        let mut wire = BytesMut::new();
        wire.put_slice(&MAGIC);
        wire.put_u32_le(0);
        wire.put_u16_le(99);

        assert!(matches!(decode(&mut wire), Err(FrameError::UnknownKind(99))));
    }

    #[test]
    fn oversized_length_rejected_before_payload_arrives() {
        let mut wire = BytesMut::new();
        wire.put_slice(&MAGIC);
        wire.put_u32_le(1024);
        wire.put_u16_le(FrameKind::Payload.code());

        assert!(matches!(
            decode_frame(&mut wire, 16),
            Err(FrameError::PayloadTooLarge { size: 1024, max: 16 })
        ));
    }

    #[test]
    fn payload_then_stop_share_a_buffer() {
        let mut wire = BytesMut::new();
        encode_frame(FrameKind::Payload, b"first", &mut wire).unwrap();
        encode_frame(FrameKind::Stop, b"", &mut wire).unwrap();

        let kinds: Vec<FrameKind> = std::iter::from_fn(|| decode(&mut wire).unwrap())
            .map(|frame| frame.kind)
            .collect();
        assert_eq!(kinds, [FrameKind::Payload, FrameKind::Stop]);
        assert!(wire.is_empty());
    }

    #[test]
    fn wire_size_counts_header() {
        assert_eq!(Frame::payload(Bytes::from_static(b"test")).wire_size(), HEADER_SIZE + 4);
        assert_eq!(Frame::stop().wire_size(), HEADER_SIZE);
    }
}
