//! Payload framing for LiveLink asset ingestion.
//!
//! Two wire formats are supported:
//! - **Legacy**: the payload is the raw byte stream of one connection and ends
//!   when the producer closes it. A chunk equal to the sentinel token
//!   (`"Bye Megascans"`) means "stop listening" instead.
//! - **Length-prefixed**: every frame carries a 2-byte magic, a 4-byte
//!   little-endian length and a 2-byte kind, so stop requests can never be
//!   confused with payload bytes.
//!
//! [`FrameAccumulator`] is the pure legacy state machine, [`SessionReader`]
//! drives either format from a stream, and [`PayloadWriter`] is the producer
//! side.

pub mod accumulator;
pub mod codec;
pub mod error;
pub mod mode;
pub mod reader;
pub mod writer;

pub use accumulator::{FrameAccumulator, FrameResult, DEFAULT_SENTINEL};
pub use codec::{
    decode_frame, encode_frame, Frame, FrameConfig, FrameKind, DEFAULT_MAX_PAYLOAD, HEADER_SIZE,
    READ_CHUNK_SIZE,
};
pub use error::{FrameError, Result};
pub use mode::FramingMode;
pub use reader::{SessionEvent, SessionReader};
pub use writer::PayloadWriter;
