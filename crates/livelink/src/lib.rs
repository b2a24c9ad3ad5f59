//! LiveLink asset ingestion.
//!
//! Receives asset payloads from an external asset browser over a loopback
//! socket and hands them to a host importer, one session at a time.
//!
//! # Crate Structure
//!
//! - [`transport`]: loopback TCP endpoint
//! - [`frame`]: legacy sentinel framing and length-prefixed framing
//! - [`asset`]: payload decoding and import plans
//! - [`ingest`]: listener, liveness monitor, mailbox, and controller

/// Re-export transport types.
pub mod transport {
    pub use livelink_transport::*;
}

/// Re-export frame types.
pub mod frame {
    pub use livelink_frame::*;
}

/// Re-export asset types.
pub mod asset {
    pub use livelink_asset::*;
}

/// Re-export ingestion types.
pub mod ingest {
    pub use livelink_ingest::*;
}
