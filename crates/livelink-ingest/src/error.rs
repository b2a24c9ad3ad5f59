use std::fmt;

/// Errors that can occur while starting or running the ingestion server.
#[derive(Debug, thiserror::Error)]
pub enum IngestError {
    /// Transport-level error (bind failures land here).
    #[error("transport error: {0}")]
    Transport(#[from] livelink_transport::TransportError),

    /// Frame-level error.
    #[error("frame error: {0}")]
    Frame(#[from] livelink_frame::FrameError),

    /// A worker thread could not be started.
    #[error("failed to spawn {name} thread: {source}")]
    Spawn {
        name: &'static str,
        source: std::io::Error,
    },
}

/// Failure reported by a [`PayloadImporter`](crate::PayloadImporter).
#[derive(Debug, thiserror::Error)]
pub enum ImportError {
    /// The importer refused or failed to build the payload.
    #[error("import rejected payload: {0}")]
    Rejected(String),

    /// The importer panicked; the panic was contained.
    #[error("importer panicked: {0}")]
    Panicked(String),
}

impl ImportError {
    /// Wrap any displayable failure as a rejection.
    pub fn rejected(err: impl fmt::Display) -> Self {
        ImportError::Rejected(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, IngestError>;
