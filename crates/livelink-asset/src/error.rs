/// Errors that can occur while decoding an asset payload.
#[derive(Debug, thiserror::Error)]
pub enum AssetError {
    /// The payload is empty.
    #[error("payload is empty")]
    Empty,

    /// The payload is not valid UTF-8 JSON of the expected shape.
    #[error("payload is not a valid asset array: {0}")]
    InvalidJson(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, AssetError>;
