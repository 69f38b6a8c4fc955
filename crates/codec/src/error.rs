use thiserror::Error;

/// Error type for codec operations.
#[derive(Debug, Error)]
pub enum CodecError {
    #[error("Encoding error: {0}")]
    Encode(String),
    #[error("Decoding error: {0}")]
    Decode(String),
    #[error("Unsupported document: expected format '{expected}', found '{found}'")]
    Format { expected: String, found: String },
    #[error("Unsupported document version {found} (newest supported is {supported})")]
    Version { found: u64, supported: u64 },
    #[error("Invalid state word '{0}'")]
    Word(String),
}

impl From<serde_json::Error> for CodecError {
    fn from(e: serde_json::Error) -> Self {
        Self::Decode(format!("JSON error: {e}"))
    }
}
