use thiserror::Error;

/// Everything that can stop an extraction
#[derive(Error, Debug)]
pub enum GmaError {
    /// Not a GMAD archive, or its metadata is malformed
    #[error("Invalid GMAD archive: {0}")]
    InvalidFormat(String),

    #[error("Archive contains no files")]
    EmptyTable,

    /// The stream ended before a declared length was satisfied
    #[error("Archive is truncated: {0}")]
    Truncated(String),

    #[error("Extraction was cancelled")]
    Cancelled,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

// Convenient crate-wide result type
pub type Result<T> = std::result::Result<T, GmaError>;
