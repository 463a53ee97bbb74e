//! Error types for the blob module.

use thiserror::Error;

/// Errors that can occur while storing or reading blobs.
#[derive(Debug, Error)]
pub enum BlobError {
    /// Object does not exist.
    #[error("Object not found: {bucket}/{key}")]
    NotFound { bucket: String, key: String },

    /// The stream did not contain the declared number of bytes.
    #[error("Size mismatch for {key}: declared {expected} bytes, received {actual}")]
    SizeMismatch {
        key: String,
        expected: u64,
        actual: u64,
    },

    /// Bucket or key is not a plain name.
    #[error("Invalid object name: {0}")]
    InvalidKey(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
