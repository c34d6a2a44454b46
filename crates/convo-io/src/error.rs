//! Error types for I/O operations.

use std::io;

use convo_core::CoreError;
use thiserror::Error;

/// I/O operation error.
#[derive(Debug, Error)]
pub enum IoError {
    /// File I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Unsupported format.
    #[error("unsupported format: {0}")]
    UnsupportedFormat(String),

    /// Decoding error.
    #[error("decode error: {0}")]
    DecodeError(String),

    /// Encoding error.
    #[error("encode error: {0}")]
    EncodeError(String),

    /// Decoded pixels do not form a valid buffer.
    #[error(transparent)]
    Core(#[from] CoreError),
}

/// Result type for I/O operations.
pub type IoResult<T> = Result<T, IoError>;
