//! Error taxonomy shared by every store backend
//!
//! Validation failures (`InvalidKey`, `UnsupportedValue`) are raised before
//! any I/O happens. I/O failures carry the underlying `std::io::Error` so the
//! OS error code and message reach the caller untouched.

use std::fmt::Display;
use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Result type alias for store operations
pub type Result<T> = std::result::Result<T, StoreError>;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Invalid key: {0}")]
    InvalidKey(String),

    #[error("Unsupported value: {0}")]
    UnsupportedValue(String),

    #[error("Serialization failed: {0}")]
    SerializationFailed(String),

    #[error("Failed to read store {}: {source}", .path.display())]
    ReadFailed {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to write store {}: {source}", .path.display())]
    WriteFailed {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Store document {} is corrupt: {reason}", .path.display())]
    Corrupt { path: PathBuf, reason: String },
}

impl StoreError {
    pub(crate) fn read(path: impl Into<PathBuf>, source: io::Error) -> Self {
        StoreError::ReadFailed {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn write(path: impl Into<PathBuf>, source: io::Error) -> Self {
        StoreError::WriteFailed {
            path: path.into(),
            source,
        }
    }

    /// Returns true for errors caused by the arguments rather than the
    /// environment. Retrying these can never succeed.
    pub fn is_caller_error(&self) -> bool {
        matches!(
            self,
            StoreError::InvalidKey(_) | StoreError::UnsupportedValue(_)
        )
    }

    /// Returns the underlying I/O error, if any
    pub fn io_error(&self) -> Option<&io::Error> {
        match self {
            StoreError::ReadFailed { source, .. } | StoreError::WriteFailed { source, .. } => {
                Some(source)
            }
            _ => None,
        }
    }
}

impl serde::ser::Error for StoreError {
    fn custom<T: Display>(msg: T) -> Self {
        StoreError::SerializationFailed(msg.to_string())
    }
}
