//! Error types for storage backends.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while resolving or accessing storage.
#[derive(Debug, Error)]
pub enum StorageError {
    /// The base address plus path could not be split into bucket and key.
    #[error("Invalid remote address '{address}': {reason}")]
    Addressing { address: String, reason: String },

    /// Local filesystem failure.
    #[error("I/O error at '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Remote object store request failure.
    #[error("Remote request failed for {address}: {message}")]
    Remote { address: String, message: String },

    /// The requested remote object does not exist.
    #[error("Object not found: {0}")]
    NotFound(String),

    /// The backend cannot store files of this format.
    #[error("Saving '.{extension}' files is not supported on {backend}: {reason}")]
    SaveUnsupported {
        extension: String,
        backend: &'static str,
        reason: &'static str,
    },

    /// The private I/O runtime for the remote client could not start.
    #[error("Failed to start remote I/O runtime: {0}")]
    Runtime(#[source] std::io::Error),
}

impl StorageError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub fn addressing(address: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Addressing {
            address: address.into(),
            reason: reason.into(),
        }
    }
}

/// Result type for storage operations.
pub type Result<T> = std::result::Result<T, StorageError>;
