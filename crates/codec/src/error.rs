//! Error types for codec resolution and execution.

use std::fmt;
use thiserror::Error;

/// Which table a lookup was made against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Load,
    Save,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operation::Load => f.write_str("loading"),
            Operation::Save => f.write_str("saving"),
        }
    }
}

/// Errors raised while resolving a codec or running one.
#[derive(Debug, Error)]
pub enum CodecError {
    /// No binding exists for the extension in the relevant table.
    #[error("Extension '{extension}' is not supported for {operation}. Register a codec for it with `CodecRegistry::with_loader` or `CodecRegistry::with_saver`")]
    UnsupportedFormat {
        extension: String,
        operation: Operation,
    },

    /// The extension is known but its codec family was compiled out.
    #[error("Extension '{extension}' needs the optional `{feature}` codecs. Rebuild with `--features {feature}`")]
    MissingDependency {
        extension: String,
        feature: &'static str,
    },

    /// The encoder was handed an object of the wrong kind.
    #[error("Expected a {expected} payload, got {found}")]
    PayloadMismatch {
        expected: &'static str,
        found: &'static str,
    },

    /// A codec option could not be interpreted.
    #[error("Invalid value '{value}' for codec option '{key}'")]
    InvalidOption { key: String, value: String },

    /// Structurally valid container missing something the codec needs.
    #[error("Malformed content: {0}")]
    Malformed(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Failure reported by the underlying format library, unchanged.
    #[error(transparent)]
    Library(Box<dyn std::error::Error + Send + Sync>),
}

impl CodecError {
    /// Pass a format library's error through as-is
    pub fn library(error: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Library(Box::new(error))
    }

    pub fn invalid_option(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self::InvalidOption {
            key: key.into(),
            value: value.into(),
        }
    }
}

/// Result type for codec operations.
pub type Result<T> = std::result::Result<T, CodecError>;
