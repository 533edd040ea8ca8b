//! Unified error type for the facade.

use easy_env_codec::CodecError;
use easy_env_file::StorageError;
use thiserror::Error;

/// Every failure a `load` or `save` can report.
///
/// Format and addressing problems are normalised into their own variants;
/// everything else from a codec or backend is passed through unchanged.
#[derive(Debug, Error)]
pub enum Error {
    /// No codec for the extension, or the backend cannot store the format.
    #[error("Unsupported format '.{extension}': {reason}")]
    UnsupportedFormat { extension: String, reason: String },

    /// The extension's codec family was not compiled in.
    #[error("Extension '.{extension}' needs the optional `{feature}` codecs. Rebuild easy-env with `--features {feature}`")]
    MissingDependency {
        extension: String,
        feature: &'static str,
    },

    /// The base address plus path does not split into bucket and key.
    #[error("Invalid address '{address}': {reason}")]
    BackendAddressing { address: String, reason: String },

    /// Failure raised by the format library.
    #[error(transparent)]
    Codec(CodecError),

    #[error(transparent)]
    Storage(StorageError),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl From<CodecError> for Error {
    fn from(error: CodecError) -> Self {
        match error {
            CodecError::UnsupportedFormat {
                extension,
                operation,
            } => Error::UnsupportedFormat {
                reason: format!("no codec is registered for {operation} '.{extension}' files"),
                extension,
            },
            CodecError::MissingDependency { extension, feature } => {
                Error::MissingDependency { extension, feature }
            }
            other => Error::Codec(other),
        }
    }
}

impl From<StorageError> for Error {
    fn from(error: StorageError) -> Self {
        match error {
            StorageError::Addressing { address, reason } => {
                Error::BackendAddressing { address, reason }
            }
            StorageError::SaveUnsupported {
                extension,
                backend,
                reason,
            } => Error::UnsupportedFormat {
                extension,
                reason: format!("{backend} cannot store it ({reason})"),
            },
            other => Error::Storage(other),
        }
    }
}

impl Error {
    /// True for `UnsupportedFormat`, whichever layer raised it
    pub fn is_unsupported_format(&self) -> bool {
        matches!(self, Error::UnsupportedFormat { .. })
    }
}

/// Result type for facade operations.
pub type Result<T> = std::result::Result<T, Error>;
