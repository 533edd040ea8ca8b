//! Extension-keyed codec registry.
//!
//! A [`CodecRegistry`] maps a file extension to a [`Loader`] (decode function
//! plus read [`TransferMode`]) and a [`Saver`] (encode function plus write
//! mode). Built-in bindings cover these families:
//!
//! | Family | Extensions | Payload |
//! |---|---|---|
//! | tabular | csv, parquet, xlsx | [`Payload::Table`] (polars `DataFrame`) |
//! | structured | json, toml, yaml, yml, xml | [`Payload::Json`], [`Payload::Toml`], [`Payload::Yaml`], [`Payload::Xml`] |
//! | document | docx, pptx, pdf | [`Payload::Package`], [`Payload::Pdf`] |
//! | raster image | png, jpg | [`Payload::Image`] |
//! | plain text | txt, md, sql | [`Payload::Text`] |
//!
//! The tabular, image and document families sit behind cargo features of the
//! same names. With a feature disabled its extensions are still known, and
//! resolving them reports [`CodecError::MissingDependency`] with the feature to
//! enable.
//!
//! Callers add or replace bindings at construction time:
//!
//! ```ignore
//! use easy_env_codec::{CodecRegistry, Loader, Payload};
//! use std::io::Read;
//!
//! let registry = CodecRegistry::builtin().with_loader(
//!     "log",
//!     Loader::text(|reader, _options| {
//!         let mut text = String::new();
//!         reader.read_to_string(&mut text)?;
//!         Ok(Payload::Text(text.to_uppercase()))
//!     }),
//! );
//! ```

pub mod error;
mod formats;
pub mod mode;
pub mod options;
#[cfg(feature = "document")]
pub mod package;
pub mod payload;
pub mod registry;

pub use error::{CodecError, Operation, Result};
pub use mode::TransferMode;
pub use options::CodecOptions;
#[cfg(feature = "document")]
pub use package::{OfficePackage, PackagePart};
pub use payload::Payload;
pub use registry::{CodecRegistry, Loader, Saver};

// Libraries whose types appear in `Payload`
#[cfg(feature = "image")]
pub use image;
#[cfg(feature = "document")]
pub use lopdf;
#[cfg(feature = "tabular")]
pub use polars;
pub use serde_json;
pub use serde_yaml;
pub use toml;
pub use xmltree;

/// Lower-case an extension and strip one leading dot
pub fn normalize_extension(extension: &str) -> String {
    extension
        .strip_prefix('.')
        .unwrap_or(extension)
        .to_ascii_lowercase()
}

/// Extension of the last path segment, lower-cased and without the dot.
///
/// Returns an empty string when the final segment has no `.`.
pub fn extension_of(path: &str) -> String {
    let file_name = path.rsplit(|c| c == '/' || c == '\\').next().unwrap_or(path);
    match file_name.rsplit_once('.') {
        Some((_, extension)) => extension.to_ascii_lowercase(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extension_of() {
        assert_eq!(extension_of("data/file.csv"), "csv");
        assert_eq!(extension_of("Report.XLSX"), "xlsx");
        assert_eq!(extension_of("archive.tar.gz"), "gz");
        assert_eq!(extension_of("gs://bucket/dir.v1/notes.md"), "md");
    }

    #[test]
    fn test_extension_of_without_dot() {
        assert_eq!(extension_of("README"), "");
        assert_eq!(extension_of("dir.v1/README"), "");
    }

    #[test]
    fn test_normalize_extension() {
        assert_eq!(normalize_extension(".CSV"), "csv");
        assert_eq!(normalize_extension("yml"), "yml");
    }
}
