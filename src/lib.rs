//! Load and save files of many formats, on local disk or in a remote object
//! store, through one pair of calls.
//!
//! The file extension picks the codec; the facade picks the backend:
//!
//! ```ignore
//! use easy_env::{Disk, Payload};
//! use easy_env::codec::serde_json::json;
//!
//! let disk = Disk::new("data");
//! disk.save(&Payload::from(json!({"a": 1})), "x.json")?;
//! let value: easy_env::codec::serde_json::Value = disk.load_as("x.json")?;
//! ```
//!
//! # Formats
//!
//! | Extensions | Payload |
//! |---|---|
//! | csv, parquet, xlsx | `Payload::Table` (polars `DataFrame`) |
//! | json | `Payload::Json` |
//! | toml | `Payload::Toml` |
//! | yaml, yml | `Payload::Yaml` |
//! | xml | `Payload::Xml` |
//! | docx, pptx | `Payload::Package` |
//! | pdf | `Payload::Pdf` |
//! | png, jpg | `Payload::Image` |
//! | txt, md, sql | `Payload::Text` |
//!
//! The tabular, image and document families are cargo features, all enabled
//! by default. Further formats, or replacements for the built-in ones, are
//! registered on a [`CodecRegistry`] and passed to the facade constructor.
//!
//! # Backends
//!
//! - [`Disk`]: paths relative to a root directory
//! - [`Remote`]: paths appended to a base address like `s3://bucket/prefix/`.
//!   Saving png or jpg files is refused before any request is made.
//! - [`Environment`]: one of each, built from an [`EnvironmentConfig`]

pub mod config;
pub mod error;
pub mod facade;
pub mod stream;

pub use config::{Environment, EnvironmentConfig};
pub use error::{Error, Result};
pub use facade::{Disk, Facade, Remote};
pub use stream::{ReadStream, Stream, StreamProvider, WriteStream};

pub use easy_env_codec::{CodecOptions, CodecRegistry, Loader, Payload, Saver, TransferMode};
pub use easy_env_file::{BlobStore, InMemoryBlobStore, RemoteConfig};

/// The codec crate, for payload types and their libraries
pub use easy_env_codec as codec;
/// The storage crate, for backend types
pub use easy_env_file as file;

/// Load `path`, relative to the current directory, with the built-in codecs
pub fn load(path: &str) -> Result<Payload> {
    Disk::new("").load(path)
}

/// Save `payload` to `path`, relative to the current directory, with the
/// built-in codecs
pub fn save(payload: &Payload, path: &str) -> Result<()> {
    Disk::new("").save(payload, path)
}
