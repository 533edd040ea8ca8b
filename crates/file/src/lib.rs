//! Storage backends for reading and writing files on the local filesystem or
//! in a remote object store through one blocking interface.
//!
//! # Backends
//!
//! - **Local**: paths are joined onto a configured root directory
//! - **Remote**: paths are appended to a base address such as
//!   `gs://bucket/prefix/` or `s3://bucket/prefix/` and split into a bucket
//!   and an object key
//!
//! Both implement [`StorageBackend`], which hands out plain `Read` streams and
//! [`StorageWriter`]s that only become visible once `finish` is called. A
//! writer dropped without `finish` leaves no trace at the destination.
//!
//! # Example
//!
//! ```ignore
//! use easy_env_file::{LocalStorage, StorageBackend};
//! use std::io::Write;
//!
//! let storage = LocalStorage::new("/data");
//! let mut writer = storage.open_write("reports/summary.txt")?;
//! writer.write_all(b"hello")?;
//! writer.finish()?;
//! ```

mod error;
mod local;
mod memory;
mod remote;
mod s3;

use std::io::{Read, Write};

pub use error::{Result, StorageError};
pub use local::LocalStorage;
pub use memory::InMemoryBlobStore;
pub use remote::{
    BlobStore, RemoteAddress, RemoteConfig, RemoteStorage, SCHEME_PREFIX_LEN,
    UNWRITABLE_EXTENSIONS,
};
pub use s3::S3BlobStore;

/// Default buffer size for reading operations (1MB)
pub const DEFAULT_BUFFER_SIZE: usize = 1024 * 1024;

/// A handle for writing one object.
///
/// Bytes written are staged; [`StorageWriter::finish`] makes them visible at
/// the destination in one step.
pub trait StorageWriter: Write + Send {
    /// Flushes the staged bytes and publishes the object.
    fn finish(self: Box<Self>) -> Result<()>;
}

/// A storage system addressed by caller-supplied logical paths.
pub trait StorageBackend: Send + Sync {
    /// Opens the object at `path` for reading.
    fn open_read(&self, path: &str) -> Result<Box<dyn Read + Send>>;

    /// Opens the object at `path` for writing, replacing any existing object
    /// once the writer is finished.
    fn open_write(&self, path: &str) -> Result<Box<dyn StorageWriter>>;

    /// Deletes the object at `path`.
    fn delete(&self, path: &str) -> Result<()>;

    /// Human-readable location of `path`, for logging.
    fn describe(&self, path: &str) -> String;

    /// Rejects formats this backend cannot store before any I/O happens.
    fn check_save(&self, _extension: &str) -> Result<()> {
        Ok(())
    }
}
