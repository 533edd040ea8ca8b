//! Remote object store backend addressed by `<scheme>://<bucket>/<key>`

use crate::{Result, StorageBackend, StorageError, StorageWriter};
use serde::Deserialize;
use std::fmt;
use std::fs;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Length of the `xx://` scheme prefix of every remote address
pub const SCHEME_PREFIX_LEN: usize = 5;

/// Formats the remote backend refuses to save.
///
/// Raster encoders want a seekable sink, while remote objects are uploaded
/// as one append-only body.
pub const UNWRITABLE_EXTENSIONS: &[&str] = &["png", "jpg"];

/// Connection settings for a remote object store.
///
/// Consumed once when the client is built; nothing is read from or written to
/// the process environment.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct RemoteConfig {
    /// Base address every logical path is appended to, e.g. `s3://bucket/data/`
    pub base_address: String,
    /// Region name, e.g. `eu-west-1`
    #[serde(default)]
    pub region: Option<String>,
    /// Custom endpoint URL for S3-compatible services
    #[serde(default)]
    pub endpoint: Option<String>,
    /// Named profile inside the credentials file
    #[serde(default)]
    pub profile: Option<String>,
    /// Path to a shared credentials file
    #[serde(default)]
    pub credentials_file: Option<PathBuf>,
    /// Use path-style requests (required by most self-hosted services)
    #[serde(default)]
    pub force_path_style: bool,
}

/// A bucket plus an object key (or key prefix) inside it
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RemoteAddress {
    pub scheme: String,
    pub bucket: String,
    pub key: String,
}

impl RemoteAddress {
    /// Split a full address into bucket and key at the first `/` after the
    /// scheme prefix.
    pub fn parse(address: &str) -> Result<Self> {
        let (prefix, rest) = match (
            address.get(..SCHEME_PREFIX_LEN),
            address.get(SCHEME_PREFIX_LEN..),
        ) {
            (Some(prefix), Some(rest)) if prefix.ends_with("://") => (prefix, rest),
            _ => {
                return Err(StorageError::addressing(
                    address,
                    "expected a scheme prefix such as 'gs://' or 's3://'",
                ))
            }
        };

        let (bucket, key) = rest.split_once('/').ok_or_else(|| {
            StorageError::addressing(address, "expected '<scheme>://<bucket>/<key>'")
        })?;

        if bucket.is_empty() {
            return Err(StorageError::addressing(address, "bucket name is empty"));
        }

        Ok(Self {
            scheme: prefix.trim_end_matches("://").to_string(),
            bucket: bucket.to_string(),
            key: key.to_string(),
        })
    }
}

impl fmt::Display for RemoteAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}://{}/{}", self.scheme, self.bucket, self.key)
    }
}

/// Minimal blocking client surface of an object store.
pub trait BlobStore: Send + Sync {
    /// Stream the body of one object.
    fn get(&self, address: &RemoteAddress) -> Result<Box<dyn Read + Send>>;

    /// Create or replace one object with `body`.
    fn put(&self, address: &RemoteAddress, body: Vec<u8>) -> Result<()>;

    /// Keys of every object whose key starts with `address.key`.
    fn list(&self, address: &RemoteAddress) -> Result<Vec<String>>;

    /// Delete one object. Deleting a key that does not exist succeeds, as
    /// S3 `DeleteObject` does.
    fn delete(&self, address: &RemoteAddress) -> Result<()>;
}

/// Objects below a base address in a remote store
#[derive(Clone)]
pub struct RemoteStorage {
    base_address: String,
    store: Arc<dyn BlobStore>,
}

impl fmt::Debug for RemoteStorage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RemoteStorage")
            .field("base_address", &self.base_address)
            .finish_non_exhaustive()
    }
}

impl RemoteStorage {
    pub fn new(base_address: impl Into<String>, store: Arc<dyn BlobStore>) -> Self {
        Self {
            base_address: base_address.into(),
            store,
        }
    }

    pub fn base_address(&self) -> &str {
        &self.base_address
    }

    /// Append `path` to the base address and split the result.
    pub fn resolve(&self, path: &str) -> Result<RemoteAddress> {
        RemoteAddress::parse(&format!("{}{}", self.base_address, path))
    }

    fn resolve_object(&self, path: &str) -> Result<RemoteAddress> {
        let address = self.resolve(path)?;
        if address.key.is_empty() {
            return Err(StorageError::addressing(
                address.to_string(),
                "object key is empty",
            ));
        }
        Ok(address)
    }

    /// Keys of all objects sharing the prefix `base_address + prefix`
    pub fn list_files(&self, prefix: &str) -> Result<Vec<String>> {
        let address = self.resolve(prefix)?;
        let mut keys = self.store.list(&address)?;
        keys.sort();

        tracing::debug!("Listed {} objects under prefix: {}", keys.len(), address);

        Ok(keys)
    }

    /// Copy one object into a local file, creating parent directories
    pub fn download(&self, path: &str, destination: &Path) -> Result<()> {
        let address = self.resolve_object(path)?;
        let mut reader = self.store.get(&address)?;

        if let Some(parent) = destination.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| StorageError::io(parent, e))?;
        }
        let mut file =
            fs::File::create(destination).map_err(|e| StorageError::io(destination, e))?;
        let bytes =
            std::io::copy(&mut reader, &mut file).map_err(|e| StorageError::io(destination, e))?;

        tracing::debug!(
            "Downloaded {} bytes from {} to {}",
            bytes,
            address,
            destination.display()
        );

        Ok(())
    }
}

impl StorageBackend for RemoteStorage {
    fn open_read(&self, path: &str) -> Result<Box<dyn Read + Send>> {
        let address = self.resolve_object(path)?;
        self.store.get(&address)
    }

    fn open_write(&self, path: &str) -> Result<Box<dyn StorageWriter>> {
        let address = self.resolve_object(path)?;
        Ok(Box::new(DeferredUpload {
            address,
            body: Vec::new(),
            store: Arc::clone(&self.store),
        }))
    }

    fn delete(&self, path: &str) -> Result<()> {
        let address = self.resolve_object(path)?;
        self.store.delete(&address)?;
        tracing::info!("Deleted object: {}", address);
        Ok(())
    }

    fn describe(&self, path: &str) -> String {
        format!("{}{}", self.base_address, path)
    }

    fn check_save(&self, extension: &str) -> Result<()> {
        if UNWRITABLE_EXTENSIONS.contains(&extension) {
            return Err(StorageError::SaveUnsupported {
                extension: extension.to_string(),
                backend: "remote storage",
                reason: "image encoders need a seekable file, remote objects are uploaded in one pass",
            });
        }
        Ok(())
    }
}

/// Buffers everything written and uploads it in a single request on
/// `finish`. Flushes before that are no-ops, so a writer that flushes midway
/// never publishes a partial object.
struct DeferredUpload {
    address: RemoteAddress,
    body: Vec<u8>,
    store: Arc<dyn BlobStore>,
}

impl Write for DeferredUpload {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.body.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

impl StorageWriter for DeferredUpload {
    fn finish(self: Box<Self>) -> Result<()> {
        let DeferredUpload {
            address,
            body,
            store,
        } = *self;
        let size = body.len();
        store.put(&address, body)?;
        tracing::debug!("Uploaded {} bytes to {}", size, address);
        Ok(())
    }
}
