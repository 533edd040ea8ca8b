//! `load`/`save` entry points bound to one storage backend.

use crate::stream::StreamProvider;
use crate::{Error, Result};
use easy_env_codec::{extension_of, CodecError, CodecOptions, CodecRegistry, Payload};
use easy_env_file::{
    BlobStore, LocalStorage, RemoteConfig, RemoteStorage, S3BlobStore, StorageBackend,
};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// A storage backend plus the codec registry used to read and write it.
///
/// Each facade owns its registry, so overrides given to one facade never
/// affect another.
#[derive(Debug, Clone)]
pub struct Facade<B> {
    backend: B,
    codecs: CodecRegistry,
}

/// Facade over the local filesystem
pub type Disk = Facade<LocalStorage>;

/// Facade over a remote object store
pub type Remote = Facade<RemoteStorage>;

impl<B: StorageBackend> Facade<B> {
    pub fn from_parts(backend: B, codecs: CodecRegistry) -> Self {
        Self { backend, codecs }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn registry(&self) -> &CodecRegistry {
        &self.codecs
    }

    /// Decode the file at `path` with the loader registered for its extension
    pub fn load(&self, path: &str) -> Result<Payload> {
        self.load_with(path, &CodecOptions::default())
    }

    pub fn load_with(&self, path: &str, options: &CodecOptions) -> Result<Payload> {
        let extension = extension_of(path);
        let loader = self.codecs.resolve_loader(&extension)?;

        let mut stream = StreamProvider::new(&self.backend).open_read(path, loader.mode())?;
        let payload = loader.decode(&mut stream, options)?;

        tracing::debug!(
            "Loaded {} as {}",
            self.backend.describe(path),
            payload.kind()
        );
        Ok(payload)
    }

    /// Load and unwrap the payload into the type its format decodes to
    pub fn load_as<T>(&self, path: &str) -> Result<T>
    where
        T: TryFrom<Payload, Error = CodecError>,
    {
        let payload = self.load(path)?;
        Ok(T::try_from(payload)?)
    }

    /// Encode `payload` with the saver registered for the extension of
    /// `path`. The destination is only replaced once encoding succeeds.
    pub fn save(&self, payload: &Payload, path: &str) -> Result<()> {
        self.save_with(payload, path, &CodecOptions::default())
    }

    pub fn save_with(&self, payload: &Payload, path: &str, options: &CodecOptions) -> Result<()> {
        let extension = extension_of(path);
        // Backend limits hold whichever codecs are compiled in
        self.backend.check_save(&extension)?;
        let saver = self.codecs.resolve_saver(&extension)?;

        let mut stream = StreamProvider::new(&self.backend).open_write(path, saver.mode())?;
        saver.encode(payload, &mut stream, options)?;
        stream.commit()?;

        tracing::debug!(
            "Saved {} payload to {}",
            payload.kind(),
            self.backend.describe(path)
        );
        Ok(())
    }

    pub fn delete(&self, path: &str) -> Result<()> {
        Ok(self.backend.delete(path)?)
    }
}

impl Facade<LocalStorage> {
    /// Disk rooted at `root`, with the built-in codecs
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self::with_codecs(root, CodecRegistry::builtin())
    }

    pub fn with_codecs(root: impl Into<PathBuf>, codecs: CodecRegistry) -> Self {
        Self::from_parts(LocalStorage::new(root), codecs)
    }

    pub fn root(&self) -> &Path {
        self.backend.root()
    }

    /// Files directly inside `dir`
    pub fn list(&self, dir: &str) -> Result<Vec<PathBuf>> {
        Ok(self.backend.list(dir)?)
    }

    /// Remove the files directly inside `dir`; subdirectories are kept
    pub fn clear_folder(&self, dir: &str) -> Result<usize> {
        Ok(self.backend.clear_folder(dir)?)
    }
}

impl Facade<RemoteStorage> {
    /// Remote facade over `store`, with the built-in codecs
    pub fn new(base_address: impl Into<String>, store: Arc<dyn BlobStore>) -> Self {
        Self::with_codecs(base_address, store, CodecRegistry::builtin())
    }

    pub fn with_codecs(
        base_address: impl Into<String>,
        store: Arc<dyn BlobStore>,
        codecs: CodecRegistry,
    ) -> Self {
        Self::from_parts(RemoteStorage::new(base_address, store), codecs)
    }

    /// Build an S3 client from `config` and bind it to its base address
    pub fn connect(config: &RemoteConfig) -> Result<Self> {
        Self::connect_with_codecs(config, CodecRegistry::builtin())
    }

    pub fn connect_with_codecs(config: &RemoteConfig, codecs: CodecRegistry) -> Result<Self> {
        if config.base_address.is_empty() {
            return Err(Error::Config(
                "remote storage needs a base_address".to_string(),
            ));
        }
        let store = S3BlobStore::connect(config)?;
        tracing::info!("Connected to remote storage at {}", config.base_address);
        Ok(Self::with_codecs(
            config.base_address.clone(),
            Arc::new(store),
            codecs,
        ))
    }

    pub fn base_address(&self) -> &str {
        self.backend.base_address()
    }

    /// Full keys of the objects whose address starts with `base + prefix`
    pub fn list_files(&self, prefix: &str) -> Result<Vec<String>> {
        Ok(self.backend.list_files(prefix)?)
    }

    pub fn download(&self, path: &str, destination: impl AsRef<Path>) -> Result<()> {
        Ok(self.backend.download(path, destination.as_ref())?)
    }
}
