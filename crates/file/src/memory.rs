//! In-memory object store

use crate::{BlobStore, RemoteAddress, Result, StorageError};
use std::collections::BTreeMap;
use std::io::{Cursor, Read};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::RwLock;

/// `BTreeMap`-backed [`BlobStore`] for tests and embedding.
///
/// Every trait call is counted, so callers can check that an operation was
/// refused before it reached the store.
#[derive(Debug, Default)]
pub struct InMemoryBlobStore {
    objects: RwLock<BTreeMap<(String, String), Vec<u8>>>,
    calls: AtomicUsize,
}

impl InMemoryBlobStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed an object without counting it as a call
    pub fn insert(&self, bucket: &str, key: &str, body: Vec<u8>) {
        self.objects
            .write()
            .expect("lock poisoned")
            .insert((bucket.to_string(), key.to_string()), body);
    }

    /// Contents of one object, if present
    pub fn object(&self, bucket: &str, key: &str) -> Option<Vec<u8>> {
        self.objects
            .read()
            .expect("lock poisoned")
            .get(&(bucket.to_string(), key.to_string()))
            .cloned()
    }

    pub fn len(&self) -> usize {
        self.objects.read().expect("lock poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.read().expect("lock poisoned").is_empty()
    }

    /// Number of `BlobStore` calls served so far
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn record_call(&self) {
        self.calls.fetch_add(1, Ordering::SeqCst);
    }
}

impl BlobStore for InMemoryBlobStore {
    fn get(&self, address: &RemoteAddress) -> Result<Box<dyn Read + Send>> {
        self.record_call();
        let body = self
            .object(&address.bucket, &address.key)
            .ok_or_else(|| StorageError::NotFound(address.to_string()))?;
        Ok(Box::new(Cursor::new(body)))
    }

    fn put(&self, address: &RemoteAddress, body: Vec<u8>) -> Result<()> {
        self.record_call();
        self.insert(&address.bucket, &address.key, body);
        Ok(())
    }

    fn list(&self, address: &RemoteAddress) -> Result<Vec<String>> {
        self.record_call();
        let objects = self.objects.read().expect("lock poisoned");
        Ok(objects
            .keys()
            .filter(|(bucket, key)| *bucket == address.bucket && key.starts_with(&address.key))
            .map(|(_, key)| key.clone())
            .collect())
    }

    fn delete(&self, address: &RemoteAddress) -> Result<()> {
        self.record_call();
        self.objects
            .write()
            .expect("lock poisoned")
            .remove(&(address.bucket.clone(), address.key.clone()));
        Ok(())
    }
}
