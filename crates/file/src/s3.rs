//! S3 object store client behind the blocking [`BlobStore`] interface

use crate::{BlobStore, RemoteAddress, RemoteConfig, Result, StorageError, DEFAULT_BUFFER_SIZE};
use aws_config::profile::profile_file::{ProfileFileKind, ProfileFiles};
use aws_config::BehaviorVersion;
use aws_sdk_s3::config::Region;
use aws_sdk_s3::error::DisplayErrorContext;
use aws_sdk_s3::primitives::ByteStream;
use std::io::Read;
use tokio::runtime::Runtime;

/// S3 client plus the runtime that drives it.
///
/// Creating an S3 client is relatively expensive, so one instance is built per
/// remote backend and reused for every call. The runtime has its own worker
/// thread so streamed object bodies can be read from plain blocking code.
pub struct S3BlobStore {
    client: aws_sdk_s3::Client,
    runtime: Runtime,
}

impl S3BlobStore {
    /// Build a client from explicit connection settings
    pub fn connect(config: &RemoteConfig) -> Result<Self> {
        let runtime = build_runtime()?;

        let mut loader = aws_config::defaults(BehaviorVersion::latest());
        if let Some(region) = &config.region {
            loader = loader.region(Region::new(region.clone()));
        }
        if let Some(endpoint) = &config.endpoint {
            loader = loader.endpoint_url(endpoint);
        }
        if let Some(profile) = &config.profile {
            loader = loader.profile_name(profile);
        }
        if let Some(path) = &config.credentials_file {
            let files = ProfileFiles::builder()
                .include_default_config_file(true)
                .with_file(ProfileFileKind::Credentials, path)
                .build();
            loader = loader.profile_files(files);
        }

        let sdk_config = runtime.block_on(loader.load());
        let s3_config = aws_sdk_s3::config::Builder::from(&sdk_config)
            .force_path_style(config.force_path_style)
            .build();

        tracing::debug!("Created S3 client for {}", config.base_address);

        Ok(Self {
            client: aws_sdk_s3::Client::from_conf(s3_config),
            runtime,
        })
    }

    /// Wrap an already configured client
    pub fn from_client(client: aws_sdk_s3::Client) -> Result<Self> {
        Ok(Self {
            client,
            runtime: build_runtime()?,
        })
    }
}

fn build_runtime() -> Result<Runtime> {
    tokio::runtime::Builder::new_multi_thread()
        .worker_threads(1)
        .thread_name("easy-env-s3")
        .enable_all()
        .build()
        .map_err(StorageError::Runtime)
}

fn remote_error<E>(address: &RemoteAddress, error: E) -> StorageError
where
    E: std::error::Error + 'static,
{
    StorageError::Remote {
        address: address.to_string(),
        message: DisplayErrorContext(error).to_string(),
    }
}

impl BlobStore for S3BlobStore {
    fn get(&self, address: &RemoteAddress) -> Result<Box<dyn Read + Send>> {
        let response = self
            .runtime
            .block_on(
                self.client
                    .get_object()
                    .bucket(&address.bucket)
                    .key(&address.key)
                    .send(),
            )
            .map_err(|e| {
                if e.as_service_error().is_some_and(|s| s.is_no_such_key()) {
                    StorageError::NotFound(address.to_string())
                } else {
                    remote_error(address, e)
                }
            })?;

        // Convert byte stream to async read
        let stream = response.body.into_async_read();

        // Wrap in buffered reader
        let buffered = tokio::io::BufReader::with_capacity(DEFAULT_BUFFER_SIZE, stream);

        // Bridge async to sync on the store's own runtime
        let reader =
            tokio_util::io::SyncIoBridge::new_with_handle(buffered, self.runtime.handle().clone());

        Ok(Box::new(reader))
    }

    fn put(&self, address: &RemoteAddress, body: Vec<u8>) -> Result<()> {
        self.runtime
            .block_on(
                self.client
                    .put_object()
                    .bucket(&address.bucket)
                    .key(&address.key)
                    .body(ByteStream::from(body))
                    .send(),
            )
            .map_err(|e| remote_error(address, e))?;
        Ok(())
    }

    fn list(&self, address: &RemoteAddress) -> Result<Vec<String>> {
        let mut results = Vec::new();
        let mut continuation_token: Option<String> = None;

        loop {
            let mut request = self
                .client
                .list_objects_v2()
                .bucket(&address.bucket)
                .prefix(&address.key);

            if let Some(token) = &continuation_token {
                request = request.continuation_token(token);
            }

            let response = self
                .runtime
                .block_on(request.send())
                .map_err(|e| remote_error(address, e))?;

            if let Some(contents) = response.contents {
                for object in contents {
                    if let Some(key) = object.key {
                        // Skip "directory" markers (keys ending with /)
                        if key.ends_with('/') {
                            continue;
                        }
                        results.push(key);
                    }
                }
            }

            // Handle pagination
            if response.is_truncated == Some(true) {
                continuation_token = response.next_continuation_token;
            } else {
                break;
            }
        }

        Ok(results)
    }

    fn delete(&self, address: &RemoteAddress) -> Result<()> {
        self.runtime
            .block_on(
                self.client
                    .delete_object()
                    .bucket(&address.bucket)
                    .key(&address.key)
                    .send(),
            )
            .map_err(|e| remote_error(address, e))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connect_with_static_settings() {
        // Building the client performs no network I/O
        let config = RemoteConfig {
            base_address: "s3://bucket/".to_string(),
            region: Some("us-east-1".to_string()),
            endpoint: Some("http://localhost:9000".to_string()),
            force_path_style: true,
            ..Default::default()
        };
        assert!(S3BlobStore::connect(&config).is_ok());
    }

    // Request-level behaviour needs a live S3-compatible endpoint and is
    // covered through InMemoryBlobStore in the remote backend tests
}
