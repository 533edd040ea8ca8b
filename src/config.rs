//! Environment configuration and the combined local/remote environment.

use crate::{Disk, Error, Remote, Result};
use easy_env_codec::CodecRegistry;
use easy_env_file::RemoteConfig;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

/// Settings for an [`Environment`], usually read from a TOML file:
///
/// ```toml
/// local_root = "data"
///
/// [remote]
/// base_address = "s3://my-bucket/project/"
/// region = "eu-west-1"
/// profile = "analytics"
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EnvironmentConfig {
    /// Root for local paths; empty means the current directory
    #[serde(default)]
    pub local_root: PathBuf,
    #[serde(default)]
    pub remote: Option<RemoteConfig>,
}

impl EnvironmentConfig {
    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| Error::Config(e.to_string()))
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("cannot read {}: {e}", path.display())))?;
        Self::from_toml_str(&content)
    }
}

/// A local disk and, optionally, a remote store sharing one codec setup.
#[derive(Debug, Clone)]
pub struct Environment {
    local: Disk,
    remote: Option<Remote>,
}

impl Environment {
    pub fn new(local: Disk, remote: Option<Remote>) -> Self {
        Self { local, remote }
    }

    pub fn from_config(config: &EnvironmentConfig) -> Result<Self> {
        Self::from_config_with_codecs(config, CodecRegistry::builtin())
    }

    /// Build both facades, each with its own copy of `codecs`
    pub fn from_config_with_codecs(
        config: &EnvironmentConfig,
        codecs: CodecRegistry,
    ) -> Result<Self> {
        let remote = match &config.remote {
            Some(remote) => Some(Remote::connect_with_codecs(remote, codecs.clone())?),
            None => None,
        };
        let local = Disk::with_codecs(config.local_root.clone(), codecs);

        tracing::debug!(
            "Environment ready: local root '{}', remote {}",
            local.root().display(),
            remote.as_ref().map_or("not configured", |r| r.base_address())
        );
        Ok(Self { local, remote })
    }

    pub fn local(&self) -> &Disk {
        &self.local
    }

    pub fn remote(&self) -> Result<&Remote> {
        self.remote
            .as_ref()
            .ok_or_else(|| Error::Config("no remote storage is configured".to_string()))
    }

    pub fn has_remote(&self) -> bool {
        self.remote.is_some()
    }
}
