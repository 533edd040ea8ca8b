//! Local filesystem backend

use crate::{Result, StorageBackend, StorageError, StorageWriter, DEFAULT_BUFFER_SIZE};
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, ErrorKind, Read, Write};
use std::path::{Path, PathBuf};
use tempfile::{Builder, NamedTempFile};

/// Files under a root directory, addressed by paths relative to that root
#[derive(Debug, Clone)]
pub struct LocalStorage {
    root: PathBuf,
}

impl LocalStorage {
    /// Create a backend rooted at `root`. An empty root resolves paths
    /// against the current directory.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Join a logical path onto the root
    pub fn resolve(&self, path: &str) -> PathBuf {
        self.root.join(path)
    }

    /// List the files directly inside `dir` (non-recursive, immediate children only)
    ///
    /// Symlinks are followed: a link to a file is listed, a link to a
    /// directory or a dangling link is skipped. Subdirectories are skipped.
    /// Results are sorted.
    pub fn list(&self, dir: &str) -> Result<Vec<PathBuf>> {
        let dir_path = self.resolve(dir);
        let mut results = Vec::new();

        let entries =
            fs::read_dir(non_empty(&dir_path)).map_err(|e| StorageError::io(&dir_path, e))?;

        for entry in entries {
            let entry = entry.map_err(|e| StorageError::io(&dir_path, e))?;
            let entry_path = entry.path();
            let metadata = match fs::metadata(&entry_path) {
                Ok(metadata) => metadata,
                Err(e) if e.kind() == ErrorKind::NotFound => continue,
                Err(e) => return Err(StorageError::io(&entry_path, e)),
            };

            if metadata.is_file() {
                results.push(entry_path);
            }
        }

        results.sort();

        tracing::debug!(
            "Listed {} files in directory: {}",
            results.len(),
            dir_path.display()
        );

        Ok(results)
    }

    /// Delete every file directly inside `dir`, leaving subdirectories and
    /// their contents alone. Returns the number of files removed.
    pub fn clear_folder(&self, dir: &str) -> Result<usize> {
        let files = self.list(dir)?;
        for file in &files {
            fs::remove_file(file).map_err(|e| StorageError::io(file, e))?;
        }

        tracing::info!(
            "Removed {} files from directory: {}",
            files.len(),
            self.resolve(dir).display()
        );

        Ok(files.len())
    }
}

impl StorageBackend for LocalStorage {
    fn open_read(&self, path: &str) -> Result<Box<dyn Read + Send>> {
        let full_path = self.resolve(path);
        let file = File::open(&full_path).map_err(|e| StorageError::io(&full_path, e))?;
        Ok(Box::new(BufReader::with_capacity(DEFAULT_BUFFER_SIZE, file)))
    }

    fn open_write(&self, path: &str) -> Result<Box<dyn StorageWriter>> {
        let target = self.resolve(path);
        let parent = target
            .parent()
            .map(non_empty)
            .unwrap_or_else(|| Path::new("."))
            .to_path_buf();

        fs::create_dir_all(&parent).map_err(|e| StorageError::io(&parent, e))?;

        // Staged next to the target so the final rename stays on one filesystem
        let staged = staging_builder()
            .tempfile_in(&parent)
            .map_err(|e| StorageError::io(&parent, e))?;

        Ok(Box::new(LocalWriter {
            staged: BufWriter::with_capacity(DEFAULT_BUFFER_SIZE, staged),
            target,
        }))
    }

    fn delete(&self, path: &str) -> Result<()> {
        let full_path = self.resolve(path);
        fs::remove_file(&full_path).map_err(|e| StorageError::io(&full_path, e))?;
        tracing::info!("Deleted file: {}", full_path.display());
        Ok(())
    }

    fn describe(&self, path: &str) -> String {
        self.resolve(path).display().to_string()
    }
}

/// Writes into a temporary sibling file that is renamed over the target on
/// `finish`. Dropping the writer removes the temporary file.
struct LocalWriter {
    staged: BufWriter<NamedTempFile>,
    target: PathBuf,
}

impl Write for LocalWriter {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.staged.write(buf)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.staged.flush()
    }
}

impl StorageWriter for LocalWriter {
    fn finish(self: Box<Self>) -> Result<()> {
        let LocalWriter { staged, target } = *self;
        let staged = staged
            .into_inner()
            .map_err(|e| StorageError::io(&target, e.into_error()))?;
        // An overwrite keeps the mode of the file it replaces
        if let Ok(existing) = fs::metadata(&target) {
            staged
                .as_file()
                .set_permissions(existing.permissions())
                .map_err(|e| StorageError::io(&target, e))?;
        }
        staged
            .as_file()
            .sync_all()
            .map_err(|e| StorageError::io(&target, e))?;
        staged
            .persist(&target)
            .map_err(|e| StorageError::io(&target, e.error))?;

        tracing::debug!("Wrote file: {}", target.display());
        Ok(())
    }
}

/// Temp files default to owner-only access. Request 0o666 instead so a new
/// file ends up with the same umask-filtered mode as one made by `File::create`.
fn staging_builder() -> Builder<'static, 'static> {
    let mut builder = Builder::new();
    builder.prefix(".easy-env-");
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        builder.permissions(fs::Permissions::from_mode(0o666));
    }
    builder
}

fn non_empty(path: &Path) -> &Path {
    if path.as_os_str().is_empty() {
        Path::new(".")
    } else {
        path
    }
}
