//! Blob storage for originals and variants.
//!
//! The engine only ever asks four things of storage: does a path exist, read
//! it, create it if absent, and what URL serves it. [`Storage::create`] is the
//! one place concurrency matters: two requests for the same missing variant
//! both render it and both call `create`. The loser must not fail. Because
//! rendering is deterministic, whichever write lands holds the same bytes.
//!
//! Two implementations:
//!
//! - [`LocalStorage`]: a directory on disk. Writes go to a temp file in the
//!   target directory and are persisted with a no-clobber rename, so readers
//!   never see a partial file and an existing file is never replaced.
//! - [`MemoryStorage`]: an in-process map, for tests and embedding.

use parking_lot::RwLock;
use std::collections::HashMap;
use std::io::{self, Write};
use std::path::{Component, Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use thiserror::Error;
use tracing::debug;

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("IO error on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: io::Error,
    },
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Invalid storage path {0:?}")]
    InvalidPath(String),
}

/// Storage backend trait.
pub trait Storage: Send + Sync {
    /// Check if a blob exists.
    fn exists(&self, path: &str) -> Result<bool, StorageError>;

    /// Store `bytes` at `path` unless something is already there.
    ///
    /// Returns `Ok(())` both when the write happened and when the path was
    /// already taken.
    fn create(&self, path: &str, bytes: &[u8]) -> Result<(), StorageError>;

    /// Read a blob.
    fn get(&self, path: &str) -> Result<Vec<u8>, StorageError>;

    /// Public URL for a path (which may carry a query string).
    fn url_for(&self, path: &str) -> String;
}

/// Join a base URL and a path with exactly one `/`.
pub fn join_url(base_url: &str, path: &str) -> String {
    format!(
        "{}/{}",
        base_url.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}

/// Reject anything that could escape the storage root.
fn check_relative(path: &str) -> Result<&Path, StorageError> {
    let p = Path::new(path);
    let escapes = p
        .components()
        .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir));
    if path.is_empty() || escapes {
        return Err(StorageError::InvalidPath(path.to_string()));
    }
    Ok(p)
}

/// Local filesystem storage.
#[derive(Debug, Clone)]
pub struct LocalStorage {
    /// Directory every path is resolved under.
    root: PathBuf,
    /// Base URL for public access.
    base_url: String,
}

impl LocalStorage {
    pub fn new(root: impl Into<PathBuf>, base_url: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            base_url: base_url.into(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn resolve(&self, path: &str) -> Result<PathBuf, StorageError> {
        Ok(self.root.join(check_relative(path)?))
    }
}

fn io_error(path: &str) -> impl FnOnce(io::Error) -> StorageError + '_ {
    move |source| StorageError::Io {
        path: path.to_string(),
        source,
    }
}

impl Storage for LocalStorage {
    fn exists(&self, path: &str) -> Result<bool, StorageError> {
        let full = self.resolve(path)?;
        full.try_exists().map_err(io_error(path))
    }

    fn create(&self, path: &str, bytes: &[u8]) -> Result<(), StorageError> {
        let full = self.resolve(path)?;
        let parent = full.parent().unwrap_or(&self.root);
        std::fs::create_dir_all(parent).map_err(io_error(path))?;

        let mut tmp = tempfile::NamedTempFile::new_in(parent).map_err(io_error(path))?;
        tmp.write_all(bytes).map_err(io_error(path))?;
        tmp.flush().map_err(io_error(path))?;

        match tmp.persist_noclobber(&full) {
            Ok(_) => {
                debug!(path = %path, size = bytes.len(), "blob written");
                Ok(())
            }
            Err(e) if e.error.kind() == io::ErrorKind::AlreadyExists => {
                debug!(path = %path, "blob already present, write discarded");
                Ok(())
            }
            Err(e) => Err(io_error(path)(e.error)),
        }
    }

    fn get(&self, path: &str) -> Result<Vec<u8>, StorageError> {
        let full = self.resolve(path)?;
        match std::fs::read(&full) {
            Ok(data) => {
                debug!(path = %path, size = data.len(), "blob read");
                Ok(data)
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                Err(StorageError::NotFound(path.to_string()))
            }
            Err(e) => Err(io_error(path)(e)),
        }
    }

    fn url_for(&self, path: &str) -> String {
        join_url(&self.base_url, path)
    }
}

/// In-memory storage.
///
/// Counts successful writes so tests can assert that a rejected request
/// stored nothing.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    blobs: RwLock<HashMap<String, Vec<u8>>>,
    writes: AtomicUsize,
    base_url: String,
}

impl MemoryStorage {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Self::default()
        }
    }

    /// Number of `create` calls that actually stored bytes.
    pub fn writes(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    pub fn len(&self) -> usize {
        self.blobs.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.blobs.read().is_empty()
    }
}

impl Storage for MemoryStorage {
    fn exists(&self, path: &str) -> Result<bool, StorageError> {
        check_relative(path)?;
        Ok(self.blobs.read().contains_key(path))
    }

    fn create(&self, path: &str, bytes: &[u8]) -> Result<(), StorageError> {
        check_relative(path)?;
        let mut blobs = self.blobs.write();
        if !blobs.contains_key(path) {
            blobs.insert(path.to_string(), bytes.to_vec());
            self.writes.fetch_add(1, Ordering::SeqCst);
        }
        Ok(())
    }

    fn get(&self, path: &str) -> Result<Vec<u8>, StorageError> {
        check_relative(path)?;
        self.blobs
            .read()
            .get(path)
            .cloned()
            .ok_or_else(|| StorageError::NotFound(path.to_string()))
    }

    fn url_for(&self, path: &str) -> String {
        join_url(&self.base_url, path)
    }
}
