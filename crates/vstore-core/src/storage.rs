//! Byte storage capability
//!
//! - [`FsStorage`]: local filesystem via `tokio::fs`, atomic replace on write
//! - [`MemoryStorage`]: in-process map, handy for tests and ephemeral stores

use crate::error::StorageError;
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Reads and writes whole byte buffers at a path
#[async_trait]
pub trait Storage: Send + Sync {
    /// Read every byte stored at `path`
    ///
    /// # Errors
    /// [`StorageError::NotFound`] if nothing is stored there, otherwise the
    /// underlying failure.
    async fn read(&self, path: &Path) -> Result<Vec<u8>, StorageError>;

    /// Replace the contents at `path`
    ///
    /// # Errors
    /// Returns the underlying failure.
    async fn write(&self, path: &Path, bytes: &[u8]) -> Result<(), StorageError>;
}

#[async_trait]
impl<T: Storage + ?Sized> Storage for Arc<T> {
    async fn read(&self, path: &Path) -> Result<Vec<u8>, StorageError> {
        (**self).read(path).await
    }

    async fn write(&self, path: &Path, bytes: &[u8]) -> Result<(), StorageError> {
        (**self).write(path, bytes).await
    }
}

/// Local filesystem storage
///
/// Writes go to a sibling temporary file that is renamed over the target, so
/// readers never observe a half-written file. Missing parent directories are
/// created.
#[derive(Debug, Clone, Copy, Default)]
pub struct FsStorage;

impl FsStorage {
    /// Create filesystem storage
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Storage for FsStorage {
    async fn read(&self, path: &Path) -> Result<Vec<u8>, StorageError> {
        tokio::fs::read(path)
            .await
            .map_err(|e| StorageError::from_io(path, e))
    }

    async fn write(&self, path: &Path, bytes: &[u8]) -> Result<(), StorageError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| StorageError::from_io(parent, e))?;
        }

        let staging = staging_path(path);
        tokio::fs::write(&staging, bytes)
            .await
            .map_err(|e| StorageError::from_io(&staging, e))?;

        if let Err(e) = tokio::fs::rename(&staging, path).await {
            // best effort, the rename error is the one worth reporting
            let _ = tokio::fs::remove_file(&staging).await;
            return Err(StorageError::from_io(path, e));
        }

        tracing::trace!("wrote {} bytes to {}", bytes.len(), path.display());
        Ok(())
    }
}

fn staging_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(OsString::from)
        .unwrap_or_else(|| OsString::from("store"));
    name.push(format!(".{}.tmp", std::process::id()));
    path.with_file_name(name)
}

/// In-memory storage
///
/// Clones share the same contents.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    files: Arc<Mutex<HashMap<PathBuf, Vec<u8>>>>,
}

impl MemoryStorage {
    /// Create empty storage
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Put bytes at path directly
    pub fn insert(&self, path: impl Into<PathBuf>, bytes: impl Into<Vec<u8>>) {
        self.files.lock().insert(path.into(), bytes.into());
    }

    /// Copy of the bytes at path
    #[must_use]
    pub fn get(&self, path: impl AsRef<Path>) -> Option<Vec<u8>> {
        self.files.lock().get(path.as_ref()).cloned()
    }

    /// Contents at path as UTF-8 text
    #[must_use]
    pub fn get_string(&self, path: impl AsRef<Path>) -> Option<String> {
        self.get(path).and_then(|b| String::from_utf8(b).ok())
    }

    /// Remove the entry at path
    pub fn remove(&self, path: impl AsRef<Path>) -> Option<Vec<u8>> {
        self.files.lock().remove(path.as_ref())
    }

    /// Check if anything is stored at path
    #[must_use]
    pub fn contains(&self, path: impl AsRef<Path>) -> bool {
        self.files.lock().contains_key(path.as_ref())
    }

    /// Number of stored entries
    #[must_use]
    pub fn len(&self) -> usize {
        self.files.lock().len()
    }

    /// Check if nothing is stored
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.files.lock().is_empty()
    }
}

#[async_trait]
impl Storage for MemoryStorage {
    async fn read(&self, path: &Path) -> Result<Vec<u8>, StorageError> {
        self.get(path).ok_or_else(|| StorageError::NotFound {
            path: path.to_path_buf(),
        })
    }

    async fn write(&self, path: &Path, bytes: &[u8]) -> Result<(), StorageError> {
        self.insert(path, bytes);
        Ok(())
    }
}
