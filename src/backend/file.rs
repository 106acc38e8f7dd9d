//! File-system storage backend.
//!
//! Stores each key as one file inside a directory, which gives the
//! browser-local-storage behaviour of surviving a restart.

use super::CartBackend;
use crate::error::{Error, Result};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// Storage backend that keeps one file per key under `root`.
///
/// Keys are escaped into file names: ASCII letters, digits, `-` and `_` are
/// kept, every other byte becomes `%XX`. Writes go to a fresh temporary file
/// in the same directory that is then renamed over the target, so a crash
/// never leaves half a cart.
///
/// # Example
///
/// ```no_run
/// use cart_kit::backend::{CartBackend, FileBackend};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let backend = FileBackend::open("/var/lib/marketplace/carts").await?;
///     backend.set("cart:42", b"[]".to_vec()).await?;
///     Ok(())
/// }
/// ```
#[derive(Clone, Debug)]
pub struct FileBackend {
    root: PathBuf,
}

impl FileBackend {
    /// Open (and create if needed) a storage directory.
    ///
    /// # Errors
    /// Returns `Error::BackendError` if the directory cannot be created.
    pub async fn open(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        tokio::fs::create_dir_all(&root).await.map_err(|e| {
            Error::BackendError(format!(
                "Failed to create storage dir {}: {}",
                root.display(),
                e
            ))
        })?;

        info!("✓ File backend initialized at {}", root.display());
        Ok(FileBackend { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.root.join(format!("{}.json", escape_key(key)))
    }
}

fn escape_key(key: &str) -> String {
    let mut escaped = String::with_capacity(key.len());
    for byte in key.bytes() {
        if byte.is_ascii_alphanumeric() || byte == b'-' || byte == b'_' {
            escaped.push(byte as char);
        } else {
            escaped.push_str(&format!("%{:02X}", byte));
        }
    }
    escaped
}

fn write_atomically(root: &Path, path: &Path, value: &[u8]) -> Result<()> {
    let mut tmp = NamedTempFile::new_in(root).map_err(|e| {
        Error::BackendError(format!("Failed to create temp file in {}: {}", root.display(), e))
    })?;
    tmp.write_all(value).map_err(|e| {
        Error::BackendError(format!("Failed to write {}: {}", tmp.path().display(), e))
    })?;
    tmp.persist(path).map_err(|e| {
        Error::BackendError(format!("Failed to replace {}: {}", path.display(), e.error))
    })?;
    Ok(())
}

impl CartBackend for FileBackend {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let path = self.path_for(key);
        match tokio::fs::read(&path).await {
            Ok(bytes) => {
                debug!("✓ File GET {} -> HIT ({} bytes)", key, bytes.len());
                Ok(Some(bytes))
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!("✓ File GET {} -> MISS", key);
                Ok(None)
            }
            Err(e) => Err(Error::BackendError(format!(
                "Failed to read {}: {}",
                path.display(),
                e
            ))),
        }
    }

    async fn set(&self, key: &str, value: Vec<u8>) -> Result<()> {
        let path = self.path_for(key);
        let root = self.root.clone();
        let size = value.len();

        // Each write gets its own temp file, so concurrent writers never share one.
        tokio::task::spawn_blocking(move || write_atomically(&root, &path, &value))
            .await
            .map_err(|e| Error::BackendError(format!("File write task failed: {}", e)))??;

        debug!("✓ File SET {} ({} bytes)", key, size);
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<()> {
        let path = self.path_for(key);
        match tokio::fs::remove_file(&path).await {
            Ok(()) => {}
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => {
                return Err(Error::BackendError(format!(
                    "Failed to delete {}: {}",
                    path.display(),
                    e
                )))
            }
        }

        debug!("✓ File DELETE {}", key);
        Ok(())
    }

    async fn health_check(&self) -> Result<bool> {
        Ok(tokio::fs::metadata(&self.root)
            .await
            .map(|m| m.is_dir())
            .unwrap_or(false))
    }
}
