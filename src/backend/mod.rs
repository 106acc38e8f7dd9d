//! Key-value storage backends for cart snapshots.

use crate::error::Result;
use std::future::Future;

pub mod file;
pub mod inmemory;
#[cfg(feature = "redis")]
pub mod redis;

pub use file::FileBackend;
pub use inmemory::InMemoryBackend;
#[cfg(feature = "redis")]
pub use redis::{RedisBackend, RedisConfig};

/// Trait for key-value storage backends.
///
/// This is the "local storage" collaborator: the cart lives as one serialized
/// value under one key. Implementations: InMemory (default), File, Redis.
///
/// **IMPORTANT:** All methods use `&self` instead of `&mut self` to allow
/// concurrent access. Implementations should use interior mutability or
/// external storage.
///
/// **ASYNC:** All methods return `Send` futures so a store built on any
/// backend can be driven from a spawned task.
pub trait CartBackend: Send + Sync + Clone {
    /// Read the value stored under `key`.
    ///
    /// # Returns
    /// - `Ok(Some(bytes))` - Value present
    /// - `Ok(None)` - Nothing stored under `key`
    ///
    /// # Errors
    /// Returns `Err` if the backend cannot be read
    fn get(&self, key: &str) -> impl Future<Output = Result<Option<Vec<u8>>>> + Send;

    /// Store `value` under `key`, replacing any previous value.
    ///
    /// # Errors
    /// Returns `Err` if the backend cannot be written
    fn set(&self, key: &str, value: Vec<u8>) -> impl Future<Output = Result<()>> + Send;

    /// Remove the value under `key`. Removing an absent key is not an error.
    ///
    /// # Errors
    /// Returns `Err` if the backend cannot be written
    fn delete(&self, key: &str) -> impl Future<Output = Result<()>> + Send;

    /// Check if a value exists under `key`.
    ///
    /// # Errors
    /// Returns `Err` if the backend cannot be read
    fn exists(&self, key: &str) -> impl Future<Output = Result<bool>> + Send {
        async move { Ok(self.get(key).await?.is_some()) }
    }

    /// Health check - verify backend is accessible.
    ///
    /// # Errors
    /// Returns `Err` if backend is not accessible
    fn health_check(&self) -> impl Future<Output = Result<bool>> + Send {
        async { Ok(true) }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_backend_exists_default() {
        let backend = InMemoryBackend::new();
        backend
            .set("cart", b"[]".to_vec())
            .await
            .expect("Failed to set key");
        assert!(backend.exists("cart").await.expect("Failed to check exists"));
        assert!(!backend
            .exists("nonexistent")
            .await
            .expect("Failed to check exists"));
    }
}
