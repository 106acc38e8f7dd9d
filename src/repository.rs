//! Cart repository trait: the persistence collaborator behind a store.
//!
//! The store computes every change in memory first, hands it to a
//! [`CartRepository`], and applies it only once the repository confirms.
//! Each method therefore receives both the row being changed and the full
//! snapshot that would result, so a repository can persist whichever it
//! needs:
//!
//! - [`LocalCartRepository`] writes the whole snapshot under one key of a
//!   [`CartBackend`] (the local-storage variant)
//! - [`crate::remote::RemoteCartRepository`] sends one REST call per row and
//!   returns the server's copy (the backend-backed variant)
//!
//! # Implementing CartRepository
//!
//! Return `Err` for any failure to persist; the store leaves memory untouched,
//! logs, and notifies the user. Return the row as stored (e.g. with a
//! server-assigned `record_id`) from `insert` and `update`; the store writes
//! that copy back into memory.

use crate::backend::CartBackend;
use crate::error::{Error, Result};
use crate::item::CartLineItem;
use crate::key::{StorageKeyBuilder, DEFAULT_STORAGE_KEY};
use crate::serialization::{decode_items, encode_items};
use std::fmt::Display;
use std::future::Future;

/// Trait for cart persistence implementations.
///
/// All futures are `Send` so stores can be refreshed from spawned tasks.
pub trait CartRepository: Send + Sync {
    /// Load the persisted cart.
    ///
    /// Returns an empty vector when nothing has been stored yet.
    ///
    /// # Errors
    /// Returns `Error::PersistenceRead` (or `AuthenticationRequired`) if the
    /// cart cannot be read.
    fn load(&self) -> impl Future<Output = Result<Vec<CartLineItem>>> + Send;

    /// Persist a newly appended row.
    ///
    /// `next` is the full cart including `item`.
    ///
    /// # Errors
    /// Returns `Error::PersistenceWrite` (or `AuthenticationRequired`) if the
    /// row cannot be stored.
    fn insert(
        &self,
        item: &CartLineItem,
        next: &[CartLineItem],
    ) -> impl Future<Output = Result<CartLineItem>> + Send;

    /// Persist a quantity change on an existing row.
    ///
    /// `item` already carries the new quantity; `next` is the full cart.
    ///
    /// # Errors
    /// Returns `Error::PersistenceWrite` (or `AuthenticationRequired`) if the
    /// change cannot be stored.
    fn update(
        &self,
        item: &CartLineItem,
        next: &[CartLineItem],
    ) -> impl Future<Output = Result<CartLineItem>> + Send;

    /// Persist the removal of one row.
    ///
    /// `next` is the full cart without `item`.
    ///
    /// # Errors
    /// Returns `Error::PersistenceWrite` (or `AuthenticationRequired`) if the
    /// removal cannot be stored.
    fn remove(
        &self,
        item: &CartLineItem,
        next: &[CartLineItem],
    ) -> impl Future<Output = Result<()>> + Send;

    /// Persist an empty cart. `removed` is everything that was in it.
    ///
    /// # Errors
    /// Returns `Error::PersistenceWrite` (or `AuthenticationRequired`) if the
    /// cart cannot be emptied.
    fn clear(&self, removed: &[CartLineItem]) -> impl Future<Output = Result<()>> + Send;
}

// ============================================================================
// Snapshot repository over a key-value backend
// ============================================================================

/// Stores the whole cart as one JSON array under a single key.
///
/// # Example
///
/// ```ignore
/// use cart_kit::backend::InMemoryBackend;
/// use cart_kit::repository::LocalCartRepository;
///
/// let repo = LocalCartRepository::new(InMemoryBackend::new());
/// let user_repo = LocalCartRepository::for_user(InMemoryBackend::new(), &42);
/// ```
#[derive(Clone)]
pub struct LocalCartRepository<B: CartBackend> {
    backend: B,
    key: String,
}

impl<B: CartBackend> LocalCartRepository<B> {
    /// Per-session cart under the default `cart` key.
    pub fn new(backend: B) -> Self {
        Self::with_key(backend, StorageKeyBuilder::session(DEFAULT_STORAGE_KEY))
    }

    /// Cart under a custom key.
    pub fn with_key(backend: B, key: impl Into<String>) -> Self {
        LocalCartRepository {
            backend,
            key: key.into(),
        }
    }

    /// Per-user cart under `cart:{user}`.
    pub fn for_user(backend: B, user: &dyn Display) -> Self {
        Self::with_key(
            backend,
            StorageKeyBuilder::for_user(DEFAULT_STORAGE_KEY, user),
        )
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    async fn write_snapshot(&self, items: &[CartLineItem]) -> Result<()> {
        let bytes = encode_items(items).map_err(|e| Error::PersistenceWrite(e.to_string()))?;
        self.backend
            .set(&self.key, bytes)
            .await
            .map_err(|e| Error::PersistenceWrite(e.to_string()))
    }
}

impl<B: CartBackend> CartRepository for LocalCartRepository<B> {
    async fn load(&self) -> Result<Vec<CartLineItem>> {
        match self.backend.get(&self.key).await {
            Ok(Some(bytes)) => Ok(decode_items(&bytes)),
            Ok(None) => {
                debug!("No stored cart under {}", self.key);
                Ok(Vec::new())
            }
            Err(e) => Err(Error::PersistenceRead(e.to_string())),
        }
    }

    async fn insert(&self, item: &CartLineItem, next: &[CartLineItem]) -> Result<CartLineItem> {
        self.write_snapshot(next).await?;
        Ok(item.clone())
    }

    async fn update(&self, item: &CartLineItem, next: &[CartLineItem]) -> Result<CartLineItem> {
        self.write_snapshot(next).await?;
        Ok(item.clone())
    }

    async fn remove(&self, _item: &CartLineItem, next: &[CartLineItem]) -> Result<()> {
        self.write_snapshot(next).await
    }

    async fn clear(&self, _removed: &[CartLineItem]) -> Result<()> {
        self.write_snapshot(&[]).await
    }
}
