//! Shared cart handle for applications.
//!
//! Provides a convenient wrapper around CartStore with Arc for easy sharing.

use crate::auth::Credentials;
use crate::error::Result;
use crate::item::CartLineItem;
use crate::key::CartKey;
use crate::listing::Listing;
use crate::notify::Notifier;
use crate::observability::CartMetrics;
use crate::refresh::RefreshHandle;
use crate::repository::CartRepository;
use crate::store::{AddOutcome, CartSnapshot, CartStore, CheckoutSummary, StoreState};
use rust_decimal::Decimal;
use std::sync::Arc;
use std::time::Duration;

/// Shared cart handle.
///
/// Wraps `CartStore` in `Arc` so every consumer (cart page, listing pages,
/// header badge, checkout) sees the same state. Construct one per session and
/// pass clones around; there is no global instance.
///
/// # Example
///
/// ```ignore
/// use cart_kit::{CartService, Listing, ItemType};
/// use cart_kit::backend::InMemoryBackend;
/// use cart_kit::repository::LocalCartRepository;
///
/// let cart = CartService::open(LocalCartRepository::new(InMemoryBackend::new())).await;
///
/// // In your page struct
/// pub struct ListingPage {
///     cart: CartService<LocalCartRepository<InMemoryBackend>>,
/// }
///
/// impl ListingPage {
///     pub async fn on_add_clicked(&self, listing: Listing) {
///         // Failures are already logged and notified.
///         let _ = self.cart.add(listing).await;
///     }
/// }
/// ```
pub struct CartService<R: CartRepository> {
    store: Arc<CartStore<R>>,
}

impl<R: CartRepository> Clone for CartService<R> {
    fn clone(&self) -> Self {
        CartService {
            store: Arc::clone(&self.store),
        }
    }
}

impl<R: CartRepository> CartService<R> {
    /// Create a service around a new store. The store starts `Hydrating`.
    pub fn new(repository: R) -> Self {
        Self::from_store(CartStore::new(repository))
    }

    /// Create a service around a preconfigured store.
    pub fn from_store(store: CartStore<R>) -> Self {
        CartService {
            store: Arc::new(store),
        }
    }

    /// Create a service with custom notifier and metrics.
    pub fn with_hooks(
        repository: R,
        notifier: Box<dyn Notifier>,
        metrics: Box<dyn CartMetrics>,
    ) -> Self {
        Self::from_store(
            CartStore::new(repository)
                .with_notifier(notifier)
                .with_metrics(metrics),
        )
    }

    /// Create a service and hydrate it.
    ///
    /// A failed load has already been logged and notified and leaves an empty,
    /// ready cart, so this never fails.
    pub async fn open(repository: R) -> Self {
        let service = Self::new(repository);
        let _ = service.store.hydrate().await;
        service
    }

    // Lifecycle

    pub async fn hydrate(&self) -> Result<usize> {
        self.store.hydrate().await
    }

    pub async fn refresh(&self) -> Result<usize> {
        self.store.refresh().await
    }

    pub async fn forget(&self) {
        self.store.forget().await
    }

    pub fn state(&self) -> StoreState {
        self.store.state()
    }

    // Reads

    pub async fn items(&self) -> Vec<CartLineItem> {
        self.store.items().await
    }

    pub async fn snapshot(&self) -> CartSnapshot {
        self.store.snapshot().await
    }

    pub async fn total(&self) -> Decimal {
        self.store.total().await
    }

    pub async fn item_count(&self) -> u32 {
        self.store.item_count().await
    }

    pub async fn is_empty(&self) -> bool {
        self.store.is_empty().await
    }

    pub async fn get(&self, key: &CartKey) -> Option<CartLineItem> {
        self.store.get(key).await
    }

    // Mutations

    /// See [`CartStore::add`].
    pub async fn add(&self, listing: Listing) -> Result<AddOutcome> {
        self.store.add(listing).await
    }

    /// See [`CartStore::remove`].
    pub async fn remove(&self, key: &CartKey) -> Result<Option<CartLineItem>> {
        self.store.remove(key).await
    }

    /// See [`CartStore::update_quantity`].
    pub async fn update_quantity(
        &self,
        key: &CartKey,
        quantity: i64,
    ) -> Result<Option<CartLineItem>> {
        self.store.update_quantity(key, quantity).await
    }

    /// See [`CartStore::clear`].
    pub async fn clear(&self) -> Result<()> {
        self.store.clear().await
    }

    /// See [`CartStore::checkout`].
    pub async fn checkout(&self, credentials: &dyn Credentials) -> Result<CheckoutSummary> {
        self.store.checkout(credentials).await
    }

    /// Get a reference to the underlying store.
    pub fn store(&self) -> &CartStore<R> {
        &self.store
    }
}

impl<R: CartRepository + 'static> CartService<R> {
    /// Start re-reading persistence every `period`.
    ///
    /// Keep the returned handle alive for as long as refreshes should run.
    pub fn spawn_refresh(&self, period: Duration) -> RefreshHandle {
        RefreshHandle::spawn(Arc::clone(&self.store), period)
    }
}
