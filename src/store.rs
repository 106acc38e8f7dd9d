//! Cart store - the authoritative in-memory cart.

use crate::auth::Credentials;
use crate::error::{Error, Result};
use crate::item::CartLineItem;
use crate::key::CartKey;
use crate::listing::Listing;
use crate::notify::{LogNotifier, Notice, NoticeKind, Notifier};
use crate::observability::{CartMetrics, NoOpMetrics};
use crate::repository::CartRepository;
use rust_decimal::Decimal;
use std::future::Future;
use std::time::Instant;
use tokio::sync::{watch, Mutex, MutexGuard, RwLock};

/// Lifecycle state of a store.
///
/// There is no error state: failures are per operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreState {
    /// Initial load in progress. Mutations wait until it finishes.
    Hydrating,
    /// Operations apply immediately.
    Ready,
}

/// Immutable view of the cart at one point in time.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CartSnapshot {
    pub items: Vec<CartLineItem>,
}

impl CartSnapshot {
    /// `Σ unit_price × quantity`.
    pub fn total(&self) -> Decimal {
        self.items.iter().map(CartLineItem::line_total).sum()
    }

    /// `Σ quantity`, what the cart badge shows.
    pub fn item_count(&self) -> u32 {
        self.items
            .iter()
            .fold(0u32, |acc, item| acc.saturating_add(item.quantity))
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn get(&self, key: &CartKey) -> Option<&CartLineItem> {
        self.items.iter().find(|item| item.matches(key))
    }
}

/// Items and total captured at checkout.
pub type CheckoutSummary = CartSnapshot;

/// What `add()` did.
#[derive(Debug, Clone, PartialEq)]
pub enum AddOutcome {
    /// A new row was appended with quantity 1.
    Added(CartLineItem),
    /// The key was already present; its quantity went up by one.
    QuantityIncreased(CartLineItem),
}

impl AddOutcome {
    pub fn item(&self) -> &CartLineItem {
        match self {
            AddOutcome::Added(item) | AddOutcome::QuantityIncreased(item) => item,
        }
    }
}

/// The cart store.
///
/// Holds the line items, enforces the `(item_type, item_id)` merge rule and
/// pushes every change through a [`CartRepository`].
///
/// Changes are *confirmed*: the next state is computed, handed to the
/// repository, and only written to memory once the repository succeeds. A
/// failed write leaves memory exactly as it was, so memory and storage never
/// diverge.
///
/// Mutations are serialized. A second call made while the first is still
/// waiting on persistence queues behind it and is computed from the state
/// the first one confirmed.
///
/// Share one store per session via [`crate::CartService`] (or an `Arc`).
///
/// # Example
///
/// ```ignore
/// use cart_kit::{CartStore, Listing, ItemType};
/// use cart_kit::backend::InMemoryBackend;
/// use cart_kit::repository::LocalCartRepository;
/// use rust_decimal::Decimal;
///
/// let store = CartStore::new(LocalCartRepository::new(InMemoryBackend::new()));
/// store.hydrate().await?;
///
/// store.add(Listing::new(ItemType::Discount, "2", "Phone", Decimal::from(300))).await?;
/// store.add(Listing::new(ItemType::Discount, "2", "Phone", Decimal::from(300))).await?;
/// assert_eq!(store.total().await, Decimal::from(600));
/// ```
pub struct CartStore<R: CartRepository> {
    repository: R,
    items: RwLock<Vec<CartLineItem>>,
    ops: Mutex<()>,
    state: watch::Sender<StoreState>,
    notifier: Box<dyn Notifier>,
    metrics: Box<dyn CartMetrics>,
}

impl<R: CartRepository> CartStore<R> {
    /// Create a store in the `Hydrating` state.
    ///
    /// Call [`hydrate`](Self::hydrate) to load persisted items; mutations
    /// issued before that wait for it.
    pub fn new(repository: R) -> Self {
        let (state, _) = watch::channel(StoreState::Hydrating);
        CartStore {
            repository,
            items: RwLock::new(Vec::new()),
            ops: Mutex::new(()),
            state,
            notifier: Box::new(LogNotifier),
            metrics: Box::new(NoOpMetrics),
        }
    }

    /// Set the sink for user-visible notices.
    pub fn with_notifier(mut self, notifier: Box<dyn Notifier>) -> Self {
        self.notifier = notifier;
        self
    }

    /// Set custom metrics handler.
    pub fn with_metrics(mut self, metrics: Box<dyn CartMetrics>) -> Self {
        self.metrics = metrics;
        self
    }

    pub fn repository(&self) -> &R {
        &self.repository
    }

    pub fn state(&self) -> StoreState {
        *self.state.borrow()
    }

    /// Wait until the store is `Ready`.
    pub async fn ready(&self) {
        let mut rx = self.state.subscribe();
        let reached = rx
            .wait_for(|state| *state == StoreState::Ready)
            .await
            .is_ok();
        if !reached {
            warn!("Cart state channel closed while waiting for hydration");
        }
    }

    // ========================================================================
    // Lifecycle
    // ========================================================================

    /// Load persisted items and move to `Ready`.
    ///
    /// On failure the store still becomes `Ready`, with an empty cart, and
    /// the error is logged, notified and returned.
    ///
    /// # Errors
    ///
    /// - `Error::PersistenceRead`: the repository could not be read
    /// - `Error::AuthenticationRequired`: the repository needs a session
    pub async fn hydrate(&self) -> Result<usize> {
        let _guard = self.ops.lock().await;
        let timer = Instant::now();

        let result = self.repository.load().await;
        let outcome = match result {
            Ok(items) => {
                let count = items.len();
                self.metrics.record_load(count, timer.elapsed());
                *self.items.write().await = items;
                info!("✓ Cart hydrated with {} rows in {:?}", count, timer.elapsed());
                Ok(count)
            }
            Err(e) => {
                error!("✗ Cart hydration failed: {}", e);
                self.metrics.record_error("load", &e.to_string());
                self.notify_failure(&e, "Could not load your cart");
                self.items.write().await.clear();
                Err(e)
            }
        };

        self.state.send_replace(StoreState::Ready);
        outcome
    }

    /// Replace memory with what the repository currently holds.
    ///
    /// Failures are logged and returned; memory is kept as it was.
    ///
    /// # Errors
    ///
    /// Same as [`hydrate`](Self::hydrate).
    pub async fn refresh(&self) -> Result<usize> {
        let _guard = self.lock_ready().await;
        let timer = Instant::now();

        match self.repository.load().await {
            Ok(items) => {
                let count = items.len();
                self.metrics.record_load(count, timer.elapsed());
                *self.items.write().await = items;
                debug!("✓ Cart refreshed: {} rows", count);
                Ok(count)
            }
            Err(e) => {
                warn!("✗ Cart refresh failed, keeping current items: {}", e);
                self.metrics.record_error("refresh", &e.to_string());
                Err(e)
            }
        }
    }

    /// Drop in-memory items without touching persistence and go back to
    /// `Hydrating`.
    ///
    /// Used at logout: the server keeps the user's cart, this session forgets
    /// it, and the next [`hydrate`](Self::hydrate) loads whoever signs in.
    pub async fn forget(&self) {
        let _guard = self.ops.lock().await;
        self.items.write().await.clear();
        self.state.send_replace(StoreState::Hydrating);
        debug!("Cart forgotten, back to hydrating");
    }

    // ========================================================================
    // Reads
    // ========================================================================

    /// Current line items, in display order.
    pub async fn items(&self) -> Vec<CartLineItem> {
        self.items.read().await.clone()
    }

    pub async fn snapshot(&self) -> CartSnapshot {
        CartSnapshot {
            items: self.items().await,
        }
    }

    /// Derived total. Always recomputed from the items.
    pub async fn total(&self) -> Decimal {
        self.items
            .read()
            .await
            .iter()
            .map(CartLineItem::line_total)
            .sum()
    }

    pub async fn item_count(&self) -> u32 {
        self.snapshot().await.item_count()
    }

    pub async fn is_empty(&self) -> bool {
        self.items.read().await.is_empty()
    }

    pub async fn get(&self, key: &CartKey) -> Option<CartLineItem> {
        self.items
            .read()
            .await
            .iter()
            .find(|item| item.matches(key))
            .cloned()
    }

    // ========================================================================
    // Mutations
    // ========================================================================

    /// Add one unit of a listing.
    ///
    /// A new key is appended with quantity 1 (unit price 0 for free
    /// listings). An existing key gets quantity + 1 and keeps its price.
    ///
    /// # Errors
    ///
    /// - `Error::InvalidItem`: missing id or negative price; nothing changes
    /// - `Error::PersistenceWrite`: the repository refused; nothing changes
    /// - `Error::AuthenticationRequired`: the repository needs a session
    pub async fn add(&self, listing: Listing) -> Result<AddOutcome> {
        let candidate = match listing.into_line_item() {
            Ok(candidate) => candidate,
            Err(e) => {
                error!("✗ Invalid item added to cart: {}", e);
                self.notifier.notify(Notice::error(
                    NoticeKind::InvalidItem,
                    "This item cannot be added to the cart",
                ));
                return Err(e);
            }
        };

        let _guard = self.lock_ready().await;

        let key = candidate.key();
        let mut next = self.items.read().await.clone();

        let outcome = match next.iter().position(|item| item.matches(&key)) {
            Some(index) => {
                let mut updated = next[index].clone();
                updated.quantity = updated.quantity.saturating_add(1);
                next[index] = updated.clone();

                let confirmed = self
                    .persist(
                        "add",
                        "Failed to update item quantity",
                        self.repository.update(&updated, &next),
                    )
                    .await?;
                next[index] = confirmed.clone();
                AddOutcome::QuantityIncreased(confirmed)
            }
            None => {
                next.push(candidate.clone());

                let confirmed = self
                    .persist(
                        "add",
                        "Failed to add item to cart",
                        self.repository.insert(&candidate, &next),
                    )
                    .await?;
                if let Some(last) = next.last_mut() {
                    *last = confirmed.clone();
                }
                AddOutcome::Added(confirmed)
            }
        };

        *self.items.write().await = next;

        let notice = match &outcome {
            AddOutcome::Added(item) => Notice::success(
                NoticeKind::Added,
                format!("{} added to cart", item.title),
            ),
            AddOutcome::QuantityIncreased(item) => Notice::success(
                NoticeKind::QuantityUpdated,
                format!("{} quantity updated to {}", item.title, item.quantity),
            ),
        };
        debug!("✓ Cart add {} -> {:?}", key, notice.kind);
        self.notifier.notify(notice);

        Ok(outcome)
    }

    /// Remove the row with `key`.
    ///
    /// Returns the removed row, or `None` if the key was not in the cart
    /// (a silent no-op).
    ///
    /// # Errors
    ///
    /// - `Error::PersistenceWrite`: the repository refused; nothing changes
    /// - `Error::AuthenticationRequired`: the repository needs a session
    pub async fn remove(&self, key: &CartKey) -> Result<Option<CartLineItem>> {
        let _guard = self.lock_ready().await;

        let mut next = self.items.read().await.clone();
        let Some(index) = next.iter().position(|item| item.matches(key)) else {
            debug!("Cart remove {} -> not present", key);
            return Ok(None);
        };

        let removed = next.remove(index);
        self.persist(
            "remove",
            "Failed to remove item from cart",
            self.repository.remove(&removed, &next),
        )
        .await?;

        *self.items.write().await = next;

        self.notifier.notify(Notice::info(
            NoticeKind::Removed,
            format!("{} removed from cart", removed.title),
        ));
        Ok(Some(removed))
    }

    /// Set the quantity of the row with `key`.
    ///
    /// `quantity < 1` is ignored: no change, no error, no notice. An absent
    /// key is also a silent no-op. Returns the updated row when something
    /// changed.
    ///
    /// # Errors
    ///
    /// - `Error::PersistenceWrite`: the repository refused; nothing changes
    /// - `Error::AuthenticationRequired`: the repository needs a session
    pub async fn update_quantity(
        &self,
        key: &CartKey,
        quantity: i64,
    ) -> Result<Option<CartLineItem>> {
        if quantity < 1 {
            debug!("Cart update {} to {} ignored", key, quantity);
            return Ok(None);
        }
        let quantity = u32::try_from(quantity).unwrap_or(u32::MAX);

        let _guard = self.lock_ready().await;

        let mut next = self.items.read().await.clone();
        let Some(index) = next.iter().position(|item| item.matches(key)) else {
            debug!("Cart update {} -> not present", key);
            return Ok(None);
        };

        let mut updated = next[index].clone();
        updated.quantity = quantity;
        next[index] = updated.clone();

        let confirmed = self
            .persist(
                "update_quantity",
                "Failed to update item quantity",
                self.repository.update(&updated, &next),
            )
            .await?;
        next[index] = confirmed.clone();

        *self.items.write().await = next;

        self.notifier.notify(Notice::success(
            NoticeKind::QuantityUpdated,
            format!("{} quantity updated to {}", confirmed.title, confirmed.quantity),
        ));
        Ok(Some(confirmed))
    }

    /// Empty the cart unconditionally.
    ///
    /// # Errors
    ///
    /// - `Error::PersistenceWrite`: the repository refused; nothing changes
    /// - `Error::AuthenticationRequired`: the repository needs a session
    pub async fn clear(&self) -> Result<()> {
        let _guard = self.lock_ready().await;

        let current = self.items.read().await.clone();
        self.clear_locked(&current).await?;

        self.notifier
            .notify(Notice::info(NoticeKind::Cleared, "Cart cleared"));
        Ok(())
    }

    /// Hand the cart over for payment and empty it.
    ///
    /// Requires a signed-in session and at least one item. Returns the items
    /// and total as they were at checkout. Payment itself happens elsewhere.
    ///
    /// # Errors
    ///
    /// - `Error::AuthenticationRequired`: not signed in
    /// - `Error::EmptyCart`: nothing to check out
    /// - `Error::PersistenceWrite`: the cart could not be emptied; nothing
    ///   changes
    pub async fn checkout(&self, credentials: &dyn Credentials) -> Result<CheckoutSummary> {
        if !credentials.is_authenticated() {
            self.notify_failure(&Error::AuthenticationRequired, "Please sign in to check out");
            return Err(Error::AuthenticationRequired);
        }

        let _guard = self.lock_ready().await;

        let current = self.items.read().await.clone();
        if current.is_empty() {
            self.notifier
                .notify(Notice::info(NoticeKind::EmptyCart, "Your cart is empty"));
            return Err(Error::EmptyCart);
        }

        let summary = CartSnapshot { items: current };
        self.clear_locked(&summary.items).await?;

        info!(
            "✓ Checkout: {} rows, total {}",
            summary.items.len(),
            summary.total()
        );
        self.notifier.notify(Notice::success(
            NoticeKind::CheckedOut,
            format!(
                "Order placed: {} items, total {}",
                summary.item_count(),
                summary.total()
            ),
        ));
        Ok(summary)
    }

    // ========================================================================
    // Internals
    // ========================================================================

    /// Take `ops` once the store is `Ready`.
    ///
    /// A `forget()` queued ahead of us can flip the store back to `Hydrating`
    /// between the wait and the lock, so the state is checked again under the
    /// lock and we go back to waiting if it changed.
    async fn lock_ready(&self) -> MutexGuard<'_, ()> {
        loop {
            self.ready().await;
            let guard = self.ops.lock().await;
            if self.state() == StoreState::Ready {
                return guard;
            }
            drop(guard);
            debug!("Cart went back to hydrating while queued, waiting again");
        }
    }

    /// Caller must hold `ops`.
    async fn clear_locked(&self, current: &[CartLineItem]) -> Result<()> {
        self.persist(
            "clear",
            "Failed to clear cart",
            self.repository.clear(current),
        )
        .await?;
        self.items.write().await.clear();
        Ok(())
    }

    /// Await a repository call, timing it and turning failures into notices.
    async fn persist<T>(
        &self,
        operation: &str,
        failure_message: &str,
        call: impl Future<Output = Result<T>>,
    ) -> Result<T> {
        let timer = Instant::now();
        match call.await {
            Ok(value) => {
                self.metrics.record_persist(operation, timer.elapsed());
                Ok(value)
            }
            Err(e) => {
                error!("✗ Cart {} failed: {}", operation, e);
                self.metrics.record_error(operation, &e.to_string());
                self.notify_failure(&e, failure_message);
                Err(e)
            }
        }
    }

    fn notify_failure(&self, error: &Error, message: &str) {
        let notice = match error {
            Error::AuthenticationRequired => Notice::error(
                NoticeKind::SignInRequired,
                "Please sign in to manage your cart",
            ),
            _ => Notice::error(NoticeKind::PersistenceFailed, message),
        };
        self.notifier.notify(notice);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::InMemoryBackend;
    use crate::item::ItemType;
    use crate::notify::{NoticeLevel, RecordingNotifier};
    use crate::repository::LocalCartRepository;
    use std::sync::Arc;

    fn listing(item_type: ItemType, id: &str, title: &str, price: i64) -> Listing {
        Listing::new(item_type, id, title, Decimal::from(price))
    }

    async fn ready_store() -> (
        CartStore<LocalCartRepository<InMemoryBackend>>,
        Arc<RecordingNotifier>,
    ) {
        let notifier = Arc::new(RecordingNotifier::new());
        let store = CartStore::new(LocalCartRepository::new(InMemoryBackend::new()))
            .with_notifier(Box::new(notifier.clone()));
        store.hydrate().await.expect("hydrate");
        (store, notifier)
    }

    #[tokio::test]
    async fn test_new_store_is_hydrating() {
        let store = CartStore::new(LocalCartRepository::new(InMemoryBackend::new()));
        assert_eq!(store.state(), StoreState::Hydrating);
        store.hydrate().await.expect("hydrate");
        assert_eq!(store.state(), StoreState::Ready);
    }

    #[tokio::test]
    async fn test_add_free_item_forces_zero_price() {
        let (store, notifier) = ready_store().await;

        let outcome = store
            .add(listing(ItemType::Free, "1", "Chair", 5))
            .await
            .expect("add");

        assert!(matches!(outcome, AddOutcome::Added(_)));
        assert_eq!(outcome.item().unit_price, Decimal::ZERO);
        assert_eq!(outcome.item().quantity, 1);
        assert_eq!(store.total().await, Decimal::ZERO);
        assert_eq!(
            notifier.last().map(|n| n.kind),
            Some(NoticeKind::Added)
        );
    }

    #[tokio::test]
    async fn test_add_same_key_increments_quantity() {
        let (store, notifier) = ready_store().await;

        store
            .add(listing(ItemType::Discount, "2", "Phone", 300))
            .await
            .expect("add");
        let outcome = store
            .add(listing(ItemType::Discount, "2", "Phone", 300))
            .await
            .expect("add");

        assert!(matches!(outcome, AddOutcome::QuantityIncreased(_)));
        assert_eq!(store.items().await.len(), 1);
        assert_eq!(store.total().await, Decimal::from(600));
        assert_eq!(store.item_count().await, 2);
        assert_eq!(
            notifier.last().map(|n| n.kind),
            Some(NoticeKind::QuantityUpdated)
        );
    }

    #[tokio::test]
    async fn test_add_keeps_first_price() {
        let (store, _) = ready_store().await;

        store
            .add(listing(ItemType::Discount, "2", "Phone", 300))
            .await
            .expect("add");
        store
            .add(listing(ItemType::Discount, "2", "Phone", 250))
            .await
            .expect("add");

        let key = CartKey::new(ItemType::Discount, "2");
        let row = store.get(&key).await.expect("row present");
        assert_eq!(row.unit_price, Decimal::from(300));
        assert_eq!(row.quantity, 2);
    }

    #[tokio::test]
    async fn test_same_id_different_type_are_separate_rows() {
        let (store, _) = ready_store().await;

        store
            .add(listing(ItemType::Free, "3", "Lamp", 0))
            .await
            .expect("add");
        store
            .add(listing(ItemType::Food, "3", "Bread", 10))
            .await
            .expect("add");

        let items = store.items().await;
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].item_type, ItemType::Free);
        assert_eq!(items[1].item_type, ItemType::Food);
    }

    #[tokio::test]
    async fn test_add_invalid_item_changes_nothing() {
        let (store, notifier) = ready_store().await;
        let mut bad = listing(ItemType::Food, "3", "Bread", 10);
        bad.id = None;

        let result = store.add(bad).await;
        assert!(matches!(result, Err(Error::InvalidItem(_))));
        assert!(store.is_empty().await);

        let notice = notifier.last().expect("notice");
        assert_eq!(notice.kind, NoticeKind::InvalidItem);
        assert_eq!(notice.level, NoticeLevel::Error);
    }

    #[tokio::test]
    async fn test_bread_scenario() {
        let (store, _) = ready_store().await;

        store
            .add(listing(ItemType::Food, "3", "Bread", 10))
            .await
            .expect("add");

        let key: CartKey = "food_3".parse().expect("key");
        let updated = store
            .update_quantity(&key, 3)
            .await
            .expect("update")
            .expect("row updated");
        assert_eq!(updated.quantity, 3);
        assert_eq!(store.total().await, Decimal::from(30));

        let removed = store.remove(&key).await.expect("remove");
        assert!(removed.is_some());
        assert!(store.is_empty().await);
        assert_eq!(store.total().await, Decimal::ZERO);
    }

    #[tokio::test]
    async fn test_remove_twice_is_noop() {
        let (store, _) = ready_store().await;
        store
            .add(listing(ItemType::Food, "3", "Bread", 10))
            .await
            .expect("add");
        let key = CartKey::new(ItemType::Food, "3");

        assert!(store.remove(&key).await.expect("remove").is_some());
        assert!(store.remove(&key).await.expect("remove").is_none());
    }

    #[tokio::test]
    async fn test_update_quantity_below_one_ignored() {
        let (store, notifier) = ready_store().await;
        store
            .add(listing(ItemType::Food, "3", "Bread", 10))
            .await
            .expect("add");
        notifier.drain();
        let key = CartKey::new(ItemType::Food, "3");
        let before = store.snapshot().await;

        assert!(store.update_quantity(&key, 0).await.expect("update").is_none());
        assert!(store.update_quantity(&key, -1).await.expect("update").is_none());

        assert_eq!(store.snapshot().await, before);
        assert!(notifier.drain().is_empty());
    }

    #[tokio::test]
    async fn test_update_quantity_absent_key_is_noop() {
        let (store, _) = ready_store().await;
        let key = CartKey::new(ItemType::Food, "404");
        assert!(store.update_quantity(&key, 2).await.expect("update").is_none());
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn test_clear() {
        let (store, notifier) = ready_store().await;
        store
            .add(listing(ItemType::Discount, "2", "Phone", 300))
            .await
            .expect("add");
        store
            .add(listing(ItemType::Food, "3", "Bread", 10))
            .await
            .expect("add");

        store.clear().await.expect("clear");

        assert!(store.is_empty().await);
        assert_eq!(store.total().await, Decimal::ZERO);
        assert_eq!(notifier.last().map(|n| n.kind), Some(NoticeKind::Cleared));
    }

    #[tokio::test]
    async fn test_snapshot_get() {
        let (store, _) = ready_store().await;
        store
            .add(listing(ItemType::Food, "3", "Bread", 10))
            .await
            .expect("add");

        let snapshot = store.snapshot().await;
        assert!(snapshot.get(&CartKey::new(ItemType::Food, "3")).is_some());
        assert!(snapshot.get(&CartKey::new(ItemType::Free, "3")).is_none());
    }
}
