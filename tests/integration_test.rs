//! Integration tests for cart-kit
//!
//! These tests verify end-to-end cart behavior across store, repository and
//! the local key-value backends.

use cart_kit::backend::{CartBackend, FileBackend, InMemoryBackend};
use cart_kit::error::Error;
use cart_kit::legacy::LegacyCandidate;
use cart_kit::notify::{NoticeKind, RecordingNotifier};
use cart_kit::{
    CartKey, CartLineItem, CartRepository, CartService, CartStore, ItemType, Listing,
    LocalCartRepository, Result,
};
use rust_decimal::Decimal;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::Notify;

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn chair() -> Listing {
    Listing::new(ItemType::Free, "1", "Chair", Decimal::from(5))
}

fn phone() -> Listing {
    Listing::new(ItemType::Discount, "2", "Phone", Decimal::from(300))
}

fn bread() -> Listing {
    Listing::new(ItemType::Food, "3", "Bread", Decimal::from(10))
        .with_category("bakery")
        .with_location("Main St")
}

// Repository that can be switched into a failing mode.
#[derive(Clone)]
struct FlakyRepository {
    inner: LocalCartRepository<InMemoryBackend>,
    failing: Arc<AtomicBool>,
}

impl FlakyRepository {
    fn new(backend: InMemoryBackend) -> Self {
        FlakyRepository {
            inner: LocalCartRepository::new(backend),
            failing: Arc::new(AtomicBool::new(false)),
        }
    }

    fn check(&self) -> Result<()> {
        if self.failing.load(Ordering::SeqCst) {
            Err(Error::PersistenceWrite("storage quota exceeded".to_string()))
        } else {
            Ok(())
        }
    }
}

impl CartRepository for FlakyRepository {
    async fn load(&self) -> Result<Vec<CartLineItem>> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(Error::PersistenceRead("storage unavailable".to_string()));
        }
        self.inner.load().await
    }

    async fn insert(&self, item: &CartLineItem, next: &[CartLineItem]) -> Result<CartLineItem> {
        self.check()?;
        self.inner.insert(item, next).await
    }

    async fn update(&self, item: &CartLineItem, next: &[CartLineItem]) -> Result<CartLineItem> {
        self.check()?;
        self.inner.update(item, next).await
    }

    async fn remove(&self, item: &CartLineItem, next: &[CartLineItem]) -> Result<()> {
        self.check()?;
        self.inner.remove(item, next).await
    }

    async fn clear(&self, removed: &[CartLineItem]) -> Result<()> {
        self.check()?;
        self.inner.clear(removed).await
    }
}

// Repository whose next insert parks until released.
#[derive(Clone)]
struct GatedRepository {
    inner: LocalCartRepository<InMemoryBackend>,
    hold_next_insert: Arc<AtomicBool>,
    release: Arc<Notify>,
}

impl GatedRepository {
    fn new(backend: InMemoryBackend) -> Self {
        GatedRepository {
            inner: LocalCartRepository::new(backend),
            hold_next_insert: Arc::new(AtomicBool::new(false)),
            release: Arc::new(Notify::new()),
        }
    }
}

impl CartRepository for GatedRepository {
    async fn load(&self) -> Result<Vec<CartLineItem>> {
        self.inner.load().await
    }

    async fn insert(&self, item: &CartLineItem, next: &[CartLineItem]) -> Result<CartLineItem> {
        if self.hold_next_insert.swap(false, Ordering::SeqCst) {
            self.release.notified().await;
        }
        self.inner.insert(item, next).await
    }

    async fn update(&self, item: &CartLineItem, next: &[CartLineItem]) -> Result<CartLineItem> {
        self.inner.update(item, next).await
    }

    async fn remove(&self, item: &CartLineItem, next: &[CartLineItem]) -> Result<()> {
        self.inner.remove(item, next).await
    }

    async fn clear(&self, removed: &[CartLineItem]) -> Result<()> {
        self.inner.clear(removed).await
    }
}

async fn settle() {
    for _ in 0..10 {
        tokio::task::yield_now().await;
    }
}

// =============================================================================
// Scenarios
// =============================================================================

#[tokio::test]
async fn test_free_chair_scenario() {
    init_logging();
    let cart = CartService::open(LocalCartRepository::new(InMemoryBackend::new())).await;

    cart.add(chair()).await.expect("add");

    let items = cart.items().await;
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].item_type, ItemType::Free);
    assert_eq!(items[0].unit_price, Decimal::ZERO);
    assert_eq!(items[0].quantity, 1);
    assert_eq!(cart.total().await, Decimal::ZERO);
}

#[tokio::test]
async fn test_double_phone_scenario() {
    init_logging();
    let cart = CartService::open(LocalCartRepository::new(InMemoryBackend::new())).await;

    cart.add(phone()).await.expect("add");
    cart.add(phone()).await.expect("add");

    let items = cart.items().await;
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].quantity, 2);
    assert_eq!(cart.total().await, Decimal::from(600));
}

#[tokio::test]
async fn test_bread_scenario() {
    init_logging();
    let cart = CartService::open(LocalCartRepository::new(InMemoryBackend::new())).await;

    cart.add(bread()).await.expect("add");
    let key: CartKey = "food_3".parse().expect("key");

    cart.update_quantity(&key, 3).await.expect("update");
    assert_eq!(cart.total().await, Decimal::from(30));

    cart.remove(&key).await.expect("remove");
    assert!(cart.is_empty().await);
    assert_eq!(cart.total().await, Decimal::ZERO);

    // Second remove is a no-op
    assert_eq!(cart.remove(&key).await, Ok(None));
}

#[tokio::test]
async fn test_mixed_cart_total_and_clear() {
    init_logging();
    let cart = CartService::open(LocalCartRepository::new(InMemoryBackend::new())).await;

    cart.add(chair()).await.expect("add");
    cart.add(phone()).await.expect("add");
    cart.add(bread()).await.expect("add");
    cart.add(bread()).await.expect("add");

    assert_eq!(cart.items().await.len(), 3);
    assert_eq!(cart.item_count().await, 4);
    assert_eq!(cart.total().await, Decimal::from(320));

    // Insertion order is display order
    let order: Vec<String> = cart
        .items()
        .await
        .iter()
        .map(|item| item.key().to_string())
        .collect();
    assert_eq!(order, vec!["free_1", "discount_2", "food_3"]);

    cart.clear().await.expect("clear");
    assert!(cart.is_empty().await);
    assert_eq!(cart.total().await, Decimal::ZERO);
}

#[tokio::test]
async fn test_update_quantity_ignores_non_positive() {
    init_logging();
    let cart = CartService::open(LocalCartRepository::new(InMemoryBackend::new())).await;
    cart.add(bread()).await.expect("add");
    let key = CartKey::new(ItemType::Food, "3");

    assert_eq!(cart.update_quantity(&key, 0).await, Ok(None));
    assert_eq!(cart.update_quantity(&key, -1).await, Ok(None));
    assert_eq!(cart.get(&key).await.map(|i| i.quantity), Some(1));
}

#[tokio::test]
async fn test_legacy_candidate_is_inferred() {
    init_logging();
    let cart = CartService::open(LocalCartRepository::new(InMemoryBackend::new())).await;

    let payload = r#"{"id": 7, "title": "Soup", "price": "4.50", "expiry_date": "2026-01-01"}"#;
    let candidate: LegacyCandidate = serde_json::from_str(payload).expect("candidate");

    let outcome = cart.add(candidate.into()).await.expect("add");
    assert_eq!(outcome.item().key(), CartKey::new(ItemType::Food, "7"));
    assert_eq!(cart.total().await, Decimal::new(450, 2));
}

// =============================================================================
// Persistence round-trip
// =============================================================================

#[tokio::test]
async fn test_roundtrip_through_inmemory_backend() {
    init_logging();
    let backend = InMemoryBackend::new();

    let first = CartService::open(LocalCartRepository::new(backend.clone())).await;
    first.add(chair()).await.expect("add");
    first.add(phone()).await.expect("add");
    first.add(phone()).await.expect("add");
    let expected = first.items().await;

    let second = CartService::open(LocalCartRepository::new(backend.clone())).await;
    assert_eq!(second.items().await, expected);
    assert_eq!(second.total().await, Decimal::from(600));
}

#[tokio::test]
async fn test_roundtrip_through_file_backend() {
    init_logging();
    let dir = tempfile::tempdir().expect("tempdir");

    let expected = {
        let backend = FileBackend::open(dir.path()).await.expect("open");
        let cart = CartService::open(LocalCartRepository::for_user(backend, &42)).await;
        cart.add(bread()).await.expect("add");
        cart.update_quantity(&CartKey::new(ItemType::Food, "3"), 5)
            .await
            .expect("update");
        cart.items().await
    };

    let backend = FileBackend::open(dir.path()).await.expect("reopen");
    let cart = CartService::open(LocalCartRepository::for_user(backend, &42)).await;
    assert_eq!(cart.items().await, expected);
    assert_eq!(cart.total().await, Decimal::from(50));
    assert_eq!(
        cart.items().await[0].location.as_deref(),
        Some("Main St")
    );
}

#[tokio::test]
async fn test_malformed_snapshot_hydrates_empty() {
    init_logging();
    let backend = InMemoryBackend::new();
    backend
        .set("cart", b"not json at all".to_vec())
        .await
        .expect("set");

    let cart = CartService::open(LocalCartRepository::new(backend)).await;
    assert!(cart.is_empty().await);

    // The cart is usable afterwards
    cart.add(chair()).await.expect("add");
    assert_eq!(cart.items().await.len(), 1);
}

#[tokio::test]
async fn test_bad_rows_are_skipped_on_load() {
    init_logging();
    let backend = InMemoryBackend::new();
    let snapshot = r#"[
        {"item_id": "2", "item_type": "discount", "title": "Phone", "unit_price": 300, "quantity": 1},
        {"item_type": "food", "title": "No id"},
        {"item_id": "3", "item_type": "food", "title": "Bread", "unit_price": "10", "quantity": 2}
    ]"#;
    backend
        .set("cart", snapshot.as_bytes().to_vec())
        .await
        .expect("set");

    let cart = CartService::open(LocalCartRepository::new(backend)).await;
    assert_eq!(cart.items().await.len(), 2);
    assert_eq!(cart.total().await, Decimal::from(320));
}

// =============================================================================
// Confirmed writes
// =============================================================================

#[tokio::test]
async fn test_failed_write_leaves_memory_untouched() {
    init_logging();
    let backend = InMemoryBackend::new();
    let repo = FlakyRepository::new(backend.clone());
    let failing = repo.failing.clone();
    let notifier = Arc::new(RecordingNotifier::new());

    let store = CartStore::new(repo).with_notifier(Box::new(notifier.clone()));
    store.hydrate().await.expect("hydrate");
    store.add(phone()).await.expect("add");
    let before = store.snapshot().await;

    failing.store(true, Ordering::SeqCst);
    let key = CartKey::new(ItemType::Discount, "2");

    assert!(matches!(
        store.add(phone()).await,
        Err(Error::PersistenceWrite(_))
    ));
    assert!(matches!(
        store.add(bread()).await,
        Err(Error::PersistenceWrite(_))
    ));
    assert!(matches!(
        store.update_quantity(&key, 9).await,
        Err(Error::PersistenceWrite(_))
    ));
    assert!(matches!(
        store.remove(&key).await,
        Err(Error::PersistenceWrite(_))
    ));
    assert!(matches!(store.clear().await, Err(Error::PersistenceWrite(_))));

    assert_eq!(store.snapshot().await, before);
    assert_eq!(
        notifier.last().map(|n| n.kind),
        Some(NoticeKind::PersistenceFailed)
    );

    // Storage still matches memory
    failing.store(false, Ordering::SeqCst);
    let reloaded = LocalCartRepository::new(backend).load().await.expect("load");
    assert_eq!(reloaded, before.items);
}

#[tokio::test]
async fn test_failed_hydrate_still_becomes_ready() {
    init_logging();
    let repo = FlakyRepository::new(InMemoryBackend::new());
    repo.failing.store(true, Ordering::SeqCst);
    let failing = repo.failing.clone();
    let notifier = Arc::new(RecordingNotifier::new());

    let store = CartStore::new(repo).with_notifier(Box::new(notifier.clone()));
    assert!(matches!(
        store.hydrate().await,
        Err(Error::PersistenceRead(_))
    ));
    assert_eq!(store.state(), cart_kit::StoreState::Ready);
    assert!(store.is_empty().await);
    assert_eq!(
        notifier.last().map(|n| n.kind),
        Some(NoticeKind::PersistenceFailed)
    );

    failing.store(false, Ordering::SeqCst);
    store.add(chair()).await.expect("add");
    assert_eq!(store.items().await.len(), 1);
}

// =============================================================================
// Hydrating gate
// =============================================================================

#[tokio::test]
async fn test_mutation_queued_behind_forget_waits_for_hydrate() {
    init_logging();
    let backend = InMemoryBackend::new();

    // A stored cart of two rows
    let seed = CartService::open(LocalCartRepository::new(backend.clone())).await;
    seed.add(chair()).await.expect("add");
    seed.add(phone()).await.expect("add");

    let repo = GatedRepository::new(backend.clone());
    let hold = repo.hold_next_insert.clone();
    let release = repo.release.clone();
    let store = Arc::new(CartStore::new(repo));
    store.hydrate().await.expect("hydrate");
    assert_eq!(store.items().await.len(), 2);

    // 1. A write in flight
    hold.store(true, Ordering::SeqCst);
    let in_flight = {
        let store = store.clone();
        tokio::spawn(async move { store.add(bread()).await })
    };
    settle().await;

    // 2. Logout queued behind it
    let logout = {
        let store = store.clone();
        tokio::spawn(async move { store.forget().await })
    };
    settle().await;

    // 3. Another add queued behind the logout
    let queued = {
        let store = store.clone();
        tokio::spawn(async move {
            store
                .add(Listing::new(ItemType::Discount, "9", "Lamp", Decimal::from(20)))
                .await
        })
    };
    settle().await;

    release.notify_one();
    in_flight.await.expect("Task failed").expect("add");
    logout.await.expect("Task failed");
    settle().await;

    // The queued add must not have run against the forgotten cart
    assert_eq!(store.state(), cart_kit::StoreState::Hydrating);
    assert!(!queued.is_finished());
    let persisted = LocalCartRepository::new(backend.clone())
        .load()
        .await
        .expect("load");
    assert_eq!(persisted.len(), 3);

    // Once hydrated again it applies on top of everything stored
    store.hydrate().await.expect("hydrate");
    queued.await.expect("Task failed").expect("add");

    let keys: Vec<String> = LocalCartRepository::new(backend)
        .load()
        .await
        .expect("load")
        .iter()
        .map(|item| item.key().to_string())
        .collect();
    assert_eq!(keys, vec!["free_1", "discount_2", "food_3", "discount_9"]);
    assert_eq!(store.items().await.len(), 4);
}
