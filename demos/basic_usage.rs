//! Basic usage example of the cart store.
//!
//! Run with:
//!
//! ```bash
//! RUST_LOG=debug cargo run --example basic_usage
//! CART_STORAGE_DIR=/tmp/carts cargo run --example basic_usage   # persist to disk
//! ```

use cart_kit::backend::{FileBackend, InMemoryBackend};
use cart_kit::notify::{Notice, Notifier};
use cart_kit::{
    CartBackend, CartConfig, CartKey, CartService, ItemType, Listing, LocalCartRepository, Result,
};
use rust_decimal::Decimal;

/// Prints notices the way a UI would show toasts.
struct ConsoleNotifier;

impl Notifier for ConsoleNotifier {
    fn notify(&self, notice: Notice) {
        println!("  [toast:{:?}] {}", notice.level, notice);
    }
}

async fn run<B: CartBackend + 'static>(backend: B, config: &CartConfig) -> Result<()> {
    let repository = LocalCartRepository::with_key(backend, config.storage_key.clone());
    let cart = CartService::with_hooks(
        repository,
        Box::new(ConsoleNotifier),
        Box::new(cart_kit::observability::LogMetrics),
    );

    let restored = cart.hydrate().await.unwrap_or(0);
    println!("Restored {} rows from storage", restored);

    println!("\n=== Adding listings ===");
    cart.add(Listing::new(ItemType::Free, "1", "Wooden chair", Decimal::from(15)))
        .await?;
    cart.add(Listing::new(ItemType::Discount, "2", "Phone", Decimal::from(300)))
        .await?;
    cart.add(Listing::new(ItemType::Discount, "2", "Phone", Decimal::from(300)))
        .await?;
    cart.add(
        Listing::new(ItemType::Food, "3", "Sourdough", Decimal::new(450, 2))
            .with_category("bakery")
            .with_location("Market Square"),
    )
    .await?;

    print_cart(&cart).await;

    println!("\n=== Updating quantities ===");
    let bread: CartKey = "food_3".parse()?;
    cart.update_quantity(&bread, 3).await?;
    // Ignored: quantities below 1 never apply
    cart.update_quantity(&bread, 0).await?;
    print_cart(&cart).await;

    println!("\n=== Removing ===");
    cart.remove(&CartKey::new(ItemType::Free, "1")).await?;
    print_cart(&cart).await;

    Ok(())
}

async fn print_cart<B: CartBackend>(cart: &CartService<LocalCartRepository<B>>) {
    for item in cart.items().await {
        println!(
            "  {:<14} {:>3} × {:>7} = {:>8}",
            item.title,
            item.quantity,
            item.unit_price,
            item.line_total()
        );
    }
    println!(
        "  {} items, total {}",
        cart.item_count().await,
        cart.total().await
    );
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();

    let config = CartConfig::from_env()?;

    match &config.storage_dir {
        Some(dir) => {
            println!("Using file storage in {}", dir.display());
            run(FileBackend::open(dir.clone()).await?, &config).await
        }
        None => {
            println!("Using in-memory storage");
            run(InMemoryBackend::new(), &config).await
        }
    }
}
