//! # cart-kit
//!
//! A client-side shopping cart for a community marketplace of free items,
//! discounted items and food listings.
//!
//! ## Features
//!
//! - **Composite identity:** rows are keyed by `(item_type, item_id)`, so a
//!   free chair and a food item with the same id never collide
//! - **Confirmed writes:** every change is persisted before it becomes
//!   visible; a failed write leaves the cart untouched
//! - **Pluggable persistence:** local snapshots (in-memory, file, Redis) or
//!   the marketplace REST API, behind one [`CartRepository`] trait
//! - **Derived total:** always `Σ unit_price × quantity`, never stored
//! - **Non-blocking notices:** confirmations and failures go to a
//!   [`Notifier`] instead of panicking or blocking
//!
//! ## Quick Start
//!
//! ```ignore
//! use cart_kit::{CartService, CartKey, ItemType, Listing};
//! use cart_kit::backend::InMemoryBackend;
//! use cart_kit::repository::LocalCartRepository;
//! use rust_decimal::Decimal;
//!
//! // 1. Open the cart (loads whatever was persisted)
//! let cart = CartService::open(LocalCartRepository::new(InMemoryBackend::new())).await;
//!
//! // 2. Add listings
//! cart.add(Listing::new(ItemType::Food, "3", "Bread", Decimal::from(10))).await?;
//!
//! // 3. Adjust and read back
//! let key: CartKey = "food_3".parse()?;
//! cart.update_quantity(&key, 3).await?;
//! assert_eq!(cart.total().await, Decimal::from(30));
//!
//! // 4. Share it - CartService is Clone
//! let badge = cart.clone();
//! assert_eq!(badge.item_count().await, 3);
//! ```
//!
//! ### Backend-backed carts
//!
//! ```ignore
//! use cart_kit::auth::Session;
//! use cart_kit::remote::{RemoteCartRepository, RemoteConfig};
//! use std::sync::Arc;
//!
//! let session = Session::with_token(access_token);
//! let repo = RemoteCartRepository::new(
//!     RemoteConfig::new("https://marketplace.example"),
//!     Arc::new(session.clone()),
//! );
//! let cart = CartService::open(repo).await;
//! let _refresh = cart.spawn_refresh(Duration::from_secs(60));
//! ```

#[macro_use]
extern crate log;

pub mod auth;
pub mod backend;
pub mod config;
pub mod error;
pub mod item;
pub mod key;
pub mod legacy;
pub mod listing;
pub mod notify;
pub mod observability;
pub mod refresh;
pub mod remote;
pub mod repository;
pub mod serialization;
pub mod service;
pub mod store;

// Re-exports for convenience
pub use backend::CartBackend;
pub use config::CartConfig;
pub use error::{Error, Result};
pub use item::{CartLineItem, ItemType};
pub use key::CartKey;
pub use listing::Listing;
pub use notify::{Notice, Notifier};
pub use repository::{CartRepository, LocalCartRepository};
pub use service::CartService;
pub use store::{AddOutcome, CartSnapshot, CartStore, CheckoutSummary, StoreState};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
