//! Cart key management: composite line-item identity and storage keys.

use crate::error::{Error, Result};
use crate::item::ItemType;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Default key under which the cart snapshot is stored.
pub const DEFAULT_STORAGE_KEY: &str = "cart";

/// Composite identity of a line item: `(item_type, item_id)`.
///
/// Listing ids are only unique within their category, so a free product and
/// a food item may both have id `3`. The pair is what the cart merges on.
///
/// The textual form is `"{type}_{id}"`, e.g. `food_3`.
///
/// ```
/// use cart_kit::key::CartKey;
/// use cart_kit::item::ItemType;
///
/// let key: CartKey = "food_3".parse().unwrap();
/// assert_eq!(key, CartKey::new(ItemType::Food, "3"));
/// assert_eq!(key.to_string(), "food_3");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CartKey {
    pub item_type: ItemType,
    pub item_id: String,
}

impl CartKey {
    pub fn new(item_type: ItemType, item_id: impl Into<String>) -> Self {
        CartKey {
            item_type,
            item_id: item_id.into(),
        }
    }
}

impl fmt::Display for CartKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}", self.item_type, self.item_id)
    }
}

impl FromStr for CartKey {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        // Type names never contain '_', ids may.
        let (type_part, id_part) = s
            .split_once('_')
            .ok_or_else(|| Error::InvalidKey(s.to_string()))?;

        if id_part.is_empty() {
            return Err(Error::InvalidKey(s.to_string()));
        }

        let item_type = type_part
            .parse::<ItemType>()
            .map_err(|_| Error::InvalidKey(s.to_string()))?;

        Ok(CartKey::new(item_type, id_part))
    }
}

impl TryFrom<&str> for CartKey {
    type Error = Error;

    fn try_from(s: &str) -> Result<Self> {
        s.parse()
    }
}

/// Builder for storage keys.
pub struct StorageKeyBuilder;

impl StorageKeyBuilder {
    /// Key for an anonymous, per-session cart.
    pub fn session(prefix: &str) -> String {
        prefix.to_string()
    }

    /// Key for a cart scoped to one user.
    pub fn for_user(prefix: &str, user: &dyn fmt::Display) -> String {
        format!("{}:{}", prefix, user)
    }
}
