//! Cart line items and listing categories.

use crate::error::Error;
use crate::key::CartKey;
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;

/// Listing category of a line item.
///
/// Distinguishes ids that would otherwise collide across listing types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemType {
    Free,
    Discount,
    Food,
    /// Only produced by the legacy inference shim when no category field is
    /// present on the candidate.
    Unknown,
}

impl ItemType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ItemType::Free => "free",
            ItemType::Discount => "discount",
            ItemType::Food => "food",
            ItemType::Unknown => "unknown",
        }
    }

    /// Free listings always carry a zero unit price.
    pub fn forces_zero_price(&self) -> bool {
        matches!(self, ItemType::Free)
    }
}

impl fmt::Display for ItemType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ItemType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "free" => Ok(ItemType::Free),
            "discount" => Ok(ItemType::Discount),
            "food" => Ok(ItemType::Food),
            "unknown" => Ok(ItemType::Unknown),
            other => Err(Error::InvalidItem(format!("unknown item type '{}'", other))),
        }
    }
}

/// One row in the cart: a listing plus a quantity.
///
/// Display metadata is copied from the listing when it is added and is not
/// kept in sync afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartLineItem {
    #[serde(deserialize_with = "id_from_string_or_number")]
    pub item_id: String,
    pub item_type: ItemType,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    pub unit_price: Decimal,
    pub quantity: u32,
    /// Id of the stored cart row, assigned by the cart API.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub record_id: Option<u64>,
}

impl CartLineItem {
    /// Composite identity of this row.
    pub fn key(&self) -> CartKey {
        CartKey::new(self.item_type, self.item_id.clone())
    }

    pub fn matches(&self, key: &CartKey) -> bool {
        self.item_type == key.item_type && self.item_id == key.item_id
    }

    /// `unit_price × quantity`.
    pub fn line_total(&self) -> Decimal {
        self.unit_price * Decimal::from(self.quantity)
    }

    /// Enforce the row invariants on data that came from outside the store.
    ///
    /// Free rows are re-zeroed and a zero quantity is lifted to 1. Rows with
    /// an empty id or a negative price are rejected.
    pub(crate) fn normalized(mut self) -> Option<Self> {
        if self.item_id.trim().is_empty() || self.unit_price.is_sign_negative() {
            return None;
        }
        if self.item_type.forces_zero_price() {
            self.unit_price = Decimal::ZERO;
        }
        self.quantity = self.quantity.max(1);
        Some(self)
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawId {
    Text(String),
    Number(u64),
}

impl From<RawId> for String {
    fn from(raw: RawId) -> Self {
        match raw {
            RawId::Text(s) => s,
            RawId::Number(n) => n.to_string(),
        }
    }
}

/// Listing ids arrive as JSON numbers from the API and as strings from older
/// stored carts.
pub(crate) fn id_from_string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    RawId::deserialize(deserializer).map(String::from)
}

pub(crate) fn opt_id_from_string_or_number<'de, D>(
    deserializer: D,
) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<RawId>::deserialize(deserializer)?.map(String::from))
}
