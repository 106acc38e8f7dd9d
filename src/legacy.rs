//! Backward-compatibility shim for listing payloads without an explicit type.
//!
//! Older listing pages sent the raw listing and let the cart guess its
//! category from whichever optional fields happened to be set. That guess
//! lives here and nowhere else; new callers build a [`Listing`] directly.

use crate::item::{opt_id_from_string_or_number, ItemType};
use crate::listing::Listing;
use rust_decimal::Decimal;
use serde::Deserialize;

/// A listing payload as older clients sent it.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct LegacyCandidate {
    #[serde(default, deserialize_with = "opt_id_from_string_or_number")]
    pub id: Option<String>,
    #[serde(default, rename = "type")]
    pub explicit_type: Option<String>,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, alias = "image")]
    pub image_url: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub price: Option<Decimal>,
    #[serde(default)]
    pub is_free: Option<bool>,
    #[serde(default)]
    pub discount_price: Option<Decimal>,
    #[serde(default)]
    pub expiry_date: Option<String>,
}

impl LegacyCandidate {
    /// Resolve the category.
    ///
    /// An explicit, recognised `type` wins. Otherwise: `is_free` → free,
    /// a non-zero `discount_price` → discount, a non-empty `expiry_date` →
    /// food, else unknown.
    pub fn resolve_type(&self) -> ItemType {
        if let Some(explicit) = self
            .explicit_type
            .as_deref()
            .and_then(|t| t.parse::<ItemType>().ok())
        {
            return explicit;
        }

        if self.is_free == Some(true) {
            ItemType::Free
        } else if self.discount_price.is_some_and(|p| !p.is_zero()) {
            ItemType::Discount
        } else if self.expiry_date.as_deref().is_some_and(|d| !d.is_empty()) {
            ItemType::Food
        } else {
            debug!(
                "Could not infer item type for legacy candidate {:?}",
                self.id
            );
            ItemType::Unknown
        }
    }
}

impl From<LegacyCandidate> for Listing {
    fn from(candidate: LegacyCandidate) -> Self {
        let item_type = candidate.resolve_type();
        let price = if candidate.is_free == Some(true) {
            Some(Decimal::ZERO)
        } else {
            candidate.price.or(candidate.discount_price)
        };

        Listing {
            id: candidate.id,
            item_type,
            title: candidate.title,
            description: candidate.description,
            image_url: candidate.image_url,
            category: candidate.category,
            location: candidate.location,
            price,
        }
    }
}
