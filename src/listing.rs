//! Listing DTOs handed to the cart by listing pages.
//!
//! Every [`Listing`] carries an explicit [`ItemType`]. Payloads from older
//! clients that only carry `is_free` / `discount_price` / `expiry_date` go
//! through [`crate::legacy`] first.

use crate::error::{Error, Result};
use crate::item::{opt_id_from_string_or_number, CartLineItem, ItemType};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A listing the user wants to put in the cart.
///
/// # Example
///
/// ```
/// use cart_kit::listing::Listing;
/// use cart_kit::item::ItemType;
/// use rust_decimal::Decimal;
///
/// let phone = Listing::new(ItemType::Discount, "2", "Phone", Decimal::from(300));
/// let row = phone.into_line_item().unwrap();
/// assert_eq!(row.quantity, 1);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Listing {
    #[serde(default, deserialize_with = "opt_id_from_string_or_number")]
    pub id: Option<String>,
    #[serde(rename = "type")]
    pub item_type: ItemType,
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
}

impl Listing {
    pub fn new(
        item_type: ItemType,
        id: impl Into<String>,
        title: impl Into<String>,
        price: Decimal,
    ) -> Self {
        Listing {
            id: Some(id.into()),
            item_type,
            title: title.into(),
            description: String::new(),
            image_url: None,
            category: None,
            location: None,
            price: Some(price),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_image(mut self, image_url: impl Into<String>) -> Self {
        self.image_url = Some(image_url.into());
        self
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }

    /// Validate the listing and build a fresh line item with quantity 1.
    ///
    /// # Errors
    ///
    /// `Error::InvalidItem` when the id is missing or blank, or the price is
    /// negative.
    pub fn into_line_item(self) -> Result<CartLineItem> {
        let item_id = match self.id {
            Some(id) if !id.trim().is_empty() => id,
            _ => {
                return Err(Error::InvalidItem(format!(
                    "listing '{}' has no id",
                    self.title
                )))
            }
        };

        let price = self.price.unwrap_or(Decimal::ZERO);
        if price.is_sign_negative() {
            return Err(Error::InvalidItem(format!(
                "listing {} has negative price {}",
                item_id, price
            )));
        }

        let unit_price = if self.item_type.forces_zero_price() {
            Decimal::ZERO
        } else {
            price
        };

        Ok(CartLineItem {
            item_id,
            item_type: self.item_type,
            title: self.title,
            description: self.description,
            image_url: self.image_url,
            category: self.category,
            location: self.location,
            unit_price,
            quantity: 1,
            record_id: None,
        })
    }
}
