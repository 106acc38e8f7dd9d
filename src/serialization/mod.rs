//! JSON encoding of cart snapshots.
//!
//! A cart snapshot is stored as a plain JSON array of line items under a
//! single key. There is no envelope and no schema version:
//!
//! ```text
//! [{"item_id":"3","item_type":"food","title":"Bread","unit_price":"10","quantity":1}, ...]
//! ```
//!
//! Decoding is lenient. Stored data is written by whatever client version
//! last touched the cart, so:
//!
//! - a value that is not JSON, or not an array, decodes to an empty cart
//! - array elements that are not valid line items are skipped
//! - surviving rows are normalized (free rows re-zeroed, quantity ≥ 1)
//! - duplicate keys are merged by summing quantities, first row wins otherwise
//!
//! Every one of these is logged at `warn` and never returned as an error.
//!
//! # Example
//!
//! ```rust
//! use cart_kit::serialization::{decode_items, encode_items};
//!
//! # fn main() -> cart_kit::Result<()> {
//! let bytes = encode_items(&[])?;
//! assert_eq!(bytes, b"[]");
//! assert!(decode_items(b"{\"not\": \"an array\"}").is_empty());
//! # Ok(())
//! # }
//! ```

use crate::error::{Error, Result};
use crate::item::CartLineItem;
use serde_json::Value;

/// Serialize line items into the stored JSON array.
///
/// # Errors
///
/// Returns `Error::SerializationError` if serde_json fails.
pub fn encode_items(items: &[CartLineItem]) -> Result<Vec<u8>> {
    serde_json::to_vec(items).map_err(|e| Error::SerializationError(e.to_string()))
}

/// Deserialize a stored JSON array into line items.
///
/// Never fails: see the module docs for how malformed input is handled.
pub fn decode_items(bytes: &[u8]) -> Vec<CartLineItem> {
    let value: Value = match serde_json::from_slice(bytes) {
        Ok(value) => value,
        Err(e) => {
            warn!("✗ Stored cart is not valid JSON, treating as empty: {}", e);
            return Vec::new();
        }
    };

    let Value::Array(rows) = value else {
        warn!("✗ Stored cart is not a JSON array, treating as empty");
        return Vec::new();
    };

    let mut items: Vec<CartLineItem> = Vec::with_capacity(rows.len());
    for (index, row) in rows.into_iter().enumerate() {
        let item = match serde_json::from_value::<CartLineItem>(row) {
            Ok(item) => item,
            Err(e) => {
                warn!("✗ Skipping malformed cart row {}: {}", index, e);
                continue;
            }
        };

        let Some(item) = item.normalized() else {
            warn!("✗ Skipping invalid cart row {}", index);
            continue;
        };

        merge_row(&mut items, item);
    }

    debug!("✓ Decoded {} cart rows", items.len());
    items
}

fn merge_row(items: &mut Vec<CartLineItem>, item: CartLineItem) {
    let key = item.key();
    match items.iter_mut().find(|existing| existing.matches(&key)) {
        Some(existing) => {
            warn!("✗ Duplicate cart row {} merged", key);
            existing.quantity = existing.quantity.saturating_add(item.quantity);
        }
        None => items.push(item),
    }
}
