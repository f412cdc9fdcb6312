//! Cart line type.

use serde::{Deserialize, Serialize};

use super::id::ProductId;

/// One (product, quantity) pairing in a cart or order.
///
/// Serialized as `{"productId": "...", "qty": n}`, the shape used both in the
/// locally persisted cart and in the `items` column of remote order rows.
/// A persisted cart never holds a line with `qty == 0`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartLine {
    pub product_id: ProductId,
    pub qty: u32,
}

impl CartLine {
    /// Create a line, returning `None` for a zero quantity.
    #[must_use]
    pub fn new(product_id: ProductId, qty: u32) -> Option<Self> {
        if qty == 0 {
            return None;
        }
        Some(Self { product_id, qty })
    }
}

/// Units across `lines`, saturating at `u32::MAX`.
pub fn total_units<'a>(lines: impl IntoIterator<Item = &'a CartLine>) -> u32 {
    lines
        .into_iter()
        .fold(0_u32, |acc, line| acc.saturating_add(line.qty))
}
