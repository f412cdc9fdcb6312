//! Cart state.
//!
//! The cart is an ordered list of `(productId, qty)` lines with at most one
//! line per product and no line below quantity 1. Lines keep the order in
//! which their product was first added. Every mutation rewrites the whole
//! persisted cart before it becomes visible.

use std::sync::{Arc, PoisonError, RwLock};

use serde_json::Value;

use neemon_core::{CartLine, ProductId, total_units};

use crate::bus::{EventBus, StorefrontEvent};
use crate::store::{LocalStore, StoreError, TabId, keys, write_json};

/// Interpret a JSON value as a number, accepting numeric strings.
#[must_use]
pub fn numeric(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
}

/// Saturating conversion of an already floored, positive quantity.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn to_qty(floored: f64) -> u32 {
    floored.min(f64::from(u32::MAX)) as u32
}

/// Quantity used by `add_item`: floored, never below 1. Non-finite input
/// counts as 1.
#[must_use]
pub fn coerce_add_qty(qty: f64) -> u32 {
    if qty.is_finite() && qty >= 1.0 {
        to_qty(qty.floor())
    } else {
        1
    }
}

/// Normalize a raw persisted cart.
///
/// Entries that are not objects, lack a non-empty string `productId`, or
/// whose `qty` is not a positive number (numeric strings accepted) are
/// dropped. Quantities are floored; anything that floors to zero is dropped.
/// Entries sharing a product are merged by summing, at the position of the
/// first occurrence. Unparsable input yields an empty cart.
#[must_use]
pub fn parse_cart(raw: &str) -> Vec<CartLine> {
    let Ok(Value::Array(entries)) = serde_json::from_str::<Value>(raw) else {
        tracing::debug!("discarding malformed cart");
        return Vec::new();
    };

    let mut lines: Vec<CartLine> = Vec::new();
    for entry in &entries {
        let Some(id) = entry.get("productId").and_then(Value::as_str) else {
            continue;
        };
        let Ok(product_id) = ProductId::parse(id) else {
            continue;
        };
        let Some(qty) = entry.get("qty").and_then(numeric) else {
            continue;
        };
        if !qty.is_finite() || qty <= 0.0 {
            continue;
        }
        let qty = to_qty(qty.floor());
        if qty == 0 {
            continue;
        }
        match lines.iter_mut().find(|l| l.product_id == product_id) {
            Some(line) => line.qty = line.qty.saturating_add(qty),
            None => lines.push(CartLine { product_id, qty }),
        }
    }
    lines
}

fn add_line(lines: &mut Vec<CartLine>, product_id: &ProductId, qty: u32) {
    match lines.iter_mut().find(|l| &l.product_id == product_id) {
        Some(line) => line.qty = line.qty.saturating_add(qty),
        None => lines.push(CartLine {
            product_id: product_id.clone(),
            qty,
        }),
    }
}

/// Returns whether anything changed.
fn set_line_qty(lines: &mut Vec<CartLine>, product_id: &ProductId, qty: f64) -> bool {
    if !qty.is_finite() {
        return false;
    }
    let Some(pos) = lines.iter().position(|l| &l.product_id == product_id) else {
        return false;
    };
    let floored = qty.floor();
    if floored <= 0.0 {
        lines.remove(pos);
    } else if let Some(line) = lines.get_mut(pos) {
        line.qty = to_qty(floored);
    }
    true
}

/// Cart of one tab, written through to the local store.
pub struct Cart {
    store: Arc<dyn LocalStore>,
    tab: TabId,
    bus: EventBus,
    lines: RwLock<Vec<CartLine>>,
}

impl Cart {
    /// Load the persisted cart.
    pub fn load(store: Arc<dyn LocalStore>, tab: TabId, bus: EventBus) -> Self {
        let lines = store.get(keys::CART).map(|raw| parse_cart(&raw)).unwrap_or_default();
        Self {
            store,
            tab,
            bus,
            lines: RwLock::new(lines),
        }
    }

    /// Snapshot of the lines.
    #[must_use]
    pub fn lines(&self) -> Vec<CartLine> {
        self.lines.read().unwrap_or_else(PoisonError::into_inner).clone()
    }

    /// Sum of quantities (badge count).
    #[must_use]
    pub fn count(&self) -> u32 {
        total_units(self.lines.read().unwrap_or_else(PoisonError::into_inner).iter())
    }

    /// Quantity of `product_id`, if it has a line.
    #[must_use]
    pub fn qty_of(&self, product_id: &ProductId) -> Option<u32> {
        self.lines
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .find(|l| &l.product_id == product_id)
            .map(|l| l.qty)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.read().unwrap_or_else(PoisonError::into_inner).is_empty()
    }

    /// Add `qty` units (see [`coerce_add_qty`]), appending a new line or
    /// incrementing the existing one.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the cart cannot be persisted; the in-memory
    /// cart is left unchanged.
    pub fn add_item(&self, product_id: &ProductId, qty: f64) -> Result<(), StoreError> {
        let qty = coerce_add_qty(qty);
        self.mutate(|lines| {
            add_line(lines, product_id, qty);
            true
        })
    }

    /// Set a line's quantity. The value is floored; zero or less removes
    /// the line. Missing lines and non-finite quantities are ignored.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the cart cannot be persisted.
    pub fn set_qty(&self, product_id: &ProductId, qty: f64) -> Result<(), StoreError> {
        self.mutate(|lines| set_line_qty(lines, product_id, qty))
    }

    /// Remove a line. Absent lines are ignored.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the cart cannot be persisted.
    pub fn remove_item(&self, product_id: &ProductId) -> Result<(), StoreError> {
        self.mutate(|lines| {
            let before = lines.len();
            lines.retain(|l| &l.product_id != product_id);
            lines.len() != before
        })
    }

    /// Empty the cart.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the cart cannot be persisted.
    pub fn clear(&self) -> Result<(), StoreError> {
        self.mutate(|lines| {
            lines.clear();
            true
        })
    }

    /// Replace local state with a value written by another tab. A removed
    /// key empties the cart.
    pub fn apply_remote(&self, raw: Option<&str>) {
        let lines = raw.map(parse_cart).unwrap_or_default();
        *self.lines.write().unwrap_or_else(PoisonError::into_inner) = lines.clone();
        self.bus.publish(StorefrontEvent::CartChanged(lines));
    }

    /// Apply `change` to a copy, persist it, then publish. `change` returns
    /// whether anything changed; unchanged carts are not rewritten.
    fn mutate<F>(&self, change: F) -> Result<(), StoreError>
    where
        F: FnOnce(&mut Vec<CartLine>) -> bool,
    {
        let mut guard = self.lines.write().unwrap_or_else(PoisonError::into_inner);
        let mut next = guard.clone();
        if !change(&mut next) {
            return Ok(());
        }
        write_json(self.store.as_ref(), keys::CART, &next, self.tab)?;
        *guard = next.clone();
        drop(guard);
        self.bus.publish(StorefrontEvent::CartChanged(next));
        Ok(())
    }
}
