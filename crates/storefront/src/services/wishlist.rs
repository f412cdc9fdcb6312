//! Wishlist (saved items).

use std::sync::{Arc, PoisonError, RwLock};

use serde_json::Value;

use neemon_core::ProductId;

use super::cart::Cart;
use crate::bus::{EventBus, StorefrontEvent};
use crate::store::{LocalStore, StoreError, TabId, decode_json, keys, write_json};

/// Keep the first occurrence of each id, dropping blanks.
fn normalize(raw: Vec<Value>) -> Vec<ProductId> {
    let mut ids: Vec<ProductId> = Vec::new();
    for value in raw {
        let Some(id) = value.as_str().and_then(|s| ProductId::parse(s).ok()) else {
            continue;
        };
        if !ids.contains(&id) {
            ids.push(id);
        }
    }
    ids
}

fn parse_wishlist(raw: &str) -> Vec<ProductId> {
    decode_json::<Vec<Value>>(keys::WISHLIST, raw)
        .map(normalize)
        .unwrap_or_default()
}

/// Ordered set of saved product ids, written through to the local store.
pub struct Wishlist {
    store: Arc<dyn LocalStore>,
    tab: TabId,
    bus: EventBus,
    ids: RwLock<Vec<ProductId>>,
}

impl Wishlist {
    pub fn load(store: Arc<dyn LocalStore>, tab: TabId, bus: EventBus) -> Self {
        let ids = store
            .get(keys::WISHLIST)
            .map(|raw| parse_wishlist(&raw))
            .unwrap_or_default();
        Self {
            store,
            tab,
            bus,
            ids: RwLock::new(ids),
        }
    }

    #[must_use]
    pub fn ids(&self) -> Vec<ProductId> {
        self.ids.read().unwrap_or_else(PoisonError::into_inner).clone()
    }

    #[must_use]
    pub fn contains(&self, product_id: &ProductId) -> bool {
        self.ids
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(product_id)
    }

    /// Remove `product_id` if saved, otherwise save it. Returns whether the
    /// product is saved afterwards.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the wishlist cannot be persisted.
    pub fn toggle(&self, product_id: &ProductId) -> Result<bool, StoreError> {
        let mut saved = false;
        self.mutate(|ids| {
            if let Some(pos) = ids.iter().position(|id| id == product_id) {
                ids.remove(pos);
            } else {
                ids.push(product_id.clone());
                saved = true;
            }
            true
        })?;
        Ok(saved)
    }

    /// Save `product_id` if not already saved.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the wishlist cannot be persisted.
    pub fn add(&self, product_id: &ProductId) -> Result<(), StoreError> {
        self.mutate(|ids| {
            if ids.contains(product_id) {
                return false;
            }
            ids.push(product_id.clone());
            true
        })
    }

    /// Unsave `product_id` if saved.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the wishlist cannot be persisted.
    pub fn remove(&self, product_id: &ProductId) -> Result<(), StoreError> {
        self.mutate(|ids| {
            let before = ids.len();
            ids.retain(|id| id != product_id);
            ids.len() != before
        })
    }

    /// Move a cart line to the wishlist: save first, then drop the line.
    /// Does nothing when the cart has no line for the product.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if either write fails.
    pub fn save_for_later(&self, cart: &Cart, product_id: &ProductId) -> Result<(), StoreError> {
        if cart.qty_of(product_id).is_none() {
            return Ok(());
        }
        self.add(product_id)?;
        cart.remove_item(product_id)
    }

    /// Move a saved item into the cart with quantity 1.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if either write fails.
    pub fn move_to_cart(&self, cart: &Cart, product_id: &ProductId) -> Result<(), StoreError> {
        self.remove(product_id)?;
        cart.add_item(product_id, 1.0)
    }

    /// Replace local state with a value written by another tab.
    pub fn apply_remote(&self, raw: Option<&str>) {
        let ids = raw.map(parse_wishlist).unwrap_or_default();
        *self.ids.write().unwrap_or_else(PoisonError::into_inner) = ids.clone();
        self.bus.publish(StorefrontEvent::WishlistChanged(ids));
    }

    fn mutate<F>(&self, change: F) -> Result<(), StoreError>
    where
        F: FnOnce(&mut Vec<ProductId>) -> bool,
    {
        let mut guard = self.ids.write().unwrap_or_else(PoisonError::into_inner);
        let mut next = guard.clone();
        if !change(&mut next) {
            return Ok(());
        }
        write_json(self.store.as_ref(), keys::WISHLIST, &next, self.tab)?;
        *guard = next.clone();
        drop(guard);
        self.bus.publish(StorefrontEvent::WishlistChanged(next));
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    fn pid(s: &str) -> ProductId {
        ProductId::parse(s).unwrap()
    }

    fn setup() -> (Arc<MemoryStore>, Cart, Wishlist) {
        let store = Arc::new(MemoryStore::new());
        let tab = TabId::new();
        let bus = EventBus::new();
        let cart = Cart::load(store.clone(), tab, bus.clone());
        let wishlist = Wishlist::load(store.clone(), tab, bus);
        (store, cart, wishlist)
    }

    #[test]
    fn test_toggle_twice_restores_membership() {
        let (_store, _cart, wishlist) = setup();
        assert!(wishlist.toggle(&pid("p1")).unwrap());
        assert!(wishlist.contains(&pid("p1")));
        assert!(!wishlist.toggle(&pid("p1")).unwrap());
        assert!(!wishlist.contains(&pid("p1")));
    }

    #[test]
    fn test_load_dedups_and_drops_garbage() {
        let store = Arc::new(MemoryStore::new());
        store
            .set(keys::WISHLIST, r#"["p1", "p2", "p1", 3, "", null]"#, TabId::new())
            .unwrap();
        let wishlist = Wishlist::load(store, TabId::new(), EventBus::new());
        assert_eq!(wishlist.ids(), vec![pid("p1"), pid("p2")]);
    }

    #[test]
    fn test_save_for_later_then_move_to_cart_resets_qty() {
        let (_store, cart, wishlist) = setup();
        cart.add_item(&pid("p1"), 3.0).unwrap();

        wishlist.save_for_later(&cart, &pid("p1")).unwrap();
        assert!(wishlist.contains(&pid("p1")));
        assert_eq!(cart.qty_of(&pid("p1")), None);

        wishlist.move_to_cart(&cart, &pid("p1")).unwrap();
        assert!(!wishlist.contains(&pid("p1")));
        assert_eq!(cart.qty_of(&pid("p1")), Some(1));
    }

    #[test]
    fn test_save_for_later_without_cart_line_does_nothing() {
        let (store, cart, wishlist) = setup();
        wishlist.save_for_later(&cart, &pid("p1")).unwrap();
        assert!(wishlist.ids().is_empty());
        assert!(store.get(keys::WISHLIST).is_none());
    }

    #[test]
    fn test_persisted_as_string_array() {
        let (store, _cart, wishlist) = setup();
        wishlist.add(&pid("p2")).unwrap();
        wishlist.add(&pid("p2")).unwrap();
        wishlist.add(&pid("p1")).unwrap();
        assert_eq!(store.get(keys::WISHLIST).as_deref(), Some(r#"["p2","p1"]"#));
    }
}
