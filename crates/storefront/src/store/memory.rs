use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

use tokio::sync::broadcast;

use super::{LocalStore, Notifier, StorageEvent, StoreError, TabId};

/// In-memory profile storage. Shared between tabs through an `Arc`.
#[derive(Debug)]
pub struct MemoryStore {
    values: RwLock<HashMap<String, String>>,
    notifier: Notifier,
}

impl MemoryStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self {
            values: RwLock::new(HashMap::new()),
            notifier: Notifier::new(),
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl LocalStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.values
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned()
    }

    fn set(&self, key: &str, value: &str, origin: TabId) -> Result<(), StoreError> {
        self.values
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.to_owned(), value.to_owned());
        self.notifier.notify(key, Some(value), origin);
        Ok(())
    }

    fn remove(&self, key: &str, origin: TabId) -> Result<(), StoreError> {
        self.values
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(key);
        self.notifier.notify(key, None, origin);
        Ok(())
    }

    fn subscribe(&self) -> broadcast::Receiver<StorageEvent> {
        self.notifier.subscribe()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_writes_notify_with_origin() {
        let store = MemoryStore::new();
        let mut rx = store.subscribe();
        let tab = TabId::new();

        store.set("cart", "[]", tab).unwrap();
        store.remove("cart", tab).unwrap();

        let first = rx.try_recv().unwrap();
        assert_eq!(first.key, "cart");
        assert_eq!(first.value.as_deref(), Some("[]"));
        assert_eq!(first.origin, tab);
        assert_eq!(rx.try_recv().unwrap().value, None);
        assert!(store.get("cart").is_none());
    }
}
