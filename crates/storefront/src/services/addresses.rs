//! Saved delivery addresses.
//!
//! Every user's addresses share one local key and are filtered by `userId`
//! on read. The filter scopes the view; it is not an access check.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use neemon_core::{AddressId, UserId};

use crate::store::{LocalStore, StoreError, StoredList, TabId, keys};

/// Errors from the address book.
#[derive(Debug, Error)]
pub enum AddressError {
    #[error("Label and address are required.")]
    MissingField,

    #[error("address not found")]
    NotFound,

    #[error("storage error: {0}")]
    Store(#[from] StoreError),
}

/// One saved address.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedAddress {
    pub id: AddressId,
    pub user_id: UserId,
    pub label: String,
    pub address_text: String,
}

/// Address book over the local store.
pub struct AddressBook {
    store: Arc<dyn LocalStore>,
    tab: TabId,
}

impl AddressBook {
    pub fn new(store: Arc<dyn LocalStore>, tab: TabId) -> Self {
        Self { store, tab }
    }

    fn all(&self) -> StoredList<SavedAddress> {
        StoredList::read(self.store.as_ref(), keys::ADDRESSES)
    }

    fn save(&self, all: &StoredList<SavedAddress>) -> Result<(), AddressError> {
        all.write(self.store.as_ref(), keys::ADDRESSES, self.tab)?;
        Ok(())
    }

    /// Addresses of `user_id`, oldest first.
    #[must_use]
    pub fn list(&self, user_id: &UserId) -> Vec<SavedAddress> {
        self.all()
            .items
            .into_iter()
            .filter(|a| &a.user_id == user_id)
            .collect()
    }

    /// Save a new address. Label and text are trimmed and must be non-blank.
    ///
    /// # Errors
    ///
    /// Returns [`AddressError::MissingField`] for blank input.
    pub fn add(
        &self,
        user_id: &UserId,
        label: &str,
        address_text: &str,
    ) -> Result<SavedAddress, AddressError> {
        let (label, address_text) = (label.trim(), address_text.trim());
        if label.is_empty() || address_text.is_empty() {
            return Err(AddressError::MissingField);
        }
        let entry = SavedAddress {
            id: AddressId::generate(),
            user_id: user_id.clone(),
            label: label.to_owned(),
            address_text: address_text.to_owned(),
        };
        let mut all = self.all();
        all.items.push(entry.clone());
        self.save(&all)?;
        Ok(entry)
    }

    /// Delete one of `user_id`'s addresses.
    ///
    /// # Errors
    ///
    /// Returns [`AddressError::NotFound`] if the user has no such address.
    pub fn remove(&self, user_id: &UserId, id: &AddressId) -> Result<(), AddressError> {
        let mut all = self.all();
        let before = all.items.len();
        all.items.retain(|a| !(&a.id == id && &a.user_id == user_id));
        if all.items.len() == before {
            return Err(AddressError::NotFound);
        }
        self.save(&all)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::{Value, json};

    use super::*;
    use crate::store::{MemoryStore, read_json, write_json};

    fn uid(s: &str) -> UserId {
        UserId::parse(s).unwrap()
    }

    #[test]
    fn test_list_filters_by_user() {
        let book = AddressBook::new(Arc::new(MemoryStore::new()), TabId::new());
        book.add(&uid("u1"), "Home", "Kilimani, Argwings Kodhek Rd").unwrap();
        book.add(&uid("u2"), "Work", "Westlands").unwrap();
        book.add(&uid("u1"), " Office ", " Upper Hill ").unwrap();

        let mine = book.list(&uid("u1"));
        assert_eq!(mine.len(), 2);
        assert_eq!(mine[1].label, "Office");
        assert_eq!(mine[1].address_text, "Upper Hill");
    }

    #[test]
    fn test_add_rejects_blank_fields() {
        let book = AddressBook::new(Arc::new(MemoryStore::new()), TabId::new());
        assert!(matches!(
            book.add(&uid("u1"), "  ", "Westlands"),
            Err(AddressError::MissingField)
        ));
        assert!(matches!(
            book.add(&uid("u1"), "Home", ""),
            Err(AddressError::MissingField)
        ));
    }

    #[test]
    fn test_unreadable_entry_survives_add_and_remove() {
        let store = Arc::new(MemoryStore::new());
        let book = AddressBook::new(store.clone(), TabId::new());
        let home = book.add(&uid("u1"), "Home", "Kilimani").unwrap();

        let mut raw: Vec<Value> = read_json(&*store, keys::ADDRESSES).unwrap();
        raw.push(json!({"id": "old", "label": "Shop"}));
        write_json(&*store, keys::ADDRESSES, &raw, TabId::new()).unwrap();

        assert_eq!(book.list(&uid("u1")).len(), 1);
        book.add(&uid("u1"), "Work", "Westlands").unwrap();
        book.remove(&uid("u1"), &home.id).unwrap();

        let raw: Vec<Value> = read_json(&*store, keys::ADDRESSES).unwrap();
        assert_eq!(raw.len(), 2);
        assert!(raw.iter().any(|v| v["id"] == "old"));
        assert_eq!(book.list(&uid("u1"))[0].label, "Work");
    }

    #[test]
    fn test_remove_only_own_address() {
        let book = AddressBook::new(Arc::new(MemoryStore::new()), TabId::new());
        let home = book.add(&uid("u1"), "Home", "Kilimani").unwrap();
        assert!(matches!(
            book.remove(&uid("u2"), &home.id),
            Err(AddressError::NotFound)
        ));
        book.remove(&uid("u1"), &home.id).unwrap();
        assert!(book.list(&uid("u1")).is_empty());
    }
}
