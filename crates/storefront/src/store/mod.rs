//! Persistent local key/value store.
//!
//! One store holds the state of one browser profile. Every tab of that
//! profile shares the store; each write is tagged with the writer's
//! [`TabId`] and broadcast as a [`StorageEvent`] so the *other* tabs can
//! apply it. A tab ignores notifications carrying its own id.
//!
//! Values are JSON strings. Readers never fail on absent or malformed
//! values: [`read_json`] logs at debug level and yields `None`, and callers
//! fall back to their defaults.

mod file;
pub mod keys;
mod memory;

use std::fmt;

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use thiserror::Error;
use tokio::sync::broadcast;
use uuid::Uuid;

pub use file::FileStore;
pub use memory::MemoryStore;

/// Buffered notifications per subscriber before it starts lagging.
const NOTIFY_CAPACITY: usize = 256;

/// Errors writing to the local store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Filesystem failure.
    #[error("storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Value could not be serialized.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Key is not usable as a storage name.
    #[error("invalid storage key: {0}")]
    InvalidKey(String),
}

/// Identifies one tab (one [`crate::Storefront`] context).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TabId(Uuid);

impl TabId {
    /// A fresh random tab id.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for TabId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for TabId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.simple())
    }
}

/// Change notification delivered to every tab of the profile.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageEvent {
    pub key: String,
    /// New raw value, `None` when the key was removed.
    pub value: Option<String>,
    /// Tab that performed the write.
    pub origin: TabId,
}

/// Synchronous key/value storage scoped to one profile.
pub trait LocalStore: Send + Sync {
    /// Raw value of `key`, if present and readable.
    fn get(&self, key: &str) -> Option<String>;

    /// Store `value` under `key` and notify subscribers.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the value cannot be persisted.
    fn set(&self, key: &str, value: &str, origin: TabId) -> Result<(), StoreError>;

    /// Delete `key` and notify subscribers.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the key cannot be deleted.
    fn remove(&self, key: &str, origin: TabId) -> Result<(), StoreError>;

    /// Subscribe to change notifications.
    fn subscribe(&self) -> broadcast::Receiver<StorageEvent>;
}

/// Fan-out of storage notifications, shared by the store implementations.
#[derive(Debug, Clone)]
pub(crate) struct Notifier {
    tx: broadcast::Sender<StorageEvent>,
}

impl Notifier {
    pub(crate) fn new() -> Self {
        let (tx, _) = broadcast::channel(NOTIFY_CAPACITY);
        Self { tx }
    }

    pub(crate) fn notify(&self, key: &str, value: Option<&str>, origin: TabId) {
        // No subscribers is fine.
        let _ = self.tx.send(StorageEvent {
            key: key.to_owned(),
            value: value.map(str::to_owned),
            origin,
        });
    }

    pub(crate) fn subscribe(&self) -> broadcast::Receiver<StorageEvent> {
        self.tx.subscribe()
    }
}

/// Decode a raw stored value, logging and discarding malformed JSON.
pub fn decode_json<T: DeserializeOwned>(key: &str, raw: &str) -> Option<T> {
    match serde_json::from_str(raw) {
        Ok(value) => Some(value),
        Err(e) => {
            tracing::debug!(key, error = %e, "discarding malformed stored value");
            None
        }
    }
}

/// Read and decode `key`; absent or malformed values yield `None`.
pub fn read_json<T: DeserializeOwned>(store: &dyn LocalStore, key: &str) -> Option<T> {
    store.get(key).and_then(|raw| decode_json(key, &raw))
}

/// Serialize `value` and store it under `key`.
///
/// # Errors
///
/// Returns [`StoreError`] if serialization or the write fails.
pub fn write_json<T: Serialize + ?Sized>(
    store: &dyn LocalStore,
    key: &str,
    value: &T,
    origin: TabId,
) -> Result<(), StoreError> {
    let raw = serde_json::to_string(value)?;
    store.set(key, &raw, origin)
}

/// A stored JSON array decoded one element at a time.
///
/// Elements that do not decode as `T` are held verbatim and written back
/// after the decoded ones, so saving never drops entries this build cannot
/// read. A value that is not an array at all reads as empty.
#[derive(Debug, Clone)]
pub struct StoredList<T> {
    pub items: Vec<T>,
    opaque: Vec<Value>,
}

impl<T> Default for StoredList<T> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            opaque: Vec::new(),
        }
    }
}

impl<T: DeserializeOwned + Serialize> StoredList<T> {
    /// Read the array under `key`.
    #[must_use]
    pub fn read(store: &dyn LocalStore, key: &str) -> Self {
        let Some(raw) = read_json::<Vec<Value>>(store, key) else {
            return Self::default();
        };
        let mut list = Self::default();
        for element in raw {
            match serde_json::from_value::<T>(element.clone()) {
                Ok(item) => list.items.push(item),
                Err(e) => {
                    tracing::warn!(key, error = %e, "keeping unreadable stored element");
                    list.opaque.push(element);
                }
            }
        }
        list
    }

    /// Elements that did not decode, as stored.
    #[must_use]
    pub fn opaque(&self) -> &[Value] {
        &self.opaque
    }

    /// Write the decoded items followed by the unreadable elements.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if serialization or the write fails.
    pub fn write(&self, store: &dyn LocalStore, key: &str, origin: TabId) -> Result<(), StoreError> {
        let mut out = Vec::with_capacity(self.items.len() + self.opaque.len());
        for item in &self.items {
            out.push(serde_json::to_value(item)?);
        }
        out.extend(self.opaque.iter().cloned());
        write_json(store, key, &out, origin)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_read_json_tolerates_garbage() {
        let store = MemoryStore::new();
        let tab = TabId::new();
        store.set("theme", "{not json", tab).unwrap();
        assert_eq!(read_json::<String>(&store, "theme"), None);
        assert_eq!(read_json::<String>(&store, "missing"), None);

        write_json(&store, "theme", "dark", tab).unwrap();
        assert_eq!(read_json::<String>(&store, "theme").as_deref(), Some("dark"));
    }

    #[derive(Debug, PartialEq, Serialize, serde::Deserialize)]
    struct Entry {
        id: u32,
    }

    #[test]
    fn test_stored_list_keeps_unreadable_elements() {
        let store = MemoryStore::new();
        let tab = TabId::new();
        store
            .set("entries", r#"[{"id":1},{"id":"legacy"},{"id":2}]"#, tab)
            .unwrap();

        let mut list = StoredList::<Entry>::read(&store, "entries");
        assert_eq!(list.items, vec![Entry { id: 1 }, Entry { id: 2 }]);
        assert_eq!(list.opaque().len(), 1);

        list.items.push(Entry { id: 3 });
        list.write(&store, "entries", tab).unwrap();
        let raw: Vec<Value> = read_json(&store, "entries").unwrap();
        assert_eq!(raw.len(), 4);
        assert!(raw.contains(&serde_json::json!({"id": "legacy"})));
    }

    #[test]
    fn test_stored_list_non_array_reads_empty() {
        let store = MemoryStore::new();
        let tab = TabId::new();
        store.set("entries", r#"{"id":1}"#, tab).unwrap();
        let list = StoredList::<Entry>::read(&store, "entries");
        assert!(list.items.is_empty());
        assert!(list.opaque().is_empty());
    }

    #[test]
    fn test_tab_ids_are_unique() {
        assert_ne!(TabId::new(), TabId::new());
    }
}
