use std::io::Write;
use std::path::{Path, PathBuf};

use tokio::sync::broadcast;
use uuid::Uuid;

use super::{LocalStore, Notifier, StorageEvent, StoreError, TabId};

/// Profile storage on disk, one `<key>.json` file per key.
///
/// Writes go to a temporary file that is renamed over the target, so a
/// reader never observes a half-written value. Notifications reach the tabs
/// of this process only.
#[derive(Debug)]
pub struct FileStore {
    base_path: PathBuf,
    notifier: Notifier,
}

impl FileStore {
    /// Open (lazily create) the profile directory at `base_path`.
    pub fn new(base_path: impl Into<PathBuf>) -> Self {
        Self {
            base_path: base_path.into(),
            notifier: Notifier::new(),
        }
    }

    /// Profile directory.
    #[must_use]
    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    fn key_path(&self, key: &str) -> Result<PathBuf, StoreError> {
        validate_key(key)?;
        Ok(self.base_path.join(format!("{key}.json")))
    }
}

/// Rejects keys that would escape the profile directory.
fn validate_key(key: &str) -> Result<(), StoreError> {
    if key.is_empty() {
        return Err(StoreError::InvalidKey("key cannot be empty".to_owned()));
    }
    if key.contains('/') || key.contains('\\') || key.contains("..") || key.contains('\0') {
        return Err(StoreError::InvalidKey(format!(
            "key contains invalid characters: {key:?}"
        )));
    }
    if key.chars().any(char::is_control) {
        return Err(StoreError::InvalidKey(format!(
            "key contains control characters: {key:?}"
        )));
    }
    Ok(())
}

impl LocalStore for FileStore {
    fn get(&self, key: &str) -> Option<String> {
        let path = self.key_path(key).ok()?;
        match std::fs::read_to_string(&path) {
            Ok(raw) => Some(raw),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => None,
            Err(e) => {
                tracing::debug!(key, error = %e, "unreadable stored value");
                None
            }
        }
    }

    fn set(&self, key: &str, value: &str, origin: TabId) -> Result<(), StoreError> {
        let path = self.key_path(key)?;
        std::fs::create_dir_all(&self.base_path)?;

        let tmp_path = self
            .base_path
            .join(format!(".{key}.{}.tmp", Uuid::new_v4().simple()));
        let write_result = (|| {
            let mut file = std::fs::File::create(&tmp_path)?;
            file.write_all(value.as_bytes())?;
            file.sync_all()?;
            drop(file);
            std::fs::rename(&tmp_path, &path)
        })();
        if let Err(e) = write_result {
            let _ = std::fs::remove_file(&tmp_path);
            return Err(e.into());
        }

        self.notifier.notify(key, Some(value), origin);
        Ok(())
    }

    fn remove(&self, key: &str, origin: TabId) -> Result<(), StoreError> {
        let path = self.key_path(key)?;
        match std::fs::remove_file(&path) {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => return Err(e.into()),
        }
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
    fn test_set_get_remove_roundtrip_on_disk() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path().join("profile"));
        let tab = TabId::new();

        assert!(store.get("cart").is_none());
        store.set("cart", r#"[{"productId":"p1","qty":2}]"#, tab).unwrap();
        assert!(dir.path().join("profile/cart.json").exists());

        let reopened = FileStore::new(dir.path().join("profile"));
        assert_eq!(
            reopened.get("cart").as_deref(),
            Some(r#"[{"productId":"p1","qty":2}]"#)
        );

        store.remove("cart", tab).unwrap();
        assert!(reopened.get("cart").is_none());
        // Removing again is not an error.
        store.remove("cart", tab).unwrap();
    }

    #[test]
    fn test_rejects_path_traversal_keys() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path());
        let tab = TabId::new();
        for key in ["", "../cart", "a/b", "a\\b", "nul\0l", "tab\tkey"] {
            assert!(
                matches!(store.set(key, "1", tab), Err(StoreError::InvalidKey(_))),
                "{key:?} should be rejected"
            );
            assert!(store.get(key).is_none());
        }
    }

    #[test]
    fn test_no_temp_files_left_behind() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path());
        store.set("theme", "\"dark\"", TabId::new()).unwrap();
        let names: Vec<_> = std::fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().into_string().unwrap())
            .collect();
        assert_eq!(names, vec!["theme.json".to_owned()]);
    }
}
