//! Browser `localStorage` implementation (WASM only).

use super::{KeyValueStore, StorageError, StorageResult};
use web_sys::Storage;

/// Key/value store backed by `window.localStorage`.
pub struct LocalStorageStore {
    storage: Storage,
}

impl LocalStorageStore {
    /// Open the window's local storage.
    pub fn new() -> StorageResult<Self> {
        let window = web_sys::window()
            .ok_or_else(|| StorageError::Unavailable("No window".to_string()))?;
        let storage = window
            .local_storage()
            .map_err(|e| StorageError::Unavailable(format!("{:?}", e)))?
            .ok_or_else(|| StorageError::Unavailable("localStorage disabled".to_string()))?;
        Ok(Self { storage })
    }
}

impl KeyValueStore for LocalStorageStore {
    fn get(&self, key: &str) -> StorageResult<Option<String>> {
        self.storage
            .get_item(key)
            .map_err(|e| StorageError::Other(format!("getItem failed: {:?}", e)))
    }

    fn set(&self, key: &str, value: &str) -> StorageResult<()> {
        self.storage
            .set_item(key, value)
            .map_err(|e| StorageError::Other(format!("setItem failed: {:?}", e)))
    }
}
