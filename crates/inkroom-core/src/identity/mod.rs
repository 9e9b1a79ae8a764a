//! Stable per-client identity backed by durable client-local storage.

mod memory;

#[cfg(not(target_arch = "wasm32"))]
mod file;

#[cfg(target_arch = "wasm32")]
mod local_storage;

pub use memory::MemoryStore;

#[cfg(not(target_arch = "wasm32"))]
pub use file::FileStore;

#[cfg(target_arch = "wasm32")]
pub use local_storage::LocalStorageStore;

use thiserror::Error;
use uuid::Uuid;

/// Storage key holding the cached identifier.
pub const USER_ID_KEY: &str = "userId";

/// Storage errors.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("IO error: {0}")]
    Io(String),
    #[error("Storage unavailable: {0}")]
    Unavailable(String),
    #[error("Storage error: {0}")]
    Other(String),
}

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Durable string key/value storage local to this client.
///
/// Note: On native platforms, implementations must be Send + Sync.
/// On WASM, these bounds are relaxed since it's single-threaded.
#[cfg(not(target_arch = "wasm32"))]
pub trait KeyValueStore: Send + Sync {
    /// Read a value, `None` when the key was never written.
    fn get(&self, key: &str) -> StorageResult<Option<String>>;

    /// Write a value, replacing any previous one.
    fn set(&self, key: &str, value: &str) -> StorageResult<()>;
}

/// Durable string key/value storage (WASM version without Send + Sync).
#[cfg(target_arch = "wasm32")]
pub trait KeyValueStore {
    /// Read a value, `None` when the key was never written.
    fn get(&self, key: &str) -> StorageResult<Option<String>>;

    /// Write a value, replacing any previous one.
    fn set(&self, key: &str, value: &str) -> StorageResult<()>;
}

/// Return the cached client identifier, generating and caching one if absent.
///
/// A failed write still returns the fresh identifier; it is then only stable
/// for the current session.
pub fn stable_user_id<S: KeyValueStore + ?Sized>(store: &S) -> StorageResult<String> {
    if let Some(id) = store.get(USER_ID_KEY)? {
        if !id.trim().is_empty() {
            return Ok(id);
        }
    }

    let id = Uuid::new_v4().to_string();
    if let Err(e) = store.set(USER_ID_KEY, &id) {
        log::warn!("could not persist user id, it will change next session: {}", e);
    }
    log::info!("generated new user id {}", id);
    Ok(id)
}

#[cfg(test)]
mod tests {
    use super::*;

    struct ReadOnlyStore;

    impl KeyValueStore for ReadOnlyStore {
        fn get(&self, _key: &str) -> StorageResult<Option<String>> {
            Ok(None)
        }

        fn set(&self, _key: &str, _value: &str) -> StorageResult<()> {
            Err(StorageError::Unavailable("read-only".to_string()))
        }
    }

    #[test]
    fn test_generates_once_then_reuses() {
        let store = MemoryStore::new();
        let first = stable_user_id(&store).unwrap();
        let second = stable_user_id(&store).unwrap();

        assert_eq!(first, second);
        assert!(Uuid::parse_str(&first).is_ok());
        assert_eq!(store.get(USER_ID_KEY).unwrap(), Some(first));
    }

    #[test]
    fn test_existing_id_is_kept() {
        let store = MemoryStore::new();
        store.set(USER_ID_KEY, "alice").unwrap();
        assert_eq!(stable_user_id(&store).unwrap(), "alice");
    }

    #[test]
    fn test_blank_id_is_replaced() {
        let store = MemoryStore::new();
        store.set(USER_ID_KEY, "  ").unwrap();
        let id = stable_user_id(&store).unwrap();
        assert_ne!(id.trim(), "");
        assert_eq!(store.get(USER_ID_KEY).unwrap(), Some(id));
    }

    #[test]
    fn test_write_failure_still_yields_id() {
        let id = stable_user_id(&ReadOnlyStore).unwrap();
        assert!(!id.is_empty());
    }
}
