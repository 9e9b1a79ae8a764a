//! File-based storage implementation for native platforms.

use super::{KeyValueStore, StorageError, StorageResult};
use std::fs;
use std::io::ErrorKind;
use std::path::PathBuf;

/// File-based storage for native platforms.
///
/// Stores each key as a small text file in a specified directory.
pub struct FileStore {
    /// Base directory for stored values.
    base_path: PathBuf,
}

impl FileStore {
    /// Create a new file store with the given base directory.
    ///
    /// Creates the directory if it doesn't exist.
    pub fn new(base_path: PathBuf) -> StorageResult<Self> {
        if !base_path.exists() {
            fs::create_dir_all(&base_path).map_err(|e| {
                StorageError::Io(format!("Failed to create storage directory: {}", e))
            })?;
        }
        Ok(Self { base_path })
    }

    /// Create file storage in the default location.
    ///
    /// On Unix: `~/.local/share/inkroom/`
    /// On Windows: `%LOCALAPPDATA%\inkroom\`
    pub fn default_location() -> StorageResult<Self> {
        let base = dirs::data_local_dir()
            .or_else(dirs::home_dir)
            .ok_or_else(|| StorageError::Io("Could not determine home directory".to_string()))?;

        Self::new(base.join("inkroom"))
    }

    /// Get the file path for a key.
    fn value_path(&self, key: &str) -> PathBuf {
        // Sanitize key to be safe for filenames
        let safe_key: String = key
            .chars()
            .map(|c| if c.is_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
            .collect();
        self.base_path.join(safe_key)
    }

    /// Get the base path.
    pub fn base_path(&self) -> &PathBuf {
        &self.base_path
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> StorageResult<Option<String>> {
        let path = self.value_path(key);
        match fs::read_to_string(&path) {
            Ok(value) => Ok(Some(value)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(StorageError::Io(format!(
                "Failed to read {}: {}",
                path.display(),
                e
            ))),
        }
    }

    fn set(&self, key: &str, value: &str) -> StorageResult<()> {
        let path = self.value_path(key);
        fs::write(&path, value)
            .map_err(|e| StorageError::Io(format!("Failed to write {}: {}", path.display(), e)))
    }
}
