//! Durable client-side key/value storage.
//!
//! The browser build persists into `window.localStorage`; native builds keep
//! the same keys in a single JSON file under the data directory.

use std::cell::RefCell;
use std::collections::HashMap;

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("storage is unavailable: {0}")]
    Unavailable(String),
    #[error("storage io error: {0}")]
    Io(String),
    #[error("storage file is corrupt: {0}")]
    Corrupt(String),
}

/// String-keyed durable storage.
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;
    fn remove(&self, key: &str) -> Result<(), StorageError>;
}

/// Volatile store, used in tests and as the fallback when nothing durable exists.
#[derive(Debug, Default)]
pub struct MemoryStore {
    items: RefCell<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.items.borrow().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.items
            .borrow_mut()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        self.items.borrow_mut().remove(key);
        Ok(())
    }
}

// ============ Native file store ============

#[cfg(not(target_arch = "wasm32"))]
pub use file::FileStore;

#[cfg(not(target_arch = "wasm32"))]
mod file {
    use super::{KeyValueStore, StorageError};
    use std::collections::BTreeMap;
    use std::path::{Path, PathBuf};

    const STORE_FILE_NAME: &str = "local-storage.json";

    /// All keys live in one JSON object; every write rewrites the file.
    #[derive(Debug, Clone)]
    pub struct FileStore {
        path: PathBuf,
    }

    impl FileStore {
        pub fn new(path: impl Into<PathBuf>) -> Self {
            Self { path: path.into() }
        }

        /// Store inside the dashboard data directory.
        pub fn in_data_dir() -> Self {
            Self::new(crate::config::get_data_dir().join(STORE_FILE_NAME))
        }

        pub fn path(&self) -> &Path {
            &self.path
        }

        fn read_all(&self) -> Result<BTreeMap<String, String>, StorageError> {
            if !self.path.exists() {
                return Ok(BTreeMap::new());
            }
            let raw = std::fs::read_to_string(&self.path)
                .map_err(|e| StorageError::Io(e.to_string()))?;
            if raw.trim().is_empty() {
                return Ok(BTreeMap::new());
            }
            serde_json::from_str(&raw).map_err(|e| StorageError::Corrupt(e.to_string()))
        }

        fn write_all(&self, items: &BTreeMap<String, String>) -> Result<(), StorageError> {
            if let Some(parent) = self.path.parent() {
                std::fs::create_dir_all(parent).map_err(|e| StorageError::Io(e.to_string()))?;
            }
            let raw = serde_json::to_string_pretty(items)
                .map_err(|e| StorageError::Io(e.to_string()))?;
            std::fs::write(&self.path, raw).map_err(|e| StorageError::Io(e.to_string()))
        }

        /// A corrupt file is dropped rather than blocking every later write.
        fn read_for_update(&self) -> Result<BTreeMap<String, String>, StorageError> {
            match self.read_all() {
                Err(StorageError::Corrupt(e)) => {
                    tracing::warn!("Discarding corrupt storage file {:?}: {}", self.path, e);
                    Ok(BTreeMap::new())
                }
                other => other,
            }
        }
    }

    impl KeyValueStore for FileStore {
        fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
            Ok(self.read_all()?.get(key).cloned())
        }

        fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
            let mut items = self.read_for_update()?;
            items.insert(key.to_string(), value.to_string());
            self.write_all(&items)
        }

        fn remove(&self, key: &str) -> Result<(), StorageError> {
            let mut items = self.read_for_update()?;
            if items.remove(key).is_some() {
                self.write_all(&items)?;
            }
            Ok(())
        }
    }
}

// ============ WASM localStorage ============

#[cfg(target_arch = "wasm32")]
pub use web::LocalStorage;

#[cfg(target_arch = "wasm32")]
mod web {
    use super::{KeyValueStore, StorageError};

    /// `window.localStorage`
    #[derive(Debug, Default, Clone, Copy)]
    pub struct LocalStorage;

    impl LocalStorage {
        fn storage() -> Result<web_sys::Storage, StorageError> {
            web_sys::window()
                .ok_or_else(|| StorageError::Unavailable("no window".into()))?
                .local_storage()
                .map_err(|e| StorageError::Unavailable(format!("{:?}", e)))?
                .ok_or_else(|| StorageError::Unavailable("localStorage disabled".into()))
        }
    }

    impl KeyValueStore for LocalStorage {
        fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
            Self::storage()?
                .get_item(key)
                .map_err(|e| StorageError::Io(format!("{:?}", e)))
        }

        fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
            Self::storage()?
                .set_item(key, value)
                .map_err(|e| StorageError::Io(format!("{:?}", e)))
        }

        fn remove(&self, key: &str) -> Result<(), StorageError> {
            Self::storage()?
                .remove_item(key)
                .map_err(|e| StorageError::Io(format!("{:?}", e)))
        }
    }
}

/// Durable store for the current platform.
pub fn platform_store() -> std::rc::Rc<dyn KeyValueStore> {
    #[cfg(target_arch = "wasm32")]
    {
        std::rc::Rc::new(LocalStorage)
    }
    #[cfg(not(target_arch = "wasm32"))]
    {
        std::rc::Rc::new(FileStore::in_data_dir())
    }
}
