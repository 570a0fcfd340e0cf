//! Keyed string store for the wizard documents.
//!
//! Mirrors browser local storage: every value is a string (the documents are
//! JSON-encoded), keyed by a fixed name. `JsonFileStore` keeps all keys in a
//! single JSON object on disk.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::Mutex;

use super::error::StoreError;

/// Key of the ProductInfo document.
pub const PRODUCT_INFO_KEY: &str = "productInfo";

/// Key of the ApprovalMap document.
pub const APPROVALS_KEY: &str = "imageApprovals";

/// Key of the cached step number (display only).
pub const FLOW_STEP_KEY: &str = "flowStep";

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// A persistent key/value string store.
pub trait StateStore: Send {
    /// Read a value.
    fn get(&self, key: &str) -> StoreResult<Option<String>>;

    /// Write a value.
    fn set(&mut self, key: &str, value: String) -> StoreResult<()>;

    /// Remove a single key.
    fn remove(&mut self, key: &str) -> StoreResult<()>;

    /// Remove every key.
    fn clear(&mut self) -> StoreResult<()>;
}

/// Store backed by a JSON file.
#[derive(Debug)]
pub struct JsonFileStore {
    /// Path to the state file
    path: PathBuf,
    /// Cached content
    entries: BTreeMap<String, String>,
}

impl JsonFileStore {
    /// Open (or lazily create) a store at `path`.
    ///
    /// A missing file is an empty store. An unreadable one is treated the
    /// same way and overwritten on the next write.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let entries = match Self::load(&path) {
            Ok(entries) => entries,
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "Discarding unreadable state file");
                BTreeMap::new()
            }
        };

        Self { path, entries }
    }

    /// Path of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(path: &Path) -> StoreResult<BTreeMap<String, String>> {
        if !path.exists() {
            return Ok(BTreeMap::new());
        }

        let content = fs::read_to_string(path)
            .map_err(|source| StoreError::Io { path: path.to_path_buf(), source })?;
        if content.trim().is_empty() {
            return Ok(BTreeMap::new());
        }
        Ok(serde_json::from_str(&content)?)
    }

    fn save(&self) -> StoreResult<()> {
        let io_err = |source: std::io::Error| StoreError::Io { path: self.path.clone(), source };

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(io_err)?;
        }

        let content = serde_json::to_string_pretty(&self.entries)?;
        fs::write(&self.path, content).map_err(io_err)
    }
}

impl StateStore for JsonFileStore {
    fn get(&self, key: &str) -> StoreResult<Option<String>> {
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: String) -> StoreResult<()> {
        self.entries.insert(key.to_string(), value);
        self.save()
    }

    fn remove(&mut self, key: &str) -> StoreResult<()> {
        if self.entries.remove(key).is_some() {
            self.save()?;
        }
        Ok(())
    }

    fn clear(&mut self) -> StoreResult<()> {
        self.entries.clear();
        self.save()
    }
}

/// In-memory store, for tests and embedding.
///
/// Clones share the same entries, so a caller can keep a handle and inspect
/// what a session wrote.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: Arc<Mutex<BTreeMap<String, String>>>,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored keys.
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    /// Whether the store is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }
}

impl StateStore for MemoryStore {
    fn get(&self, key: &str) -> StoreResult<Option<String>> {
        Ok(self.entries.lock().get(key).cloned())
    }

    fn set(&mut self, key: &str, value: String) -> StoreResult<()> {
        self.entries.lock().insert(key.to_string(), value);
        Ok(())
    }

    fn remove(&mut self, key: &str) -> StoreResult<()> {
        self.entries.lock().remove(key);
        Ok(())
    }

    fn clear(&mut self) -> StoreResult<()> {
        self.entries.lock().clear();
        Ok(())
    }
}
