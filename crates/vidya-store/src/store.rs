//! Shared store implementations.
//!
//! The store is a string-keyed, string-valued map with a total contract:
//! `get` returns `None` for absent keys and `set` always succeeds from the
//! caller's perspective. Persistence problems are logged and absorbed, never
//! raised — callers layer typed decode-with-default on top (see [`crate::keys`]).

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

use tracing::{error, warn};

use crate::notify::{ChangeNotifier, ContextId};

/// Errors that can occur while opening a store.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The backing directory could not be created.
    #[error("failed to prepare store directory '{path}': {source}")]
    CreateDir {
        /// Directory that was being created.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },
}

// ============================================================================
// SharedStore
// ============================================================================

/// A persistent, cross-context key-value store.
///
/// Both operations are synchronous and total: absence is `None`, not an
/// error, and a failed write is logged rather than surfaced. Every
/// committed write is announced through the store's [`ChangeNotifier`] so
/// other contexts can reload.
pub trait SharedStore: Send + Sync {
    /// Returns the value stored under `key`, if any.
    fn get(&self, key: &str) -> Option<String>;

    /// Stores `value` under `key` and notifies other contexts.
    fn set(&self, key: &str, value: &str);

    /// The identity of the execution context this handle belongs to.
    fn context(&self) -> ContextId;

    /// The notifier announcing this store's writes.
    fn notifier(&self) -> &ChangeNotifier;
}

// ============================================================================
// MemoryStore
// ============================================================================

/// In-memory store, used in tests and by the single-process demo.
///
/// Handles created with [`MemoryStore::another_context`] share the same
/// underlying map but carry distinct context identities, modelling two
/// tabs over the same persistent storage.
#[derive(Debug, Clone)]
pub struct MemoryStore {
    inner: Arc<Mutex<HashMap<String, String>>>,
    notifier: ChangeNotifier,
    context: ContextId,
}

impl MemoryStore {
    /// Creates an empty store bound to a fresh context of `notifier`.
    #[must_use]
    pub fn new(notifier: ChangeNotifier) -> Self {
        let context = notifier.context();
        Self {
            inner: Arc::new(Mutex::new(HashMap::new())),
            notifier,
            context,
        }
    }

    /// Returns a handle to the same data under a new context identity.
    #[must_use]
    pub fn another_context(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
            notifier: self.notifier.clone(),
            context: self.notifier.context(),
        }
    }
}

impl SharedStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned()
    }

    fn set(&self, key: &str, value: &str) {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.to_string(), value.to_string());
        self.notifier.notify(key, self.context);
    }

    fn context(&self) -> ContextId {
        self.context
    }

    fn notifier(&self) -> &ChangeNotifier {
        &self.notifier
    }
}

// ============================================================================
// JsonFileStore
// ============================================================================

/// Durable store backed by a single JSON object file.
///
/// Every `get` re-reads the file so writes from other contexts are always
/// visible; every `set` is a read-modify-write committed with an atomic
/// temp-file rename before the change is announced. A corrupted file
/// degrades to an empty map rather than failing the caller.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
    notifier: ChangeNotifier,
    context: ContextId,
}

impl JsonFileStore {
    /// Opens (or prepares to create) the store file at `path`.
    ///
    /// The file itself is created lazily on first write; only the parent
    /// directory is created eagerly.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::CreateDir` if the parent directory cannot be
    /// created.
    pub fn open(path: impl Into<PathBuf>, notifier: ChangeNotifier) -> Result<Self, StoreError> {
        let path = path.into();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(|source| StoreError::CreateDir {
                    path: parent.to_path_buf(),
                    source,
                })?;
            }
        }
        let context = notifier.context();
        Ok(Self {
            path,
            notifier,
            context,
        })
    }

    /// Returns a handle to the same file under a new context identity.
    #[must_use]
    pub fn another_context(&self) -> Self {
        Self {
            path: self.path.clone(),
            notifier: self.notifier.clone(),
            context: self.notifier.context(),
        }
    }

    /// Path of the backing file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_map(&self) -> HashMap<String, String> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return HashMap::new(),
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "Store read failed, treating as empty");
                return HashMap::new();
            }
        };

        match serde_json::from_str(&raw) {
            Ok(map) => map,
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "Store file corrupted, treating as empty");
                HashMap::new()
            }
        }
    }

    /// Writes the full map with an atomic temp-file rename.
    fn write_map(&self, map: &HashMap<String, String>) -> std::io::Result<()> {
        let payload = serde_json::to_string_pretty(map)?;
        let tmp = self.path.with_extension("tmp");
        fs::write(&tmp, payload)?;
        fs::rename(&tmp, &self.path)
    }
}

impl SharedStore for JsonFileStore {
    fn get(&self, key: &str) -> Option<String> {
        self.read_map().remove(key)
    }

    fn set(&self, key: &str, value: &str) {
        let mut map = self.read_map();
        map.insert(key.to_string(), value.to_string());

        // Notify only after the write is durably committed; observers must
        // never see a write that is still in flight.
        match self.write_map(&map) {
            Ok(()) => {
                self.notifier.notify(key, self.context);
            }
            Err(e) => {
                error!(path = %self.path.display(), key, error = %e, "Store write failed");
            }
        }
    }

    fn context(&self) -> ContextId {
        self.context
    }

    fn notifier(&self) -> &ChangeNotifier {
        &self.notifier
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn file_store(dir: &tempfile::TempDir) -> JsonFileStore {
        JsonFileStore::open(dir.path().join("shared.json"), ChangeNotifier::default()).unwrap()
    }

    // ------------------------------------------------------------------------
    // MemoryStore tests
    // ------------------------------------------------------------------------

    #[test]
    fn test_memory_store_get_absent_key() {
        let store = MemoryStore::new(ChangeNotifier::default());
        assert_eq!(store.get("missing"), None);
    }

    #[test]
    fn test_memory_store_set_then_get() {
        let store = MemoryStore::new(ChangeNotifier::default());
        store.set("studentName", "Rohan");
        assert_eq!(store.get("studentName"), Some("Rohan".to_string()));
    }

    #[test]
    fn test_memory_store_shared_across_contexts() {
        let teacher = MemoryStore::new(ChangeNotifier::default());
        let student = teacher.another_context();

        assert_ne!(teacher.context(), student.context());

        teacher.set("studentName", "Meera");
        assert_eq!(student.get("studentName"), Some("Meera".to_string()));
    }

    #[tokio::test]
    async fn test_memory_store_write_notifies_other_context() {
        let teacher = MemoryStore::new(ChangeNotifier::default());
        let student = teacher.another_context();

        let mut watch = student.notifier().watch();
        teacher.set("approvedVideos", "[]");

        let event = watch.recv().await.unwrap();
        assert_eq!(event.key, "approvedVideos");
        assert_eq!(event.writer, teacher.context());
    }

    // ------------------------------------------------------------------------
    // JsonFileStore tests
    // ------------------------------------------------------------------------

    #[test]
    fn test_file_store_get_before_any_write() {
        let dir = tempfile::tempdir().unwrap();
        let store = file_store(&dir);
        assert_eq!(store.get("approvedVideos"), None);
    }

    #[test]
    fn test_file_store_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let store = file_store(&dir);

        store.set("studentName", "Rohan");
        store.set("teacherLanguage", "Hindi");

        assert_eq!(store.get("studentName"), Some("Rohan".to_string()));
        assert_eq!(store.get("teacherLanguage"), Some("Hindi".to_string()));
    }

    #[test]
    fn test_file_store_visible_to_second_handle() {
        let dir = tempfile::tempdir().unwrap();
        let writer = file_store(&dir);
        let reader = writer.another_context();

        writer.set("approvedVideos", r#"[{"id":"t1"}]"#);
        assert_eq!(
            reader.get("approvedVideos"),
            Some(r#"[{"id":"t1"}]"#.to_string())
        );
    }

    #[test]
    fn test_file_store_corrupted_file_degrades_to_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("shared.json");
        fs::write(&path, "not json at all {{{").unwrap();

        let store = JsonFileStore::open(&path, ChangeNotifier::default()).unwrap();
        assert_eq!(store.get("anything"), None);

        // A write after corruption starts over from an empty map.
        store.set("studentName", "Rohan");
        assert_eq!(store.get("studentName"), Some("Rohan".to_string()));
    }

    #[test]
    fn test_file_store_persists_across_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("shared.json");

        {
            let store = JsonFileStore::open(&path, ChangeNotifier::default()).unwrap();
            store.set("studentName", "Asha");
        }

        let store = JsonFileStore::open(&path, ChangeNotifier::default()).unwrap();
        assert_eq!(store.get("studentName"), Some("Asha".to_string()));
    }

    #[tokio::test]
    async fn test_file_store_notifies_after_commit() {
        let dir = tempfile::tempdir().unwrap();
        let writer = file_store(&dir);
        let reader = writer.another_context();

        let mut watch = reader.notifier().watch();
        writer.set("studentVideos", "[]");

        let event = watch.recv().await.unwrap();
        assert_eq!(event.key, "studentVideos");
        // The write was durable before the notification fired.
        assert_eq!(reader.get("studentVideos"), Some("[]".to_string()));
    }

    #[test]
    fn test_file_store_creates_parent_directory() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("a/b/shared.json");

        let store = JsonFileStore::open(&nested, ChangeNotifier::default()).unwrap();
        store.set("studentName", "Rohan");
        assert!(nested.exists());
    }
}
