//! Durable key-value storage.
//!
//! Values are strings under string keys, the same contract as browser local
//! storage. Every value this crate writes is JSON; [`KvStoreExt`] adds the
//! typed helpers.
//!
//! # Directory Layout ([`FileKv`])
//!
//! ```text
//! <data_dir>/
//!   TICKETAPP_AUTH_TOKEN.json
//!   TICKETAPP_REGISTERED_USER.json
//!   TICKETAPP_TICKETS.json
//!   TICKETAPP_TICKET_SEQ.json
//!   lock                  # advisory lock, shared for reads, exclusive for writes
//! ```
//!
//! # Invariants
//!
//! - Writes go to `<KEY>.json.tmp` and are renamed into place, so readers
//!   never observe a half-written value.
//! - Removing an absent key is not an error.
//! - Everything inside [`KvStore::exclusive`] happens under one lock, so
//!   read-modify-write sequences from separate handles or processes on the
//!   same directory never interleave.

use std::collections::BTreeMap;
use std::fs;
use std::io::{self, Write as IoWrite};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::error::ErrorCode;
use crate::lock::{LockError, LockMode, StorageLock};

/// Well-known storage keys.
pub mod keys {
    pub const SESSION_TOKEN: &str = "TICKETAPP_AUTH_TOKEN";
    pub const REGISTERED_USER: &str = "TICKETAPP_REGISTERED_USER";
    pub const TICKETS: &str = "TICKETAPP_TICKETS";
    pub const TICKET_SEQ: &str = "TICKETAPP_TICKET_SEQ";
}

const LOCK_TIMEOUT: Duration = Duration::from_secs(5);

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("storage I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("stored value under {key} is not valid JSON: {source}")]
    Json {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("lock error: {0}")]
    Lock(#[from] LockError),

    #[error("invalid storage key: {0:?}")]
    InvalidKey(String),

    #[error("exclusive section did not run")]
    SectionSkipped,
}

impl StorageError {
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::Io(_) => ErrorCode::StorageWriteFailed,
            Self::Json { .. } => ErrorCode::CorruptStorage,
            Self::Lock(err) => err.code(),
            Self::InvalidKey(_) | Self::SectionSkipped => ErrorCode::InternalUnexpected,
        }
    }
}

// ---------------------------------------------------------------------------
// Trait
// ---------------------------------------------------------------------------

/// String-valued key-value storage.
///
/// Implementations may block the calling thread on file I/O and lock waits.
/// Async callers that can contend with other processes run them through
/// `tokio::task::spawn_blocking`.
pub trait KvStore: Send + Sync {
    /// # Errors
    ///
    /// Returns [`StorageError`] if the backing medium cannot be read.
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// # Errors
    ///
    /// Returns [`StorageError`] if the value cannot be written.
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;

    /// # Errors
    ///
    /// Returns [`StorageError`] if the value exists but cannot be removed.
    fn remove(&self, key: &str) -> Result<(), StorageError>;

    /// Call `f` exactly once with a view that no other writer can touch
    /// until `f` returns.
    ///
    /// Operations on the view must not call `exclusive` on the outer store.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] if exclusive access cannot be obtained, or
    /// whatever `f` returns.
    fn exclusive(
        &self,
        f: &mut dyn FnMut(&dyn KvStore) -> Result<(), StorageError>,
    ) -> Result<(), StorageError>;
}

/// Typed JSON access on top of any [`KvStore`].
pub trait KvStoreExt: KvStore {
    /// # Errors
    ///
    /// Returns [`StorageError::Json`] if the stored value does not decode as `T`.
    fn get_json<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, StorageError> {
        let Some(raw) = self.get(key)? else {
            return Ok(None);
        };
        serde_json::from_str(&raw)
            .map(Some)
            .map_err(|source| StorageError::Json {
                key: key.to_string(),
                source,
            })
    }

    /// # Errors
    ///
    /// Returns [`StorageError`] if encoding or writing fails.
    fn set_json<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> Result<(), StorageError> {
        let raw = serde_json::to_string(value).map_err(|source| StorageError::Json {
            key: key.to_string(),
            source,
        })?;
        self.set(key, &raw)
    }

    /// Typed wrapper over [`KvStore::exclusive`].
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] if the section cannot be entered or `f` fails.
    fn with_exclusive<T>(
        &self,
        f: impl FnOnce(&dyn KvStore) -> Result<T, StorageError>,
    ) -> Result<T, StorageError> {
        let mut f = Some(f);
        let mut outcome = None;
        self.exclusive(&mut |view: &dyn KvStore| {
            if let Some(f) = f.take() {
                outcome = Some(f(view)?);
            }
            Ok(())
        })?;
        outcome.ok_or(StorageError::SectionSkipped)
    }
}

impl<K: KvStore + ?Sized> KvStoreExt for K {}

// ---------------------------------------------------------------------------
// In-memory backend
// ---------------------------------------------------------------------------

/// Process-memory storage. Contents vanish with the value.
#[derive(Debug, Default)]
pub struct MemoryKv {
    values: Mutex<BTreeMap<String, String>>,
    section: Mutex<()>,
}

impl MemoryKv {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of keys currently stored.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl KvStore for MemoryKv {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let values = self.values.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(values.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let mut values = self.values.lock().unwrap_or_else(PoisonError::into_inner);
        values.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        let mut values = self.values.lock().unwrap_or_else(PoisonError::into_inner);
        values.remove(key);
        Ok(())
    }

    fn exclusive(
        &self,
        f: &mut dyn FnMut(&dyn KvStore) -> Result<(), StorageError>,
    ) -> Result<(), StorageError> {
        let _section = self.section.lock().unwrap_or_else(PoisonError::into_inner);
        f(self)
    }
}

// ---------------------------------------------------------------------------
// File backend
// ---------------------------------------------------------------------------

/// One JSON file per key under a data directory.
#[derive(Debug, Clone)]
pub struct FileKv {
    root: PathBuf,
}

impl FileKv {
    /// Open (creating if needed) a storage directory.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Io`] if the directory cannot be created.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let root = root.into();
        fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn lock(&self, mode: LockMode) -> Result<StorageLock, StorageError> {
        Ok(StorageLock::acquire(&self.root, mode, LOCK_TIMEOUT)?)
    }

    fn value_path(&self, key: &str) -> Result<PathBuf, StorageError> {
        let valid = !key.is_empty()
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
        if !valid {
            return Err(StorageError::InvalidKey(key.to_string()));
        }
        Ok(self.root.join(format!("{key}.json")))
    }

    fn read_value(&self, key: &str) -> Result<Option<String>, StorageError> {
        match fs::read_to_string(self.value_path(key)?) {
            Ok(raw) => Ok(Some(raw)),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    fn write_value(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let path = self.value_path(key)?;
        let tmp = path.with_extension("json.tmp");

        let mut file = fs::File::create(&tmp)?;
        file.write_all(value.as_bytes())?;
        file.sync_all()?;
        drop(file);
        fs::rename(&tmp, &path)?;

        debug!(key, bytes = value.len(), "storage value written");
        Ok(())
    }

    fn remove_value(&self, key: &str) -> Result<(), StorageError> {
        match fs::remove_file(self.value_path(key)?) {
            Ok(()) => {
                debug!(key, "storage value removed");
                Ok(())
            }
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err.into()),
        }
    }
}

impl KvStore for FileKv {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let _lock = self.lock(LockMode::Shared)?;
        self.read_value(key)
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let _lock = self.lock(LockMode::Exclusive)?;
        self.write_value(key, value)
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        let _lock = self.lock(LockMode::Exclusive)?;
        self.remove_value(key)
    }

    fn exclusive(
        &self,
        f: &mut dyn FnMut(&dyn KvStore) -> Result<(), StorageError>,
    ) -> Result<(), StorageError> {
        let _lock = self.lock(LockMode::Exclusive)?;
        f(&LockedFileKv { kv: self })
    }
}

/// [`FileKv`] access while the caller already holds the exclusive lock.
struct LockedFileKv<'a> {
    kv: &'a FileKv,
}

impl KvStore for LockedFileKv<'_> {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        self.kv.read_value(key)
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.kv.write_value(key, value)
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        self.kv.remove_value(key)
    }

    fn exclusive(
        &self,
        f: &mut dyn FnMut(&dyn KvStore) -> Result<(), StorageError>,
    ) -> Result<(), StorageError> {
        f(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use tempfile::TempDir;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Sample {
        name: String,
        count: u32,
    }

    fn exercise_backend(kv: &dyn KvStore) {
        assert_eq!(kv.get("A").unwrap(), None);
        kv.set("A", "\"one\"").unwrap();
        assert_eq!(kv.get("A").unwrap().as_deref(), Some("\"one\""));
        kv.set("A", "\"two\"").unwrap();
        assert_eq!(kv.get("A").unwrap().as_deref(), Some("\"two\""));
        kv.remove("A").unwrap();
        assert_eq!(kv.get("A").unwrap(), None);
        kv.remove("A").unwrap();
    }

    #[test]
    fn memory_backend_contract() {
        let kv = MemoryKv::new();
        exercise_backend(&kv);
        assert!(kv.is_empty());
    }

    #[test]
    fn file_backend_contract() {
        let dir = TempDir::new().unwrap();
        let kv = FileKv::open(dir.path()).unwrap();
        exercise_backend(&kv);
    }

    #[test]
    fn file_backend_persists_across_instances() {
        let dir = TempDir::new().unwrap();
        let sample = Sample {
            name: "alice".to_string(),
            count: 3,
        };
        FileKv::open(dir.path())
            .unwrap()
            .set_json("SAMPLE", &sample)
            .unwrap();

        let reopened = FileKv::open(dir.path()).unwrap();
        assert_eq!(reopened.get_json::<Sample>("SAMPLE").unwrap(), Some(sample));
        assert!(dir.path().join("SAMPLE.json").is_file());
        assert!(!dir.path().join("SAMPLE.json.tmp").exists());
    }

    #[test]
    fn file_backend_rejects_path_like_keys() {
        let dir = TempDir::new().unwrap();
        let kv = FileKv::open(dir.path()).unwrap();
        let err = kv.set("../escape", "1").unwrap_err();
        assert!(matches!(err, StorageError::InvalidKey(_)));
        assert_eq!(err.code(), ErrorCode::InternalUnexpected);
    }

    #[test]
    fn corrupt_json_maps_to_corrupt_storage() {
        let kv = MemoryKv::new();
        kv.set("BROKEN", "{not json").unwrap();
        let err = kv.get_json::<Sample>("BROKEN").unwrap_err();
        assert!(matches!(err, StorageError::Json { ref key, .. } if key == "BROKEN"));
        assert_eq!(err.code(), ErrorCode::CorruptStorage);
    }

    fn bump(kv: &dyn KvStore) -> Result<u64, StorageError> {
        kv.with_exclusive(|view| {
            let n = view.get_json::<u64>("COUNTER")?.unwrap_or(0) + 1;
            view.set_json("COUNTER", &n)?;
            Ok(n)
        })
    }

    #[test]
    fn exclusive_sections_do_not_lose_increments_across_handles() {
        let dir = TempDir::new().unwrap();
        let workers: Vec<_> = (0..4)
            .map(|_| {
                let kv = FileKv::open(dir.path()).unwrap();
                std::thread::spawn(move || {
                    for _ in 0..25 {
                        bump(&kv).unwrap();
                    }
                })
            })
            .collect();
        for worker in workers {
            worker.join().unwrap();
        }

        let kv = FileKv::open(dir.path()).unwrap();
        assert_eq!(kv.get_json::<u64>("COUNTER").unwrap(), Some(100));
    }

    #[test]
    fn exclusive_section_holds_out_other_handles() {
        let dir = TempDir::new().unwrap();
        let kv = FileKv::open(dir.path()).unwrap();

        let err = kv
            .with_exclusive(|view| {
                view.set("A", "1")?;
                StorageLock::acquire(dir.path(), LockMode::Shared, Duration::from_millis(30))?;
                Ok(())
            })
            .unwrap_err();
        assert!(matches!(err, StorageError::Lock(LockError::Timeout { .. })));
        assert_eq!(kv.get("A").unwrap().as_deref(), Some("1"));
    }

    #[test]
    fn memory_backend_runs_sections_inline() {
        let kv = MemoryKv::new();
        assert_eq!(bump(&kv).unwrap(), 1);
        assert_eq!(bump(&kv).unwrap(), 2);
    }

    #[test]
    fn typed_helpers_work_through_trait_objects() {
        let kv: Box<dyn KvStore> = Box::new(MemoryKv::new());
        kv.set_json("N", &42_u64).unwrap();
        assert_eq!(kv.get_json::<u64>("N").unwrap(), Some(42));
    }
}
