use super::StorageBackend;
use crate::error::StorageError;
use rustc_hash::FxHashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock};

#[derive(Default)]
struct MemoryInner {
    items: RwLock<FxHashMap<String, String>>,
    unavailable: AtomicBool,
    writes_fail: AtomicBool,
}

/// In-process storage
///
/// Clones share the same map, so a clone kept by a test can inspect what the
/// engine wrote or simulate a reload by handing the same storage to a new
/// context. Failure switches let callers reproduce quota and privacy errors.
#[derive(Clone, Default)]
pub struct MemoryStorage {
    inner: Arc<MemoryInner>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every write fail with [`StorageError::QuotaExceeded`]
    pub fn set_writes_fail(&self, fail: bool) {
        self.inner.writes_fail.store(fail, Ordering::SeqCst);
    }

    /// Make every operation fail with [`StorageError::Unavailable`]
    pub fn set_available(&self, available: bool) {
        self.inner.unavailable.store(!available, Ordering::SeqCst);
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    fn check_available(&self) -> Result<(), StorageError> {
        if self.inner.unavailable.load(Ordering::SeqCst) {
            Err(StorageError::Unavailable)
        } else {
            Ok(())
        }
    }

    fn check_writable(&self, key: &str) -> Result<(), StorageError> {
        self.check_available()?;
        if self.inner.writes_fail.load(Ordering::SeqCst) {
            return Err(StorageError::QuotaExceeded {
                key: key.to_string(),
            });
        }
        Ok(())
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, FxHashMap<String, String>> {
        self.inner
            .items
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, FxHashMap<String, String>> {
        self.inner
            .items
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl StorageBackend for MemoryStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError> {
        self.check_available()?;
        Ok(self.read().get(key).cloned())
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.check_writable(key)?;
        self.write().insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove_item(&self, key: &str) -> Result<(), StorageError> {
        self.check_writable(key)?;
        self.write().remove(key);
        Ok(())
    }

    fn clear(&self) -> Result<(), StorageError> {
        self.check_available()?;
        self.write().clear();
        Ok(())
    }
}

impl std::fmt::Debug for MemoryStorage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryStorage")
            .field("len", &self.len())
            .field("available", &!self.inner.unavailable.load(Ordering::SeqCst))
            .field("writes_fail", &self.inner.writes_fail.load(Ordering::SeqCst))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clones_share_contents() {
        let storage = MemoryStorage::new();
        let other = storage.clone();
        storage.set_item("k", "v").unwrap();
        assert_eq!(other.get_item("k").unwrap().as_deref(), Some("v"));
        other.remove_item("k").unwrap();
        assert!(storage.is_empty());
    }

    #[test]
    fn failing_writes_keep_reads_working() {
        let storage = MemoryStorage::new();
        storage.set_item("k", "v").unwrap();
        storage.set_writes_fail(true);

        assert!(matches!(
            storage.set_item("k", "w"),
            Err(StorageError::QuotaExceeded { .. })
        ));
        assert_eq!(storage.get_item("k").unwrap().as_deref(), Some("v"));
    }

    #[test]
    fn unavailable_rejects_everything() {
        let storage = MemoryStorage::new();
        storage.set_available(false);
        assert!(matches!(storage.get_item("k"), Err(StorageError::Unavailable)));
        assert!(matches!(storage.clear(), Err(StorageError::Unavailable)));
    }
}
