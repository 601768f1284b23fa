// Where the favorites list lives between runs
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use compass_cache::{CacheManager, SlotPolicy};

use crate::{Error, Result};

/// One SQLite connection shared by the favorites slot and the recipe cache
pub type SharedCache = Arc<Mutex<CacheManager>>;

/// Durable string slot holding the serialized favorites list
pub trait FavoritesBackend: Send {
    /// `Ok(None)` when nothing has been stored (or it expired)
    fn load(&self) -> Result<Option<String>>;

    fn save(&mut self, serialized: &str) -> Result<()>;
}

/// Favorites kept in a named slot of the local SQLite database
pub struct SlotBackend {
    cache: SharedCache,
    slot: String,
    policy: SlotPolicy,
}

impl SlotBackend {
    pub fn new(cache: SharedCache, slot: impl Into<String>, policy: SlotPolicy) -> Self {
        Self {
            cache,
            slot: slot.into(),
            policy,
        }
    }
}

impl FavoritesBackend for SlotBackend {
    fn load(&self) -> Result<Option<String>> {
        lock(&self.cache)
            .get_slot(&self.slot)
            .map_err(|e| Error::CacheError(e.to_string()))
    }

    fn save(&mut self, serialized: &str) -> Result<()> {
        lock(&self.cache)
            .set_slot(&self.slot, serialized, &self.policy)
            .map_err(|e| Error::CacheError(e.to_string()))
    }
}

/// Process-local slot for tests and `--ephemeral` runs.
///
/// Clones share the same slot, so a test can keep a handle and inspect
/// what the store wrote.
#[derive(Debug, Clone, Default)]
pub struct MemoryBackend {
    slot: Arc<Mutex<Option<String>>>,
    fail_writes: Arc<AtomicBool>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_value(value: impl Into<String>) -> Self {
        let backend = Self::default();
        *lock(&backend.slot) = Some(value.into());
        backend
    }

    /// Current raw slot contents
    pub fn value(&self) -> Option<String> {
        lock(&self.slot).clone()
    }

    /// Make every following save fail, like a full or read-only disk
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }
}

impl FavoritesBackend for MemoryBackend {
    fn load(&self) -> Result<Option<String>> {
        Ok(self.value())
    }

    fn save(&mut self, serialized: &str) -> Result<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(Error::CacheError("memory slot is read-only".to_string()));
        }
        *lock(&self.slot) = Some(serialized.to_string());
        Ok(())
    }
}

/// A panic elsewhere must not lock everyone out of the data
pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_slot_backend_roundtrip() {
        let cache: SharedCache = Arc::new(Mutex::new(CacheManager::in_memory().unwrap()));
        let mut backend = SlotBackend::new(cache.clone(), "favorites", SlotPolicy::default());

        assert_eq!(backend.load().unwrap(), None);
        backend.save("[]").unwrap();
        assert_eq!(backend.load().unwrap().as_deref(), Some("[]"));

        // Same connection, different slot name: independent
        let other = SlotBackend::new(cache, "elsewhere", SlotPolicy::default());
        assert_eq!(other.load().unwrap(), None);
    }

    #[test]
    fn test_slot_backend_reports_oversized_writes() {
        let cache: SharedCache = Arc::new(Mutex::new(CacheManager::in_memory().unwrap()));
        let policy = SlotPolicy {
            retention: Duration::days(365),
            max_bytes: 2,
        };
        let mut backend = SlotBackend::new(cache, "favorites", policy);

        assert!(matches!(backend.save("[{}]"), Err(Error::CacheError(_))));
    }

    #[test]
    fn test_memory_backend_shares_between_clones() {
        let backend = MemoryBackend::new();
        let mut writer = backend.clone();

        writer.save("[1]").unwrap();
        assert_eq!(backend.value().as_deref(), Some("[1]"));

        backend.set_fail_writes(true);
        assert!(writer.save("[2]").is_err());
        assert_eq!(backend.value().as_deref(), Some("[1]"));
    }
}
