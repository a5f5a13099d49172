// In-memory cache store.
// Used by tests and for runs that should leave nothing on disk.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use crate::error::Result;

use super::store::{CacheStats, CacheStore, CachedData, CachedResponse};

#[derive(Debug, Default)]
pub struct MemoryCache {
    entries: Mutex<HashMap<String, CachedData<CachedResponse>>>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, CachedData<CachedResponse>>> {
        self.entries.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }
}

impl CacheStore for MemoryCache {
    fn get(&self, key: &str) -> Result<Option<CachedData<CachedResponse>>> {
        Ok(self.lock().get(key).cloned())
    }

    fn set(&self, entry: CachedData<CachedResponse>) -> Result<()> {
        self.lock().insert(entry.key.clone(), entry);
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<bool> {
        Ok(self.lock().remove(key).is_some())
    }

    fn invalidate(&self, prefix: &str) -> Result<usize> {
        let mut entries = self.lock();
        let before = entries.len();
        entries.retain(|key, _| !key.starts_with(prefix));
        Ok(before - entries.len())
    }

    fn clear(&self) -> Result<usize> {
        let mut entries = self.lock();
        let removed = entries.len();
        entries.clear();
        Ok(removed)
    }

    fn stats(&self, ttl: Duration) -> Result<CacheStats> {
        let entries = self.lock();
        Ok(CacheStats {
            entries: entries.len(),
            expired: entries.values().filter(|e| e.is_expired(ttl)).count(),
            total_bytes: entries.values().map(|e| e.data.body.len() as u64).sum(),
            location: "memory".to_string(),
        })
    }
}
