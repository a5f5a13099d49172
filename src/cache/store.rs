// Cache store abstraction.
// Defines the cached entry format, TTL checks, and the key-value interface backends implement.

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Default TTL for cached responses: 1 hour.
pub const DEFAULT_TTL: Duration = Duration::from_secs(60 * 60);

/// Wrapper for cached data with metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CachedData<T> {
    /// Request identity this entry was stored under.
    pub key: String,
    /// The cached data.
    pub data: T,
    /// When the data was cached.
    pub cached_at: DateTime<Utc>,
}

impl<T> CachedData<T> {
    /// Create a new cached data entry stamped with the current time.
    pub fn new(key: impl Into<String>, data: T) -> Self {
        Self {
            key: key.into(),
            data,
            cached_at: Utc::now(),
        }
    }

    /// Check if this cached data has expired based on TTL.
    pub fn is_expired(&self, ttl: Duration) -> bool {
        let elapsed = Utc::now()
            .signed_duration_since(self.cached_at)
            .to_std()
            .unwrap_or(Duration::ZERO);

        elapsed >= ttl
    }

    /// Check if this cached data is still valid (not expired).
    pub fn is_valid(&self, ttl: Duration) -> bool {
        !self.is_expired(ttl)
    }
}

/// A successful response as it is kept in the cache.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CachedResponse {
    pub status: u16,
    pub body: String,
    /// `rel="next"` link of a paginated response.
    #[serde(default)]
    pub next: Option<String>,
}

/// Summary of what a cache currently holds.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheStats {
    pub entries: usize,
    pub expired: usize,
    pub total_bytes: u64,
    pub location: String,
}

/// Key-value capability the HTTP client caches through.
pub trait CacheStore: Send + Sync {
    /// Look up an entry regardless of age. Unreadable entries are misses.
    fn get(&self, key: &str) -> Result<Option<CachedData<CachedResponse>>>;

    /// Store an entry, replacing any previous one under the same key.
    fn set(&self, entry: CachedData<CachedResponse>) -> Result<()>;

    /// Drop the entry stored under exactly `key`. Returns whether one existed.
    fn remove(&self, key: &str) -> Result<bool>;

    /// Drop every entry whose key starts with `prefix`. Returns the number removed.
    fn invalidate(&self, prefix: &str) -> Result<usize>;

    /// Drop everything. Returns the number removed.
    fn clear(&self) -> Result<usize>;

    /// Count entries, counting as expired those older than `ttl`.
    fn stats(&self, ttl: Duration) -> Result<CacheStats>;
}
