// Cache module for response caching.
// Stores GitHub API responses keyed by request identity so repeated runs skip the network.

pub mod disk;
pub mod memory;
pub mod paths;
pub mod store;

pub use disk::DiskCache;
pub use memory::MemoryCache;
pub use paths::{cache_dir, request_key};
pub use store::{CacheStats, CacheStore, CachedData, CachedResponse, DEFAULT_TTL};
