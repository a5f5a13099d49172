// Cache path utilities.
// Resolves the cache directory and maps request identities to entry file names.

use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use sha2::{Digest, Sha256};

/// Get the base cache directory (~/.cache/follow-fellow on Linux).
pub fn cache_dir() -> Option<PathBuf> {
    ProjectDirs::from("", "", "follow-fellow").map(|dirs| dirs.cache_dir().to_path_buf())
}

/// Request identity used as cache key: method plus the full URL with query.
pub fn request_key(method: &str, url: &str) -> String {
    format!("{} {}", method.to_ascii_uppercase(), url)
}

/// Hex SHA-256 of a cache key.
pub fn key_digest(key: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(key.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Path to the file holding the entry for `key`.
pub fn entry_path(dir: &Path, key: &str) -> PathBuf {
    dir.join(format!("{}.json", key_digest(key)))
}
