// Directory-backed cache store.
// One JSON file per entry, written atomically, named by the hash of the request identity.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use tracing::debug;

use crate::error::{FellowError, Result};

use super::paths::entry_path;
use super::store::{CacheStats, CacheStore, CachedData, CachedResponse};

static TEMP_SEQUENCE: AtomicU64 = AtomicU64::new(0);

/// Cache store persisting entries under a directory.
#[derive(Debug, Clone)]
pub struct DiskCache {
    dir: PathBuf,
}

impl DiskCache {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Cache in the platform cache directory.
    pub fn default_location() -> Result<Self> {
        super::paths::cache_dir()
            .map(Self::new)
            .ok_or_else(|| FellowError::Other("could not determine cache directory".to_string()))
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Entry files currently in the cache directory.
    fn entry_files(&self) -> Result<Vec<PathBuf>> {
        if !self.dir.exists() {
            return Ok(Vec::new());
        }

        let mut files = Vec::new();
        for entry in fs::read_dir(&self.dir)? {
            let path = entry?.path();
            if path.extension().is_some_and(|ext| ext == "json") {
                files.push(path);
            }
        }
        Ok(files)
    }

    fn read_entry(path: &Path) -> Option<CachedData<CachedResponse>> {
        let contents = fs::read_to_string(path).ok()?;
        match serde_json::from_str(&contents) {
            Ok(entry) => Some(entry),
            Err(e) => {
                debug!(path = %path.display(), error = %e, "ignoring unreadable cache entry");
                None
            }
        }
    }
}

impl CacheStore for DiskCache {
    fn get(&self, key: &str) -> Result<Option<CachedData<CachedResponse>>> {
        let path = entry_path(&self.dir, key);
        if !path.exists() {
            return Ok(None);
        }

        // A hash collision would hand back someone else's entry.
        Ok(Self::read_entry(&path).filter(|entry| entry.key == key))
    }

    fn set(&self, entry: CachedData<CachedResponse>) -> Result<()> {
        fs::create_dir_all(&self.dir)?;

        let path = entry_path(&self.dir, &entry.key);
        let json = serde_json::to_string(&entry)?;

        // Write atomically via a temp file private to this writer
        let sequence = TEMP_SEQUENCE.fetch_add(1, Ordering::Relaxed);
        let temp_path = path.with_extension(format!("{}-{}.tmp", process::id(), sequence));
        let mut file = fs::File::create(&temp_path)?;
        file.write_all(json.as_bytes())?;
        file.sync_all()?;
        if let Err(e) = fs::rename(&temp_path, &path) {
            let _ = fs::remove_file(&temp_path);
            return Err(e.into());
        }

        Ok(())
    }

    fn remove(&self, key: &str) -> Result<bool> {
        let path = entry_path(&self.dir, key);
        match fs::remove_file(&path) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    fn invalidate(&self, prefix: &str) -> Result<usize> {
        let mut removed = 0;
        for path in self.entry_files()? {
            let matches = Self::read_entry(&path).is_none_or(|entry| entry.key.starts_with(prefix));
            if matches {
                fs::remove_file(&path)?;
                removed += 1;
            }
        }
        Ok(removed)
    }

    fn clear(&self) -> Result<usize> {
        let files = self.entry_files()?;
        for path in &files {
            fs::remove_file(path)?;
        }
        Ok(files.len())
    }

    fn stats(&self, ttl: Duration) -> Result<CacheStats> {
        let mut stats = CacheStats {
            location: self.dir.display().to_string(),
            ..Default::default()
        };

        for path in self.entry_files()? {
            stats.entries += 1;
            stats.total_bytes += fs::metadata(&path)?.len();
            if Self::read_entry(&path).is_none_or(|entry| entry.is_expired(ttl)) {
                stats.expired += 1;
            }
        }
        Ok(stats)
    }
}
