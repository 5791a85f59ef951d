//! Persistent HTTP response cache.
//!
//! Entries are keyed by request path (including the query string) and hold
//! the validator, status, headers, and body of the last fresh response. The
//! store only ever inserts or overwrites; nothing is deleted.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tokio::sync::RwLock;
use tracing::{debug, info};

use crate::error::StoreError;
use crate::persistence::write_atomic;

/// On-disk format version of [`FileCacheStore`].
const CACHE_FORMAT_VERSION: u32 = 1;

// ============================================================================
// Cache Entry
// ============================================================================

/// A cached response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheEntry {
    /// Request path with query string.
    pub key: String,
    /// Revalidation token (`ETag`), if the response carried one.
    pub validator: Option<String>,
    /// HTTP status of the stored response.
    pub status: u16,
    /// Response headers, lowercase names.
    pub headers: BTreeMap<String, String>,
    /// Response body.
    pub body: String,
    /// When the entry was written.
    pub stored_at: DateTime<Utc>,
}

impl CacheEntry {
    /// Creates an entry stamped with the current time.
    pub fn new(
        key: impl Into<String>,
        validator: Option<String>,
        status: u16,
        headers: BTreeMap<String, String>,
        body: impl Into<String>,
    ) -> Self {
        Self {
            key: key.into(),
            validator,
            status,
            headers,
            body: body.into(),
            stored_at: Utc::now(),
        }
    }
}

// ============================================================================
// Store Trait
// ============================================================================

/// Durable key-value storage for cached responses.
#[async_trait]
pub trait CacheStore: Send + Sync {
    /// Looks up the entry for a request path.
    async fn get(&self, key: &str) -> Result<Option<CacheEntry>, StoreError>;

    /// Inserts or overwrites the entry under `entry.key`.
    async fn put(&self, entry: CacheEntry) -> Result<(), StoreError>;

    /// Number of stored entries.
    async fn len(&self) -> Result<usize, StoreError>;

    /// Returns true if nothing is stored.
    async fn is_empty(&self) -> Result<bool, StoreError> {
        Ok(self.len().await? == 0)
    }
}

// ============================================================================
// File Store
// ============================================================================

#[derive(Debug, Deserialize)]
struct CacheFile {
    version: u32,
    entries: BTreeMap<String, CacheEntry>,
}

/// Cache store backed by a single JSON file.
///
/// The file is read once on [`open`](Self::open) and rewritten atomically on
/// every [`put`](CacheStore::put). Writers are serialized by the inner lock,
/// so the file always reflects a complete map.
#[derive(Debug)]
pub struct FileCacheStore {
    path: PathBuf,
    entries: RwLock<BTreeMap<String, CacheEntry>>,
}

impl FileCacheStore {
    /// Opens the store at `path`, creating an empty one if the file is missing.
    ///
    /// Fails with [`StoreError::Corrupted`] if the file exists but cannot be
    /// decoded.
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        let entries = match tokio::fs::read(&path).await {
            Ok(bytes) => Self::decode(&path, &bytes)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "No cache file yet");
                BTreeMap::new()
            }
            Err(e) => return Err(e.into()),
        };
        info!(path = %path.display(), entries = entries.len(), "Opened HTTP cache");

        Ok(Self {
            path,
            entries: RwLock::new(entries),
        })
    }

    fn decode(path: &Path, bytes: &[u8]) -> Result<BTreeMap<String, CacheEntry>, StoreError> {
        let corrupted = |reason: String| StoreError::Corrupted {
            path: path.display().to_string(),
            reason,
        };
        let file: CacheFile = serde_json::from_slice(bytes).map_err(|e| corrupted(e.to_string()))?;
        if file.version != CACHE_FORMAT_VERSION {
            return Err(corrupted(format!("unsupported version {}", file.version)));
        }
        Ok(file.entries)
    }

    /// Path of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn write(path: &Path, entries: &BTreeMap<String, CacheEntry>) -> Result<(), StoreError> {
        #[derive(Serialize)]
        struct CacheFileRef<'a> {
            version: u32,
            entries: &'a BTreeMap<String, CacheEntry>,
        }

        let json = serde_json::to_vec(&CacheFileRef {
            version: CACHE_FORMAT_VERSION,
            entries,
        })?;
        write_atomic(path, &json).await
    }
}

#[async_trait]
impl CacheStore for FileCacheStore {
    async fn get(&self, key: &str) -> Result<Option<CacheEntry>, StoreError> {
        Ok(self.entries.read().await.get(key).cloned())
    }

    async fn put(&self, entry: CacheEntry) -> Result<(), StoreError> {
        let mut entries = self.entries.write().await;
        let key = entry.key.clone();
        let previous = entries.insert(key.clone(), entry);

        if let Err(e) = Self::write(&self.path, &entries).await {
            // Keep memory and disk in agreement.
            match previous {
                Some(old) => entries.insert(key, old),
                None => entries.remove(&key),
            };
            return Err(e);
        }

        debug!(key = %key, "Cache entry stored");
        Ok(())
    }

    async fn len(&self) -> Result<usize, StoreError> {
        Ok(self.entries.read().await.len())
    }
}

// ============================================================================
// Memory Store
// ============================================================================

/// Non-persistent cache store, for tests and one-off runs.
#[derive(Debug, Default)]
pub struct MemoryCacheStore {
    entries: RwLock<BTreeMap<String, CacheEntry>>,
}

impl MemoryCacheStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns every stored key in sorted order.
    pub async fn keys(&self) -> Vec<String> {
        self.entries.read().await.keys().cloned().collect()
    }
}

#[async_trait]
impl CacheStore for MemoryCacheStore {
    async fn get(&self, key: &str) -> Result<Option<CacheEntry>, StoreError> {
        Ok(self.entries.read().await.get(key).cloned())
    }

    async fn put(&self, entry: CacheEntry) -> Result<(), StoreError> {
        self.entries.write().await.insert(entry.key.clone(), entry);
        Ok(())
    }

    async fn len(&self) -> Result<usize, StoreError> {
        Ok(self.entries.read().await.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn entry(key: &str, etag: &str, body: &str) -> CacheEntry {
        let mut headers = BTreeMap::new();
        headers.insert("etag".to_string(), etag.to_string());
        CacheEntry::new(key, Some(etag.to_string()), 200, headers, body)
    }

    #[tokio::test]
    async fn test_file_store_survives_reopen() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("cache").join("http_cache.json");

        let store = FileCacheStore::open(&path).await.unwrap();
        assert!(store.is_empty().await.unwrap());
        store.put(entry("/a?page=1", "\"e1\"", "<a/>")).await.unwrap();
        drop(store);

        let reopened = FileCacheStore::open(&path).await.unwrap();
        let cached = reopened.get("/a?page=1").await.unwrap().unwrap();
        assert_eq!(cached.validator.as_deref(), Some("\"e1\""));
        assert_eq!(cached.body, "<a/>");
    }

    #[tokio::test]
    async fn test_file_store_overwrites() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("http_cache.json");

        let store = FileCacheStore::open(&path).await.unwrap();
        store.put(entry("/a", "\"e1\"", "old")).await.unwrap();
        store.put(entry("/a", "\"e2\"", "new")).await.unwrap();

        assert_eq!(store.len().await.unwrap(), 1);
        let cached = store.get("/a").await.unwrap().unwrap();
        assert_eq!(cached.body, "new");
    }

    #[tokio::test]
    async fn test_corrupted_file_is_reported() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("http_cache.json");
        tokio::fs::write(&path, "not json").await.unwrap();

        let err = FileCacheStore::open(&path).await.unwrap_err();
        assert!(matches!(err, StoreError::Corrupted { .. }));
    }

    #[tokio::test]
    async fn test_unknown_version_is_corrupted() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("http_cache.json");
        tokio::fs::write(&path, r#"{"version": 99, "entries": {}}"#)
            .await
            .unwrap();

        let err = FileCacheStore::open(&path).await.unwrap_err();
        assert!(matches!(err, StoreError::Corrupted { .. }));
    }

    #[tokio::test]
    async fn test_memory_store() {
        let store = MemoryCacheStore::new();
        store.put(entry("/b", "\"1\"", "b")).await.unwrap();
        store.put(entry("/a", "\"1\"", "a")).await.unwrap();
        assert_eq!(store.keys().await, vec!["/a", "/b"]);
    }
}
