//! Cache manager for persisting API responses to disk
//!
//! Provides a `CacheManager` that stores serializable data to JSON files with
//! a write timestamp. Freshness is decided by the reader, who supplies a
//! max-age on every lookup.

use chrono::{DateTime, Duration as ChronoDuration, Utc};
use directories::ProjectDirs;
use serde::{de::DeserializeOwned, de::IgnoredAny, Deserialize, Serialize};
use std::collections::hash_map::DefaultHasher;
use std::fs;
use std::future::Future;
use std::hash::{Hash, Hasher};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Wrapper struct for cached data stored on disk
#[derive(Debug, Serialize, Deserialize)]
struct CacheEntry<T> {
    /// The cached data
    data: T,
    /// When the data was cached
    cached_at: DateTime<Utc>,
}

/// A raw cache read, before any freshness check
#[derive(Debug)]
pub struct CachedData<T> {
    /// The cached data
    pub data: T,
    /// When the data was originally cached
    pub cached_at: DateTime<Utc>,
}

/// Manages reading and writing cached data to disk
///
/// The cache manager stores data as JSON files in an XDG-compliant cache directory
/// (`~/.cache/welcome-dash/` on Linux), one file per key. Nothing in here
/// returns an error to callers: unreadable entries are misses and failed
/// writes are logged.
#[derive(Debug, Clone)]
pub struct CacheManager {
    /// Directory where cache files are stored
    cache_dir: PathBuf,
}

impl CacheManager {
    /// Creates a new CacheManager using the XDG-compliant cache directory
    ///
    /// Falls back to a directory under the system temp dir when no home
    /// directory can be determined.
    pub fn new() -> Self {
        Self {
            cache_dir: default_cache_dir(),
        }
    }

    /// Creates a new CacheManager with a custom cache directory
    pub fn with_dir(cache_dir: PathBuf) -> Self {
        Self { cache_dir }
    }

    /// Directory holding the cache files
    pub fn dir(&self) -> &Path {
        &self.cache_dir
    }

    /// Returns the path to a cache file for the given key
    fn cache_path(&self, key: &str) -> PathBuf {
        self.cache_dir.join(format!("{}.json", sanitize_key(key)))
    }

    /// Ensures the cache directory exists
    pub fn ensure_dir(&self) -> std::io::Result<()> {
        fs::create_dir_all(&self.cache_dir)
    }

    /// Writes data to the cache, stamped with the current time
    pub fn write<T: Serialize>(&self, key: &str, data: &T) -> std::io::Result<()> {
        self.ensure_dir()?;
        fs::write(self.cache_path(key), encode_entry(data)?)
    }

    /// Reads data from the cache regardless of age
    ///
    /// Returns `None` if the cache entry doesn't exist or cannot be parsed.
    pub fn read<T: DeserializeOwned>(&self, key: &str) -> Option<CachedData<T>> {
        let content = fs::read_to_string(self.cache_path(key)).ok()?;
        decode_entry(&content)
    }

    /// Returns the stored value if it is younger than `max_age`
    pub fn get<T: DeserializeOwned>(&self, key: &str, max_age: Duration) -> Option<T> {
        live_data(key, self.read(key), max_age)
    }

    /// Stores a value under `key`, logging instead of failing
    pub fn put<T: Serialize>(&self, key: &str, data: &T) {
        if let Err(e) = self.write(key, data) {
            self.log_write_error(key, &e);
        }
    }

    /// Cache-aside lookup
    ///
    /// Returns the live cached value for `key` if there is one. Otherwise
    /// runs `producer` once, stores its successful result and returns it.
    /// Producer errors are passed through untouched and nothing is stored.
    /// File access goes through `tokio::fs`.
    pub async fn request_with_cache<T, E, F, Fut>(
        &self,
        key: &str,
        max_age: Duration,
        producer: F,
    ) -> Result<T, E>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        let path = self.cache_path(key);
        let cached = tokio::fs::read_to_string(&path)
            .await
            .ok()
            .and_then(|content| decode_entry(&content));
        if let Some(data) = live_data(key, cached, max_age) {
            return Ok(data);
        }

        let data = producer().await?;
        let written = match encode_entry(&data) {
            Ok(json) => match tokio::fs::create_dir_all(&self.cache_dir).await {
                Ok(()) => tokio::fs::write(&path, json).await,
                Err(e) => Err(e),
            },
            Err(e) => Err(e),
        };
        if let Err(e) = written {
            self.log_write_error(key, &e);
        }
        Ok(data)
    }

    fn log_write_error(&self, key: &str, error: &std::io::Error) {
        tracing::error!(key, dir = %self.cache_dir.display(), error = %error, "failed to write cache entry");
    }

    /// Deletes entries written longer than `older_than` ago
    ///
    /// Files that no longer parse as cache entries are removed as well.
    /// Returns the number of files deleted.
    pub fn prune(&self, older_than: Duration) -> usize {
        let now = Utc::now();
        self.remove_where(|content| {
            match serde_json::from_str::<CacheEntry<IgnoredAny>>(content) {
                Ok(entry) => !is_live(entry.cached_at, now, older_than),
                Err(_) => true,
            }
        })
    }

    /// Deletes every cache entry, returning how many were removed
    pub fn clear(&self) -> usize {
        self.remove_where(|_| true)
    }

    fn remove_where(&self, should_remove: impl Fn(&str) -> bool) -> usize {
        let entries = match fs::read_dir(&self.cache_dir) {
            Ok(entries) => entries,
            Err(e) => {
                if e.kind() != std::io::ErrorKind::NotFound {
                    tracing::error!(dir = %self.cache_dir.display(), error = %e, "failed to list cache directory");
                }
                return 0;
            }
        };

        let mut removed = 0;
        for path in entries.flatten().map(|e| e.path()) {
            if path.extension().and_then(|ext| ext.to_str()) != Some("json") {
                continue;
            }
            let content = fs::read_to_string(&path).unwrap_or_default();
            if !should_remove(&content) {
                continue;
            }
            match fs::remove_file(&path) {
                Ok(()) => removed += 1,
                Err(e) => {
                    tracing::error!(path = %path.display(), error = %e, "failed to remove cache entry")
                }
            }
        }
        removed
    }
}

impl Default for CacheManager {
    fn default() -> Self {
        Self::new()
    }
}

/// `~/.cache/welcome-dash` or its platform equivalent
pub fn default_cache_dir() -> PathBuf {
    ProjectDirs::from("", "", "welcome-dash")
        .map(|dirs| dirs.cache_dir().to_path_buf())
        .unwrap_or_else(|| std::env::temp_dir().join("welcome-dash"))
}

/// An entry is live while its age is strictly below `max_age`.
///
/// An age exactly equal to `max_age` is stale, so a zero max-age never hits.
pub fn is_live(cached_at: DateTime<Utc>, now: DateTime<Utc>, max_age: Duration) -> bool {
    let Ok(max_age) = ChronoDuration::from_std(max_age) else {
        return true;
    };
    now.signed_duration_since(cached_at) < max_age
}

fn encode_entry<T: Serialize>(data: &T) -> std::io::Result<String> {
    let entry = CacheEntry {
        data,
        cached_at: Utc::now(),
    };
    serde_json::to_string_pretty(&entry)
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))
}

fn decode_entry<T: DeserializeOwned>(content: &str) -> Option<CachedData<T>> {
    let entry: CacheEntry<T> = serde_json::from_str(content).ok()?;
    Some(CachedData {
        data: entry.data,
        cached_at: entry.cached_at,
    })
}

fn live_data<T>(key: &str, cached: Option<CachedData<T>>, max_age: Duration) -> Option<T> {
    let cached = cached?;
    if is_live(cached.cached_at, Utc::now(), max_age) {
        tracing::debug!(key, "cache hit");
        Some(cached.data)
    } else {
        tracing::debug!(key, "cache entry stale");
        None
    }
}

/// Maps a cache key onto a file stem, one stem per key
///
/// ASCII letters, digits, `-`, `_` and `.` are kept. Every other byte of the
/// UTF-8 encoding, `%` included, is written as `%XX`.
fn sanitize_key(key: &str) -> String {
    let mut stem = String::with_capacity(key.len());
    for byte in key.bytes() {
        if byte.is_ascii_alphanumeric() || matches!(byte, b'-' | b'_' | b'.') {
            stem.push(char::from(byte));
        } else {
            stem.push_str(&format!("%{:02X}", byte));
        }
    }
    stem
}

/// Short stable tag for a credential, used to keep cache keys of different
/// accounts apart without writing the secret into a file name
pub fn credential_tag(secret: &str) -> String {
    let mut hasher = DefaultHasher::new();
    secret.hash(&mut hasher);
    format!("{:08x}", hasher.finish() as u32)
}
