use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use log::{debug, info};
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tokio::time::Instant;

/// Default lifetime of a cache entry
pub const DEFAULT_TTL: Duration = Duration::from_secs(3600);

/// Longest lifetime an entry can get; larger TTLs are clamped to it
pub const MAX_TTL: Duration = Duration::from_secs(10 * 365 * 24 * 60 * 60);

/// A serialized record together with its expiry
#[derive(Debug, Clone)]
struct CachedEntry {
    /// JSON text exactly as it was written
    value: String,
    /// Instant after which the entry counts as a miss
    expires_at: Instant,
}

impl CachedEntry {
    fn is_fresh(&self, now: Instant) -> bool {
        now < self.expires_at
    }
}

/// Process-wide key/value cache with per-entry expiry.
///
/// Opened once at start-up and handed to the services that need it; closing it
/// stops the background purge and drops every entry.
#[derive(Debug)]
pub struct CacheManager {
    entries: Arc<RwLock<HashMap<String, CachedEntry>>>,
    /// Lifetime applied by `set`
    ttl: Duration,
    purge_task: Mutex<Option<JoinHandle<()>>>,
}

impl CacheManager {
    /// Create an empty cache without a purge task. Expired entries are still
    /// treated as misses on read.
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: Arc::new(RwLock::new(HashMap::new())),
            ttl,
            purge_task: Mutex::new(None),
        }
    }

    /// Create the cache and start sweeping expired entries once per `ttl`.
    /// Must be called from within a tokio runtime.
    pub fn open(ttl: Duration) -> Self {
        let cache = Self::new(ttl);
        let entries = Arc::clone(&cache.entries);
        let period = ttl.clamp(Duration::from_secs(1), MAX_TTL);

        let task = tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            interval.tick().await;
            loop {
                interval.tick().await;
                let removed = purge(&entries).await;
                if removed > 0 {
                    debug!("Purged {} expired cache entries", removed);
                }
            }
        });
        cache.set_purge_task(task);

        info!("Cache opened with a TTL of {}s", ttl.as_secs());
        cache
    }

    fn set_purge_task(&self, task: JoinHandle<()>) {
        if let Ok(mut slot) = self.purge_task.lock() {
            *slot = Some(task);
        }
    }

    fn stop_purge_task(&self) {
        if let Some(task) = self.purge_task.lock().ok().and_then(|mut slot| slot.take()) {
            task.abort();
        }
    }

    /// Stop the purge task and drop every entry
    pub async fn close(&self) {
        self.stop_purge_task();
        self.entries.write().await.clear();
        info!("Cache closed");
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Get the stored value if it has not expired yet
    pub async fn get(&self, key: &str) -> Option<String> {
        let entries = self.entries.read().await;
        entries.get(key)
            .filter(|entry| entry.is_fresh(Instant::now()))
            .map(|entry| entry.value.clone())
    }

    /// Store `value` under `key` for the default TTL, replacing any previous value
    pub async fn set(&self, key: &str, value: impl Into<String>) {
        self.set_with_ttl(key, value, self.ttl).await;
    }

    pub async fn set_with_ttl(&self, key: &str, value: impl Into<String>, ttl: Duration) {
        let now = Instant::now();
        let entry = CachedEntry {
            value: value.into(),
            expires_at: now.checked_add(ttl.min(MAX_TTL)).unwrap_or(now),
        };
        self.entries.write().await.insert(key.to_string(), entry);
    }

    /// Remove expired entries, returning how many were dropped
    pub async fn purge_expired(&self) -> usize {
        purge(&self.entries).await
    }

    /// Number of stored entries, expired ones included until purged
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

impl Drop for CacheManager {
    fn drop(&mut self) {
        self.stop_purge_task();
    }
}

async fn purge(entries: &RwLock<HashMap<String, CachedEntry>>) -> usize {
    let now = Instant::now();
    let mut entries = entries.write().await;
    let before = entries.len();
    entries.retain(|_, entry| entry.is_fresh(now));
    before - entries.len()
}

/// Key of an image listing: `slug_chapterId`
pub fn chapter_key(slug: &str, chapter_id: &str) -> String {
    format!("{}_{}", slug, chapter_id)
}
