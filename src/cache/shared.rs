//! Shared cache handle
//!
//! [`ResponseCache`] owns the entry store behind an async RwLock and carries
//! the caching settings. Clones share the same store.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;
use tokio::sync::RwLock;

use crate::cache::{CacheEntry, CacheStats, EntryStore, InvalidationScope};
use crate::config::Config;
use crate::error::CacheError;

/// Default time-to-live for cached responses: 6 hours.
pub const DEFAULT_TTL: Duration = Duration::from_secs(6 * 60 * 60);

/// Pagination headers captured by default.
pub const DEFAULT_CAPTURE_HEADERS: [&str; 2] = ["X-WP-TotalPages", "X-WP-Total"];

/// Default cacheable body limit: 8 MiB.
pub const DEFAULT_MAX_BODY_SIZE: usize = 8 * 1024 * 1024;

// == Cache Settings ==
/// Process-wide caching parameters, fixed at startup.
#[derive(Debug, Clone)]
pub struct CacheSettings {
    /// Lifetime of every stored entry
    pub ttl: Duration,
    /// Response headers captured on write and replayed on hit
    pub capture_headers: Vec<String>,
    /// Largest response body that will be stored
    pub max_body_size: usize,
}

impl CacheSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            ttl: Duration::from_secs(config.default_ttl),
            capture_headers: config.capture_headers.clone(),
            max_body_size: config.max_body_size,
        }
    }

    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    /// Value for `Access-Control-Expose-Headers`.
    pub fn expose_headers_value(&self) -> String {
        self.capture_headers.join(", ")
    }

    pub fn check_body_size(&self, len: usize) -> Result<(), CacheError> {
        if len > self.max_body_size {
            return Err(CacheError::PayloadTooLarge {
                len,
                max: self.max_body_size,
            });
        }
        Ok(())
    }
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            ttl: DEFAULT_TTL,
            capture_headers: DEFAULT_CAPTURE_HEADERS
                .iter()
                .map(|h| h.to_string())
                .collect(),
            max_body_size: DEFAULT_MAX_BODY_SIZE,
        }
    }
}

// == Response Cache ==
/// Cloneable, injectable handle to the process-wide entry store.
#[derive(Debug, Clone)]
pub struct ResponseCache {
    store: Arc<RwLock<EntryStore>>,
    settings: Arc<CacheSettings>,
    /// Bumped by every invalidation while holding the store's write lock
    generation: Arc<AtomicU64>,
}

impl ResponseCache {
    pub fn new(settings: CacheSettings) -> Self {
        Self {
            store: Arc::new(RwLock::new(EntryStore::new())),
            settings: Arc::new(settings),
            generation: Arc::new(AtomicU64::new(0)),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(CacheSettings::from_config(config))
    }

    pub fn settings(&self) -> &CacheSettings {
        &self.settings
    }

    /// Returns the live entry for `key`, evicting it first if it expired.
    pub async fn lookup(&self, key: &str) -> Option<CacheEntry> {
        // Write lock: an expired read removes the entry and updates stats
        self.store.write().await.get(key)
    }

    /// Stores a payload and its captured headers for the configured TTL.
    pub async fn insert(
        &self,
        key: String,
        payload: Value,
        headers: Vec<(String, String)>,
    ) -> Result<(), CacheError> {
        let entry = CacheEntry::new(payload, headers, self.settings.ttl);
        self.store.write().await.set(key, entry)
    }

    /// Current invalidation generation. Read it before producing a response
    /// and hand it to [`ResponseCache::insert_since`].
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::Acquire)
    }

    /// Like [`ResponseCache::insert`], but refuses the write when any
    /// invalidation ran after `generation` was read: the payload may predate
    /// the mutation that triggered it.
    pub async fn insert_since(
        &self,
        generation: u64,
        key: String,
        payload: Value,
        headers: Vec<(String, String)>,
    ) -> Result<(), CacheError> {
        let mut store = self.store.write().await;
        if self.generation.load(Ordering::Acquire) != generation {
            return Err(CacheError::Invalidated);
        }
        store.set(key, CacheEntry::new(payload, headers, self.settings.ttl))
    }

    /// Removes every entry covered by at least one of `scopes`.
    pub async fn invalidate(&self, scopes: &[&dyn InvalidationScope]) -> usize {
        let mut store = self.store.write().await;
        // Bumped even when nothing matched: an in-flight miss may not be
        // stored yet
        self.generation.fetch_add(1, Ordering::AcqRel);
        store.remove_matching(|key| scopes.iter().any(|scope| scope.covers(key)))
    }

    pub async fn cleanup_expired(&self) -> usize {
        self.store.write().await.cleanup_expired()
    }

    pub async fn contains(&self, key: &str) -> bool {
        self.store.read().await.contains_key(key)
    }

    pub async fn keys(&self) -> Vec<String> {
        self.store.read().await.keys()
    }

    pub async fn len(&self) -> usize {
        self.store.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.store.read().await.is_empty()
    }

    pub async fn stats(&self) -> CacheStats {
        self.store.read().await.stats()
    }
}

impl Default for ResponseCache {
    fn default() -> Self {
        Self::new(CacheSettings::default())
    }
}
