//! Secret cache keyed by `(provider, reference)`.
//!
//! In-memory TTL cache for resolved secrets, shared by every in-flight
//! request. The TTL is checked at read time rather than enforced by a
//! background sweep; expired entries linger until overwritten or
//! invalidated, which trades a little memory for not needing a scheduler.
//!
//! Concurrent fetches for the same cold key are deliberately NOT
//! deduplicated: each may invoke the provider independently, and the last
//! completed insert wins. Provider calls are idempotent reads, so this is an
//! accepted tradeoff rather than an oversight.

use super::types::SecretString;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;
use tracing::debug;

/// Cache key: which provider resolved which reference.
#[derive(Debug, Clone, Hash, PartialEq, Eq)]
pub struct CacheKey {
    pub provider: String,
    pub reference: String,
}

impl CacheKey {
    pub fn new(provider: &str, reference: &str) -> Self {
        Self { provider: provider.to_string(), reference: reference.to_string() }
    }
}

impl std::fmt::Display for CacheKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.provider, self.reference)
    }
}

#[derive(Debug, Clone)]
struct CacheEntry {
    value: SecretString,
    fetched_at: Instant,
}

/// Process-wide secret cache.
///
/// The TTL is passed per read because it lives in the reloadable settings; a
/// configuration reload shortening the TTL takes effect on the next read,
/// without touching stored entries.
#[derive(Debug, Default)]
pub struct SecretCache {
    inner: Arc<RwLock<HashMap<CacheKey, CacheEntry>>>,
}

impl SecretCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get a cached value if an entry exists and is younger than `ttl`.
    /// An expired or absent entry is a miss, not an error.
    pub async fn get(&self, key: &CacheKey, ttl: Duration) -> Option<SecretString> {
        let cache = self.inner.read().await;
        match cache.get(key) {
            Some(entry) if entry.fetched_at.elapsed() < ttl => {
                debug!(key = %key, "Cache hit for secret");
                Some(entry.value.clone())
            }
            Some(_) => {
                debug!(key = %key, "Cached secret expired");
                None
            }
            None => None,
        }
    }

    /// Insert or overwrite unconditionally, stamped with the current time.
    pub async fn insert(&self, key: &CacheKey, value: SecretString) {
        let mut cache = self.inner.write().await;
        debug!(key = %key, "Caching resolved secret");
        cache.insert(key.clone(), CacheEntry { value, fetched_at: Instant::now() });
    }

    /// Remove the entry if present; removing an absent entry is a no-op.
    pub async fn invalidate(&self, key: &CacheKey) {
        let mut cache = self.inner.write().await;
        if cache.remove(key).is_some() {
            debug!(key = %key, "Invalidated cached secret");
        }
    }

    /// Drop every entry.
    pub async fn clear(&self) {
        let mut cache = self.inner.write().await;
        let count = cache.len();
        cache.clear();
        debug!(count, "Cleared secret cache");
    }

    pub async fn len(&self) -> usize {
        self.inner.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.inner.read().await.is_empty()
    }
}

impl Clone for SecretCache {
    fn clone(&self) -> Self {
        Self { inner: Arc::clone(&self.inner) }
    }
}
