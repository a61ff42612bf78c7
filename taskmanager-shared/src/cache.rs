/// In-memory TTL cache
///
/// A pass-through cache in front of slow-changing reads (the label list).
/// Entries expire after their TTL; writers invalidate keys explicitly.
/// Clones share the same storage.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;
use tracing::debug;

/// Default entry lifetime (5 minutes)
pub const DEFAULT_TTL: Duration = Duration::from_secs(300);

#[derive(Debug, Clone)]
struct Entry<V> {
    value: V,
    expires_at: Instant,
}

#[derive(Debug, Clone)]
pub struct TtlCache<V> {
    entries: Arc<RwLock<HashMap<String, Entry<V>>>>,
}

impl<V> Default for TtlCache<V> {
    fn default() -> Self {
        Self {
            entries: Arc::new(RwLock::new(HashMap::new())),
        }
    }
}

impl<V: Clone + Send + Sync> TtlCache<V> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a live entry, if any
    pub async fn get(&self, key: &str) -> Option<V> {
        let entries = self.entries.read().await;
        entries
            .get(key)
            .filter(|entry| entry.expires_at > Instant::now())
            .map(|entry| entry.value.clone())
    }

    pub async fn insert(&self, key: impl Into<String>, value: V, ttl: Duration) {
        let entry = Entry {
            value,
            expires_at: Instant::now() + ttl,
        };
        self.entries.write().await.insert(key.into(), entry);
    }

    /// Returns the cached value or computes, stores and returns a fresh one
    ///
    /// Errors from `factory` are returned as-is and nothing is cached.
    pub async fn get_or_try_insert_with<F, Fut, E>(
        &self,
        key: &str,
        ttl: Duration,
        factory: F,
    ) -> Result<V, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V, E>>,
    {
        if let Some(value) = self.get(key).await {
            debug!(key, "cache hit");
            return Ok(value);
        }

        debug!(key, "cache miss");
        let value = factory().await?;
        self.insert(key, value.clone(), ttl).await;
        Ok(value)
    }

    pub async fn remove(&self, key: &str) {
        self.entries.write().await.remove(key);
    }

    /// Number of stored entries, expired ones included
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test]
    async fn test_insert_and_get() {
        let cache = TtlCache::new();
        cache.insert("a", 1, DEFAULT_TTL).await;

        assert_eq!(cache.get("a").await, Some(1));
        assert_eq!(cache.get("b").await, None);
    }

    #[tokio::test]
    async fn test_expired_entry_is_not_returned() {
        let cache = TtlCache::new();
        cache.insert("gone", "value", Duration::ZERO).await;

        assert_eq!(cache.get("gone").await, None);
        assert_eq!(cache.len().await, 1);
    }

    #[tokio::test]
    async fn test_factory_runs_once() {
        let cache = TtlCache::new();
        let calls = AtomicUsize::new(0);

        for _ in 0..3 {
            let value: Result<u32, ()> = cache
                .get_or_try_insert_with("k", DEFAULT_TTL, || async {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Ok(42)
                })
                .await;
            assert_eq!(value, Ok(42));
        }

        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_factory_error_is_not_cached() {
        let cache: TtlCache<u32> = TtlCache::new();

        let failed: Result<u32, &str> = cache
            .get_or_try_insert_with("k", DEFAULT_TTL, || async { Err("boom") })
            .await;
        assert_eq!(failed, Err("boom"));
        assert!(cache.is_empty().await);
    }

    #[tokio::test]
    async fn test_remove() {
        let cache = TtlCache::new();
        cache.insert("labels:all", 1, DEFAULT_TTL).await;
        cache.insert("projects:1", 3, DEFAULT_TTL).await;

        cache.remove("projects:1").await;
        assert_eq!(cache.get("projects:1").await, None);
        assert_eq!(cache.get("labels:all").await, Some(1));
        assert_eq!(cache.len().await, 1);
    }

    #[tokio::test]
    async fn test_clones_share_storage() {
        let cache = TtlCache::new();
        let clone = cache.clone();
        clone.insert("shared", 7, DEFAULT_TTL).await;

        assert_eq!(cache.get("shared").await, Some(7));
    }
}
