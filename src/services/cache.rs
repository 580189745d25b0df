//! Summary cache.
//!
//! Summaries are memoized as JSON strings under keys built from the
//! normalized filter criteria. The cache is a pure optimization: callers treat
//! every [`CacheError`] as a miss and recompute from the store.
//!
//! Invalidation is coarse. Any expense write drops every key in the summary
//! namespace, whichever wallet or category it touched.

use std::{collections::HashMap, time::Duration};

use async_trait::async_trait;
use tokio::{sync::RwLock, time::Instant};

/// Key namespace for cached summaries.
pub const SUMMARY_NAMESPACE: &str = "summary";

#[derive(Debug, thiserror::Error)]
#[error("cache error: {0}")]
pub struct CacheError(pub String);

/// A string key/value cache with per-entry expiry.
#[async_trait]
pub trait SummaryCache: Send + Sync + 'static {
    /// The cached value, or `None` if absent or expired.
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError>;

    /// Store `value` for `ttl`, replacing any previous value.
    async fn set(&self, key: &str, value: String, ttl: Duration) -> Result<(), CacheError>;

    /// Remove every key in `namespace`. Returns how many were removed.
    async fn invalidate_namespace(&self, namespace: &str) -> Result<usize, CacheError>;
}

#[derive(Debug)]
struct CacheEntry {
    value: String,
    expires_at: Instant,
}

/// In-process [`SummaryCache`].
///
/// Expired entries are skipped on read and swept on write.
#[derive(Debug, Default)]
pub struct MemorySummaryCache {
    entries: RwLock<HashMap<String, CacheEntry>>,
}

impl MemorySummaryCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored entries, expired or not.
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

#[async_trait]
impl SummaryCache for MemorySummaryCache {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        let entries = self.entries.read().await;
        Ok(entries
            .get(key)
            .filter(|entry| entry.expires_at > Instant::now())
            .map(|entry| entry.value.clone()))
    }

    async fn set(&self, key: &str, value: String, ttl: Duration) -> Result<(), CacheError> {
        let now = Instant::now();
        let mut entries = self.entries.write().await;
        entries.retain(|_, entry| entry.expires_at > now);
        entries.insert(
            key.to_string(),
            CacheEntry {
                value,
                expires_at: now + ttl,
            },
        );
        Ok(())
    }

    async fn invalidate_namespace(&self, namespace: &str) -> Result<usize, CacheError> {
        let prefix = format!("{namespace}:");
        let mut entries = self.entries.write().await;
        let before = entries.len();
        entries.retain(|key, _| !key.starts_with(&prefix));
        Ok(before - entries.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TTL: Duration = Duration::from_secs(60);

    #[tokio::test(start_paused = true)]
    async fn entries_expire_after_ttl() {
        let cache = MemorySummaryCache::new();
        cache.set("summary:{}", "cached".to_string(), TTL).await.unwrap();

        tokio::time::advance(Duration::from_secs(59)).await;
        assert_eq!(cache.get("summary:{}").await.unwrap().as_deref(), Some("cached"));

        tokio::time::advance(Duration::from_secs(1)).await;
        assert_eq!(cache.get("summary:{}").await.unwrap(), None);
    }

    #[tokio::test(start_paused = true)]
    async fn set_sweeps_expired_entries() {
        let cache = MemorySummaryCache::new();
        cache.set("summary:a", "a".to_string(), TTL).await.unwrap();

        tokio::time::advance(TTL).await;
        cache.set("summary:b", "b".to_string(), TTL).await.unwrap();

        assert_eq!(cache.len().await, 1);
    }

    #[tokio::test]
    async fn invalidation_clears_only_the_namespace() {
        let cache = MemorySummaryCache::new();
        cache.set("summary:a", "a".to_string(), TTL).await.unwrap();
        cache.set("summary:b", "b".to_string(), TTL).await.unwrap();
        cache.set("other:c", "c".to_string(), TTL).await.unwrap();

        let removed = cache.invalidate_namespace(SUMMARY_NAMESPACE).await.unwrap();

        assert_eq!(removed, 2);
        assert_eq!(cache.get("summary:a").await.unwrap(), None);
        assert_eq!(cache.get("other:c").await.unwrap().as_deref(), Some("c"));
    }
}
