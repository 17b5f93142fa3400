//! In-memory cache store using moka

use std::time::Duration;

use async_trait::async_trait;
use moka::future::Cache as MokaCache;

use crate::domain::cache::{CacheEntry, CacheStore};
use crate::domain::DomainError;

/// Configuration for the in-memory store
#[derive(Debug, Clone)]
pub struct InMemoryStoreConfig {
    /// Maximum number of entries
    pub max_capacity: u64,
    /// Upper bound on how long moka keeps an entry around; readability is
    /// still decided by each entry's own `expires_at`
    pub time_to_live: Duration,
}

impl Default for InMemoryStoreConfig {
    fn default() -> Self {
        Self {
            max_capacity: 10_000,
            time_to_live: Duration::from_secs(86_400),
        }
    }
}

impl InMemoryStoreConfig {
    pub fn with_max_capacity(mut self, capacity: u64) -> Self {
        self.max_capacity = capacity;
        self
    }

    pub fn with_time_to_live(mut self, ttl: Duration) -> Self {
        self.time_to_live = ttl;
        self
    }
}

/// Process-local store; contents are lost on restart
#[derive(Debug)]
pub struct InMemoryCacheStore {
    cache: MokaCache<String, CacheEntry>,
}

impl InMemoryCacheStore {
    pub fn new() -> Self {
        Self::with_config(InMemoryStoreConfig::default())
    }

    pub fn with_config(config: InMemoryStoreConfig) -> Self {
        let cache = MokaCache::builder()
            .max_capacity(config.max_capacity)
            .time_to_live(config.time_to_live)
            .build();

        Self { cache }
    }
}

impl Default for InMemoryCacheStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CacheStore for InMemoryCacheStore {
    async fn get(&self, key: &str) -> Result<Option<CacheEntry>, DomainError> {
        match self.cache.get(key).await {
            Some(entry) if entry.is_readable() => Ok(Some(entry)),
            Some(_) => {
                self.cache.remove(key).await;
                Ok(None)
            }
            None => Ok(None),
        }
    }

    async fn upsert(&self, entry: CacheEntry) -> Result<(), DomainError> {
        self.cache.insert(entry.key.clone(), entry).await;
        Ok(())
    }

    async fn get_recent(&self, limit: usize) -> Result<Vec<CacheEntry>, DomainError> {
        self.cache.run_pending_tasks().await;

        let mut entries: Vec<CacheEntry> = self
            .cache
            .iter()
            .map(|(_, entry)| entry)
            .filter(CacheEntry::is_readable)
            .collect();

        entries.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        entries.truncate(limit);

        Ok(entries)
    }

    fn backend(&self) -> &'static str {
        "in_memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration as ChronoDuration, Utc};
    use serde_json::json;

    use crate::domain::cache::GenerationStatus;

    fn entry(key: &str, ttl: Duration) -> CacheEntry {
        CacheEntry::new(key, "source", json!({"k": key}), GenerationStatus::AiGenerated, ttl)
    }

    #[tokio::test]
    async fn test_upsert_and_get() {
        let store = InMemoryCacheStore::new();

        store.upsert(entry("key1", Duration::from_secs(60))).await.unwrap();

        let result = store.get("key1").await.unwrap().unwrap();
        assert_eq!(result.payload, json!({"k": "key1"}));
    }

    #[tokio::test]
    async fn test_get_missing() {
        let store = InMemoryCacheStore::new();
        assert!(store.get("missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_upsert_replaces() {
        let store = InMemoryCacheStore::new();

        store.upsert(entry("key1", Duration::from_secs(60))).await.unwrap();
        let mut replacement = entry("key1", Duration::from_secs(60));
        replacement.payload = json!({"k": "replaced"});
        store.upsert(replacement).await.unwrap();

        let result = store.get("key1").await.unwrap().unwrap();
        assert_eq!(result.payload, json!({"k": "replaced"}));
    }

    #[tokio::test]
    async fn test_expired_entry_is_absent() {
        let store = InMemoryCacheStore::new();
        let created = Utc::now() - ChronoDuration::hours(2);
        let stale = CacheEntry::created_at(
            "key1",
            "source",
            json!({}),
            GenerationStatus::AiGenerated,
            created,
            Duration::from_secs(3600),
        );

        store.upsert(stale).await.unwrap();

        assert!(store.get("key1").await.unwrap().is_none());
        assert!(store.get_recent(10).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_get_recent_newest_first() {
        let store = InMemoryCacheStore::new();
        let now = Utc::now();

        for (i, key) in ["a", "b", "c"].iter().enumerate() {
            let e = CacheEntry::created_at(
                *key,
                "source",
                json!({}),
                GenerationStatus::AiGenerated,
                now - ChronoDuration::minutes(10 - i as i64),
                Duration::from_secs(3600),
            );
            store.upsert(e).await.unwrap();
        }

        let recent = store.get_recent(2).await.unwrap();
        let keys: Vec<_> = recent.iter().map(|e| e.key.as_str()).collect();
        assert_eq!(keys, vec!["c", "b"]);
    }
}
