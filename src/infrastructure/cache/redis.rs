//! Redis cache store

use std::fmt;

use async_trait::async_trait;
use chrono::Utc;
use redis::aio::ConnectionManager;
use redis::{AsyncCommands, Client};
use tracing::{debug, warn};

use crate::domain::cache::{CacheEntry, CacheStore};
use crate::domain::DomainError;

/// Configuration for the Redis store
#[derive(Debug, Clone)]
pub struct RedisStoreConfig {
    /// Redis connection URL (e.g., "redis://127.0.0.1:6379")
    pub url: String,
    /// Prefix shared by every key this service writes
    pub key_prefix: String,
}

impl Default for RedisStoreConfig {
    fn default() -> Self {
        Self {
            url: "redis://127.0.0.1:6379".to_string(),
            key_prefix: "content".to_string(),
        }
    }
}

impl RedisStoreConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Default::default()
        }
    }

    pub fn with_key_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.key_prefix = prefix.into();
        self
    }
}

/// Opens the shared connection manager used by every namespace
pub async fn connect(config: &RedisStoreConfig) -> Result<ConnectionManager, DomainError> {
    let client = Client::open(config.url.as_str())
        .map_err(|e| DomainError::cache(format!("Failed to create Redis client: {}", e)))?;

    ConnectionManager::new(client)
        .await
        .map_err(|e| DomainError::cache(format!("Failed to connect to Redis: {}", e)))
}

/// Entries are JSON strings stored with a millisecond expiry; a sorted set
/// scored by creation time backs `get_recent`.
#[derive(Clone)]
pub struct RedisCacheStore {
    connection: ConnectionManager,
    prefix: String,
}

impl fmt::Debug for RedisCacheStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RedisCacheStore")
            .field("prefix", &self.prefix)
            .field("connection", &"<ConnectionManager>")
            .finish()
    }
}

impl RedisCacheStore {
    pub fn new(connection: ConnectionManager, key_prefix: &str, namespace: &str) -> Self {
        Self {
            connection,
            prefix: format!("{}:{}", key_prefix, namespace),
        }
    }

    fn entry_key(&self, key: &str) -> String {
        format!("{}:{}", self.prefix, key)
    }

    fn recency_key(&self) -> String {
        format!("{}:recent", self.prefix)
    }

    fn decode(key: &str, raw: &str) -> Result<CacheEntry, DomainError> {
        serde_json::from_str(raw).map_err(|e| {
            DomainError::cache(format!("Failed to decode entry '{}': {}", key, e))
        })
    }
}

/// Pairs recency members with their stored values, newest first.
///
/// Returns the readable entries (at most `limit`) and the members to prune:
/// those whose value has expired and those that no longer decode.
fn collect_recent(
    keys: &[String],
    values: Vec<Option<String>>,
    limit: usize,
) -> (Vec<CacheEntry>, Vec<String>) {
    let mut entries = Vec::with_capacity(limit);
    let mut stale = Vec::new();

    for (key, value) in keys.iter().zip(values) {
        let Some(raw) = value else {
            stale.push(key.clone());
            continue;
        };

        match RedisCacheStore::decode(key, &raw) {
            Ok(entry) => {
                if entry.is_readable() && entries.len() < limit {
                    entries.push(entry);
                }
            }
            Err(e) => {
                warn!(key = %key, error = %e, "Skipping undecodable entry in recency feed");
                stale.push(key.clone());
            }
        }
    }

    (entries, stale)
}

#[async_trait]
impl CacheStore for RedisCacheStore {
    async fn get(&self, key: &str) -> Result<Option<CacheEntry>, DomainError> {
        let mut conn = self.connection.clone();

        let raw: Option<String> = conn
            .get(self.entry_key(key))
            .await
            .map_err(|e| DomainError::cache(format!("Failed to get key '{}': {}", key, e)))?;

        match raw {
            Some(raw) => {
                let entry = Self::decode(key, &raw)?;
                Ok(entry.is_readable().then_some(entry))
            }
            None => Ok(None),
        }
    }

    async fn upsert(&self, entry: CacheEntry) -> Result<(), DomainError> {
        let ttl_ms = (entry.expires_at - Utc::now()).num_milliseconds();
        if ttl_ms <= 0 {
            debug!(key = %entry.key, "Skipping write of already expired entry");
            return Ok(());
        }

        let value = serde_json::to_string(&entry)
            .map_err(|e| DomainError::cache(format!("Failed to encode entry: {}", e)))?;

        let mut conn = self.connection.clone();

        let _: () = redis::pipe()
            .atomic()
            .cmd("SET")
            .arg(self.entry_key(&entry.key))
            .arg(value)
            .arg("PX")
            .arg(ttl_ms)
            .ignore()
            .cmd("ZADD")
            .arg(self.recency_key())
            .arg(entry.created_at.timestamp_millis())
            .arg(&entry.key)
            .ignore()
            .query_async(&mut conn)
            .await
            .map_err(|e| {
                DomainError::cache(format!("Failed to set key '{}': {}", entry.key, e))
            })?;

        Ok(())
    }

    async fn get_recent(&self, limit: usize) -> Result<Vec<CacheEntry>, DomainError> {
        if limit == 0 {
            return Ok(Vec::new());
        }

        let mut conn = self.connection.clone();

        // Over-fetch so that expired members do not starve the result
        let stop = (limit * 2) as isize - 1;
        let keys: Vec<String> = conn
            .zrevrange(self.recency_key(), 0, stop)
            .await
            .map_err(|e| DomainError::cache(format!("Failed to read recency index: {}", e)))?;

        if keys.is_empty() {
            return Ok(Vec::new());
        }

        let entry_keys: Vec<String> = keys.iter().map(|k| self.entry_key(k)).collect();
        let values: Vec<Option<String>> = redis::cmd("MGET")
            .arg(&entry_keys)
            .query_async(&mut conn)
            .await
            .map_err(|e| DomainError::cache(format!("Failed to read entries: {}", e)))?;

        let (entries, stale) = collect_recent(&keys, values, limit);

        if !stale.is_empty() {
            let _: () = conn
                .zrem(self.recency_key(), &stale)
                .await
                .map_err(|e| DomainError::cache(format!("Failed to prune recency index: {}", e)))?;
        }

        Ok(entries)
    }

    fn backend(&self) -> &'static str {
        "redis"
    }
}
