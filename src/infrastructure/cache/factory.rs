//! Cache store factory for runtime backend selection

use std::sync::Arc;
use std::time::Duration;

use redis::aio::ConnectionManager;
use sqlx::PgPool;
use tracing::info;

use crate::domain::cache::CacheStore;
use crate::domain::DomainError;

use super::in_memory::{InMemoryCacheStore, InMemoryStoreConfig};
use super::postgres::{self, PostgresCacheStore, PostgresConfig};
use super::redis::{self as redis_store, RedisCacheStore, RedisStoreConfig};

/// Supported store backends
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum StoreType {
    /// Process-local moka cache
    #[default]
    InMemory,
    Redis,
    Postgres,
}

impl std::fmt::Display for StoreType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StoreType::InMemory => write!(f, "in_memory"),
            StoreType::Redis => write!(f, "redis"),
            StoreType::Postgres => write!(f, "postgres"),
        }
    }
}

impl std::str::FromStr for StoreType {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "in_memory" | "inmemory" | "memory" => Ok(StoreType::InMemory),
            "redis" => Ok(StoreType::Redis),
            "postgres" | "postgresql" => Ok(StoreType::Postgres),
            _ => Err(DomainError::configuration(format!(
                "Unknown cache store: {}. Valid stores: in_memory, redis, postgres",
                s
            ))),
        }
    }
}

/// Configuration for the store factory
#[derive(Debug, Clone)]
pub struct StoreConfig {
    pub store_type: StoreType,
    /// Required for the Redis backend
    pub redis_url: Option<String>,
    /// Required for the Postgres backend
    pub database_url: Option<String>,
    /// Redis key prefix or Postgres table prefix
    pub prefix: String,
    /// In-memory capacity per namespace
    pub max_capacity: u64,
    /// In-memory retention ceiling
    pub ttl: Duration,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            store_type: StoreType::InMemory,
            redis_url: None,
            database_url: None,
            prefix: "content".to_string(),
            max_capacity: 10_000,
            ttl: Duration::from_secs(86_400),
        }
    }
}

impl StoreConfig {
    pub fn in_memory() -> Self {
        Self::default()
    }

    pub fn redis(url: impl Into<String>) -> Self {
        Self {
            store_type: StoreType::Redis,
            redis_url: Some(url.into()),
            ..Default::default()
        }
    }

    pub fn postgres(url: impl Into<String>) -> Self {
        Self {
            store_type: StoreType::Postgres,
            database_url: Some(url.into()),
            ..Default::default()
        }
    }

    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    pub fn with_max_capacity(mut self, capacity: u64) -> Self {
        self.max_capacity = capacity;
        self
    }

    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }
}

#[derive(Clone)]
enum Backend {
    InMemory(InMemoryStoreConfig),
    Redis(ConnectionManager),
    Postgres(PgPool),
}

/// Holds the shared connection for the configured backend and hands out one
/// store per namespace.
#[derive(Clone)]
pub struct CacheStoreFactory {
    backend: Backend,
    prefix: String,
}

impl std::fmt::Debug for CacheStoreFactory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CacheStoreFactory")
            .field("store_type", &self.store_type())
            .field("prefix", &self.prefix)
            .finish()
    }
}

impl CacheStoreFactory {
    /// Opens the backend connection described by `config`
    pub async fn connect(config: &StoreConfig) -> Result<Self, DomainError> {
        let backend = match config.store_type {
            StoreType::InMemory => Backend::InMemory(
                InMemoryStoreConfig::default()
                    .with_max_capacity(config.max_capacity)
                    .with_time_to_live(config.ttl),
            ),
            StoreType::Redis => {
                let url = config.redis_url.clone().ok_or_else(|| {
                    DomainError::configuration("Redis URL is required for the redis cache store")
                })?;
                let connection = redis_store::connect(&RedisStoreConfig::new(url)).await?;
                Backend::Redis(connection)
            }
            StoreType::Postgres => {
                let url = config.database_url.clone().ok_or_else(|| {
                    DomainError::configuration("Database URL is required for the postgres cache store")
                })?;
                let pool = postgres::connect(&PostgresConfig::new(url)).await?;
                Backend::Postgres(pool)
            }
        };

        info!(store = %config.store_type, prefix = %config.prefix, "Cache store connected");

        Ok(Self {
            backend,
            prefix: config.prefix.clone(),
        })
    }

    pub fn in_memory() -> Self {
        Self {
            backend: Backend::InMemory(InMemoryStoreConfig::default()),
            prefix: "content".to_string(),
        }
    }

    pub fn store_type(&self) -> StoreType {
        match self.backend {
            Backend::InMemory(_) => StoreType::InMemory,
            Backend::Redis(_) => StoreType::Redis,
            Backend::Postgres(_) => StoreType::Postgres,
        }
    }

    /// Creates the store for one namespace, preparing its schema if needed
    pub async fn create(&self, namespace: &str) -> Result<Arc<dyn CacheStore>, DomainError> {
        match &self.backend {
            Backend::InMemory(config) => Ok(Arc::new(InMemoryCacheStore::with_config(config.clone()))),
            Backend::Redis(connection) => Ok(Arc::new(RedisCacheStore::new(
                connection.clone(),
                &self.prefix,
                namespace,
            ))),
            Backend::Postgres(pool) => {
                let store = PostgresCacheStore::new(pool.clone(), &self.prefix, namespace);
                store.ensure_table().await?;
                Ok(Arc::new(store))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::cache::{CacheEntry, GenerationStatus};

    #[test]
    fn test_store_type_from_str() {
        assert_eq!("in_memory".parse::<StoreType>().unwrap(), StoreType::InMemory);
        assert_eq!("memory".parse::<StoreType>().unwrap(), StoreType::InMemory);
        assert_eq!("REDIS".parse::<StoreType>().unwrap(), StoreType::Redis);
        assert_eq!("postgresql".parse::<StoreType>().unwrap(), StoreType::Postgres);
        assert!("sqlite".parse::<StoreType>().is_err());
    }

    #[test]
    fn test_store_type_display() {
        assert_eq!(StoreType::InMemory.to_string(), "in_memory");
        assert_eq!(StoreType::Postgres.to_string(), "postgres");
    }

    #[tokio::test]
    async fn test_missing_urls_are_configuration_errors() {
        let redis = StoreConfig {
            store_type: StoreType::Redis,
            ..Default::default()
        };
        assert!(matches!(
            CacheStoreFactory::connect(&redis).await,
            Err(DomainError::Configuration { .. })
        ));

        let postgres = StoreConfig {
            store_type: StoreType::Postgres,
            ..Default::default()
        };
        assert!(matches!(
            CacheStoreFactory::connect(&postgres).await,
            Err(DomainError::Configuration { .. })
        ));
    }

    #[tokio::test]
    async fn test_in_memory_namespaces_are_isolated() {
        let factory = CacheStoreFactory::connect(&StoreConfig::in_memory()).await.unwrap();
        let speech = factory.create("speech").await.unwrap();
        let images = factory.create("images").await.unwrap();

        let entry = CacheEntry::new(
            "k1",
            "hello",
            serde_json::json!({}),
            GenerationStatus::AiGenerated,
            Duration::from_secs(60),
        );
        speech.upsert(entry).await.unwrap();

        assert!(speech.get("k1").await.unwrap().is_some());
        assert!(images.get("k1").await.unwrap().is_none());
        assert_eq!(speech.backend(), "in_memory");
    }
}
