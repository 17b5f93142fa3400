//! PostgreSQL cache store, one table per namespace

use std::fmt::Debug;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::{PgPool, PgPoolOptions, PgRow};
use sqlx::Row;
use tracing::warn;

use crate::domain::cache::{CacheEntry, CacheStore, GenerationStatus};
use crate::domain::DomainError;

/// PostgreSQL pool configuration
#[derive(Debug, Clone)]
pub struct PostgresConfig {
    /// Database connection URL
    pub url: String,
    /// Maximum number of connections in the pool
    pub max_connections: u32,
    /// Connection timeout in seconds
    pub connect_timeout_secs: u64,
}

impl Default for PostgresConfig {
    fn default() -> Self {
        Self {
            url: "postgres://localhost/content_gateway".to_string(),
            max_connections: 10,
            connect_timeout_secs: 30,
        }
    }
}

impl PostgresConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Default::default()
        }
    }

    pub fn with_max_connections(mut self, max: u32) -> Self {
        self.max_connections = max;
        self
    }
}

/// Opens the pool shared by every namespace
pub async fn connect(config: &PostgresConfig) -> Result<PgPool, DomainError> {
    PgPoolOptions::new()
        .max_connections(config.max_connections)
        .acquire_timeout(Duration::from_secs(config.connect_timeout_secs))
        .connect(&config.url)
        .await
        .map_err(|e| DomainError::storage(format!("Failed to connect to PostgreSQL: {}", e)))
}

/// Table name for a namespace, restricted to `[a-z0-9_]`
pub fn table_name(prefix: &str, namespace: &str) -> String {
    format!("{}_{}", prefix, namespace)
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() {
                c.to_ascii_lowercase()
            } else {
                '_'
            }
        })
        .collect()
}

pub struct PostgresCacheStore {
    pool: PgPool,
    table_name: String,
}

impl Debug for PostgresCacheStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PostgresCacheStore")
            .field("table_name", &self.table_name)
            .finish()
    }
}

impl PostgresCacheStore {
    pub fn new(pool: PgPool, prefix: &str, namespace: &str) -> Self {
        Self {
            pool,
            table_name: table_name(prefix, namespace),
        }
    }

    /// Ensures the namespace table and its recency index exist
    pub async fn ensure_table(&self) -> Result<(), DomainError> {
        let create_table = format!(
            r#"
            CREATE TABLE IF NOT EXISTS {} (
                key VARCHAR(64) PRIMARY KEY,
                source_identifier TEXT NOT NULL,
                payload JSONB NOT NULL,
                category VARCHAR(255),
                generation_status VARCHAR(32) NOT NULL,
                created_at TIMESTAMPTZ NOT NULL,
                expires_at TIMESTAMPTZ NOT NULL
            )
            "#,
            self.table_name
        );

        sqlx::query(&create_table)
            .execute(&self.pool)
            .await
            .map_err(|e| DomainError::storage(format!("Failed to create table: {}", e)))?;

        let create_index = format!(
            "CREATE INDEX IF NOT EXISTS {0}_created_at_idx ON {0} (created_at DESC)",
            self.table_name
        );

        sqlx::query(&create_index)
            .execute(&self.pool)
            .await
            .map_err(|e| DomainError::storage(format!("Failed to create index: {}", e)))?;

        Ok(())
    }

    fn row_to_entry(row: &PgRow) -> Result<CacheEntry, DomainError> {
        let status: String = row.get("generation_status");

        Ok(CacheEntry {
            key: row.get("key"),
            source_identifier: row.get("source_identifier"),
            payload: row.get("payload"),
            category: row.get("category"),
            generation_status: status.parse::<GenerationStatus>()?,
            created_at: row.get::<DateTime<Utc>, _>("created_at"),
            expires_at: row.get::<DateTime<Utc>, _>("expires_at"),
        })
    }
}

/// Keeps the rows that map to entries; a bad row is logged and left out of the feed
fn skip_undecodable(
    table: &str,
    rows: impl Iterator<Item = Result<CacheEntry, DomainError>>,
) -> Vec<CacheEntry> {
    rows.filter_map(|row| match row {
        Ok(entry) => Some(entry),
        Err(e) => {
            warn!(table = %table, error = %e, "Skipping undecodable row in recency feed");
            None
        }
    })
    .collect()
}

#[async_trait]
impl CacheStore for PostgresCacheStore {
    async fn get(&self, key: &str) -> Result<Option<CacheEntry>, DomainError> {
        let query = format!(
            "SELECT * FROM {} WHERE key = $1 AND expires_at > $2",
            self.table_name
        );

        let row = sqlx::query(&query)
            .bind(key)
            .bind(Utc::now())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| DomainError::storage(format!("Failed to get entry: {}", e)))?;

        row.as_ref().map(Self::row_to_entry).transpose()
    }

    async fn upsert(&self, entry: CacheEntry) -> Result<(), DomainError> {
        let query = format!(
            r#"
            INSERT INTO {} (key, source_identifier, payload, category, generation_status, created_at, expires_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            ON CONFLICT (key) DO UPDATE SET
                source_identifier = EXCLUDED.source_identifier,
                payload = EXCLUDED.payload,
                category = EXCLUDED.category,
                generation_status = EXCLUDED.generation_status,
                created_at = EXCLUDED.created_at,
                expires_at = EXCLUDED.expires_at
            "#,
            self.table_name
        );

        sqlx::query(&query)
            .bind(&entry.key)
            .bind(&entry.source_identifier)
            .bind(&entry.payload)
            .bind(&entry.category)
            .bind(entry.generation_status.as_str())
            .bind(entry.created_at)
            .bind(entry.expires_at)
            .execute(&self.pool)
            .await
            .map_err(|e| DomainError::storage(format!("Failed to upsert entry: {}", e)))?;

        Ok(())
    }

    async fn get_recent(&self, limit: usize) -> Result<Vec<CacheEntry>, DomainError> {
        let query = format!(
            "SELECT * FROM {} WHERE expires_at > $1 ORDER BY created_at DESC LIMIT $2",
            self.table_name
        );

        let rows = sqlx::query(&query)
            .bind(Utc::now())
            .bind(limit as i64)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| DomainError::storage(format!("Failed to list entries: {}", e)))?;

        Ok(skip_undecodable(
            &self.table_name,
            rows.iter().map(Self::row_to_entry),
        ))
    }

    fn backend(&self) -> &'static str {
        "postgres"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(key: &str) -> CacheEntry {
        CacheEntry::new(
            key,
            "https://news.example.com/a",
            serde_json::json!({"summary": "s"}),
            GenerationStatus::AiGenerated,
            Duration::from_secs(60),
        )
    }

    #[test]
    fn test_bad_row_does_not_fail_feed() {
        let rows = vec![
            Ok(entry("first")),
            "unknown_status".parse::<GenerationStatus>().map(|_| entry("bad")),
            Ok(entry("second")),
        ];

        let entries = skip_undecodable("content_articles", rows.into_iter());

        let keys: Vec<&str> = entries.iter().map(|e| e.key.as_str()).collect();
        assert_eq!(keys, vec!["first", "second"]);
    }

    #[test]
    fn test_table_name_is_sanitized() {
        assert_eq!(table_name("content", "articles"), "content_articles");
        assert_eq!(table_name("Content-Cache", "speech"), "content_cache_speech");
        assert_eq!(table_name("x; DROP TABLE y", "images"), "x__drop_table_y_images");
    }

    #[test]
    fn test_config_builder() {
        let config = PostgresConfig::new("postgres://db/content").with_max_connections(4);
        assert_eq!(config.max_connections, 4);
        assert_eq!(config.url, "postgres://db/content");
    }
}
