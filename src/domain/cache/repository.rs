//! Cache store contract

use std::fmt::Debug;

use async_trait::async_trait;

use super::entry::CacheEntry;
use crate::domain::DomainError;

/// Persisted key/value table with TTL semantics.
///
/// Implementations own one namespace each. No component outside the store
/// knows the storage technology.
#[async_trait]
pub trait CacheStore: Send + Sync + Debug {
    /// Returns the entry for `key` if present and not expired
    async fn get(&self, key: &str) -> Result<Option<CacheEntry>, DomainError>;

    /// Inserts or replaces the entry keyed by `entry.key`; last writer wins
    async fn upsert(&self, entry: CacheEntry) -> Result<(), DomainError>;

    /// Readable entries created within the TTL window, newest first
    async fn get_recent(&self, limit: usize) -> Result<Vec<CacheEntry>, DomainError>;

    /// Backend name for logs and health checks
    fn backend(&self) -> &'static str;
}

#[cfg(test)]
pub mod mock {
    use super::*;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::sync::Mutex;

    /// Mock cache store for testing
    #[derive(Debug, Default)]
    pub struct MockCacheStore {
        entries: Mutex<HashMap<String, CacheEntry>>,
        fail_reads: AtomicBool,
        fail_writes: AtomicBool,
        reads: AtomicUsize,
        writes: AtomicUsize,
    }

    impl MockCacheStore {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn with_entry(self, entry: CacheEntry) -> Self {
            self.entries
                .lock()
                .unwrap()
                .insert(entry.key.clone(), entry);
            self
        }

        pub fn with_failing_reads(self) -> Self {
            self.fail_reads.store(true, Ordering::SeqCst);
            self
        }

        pub fn with_failing_writes(self) -> Self {
            self.fail_writes.store(true, Ordering::SeqCst);
            self
        }

        /// Physical row, ignoring expiry
        pub fn raw(&self, key: &str) -> Option<CacheEntry> {
            self.entries.lock().unwrap().get(key).cloned()
        }

        pub fn len(&self) -> usize {
            self.entries.lock().unwrap().len()
        }

        pub fn reads(&self) -> usize {
            self.reads.load(Ordering::SeqCst)
        }

        pub fn writes(&self) -> usize {
            self.writes.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl CacheStore for MockCacheStore {
        async fn get(&self, key: &str) -> Result<Option<CacheEntry>, DomainError> {
            self.reads.fetch_add(1, Ordering::SeqCst);

            if self.fail_reads.load(Ordering::SeqCst) {
                return Err(DomainError::cache("Mock read failure"));
            }

            let entries = self.entries.lock().unwrap();
            Ok(entries.get(key).filter(|e| e.is_readable()).cloned())
        }

        async fn upsert(&self, entry: CacheEntry) -> Result<(), DomainError> {
            self.writes.fetch_add(1, Ordering::SeqCst);

            if self.fail_writes.load(Ordering::SeqCst) {
                return Err(DomainError::cache("Mock write failure"));
            }

            self.entries
                .lock()
                .unwrap()
                .insert(entry.key.clone(), entry);
            Ok(())
        }

        async fn get_recent(&self, limit: usize) -> Result<Vec<CacheEntry>, DomainError> {
            if self.fail_reads.load(Ordering::SeqCst) {
                return Err(DomainError::cache("Mock read failure"));
            }

            let mut entries: Vec<CacheEntry> = self
                .entries
                .lock()
                .unwrap()
                .values()
                .filter(|e| e.is_readable())
                .cloned()
                .collect();

            entries.sort_by(|a, b| b.created_at.cmp(&a.created_at));
            entries.truncate(limit);
            Ok(entries)
        }

        fn backend(&self) -> &'static str {
            "mock"
        }
    }

    #[cfg(test)]
    mod tests {
        use super::*;
        use crate::domain::cache::GenerationStatus;
        use serde_json::json;
        use std::time::Duration;

        #[tokio::test]
        async fn test_mock_store_hides_expired_rows() {
            let expired = CacheEntry::created_at(
                "old",
                "raw",
                json!(1),
                GenerationStatus::AiGenerated,
                chrono::Utc::now() - chrono::Duration::days(2),
                Duration::from_secs(86_400),
            );
            let store = MockCacheStore::new().with_entry(expired);

            assert!(store.get("old").await.unwrap().is_none());
            assert!(store.raw("old").is_some());
        }

        #[tokio::test]
        async fn test_mock_store_failures() {
            let store = MockCacheStore::new()
                .with_failing_reads()
                .with_failing_writes();

            assert!(store.get("k").await.is_err());
            assert!(
                store
                    .upsert(CacheEntry::new(
                        "k",
                        "raw",
                        json!(1),
                        GenerationStatus::AiGenerated,
                        Duration::from_secs(60),
                    ))
                    .await
                    .is_err()
            );
            assert_eq!(store.reads(), 1);
            assert_eq!(store.writes(), 1);
        }
    }
}
