//! Cache-aside orchestration shared by every content domain

use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::{debug, error, info, warn};

use super::single_flight::KeyLocks;
use crate::domain::cache::{CacheEntry, CacheKeyDeriver, CacheStore, GenerationStatus};
use crate::domain::content::{
    ArticleDomain, ArticleGenerator, ContentDomain, ContentOutcome, ImageDomain, ImageGenerator,
    SpeechDomain, SpeechGenerator, VocabularyDomain, VocabularyGenerator,
};
use crate::domain::generation::{GenerationError, Generator};
use crate::domain::DomainError;
use crate::infrastructure::observability::metrics::{
    record_cache_lookup, record_generation, record_provider_failure, record_provider_success,
    record_store_error,
};

pub type SpeechService = ContentService<SpeechDomain, SpeechGenerator>;
pub type ArticleService = ContentService<ArticleDomain, ArticleGenerator>;
pub type VocabularyService = ContentService<VocabularyDomain, VocabularyGenerator>;
pub type ImageService = ContentService<ImageDomain, ImageGenerator>;

/// Orchestration settings shared by all domains
#[derive(Debug, Clone)]
pub struct ContentServiceConfig {
    /// Lifetime of every written entry, generated or fallen back
    pub ttl: Duration,
    /// Upper bound on one generator call; `None` waits indefinitely
    pub deadline: Option<Duration>,
    /// Serialize concurrent misses for the same key
    pub single_flight: bool,
    /// Pause between consecutive generator calls in a batch
    pub batch_delay: Duration,
}

impl Default for ContentServiceConfig {
    fn default() -> Self {
        Self {
            ttl: Duration::from_secs(86_400),
            deadline: Some(Duration::from_secs(45)),
            single_flight: true,
            batch_delay: Duration::from_millis(400),
        }
    }
}

impl ContentServiceConfig {
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    pub fn with_deadline(mut self, deadline: Option<Duration>) -> Self {
        self.deadline = deadline;
        self
    }

    pub fn with_single_flight(mut self, enabled: bool) -> Self {
        self.single_flight = enabled;
        self
    }

    pub fn with_batch_delay(mut self, delay: Duration) -> Self {
        self.batch_delay = delay;
        self
    }
}

/// Serves one content domain: derive key, look up, generate on miss,
/// fall back on failure, write back.
///
/// Store failures never fail a request. Reads degrade to a miss and writes
/// to a no-op, both logged and counted.
#[derive(Debug)]
pub struct ContentService<D, G> {
    domain: D,
    generator: G,
    store: Arc<dyn CacheStore>,
    deriver: CacheKeyDeriver,
    config: ContentServiceConfig,
    locks: Option<KeyLocks>,
}

impl<D, G> ContentService<D, G>
where
    D: ContentDomain,
    G: Generator<Input = D::Request, Output = D::Payload>,
{
    pub fn new(domain: D, generator: G, store: Arc<dyn CacheStore>) -> Self {
        Self::with_config(domain, generator, store, ContentServiceConfig::default())
    }

    pub fn with_config(
        domain: D,
        generator: G,
        store: Arc<dyn CacheStore>,
        config: ContentServiceConfig,
    ) -> Self {
        let deriver = CacheKeyDeriver::new(domain.namespace()).with_length(domain.key_length());
        let locks = config.single_flight.then(KeyLocks::new);

        Self {
            domain,
            generator,
            store,
            deriver,
            config,
            locks,
        }
    }

    pub fn namespace(&self) -> &'static str {
        self.domain.namespace()
    }

    pub fn domain(&self) -> &D {
        &self.domain
    }

    pub fn config(&self) -> &ContentServiceConfig {
        &self.config
    }

    pub fn backend(&self) -> &'static str {
        self.store.backend()
    }

    pub fn derive_key(&self, request: &D::Request) -> String {
        self.deriver.derive(&self.domain.key_params(request))
    }

    /// Serves `request` from the cache or generates it.
    ///
    /// `force_refresh` skips the lookup but still writes the result.
    pub async fn get_or_generate(
        &self,
        request: &D::Request,
        force_refresh: bool,
    ) -> Result<ContentOutcome<D::Payload>, DomainError> {
        self.domain.validate(request)?;

        let key = self.derive_key(request);

        if !force_refresh {
            if let Some(hit) = self.lookup(&key).await {
                return Ok(hit);
            }
        }

        let guard = match &self.locks {
            Some(locks) => Some(locks.acquire(&key).await),
            None => None,
        };

        // Another caller may have filled the key while we waited
        if !force_refresh && guard.is_some() {
            if let Some(hit) = self.lookup(&key).await {
                return Ok(hit);
            }
        }

        let outcome = self.generate_and_store(key, request).await;
        drop(guard);
        outcome
    }

    /// Processes requests in order, pausing after each generator call
    pub async fn get_or_generate_batch(
        &self,
        requests: &[D::Request],
        force_refresh: bool,
    ) -> Vec<Result<ContentOutcome<D::Payload>, DomainError>> {
        let mut results = Vec::with_capacity(requests.len());

        for (index, request) in requests.iter().enumerate() {
            let result = self.get_or_generate(request, force_refresh).await;

            let generated = match &result {
                Ok(outcome) => !outcome.is_cache_hit(),
                Err(DomainError::Validation { .. }) => false,
                Err(_) => true,
            };

            results.push(result);

            let has_next = index + 1 < requests.len();

            if generated && has_next && !self.config.batch_delay.is_zero() {
                tokio::time::sleep(self.config.batch_delay).await;
            }
        }

        results
    }

    /// Most recent readable entries, newest first.
    ///
    /// A failing store yields an empty list; undecodable rows are skipped.
    pub async fn recent(&self, limit: usize) -> Vec<ContentOutcome<D::Payload>> {
        let entries = match self.store.get_recent(limit).await {
            Ok(entries) => entries,
            Err(e) => {
                warn!(
                    namespace = self.namespace(),
                    backend = self.backend(),
                    error = %e,
                    "Recent entries read failed"
                );
                record_store_error(self.namespace(), self.backend(), "get_recent");
                return Vec::new();
            }
        };

        entries
            .into_iter()
            .filter_map(|entry| self.decode_hit(entry))
            .collect()
    }

    /// Readiness check against the backing store
    pub async fn probe(&self) -> Result<(), DomainError> {
        self.store.get_recent(1).await.map(|_| ())
    }

    async fn lookup(&self, key: &str) -> Option<ContentOutcome<D::Payload>> {
        let namespace = self.namespace();

        match self.store.get(key).await {
            Ok(Some(entry)) => {
                let hit = self.decode_hit(entry);
                let outcome = if hit.is_some() { "hit" } else { "undecodable" };

                record_cache_lookup(namespace, outcome);
                debug!(namespace, key, outcome, "Cache lookup");
                hit
            }
            Ok(None) => {
                record_cache_lookup(namespace, "miss");
                debug!(namespace, key, outcome = "miss", "Cache lookup");
                None
            }
            Err(e) => {
                warn!(namespace, key, backend = self.backend(), error = %e, "Cache read failed, treating as miss");
                record_store_error(namespace, self.backend(), "get");
                record_cache_lookup(namespace, "error");
                None
            }
        }
    }

    fn decode_hit(&self, entry: CacheEntry) -> Option<ContentOutcome<D::Payload>> {
        match serde_json::from_value::<D::Payload>(entry.payload) {
            Ok(payload) => Some(ContentOutcome {
                key: entry.key,
                payload,
                status: GenerationStatus::CacheHit,
                source_status: entry.generation_status,
                generated_at: entry.created_at,
                expires_at: entry.expires_at,
                note: None,
            }),
            Err(e) => {
                warn!(
                    namespace = self.namespace(),
                    key = %entry.key,
                    error = %e,
                    "Stored payload no longer decodes"
                );
                None
            }
        }
    }

    async fn generate_and_store(
        &self,
        key: String,
        request: &D::Request,
    ) -> Result<ContentOutcome<D::Payload>, DomainError> {
        let namespace = self.namespace();
        let started = Instant::now();

        let (payload, status, note) = match self.generate(&key, request).await {
            Ok(payload) => {
                record_provider_success(namespace);
                (payload, GenerationStatus::AiGenerated, None)
            }
            Err(err) => {
                record_provider_failure(namespace, err.kind().as_str());

                if err.is_fatal() {
                    error!(namespace, key = %key, error = %err, "Generation cannot proceed");
                    return Err(err.into());
                }

                match self.domain.fallback(request) {
                    Some(payload) => {
                        warn!(
                            namespace,
                            key = %key,
                            error_kind = %err.kind(),
                            error = %err,
                            "Generation failed, serving fallback"
                        );
                        (payload, GenerationStatus::FallbackSource, Some(err.note()))
                    }
                    None => {
                        warn!(
                            namespace,
                            key = %key,
                            error_kind = %err.kind(),
                            error = %err,
                            "Generation failed with no fallback"
                        );
                        return Err(err.into());
                    }
                }
            }
        };

        record_generation(namespace, status, started.elapsed());

        let entry = CacheEntry::new(
            key.clone(),
            self.domain.source_identifier(request),
            serde_json::Value::Null,
            status,
            self.config.ttl,
        )
        .with_category(self.domain.category(request));

        let generated_at = entry.created_at;
        let expires_at = entry.expires_at;

        match serde_json::to_value(&payload) {
            Ok(value) => self.write(CacheEntry { payload: value, ..entry }).await,
            Err(e) => warn!(namespace, key = %key, error = %e, "Payload not serializable, skipping write"),
        }

        info!(namespace, key = %key, status = %status, "Content served");

        Ok(ContentOutcome {
            key,
            payload,
            status,
            source_status: status,
            generated_at,
            expires_at,
            note,
        })
    }

    async fn generate(&self, key: &str, request: &D::Request) -> Result<D::Payload, GenerationError> {
        let Some(deadline) = self.config.deadline else {
            return self.generator.generate(key, request).await;
        };

        match tokio::time::timeout(deadline, self.generator.generate(key, request)).await {
            Ok(result) => result,
            Err(_) => Err(GenerationError::timeout(
                "deadline",
                format!("generation exceeded {} ms", deadline.as_millis()),
            )),
        }
    }

    async fn write(&self, entry: CacheEntry) {
        let key = entry.key.clone();

        if let Err(e) = self.store.upsert(entry).await {
            warn!(
                namespace = self.namespace(),
                key = %key,
                backend = self.backend(),
                error = %e,
                "Cache write failed, response still served"
            );
            record_store_error(self.namespace(), self.backend(), "upsert");
        }
    }
}
