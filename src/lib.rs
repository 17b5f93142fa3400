//! PMP Content Gateway
//!
//! Cache-aside generation of learning content:
//! - Text-to-speech audio served through signed object URLs
//! - Article summaries with vocabulary lists
//! - Vocabulary extraction for arbitrary text
//! - Illustrations for vocabulary phrases
//!
//! Every domain shares one orchestrator: deterministic cache keys, a
//! pluggable store (memory, Redis, Postgres), provider generation with a
//! deadline and bounded retries, and a local fallback when providers fail.

pub mod api;
pub mod cli;
pub mod config;
pub mod domain;
pub mod infrastructure;

pub use self::config::AppConfig;

use std::sync::Arc;

use api::state::{ApiSettings, AppState};
use domain::content::{
    ArticleDomain, ArticleGenerator, ImageDomain, ImageGenerator, SpeechDomain, SpeechGenerator,
    VocabularyDomain, VocabularyGenerator,
};
use domain::generation::{TextPipeline, VocabularyExtractor};
use domain::{DomainError, ImageProvider, ObjectStore, SpeechProvider, TextProvider};
use infrastructure::cache::CacheStoreFactory;
use infrastructure::llm::{HttpClient, OpenAiProvider, UnconfiguredProvider};
use infrastructure::services::{ContentService, ContentServiceConfig};
use infrastructure::storage::{LocalObjectStore, UrlSigner};
use tracing::{info, warn};

/// Provider capabilities, all backed by one client
struct Providers {
    text: Arc<dyn TextProvider>,
    speech: Arc<dyn SpeechProvider>,
    image: Arc<dyn ImageProvider>,
}

fn create_providers(config: &AppConfig) -> Result<Providers, DomainError> {
    let Some(api_key) = config.providers.api_key() else {
        warn!("No OpenAI API key configured; generation falls back or fails with a configuration error");
        let provider = Arc::new(UnconfiguredProvider);
        return Ok(Providers {
            text: provider.clone(),
            speech: provider.clone(),
            image: provider,
        });
    };

    let client = HttpClient::with_timeout("openai", config.providers.request_timeout())?;
    let provider = Arc::new(
        OpenAiProvider::with_base_url(client, api_key, &config.providers.openai_base_url)
            .with_models(config.providers.models()),
    );

    info!(
        base_url = %config.providers.openai_base_url,
        text_model = %config.providers.text_model,
        "OpenAI provider configured"
    );

    Ok(Providers {
        text: provider.clone(),
        speech: provider.clone(),
        image: provider,
    })
}

/// Create the application state with default configuration
pub async fn create_app_state() -> Result<AppState, DomainError> {
    create_app_state_with_config(&AppConfig::default()).await
}

/// Create the application state from configuration.
///
/// Connects the cache backend and prepares one store per namespace. A
/// missing provider key or signing secret is not an error here; the
/// affected endpoints report it when called.
pub async fn create_app_state_with_config(config: &AppConfig) -> Result<AppState, DomainError> {
    let factory = CacheStoreFactory::connect(&config.cache.store_config()?).await?;
    let providers = create_providers(config)?;
    let retry = config.providers.retry.clone();
    let generation = &config.generation;

    let service_config = ContentServiceConfig::default()
        .with_ttl(config.cache.ttl())
        .with_deadline(generation.deadline())
        .with_single_flight(config.cache.single_flight)
        .with_batch_delay(generation.batch_delay());

    let objects: Arc<dyn ObjectStore> = Arc::new(LocalObjectStore::new(&config.objects.root_dir));
    let vocabulary_limit = generation.vocabulary_limit.max(1);

    let speech = ContentService::with_config(
        SpeechDomain::new(),
        SpeechGenerator::new(providers.speech, objects.clone()).with_retry(retry.clone()),
        factory.create(domain::content::speech::NAMESPACE).await?,
        service_config.clone(),
    );

    let articles = ContentService::with_config(
        ArticleDomain::new(vocabulary_limit),
        ArticleGenerator::new(
            TextPipeline::new(providers.text.clone())
                .with_retry(retry.clone())
                .with_min_words(generation.min_summary_words),
            VocabularyExtractor::new(providers.text.clone()).with_retry(retry.clone()),
        )
        .with_vocabulary_limit(vocabulary_limit)
        .with_token_limits(generation.primary_max_tokens, generation.extension_max_tokens),
        factory.create(domain::content::article::NAMESPACE).await?,
        service_config.clone(),
    );

    let vocabulary = ContentService::with_config(
        VocabularyDomain::new(),
        VocabularyGenerator::new(
            VocabularyExtractor::new(providers.text).with_retry(retry.clone()),
        )
        .with_min_words(generation.min_article_words),
        factory.create(domain::content::vocabulary::NAMESPACE).await?,
        service_config.clone(),
    );

    let images = ContentService::with_config(
        ImageDomain::new(&generation.placeholder_image_url),
        ImageGenerator::new(providers.image).with_retry(retry),
        factory.create(domain::content::image::NAMESPACE).await?,
        service_config,
    );

    let settings = ApiSettings {
        signed_url_ttl: config.objects.signed_url_ttl(),
        ..ApiSettings::default()
    };

    let mut state = AppState::new(speech, articles, vocabulary, images, objects)
        .with_settings(settings);

    match config.objects.signing_secret.as_deref().filter(|s| !s.is_empty()) {
        Some(secret) => {
            state = state.with_signer(UrlSigner::new(secret, config.server.base_url())?);
        }
        None => warn!("objects.signing_secret is not set; speech audio URLs are unavailable"),
    }

    info!(
        store = %factory.store_type(),
        single_flight = config.cache.single_flight,
        "Application state initialized"
    );

    Ok(state)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_default_state_uses_in_memory_stores() {
        let state = create_app_state().await.unwrap();

        assert_eq!(state.speech.backend(), "in_memory");
        assert_eq!(state.articles.namespace(), "articles");
        assert!(state.signer.is_none());
        assert!(state.speech.config().single_flight);
    }

    #[tokio::test]
    async fn test_signing_secret_enables_signer() {
        let mut config = AppConfig::default();
        config.objects.signing_secret = Some("secret".to_string());
        config.objects.signed_url_ttl_secs = 120;
        config.server.public_base_url = Some("https://content.example.com".to_string());

        let state = create_app_state_with_config(&config).await.unwrap();

        assert!(state.signer.is_some());
        assert_eq!(state.settings.signed_url_ttl.as_secs(), 120);
    }

    #[tokio::test]
    async fn test_unknown_store_fails_startup() {
        let mut config = AppConfig::default();
        config.cache.store = "memcached".to_string();

        match create_app_state_with_config(&config).await {
            Err(err) => assert!(matches!(err, DomainError::Configuration { .. })),
            Ok(_) => panic!("unknown cache store should fail startup"),
        }
    }
}
