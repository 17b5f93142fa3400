use std::time::Duration;

use serde::Deserialize;

use crate::domain::content::{article, image, vocabulary};
use crate::domain::generation::{RetryPolicy, DEFAULT_MIN_SUMMARY_WORDS};
use crate::infrastructure::cache::{StoreConfig, StoreType};
use crate::infrastructure::llm::{
    OpenAiModels, DEFAULT_IMAGE_MODEL, DEFAULT_OPENAI_BASE_URL, DEFAULT_SPEECH_MODEL,
    DEFAULT_TEXT_MODEL,
};
use crate::infrastructure::logging::LoggingConfig;
use crate::infrastructure::observability::ObservabilityConfig;

/// Environment variable consulted when `providers.openai_api_key` is unset
pub const OPENAI_API_KEY_ENV: &str = "OPENAI_API_KEY";

/// Application configuration
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub logging: LoggingConfig,
    pub observability: ObservabilityConfig,
    pub cache: CacheConfig,
    pub providers: ProvidersConfig,
    pub generation: GenerationConfig,
    pub objects: ObjectsConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// External origin used when minting signed object URLs
    pub public_base_url: Option<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            public_base_url: None,
        }
    }
}

impl ServerConfig {
    pub fn base_url(&self) -> String {
        self.public_base_url
            .clone()
            .unwrap_or_else(|| format!("http://localhost:{}", self.port))
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// `in_memory`, `redis` or `postgres`
    pub store: String,
    pub ttl_secs: u64,
    pub max_capacity: u64,
    pub redis_url: Option<String>,
    pub database_url: Option<String>,
    pub table_prefix: String,
    pub single_flight: bool,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            store: StoreType::InMemory.to_string(),
            ttl_secs: 86_400,
            max_capacity: 10_000,
            redis_url: None,
            database_url: None,
            table_prefix: "content".to_string(),
            single_flight: true,
        }
    }
}

impl CacheConfig {
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs.max(1))
    }

    /// Factory settings; fails on an unknown store name
    pub fn store_config(&self) -> Result<StoreConfig, crate::domain::DomainError> {
        Ok(StoreConfig {
            store_type: self.store.parse()?,
            redis_url: self.redis_url.clone(),
            database_url: self.database_url.clone(),
            prefix: self.table_prefix.clone(),
            max_capacity: self.max_capacity.max(1),
            ttl: self.ttl(),
        })
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ProvidersConfig {
    pub openai_api_key: Option<String>,
    pub openai_base_url: String,
    pub text_model: String,
    pub speech_model: String,
    pub image_model: String,
    pub request_timeout_secs: u64,
    pub retry: RetryPolicy,
}

impl Default for ProvidersConfig {
    fn default() -> Self {
        Self {
            openai_api_key: None,
            openai_base_url: DEFAULT_OPENAI_BASE_URL.to_string(),
            text_model: DEFAULT_TEXT_MODEL.to_string(),
            speech_model: DEFAULT_SPEECH_MODEL.to_string(),
            image_model: DEFAULT_IMAGE_MODEL.to_string(),
            request_timeout_secs: 60,
            retry: RetryPolicy::default(),
        }
    }
}

impl ProvidersConfig {
    /// The configured key, else `OPENAI_API_KEY`. Blank values count as unset.
    pub fn api_key(&self) -> Option<String> {
        let present = |k: &String| !k.trim().is_empty();

        self.openai_api_key
            .clone()
            .filter(present)
            .or_else(|| std::env::var(OPENAI_API_KEY_ENV).ok().filter(present))
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs.max(1))
    }

    pub fn models(&self) -> OpenAiModels {
        OpenAiModels {
            text: self.text_model.clone(),
            speech: self.speech_model.clone(),
            image: self.image_model.clone(),
            ..OpenAiModels::default()
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct GenerationConfig {
    pub min_summary_words: usize,
    pub primary_max_tokens: u32,
    pub extension_max_tokens: u32,
    pub min_article_words: usize,
    pub vocabulary_limit: usize,
    /// 0 disables the deadline
    pub deadline_secs: u64,
    pub batch_delay_ms: u64,
    pub placeholder_image_url: String,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            min_summary_words: DEFAULT_MIN_SUMMARY_WORDS,
            primary_max_tokens: 700,
            extension_max_tokens: 500,
            min_article_words: vocabulary::DEFAULT_MIN_ARTICLE_WORDS,
            vocabulary_limit: article::DEFAULT_VOCABULARY_LIMIT,
            deadline_secs: 45,
            batch_delay_ms: 400,
            placeholder_image_url: image::DEFAULT_PLACEHOLDER_URL.to_string(),
        }
    }
}

impl GenerationConfig {
    pub fn deadline(&self) -> Option<Duration> {
        (self.deadline_secs > 0).then(|| Duration::from_secs(self.deadline_secs))
    }

    pub fn batch_delay(&self) -> Duration {
        Duration::from_millis(self.batch_delay_ms)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ObjectsConfig {
    pub root_dir: String,
    /// Unset disables audio URLs and `/objects` downloads
    pub signing_secret: Option<String>,
    pub signed_url_ttl_secs: u64,
}

impl Default for ObjectsConfig {
    fn default() -> Self {
        Self {
            root_dir: "data/objects".to_string(),
            signing_secret: None,
            signed_url_ttl_secs: 3600,
        }
    }
}

impl ObjectsConfig {
    pub fn signed_url_ttl(&self) -> Duration {
        Duration::from_secs(self.signed_url_ttl_secs.max(1))
    }
}

impl AppConfig {
    pub fn load() -> Result<Self, config::ConfigError> {
        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name("config/local").required(false))
            .add_source(
                config::Environment::with_prefix("APP")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }
}
