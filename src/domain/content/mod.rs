//! Content domains served through the cache-aside pipeline

pub mod article;
pub mod image;
pub mod speech;
pub mod vocabulary;

use std::fmt::Debug;

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::domain::cache::{CacheKeyParams, GenerationStatus, KeyLength};
use crate::domain::DomainError;

pub use article::{ArticleDomain, ArticleGenerator, ArticlePayload, ArticleRequest};
pub use image::{ImageDomain, ImageGenerator, ImagePayload, ImageRequest};
pub use speech::{SpeechDomain, SpeechGenerator, SpeechPayload, SpeechRequest};
pub use vocabulary::{VocabularyDomain, VocabularyGenerator, VocabularyPayload, VocabularyRequest};

/// Key policy, validation and fallback for one kind of content.
///
/// Paired with a [`crate::domain::generation::Generator`] producing the same
/// payload type.
pub trait ContentDomain: Send + Sync + Debug {
    type Request: Send + Sync + Debug;
    type Payload: Serialize + DeserializeOwned + Clone + Send + Sync + Debug;

    /// Namespace mixed into every key; also scopes the store
    fn namespace(&self) -> &'static str;

    fn key_length(&self) -> KeyLength {
        KeyLength::Full
    }

    /// Rejects requests that cannot be served at all
    fn validate(&self, request: &Self::Request) -> Result<(), DomainError>;

    fn key_params(&self, request: &Self::Request) -> CacheKeyParams;

    /// Human-readable identity of the source stored with the entry
    fn source_identifier(&self, request: &Self::Request) -> String;

    fn category(&self, _request: &Self::Request) -> Option<String> {
        None
    }

    /// Always-available payload; `None` when the domain has no safe fallback
    fn fallback(&self, request: &Self::Request) -> Option<Self::Payload>;
}

/// What one request produced
#[derive(Debug, Clone, PartialEq)]
pub struct ContentOutcome<P> {
    pub key: String,
    pub payload: P,
    /// How this response was produced
    pub status: GenerationStatus,
    /// How the stored payload was originally produced
    pub source_status: GenerationStatus,
    pub generated_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub note: Option<String>,
}

impl<P> ContentOutcome<P> {
    pub fn is_cache_hit(&self) -> bool {
        self.status == GenerationStatus::CacheHit
    }
}
