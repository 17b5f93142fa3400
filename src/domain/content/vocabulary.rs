//! Vocabulary lists for arbitrary text

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::ContentDomain;
use crate::domain::cache::{CacheKeyParams, KeyKind};
use crate::domain::fallback::FallbackSynthesizer;
use crate::domain::generation::{GenerationError, Generator, VocabularyExtractor, VocabularyTerm};
use crate::domain::text::{plain_text, truncate_chars, word_count};
use crate::domain::DomainError;

pub const NAMESPACE: &str = "vocabulary";
pub const DEFAULT_LIMIT: usize = 8;
pub const MAX_LIMIT: usize = 25;
/// Inputs shorter than this skip the provider entirely
pub const DEFAULT_MIN_ARTICLE_WORDS: usize = 60;

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct VocabularyRequest {
    pub text: String,
    #[serde(default)]
    pub limit: Option<usize>,
}

impl VocabularyRequest {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            limit: None,
        }
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn effective_limit(&self) -> usize {
        self.limit.unwrap_or(DEFAULT_LIMIT)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VocabularyPayload {
    pub terms: Vec<VocabularyTerm>,
    pub source_word_count: usize,
}

#[derive(Debug, Clone, Default)]
pub struct VocabularyDomain {
    fallback: FallbackSynthesizer,
}

impl VocabularyDomain {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ContentDomain for VocabularyDomain {
    type Request = VocabularyRequest;
    type Payload = VocabularyPayload;

    fn namespace(&self) -> &'static str {
        NAMESPACE
    }

    fn validate(&self, request: &VocabularyRequest) -> Result<(), DomainError> {
        if request.text.trim().is_empty() {
            return Err(DomainError::invalid_field("text", "text must not be empty"));
        }
        let limit = request.effective_limit();
        if limit == 0 || limit > MAX_LIMIT {
            return Err(DomainError::invalid_field("limit", format!(
                "limit must be between 1 and {}",
                MAX_LIMIT
            )));
        }
        Ok(())
    }

    fn key_params(&self, request: &VocabularyRequest) -> CacheKeyParams {
        CacheKeyParams::normalized(&plain_text(&request.text), KeyKind::Text)
            .with_component("limit", request.effective_limit().to_string())
    }

    fn source_identifier(&self, request: &VocabularyRequest) -> String {
        truncate_chars(&plain_text(&request.text), 200)
    }

    fn fallback(&self, request: &VocabularyRequest) -> Option<VocabularyPayload> {
        let text = plain_text(&request.text);

        Some(VocabularyPayload {
            terms: self.fallback.synthesize(&text, request.effective_limit()),
            source_word_count: word_count(&text),
        })
    }
}

/// Provider extraction, skipped for inputs below the minimum word count
#[derive(Debug, Clone)]
pub struct VocabularyGenerator {
    extractor: VocabularyExtractor,
    min_words: usize,
}

impl VocabularyGenerator {
    pub fn new(extractor: VocabularyExtractor) -> Self {
        Self {
            extractor,
            min_words: DEFAULT_MIN_ARTICLE_WORDS,
        }
    }

    pub fn with_min_words(mut self, min_words: usize) -> Self {
        self.min_words = min_words;
        self
    }
}

#[async_trait]
impl Generator for VocabularyGenerator {
    type Input = VocabularyRequest;
    type Output = VocabularyPayload;

    async fn generate(&self, _key: &str, request: &VocabularyRequest) -> Result<VocabularyPayload, GenerationError> {
        let text = plain_text(&request.text);
        let words = word_count(&text);

        if words < self.min_words {
            return Err(GenerationError::insufficient_input(format!(
                "{} words, at least {} required",
                words, self.min_words
            )));
        }

        let terms = self.extractor.extract(&text, request.effective_limit()).await?;

        Ok(VocabularyPayload {
            terms,
            source_word_count: words,
        })
    }
}
