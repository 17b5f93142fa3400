//! Article summaries with learner vocabulary

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::warn;

use super::ContentDomain;
use crate::domain::cache::{normalize, CacheKeyParams, GenerationStatus, KeyKind};
use crate::domain::fallback::FallbackSynthesizer;
use crate::domain::generation::{
    GenerationError, Generator, TextPipeline, VocabularyExtractor, VocabularyTerm,
};
use crate::domain::provider::TextRequest;
use crate::domain::text::{plain_text, truncate_chars, word_count};
use crate::domain::DomainError;

pub const NAMESPACE: &str = "articles";
pub const DEFAULT_VOCABULARY_LIMIT: usize = 8;
/// Longest article body sent to the summarizer
pub const MAX_SOURCE_CHARS: usize = 12_000;
/// Length of the extractive summary used as fallback
pub const FALLBACK_SUMMARY_CHARS: usize = 900;

const SUMMARY_SYSTEM_PROMPT: &str = "You rewrite news articles for intermediate English learners. \
Use clear sentences and plain words. Respond with the summary text only.";

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ArticleRequest {
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub published_at: Option<String>,
    /// Article body, plain text or HTML
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub category: Option<String>,
}

impl ArticleRequest {
    fn url(&self) -> Option<&str> {
        self.url.as_deref().map(str::trim).filter(|u| !u.is_empty())
    }

    fn id(&self) -> Option<&str> {
        self.id.as_deref().map(str::trim).filter(|i| !i.is_empty())
    }

    /// Body as plain text, or the title when the body is empty
    fn source_text(&self) -> String {
        let body = plain_text(&self.text);
        if body.is_empty() {
            self.title.trim().to_string()
        } else {
            body
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArticlePayload {
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub published_at: Option<String>,
    pub summary: String,
    pub word_count: usize,
    /// True when the summary came from the extension pass
    #[serde(default)]
    pub extended: bool,
    pub vocabulary: Vec<VocabularyTerm>,
    /// How the vocabulary list was produced
    pub vocabulary_status: GenerationStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vocabulary_note: Option<String>,
}

/// Keys on the normalized URL when present, otherwise on the id, otherwise
/// on title and publish date. Full-length keys.
#[derive(Debug, Clone)]
pub struct ArticleDomain {
    fallback: FallbackSynthesizer,
    vocabulary_limit: usize,
}

impl Default for ArticleDomain {
    fn default() -> Self {
        Self::new(DEFAULT_VOCABULARY_LIMIT)
    }
}

impl ArticleDomain {
    pub fn new(vocabulary_limit: usize) -> Self {
        Self {
            fallback: FallbackSynthesizer::new(),
            vocabulary_limit: vocabulary_limit.max(1),
        }
    }
}

impl ContentDomain for ArticleDomain {
    type Request = ArticleRequest;
    type Payload = ArticlePayload;

    fn namespace(&self) -> &'static str {
        NAMESPACE
    }

    fn validate(&self, request: &ArticleRequest) -> Result<(), DomainError> {
        if request.url().is_none() && request.id().is_none() && request.title.trim().is_empty() {
            return Err(DomainError::validation(
                "article needs a url, an id or a title",
            ));
        }
        if let Some(url) = request.url() {
            url::Url::parse(url)
                .map_err(|e| DomainError::invalid_field("url", format!("invalid article url: {}", e)))?;
        }
        if request.text.trim().is_empty() && request.title.trim().is_empty() {
            return Err(DomainError::validation("article has no text"));
        }
        Ok(())
    }

    fn key_params(&self, request: &ArticleRequest) -> CacheKeyParams {
        if let Some(url) = request.url() {
            CacheKeyParams::normalized(url, KeyKind::Url)
        } else if let Some(id) = request.id() {
            CacheKeyParams::new(format!("id:{}", normalize(id, KeyKind::Text)))
        } else {
            CacheKeyParams::from_title_and_date(&request.title, request.published_at.as_deref())
        }
    }

    fn source_identifier(&self, request: &ArticleRequest) -> String {
        if let Some(url) = request.url() {
            url.to_string()
        } else if let Some(id) = request.id() {
            id.to_string()
        } else {
            format!(
                "{}|{}",
                request.title.trim(),
                request.published_at.as_deref().unwrap_or_default()
            )
        }
    }

    fn category(&self, request: &ArticleRequest) -> Option<String> {
        request
            .category
            .as_deref()
            .map(|c| c.trim().to_lowercase())
            .filter(|c| !c.is_empty())
    }

    /// Extractive summary plus synthesized vocabulary
    fn fallback(&self, request: &ArticleRequest) -> Option<ArticlePayload> {
        let source = request.source_text();
        let summary = truncate_chars(&source, FALLBACK_SUMMARY_CHARS);

        Some(ArticlePayload {
            title: request.title.trim().to_string(),
            source_url: request.url().map(str::to_string),
            published_at: request.published_at.clone(),
            word_count: word_count(&summary),
            summary,
            extended: false,
            vocabulary: self.fallback.synthesize(&source, self.vocabulary_limit),
            vocabulary_status: GenerationStatus::FallbackSource,
            vocabulary_note: None,
        })
    }
}

/// Summary through the multi-pass pipeline, then vocabulary from the summary
#[derive(Debug, Clone)]
pub struct ArticleGenerator {
    pipeline: TextPipeline,
    extractor: VocabularyExtractor,
    fallback: FallbackSynthesizer,
    vocabulary_limit: usize,
    primary_max_tokens: u32,
    extension_max_tokens: u32,
}

impl ArticleGenerator {
    pub fn new(pipeline: TextPipeline, extractor: VocabularyExtractor) -> Self {
        Self {
            pipeline,
            extractor,
            fallback: FallbackSynthesizer::new(),
            vocabulary_limit: DEFAULT_VOCABULARY_LIMIT,
            primary_max_tokens: 400,
            extension_max_tokens: 600,
        }
    }

    pub fn with_vocabulary_limit(mut self, limit: usize) -> Self {
        self.vocabulary_limit = limit.max(1);
        self
    }

    pub fn with_token_limits(mut self, primary: u32, extension: u32) -> Self {
        self.primary_max_tokens = primary;
        self.extension_max_tokens = extension;
        self
    }

    fn summary_request(&self, request: &ArticleRequest, source: &str) -> TextRequest {
        let prompt = format!(
            "Summarize the article below in at least {} words.\n\nTitle: {}\n\n{}",
            self.pipeline.min_words(),
            request.title.trim(),
            truncate_chars(source, MAX_SOURCE_CHARS)
        );

        TextRequest::new(prompt, self.primary_max_tokens)
            .with_system(SUMMARY_SYSTEM_PROMPT)
            .with_temperature(0.4)
    }

    fn extension_request(&self, source: &str, previous: &str) -> TextRequest {
        let prompt = format!(
            "The summary below is too short. Rewrite it with more detail from the article so it \
has at least {} words.\n\nSummary:\n{}\n\nArticle:\n{}",
            self.pipeline.min_words(),
            previous,
            truncate_chars(source, MAX_SOURCE_CHARS)
        );

        TextRequest::new(prompt, self.extension_max_tokens)
            .with_system(SUMMARY_SYSTEM_PROMPT)
            .with_temperature(0.4)
    }
}

#[async_trait]
impl Generator for ArticleGenerator {
    type Input = ArticleRequest;
    type Output = ArticlePayload;

    async fn generate(&self, _key: &str, request: &ArticleRequest) -> Result<ArticlePayload, GenerationError> {
        let source = request.source_text();

        let outcome = self
            .pipeline
            .run(self.summary_request(request, &source), |previous| {
                self.extension_request(&source, previous)
            })
            .await?;

        let (vocabulary, vocabulary_status, vocabulary_note) =
            match self.extractor.extract(&outcome.text, self.vocabulary_limit).await {
                Ok(terms) => (terms, GenerationStatus::AiGenerated, None),
                Err(err) => {
                    warn!(error = %err, "Vocabulary extraction failed, synthesizing from summary");
                    (
                        self.fallback.synthesize(&outcome.text, self.vocabulary_limit),
                        GenerationStatus::FallbackSource,
                        Some(err.note()),
                    )
                }
            };

        Ok(ArticlePayload {
            title: request.title.trim().to_string(),
            source_url: request.url().map(str::to_string),
            published_at: request.published_at.clone(),
            summary: outcome.text,
            word_count: outcome.word_count,
            extended: outcome.extended,
            vocabulary,
            vocabulary_status,
            vocabulary_note,
        })
    }
}
