//! Illustrations for vocabulary phrases

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::ContentDomain;
use crate::domain::cache::{CacheKeyParams, KeyKind, KeyLength};
use crate::domain::fallback::FallbackSynthesizer;
use crate::domain::generation::{GenerationError, Generator, RetryPolicy};
use crate::domain::provider::ImageProvider;
use crate::domain::text::collapse_whitespace;
use crate::domain::DomainError;

pub const NAMESPACE: &str = "images";
pub const DEFAULT_STYLE: &str = "illustration";
pub const MAX_PHRASE_CHARS: usize = 200;
pub const DEFAULT_PLACEHOLDER_URL: &str = "/static/placeholder.png";

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ImageRequest {
    pub phrase: String,
    /// Disambiguating sense, e.g. "river bank" vs "savings bank"
    #[serde(default)]
    pub sense: Option<String>,
    #[serde(default)]
    pub style: Option<String>,
}

impl ImageRequest {
    pub fn new(phrase: impl Into<String>) -> Self {
        Self {
            phrase: phrase.into(),
            sense: None,
            style: None,
        }
    }

    pub fn with_sense(mut self, sense: impl Into<String>) -> Self {
        self.sense = Some(sense.into());
        self
    }

    fn style(&self) -> String {
        self.style
            .as_deref()
            .map(|s| collapse_whitespace(s).to_lowercase())
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| DEFAULT_STYLE.to_string())
    }

    fn sense(&self) -> Option<String> {
        self.sense
            .as_deref()
            .map(collapse_whitespace)
            .filter(|s| !s.is_empty())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImagePayload {
    pub image_url: String,
    pub prompt: String,
    pub alt_text: String,
    /// True when `image_url` is the static placeholder
    #[serde(default)]
    pub placeholder: bool,
}

/// Builds the provider prompt for a phrase
pub fn build_prompt(request: &ImageRequest) -> String {
    let phrase = collapse_whitespace(&request.phrase);
    let mut prompt = format!("A simple {} that illustrates \"{}\"", request.style(), phrase);

    if let Some(sense) = request.sense() {
        prompt.push_str(&format!(" in the sense of {}", sense));
    }

    prompt.push_str(". No text or letters in the image.");
    prompt
}

/// Short keys over the normalized phrase, sense and style. Falls back to a
/// placeholder image.
#[derive(Debug, Clone)]
pub struct ImageDomain {
    placeholder_url: String,
    fallback: FallbackSynthesizer,
}

impl Default for ImageDomain {
    fn default() -> Self {
        Self::new(DEFAULT_PLACEHOLDER_URL)
    }
}

impl ImageDomain {
    pub fn new(placeholder_url: impl Into<String>) -> Self {
        Self {
            placeholder_url: placeholder_url.into(),
            fallback: FallbackSynthesizer::new().with_min_token_chars(1),
        }
    }
}

impl ContentDomain for ImageDomain {
    type Request = ImageRequest;
    type Payload = ImagePayload;

    fn namespace(&self) -> &'static str {
        NAMESPACE
    }

    fn key_length(&self) -> KeyLength {
        KeyLength::Short
    }

    fn validate(&self, request: &ImageRequest) -> Result<(), DomainError> {
        if request.phrase.trim().is_empty() {
            return Err(DomainError::invalid_field("phrase", "phrase must not be empty"));
        }
        if request.phrase.chars().count() > MAX_PHRASE_CHARS {
            return Err(DomainError::invalid_field("phrase", format!(
                "phrase exceeds {} characters",
                MAX_PHRASE_CHARS
            )));
        }
        Ok(())
    }

    fn key_params(&self, request: &ImageRequest) -> CacheKeyParams {
        let sense = request
            .sense()
            .map(|s| s.to_lowercase())
            .unwrap_or_default();

        CacheKeyParams::normalized(&request.phrase, KeyKind::Text)
            .with_component("sense", sense)
            .with_component("style", request.style())
    }

    fn source_identifier(&self, request: &ImageRequest) -> String {
        collapse_whitespace(&request.phrase)
    }

    fn fallback(&self, request: &ImageRequest) -> Option<ImagePayload> {
        let alt_text = self
            .fallback
            .synthesize(&request.phrase, 3)
            .into_iter()
            .map(|t| t.term)
            .collect::<Vec<_>>()
            .join(" ");

        Some(ImagePayload {
            image_url: self.placeholder_url.clone(),
            prompt: build_prompt(request),
            alt_text,
            placeholder: true,
        })
    }
}

#[derive(Debug, Clone)]
pub struct ImageGenerator {
    provider: Arc<dyn ImageProvider>,
    retry: RetryPolicy,
}

impl ImageGenerator {
    pub fn new(provider: Arc<dyn ImageProvider>) -> Self {
        Self {
            provider,
            retry: RetryPolicy::default(),
        }
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }
}

#[async_trait]
impl Generator for ImageGenerator {
    type Input = ImageRequest;
    type Output = ImagePayload;

    async fn generate(&self, _key: &str, request: &ImageRequest) -> Result<ImagePayload, GenerationError> {
        let prompt = build_prompt(request);

        let image_url = self
            .retry
            .run("generate_image", || self.provider.generate_image(&prompt))
            .await?;

        let parsed = url::Url::parse(&image_url)
            .map_err(|e| GenerationError::malformed(format!("image url is invalid: {}", e)))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(GenerationError::malformed(format!(
                "image url has unsupported scheme: {}",
                parsed.scheme()
            )));
        }

        Ok(ImagePayload {
            image_url,
            prompt,
            alt_text: collapse_whitespace(&request.phrase),
            placeholder: false,
        })
    }
}
