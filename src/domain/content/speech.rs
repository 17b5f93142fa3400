//! Text-to-speech content

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::ContentDomain;
use crate::domain::cache::{CacheKeyParams, KeyKind, KeyLength};
use crate::domain::generation::{GenerationError, Generator, RetryPolicy};
use crate::domain::provider::{ObjectStore, SpeechProvider};
use crate::domain::text::truncate_chars;
use crate::domain::DomainError;

pub const NAMESPACE: &str = "speech";
pub const DEFAULT_VOICE: &str = "alloy";
pub const DEFAULT_RATE: f32 = 1.0;
pub const MIN_RATE: f32 = 0.25;
pub const MAX_RATE: f32 = 4.0;
/// Longest input accepted by the speech endpoint
pub const MAX_SPEECH_CHARS: usize = 4096;
pub const AUDIO_CONTENT_TYPE: &str = "audio/mpeg";

fn default_voice() -> String {
    DEFAULT_VOICE.to_string()
}

fn default_rate() -> f32 {
    DEFAULT_RATE
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SpeechRequest {
    pub text: String,
    #[serde(default = "default_voice")]
    pub voice: String,
    #[serde(default = "default_rate")]
    pub rate: f32,
}

impl SpeechRequest {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            voice: default_voice(),
            rate: DEFAULT_RATE,
        }
    }

    pub fn with_voice(mut self, voice: impl Into<String>) -> Self {
        self.voice = voice.into();
        self
    }

    pub fn with_rate(mut self, rate: f32) -> Self {
        self.rate = rate;
        self
    }

    fn normalized_voice(&self) -> String {
        self.voice.trim().to_lowercase()
    }
}

/// Reference to synthesized audio held in the object store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpeechPayload {
    pub object_path: String,
    pub voice: String,
    pub rate: f32,
    pub content_type: String,
    pub size_bytes: usize,
}

/// Short keys over normalized text, voice and rate. No fallback: there is
/// no safe substitute for audio.
#[derive(Debug, Clone, Default)]
pub struct SpeechDomain;

impl SpeechDomain {
    pub fn new() -> Self {
        Self
    }
}

impl ContentDomain for SpeechDomain {
    type Request = SpeechRequest;
    type Payload = SpeechPayload;

    fn namespace(&self) -> &'static str {
        NAMESPACE
    }

    fn key_length(&self) -> KeyLength {
        KeyLength::Short
    }

    fn validate(&self, request: &SpeechRequest) -> Result<(), DomainError> {
        if request.text.trim().is_empty() {
            return Err(DomainError::invalid_field("text", "text must not be empty"));
        }
        if request.text.chars().count() > MAX_SPEECH_CHARS {
            return Err(DomainError::invalid_field("text", format!(
                "text exceeds {} characters",
                MAX_SPEECH_CHARS
            )));
        }
        if request.voice.trim().is_empty() {
            return Err(DomainError::invalid_field("voice", "voice must not be empty"));
        }
        if !request.rate.is_finite() || !(MIN_RATE..=MAX_RATE).contains(&request.rate) {
            return Err(DomainError::invalid_field("rate", format!(
                "rate must be between {} and {}",
                MIN_RATE, MAX_RATE
            )));
        }
        Ok(())
    }

    fn key_params(&self, request: &SpeechRequest) -> CacheKeyParams {
        CacheKeyParams::normalized(&request.text, KeyKind::Text)
            .with_component("voice", request.normalized_voice())
            .with_component("rate", format!("{:.2}", request.rate))
    }

    fn source_identifier(&self, request: &SpeechRequest) -> String {
        truncate_chars(request.text.trim(), 200)
    }

    fn fallback(&self, _request: &SpeechRequest) -> Option<SpeechPayload> {
        None
    }
}

/// Synthesizes audio and persists it under `speech/{key}.mp3`
#[derive(Debug, Clone)]
pub struct SpeechGenerator {
    provider: Arc<dyn SpeechProvider>,
    objects: Arc<dyn ObjectStore>,
    retry: RetryPolicy,
}

impl SpeechGenerator {
    pub fn new(provider: Arc<dyn SpeechProvider>, objects: Arc<dyn ObjectStore>) -> Self {
        Self {
            provider,
            objects,
            retry: RetryPolicy::default(),
        }
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn object_path(key: &str) -> String {
        format!("{}/{}.mp3", NAMESPACE, key)
    }
}

#[async_trait]
impl Generator for SpeechGenerator {
    type Input = SpeechRequest;
    type Output = SpeechPayload;

    async fn generate(&self, key: &str, request: &SpeechRequest) -> Result<SpeechPayload, GenerationError> {
        let voice = request.normalized_voice();

        let audio = self
            .retry
            .run("generate_speech", || {
                self.provider.generate_speech(&request.text, &voice, request.rate)
            })
            .await?;

        if audio.is_empty() {
            return Err(GenerationError::malformed("speech provider returned no audio"));
        }

        let path = Self::object_path(key);
        let size_bytes = audio.len();

        self.objects
            .put_object(&path, audio, AUDIO_CONTENT_TYPE)
            .await
            .map_err(|e| GenerationError::transport("object_store", e.to_string()))?;

        Ok(SpeechPayload {
            object_path: path,
            voice,
            rate: request.rate,
            content_type: AUDIO_CONTENT_TYPE.to_string(),
            size_bytes,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::cache::CacheKeyDeriver;
    use crate::domain::provider::mock::MockSpeechProvider;
    use crate::domain::provider::MockObjectStore;
    use crate::infrastructure::storage::InMemoryObjectStore;

    fn key_for(request: &SpeechRequest) -> String {
        let domain = SpeechDomain::new();
        CacheKeyDeriver::new(domain.namespace())
            .with_length(domain.key_length())
            .derive(&domain.key_params(request))
    }

    #[test]
    fn test_short_key_over_text_voice_rate() {
        let a = SpeechRequest::new("Hello").with_voice("alloy").with_rate(0.85);
        let b = SpeechRequest::new("  hello ").with_voice("Alloy").with_rate(0.85);
        let c = SpeechRequest::new("hello").with_voice("alloy").with_rate(1.0);

        assert_eq!(key_for(&a).len(), 16);
        assert_eq!(key_for(&a), key_for(&b));
        assert_ne!(key_for(&a), key_for(&c));
    }

    #[test]
    fn test_long_texts_sharing_a_prefix_get_distinct_keys() {
        let prefix = "word ".repeat(200);
        let a = SpeechRequest::new(format!("{}alpha ending", prefix));
        let b = SpeechRequest::new(format!("{}completely different ending", prefix));
        let domain = SpeechDomain::new();

        assert!(domain.validate(&a).is_ok());
        assert!(domain.validate(&b).is_ok());
        assert_ne!(key_for(&a), key_for(&b));
        assert_eq!(key_for(&a).len(), 16);
    }

    #[test]
    fn test_validation() {
        let domain = SpeechDomain::new();

        assert!(domain.validate(&SpeechRequest::new("hello")).is_ok());
        assert!(domain.validate(&SpeechRequest::new("   ")).is_err());
        assert!(domain.validate(&SpeechRequest::new("hi").with_rate(0.0)).is_err());
        assert!(domain.validate(&SpeechRequest::new("hi").with_rate(f32::NAN)).is_err());
        assert!(domain.validate(&SpeechRequest::new("hi").with_voice("")).is_err());
        assert!(
            domain
                .validate(&SpeechRequest::new("x".repeat(MAX_SPEECH_CHARS + 1)))
                .is_err()
        );
    }

    #[test]
    fn test_no_fallback() {
        assert!(SpeechDomain::new().fallback(&SpeechRequest::new("hello")).is_none());
    }

    #[test]
    fn test_request_defaults() {
        let request: SpeechRequest = serde_json::from_str(r#"{"text":"hello"}"#).unwrap();
        assert_eq!(request.voice, "alloy");
        assert_eq!(request.rate, 1.0);
    }

    #[tokio::test]
    async fn test_generator_stores_audio() {
        let provider = Arc::new(MockSpeechProvider::returning(b"ID3audio"));
        let objects = Arc::new(InMemoryObjectStore::new());
        let generator = SpeechGenerator::new(provider.clone(), objects.clone())
            .with_retry(RetryPolicy::none());

        let request = SpeechRequest::new("hello").with_rate(0.85);
        let payload = generator.generate("abc123", &request).await.unwrap();

        assert_eq!(payload.object_path, "speech/abc123.mp3");
        assert_eq!(payload.size_bytes, 8);
        assert_eq!(payload.rate, 0.85);
        assert_eq!(provider.calls(), 1);

        let stored = objects.get_object("speech/abc123.mp3").await.unwrap().unwrap();
        assert_eq!(stored.content_type, "audio/mpeg");
        assert_eq!(&stored.bytes[..], b"ID3audio");
    }

    #[tokio::test]
    async fn test_generator_rejects_empty_audio() {
        let provider = Arc::new(MockSpeechProvider::returning(b""));
        let objects = Arc::new(InMemoryObjectStore::new());
        let generator = SpeechGenerator::new(provider, objects.clone()).with_retry(RetryPolicy::none());

        let err = generator
            .generate("abc", &SpeechRequest::new("hello"))
            .await
            .unwrap_err();

        assert!(matches!(err, GenerationError::Malformed { .. }));
        assert!(objects.get_object("speech/abc.mp3").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_object_store_failure_is_transport_error() {
        let mut objects = MockObjectStore::new();
        objects
            .expect_put_object()
            .withf(|path, _, content_type| path == "speech/k1.mp3" && content_type == "audio/mpeg")
            .times(1)
            .returning(|_, _, _| Err(DomainError::storage("disk full")));

        let generator = SpeechGenerator::new(
            Arc::new(MockSpeechProvider::returning(b"ID3audio")),
            Arc::new(objects),
        )
        .with_retry(RetryPolicy::none());

        let err = generator
            .generate("k1", &SpeechRequest::new("hello"))
            .await
            .unwrap_err();

        assert!(matches!(err, GenerationError::Transport { ref provider, .. } if provider == "object_store"));
        assert!(err.is_retryable());
    }
}
