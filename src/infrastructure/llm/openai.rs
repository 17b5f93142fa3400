use async_trait::async_trait;
use bytes::Bytes;
use serde::Deserialize;

use super::http_client::HttpClientTrait;
use crate::domain::generation::GenerationError;
use crate::domain::provider::{ImageProvider, SpeechProvider, TextProvider, TextRequest};

pub const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com";
pub const DEFAULT_TEXT_MODEL: &str = "gpt-4o-mini";
pub const DEFAULT_SPEECH_MODEL: &str = "tts-1";
pub const DEFAULT_IMAGE_MODEL: &str = "dall-e-3";
pub const DEFAULT_IMAGE_SIZE: &str = "1024x1024";

const PROVIDER: &str = "openai";

/// Model selection for each capability
#[derive(Debug, Clone, PartialEq)]
pub struct OpenAiModels {
    pub text: String,
    pub speech: String,
    pub image: String,
    pub image_size: String,
}

impl Default for OpenAiModels {
    fn default() -> Self {
        Self {
            text: DEFAULT_TEXT_MODEL.to_string(),
            speech: DEFAULT_SPEECH_MODEL.to_string(),
            image: DEFAULT_IMAGE_MODEL.to_string(),
            image_size: DEFAULT_IMAGE_SIZE.to_string(),
        }
    }
}

/// OpenAI-compatible provider for text completions, speech and images
#[derive(Debug)]
pub struct OpenAiProvider<C: HttpClientTrait> {
    client: C,
    auth_header: String,
    base_url: String,
    models: OpenAiModels,
}

impl<C: HttpClientTrait> OpenAiProvider<C> {
    pub fn new(client: C, api_key: impl Into<String>) -> Self {
        Self::with_base_url(client, api_key, DEFAULT_OPENAI_BASE_URL)
    }

    pub fn with_base_url(
        client: C,
        api_key: impl Into<String>,
        base_url: impl Into<String>,
    ) -> Self {
        let auth_header = format!("Bearer {}", api_key.into());
        let base_url = base_url.into().trim_end_matches('/').to_string();

        Self {
            client,
            auth_header,
            base_url,
            models: OpenAiModels::default(),
        }
    }

    pub fn with_models(mut self, models: OpenAiModels) -> Self {
        self.models = models;
        self
    }

    fn url(&self, endpoint: &str) -> String {
        format!("{}/v1/{}", self.base_url, endpoint)
    }

    fn headers(&self) -> Vec<(&str, &str)> {
        vec![
            ("Authorization", self.auth_header.as_str()),
            ("Content-Type", "application/json"),
        ]
    }

    fn build_chat_request(&self, request: &TextRequest) -> serde_json::Value {
        let mut messages = Vec::new();

        if let Some(system) = &request.system {
            messages.push(serde_json::json!({ "role": "system", "content": system }));
        }
        messages.push(serde_json::json!({ "role": "user", "content": request.prompt }));

        let mut body = serde_json::json!({
            "model": self.models.text,
            "messages": messages,
            "max_tokens": request.max_tokens,
        });

        if let Some(temperature) = request.temperature {
            body["temperature"] = serde_json::json!(temperature);
        }

        body
    }
}

#[async_trait]
impl<C: HttpClientTrait> TextProvider for OpenAiProvider<C> {
    async fn generate_text(&self, request: TextRequest) -> Result<String, GenerationError> {
        let body = self.build_chat_request(&request);
        let json = self
            .client
            .post_json(&self.url("chat/completions"), self.headers(), &body)
            .await?;

        let response: ChatResponse = serde_json::from_value(json)
            .map_err(|e| GenerationError::malformed(format!("Failed to parse completion: {}", e)))?;

        response
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| GenerationError::malformed("completion has no content"))
    }
}

#[async_trait]
impl<C: HttpClientTrait> SpeechProvider for OpenAiProvider<C> {
    async fn generate_speech(
        &self,
        text: &str,
        voice: &str,
        rate: f32,
    ) -> Result<Bytes, GenerationError> {
        let body = serde_json::json!({
            "model": self.models.speech,
            "input": text,
            "voice": voice,
            "speed": rate,
            "response_format": "mp3",
        });

        self.client
            .post_for_bytes(&self.url("audio/speech"), self.headers(), &body)
            .await
    }
}

#[async_trait]
impl<C: HttpClientTrait> ImageProvider for OpenAiProvider<C> {
    async fn generate_image(&self, prompt: &str) -> Result<String, GenerationError> {
        let body = serde_json::json!({
            "model": self.models.image,
            "prompt": prompt,
            "n": 1,
            "size": self.models.image_size,
        });

        let json = self
            .client
            .post_json(&self.url("images/generations"), self.headers(), &body)
            .await?;

        let response: ImageResponse = serde_json::from_value(json)
            .map_err(|e| GenerationError::malformed(format!("Failed to parse image response: {}", e)))?;

        response
            .data
            .into_iter()
            .find_map(|image| image.url)
            .ok_or_else(|| GenerationError::malformed("image response has no url"))
    }
}

/// Placeholder used when no API key is configured; every call is a
/// configuration error.
#[derive(Debug, Clone, Default)]
pub struct UnconfiguredProvider;

impl UnconfiguredProvider {
    fn error() -> GenerationError {
        GenerationError::configuration(format!("{} API key is not set", PROVIDER))
    }
}

#[async_trait]
impl TextProvider for UnconfiguredProvider {
    async fn generate_text(&self, _request: TextRequest) -> Result<String, GenerationError> {
        Err(Self::error())
    }
}

#[async_trait]
impl SpeechProvider for UnconfiguredProvider {
    async fn generate_speech(&self, _: &str, _: &str, _: f32) -> Result<Bytes, GenerationError> {
        Err(Self::error())
    }
}

#[async_trait]
impl ImageProvider for UnconfiguredProvider {
    async fn generate_image(&self, _prompt: &str) -> Result<String, GenerationError> {
        Err(Self::error())
    }
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Debug, Deserialize)]
struct ChatMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ImageResponse {
    data: Vec<ImageData>,
}

#[derive(Debug, Deserialize)]
struct ImageData {
    url: Option<String>,
}
