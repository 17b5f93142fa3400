//! External capabilities consumed by generators

use std::fmt::Debug;

use async_trait::async_trait;
use bytes::Bytes;

use crate::domain::generation::GenerationError;
use crate::domain::DomainError;

#[cfg(test)]
use mockall::automock;

/// A single text completion request
#[derive(Debug, Clone, PartialEq)]
pub struct TextRequest {
    pub system: Option<String>,
    pub prompt: String,
    pub max_tokens: u32,
    pub temperature: Option<f32>,
}

impl TextRequest {
    pub fn new(prompt: impl Into<String>, max_tokens: u32) -> Self {
        Self {
            system: None,
            prompt: prompt.into(),
            max_tokens,
            temperature: None,
        }
    }

    pub fn with_system(mut self, system: impl Into<String>) -> Self {
        self.system = Some(system.into());
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }
}

/// `generateText(prompt) -> text`
#[async_trait]
pub trait TextProvider: Send + Sync + Debug {
    async fn generate_text(&self, request: TextRequest) -> Result<String, GenerationError>;
}

/// `generateSpeech(text, voice, rate) -> bytes`
#[async_trait]
pub trait SpeechProvider: Send + Sync + Debug {
    async fn generate_speech(
        &self,
        text: &str,
        voice: &str,
        rate: f32,
    ) -> Result<Bytes, GenerationError>;
}

/// `generateImage(prompt) -> url`
#[async_trait]
pub trait ImageProvider: Send + Sync + Debug {
    async fn generate_image(&self, prompt: &str) -> Result<String, GenerationError>;
}

/// A stored binary object
#[derive(Debug, Clone, PartialEq)]
pub struct StoredObject {
    pub bytes: Bytes,
    pub content_type: String,
}

/// Binary object storage addressed by relative paths
#[cfg_attr(test, automock)]
#[async_trait]
pub trait ObjectStore: Send + Sync + Debug {
    /// Stores `bytes` at `path`, replacing any existing object
    async fn put_object(
        &self,
        path: &str,
        bytes: Bytes,
        content_type: &str,
    ) -> Result<(), DomainError>;

    async fn get_object(&self, path: &str) -> Result<Option<StoredObject>, DomainError>;
}

#[cfg(test)]
pub mod mock {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    /// Text provider that replays scripted results and records requests
    #[derive(Debug, Default)]
    pub struct ScriptedTextProvider {
        responses: Mutex<VecDeque<Result<String, GenerationError>>>,
        requests: Mutex<Vec<TextRequest>>,
    }

    impl ScriptedTextProvider {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn then_ok(self, text: impl Into<String>) -> Self {
            self.responses.lock().unwrap().push_back(Ok(text.into()));
            self
        }

        pub fn then_err(self, error: GenerationError) -> Self {
            self.responses.lock().unwrap().push_back(Err(error));
            self
        }

        pub fn calls(&self) -> usize {
            self.requests.lock().unwrap().len()
        }

        pub fn requests(&self) -> Vec<TextRequest> {
            self.requests.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl TextProvider for ScriptedTextProvider {
        async fn generate_text(&self, request: TextRequest) -> Result<String, GenerationError> {
            self.requests.lock().unwrap().push(request);
            self.responses
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(GenerationError::transport("mock", "no scripted response")))
        }
    }

    /// Speech provider returning fixed bytes or a fixed error
    #[derive(Debug)]
    pub struct MockSpeechProvider {
        result: Result<Bytes, GenerationError>,
        calls: Mutex<Vec<(String, String, f32)>>,
    }

    impl MockSpeechProvider {
        pub fn returning(bytes: &'static [u8]) -> Self {
            Self {
                result: Ok(Bytes::from_static(bytes)),
                calls: Mutex::new(Vec::new()),
            }
        }

        pub fn failing(error: GenerationError) -> Self {
            Self {
                result: Err(error),
                calls: Mutex::new(Vec::new()),
            }
        }

        pub fn calls(&self) -> usize {
            self.calls.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl SpeechProvider for MockSpeechProvider {
        async fn generate_speech(
            &self,
            text: &str,
            voice: &str,
            rate: f32,
        ) -> Result<Bytes, GenerationError> {
            self.calls
                .lock()
                .unwrap()
                .push((text.to_string(), voice.to_string(), rate));
            self.result.clone()
        }
    }

    /// Image provider returning a fixed URL or a fixed error
    #[derive(Debug)]
    pub struct MockImageProvider {
        result: Result<String, GenerationError>,
        prompts: Mutex<Vec<String>>,
    }

    impl MockImageProvider {
        pub fn returning(url: impl Into<String>) -> Self {
            Self {
                result: Ok(url.into()),
                prompts: Mutex::new(Vec::new()),
            }
        }

        pub fn failing(error: GenerationError) -> Self {
            Self {
                result: Err(error),
                prompts: Mutex::new(Vec::new()),
            }
        }

        pub fn prompts(&self) -> Vec<String> {
            self.prompts.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl ImageProvider for MockImageProvider {
        async fn generate_image(&self, prompt: &str) -> Result<String, GenerationError> {
            self.prompts.lock().unwrap().push(prompt.to_string());
            self.result.clone()
        }
    }
}
