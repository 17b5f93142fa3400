//! Content provider implementations

pub mod http_client;
mod openai;

pub use http_client::{HttpClient, HttpClientTrait};
pub use openai::{
    OpenAiModels, OpenAiProvider, UnconfiguredProvider, DEFAULT_OPENAI_BASE_URL,
    DEFAULT_IMAGE_MODEL, DEFAULT_SPEECH_MODEL, DEFAULT_TEXT_MODEL,
};
