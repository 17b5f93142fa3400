//! Content generation - providers, passes, retries and strict parsing

mod error;
mod extraction;
mod pipeline;
mod retry;
mod vocabulary;

use std::fmt::Debug;

use async_trait::async_trait;

pub use error::{GenerationError, GenerationErrorKind};
pub use extraction::{VocabularyExtractor, MAX_EXTRACTION_INPUT_CHARS};
pub use pipeline::{PassOutcome, TextPipeline, DEFAULT_MIN_SUMMARY_WORDS};
pub use retry::RetryPolicy;
pub use vocabulary::{
    parse_vocabulary, VocabularyTerm, MAX_DEFINITION_CHARS, MIN_DEFINITION_CHARS, MIN_TERM_CHARS,
};

/// High-quality, possibly failing producer of a payload.
///
/// `key` is the derived cache key, available for naming side artifacts
/// such as stored audio objects.
#[async_trait]
pub trait Generator: Send + Sync + Debug {
    type Input: Send + Sync;
    type Output: Send;

    async fn generate(&self, key: &str, input: &Self::Input) -> Result<Self::Output, GenerationError>;
}
