//! Multi-pass text generation with a word-count quality gate

use std::sync::Arc;

use tracing::{debug, warn};

use super::error::GenerationError;
use super::retry::RetryPolicy;
use crate::domain::provider::{TextProvider, TextRequest};
use crate::domain::text::word_count;

/// Minimum word count a summary must reach before it is accepted
pub const DEFAULT_MIN_SUMMARY_WORDS: usize = 130;

/// Result of a multi-pass run
#[derive(Debug, Clone, PartialEq)]
pub struct PassOutcome {
    pub text: String,
    pub word_count: usize,
    /// Passes issued, primary included
    pub passes: u8,
    /// True when the extension pass replaced the primary text
    pub extended: bool,
}

/// Primary pass, then at most one extension pass when the primary result
/// falls short of the word threshold. The extension is accepted only if it
/// clears the threshold; otherwise the primary result is kept.
#[derive(Debug, Clone)]
pub struct TextPipeline {
    provider: Arc<dyn TextProvider>,
    retry: RetryPolicy,
    min_words: usize,
}

impl TextPipeline {
    pub fn new(provider: Arc<dyn TextProvider>) -> Self {
        Self {
            provider,
            retry: RetryPolicy::default(),
            min_words: DEFAULT_MIN_SUMMARY_WORDS,
        }
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_min_words(mut self, min_words: usize) -> Self {
        self.min_words = min_words;
        self
    }

    pub fn min_words(&self) -> usize {
        self.min_words
    }

    /// Single completion with retries applied
    pub async fn complete(&self, request: TextRequest) -> Result<String, GenerationError> {
        let text = self
            .retry
            .run("generate_text", || self.provider.generate_text(request.clone()))
            .await?;

        let text = text.trim().to_string();
        if text.is_empty() {
            return Err(GenerationError::malformed("provider returned an empty completion"));
        }

        Ok(text)
    }

    /// Runs the primary request and, if needed, the extension built from the
    /// primary text. A failed primary pass is returned as an error; a failed
    /// extension pass keeps the primary text.
    pub async fn run<F>(&self, primary: TextRequest, extension: F) -> Result<PassOutcome, GenerationError>
    where
        F: FnOnce(&str) -> TextRequest,
    {
        let text = self.complete(primary).await?;
        let words = word_count(&text);

        if words >= self.min_words {
            return Ok(PassOutcome {
                text,
                word_count: words,
                passes: 1,
                extended: false,
            });
        }

        debug!(
            words,
            min_words = self.min_words,
            "Primary pass below quality threshold, issuing extension pass"
        );

        let outcome = match self.complete(extension(&text)).await {
            Ok(extended) => {
                let extended_words = word_count(&extended);
                if extended_words >= self.min_words {
                    PassOutcome {
                        text: extended,
                        word_count: extended_words,
                        passes: 2,
                        extended: true,
                    }
                } else {
                    debug!(
                        extended_words,
                        "Extension pass still below threshold, keeping primary result"
                    );
                    PassOutcome {
                        text,
                        word_count: words,
                        passes: 2,
                        extended: false,
                    }
                }
            }
            Err(err) => {
                warn!(error = %err, "Extension pass failed, keeping primary result");
                PassOutcome {
                    text,
                    word_count: words,
                    passes: 2,
                    extended: false,
                }
            }
        };

        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::provider::mock::ScriptedTextProvider;

    fn words(n: usize) -> String {
        vec!["lorem"; n].join(" ")
    }

    fn pipeline(provider: Arc<ScriptedTextProvider>) -> TextPipeline {
        TextPipeline::new(provider)
            .with_retry(RetryPolicy::none())
            .with_min_words(130)
    }

    fn extend(previous: &str) -> TextRequest {
        TextRequest::new(format!("Extend: {}", previous), 400)
    }

    #[tokio::test]
    async fn test_accepts_primary_above_threshold() {
        let provider = Arc::new(ScriptedTextProvider::new().then_ok(words(150)));
        let outcome = pipeline(provider.clone())
            .run(TextRequest::new("Summarize", 300), extend)
            .await
            .unwrap();

        assert_eq!(outcome.passes, 1);
        assert_eq!(outcome.word_count, 150);
        assert!(!outcome.extended);
        assert_eq!(provider.calls(), 1);
    }

    #[tokio::test]
    async fn test_exactly_one_extension_pass_accepted() {
        let provider = Arc::new(
            ScriptedTextProvider::new()
                .then_ok(words(100))
                .then_ok(words(140)),
        );
        let outcome = pipeline(provider.clone())
            .run(TextRequest::new("Summarize", 300), extend)
            .await
            .unwrap();

        assert_eq!(provider.calls(), 2);
        assert_eq!(outcome.passes, 2);
        assert!(outcome.extended);
        assert_eq!(outcome.word_count, 140);

        let requests = provider.requests();
        assert!(requests[1].prompt.starts_with("Extend: lorem"));
    }

    #[tokio::test]
    async fn test_short_extension_keeps_primary() {
        let provider = Arc::new(
            ScriptedTextProvider::new()
                .then_ok(words(100))
                .then_ok(words(120))
                .then_ok(words(500)),
        );
        let outcome = pipeline(provider.clone())
            .run(TextRequest::new("Summarize", 300), extend)
            .await
            .unwrap();

        assert_eq!(provider.calls(), 2);
        assert_eq!(outcome.word_count, 100);
        assert!(!outcome.extended);
    }

    #[tokio::test]
    async fn test_failed_extension_keeps_primary() {
        let provider = Arc::new(
            ScriptedTextProvider::new()
                .then_ok(words(90))
                .then_err(GenerationError::status("openai", 500, "boom")),
        );
        let outcome = pipeline(provider.clone())
            .run(TextRequest::new("Summarize", 300), extend)
            .await
            .unwrap();

        assert_eq!(provider.calls(), 2);
        assert_eq!(outcome.word_count, 90);
    }

    #[tokio::test]
    async fn test_failed_primary_is_an_error() {
        let provider = Arc::new(
            ScriptedTextProvider::new().then_err(GenerationError::timeout("openai", "30s")),
        );
        let result = pipeline(provider.clone())
            .run(TextRequest::new("Summarize", 300), extend)
            .await;

        assert!(matches!(result, Err(GenerationError::Timeout { .. })));
        assert_eq!(provider.calls(), 1);
    }

    #[tokio::test]
    async fn test_blank_completion_is_malformed() {
        let provider = Arc::new(ScriptedTextProvider::new().then_ok("   \n"));
        let result = pipeline(provider).complete(TextRequest::new("x", 10)).await;

        assert!(matches!(result, Err(GenerationError::Malformed { .. })));
    }
}
