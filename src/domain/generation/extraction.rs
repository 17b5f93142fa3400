//! Vocabulary extraction through a text provider

use std::sync::Arc;

use super::error::GenerationError;
use super::retry::RetryPolicy;
use super::vocabulary::{parse_vocabulary, VocabularyTerm, MIN_TERM_CHARS};
use crate::domain::provider::{TextProvider, TextRequest};
use crate::domain::text::truncate_chars;

/// Longest source text sent to the extractor
pub const MAX_EXTRACTION_INPUT_CHARS: usize = 6000;

const EXTRACTION_SYSTEM_PROMPT: &str = "You select vocabulary for language learners. \
Respond with a JSON array only, no prose and no markdown.";

/// Asks the provider for a term list and validates it strictly
#[derive(Debug, Clone)]
pub struct VocabularyExtractor {
    provider: Arc<dyn TextProvider>,
    retry: RetryPolicy,
    max_tokens: u32,
}

impl VocabularyExtractor {
    pub fn new(provider: Arc<dyn TextProvider>) -> Self {
        Self {
            provider,
            retry: RetryPolicy::default(),
            max_tokens: 600,
        }
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    pub fn build_request(&self, text: &str, limit: usize) -> TextRequest {
        let prompt = format!(
            "Pick up to {limit} words from the text below that a learner is least likely to know. \
Each term must have at least {MIN_TERM_CHARS} letters, appear in the text, and be unique. \
Return a JSON array of objects with exactly two string fields, \"term\" and \"definition\". \
Definitions are one plain sentence.\n\nText:\n{}",
            truncate_chars(text, MAX_EXTRACTION_INPUT_CHARS)
        );

        TextRequest::new(prompt, self.max_tokens)
            .with_system(EXTRACTION_SYSTEM_PROMPT)
            .with_temperature(0.2)
    }

    pub async fn extract(&self, text: &str, limit: usize) -> Result<Vec<VocabularyTerm>, GenerationError> {
        let request = self.build_request(text, limit);

        let raw = self
            .retry
            .run("extract_vocabulary", || self.provider.generate_text(request.clone()))
            .await?;

        parse_vocabulary(&raw, limit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::generation::GenerationErrorKind;
    use crate::domain::provider::mock::ScriptedTextProvider;

    #[tokio::test]
    async fn test_extracts_valid_terms() {
        let provider = Arc::new(ScriptedTextProvider::new().then_ok(
            r#"[{"term":"glacier","definition":"A slowly moving mass of ice."},
                {"term":"moraine","definition":"Debris deposited by a glacier."}]"#,
        ));
        let extractor = VocabularyExtractor::new(provider.clone()).with_retry(RetryPolicy::none());

        let terms = extractor.extract("glacier moraine text", 8).await.unwrap();

        assert_eq!(terms.len(), 2);
        assert_eq!(terms[0].term, "glacier");
        assert!(provider.requests()[0].prompt.contains("up to 8 words"));
    }

    #[tokio::test]
    async fn test_rejects_malformed_batch() {
        let provider = Arc::new(ScriptedTextProvider::new().then_ok("Here are some words: glacier"));
        let extractor = VocabularyExtractor::new(provider).with_retry(RetryPolicy::none());

        let err = extractor.extract("glacier", 8).await.unwrap_err();
        assert_eq!(err.kind(), GenerationErrorKind::Malformed);
    }

    #[test]
    fn test_request_truncates_long_input() {
        let provider = Arc::new(ScriptedTextProvider::new());
        let extractor = VocabularyExtractor::new(provider);
        let text = "a".repeat(MAX_EXTRACTION_INPUT_CHARS * 2);

        let request = extractor.build_request(&text, 5);
        assert!(request.prompt.len() < MAX_EXTRACTION_INPUT_CHARS + 1000);
        assert!(request.system.is_some());
    }
}
