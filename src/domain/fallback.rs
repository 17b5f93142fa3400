//! Fallback synthesis - dependency-free vocabulary from raw text

use std::collections::HashSet;

use crate::domain::generation::VocabularyTerm;
use crate::domain::text::{is_stopword, plain_text, words};

/// Term returned when no token qualifies
pub const PLACEHOLDER_TERM: &str = "vocabulary";
pub const PLACEHOLDER_DEFINITION: &str = "No distinctive terms could be extracted from this text.";

/// Minimum characters for a token to qualify
pub const DEFAULT_MIN_TOKEN_CHARS: usize = 4;

/// Produces an always-available, low-quality vocabulary list.
///
/// Total: for any input, including an empty one, the result holds at least
/// one term. No I/O is performed.
#[derive(Debug, Clone)]
pub struct FallbackSynthesizer {
    min_token_chars: usize,
}

impl Default for FallbackSynthesizer {
    fn default() -> Self {
        Self {
            min_token_chars: DEFAULT_MIN_TOKEN_CHARS,
        }
    }
}

impl FallbackSynthesizer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_min_token_chars(mut self, min: usize) -> Self {
        self.min_token_chars = min;
        self
    }

    /// First `max_terms` qualifying tokens in first-seen order
    pub fn synthesize(&self, raw: &str, max_terms: usize) -> Vec<VocabularyTerm> {
        let text = plain_text(raw);
        let mut seen = HashSet::new();

        let terms: Vec<VocabularyTerm> = words(&text)
            .map(str::to_lowercase)
            .filter(|token| self.qualifies(token))
            .filter(|token| seen.insert(token.clone()))
            .take(max_terms.max(1))
            .map(VocabularyTerm::bare)
            .collect();

        if terms.is_empty() {
            return vec![Self::placeholder()];
        }

        terms
    }

    pub fn placeholder() -> VocabularyTerm {
        VocabularyTerm::new(PLACEHOLDER_TERM, PLACEHOLDER_DEFINITION)
    }

    fn qualifies(&self, token: &str) -> bool {
        token.chars().count() >= self.min_token_chars
            && token.chars().any(char::is_alphabetic)
            && !is_stopword(token)
    }
}
