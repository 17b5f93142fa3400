//! Strict parsing and validation of provider vocabulary responses

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use super::error::GenerationError;
use crate::domain::text::is_stopword;

/// Minimum number of characters in an accepted term
pub const MIN_TERM_CHARS: usize = 4;

/// Accepted definition length bounds, in characters
pub const MIN_DEFINITION_CHARS: usize = 8;
pub const MAX_DEFINITION_CHARS: usize = 240;

/// A vocabulary term with an optional definition
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VocabularyTerm {
    pub term: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub definition: Option<String>,
}

impl VocabularyTerm {
    pub fn new(term: impl Into<String>, definition: impl Into<String>) -> Self {
        Self {
            term: term.into(),
            definition: Some(definition.into()),
        }
    }

    pub fn bare(term: impl Into<String>) -> Self {
        Self {
            term: term.into(),
            definition: None,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawTerm {
    term: String,
    definition: String,
}

/// Parses a provider response as a JSON array of `{term, definition}`.
///
/// The whole batch is rejected if the document does not parse or any item
/// fails validation. At most `limit` validated terms are returned.
pub fn parse_vocabulary(raw: &str, limit: usize) -> Result<Vec<VocabularyTerm>, GenerationError> {
    let body = strip_code_fence(raw);

    let items: Vec<RawTerm> = serde_json::from_str(body)
        .map_err(|e| GenerationError::malformed(format!("vocabulary is not a term array: {}", e)))?;

    if items.is_empty() {
        return Err(GenerationError::malformed("vocabulary array is empty"));
    }

    let mut seen = HashSet::new();
    let mut terms = Vec::with_capacity(items.len());

    for (index, item) in items.into_iter().enumerate() {
        let term = item.term.trim().to_lowercase();
        let definition = item.definition.trim().to_string();

        validate_term(&term).map_err(|reason| {
            GenerationError::malformed(format!("item {}: {}", index, reason))
        })?;
        validate_definition(&definition).map_err(|reason| {
            GenerationError::malformed(format!("item {}: {}", index, reason))
        })?;

        if !seen.insert(term.clone()) {
            return Err(GenerationError::malformed(format!(
                "item {}: duplicate term '{}'",
                index, term
            )));
        }

        terms.push(VocabularyTerm::new(term, definition));
    }

    terms.truncate(limit.max(1));
    Ok(terms)
}

fn validate_term(term: &str) -> Result<(), String> {
    if term.chars().count() < MIN_TERM_CHARS {
        return Err(format!("term '{}' is shorter than {} characters", term, MIN_TERM_CHARS));
    }

    if !term
        .chars()
        .all(|c| c.is_alphabetic() || c == '-' || c == '\'')
    {
        return Err(format!("term '{}' contains non-letter characters", term));
    }

    if is_stopword(term) {
        return Err(format!("term '{}' is a stopword", term));
    }

    Ok(())
}

fn validate_definition(definition: &str) -> Result<(), String> {
    let len = definition.chars().count();

    if !(MIN_DEFINITION_CHARS..=MAX_DEFINITION_CHARS).contains(&len) {
        return Err(format!(
            "definition length {} outside {}..={}",
            len, MIN_DEFINITION_CHARS, MAX_DEFINITION_CHARS
        ));
    }

    Ok(())
}

/// Removes a surrounding Markdown code fence; nothing else is coerced
fn strip_code_fence(raw: &str) -> &str {
    let trimmed = raw.trim();

    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };

    let Some(body) = rest.strip_suffix("```") else {
        return trimmed;
    };

    let body = body.strip_prefix("json").unwrap_or(body);
    body.trim()
}
