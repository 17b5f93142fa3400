//! Response envelopes shared by the content endpoints

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::error::{ApiError, ApiErrorDetail};
use crate::domain::{ContentOutcome, DomainError, GenerationStatus};

/// Every content response: cache metadata plus the flattened payload
#[derive(Debug, Clone, Serialize)]
pub struct ContentResponse<P> {
    pub cache_key: String,
    pub cache_hit: bool,
    pub generation_status: GenerationStatus,
    /// How the payload was originally produced; differs from
    /// `generation_status` only on hits
    pub source_status: GenerationStatus,
    pub generated_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub generation_note: Option<String>,
    #[serde(flatten)]
    pub payload: P,
}

impl<P> ContentResponse<P> {
    /// Replaces the payload, keeping the metadata
    pub fn map<Q>(self, f: impl FnOnce(P) -> Q) -> ContentResponse<Q> {
        ContentResponse {
            cache_key: self.cache_key,
            cache_hit: self.cache_hit,
            generation_status: self.generation_status,
            source_status: self.source_status,
            generated_at: self.generated_at,
            expires_at: self.expires_at,
            generation_note: self.generation_note,
            payload: f(self.payload),
        }
    }
}

impl<P> From<ContentOutcome<P>> for ContentResponse<P> {
    fn from(outcome: ContentOutcome<P>) -> Self {
        Self {
            cache_hit: outcome.is_cache_hit(),
            cache_key: outcome.key,
            generation_status: outcome.status,
            source_status: outcome.source_status,
            generated_at: outcome.generated_at,
            expires_at: outcome.expires_at,
            generation_note: outcome.note,
            payload: outcome.payload,
        }
    }
}

/// Body fields shared by POST endpoints: the domain request plus `refresh`
#[derive(Debug, Clone, Deserialize)]
pub struct Refreshable<T> {
    #[serde(flatten)]
    pub request: T,
    #[serde(default)]
    pub refresh: bool,
}

/// `?refresh=true` on POST endpoints
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RefreshParams {
    #[serde(default)]
    pub refresh: bool,
}

/// One element of a batch: a response or the error that replaced it
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum BatchItem<P> {
    Ok(ContentResponse<P>),
    Err { status: u16, error: ApiErrorDetail },
}

#[derive(Debug, Serialize)]
pub struct BatchResponse<P> {
    pub results: Vec<BatchItem<P>>,
    pub generated: usize,
    pub cache_hits: usize,
    pub failed: usize,
}

impl<P> FromIterator<Result<ContentOutcome<P>, DomainError>> for BatchResponse<P> {
    fn from_iter<I>(iter: I) -> Self
    where
        I: IntoIterator<Item = Result<ContentOutcome<P>, DomainError>>,
    {
        let mut response = Self {
            results: Vec::new(),
            generated: 0,
            cache_hits: 0,
            failed: 0,
        };

        for result in iter {
            let item = match result {
                Ok(outcome) => {
                    if outcome.is_cache_hit() {
                        response.cache_hits += 1;
                    } else {
                        response.generated += 1;
                    }
                    BatchItem::Ok(outcome.into())
                }
                Err(e) => {
                    response.failed += 1;
                    let err = ApiError::from(e);
                    BatchItem::Err {
                        status: err.status.as_u16(),
                        error: err.response.error,
                    }
                }
            };

            response.results.push(item);
        }

        response
    }
}
