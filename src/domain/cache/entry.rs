//! Cache entry model

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::DomainError;

/// How the payload served to a caller was produced
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GenerationStatus {
    /// Produced by an external provider on this request
    AiGenerated,
    /// Produced by the fallback synthesizer after a provider failure
    FallbackSource,
    /// Served from a readable cache entry
    CacheHit,
}

impl GenerationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AiGenerated => "ai_generated",
            Self::FallbackSource => "fallback_source",
            Self::CacheHit => "cache_hit",
        }
    }
}

impl fmt::Display for GenerationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for GenerationStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ai_generated" => Ok(Self::AiGenerated),
            "fallback_source" => Ok(Self::FallbackSource),
            "cache_hit" => Ok(Self::CacheHit),
            other => Err(DomainError::cache(format!(
                "Unknown generation status: {}",
                other
            ))),
        }
    }
}

/// A persisted generation result keyed by its content hash
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry {
    pub key: String,
    /// Raw input the entry was generated from; never used for lookups
    pub source_identifier: String,
    pub payload: serde_json::Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    pub generation_status: GenerationStatus,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl CacheEntry {
    /// Creates an entry stamped with the current time
    pub fn new(
        key: impl Into<String>,
        source_identifier: impl Into<String>,
        payload: serde_json::Value,
        generation_status: GenerationStatus,
        ttl: Duration,
    ) -> Self {
        Self::created_at(
            key,
            source_identifier,
            payload,
            generation_status,
            Utc::now(),
            ttl,
        )
    }

    /// Creates an entry with an explicit creation time.
    ///
    /// `expires_at` is always strictly after `created_at`, even for a zero TTL.
    pub fn created_at(
        key: impl Into<String>,
        source_identifier: impl Into<String>,
        payload: serde_json::Value,
        generation_status: GenerationStatus,
        created_at: DateTime<Utc>,
        ttl: Duration,
    ) -> Self {
        let ttl = chrono::Duration::from_std(ttl)
            .unwrap_or(chrono::Duration::MAX)
            .max(chrono::Duration::milliseconds(1));

        let expires_at = created_at
            .checked_add_signed(ttl)
            .unwrap_or(DateTime::<Utc>::MAX_UTC);

        Self {
            key: key.into(),
            source_identifier: source_identifier.into(),
            payload,
            category: None,
            generation_status,
            created_at,
            expires_at,
        }
    }

    pub fn with_category(mut self, category: Option<String>) -> Self {
        self.category = category;
        self
    }

    /// An entry is readable strictly before its expiry instant
    pub fn is_readable_at(&self, now: DateTime<Utc>) -> bool {
        now < self.expires_at
    }

    pub fn is_readable(&self) -> bool {
        self.is_readable_at(Utc::now())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_expires_after_created() {
        let entry = CacheEntry::new(
            "k",
            "raw",
            json!({}),
            GenerationStatus::AiGenerated,
            Duration::from_secs(86_400),
        );

        assert!(entry.expires_at > entry.created_at);
        assert_eq!(
            (entry.expires_at - entry.created_at).num_seconds(),
            86_400
        );
    }

    #[test]
    fn test_zero_ttl_still_expires_after_creation() {
        let entry = CacheEntry::new(
            "k",
            "raw",
            json!({}),
            GenerationStatus::AiGenerated,
            Duration::ZERO,
        );

        assert!(entry.expires_at > entry.created_at);
    }

    #[test]
    fn test_readability_boundary() {
        let created = Utc::now() - chrono::Duration::hours(2);
        let entry = CacheEntry::created_at(
            "k",
            "raw",
            json!({}),
            GenerationStatus::FallbackSource,
            created,
            Duration::from_secs(3600),
        );

        assert!(!entry.is_readable());
        assert!(entry.is_readable_at(created));
        assert!(!entry.is_readable_at(entry.expires_at));
    }

    #[test]
    fn test_status_round_trip_through_str() {
        for status in [
            GenerationStatus::AiGenerated,
            GenerationStatus::FallbackSource,
            GenerationStatus::CacheHit,
        ] {
            assert_eq!(status.as_str().parse::<GenerationStatus>().unwrap(), status);
        }

        assert!("stale".parse::<GenerationStatus>().is_err());
    }

    #[test]
    fn test_status_serialization() {
        assert_eq!(
            serde_json::to_string(&GenerationStatus::FallbackSource).unwrap(),
            "\"fallback_source\""
        );
    }
}
