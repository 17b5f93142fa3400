use thiserror::Error;

/// Errors crossing the domain boundary.
///
/// Generation problems that a fallback can absorb never reach this type;
/// only the ones a caller has to see do.
#[derive(Debug, Error)]
pub enum DomainError {
    /// Request shape problem; `field` names the offending input when known
    #[error("Validation error: {message}")]
    Validation {
        field: Option<&'static str>,
        message: String,
    },

    #[error("Not found: {message}")]
    NotFound { message: String },

    /// Generation failed and no fallback was available
    #[error("Provider error: {provider} - {message}")]
    Provider { provider: String, message: String },

    /// Missing key, secret or backend setting; never recovered locally
    #[error("Configuration error: {message}")]
    Configuration { message: String },

    #[error("Cache error: {message}")]
    Cache { message: String },

    #[error("Storage error: {message}")]
    Storage { message: String },

    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl DomainError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            field: None,
            message: message.into(),
        }
    }

    /// Validation failure tied to one request field
    pub fn invalid_field(field: &'static str, message: impl Into<String>) -> Self {
        Self::Validation {
            field: Some(field),
            message: message.into(),
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound {
            message: message.into(),
        }
    }

    pub fn provider(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Provider {
            provider: provider.into(),
            message: message.into(),
        }
    }

    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    pub fn cache(message: impl Into<String>) -> Self {
        Self::Cache {
            message: message.into(),
        }
    }

    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage {
            message: message.into(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Stable snake_case code for response bodies and log fields
    pub fn code(&self) -> &'static str {
        match self {
            Self::Validation { .. } => "invalid_request",
            Self::NotFound { .. } => "not_found",
            Self::Provider { .. } => "generation_failed",
            Self::Configuration { .. } => "configuration_error",
            Self::Cache { .. } => "cache_error",
            Self::Storage { .. } => "storage_error",
            Self::Internal { .. } => "internal_error",
        }
    }

    /// True when the caller sent something wrong, as opposed to a server fault
    pub fn is_client_error(&self) -> bool {
        matches!(self, Self::Validation { .. } | Self::NotFound { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_error_carries_field() {
        let error = DomainError::invalid_field("rate", "rate must be between 0.25 and 4");

        assert_eq!(error.to_string(), "Validation error: rate must be between 0.25 and 4");
        assert!(matches!(
            error,
            DomainError::Validation {
                field: Some("rate"),
                ..
            }
        ));
        assert!(error.is_client_error());
    }

    #[test]
    fn test_codes_are_stable() {
        assert_eq!(DomainError::validation("x").code(), "invalid_request");
        assert_eq!(DomainError::provider("openai", "x").code(), "generation_failed");
        assert_eq!(DomainError::configuration("x").code(), "configuration_error");
        assert!(!DomainError::storage("disk full").is_client_error());
    }

    #[test]
    fn test_provider_error_display() {
        let error = DomainError::provider("openai", "HTTP 500");
        assert_eq!(error.to_string(), "Provider error: openai - HTTP 500");
    }
}
