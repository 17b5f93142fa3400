//! Generation error taxonomy

use std::fmt;

use thiserror::Error;

use crate::domain::DomainError;

/// Errors raised while producing content from external providers
#[derive(Debug, Clone, Error)]
pub enum GenerationError {
    #[error("{provider} transport failure: {message}")]
    Transport { provider: String, message: String },

    #[error("{provider} timed out: {message}")]
    Timeout { provider: String, message: String },

    #[error("{provider} returned HTTP {status}: {message}")]
    Status {
        provider: String,
        status: u16,
        message: String,
    },

    #[error("malformed provider response: {message}")]
    Malformed { message: String },

    #[error("input not suitable for generation: {message}")]
    InsufficientInput { message: String },

    #[error("provider not configured: {message}")]
    Configuration { message: String },
}

/// Stable classification used in logs, metrics and response notes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GenerationErrorKind {
    Transport,
    Timeout,
    Status,
    Malformed,
    InsufficientInput,
    Configuration,
}

impl GenerationErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Transport => "transport",
            Self::Timeout => "timeout",
            Self::Status => "status",
            Self::Malformed => "malformed",
            Self::InsufficientInput => "insufficient_input",
            Self::Configuration => "configuration",
        }
    }
}

impl fmt::Display for GenerationErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl GenerationError {
    pub fn transport(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Transport {
            provider: provider.into(),
            message: message.into(),
        }
    }

    pub fn timeout(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Timeout {
            provider: provider.into(),
            message: message.into(),
        }
    }

    pub fn status(provider: impl Into<String>, status: u16, message: impl Into<String>) -> Self {
        Self::Status {
            provider: provider.into(),
            status,
            message: message.into(),
        }
    }

    pub fn malformed(message: impl Into<String>) -> Self {
        Self::Malformed {
            message: message.into(),
        }
    }

    pub fn insufficient_input(message: impl Into<String>) -> Self {
        Self::InsufficientInput {
            message: message.into(),
        }
    }

    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    pub fn kind(&self) -> GenerationErrorKind {
        match self {
            Self::Transport { .. } => GenerationErrorKind::Transport,
            Self::Timeout { .. } => GenerationErrorKind::Timeout,
            Self::Status { .. } => GenerationErrorKind::Status,
            Self::Malformed { .. } => GenerationErrorKind::Malformed,
            Self::InsufficientInput { .. } => GenerationErrorKind::InsufficientInput,
            Self::Configuration { .. } => GenerationErrorKind::Configuration,
        }
    }

    /// Missing credentials have no safe fallback
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Configuration { .. })
    }

    /// Transient failures worth another attempt
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Transport { .. } | Self::Timeout { .. } => true,
            Self::Status { status, .. } => *status == 429 || *status >= 500,
            _ => false,
        }
    }

    /// Short note surfaced to callers as `generation_note`
    pub fn note(&self) -> String {
        format!("{}: {}", self.kind(), self)
    }
}

impl From<GenerationError> for DomainError {
    fn from(err: GenerationError) -> Self {
        match &err {
            GenerationError::Configuration { message } => DomainError::configuration(message),
            GenerationError::Transport { provider, .. }
            | GenerationError::Timeout { provider, .. }
            | GenerationError::Status { provider, .. } => {
                DomainError::provider(provider.clone(), err.to_string())
            }
            GenerationError::Malformed { .. } | GenerationError::InsufficientInput { .. } => {
                DomainError::provider("generator", err.to_string())
            }
        }
    }
}
