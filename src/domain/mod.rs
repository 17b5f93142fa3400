//! Domain layer - Core business logic and entities

pub mod cache;
pub mod content;
pub mod error;
pub mod fallback;
pub mod generation;
pub mod provider;
pub mod text;

pub use cache::{
    CacheEntry, CacheKeyDeriver, CacheKeyParams, CacheStore, GenerationStatus, KeyKind, KeyLength,
};
pub use content::{ContentDomain, ContentOutcome};
pub use error::DomainError;
pub use fallback::FallbackSynthesizer;
pub use generation::{GenerationError, GenerationErrorKind, Generator, RetryPolicy, VocabularyTerm};
pub use provider::{
    ImageProvider, ObjectStore, SpeechProvider, StoredObject, TextProvider, TextRequest,
};
