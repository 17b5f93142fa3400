//! Infrastructure services

mod content_service;
mod single_flight;

pub use content_service::{
    ArticleService, ContentService, ContentServiceConfig, ImageService, SpeechService,
    VocabularyService,
};
pub use single_flight::{KeyGuard, KeyLocks};
