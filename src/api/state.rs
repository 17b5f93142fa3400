//! Application state for shared services

use std::sync::Arc;
use std::time::Duration;

use crate::domain::ObjectStore;
use crate::infrastructure::services::{ArticleService, ImageService, SpeechService, VocabularyService};
use crate::infrastructure::storage::UrlSigner;

/// Limits applied at the HTTP edge
#[derive(Debug, Clone)]
pub struct ApiSettings {
    /// Lifetime of minted object URLs
    pub signed_url_ttl: Duration,
    /// Most phrases accepted by one batch request
    pub max_batch_size: usize,
    pub default_feed_limit: usize,
    pub max_feed_limit: usize,
}

impl Default for ApiSettings {
    fn default() -> Self {
        Self {
            signed_url_ttl: Duration::from_secs(3600),
            max_batch_size: 10,
            default_feed_limit: 20,
            max_feed_limit: 100,
        }
    }
}

/// One cache-aside service per content domain plus object access
#[derive(Clone)]
pub struct AppState {
    pub speech: Arc<SpeechService>,
    pub articles: Arc<ArticleService>,
    pub vocabulary: Arc<VocabularyService>,
    pub images: Arc<ImageService>,
    pub objects: Arc<dyn ObjectStore>,
    /// `None` when no signing secret is configured
    pub signer: Option<Arc<UrlSigner>>,
    pub settings: ApiSettings,
}

impl AppState {
    pub fn new(
        speech: SpeechService,
        articles: ArticleService,
        vocabulary: VocabularyService,
        images: ImageService,
        objects: Arc<dyn ObjectStore>,
    ) -> Self {
        Self {
            speech: Arc::new(speech),
            articles: Arc::new(articles),
            vocabulary: Arc::new(vocabulary),
            images: Arc::new(images),
            objects,
            signer: None,
            settings: ApiSettings::default(),
        }
    }

    pub fn with_signer(mut self, signer: UrlSigner) -> Self {
        self.signer = Some(Arc::new(signer));
        self
    }

    pub fn with_settings(mut self, settings: ApiSettings) -> Self {
        self.settings = settings;
        self
    }
}
