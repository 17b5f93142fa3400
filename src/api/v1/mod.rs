//! Versioned content endpoints

pub mod articles;
pub mod images;
pub mod speech;
pub mod vocabulary;

use axum::{
    routing::{get, post},
    Router,
};

use super::state::AppState;

pub fn create_v1_router() -> Router<AppState> {
    Router::new()
        .route(
            "/speech",
            get(speech::get_speech).post(speech::create_speech),
        )
        .route("/articles", post(articles::summarize_article))
        .route("/articles/feed", get(articles::article_feed))
        .route("/vocabulary", post(vocabulary::extract_vocabulary))
        .route("/images", post(images::create_image))
        .route("/images/batch", post(images::create_image_batch))
}
