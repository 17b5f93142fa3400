//! Article summary endpoints

use axum::extract::State;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::api::middleware::truncate_for_log;
use crate::api::state::AppState;
use crate::api::types::{ApiError, ContentResponse, Json, Query, RefreshParams, Refreshable};
use crate::domain::content::{ArticlePayload, ArticleRequest};

#[derive(Debug, Default, Deserialize)]
pub struct FeedQuery {
    #[serde(default)]
    pub limit: Option<usize>,
}

#[derive(Debug, Serialize)]
pub struct FeedResponse {
    pub articles: Vec<ContentResponse<ArticlePayload>>,
    pub count: usize,
}

/// POST /v1/articles
pub async fn summarize_article(
    State(state): State<AppState>,
    Query(params): Query<RefreshParams>,
    Json(body): Json<Refreshable<ArticleRequest>>,
) -> Result<Json<ContentResponse<ArticlePayload>>, ApiError> {
    let refresh = body.refresh || params.refresh;
    let request = body.request;

    debug!(
        url = ?request.url,
        title = %truncate_for_log(&request.title, 80),
        refresh,
        "Article summary requested"
    );

    let outcome = state.articles.get_or_generate(&request, refresh).await?;

    Ok(Json(outcome.into()))
}

/// GET /v1/articles/feed
///
/// Recently summarized articles, newest first. An unavailable store yields
/// an empty feed.
pub async fn article_feed(
    State(state): State<AppState>,
    Query(query): Query<FeedQuery>,
) -> Json<FeedResponse> {
    let limit = query
        .limit
        .unwrap_or(state.settings.default_feed_limit)
        .clamp(1, state.settings.max_feed_limit);

    let articles: Vec<_> = state
        .articles
        .recent(limit)
        .await
        .into_iter()
        .map(ContentResponse::from)
        .collect();

    Json(FeedResponse {
        count: articles.len(),
        articles,
    })
}
