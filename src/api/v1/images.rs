//! Illustration endpoints

use axum::extract::State;
use serde::Deserialize;
use tracing::debug;

use crate::api::state::AppState;
use crate::api::types::{
    ApiError, BatchResponse, ContentResponse, Json, Query, RefreshParams, Refreshable,
};
use crate::domain::content::{ImagePayload, ImageRequest};

#[derive(Debug, Deserialize)]
pub struct ImageBatchRequest {
    pub items: Vec<ImageRequest>,
    #[serde(default)]
    pub refresh: bool,
}

/// POST /v1/images
pub async fn create_image(
    State(state): State<AppState>,
    Query(params): Query<RefreshParams>,
    Json(body): Json<Refreshable<ImageRequest>>,
) -> Result<Json<ContentResponse<ImagePayload>>, ApiError> {
    let refresh = body.refresh || params.refresh;
    let request = body.request;

    debug!(phrase = %request.phrase, refresh, "Image requested");

    let outcome = state.images.get_or_generate(&request, refresh).await?;

    Ok(Json(outcome.into()))
}

/// POST /v1/images/batch
///
/// Items are processed in order; one failing item does not fail the batch.
pub async fn create_image_batch(
    State(state): State<AppState>,
    Query(params): Query<RefreshParams>,
    Json(body): Json<ImageBatchRequest>,
) -> Result<Json<BatchResponse<ImagePayload>>, ApiError> {
    let max = state.settings.max_batch_size;

    if body.items.is_empty() {
        return Err(ApiError::bad_request("items must not be empty").with_param("items"));
    }
    if body.items.len() > max {
        return Err(ApiError::bad_request(format!(
            "at most {} items per batch, got {}",
            max,
            body.items.len()
        ))
        .with_param("items"));
    }

    debug!(items = body.items.len(), "Image batch requested");

    let refresh = body.refresh || params.refresh;
    let results = state.images.get_or_generate_batch(&body.items, refresh).await;

    Ok(Json(results.into_iter().collect()))
}
