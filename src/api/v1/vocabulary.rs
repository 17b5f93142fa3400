//! Vocabulary extraction endpoint

use axum::extract::State;
use tracing::debug;

use crate::api::state::AppState;
use crate::api::types::{ApiError, ContentResponse, Json, Query, RefreshParams, Refreshable};
use crate::domain::content::{VocabularyPayload, VocabularyRequest};

/// POST /v1/vocabulary
pub async fn extract_vocabulary(
    State(state): State<AppState>,
    Query(params): Query<RefreshParams>,
    Json(body): Json<Refreshable<VocabularyRequest>>,
) -> Result<Json<ContentResponse<VocabularyPayload>>, ApiError> {
    let refresh = body.refresh || params.refresh;
    let request = body.request;

    debug!(chars = request.text.len(), limit = ?request.limit, refresh, "Vocabulary requested");

    let outcome = state.vocabulary.get_or_generate(&request, refresh).await?;

    Ok(Json(outcome.into()))
}
