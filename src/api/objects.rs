//! Signed object downloads

use axum::{
    extract::{Path, State},
    http::header,
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use tracing::debug;

use super::state::AppState;
use super::types::{ApiError, Query};
use crate::infrastructure::storage::{validate_object_path, SignatureError};

#[derive(Debug, Deserialize)]
pub struct SignedQuery {
    pub expires: i64,
    pub signature: String,
}

/// GET /objects/{*path}
///
/// 403 for a bad signature, 410 once the link has expired.
pub async fn get_object(
    State(state): State<AppState>,
    Path(path): Path<String>,
    Query(query): Query<SignedQuery>,
) -> Result<Response, ApiError> {
    let Some(signer) = state.signer.as_ref() else {
        return Err(ApiError::not_found("Object downloads are not enabled"));
    };

    validate_object_path(&path)?;

    signer
        .verify(&path, query.expires, &query.signature)
        .map_err(|e| match e {
            SignatureError::Expired => ApiError::gone("Signed URL has expired"),
            SignatureError::Invalid => ApiError::forbidden("Invalid signature"),
        })?;

    let object = state
        .objects
        .get_object(&path)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("Object '{}' not found", path)))?;

    debug!(path = %path, size = object.bytes.len(), "Serving object");

    Ok((
        [
            (header::CONTENT_TYPE, object.content_type),
            (header::CACHE_CONTROL, "private, max-age=300".to_string()),
        ],
        object.bytes,
    )
        .into_response())
}
