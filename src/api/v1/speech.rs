//! Text-to-speech endpoints

use axum::extract::State;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::api::middleware::truncate_for_log;
use crate::api::state::AppState;
use crate::api::types::{ApiError, ContentResponse, Json, Query, RefreshParams, Refreshable};
use crate::domain::content::{SpeechPayload, SpeechRequest};
use crate::domain::DomainError;

/// `GET /v1/speech` query string
#[derive(Debug, Deserialize)]
pub struct SpeechQuery {
    pub text: String,
    #[serde(default)]
    pub voice: Option<String>,
    #[serde(default)]
    pub rate: Option<f32>,
    #[serde(default)]
    pub refresh: bool,
}

impl SpeechQuery {
    fn into_request(self) -> SpeechRequest {
        let mut request = SpeechRequest::new(self.text);

        if let Some(voice) = self.voice {
            request = request.with_voice(voice);
        }
        if let Some(rate) = self.rate {
            request = request.with_rate(rate);
        }

        request
    }
}

/// Stored audio reference plus a freshly minted download link
#[derive(Debug, Serialize)]
pub struct SpeechBody {
    #[serde(flatten)]
    pub audio: SpeechPayload,
    pub audio_url: String,
    pub url_expires_at: DateTime<Utc>,
    /// Same as `cache_hit`
    pub cached: bool,
}

/// GET /v1/speech
pub async fn get_speech(
    State(state): State<AppState>,
    Query(query): Query<SpeechQuery>,
) -> Result<Json<ContentResponse<SpeechBody>>, ApiError> {
    let refresh = query.refresh;
    serve(&state, query.into_request(), refresh).await
}

/// POST /v1/speech
pub async fn create_speech(
    State(state): State<AppState>,
    Query(params): Query<RefreshParams>,
    Json(body): Json<Refreshable<SpeechRequest>>,
) -> Result<Json<ContentResponse<SpeechBody>>, ApiError> {
    serve(&state, body.request, body.refresh || params.refresh).await
}

async fn serve(
    state: &AppState,
    request: SpeechRequest,
    refresh: bool,
) -> Result<Json<ContentResponse<SpeechBody>>, ApiError> {
    // Checked first so a missing secret never pays for synthesis
    let signer = state
        .signer
        .clone()
        .ok_or_else(|| DomainError::configuration("objects.signing_secret is not set"))?;

    debug!(
        text = %truncate_for_log(&request.text, 80),
        voice = %request.voice,
        rate = request.rate,
        refresh,
        "Speech requested"
    );

    let outcome = state.speech.get_or_generate(&request, refresh).await?;
    let response = ContentResponse::from(outcome);
    let cached = response.cache_hit;
    let ttl = state.settings.signed_url_ttl;

    Ok(Json(response.map(|audio| {
        let signed = signer.sign(&audio.object_path, ttl);

        SpeechBody {
            audio,
            audio_url: signed.url,
            url_expires_at: signed.expires_at,
            cached,
        }
    })))
}
