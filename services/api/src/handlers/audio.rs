use axum::http::header::{CONTENT_DISPOSITION, CONTENT_TYPE};
use axum::http::{HeaderMap, HeaderName, HeaderValue};
use axum::response::IntoResponse;
use serde::Deserialize;

use crate::dispatch::{RouteRequest, X_MOODZIC_USAGE_WARNING};
use crate::domain::types::USAGE_WARNING;
use crate::error::ApiError;
use crate::infra::upstream::AUDIO_FILENAME;
use crate::state::AppState;
use crate::usecase::audio::GenerateAudioUseCase;

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateAudioRequest {
    pub prompt_text: String,
}

// ── POST /generate-audio ──────────────────────────────────────────────────────

pub async fn generate_audio(
    state: AppState,
    request: RouteRequest,
) -> Result<impl IntoResponse, ApiError> {
    let identity = request.authenticate()?;
    let body: GenerateAudioRequest = request.json().await?;

    let usecase = GenerateAudioUseCase {
        audio: state.audio_port(),
        usage: state.usage_repo(),
    };
    let out = usecase.execute(identity.user_id, &body.prompt_text).await?;

    let mut headers = HeaderMap::new();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("audio/wav"));
    let disposition = format!("attachment; filename=\"{AUDIO_FILENAME}.wav\"");
    headers.insert(
        CONTENT_DISPOSITION,
        HeaderValue::from_str(&disposition).map_err(|e| ApiError::Internal(e.into()))?,
    );
    if out.over_free_quota {
        headers.insert(
            HeaderName::from_static(X_MOODZIC_USAGE_WARNING),
            HeaderValue::from_static(USAGE_WARNING),
        );
    }

    Ok((headers, out.audio))
}
