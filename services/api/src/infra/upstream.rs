use bytes::Bytes;
use serde::Serialize;

use crate::domain::repository::AudioPort;
use crate::error::ApiError;

/// Download name the upstream model uses for its output, without extension.
pub const AUDIO_FILENAME: &str = "generated_audio";

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateAudioRequest<'a> {
    prompt_text: &'a str,
    filename: &'a str,
}

/// [`AudioPort`] over HTTP: `POST {url}` with `{promptText, filename}`, WAV bytes back.
#[derive(Clone)]
pub struct HttpAudioPort {
    pub client: reqwest::Client,
    pub url: String,
}

impl AudioPort for HttpAudioPort {
    async fn generate(&self, prompt: &str) -> Result<Bytes, ApiError> {
        let response = self
            .client
            .post(&self.url)
            .json(&GenerateAudioRequest {
                prompt_text: prompt,
                filename: AUDIO_FILENAME,
            })
            .send()
            .await
            .map_err(|e| ApiError::Upstream(format!("request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ApiError::Upstream(format!("upstream returned {status}")));
        }

        response
            .bytes()
            .await
            .map_err(|e| ApiError::Upstream(format!("reading upstream body: {e}")))
    }
}
