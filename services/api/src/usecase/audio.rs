use bytes::Bytes;

use moodzic_domain::id::UserId;
use moodzic_domain::method::ApiMethod;

use crate::domain::repository::{AudioPort, UsageRepository};
use crate::domain::types::FREE_AUDIO_CALLS;
use crate::error::ApiError;

/// Log key of the generate-audio route; prior calls are counted against it.
pub const GENERATE_AUDIO_ENDPOINT: &str = "/generate-audio";

#[derive(Debug)]
pub struct GenerateAudioOutput {
    pub audio: Bytes,
    /// The caller had already used up the free quota before this call.
    pub over_free_quota: bool,
}

pub struct GenerateAudioUseCase<A: AudioPort, R: UsageRepository> {
    pub audio: A,
    pub usage: R,
}

impl<A: AudioPort, R: UsageRepository> GenerateAudioUseCase<A, R> {
    pub async fn execute(
        &self,
        user_id: UserId,
        prompt: &str,
    ) -> Result<GenerateAudioOutput, ApiError> {
        if prompt.trim().is_empty() {
            return Err(ApiError::Validation("required: promptText".into()));
        }

        let prior = self
            .usage
            .count_user_calls(user_id, ApiMethod::Post, GENERATE_AUDIO_ENDPOINT)
            .await?;

        let audio = self.audio.generate(prompt).await?;
        Ok(GenerateAudioOutput {
            audio,
            over_free_quota: prior >= FREE_AUDIO_CALLS,
        })
    }
}
