//! Client for the media generation service (speech synthesis and avatar
//! rendering).
//!
//! Both endpoints write an artifact on the service host and answer with
//! its filesystem path.

use avstudio_core::preset::VoicePreset;
use serde::{Deserialize, Serialize};

use crate::error::BackendError;
use crate::http::parse_json;

/// HTTP client for a single media generation service instance.
pub struct MediaServiceClient {
    client: reqwest::Client,
    base_url: String,
}

#[derive(Debug, Serialize)]
struct AudioRequest<'a> {
    preset: VoicePreset,
    script: &'a str,
}

#[derive(Debug, Deserialize)]
struct AudioResponse {
    audio_path: String,
}

#[derive(Debug, Serialize)]
struct VideoRequest<'a> {
    preset: VoicePreset,
    audio_path: &'a str,
}

#[derive(Debug, Deserialize)]
struct VideoResponse {
    video_path: String,
}

impl MediaServiceClient {
    /// Create a client reusing an existing [`reqwest::Client`].
    ///
    /// * `base_url` - Service root, e.g. `http://host:8000`.
    pub fn with_client(client: reqwest::Client, base_url: String) -> Self {
        Self { client, base_url }
    }

    /// `POST /audio/generate` and return the written audio path.
    pub async fn generate_audio(
        &self,
        preset: VoicePreset,
        script: &str,
    ) -> Result<String, BackendError> {
        let response = self
            .client
            .post(format!("{}/audio/generate", self.base_url))
            .json(&AudioRequest { preset, script })
            .send()
            .await?;

        let body: AudioResponse = parse_json(response).await?;
        Ok(body.audio_path)
    }

    /// `POST /video/generate` and return the written video path.
    pub async fn generate_video(
        &self,
        preset: VoicePreset,
        audio_path: &str,
    ) -> Result<String, BackendError> {
        let response = self
            .client
            .post(format!("{}/video/generate", self.base_url))
            .json(&VideoRequest { preset, audio_path })
            .send()
            .await?;

        let body: VideoResponse = parse_json(response).await?;
        Ok(body.video_path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn audio_request_uses_snake_case_preset() {
        let body = serde_json::to_value(AudioRequest {
            preset: VoicePreset::BroomSalesman,
            script: "Hello.",
        })
        .unwrap();
        assert_eq!(body, serde_json::json!({"preset": "broom_salesman", "script": "Hello."}));
    }

    #[test]
    fn video_response_reads_video_path() {
        let body: VideoResponse =
            serde_json::from_value(serde_json::json!({"video_path": "/out/video/a.mp4"})).unwrap();
        assert_eq!(body.video_path, "/out/video/a.mp4");
    }
}
