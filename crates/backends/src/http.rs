//! [`GenerationBackend`] over HTTP.

use avstudio_core::preset::VoicePreset;

use crate::azure::AzureTextClient;
use crate::config::BackendConfig;
use crate::error::BackendError;
use crate::media::MediaServiceClient;
use crate::GenerationBackend;

/// Routes each capability to its configured HTTP service.
///
/// Capabilities without configuration answer
/// [`BackendError::NotConfigured`] without touching the network.
pub struct HttpBackend {
    text: Option<AzureTextClient>,
    media: Option<MediaServiceClient>,
}

impl HttpBackend {
    /// Build the clients described by `config`, sharing one connection pool.
    pub fn new(config: &BackendConfig) -> Result<Self, BackendError> {
        let client = reqwest::Client::builder().timeout(config.timeout).build()?;

        let text = config
            .azure
            .clone()
            .map(|azure| AzureTextClient::with_client(client.clone(), azure));
        let media = config
            .generation_url
            .clone()
            .map(|url| MediaServiceClient::with_client(client, url));

        tracing::info!(
            text_generation = text.is_some(),
            media_generation = media.is_some(),
            "Generation backends configured",
        );
        Ok(Self { text, media })
    }

    fn media(&self, capability: &'static str) -> Result<&MediaServiceClient, BackendError> {
        self.media
            .as_ref()
            .ok_or(BackendError::NotConfigured(capability))
    }
}

#[async_trait::async_trait]
impl GenerationBackend for HttpBackend {
    async fn generate_text(
        &self,
        system_prompt: &str,
        user_prompt: &str,
    ) -> Result<String, BackendError> {
        let text = self
            .text
            .as_ref()
            .ok_or(BackendError::NotConfigured("Text generation"))?;
        text.complete(system_prompt, user_prompt).await
    }

    async fn synthesize_speech(
        &self,
        preset: VoicePreset,
        script: &str,
    ) -> Result<String, BackendError> {
        self.media("Speech synthesis")?
            .generate_audio(preset, script)
            .await
    }

    async fn render_video(
        &self,
        preset: VoicePreset,
        audio_path: &str,
    ) -> Result<String, BackendError> {
        self.media("Avatar rendering")?
            .generate_video(preset, audio_path)
            .await
    }
}

// ---- shared response helpers ----

/// Ensure the response has a success status code. Returns the response
/// unchanged on success, or a [`BackendError::Api`] containing the status
/// and body text on failure.
async fn ensure_success(response: reqwest::Response) -> Result<reqwest::Response, BackendError> {
    let status = response.status();
    if !status.is_success() {
        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "<unreadable body>".to_string());
        return Err(BackendError::Api {
            status: status.as_u16(),
            body,
        });
    }
    Ok(response)
}

/// Parse a successful JSON response body into the expected type.
pub(crate) async fn parse_json<T: serde::de::DeserializeOwned>(
    response: reqwest::Response,
) -> Result<T, BackendError> {
    let response = ensure_success(response).await?;
    Ok(response.json::<T>().await?)
}
