//! Clients for the external generation services.
//!
//! The worker only sees the [`GenerationBackend`] trait. [`HttpBackend`]
//! implements it over HTTP: text completion against an Azure OpenAI
//! deployment, speech synthesis and avatar rendering against the media
//! generation service.

pub mod azure;
pub mod config;
pub mod error;
pub mod http;
pub mod media;
#[cfg(any(test, feature = "test-support"))]
pub mod testing;

use avstudio_core::preset::VoicePreset;

pub use config::{AzureConfig, BackendConfig};
pub use error::BackendError;
pub use http::HttpBackend;

/// The three generative capabilities the pipeline depends on.
///
/// Artifact-producing calls return a backend-addressable file path.
#[async_trait::async_trait]
pub trait GenerationBackend: Send + Sync + 'static {
    /// Complete a chat prompt and return the trimmed text.
    async fn generate_text(&self, system_prompt: &str, user_prompt: &str)
        -> Result<String, BackendError>;

    /// Narrate `script` with `preset` and return the audio file path.
    async fn synthesize_speech(
        &self,
        preset: VoicePreset,
        script: &str,
    ) -> Result<String, BackendError>;

    /// Render an avatar video driven by the audio at `audio_path`.
    async fn render_video(
        &self,
        preset: VoicePreset,
        audio_path: &str,
    ) -> Result<String, BackendError>;
}
