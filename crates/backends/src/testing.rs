//! Scripted in-memory [`GenerationBackend`] for tests.

use std::collections::VecDeque;

use avstudio_core::preset::VoicePreset;
use parking_lot::Mutex;

use crate::error::BackendError;
use crate::GenerationBackend;

/// One recorded backend call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendCall {
    Text { system_prompt: String, user_prompt: String },
    Speech { preset: VoicePreset, script: String },
    Video { preset: VoicePreset, audio_path: String },
}

/// Canned answer for one call.
#[derive(Debug, Clone)]
pub enum Reply {
    Ok(String),
    /// Fail with [`BackendError::Api`] carrying this body.
    Fail(String),
}

/// Answers calls from per-capability queues and records every call.
///
/// An empty queue answers [`BackendError::NotConfigured`], which is also
/// what an unconfigured real backend does.
#[derive(Default)]
pub struct ScriptedBackend {
    text: Mutex<VecDeque<Reply>>,
    speech: Mutex<VecDeque<Reply>>,
    video: Mutex<VecDeque<Reply>>,
    calls: Mutex<Vec<BackendCall>>,
}

impl ScriptedBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_text(self, reply: Reply) -> Self {
        self.text.lock().push_back(reply);
        self
    }

    pub fn with_speech(self, reply: Reply) -> Self {
        self.speech.lock().push_back(reply);
        self
    }

    pub fn with_video(self, reply: Reply) -> Self {
        self.video.lock().push_back(reply);
        self
    }

    /// Every call made so far, in order.
    pub fn calls(&self) -> Vec<BackendCall> {
        self.calls.lock().clone()
    }

    fn answer(
        queue: &Mutex<VecDeque<Reply>>,
        capability: &'static str,
    ) -> Result<String, BackendError> {
        match queue.lock().pop_front() {
            Some(Reply::Ok(value)) => Ok(value),
            Some(Reply::Fail(body)) => Err(BackendError::Api { status: 500, body }),
            None => Err(BackendError::NotConfigured(capability)),
        }
    }
}

#[async_trait::async_trait]
impl GenerationBackend for ScriptedBackend {
    async fn generate_text(
        &self,
        system_prompt: &str,
        user_prompt: &str,
    ) -> Result<String, BackendError> {
        self.calls.lock().push(BackendCall::Text {
            system_prompt: system_prompt.to_string(),
            user_prompt: user_prompt.to_string(),
        });
        Self::answer(&self.text, "Text generation")
    }

    async fn synthesize_speech(
        &self,
        preset: VoicePreset,
        script: &str,
    ) -> Result<String, BackendError> {
        self.calls.lock().push(BackendCall::Speech {
            preset,
            script: script.to_string(),
        });
        Self::answer(&self.speech, "Speech synthesis")
    }

    async fn render_video(
        &self,
        preset: VoicePreset,
        audio_path: &str,
    ) -> Result<String, BackendError> {
        self.calls.lock().push(BackendCall::Video {
            preset,
            audio_path: audio_path.to_string(),
        });
        Self::answer(&self.video, "Avatar rendering")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[tokio::test]
    async fn replies_are_consumed_in_order() {
        let backend = ScriptedBackend::new()
            .with_text(Reply::Ok("first".into()))
            .with_text(Reply::Fail("overloaded".into()));

        assert_eq!(backend.generate_text("s", "u").await.unwrap(), "first");
        assert_matches!(
            backend.generate_text("s", "u").await,
            Err(BackendError::Api { status: 500, .. })
        );
        assert_matches!(
            backend.generate_text("s", "u").await,
            Err(BackendError::NotConfigured(_))
        );
        assert_eq!(backend.calls().len(), 3);
    }
}
