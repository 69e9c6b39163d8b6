//! Typed views of job `input` and `result` payloads.
//!
//! Jobs store both as opaque JSON. These structs describe the shapes the
//! pipeline actually writes and reads, all camelCase on the wire.

use serde::{Deserialize, Serialize};

use crate::preset::VoicePreset;
use crate::types::Timestamp;

/// Container format reported for rendered videos.
pub const VIDEO_FORMAT: &str = "mp4";

// ---------------------------------------------------------------------------
// Inputs
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ScriptInput {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub idea: Option<String>,
    /// Existing draft to polish instead of writing from scratch.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub script: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub instructions: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AudioInput {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub script: Option<String>,
    /// Raw preset name; validated by the executor.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub preset: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct VideoInput {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub audio_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub audio_path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub preset: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar_id: Option<String>,
}

// ---------------------------------------------------------------------------
// Results
// ---------------------------------------------------------------------------

/// Marks a result produced from a canned artifact because the generation
/// backend was unavailable or failed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Fallback {
    pub fallback: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fallback_reason: Option<String>,
}

impl Fallback {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn because(reason: impl Into<String>) -> Self {
        Self {
            fallback: true,
            fallback_reason: Some(reason.into()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScriptResult {
    pub script: String,
    pub word_count: usize,
    /// Seconds at 160 words per minute.
    pub estimated_duration: u32,
    pub idea: Option<String>,
    pub instructions: Option<String>,
    pub updated_at: Timestamp,
    #[serde(flatten)]
    pub fallback: Fallback,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AudioResult {
    /// Client-playable location.
    pub audio_url: String,
    /// Backend-addressable location, fed to video rendering.
    pub audio_path: String,
    /// Seconds.
    pub duration: f64,
    pub preset: VoicePreset,
    pub script: String,
    pub updated_at: Timestamp,
    #[serde(flatten)]
    pub fallback: Fallback,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoResult {
    pub video_url: String,
    pub video_path: Option<String>,
    /// Seconds, when known.
    pub duration: Option<f64>,
    pub format: String,
    pub audio_url: String,
    pub message: String,
    pub updated_at: Timestamp,
    #[serde(flatten)]
    pub fallback: Fallback,
}
