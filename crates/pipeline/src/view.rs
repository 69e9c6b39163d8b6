//! Derived flags for rendering the pipeline.

use serde::Serialize;

use crate::machine::{PipelineContext, PipelineStep};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PipelineView {
    pub is_audio_enabled: bool,
    pub is_audio_confirmed: bool,
    pub can_generate_audio: bool,
    pub is_video_enabled: bool,
    pub can_generate_video: bool,
    pub is_processing: bool,
}

impl PipelineView {
    pub fn of(step: PipelineStep, ctx: &PipelineContext) -> Self {
        let is_audio_enabled = ctx.has_script() && ctx.script_confirmed;
        let is_video_enabled = ctx.can_render_video();

        let can_generate_audio = matches!(
            step,
            PipelineStep::ScriptReady | PipelineStep::AudioReady | PipelineStep::VideoReady
        ) && is_audio_enabled
            && ctx.voice_preset.is_some();

        let can_generate_video =
            matches!(step, PipelineStep::AudioReady | PipelineStep::VideoReady)
                && is_video_enabled
                && !ctx.stale_flags.video;

        Self {
            is_audio_enabled,
            is_audio_confirmed: ctx.has_audio() && ctx.audio_confirmed,
            can_generate_audio,
            is_video_enabled,
            can_generate_video,
            is_processing: step.is_processing(),
        }
    }
}
