//! Pipeline state machine.
//!
//! [`transition`] is a pure function from `(step, context, event)` to the
//! next step and context. Guards are plain predicates evaluated before any
//! field is assigned, so a rejected or unhandled event never changes
//! anything. The orchestrator actor is the only caller that keeps the
//! result.

use std::fmt;

use avstudio_core::job::JobStatus;
use avstudio_core::preset::VoicePreset;
use avstudio_core::types::JobId;
use serde::{Deserialize, Serialize};

/// Placeholder message shown while a video job is being created.
pub const VIDEO_STARTING_MESSAGE: &str = "Starting video generation...";

/// Default message for a failed video job.
pub const VIDEO_FAILED_MESSAGE: &str = "Video generation failed.";

/// Message recorded when the video is available.
pub const VIDEO_READY_MESSAGE: &str = "Video ready.";

// ---------------------------------------------------------------------------
// Steps
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PipelineStep {
    #[default]
    Idle,
    IdeaInput,
    ScriptGeneration,
    ScriptReady,
    AudioGenerating,
    AudioReady,
    VideoGenerating,
    VideoReady,
}

impl PipelineStep {
    pub fn as_str(self) -> &'static str {
        match self {
            PipelineStep::Idle => "idle",
            PipelineStep::IdeaInput => "ideaInput",
            PipelineStep::ScriptGeneration => "scriptGeneration",
            PipelineStep::ScriptReady => "scriptReady",
            PipelineStep::AudioGenerating => "audioGenerating",
            PipelineStep::AudioReady => "audioReady",
            PipelineStep::VideoGenerating => "videoGenerating",
            PipelineStep::VideoReady => "videoReady",
        }
    }

    /// A generation job for this stage is in flight.
    pub fn is_processing(self) -> bool {
        matches!(
            self,
            PipelineStep::ScriptGeneration
                | PipelineStep::AudioGenerating
                | PipelineStep::VideoGenerating
        )
    }
}

impl fmt::Display for PipelineStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Context
// ---------------------------------------------------------------------------

/// Status of the latest video job as seen by the pipeline. `Idle` means no
/// video job is associated with the current audio.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VideoJobStatus {
    #[default]
    Idle,
    Queued,
    Processing,
    Completed,
    Failed,
}

impl From<JobStatus> for VideoJobStatus {
    fn from(status: JobStatus) -> Self {
        match status {
            JobStatus::Queued => VideoJobStatus::Queued,
            JobStatus::Processing => VideoJobStatus::Processing,
            JobStatus::Completed => VideoJobStatus::Completed,
            JobStatus::Failed => VideoJobStatus::Failed,
        }
    }
}

/// Projection of the latest video job.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoJob {
    pub id: Option<JobId>,
    pub status: VideoJobStatus,
    pub progress: u8,
    pub message: Option<String>,
}

impl VideoJob {
    fn starting() -> Self {
        Self {
            id: None,
            status: VideoJobStatus::Processing,
            progress: 0,
            message: Some(VIDEO_STARTING_MESSAGE.to_string()),
        }
    }
}

/// Last job id dispatched for each stage.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobIds {
    pub script: Option<JobId>,
    pub audio: Option<JobId>,
    pub video: Option<JobId>,
}

/// Artifacts that exist but were produced from input that has since changed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StaleFlags {
    pub audio: bool,
    pub video: bool,
}

impl StaleFlags {
    const ALL: StaleFlags = StaleFlags {
        audio: true,
        video: true,
    };
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PipelineContext {
    pub idea: String,
    pub script: String,
    pub script_confirmed: bool,
    pub audio_confirmed: bool,
    pub voice_preset: Option<VoicePreset>,
    /// Client-playable narration.
    pub audio_url: Option<String>,
    /// Backend-addressable narration, fed to video rendering.
    pub audio_path: Option<String>,
    pub video_url: Option<String>,
    pub job_ids: JobIds,
    pub video_job: VideoJob,
    pub stale_flags: StaleFlags,
}

fn present(value: &Option<String>) -> bool {
    value.as_deref().is_some_and(|v| !v.is_empty())
}

impl PipelineContext {
    pub fn has_script(&self) -> bool {
        !self.script.trim().is_empty()
    }

    pub fn has_audio(&self) -> bool {
        present(&self.audio_url)
    }

    /// Guard shared by every `GENERATE_VIDEO` transition.
    pub fn can_render_video(&self) -> bool {
        self.audio_confirmed && present(&self.audio_url) && present(&self.audio_path)
    }

    /// Drop everything derived from the current script: confirmations,
    /// the selected preset, artifacts, and the audio/video job links.
    fn invalidate_downstream(&mut self) {
        self.script_confirmed = false;
        self.audio_confirmed = false;
        self.voice_preset = None;
        self.audio_url = None;
        self.audio_path = None;
        self.video_url = None;
        self.job_ids.audio = None;
        self.job_ids.video = None;
        self.video_job = VideoJob::default();
    }

    fn enter(&mut self, step: PipelineStep) {
        match step {
            PipelineStep::AudioGenerating => {
                self.audio_url = None;
                self.audio_path = None;
                self.stale_flags = StaleFlags {
                    audio: false,
                    video: true,
                };
                self.audio_confirmed = false;
                self.video_job = VideoJob::default();
            }
            PipelineStep::VideoGenerating => {
                self.video_url = None;
                self.stale_flags.video = false;
                self.video_job = VideoJob::starting();
            }
            _ => {}
        }
    }
}

// ---------------------------------------------------------------------------
// Events
// ---------------------------------------------------------------------------

/// Everything the pipeline reacts to. Wire form is `{"type": "SET_IDEA", ...}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(
    tag = "type",
    rename_all = "SCREAMING_SNAKE_CASE",
    rename_all_fields = "camelCase"
)]
pub enum PipelineEvent {
    SetIdea {
        idea: String,
    },
    GenerateScript,
    ScriptReady {
        script: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        job_id: Option<JobId>,
    },
    EditScript {
        script: String,
    },
    ConfirmScript,
    ConfirmAudio,
    SelectVoicePreset {
        preset: VoicePreset,
    },
    GenerateAudio,
    AudioReady {
        audio_url: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        audio_path: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        job_id: Option<JobId>,
    },
    AudioFailed {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        message: Option<String>,
    },
    GenerateVideo,
    VideoReady {
        video_url: String,
    },
    VideoJobStatus {
        job_id: JobId,
        status: JobStatus,
        progress: u8,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        message: Option<String>,
    },
    GoBackToStep {
        step: PipelineStep,
    },
    ResetPipeline,
}

impl PipelineEvent {
    /// Wire name, e.g. `SET_IDEA`.
    pub fn name(&self) -> &'static str {
        match self {
            PipelineEvent::SetIdea { .. } => "SET_IDEA",
            PipelineEvent::GenerateScript => "GENERATE_SCRIPT",
            PipelineEvent::ScriptReady { .. } => "SCRIPT_READY",
            PipelineEvent::EditScript { .. } => "EDIT_SCRIPT",
            PipelineEvent::ConfirmScript => "CONFIRM_SCRIPT",
            PipelineEvent::ConfirmAudio => "CONFIRM_AUDIO",
            PipelineEvent::SelectVoicePreset { .. } => "SELECT_VOICE_PRESET",
            PipelineEvent::GenerateAudio => "GENERATE_AUDIO",
            PipelineEvent::AudioReady { .. } => "AUDIO_READY",
            PipelineEvent::AudioFailed { .. } => "AUDIO_FAILED",
            PipelineEvent::GenerateVideo => "GENERATE_VIDEO",
            PipelineEvent::VideoReady { .. } => "VIDEO_READY",
            PipelineEvent::VideoJobStatus { .. } => "VIDEO_JOB_STATUS",
            PipelineEvent::GoBackToStep { .. } => "GO_BACK_TO_STEP",
            PipelineEvent::ResetPipeline => "RESET_PIPELINE",
        }
    }
}

// ---------------------------------------------------------------------------
// Transition function
// ---------------------------------------------------------------------------

/// What happened to a dispatched event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Disposition {
    /// Fields were assigned and/or the step changed.
    Applied,
    /// The current step handles the event but its guard did not hold.
    GuardRejected,
    /// The current step does not handle the event.
    Unhandled,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Transition {
    pub step: PipelineStep,
    pub context: PipelineContext,
    pub disposition: Disposition,
}

enum Outcome {
    Stay,
    Goto(PipelineStep),
    Rejected,
    Unhandled,
}

/// Compute the effect of `event` in `step`.
///
/// On [`Disposition::GuardRejected`] and [`Disposition::Unhandled`] the
/// returned step and context equal the inputs.
pub fn transition(
    step: PipelineStep,
    context: &PipelineContext,
    event: &PipelineEvent,
) -> Transition {
    let mut next = context.clone();
    let outcome = apply(step, &mut next, event);

    let (step, context, disposition) = match outcome {
        Outcome::Stay => (step, next, Disposition::Applied),
        Outcome::Goto(target) => {
            next.enter(target);
            (target, next, Disposition::Applied)
        }
        Outcome::Rejected => (step, context.clone(), Disposition::GuardRejected),
        Outcome::Unhandled => (step, context.clone(), Disposition::Unhandled),
    };
    Transition {
        step,
        context,
        disposition,
    }
}

fn apply(step: PipelineStep, ctx: &mut PipelineContext, event: &PipelineEvent) -> Outcome {
    use PipelineEvent as E;
    use PipelineStep as S;

    match (step, event) {
        // -- idea and script ------------------------------------------------
        (S::Idle, E::SetIdea { idea }) => {
            ctx.invalidate_downstream();
            ctx.stale_flags = StaleFlags::default();
            ctx.idea = idea.clone();
            Outcome::Goto(S::IdeaInput)
        }
        (S::Idle | S::IdeaInput, E::GenerateScript) => Outcome::Goto(S::ScriptGeneration),
        (S::IdeaInput, E::EditScript { script }) => {
            ctx.script = script.clone();
            ctx.invalidate_downstream();
            ctx.stale_flags = StaleFlags::default();
            Outcome::Goto(S::ScriptReady)
        }
        (S::ScriptGeneration, E::ScriptReady { script, job_id }) => {
            ctx.script = script.clone();
            if let Some(job_id) = job_id {
                ctx.job_ids.script = Some(job_id.clone());
            }
            ctx.invalidate_downstream();
            ctx.stale_flags = StaleFlags::default();
            Outcome::Goto(S::ScriptReady)
        }
        (S::ScriptReady, E::EditScript { script }) => {
            ctx.script = script.clone();
            ctx.stale_flags = StaleFlags::ALL;
            ctx.invalidate_downstream();
            Outcome::Stay
        }
        (S::AudioReady | S::VideoReady, E::EditScript { script }) => {
            ctx.script = script.clone();
            ctx.stale_flags = StaleFlags::ALL;
            ctx.invalidate_downstream();
            Outcome::Goto(S::ScriptReady)
        }
        (S::ScriptReady, E::GenerateScript) => {
            ctx.stale_flags = StaleFlags::ALL;
            ctx.invalidate_downstream();
            Outcome::Goto(S::ScriptGeneration)
        }
        (S::ScriptReady | S::AudioReady | S::VideoReady, E::SelectVoicePreset { preset }) => {
            ctx.voice_preset = Some(*preset);
            Outcome::Stay
        }
        (S::ScriptReady | S::AudioReady | S::VideoReady, E::ConfirmScript) => {
            if !ctx.has_script() {
                return Outcome::Rejected;
            }
            ctx.script_confirmed = true;
            ctx.stale_flags.audio = false;
            Outcome::Stay
        }

        // -- audio --------------------------------------------------------
        (S::ScriptReady | S::AudioReady, E::GenerateAudio) => {
            if !ctx.script_confirmed {
                return Outcome::Rejected;
            }
            Outcome::Goto(S::AudioGenerating)
        }
        (S::VideoReady, E::GenerateAudio) => Outcome::Goto(S::AudioGenerating),
        (
            S::AudioGenerating,
            E::AudioReady {
                audio_url,
                audio_path,
                job_id,
            },
        ) => {
            ctx.audio_url = Some(audio_url.clone());
            ctx.audio_path = Some(audio_path.clone().unwrap_or_else(|| audio_url.clone()));
            if let Some(job_id) = job_id {
                ctx.job_ids.audio = Some(job_id.clone());
            }
            ctx.script_confirmed = true;
            ctx.audio_confirmed = false;
            ctx.stale_flags.video = true;
            Outcome::Goto(S::AudioReady)
        }
        (S::AudioGenerating, E::AudioFailed { .. }) => {
            ctx.stale_flags.audio = true;
            Outcome::Goto(S::ScriptReady)
        }
        (S::AudioReady, E::ConfirmAudio) => {
            if !ctx.has_audio() {
                return Outcome::Rejected;
            }
            ctx.audio_confirmed = true;
            ctx.stale_flags.video = false;
            Outcome::Stay
        }

        // -- video --------------------------------------------------------
        (S::AudioReady | S::VideoReady, E::GenerateVideo) => {
            if !ctx.can_render_video() {
                return Outcome::Rejected;
            }
            Outcome::Goto(S::VideoGenerating)
        }
        (
            S::VideoGenerating,
            E::VideoJobStatus {
                job_id,
                status,
                progress,
                message,
            },
        ) => {
            if *status == JobStatus::Failed {
                ctx.video_job = VideoJob {
                    id: Some(job_id.clone()),
                    status: VideoJobStatus::Failed,
                    progress: *progress,
                    message: Some(
                        message
                            .clone()
                            .unwrap_or_else(|| VIDEO_FAILED_MESSAGE.to_string()),
                    ),
                };
                ctx.stale_flags.video = true;
                return Outcome::Goto(S::AudioReady);
            }
            ctx.job_ids.video = Some(job_id.clone());
            ctx.video_job = VideoJob {
                id: Some(job_id.clone()),
                status: (*status).into(),
                progress: *progress,
                message: message.clone(),
            };
            Outcome::Stay
        }
        (S::VideoGenerating, E::VideoReady { video_url }) => {
            ctx.video_url = Some(video_url.clone());
            ctx.script_confirmed = true;
            ctx.video_job = VideoJob {
                id: ctx.job_ids.video.clone(),
                status: VideoJobStatus::Completed,
                progress: 100,
                message: Some(VIDEO_READY_MESSAGE.to_string()),
            };
            Outcome::Goto(S::VideoReady)
        }

        // -- navigation ---------------------------------------------------
        (S::ScriptReady, E::GoBackToStep { step: target }) => match target {
            S::IdeaInput => Outcome::Goto(*target),
            _ => Outcome::Rejected,
        },
        (S::AudioReady, E::GoBackToStep { step: target }) => match target {
            S::ScriptReady | S::IdeaInput => Outcome::Goto(*target),
            _ => Outcome::Rejected,
        },
        (S::VideoReady, E::GoBackToStep { step: target }) => match target {
            S::AudioReady | S::ScriptReady | S::IdeaInput => Outcome::Goto(*target),
            _ => Outcome::Rejected,
        },
        (S::VideoReady, E::ResetPipeline) => {
            *ctx = PipelineContext::default();
            Outcome::Goto(S::Idle)
        }

        _ => Outcome::Unhandled,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
