//! Caller-side control flow for one pipeline.
//!
//! Each `generate_*` operation dispatches the gating event, runs the
//! matching job, and feeds the outcome back as pipeline events. Video jobs
//! are not awaited: a background tracker forwards their progress, and
//! starting a new video job supersedes the previous tracker.

use avstudio_core::job::{Job, JobStatus, JobType};
use avstudio_core::payload::{AudioInput, AudioResult, ScriptInput, ScriptResult, VideoInput};
use avstudio_core::preset::VoicePreset;
use avstudio_events::{JobError, JobStore};
use parking_lot::Mutex;
use serde::de::DeserializeOwned;
use tokio_util::sync::CancellationToken;

use crate::machine::{PipelineEvent, PipelineStep};
use crate::orchestrator::{DispatchOutcome, OrchestratorClosed, OrchestratorHandle, PipelineSnapshot};
use crate::poller::track_video_job;

/// Message recorded when a video job has been queued.
pub const VIDEO_QUEUED_MESSAGE: &str = "Video generation queued";

/// Preset used for rendering when none has been selected.
pub const DEFAULT_VIDEO_PRESET: VoicePreset = VoicePreset::Belinda;

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("{event} is not allowed in step {step}")]
    GuardRejected {
        event: &'static str,
        step: PipelineStep,
    },

    #[error("{0}")]
    MissingInput(String),

    #[error(transparent)]
    Job(#[from] JobError),

    #[error(transparent)]
    Closed(#[from] OrchestratorClosed),

    #[error("Job produced an unreadable result: {0}")]
    InvalidResult(String),
}

pub struct PipelineSession {
    store: JobStore,
    orchestrator: OrchestratorHandle,
    video_tracker: Mutex<Option<CancellationToken>>,
    shutdown: CancellationToken,
}

impl PipelineSession {
    /// Trackers spawned by this session stop when `shutdown` fires.
    pub fn new(store: JobStore, orchestrator: OrchestratorHandle, shutdown: CancellationToken) -> Self {
        Self {
            store,
            orchestrator,
            video_tracker: Mutex::new(None),
            shutdown,
        }
    }

    pub fn orchestrator(&self) -> &OrchestratorHandle {
        &self.orchestrator
    }

    pub fn snapshot(&self) -> PipelineSnapshot {
        self.orchestrator.snapshot()
    }

    /// Dispatch `event` and fail unless the current step accepted it.
    async fn require(&self, event: PipelineEvent) -> Result<DispatchOutcome, SessionError> {
        let name = event.name();
        let outcome = self.orchestrator.dispatch_and_wait(event).await?;
        if outcome.applied() {
            Ok(outcome)
        } else {
            Err(SessionError::GuardRejected {
                event: name,
                step: outcome.snapshot.step,
            })
        }
    }

    // -----------------------------------------------------------------------
    // Script
    // -----------------------------------------------------------------------

    /// Generate a script from the pipeline's idea.
    ///
    /// A new `idea` is stored from `idle` only; outside `idle` it must match
    /// the stored idea or the call is rejected with `SET_IDEA`. When no idea
    /// was ever stored, the current draft is sent for polishing instead.
    pub async fn generate_script(
        &self,
        idea: Option<String>,
        instructions: Option<String>,
    ) -> Result<ScriptResult, SessionError> {
        if let Some(idea) = idea.as_deref().map(str::trim).filter(|i| !i.is_empty()) {
            let current = self.snapshot();
            if current.step == PipelineStep::Idle {
                self.require(PipelineEvent::SetIdea { idea: idea.to_string() }).await?;
            } else if current.context.idea.trim() != idea {
                return Err(SessionError::GuardRejected {
                    event: "SET_IDEA",
                    step: current.step,
                });
            }
        }

        let before = self.snapshot().context;
        self.require(PipelineEvent::GenerateScript).await?;

        let idea = Some(before.idea.clone()).filter(|i| !i.trim().is_empty());
        let input = ScriptInput {
            script: idea.is_none().then(|| before.script.clone()),
            idea,
            instructions,
        };

        match self.store.run_and_await(JobType::Script, to_input(&input)).await {
            Ok(job) => {
                let result: ScriptResult = read_result(&job)?;
                self.orchestrator.dispatch(PipelineEvent::ScriptReady {
                    script: result.script.clone(),
                    job_id: Some(job.id),
                })?;
                Ok(result)
            }
            Err(e) => {
                tracing::warn!(error = %e, "Script generation failed; restoring previous script");
                self.orchestrator.dispatch(PipelineEvent::ScriptReady {
                    script: before.script,
                    job_id: None,
                })?;
                Err(e.into())
            }
        }
    }

    // -----------------------------------------------------------------------
    // Audio
    // -----------------------------------------------------------------------

    /// Narrate the current script with the selected preset.
    pub async fn generate_audio(&self) -> Result<AudioResult, SessionError> {
        let ctx = self.snapshot().context;
        if !ctx.script_confirmed {
            self.require(PipelineEvent::ConfirmScript).await?;
        }
        let preset = ctx.voice_preset.ok_or_else(|| {
            SessionError::MissingInput("Select a voice preset before generating audio".into())
        })?;

        self.require(PipelineEvent::GenerateAudio).await?;

        let input = AudioInput {
            script: Some(ctx.script),
            preset: Some(preset.as_str().to_string()),
        };
        match self.store.run_and_await(JobType::Audio, to_input(&input)).await {
            Ok(job) => {
                let result: AudioResult = read_result(&job)?;
                self.orchestrator.dispatch(PipelineEvent::AudioReady {
                    audio_url: result.audio_url.clone(),
                    audio_path: Some(result.audio_path.clone()),
                    job_id: Some(job.id),
                })?;
                Ok(result)
            }
            Err(e) => {
                tracing::warn!(error = %e, preset = %preset, "Audio generation failed");
                self.orchestrator.dispatch(PipelineEvent::AudioFailed {
                    message: Some(e.to_string()),
                })?;
                Err(e.into())
            }
        }
    }

    // -----------------------------------------------------------------------
    // Video
    // -----------------------------------------------------------------------

    /// Queue a video job for the current audio and start tracking it.
    /// Returns the queued job without waiting for it.
    pub async fn generate_video(&self) -> Result<Job, SessionError> {
        let ctx = self.snapshot().context;
        let audio_url = ctx
            .audio_url
            .clone()
            .filter(|u| !u.is_empty())
            .ok_or_else(|| SessionError::MissingInput("Generate audio before rendering video".into()))?;

        if !ctx.audio_confirmed {
            self.require(PipelineEvent::ConfirmAudio).await?;
        }
        self.require(PipelineEvent::GenerateVideo).await?;

        let input = VideoInput {
            audio_url: Some(audio_url),
            audio_path: ctx.audio_path,
            preset: Some(ctx.voice_preset.unwrap_or(DEFAULT_VIDEO_PRESET).as_str().to_string()),
            avatar_id: None,
        };
        let job = self.store.create_job(JobType::Video, to_input(&input));
        self.orchestrator.dispatch(PipelineEvent::VideoJobStatus {
            job_id: job.id.clone(),
            status: JobStatus::Queued,
            progress: 0,
            message: Some(VIDEO_QUEUED_MESSAGE.to_string()),
        })?;

        let cancel = self.shutdown.child_token();
        if let Some(previous) = self.video_tracker.lock().replace(cancel.clone()) {
            previous.cancel();
        }
        tokio::spawn(track_video_job(
            self.store.clone(),
            self.orchestrator.clone(),
            job.id.clone(),
            cancel,
        ));

        tracing::info!(job_id = %job.id, "Video job queued");
        Ok(job)
    }
}

fn to_input<T: serde::Serialize>(input: &T) -> serde_json::Value {
    serde_json::to_value(input).unwrap_or_default()
}

fn read_result<T: DeserializeOwned>(job: &Job) -> Result<T, SessionError> {
    let value = job
        .result
        .clone()
        .ok_or_else(|| SessionError::InvalidResult(format!("job {} has no result", job.id)))?;
    serde_json::from_value(value).map_err(|e| SessionError::InvalidResult(e.to_string()))
}
