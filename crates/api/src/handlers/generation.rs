//! One-shot generation endpoints.
//!
//! `/script` and `/tts` run a job to completion inside the request.
//! `/video` only queues; clients follow the job through its event stream.

use avstudio_core::error::CoreError;
use avstudio_core::job::{Job, JobStatus, JobType};
use avstudio_core::payload::{AudioInput, AudioResult, ScriptInput, ScriptResult, VideoInput};
use avstudio_core::preset::validate_preset;
use avstudio_core::types::JobId;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::{AppError, AppResult};
use crate::response::DataResponse;
use crate::state::AppState;

/// Avatar used when the client does not name one.
pub const DEFAULT_AVATAR_ID: &str = "default";

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Generated<T: Serialize> {
    pub job_id: JobId,
    pub status: JobStatus,
    #[serde(flatten)]
    pub result: T,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QueuedVideo {
    pub job_id: JobId,
    pub status: JobStatus,
    pub avatar_id: String,
    pub message: &'static str,
}

fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

fn require(value: &Option<String>, message: &str) -> Result<(), CoreError> {
    present(value)
        .map(|_| ())
        .ok_or_else(|| CoreError::Validation(message.to_string()))
}

fn to_input<T: Serialize>(input: &T) -> AppResult<serde_json::Value> {
    serde_json::to_value(input).map_err(|e| AppError::InternalError(e.to_string()))
}

fn read_result<T: DeserializeOwned>(job: Job) -> AppResult<T> {
    let value = job
        .result
        .ok_or_else(|| AppError::InternalError(format!("Job {} has no result", job.id)))?;
    serde_json::from_value(value).map_err(|e| AppError::InternalError(e.to_string()))
}

// ---------------------------------------------------------------------------
// Script
// ---------------------------------------------------------------------------

/// POST /api/v1/script
///
/// Write a script from `idea`, or polish `script` when given.
pub async fn generate_script(
    State(state): State<AppState>,
    Json(input): Json<ScriptInput>,
) -> AppResult<impl IntoResponse> {
    if present(&input.idea).is_none() && present(&input.script).is_none() {
        return Err(CoreError::Validation(
            "Either idea or script content must be provided".into(),
        )
        .into());
    }

    let job = state
        .jobs
        .run_and_await(JobType::Script, to_input(&input)?)
        .await?;
    let job_id = job.id.clone();
    let result: ScriptResult = read_result(job)?;

    Ok(Json(DataResponse {
        data: Generated {
            job_id,
            status: JobStatus::Completed,
            result,
            message: None,
        },
    }))
}

// ---------------------------------------------------------------------------
// Speech
// ---------------------------------------------------------------------------

/// POST /api/v1/tts
pub async fn generate_tts(
    State(state): State<AppState>,
    Json(input): Json<AudioInput>,
) -> AppResult<impl IntoResponse> {
    require(&input.script, "Script is required")?;
    require(&input.preset, "Voice preset is required")?;
    let preset = validate_preset(present(&input.preset).unwrap_or_default())?;

    let job = state
        .jobs
        .run_and_await(JobType::Audio, to_input(&input)?)
        .await?;
    let job_id = job.id.clone();
    let result: AudioResult = read_result(job)?;

    Ok(Json(DataResponse {
        data: Generated {
            job_id,
            status: JobStatus::Completed,
            result,
            message: Some(format!("Audio generation completed with {preset} voice")),
        },
    }))
}

// ---------------------------------------------------------------------------
// Video
// ---------------------------------------------------------------------------

/// POST /api/v1/video
pub async fn generate_video(
    State(state): State<AppState>,
    Json(mut input): Json<VideoInput>,
) -> AppResult<impl IntoResponse> {
    require(&input.audio_url, "Audio URL is required")?;
    if let Some(preset) = present(&input.preset) {
        validate_preset(preset)?;
    }
    let avatar_id = present(&input.avatar_id)
        .unwrap_or(DEFAULT_AVATAR_ID)
        .to_string();
    input.avatar_id = Some(avatar_id.clone());

    let job = state.jobs.create_job(JobType::Video, to_input(&input)?);
    tracing::info!(job_id = %job.id, avatar_id = %avatar_id, "Video job queued");

    Ok((
        StatusCode::ACCEPTED,
        Json(DataResponse {
            data: QueuedVideo {
                job_id: job.id,
                status: job.status,
                avatar_id,
                message: "Video generation queued",
            },
        }),
    ))
}
