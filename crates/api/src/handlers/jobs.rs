//! Handlers for the `/jobs` resource.

use avstudio_core::error::CoreError;
use avstudio_core::job::{JobStatus, JobType};
use avstudio_core::types::JobId;
use avstudio_events::JobStream;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use futures::StreamExt;
use serde::{Deserialize, Serialize};

use crate::error::AppResult;
use crate::response::DataResponse;
use crate::sse::{job_event, sse_response};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct CreateJob {
    #[serde(rename = "type")]
    pub job_type: JobType,
    #[serde(default)]
    pub input: serde_json::Value,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatedJob {
    pub id: JobId,
    pub status: JobStatus,
    pub progress: u8,
}

/// POST /api/v1/jobs
///
/// Queue a job and return immediately with 202. Progress is observed via
/// `GET /jobs/{id}` or the `/events` stream.
pub async fn create_job(
    State(state): State<AppState>,
    Json(body): Json<CreateJob>,
) -> AppResult<impl IntoResponse> {
    let job = state.jobs.create_job(body.job_type, body.input);

    tracing::info!(job_id = %job.id, job_type = %job.job_type, "Job submitted");

    Ok((
        StatusCode::ACCEPTED,
        Json(DataResponse {
            data: CreatedJob {
                id: job.id,
                status: job.status,
                progress: job.progress,
            },
        }),
    ))
}

/// GET /api/v1/jobs/{id}
pub async fn get_job(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<impl IntoResponse> {
    let job = state.jobs.get_job(&id).ok_or(CoreError::NotFound {
        entity: "Job",
        id,
    })?;
    Ok(Json(DataResponse { data: job }))
}

/// GET /api/v1/jobs/{id}/events
///
/// Live SSE channel: `connected`, then `status` per update, then
/// `completed`, after which the response ends. Disconnecting releases the
/// subscription; the job keeps running.
pub async fn job_events(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Response> {
    let stream = JobStream::open(&state.jobs, &id)?;
    tracing::debug!(job_id = %id, "SSE client connected");

    let events = stream.into_stream().map(|event| job_event(&event));
    Ok(sse_response(events))
}
