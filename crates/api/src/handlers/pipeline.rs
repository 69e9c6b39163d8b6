//! Handlers for the `/pipeline` resource.

use avstudio_core::job::JobStatus;
use avstudio_core::types::JobId;
use avstudio_pipeline::machine::Disposition;
use avstudio_pipeline::{PipelineEvent, PipelineSnapshot, PipelineView};
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::sse::Event;
use axum::response::{IntoResponse, Response};
use axum::Json;
use futures::StreamExt;
use serde::{Deserialize, Serialize};
use tokio_stream::wrappers::WatchStream;

use crate::error::AppResult;
use crate::response::DataResponse;
use crate::sse::sse_response;
use crate::state::AppState;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PipelineState {
    #[serde(flatten)]
    pub snapshot: PipelineSnapshot,
    pub view: PipelineView,
}

impl From<PipelineSnapshot> for PipelineState {
    fn from(snapshot: PipelineSnapshot) -> Self {
        let view = snapshot.view();
        Self { snapshot, view }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DispatchResponse {
    pub disposition: Disposition,
    #[serde(flatten)]
    pub state: PipelineState,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ScriptRequest {
    pub idea: Option<String>,
    pub instructions: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoStarted {
    pub job_id: JobId,
    pub status: JobStatus,
}

/// GET /api/v1/pipeline
pub async fn get_pipeline(State(state): State<AppState>) -> impl IntoResponse {
    Json(DataResponse {
        data: PipelineState::from(state.session.snapshot()),
    })
}

/// POST /api/v1/pipeline/events
///
/// Events a step does not accept are reported, not rejected: the response
/// carries `disposition` and the unchanged state.
pub async fn dispatch_event(
    State(state): State<AppState>,
    Json(event): Json<PipelineEvent>,
) -> AppResult<impl IntoResponse> {
    let outcome = state.session.orchestrator().dispatch_and_wait(event).await?;
    Ok(Json(DataResponse {
        data: DispatchResponse {
            disposition: outcome.disposition,
            state: outcome.snapshot.into(),
        },
    }))
}

/// GET /api/v1/pipeline/stream
///
/// SSE feed of `snapshot` events, starting with the current state.
pub async fn stream_pipeline(State(state): State<AppState>) -> Response {
    let updates = WatchStream::new(state.session.orchestrator().subscribe());
    let events = updates.map(|snapshot| {
        let data = serde_json::to_string(&PipelineState::from(snapshot)).unwrap_or_default();
        Event::default().event("snapshot").data(data)
    });
    sse_response(events)
}

/// POST /api/v1/pipeline/script
pub async fn run_script(
    State(state): State<AppState>,
    Json(body): Json<ScriptRequest>,
) -> AppResult<impl IntoResponse> {
    let result = state
        .session
        .generate_script(body.idea, body.instructions)
        .await?;
    Ok(Json(DataResponse { data: result }))
}

/// POST /api/v1/pipeline/audio
pub async fn run_audio(State(state): State<AppState>) -> AppResult<impl IntoResponse> {
    let result = state.session.generate_audio().await?;
    Ok(Json(DataResponse { data: result }))
}

/// POST /api/v1/pipeline/video
///
/// Returns 202 once the video job is queued; progress arrives through the
/// pipeline state.
pub async fn run_video(State(state): State<AppState>) -> AppResult<impl IntoResponse> {
    let job = state.session.generate_video().await?;
    Ok((
        StatusCode::ACCEPTED,
        Json(DataResponse {
            data: VideoStarted {
                job_id: job.id,
                status: job.status,
            },
        }),
    ))
}
