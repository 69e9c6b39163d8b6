//! Route definitions for the `/pipeline` resource.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::pipeline;
use crate::state::AppState;

/// Routes mounted at `/pipeline`.
///
/// ```text
/// GET    /                -> get_pipeline
/// GET    /stream          -> stream_pipeline (SSE)
/// POST   /events          -> dispatch_event
/// POST   /script          -> run_script
/// POST   /audio           -> run_audio
/// POST   /video           -> run_video
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(pipeline::get_pipeline))
        .route("/stream", get(pipeline::stream_pipeline))
        .route("/events", post(pipeline::dispatch_event))
        .route("/script", post(pipeline::run_script))
        .route("/audio", post(pipeline::run_audio))
        .route("/video", post(pipeline::run_video))
}
