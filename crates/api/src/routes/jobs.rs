//! Route definitions for the `/jobs` resource.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::jobs;
use crate::state::AppState;

/// Routes mounted at `/jobs`.
///
/// ```text
/// POST   /                -> create_job
/// GET    /{id}            -> get_job
/// GET    /{id}/events     -> job_events (SSE)
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(jobs::create_job))
        .route("/{id}", get(jobs::get_job))
        .route("/{id}/events", get(jobs::job_events))
}
