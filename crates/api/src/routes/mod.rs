pub mod generation;
pub mod health;
pub mod jobs;
pub mod pipeline;

use axum::Router;

use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /jobs                                            create job
/// /jobs/{id}                                       job record
/// /jobs/{id}/events                                live job events (SSE)
///
/// /script                                          generate script and wait
/// /tts                                             synthesize speech and wait
/// /video                                           queue avatar video
///
/// /pipeline                                        state + derived view
/// /pipeline/stream                                 state changes (SSE)
/// /pipeline/events                                 dispatch a pipeline event
/// /pipeline/script                                 session: generate script
/// /pipeline/audio                                  session: generate audio
/// /pipeline/video                                  session: generate video
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .nest("/jobs", jobs::router())
        .nest("/pipeline", pipeline::router())
        .merge(generation::router())
}
