//! Route definitions for the one-shot generation endpoints.

use axum::routing::post;
use axum::Router;

use crate::handlers::generation;
use crate::state::AppState;

/// Routes mounted at the API root.
///
/// ```text
/// POST   /script          -> generate_script
/// POST   /tts             -> generate_tts
/// POST   /video           -> generate_video
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/script", post(generation::generate_script))
        .route("/tts", post(generation::generate_tts))
        .route("/video", post(generation::generate_video))
}
