use std::sync::Arc;

use avstudio_events::JobStore;
use avstudio_pipeline::PipelineSession;

use crate::config::ServerConfig;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// Cheap to clone: every field is an `Arc` or a cloneable handle.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<ServerConfig>,
    /// In-memory job table with its executor.
    pub jobs: JobStore,
    /// The single pipeline driven by the `/pipeline` routes.
    pub session: Arc<PipelineSession>,
}
