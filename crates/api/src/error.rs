use avstudio_core::error::CoreError;
use avstudio_events::{JobError, StreamError};
use avstudio_pipeline::{OrchestratorClosed, SessionError};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;

/// Application-level error type for HTTP handlers.
///
/// Wraps the domain errors of each crate and renders them as
/// `{ "error": message, "code": CODE }`.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error(transparent)]
    Core(#[from] CoreError),

    #[error(transparent)]
    Job(#[from] JobError),

    #[error(transparent)]
    Stream(#[from] StreamError),

    #[error(transparent)]
    Session(#[from] SessionError),

    #[error(transparent)]
    Orchestrator(#[from] OrchestratorClosed),

    /// An internal error with a human-readable message.
    #[error("Internal error: {0}")]
    InternalError(String),
}

/// Convenience type alias for handler return values.
pub type AppResult<T> = Result<T, AppError>;

type Classified = (StatusCode, &'static str, String);

fn internal(detail: &dyn std::fmt::Display) -> Classified {
    tracing::error!(error = %detail, "Internal error");
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        "INTERNAL_ERROR",
        "An internal error occurred".to_string(),
    )
}

fn unavailable() -> Classified {
    (
        StatusCode::SERVICE_UNAVAILABLE,
        "UNAVAILABLE",
        "The pipeline is shutting down".to_string(),
    )
}

fn classify_core(err: &CoreError) -> Classified {
    match err {
        CoreError::NotFound { entity, id } => (
            StatusCode::NOT_FOUND,
            "NOT_FOUND",
            format!("{entity} with id {id} not found"),
        ),
        CoreError::Validation(msg) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone()),
    }
}

fn classify_job(err: &JobError) -> Classified {
    match err {
        JobError::NotFound(id) => (
            StatusCode::NOT_FOUND,
            "NOT_FOUND",
            format!("Job with id {id} not found"),
        ),
        JobError::Failed { error, .. } => {
            (StatusCode::UNPROCESSABLE_ENTITY, "JOB_FAILED", error.clone())
        }
        JobError::Abandoned(_) => internal(err),
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AppError::Core(core) => classify_core(core),
            AppError::Job(job) => classify_job(job),
            AppError::Stream(StreamError::NotFound(id)) => (
                StatusCode::NOT_FOUND,
                "NOT_FOUND",
                format!("Job with id {id} not found"),
            ),

            // --- Pipeline session ---
            AppError::Session(session) => match session {
                SessionError::GuardRejected { .. } => {
                    (StatusCode::CONFLICT, "CONFLICT", session.to_string())
                }
                SessionError::MissingInput(msg) => {
                    (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone())
                }
                SessionError::Job(job) => classify_job(job),
                SessionError::Closed(_) => unavailable(),
                SessionError::InvalidResult(_) => internal(session),
            },
            AppError::Orchestrator(_) => unavailable(),

            // --- HTTP-specific errors ---
            AppError::InternalError(msg) => internal(msg),
        };

        let body = json!({
            "error": message,
            "code": code,
        });

        (status, axum::Json(body)).into_response()
    }
}
