//! One module per job type. Each strategy validates its input, reports
//! progress through a [`Reporter`](crate::schedule::Reporter) and returns
//! the result payload or a [`Failure`] message.

pub(crate) mod audio;
pub(crate) mod script;
pub(crate) mod video;

use avstudio_backends::BackendError;
use avstudio_core::error::CoreError;
use avstudio_core::job::JobType;
use avstudio_core::payload::Fallback;
use serde::de::DeserializeOwned;
use serde::Serialize;

/// Why a job ends in `failed`. The message is stored verbatim as the
/// job's `error`.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{0}")]
pub(crate) struct Failure(pub(crate) String);

impl Failure {
    pub(crate) fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

impl From<CoreError> for Failure {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::Validation(message) => Self(message),
            other => Self(other.to_string()),
        }
    }
}

/// Decode a job input, treating `null` as an empty object.
pub(crate) fn parse_input<T: DeserializeOwned + Default>(
    input: &serde_json::Value,
) -> Result<T, Failure> {
    if input.is_null() {
        return Ok(T::default());
    }
    serde_json::from_value(input.clone())
        .map_err(|e| Failure::new(format!("Invalid job input: {e}")))
}

/// Drop blank strings.
pub(crate) fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

pub(crate) fn to_result<T: Serialize>(result: &T) -> Result<serde_json::Value, Failure> {
    serde_json::to_value(result)
        .map_err(|e| Failure::new(format!("Failed to encode job result: {e}")))
}

/// Log a backend failure and build the matching fallback marker.
pub(crate) fn fallback_for(job_id: &str, job_type: JobType, error: &BackendError) -> Fallback {
    if error.is_not_configured() {
        tracing::debug!(job_id = %job_id, job_type = %job_type, "Backend not configured, using fallback artifact");
    } else {
        tracing::warn!(job_id = %job_id, job_type = %job_type, error = %error, "Backend call failed, using fallback artifact");
    }
    Fallback::because(error.to_string())
}
