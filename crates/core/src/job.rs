//! Job records and the status rules every job obeys.
//!
//! A [`Job`] moves `queued -> processing -> {completed, failed}`. The
//! helpers here are pure; the job store in `avstudio-events` is the only
//! component that applies them to live records.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::types::{JobId, Timestamp};

// ---------------------------------------------------------------------------
// Job type
// ---------------------------------------------------------------------------

/// The pipeline stage a job produces an artifact for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobType {
    Script,
    Audio,
    Video,
}

impl JobType {
    pub const ALL: [JobType; 3] = [JobType::Script, JobType::Audio, JobType::Video];

    pub fn as_str(self) -> &'static str {
        match self {
            JobType::Script => "script",
            JobType::Audio => "audio",
            JobType::Video => "video",
        }
    }
}

impl fmt::Display for JobType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for JobType {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        JobType::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| {
                CoreError::Validation(format!(
                    "Invalid job type '{s}'. Must be one of: script, audio, video"
                ))
            })
    }
}

// ---------------------------------------------------------------------------
// Job status
// ---------------------------------------------------------------------------

/// Lifecycle status of a job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Queued,
    Processing,
    Completed,
    Failed,
}

impl JobStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            JobStatus::Queued => "queued",
            JobStatus::Processing => "processing",
            JobStatus::Completed => "completed",
            JobStatus::Failed => "failed",
        }
    }

    /// `completed` and `failed` have no outgoing transitions.
    pub fn is_terminal(self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Failed)
    }

    /// Whether a job currently in `self` may move to `next`.
    ///
    /// Staying in the same non-terminal status is allowed (progress-only
    /// updates). `queued -> failed` covers input rejected before any work
    /// started.
    pub fn can_transition_to(self, next: JobStatus) -> bool {
        use JobStatus::*;
        match (self, next) {
            (Queued, Queued) | (Processing, Processing) => true,
            (Queued, Processing | Failed) => true,
            (Processing, Completed | Failed) => true,
            _ => false,
        }
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Progress bounds
// ---------------------------------------------------------------------------

/// Progress reported while accepted but not yet producing output.
pub const INITIAL_PROCESSING_PROGRESS: u8 = 10;

/// Progress value reserved for `completed`.
pub const COMPLETE_PROGRESS: u8 = 100;

/// Highest progress a non-completed job may report.
pub const MAX_PENDING_PROGRESS: u8 = COMPLETE_PROGRESS - 1;

// ---------------------------------------------------------------------------
// Job record
// ---------------------------------------------------------------------------

/// A tracked asynchronous unit of work.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Job {
    pub id: JobId,
    #[serde(rename = "type")]
    pub job_type: JobType,
    pub status: JobStatus,
    pub progress: u8,
    pub input: serde_json::Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Job {
    /// Build a freshly queued job with a new unique id.
    pub fn new(job_type: JobType, input: serde_json::Value) -> Self {
        let now = chrono::Utc::now();
        Self {
            id: new_job_id(job_type),
            job_type,
            status: JobStatus::Queued,
            progress: 0,
            input,
            result: None,
            error: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    /// Merge `patch` into this record following the lifecycle rules.
    ///
    /// Returns the parts of the patch that were rejected so the caller can
    /// log them. A terminal record is never modified, and a patch carrying
    /// an illegal status transition is dropped whole.
    pub fn apply(&mut self, patch: JobPatch, now: Timestamp) -> PatchOutcome {
        let mut outcome = PatchOutcome::default();
        if self.is_terminal() {
            outcome.rejected_terminal = true;
            return outcome;
        }

        if let Some(next) = patch.status {
            if !self.status.can_transition_to(next) {
                outcome.rejected_status = Some(next);
                return outcome;
            }
            self.status = next;
        }

        if let Some(progress) = patch.progress {
            if progress >= self.progress {
                self.progress = progress;
            } else {
                outcome.rejected_progress = Some(progress);
            }
        }

        match self.status {
            JobStatus::Completed => {
                self.progress = COMPLETE_PROGRESS;
                if let Some(result) = patch.result {
                    self.result = Some(result);
                }
            }
            JobStatus::Failed => {
                self.progress = self.progress.min(MAX_PENDING_PROGRESS);
                self.error = Some(
                    patch
                        .error
                        .unwrap_or_else(|| "Job failed without an error message".to_string()),
                );
            }
            JobStatus::Queued | JobStatus::Processing => {
                self.progress = self.progress.min(MAX_PENDING_PROGRESS);
            }
        }

        self.updated_at = now;
        outcome
    }
}

/// Generate a unique, time-ordered job id, e.g. `job_script_0190f2...`.
pub fn new_job_id(job_type: JobType) -> JobId {
    format!("job_{job_type}_{}", uuid::Uuid::now_v7().simple())
}

// ---------------------------------------------------------------------------
// Patch
// ---------------------------------------------------------------------------

/// A partial update to a job. `None` fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct JobPatch {
    pub status: Option<JobStatus>,
    pub progress: Option<u8>,
    pub result: Option<serde_json::Value>,
    pub error: Option<String>,
}

impl JobPatch {
    /// Move to `processing` with the given progress.
    pub fn processing(progress: u8) -> Self {
        Self {
            status: Some(JobStatus::Processing),
            progress: Some(progress),
            ..Self::default()
        }
    }

    /// Progress-only update.
    pub fn progress(progress: u8) -> Self {
        Self {
            progress: Some(progress),
            ..Self::default()
        }
    }

    /// Terminal success: status, full progress and result in one update.
    pub fn completed(result: serde_json::Value) -> Self {
        Self {
            status: Some(JobStatus::Completed),
            progress: Some(COMPLETE_PROGRESS),
            result: Some(result),
            error: None,
        }
    }

    /// Terminal failure with a descriptive error.
    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            status: Some(JobStatus::Failed),
            error: Some(error.into()),
            ..Self::default()
        }
    }
}

/// What [`Job::apply`] refused to change.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PatchOutcome {
    pub rejected_terminal: bool,
    pub rejected_status: Option<JobStatus>,
    pub rejected_progress: Option<u8>,
}

impl PatchOutcome {
    /// Whether the record was left exactly as it was.
    pub fn unchanged(&self) -> bool {
        self.rejected_terminal || self.rejected_status.is_some()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
