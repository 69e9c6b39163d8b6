//! Replay-then-follow event stream for a single job.
//!
//! [`JobStream`] is transport-agnostic: it yields [`StreamEvent`]s that the
//! HTTP layer renders as Server-Sent Events. The first event is always
//! `connected`; the stream ends right after the `completed` event.

use std::collections::VecDeque;

use avstudio_core::job::{Job, JobStatus, JobType};
use avstudio_core::types::JobId;
use futures::Stream;
use serde::Serialize;

use crate::bus::Subscription;
use crate::progress::progress_message;
use crate::store::JobStore;

/// Errors raised while opening a stream.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StreamError {
    #[error("Job {0} not found")]
    NotFound(JobId),
}

// ---------------------------------------------------------------------------
// Events
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectedPayload {
    pub job_id: JobId,
    pub current_status: JobStatus,
    pub progress: u8,
    pub timestamp: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusPayload {
    pub job_id: JobId,
    pub state: JobStatus,
    pub progress: u8,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub timestamp: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompletedPayload {
    pub job_id: JobId,
    pub result: Option<serde_json::Value>,
    pub error: Option<String>,
    pub timestamp: i64,
}

/// One event on a job stream.
#[derive(Debug, Clone, PartialEq)]
pub enum StreamEvent {
    Connected(ConnectedPayload),
    Status(StatusPayload),
    Completed(CompletedPayload),
}

impl StreamEvent {
    /// Wire name of the event.
    pub fn name(&self) -> &'static str {
        match self {
            StreamEvent::Connected(_) => "connected",
            StreamEvent::Status(_) => "status",
            StreamEvent::Completed(_) => "completed",
        }
    }

    /// JSON payload of the event.
    pub fn data(&self) -> serde_json::Value {
        let value = match self {
            StreamEvent::Connected(p) => serde_json::to_value(p),
            StreamEvent::Status(p) => serde_json::to_value(p),
            StreamEvent::Completed(p) => serde_json::to_value(p),
        };
        value.unwrap_or(serde_json::Value::Null)
    }

    pub fn is_completed(&self) -> bool {
        matches!(self, StreamEvent::Completed(_))
    }
}

fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

fn connected(job: &Job) -> StreamEvent {
    StreamEvent::Connected(ConnectedPayload {
        job_id: job.id.clone(),
        current_status: job.status,
        progress: job.progress,
        timestamp: now_millis(),
    })
}

fn status(job: &Job, message: String) -> StreamEvent {
    StreamEvent::Status(StatusPayload {
        job_id: job.id.clone(),
        state: job.status,
        progress: job.progress,
        message,
        result: job.result.clone(),
        error: job.error.clone(),
        timestamp: now_millis(),
    })
}

fn completed(job: &Job) -> StreamEvent {
    StreamEvent::Completed(CompletedPayload {
        job_id: job.id.clone(),
        result: job.result.clone(),
        error: job.error.clone(),
        timestamp: now_millis(),
    })
}

// ---------------------------------------------------------------------------
// JobStream
// ---------------------------------------------------------------------------

/// Live event stream for one job.
///
/// Dropping the stream releases its subscription. The job itself keeps
/// running.
pub struct JobStream {
    job_id: JobId,
    job_type: JobType,
    pending: VecDeque<StreamEvent>,
    subscription: Option<Subscription>,
}

impl JobStream {
    /// Open a stream on `job_id`.
    ///
    /// For a job that is already terminal the stream is fully buffered
    /// (`connected`, `status`, `completed`) and holds no subscription.
    pub fn open(store: &JobStore, job_id: &str) -> Result<Self, StreamError> {
        let (job, subscription) = store
            .watch(job_id)
            .ok_or_else(|| StreamError::NotFound(job_id.to_string()))?;

        let mut pending = VecDeque::with_capacity(3);
        pending.push_back(connected(&job));

        if job.is_terminal() {
            let message = match job.status {
                JobStatus::Completed => "Job completed!",
                _ => "Job failed",
            };
            pending.push_back(status(&job, message.to_string()));
            pending.push_back(completed(&job));
        }

        tracing::debug!(job_id = %job.id, status = %job.status, "Job stream opened");
        Ok(Self {
            job_id: job.id,
            job_type: job.job_type,
            pending,
            subscription,
        })
    }

    pub fn job_id(&self) -> &str {
        &self.job_id
    }

    /// Next event, or `None` once the stream has ended.
    pub async fn next_event(&mut self) -> Option<StreamEvent> {
        loop {
            if let Some(event) = self.pending.pop_front() {
                return Some(event);
            }
            let subscription = self.subscription.as_mut()?;
            match subscription.recv().await {
                Some(job) => self.push_update(&job),
                None => {
                    self.release();
                    return None;
                }
            }
        }
    }

    fn push_update(&mut self, job: &Job) {
        let message = progress_message(job.status, job.progress, self.job_type);
        self.pending.push_back(status(job, message.to_string()));
        if job.is_terminal() {
            self.pending.push_back(completed(job));
            self.release();
        }
    }

    fn release(&mut self) {
        if let Some(mut subscription) = self.subscription.take() {
            subscription.unsubscribe();
            tracing::debug!(job_id = %self.job_id, "Job stream released subscription");
        }
    }

    /// End the stream now. Safe to call more than once.
    pub fn close(&mut self) {
        self.release();
        self.pending.clear();
    }

    /// Adapt into a [`Stream`] of events.
    pub fn into_stream(self) -> impl Stream<Item = StreamEvent> + Send {
        futures::stream::unfold(self, |mut stream| async move {
            let event = stream.next_event().await?;
            Some((event, stream))
        })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
