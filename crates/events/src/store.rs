//! In-memory job store.
//!
//! [`JobStore`] owns every job record. All mutation goes through
//! [`JobStore::update_job`], which applies the lifecycle rules from
//! [`avstudio_core::job`], stamps `updated_at`, and notifies subscribers
//! inside one critical section. Records are never evicted.

use std::collections::HashMap;
use std::sync::Arc;

use avstudio_core::job::{Job, JobPatch, JobStatus, JobType};
use avstudio_core::types::JobId;
use parking_lot::Mutex;
use tokio::sync::mpsc;

use crate::bus::{SubscriberSet, Subscription};

// ---------------------------------------------------------------------------
// Executor seam
// ---------------------------------------------------------------------------

/// Drives a freshly created job to a terminal state.
///
/// The store spawns [`JobExecutor::execute`] on its own task for every
/// job it creates; the executor reports progress back through
/// [`JobStore::update_job`].
#[async_trait::async_trait]
pub trait JobExecutor: Send + Sync + 'static {
    async fn execute(&self, store: JobStore, job: Job);
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors observed by callers waiting on a job.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum JobError {
    #[error("Job {0} not found")]
    NotFound(JobId),

    #[error("Job {id} failed: {error}")]
    Failed { id: JobId, error: String },

    #[error("Job {0} stopped reporting before reaching a terminal state")]
    Abandoned(JobId),
}

// ---------------------------------------------------------------------------
// Store
// ---------------------------------------------------------------------------

/// Job table and subscriber sets, guarded together by one lock.
#[derive(Default)]
pub(crate) struct StoreState {
    pub(crate) jobs: HashMap<JobId, Job>,
    pub(crate) subscribers: SubscriberSet,
}

/// Shared, cheaply cloneable handle to the job table.
#[derive(Clone)]
pub struct JobStore {
    state: Arc<Mutex<StoreState>>,
    executor: Arc<dyn JobExecutor>,
}

impl JobStore {
    pub fn new(executor: Arc<dyn JobExecutor>) -> Self {
        Self {
            state: Arc::new(Mutex::new(StoreState::default())),
            executor,
        }
    }

    /// Create a queued job and hand it to the executor.
    ///
    /// Returns immediately with the queued record; the job may already
    /// have progressed by the time the caller looks at it again. Must be
    /// called from within a Tokio runtime.
    pub fn create_job(&self, job_type: JobType, input: serde_json::Value) -> Job {
        let job = Job::new(job_type, input);
        {
            let mut state = self.state.lock();
            state.jobs.insert(job.id.clone(), job.clone());
            state.subscribers.notify(&job);
        }
        tracing::info!(job_id = %job.id, job_type = %job_type, "Job created");

        self.spawn_executor(job.clone());
        job
    }

    /// Run the executor on its own task and make sure the job ends up
    /// terminal even if the executor returns early or panics.
    fn spawn_executor(&self, job: Job) {
        let executor = Arc::clone(&self.executor);
        let store = self.clone();
        tokio::spawn(async move {
            let job_id = job.id.clone();
            let runner_store = store.clone();
            let run = tokio::spawn(async move { executor.execute(runner_store, job).await });

            if let Err(e) = run.await {
                tracing::error!(job_id = %job_id, error = %e, "Job executor task aborted");
            }

            let stranded = store.get_job(&job_id).is_some_and(|j| !j.is_terminal());
            if stranded {
                tracing::error!(job_id = %job_id, "Job executor exited without a terminal status");
                store.update_job(
                    &job_id,
                    JobPatch::failed("Job executor stopped before the job finished"),
                );
            }
        });
    }

    /// Look up a job by id.
    pub fn get_job(&self, id: &str) -> Option<Job> {
        self.state.lock().jobs.get(id).cloned()
    }

    /// Merge `patch` into the job and notify its subscribers.
    ///
    /// Returns `None` for an unknown id. A terminal job, or a patch with an
    /// illegal status transition, returns the record unchanged and nobody
    /// is notified.
    pub fn update_job(&self, id: &str, patch: JobPatch) -> Option<Job> {
        let mut guard = self.state.lock();
        let StoreState { jobs, subscribers } = &mut *guard;
        let job = jobs.get_mut(id)?;

        let outcome = job.apply(patch, chrono::Utc::now());
        if outcome.rejected_terminal {
            tracing::warn!(job_id = %id, status = %job.status, "Ignoring update to terminal job");
        }
        if let Some(status) = outcome.rejected_status {
            tracing::warn!(
                job_id = %id,
                from = %job.status,
                to = %status,
                "Ignoring illegal job status transition",
            );
        }
        if outcome.unchanged() {
            return Some(job.clone());
        }
        if let Some(progress) = outcome.rejected_progress {
            tracing::debug!(
                job_id = %id,
                current = job.progress,
                requested = progress,
                "Ignoring decreasing job progress",
            );
        }

        let snapshot = job.clone();
        let delivered = subscribers.notify(&snapshot);
        drop(guard);

        tracing::debug!(
            job_id = %id,
            status = %snapshot.status,
            progress = snapshot.progress,
            subscribers = delivered,
            "Job updated",
        );
        if snapshot.is_terminal() {
            tracing::info!(job_id = %id, status = %snapshot.status, "Job finished");
        }
        Some(snapshot)
    }

    /// Subscribe to future updates of a job.
    ///
    /// Returns `None` for an unknown id. For an already-terminal job the
    /// subscription yields the terminal record once and then ends.
    pub fn subscribe(&self, id: &str) -> Option<Subscription> {
        let mut state = self.state.lock();
        let job = state.jobs.get(id)?;
        if job.is_terminal() {
            let (sender, receiver) = mpsc::unbounded_channel();
            let _ = sender.send(job.clone());
            return Some(Subscription::detached(id, receiver));
        }
        let (sub_id, receiver) = state.subscribers.register(id);
        Some(Subscription::registered(
            id,
            sub_id,
            receiver,
            Arc::downgrade(&self.state),
        ))
    }

    /// Snapshot a job and subscribe to what happens next, atomically.
    ///
    /// No subscription is created when the job is already terminal.
    pub fn watch(&self, id: &str) -> Option<(Job, Option<Subscription>)> {
        let mut state = self.state.lock();
        let job = state.jobs.get(id)?.clone();
        if job.is_terminal() {
            return Some((job, None));
        }
        let (sub_id, receiver) = state.subscribers.register(id);
        let subscription =
            Subscription::registered(id, sub_id, receiver, Arc::downgrade(&self.state));
        Some((job, Some(subscription)))
    }

    /// Wait until the job reaches a terminal state.
    ///
    /// Resolves with the completed record, or an error if the job failed.
    pub async fn await_completion(&self, id: &str) -> Result<Job, JobError> {
        let mut subscription = self
            .subscribe(id)
            .ok_or_else(|| JobError::NotFound(id.to_string()))?;

        while let Some(job) = subscription.recv().await {
            match job.status {
                JobStatus::Completed => return Ok(job),
                JobStatus::Failed => {
                    return Err(JobError::Failed {
                        id: job.id,
                        error: job.error.unwrap_or_default(),
                    })
                }
                JobStatus::Queued | JobStatus::Processing => {}
            }
        }
        Err(JobError::Abandoned(id.to_string()))
    }

    /// Create a job and wait for it to finish.
    pub async fn run_and_await(
        &self,
        job_type: JobType,
        input: serde_json::Value,
    ) -> Result<Job, JobError> {
        let job = self.create_job(job_type, input);
        self.await_completion(&job.id).await
    }

    /// Number of live subscribers for a job.
    pub fn subscriber_count(&self, id: &str) -> usize {
        self.state.lock().subscribers.count(id)
    }

    /// Total number of jobs ever created.
    pub fn job_count(&self) -> usize {
        self.state.lock().jobs.len()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use serde_json::json;

    /// Leaves every job untouched so tests drive updates by hand.
    struct IdleExecutor;

    #[async_trait::async_trait]
    impl JobExecutor for IdleExecutor {
        async fn execute(&self, _store: JobStore, _job: Job) {
            std::future::pending::<()>().await;
        }
    }

    /// Walks a job through a fixed schedule without delays.
    struct StepExecutor;

    #[async_trait::async_trait]
    impl JobExecutor for StepExecutor {
        async fn execute(&self, store: JobStore, job: Job) {
            store.update_job(&job.id, JobPatch::processing(10));
            for progress in [30, 60, 90] {
                tokio::task::yield_now().await;
                store.update_job(&job.id, JobPatch::progress(progress));
            }
            store.update_job(&job.id, JobPatch::completed(json!({"done": true})));
        }
    }

    /// Returns without finishing the job.
    struct QuitterExecutor;

    #[async_trait::async_trait]
    impl JobExecutor for QuitterExecutor {
        async fn execute(&self, store: JobStore, job: Job) {
            store.update_job(&job.id, JobPatch::processing(10));
        }
    }

    fn idle_store() -> JobStore {
        JobStore::new(Arc::new(IdleExecutor))
    }

    #[tokio::test]
    async fn create_job_returns_queued_record() {
        let store = idle_store();
        let job = store.create_job(JobType::Script, json!({"idea": "tides"}));

        assert_eq!(job.status, JobStatus::Queued);
        assert_eq!(job.progress, 0);
        assert_eq!(store.get_job(&job.id), Some(job));
        assert_eq!(store.job_count(), 1);
    }

    #[tokio::test]
    async fn update_unknown_job_returns_none() {
        let store = idle_store();
        assert!(store.update_job("job_missing", JobPatch::progress(10)).is_none());
        assert!(store.subscribe("job_missing").is_none());
        assert!(store.watch("job_missing").is_none());
    }

    #[tokio::test]
    async fn update_refreshes_updated_at() {
        let store = idle_store();
        let job = store.create_job(JobType::Audio, json!({}));
        tokio::time::sleep(std::time::Duration::from_millis(2)).await;

        let updated = store.update_job(&job.id, JobPatch::processing(10)).unwrap();
        assert!(updated.updated_at > job.updated_at);
        assert_eq!(updated.created_at, job.created_at);
    }

    #[tokio::test]
    async fn subscriber_sees_updates_in_order_including_terminal() {
        let store = idle_store();
        let job = store.create_job(JobType::Video, json!({}));
        let mut sub = store.subscribe(&job.id).unwrap();

        store.update_job(&job.id, JobPatch::processing(10));
        store.update_job(&job.id, JobPatch::progress(50));
        store.update_job(&job.id, JobPatch::completed(json!({"videoUrl": "/v.mp4"})));

        let seen: Vec<(JobStatus, u8)> = [
            sub.recv().await.unwrap(),
            sub.recv().await.unwrap(),
            sub.recv().await.unwrap(),
        ]
        .iter()
        .map(|j| (j.status, j.progress))
        .collect();

        assert_eq!(
            seen,
            vec![
                (JobStatus::Processing, 10),
                (JobStatus::Processing, 50),
                (JobStatus::Completed, 100),
            ]
        );
        assert!(sub.recv().await.is_none());
    }

    #[tokio::test]
    async fn terminal_job_accepts_no_further_updates() {
        let store = idle_store();
        let job = store.create_job(JobType::Audio, json!({}));
        store.update_job(&job.id, JobPatch::failed("Script is required"));

        let after = store
            .update_job(&job.id, JobPatch::completed(json!({})))
            .unwrap();

        assert_eq!(after.status, JobStatus::Failed);
        assert!(after.result.is_none());
        assert_eq!(after.error.as_deref(), Some("Script is required"));
    }

    #[tokio::test]
    async fn queued_job_cannot_skip_straight_to_completed() {
        let store = idle_store();
        let job = store.create_job(JobType::Script, json!({}));
        let mut sub = store.subscribe(&job.id).unwrap();

        let after = store
            .update_job(&job.id, JobPatch::completed(json!({"script": "hi"})))
            .unwrap();

        assert_eq!(after.status, JobStatus::Queued);
        assert_eq!(after.progress, 0);
        assert!(after.result.is_none());
        assert!(sub.try_recv().is_none());
        assert_eq!(store.get_job(&job.id), Some(job));
    }

    #[tokio::test]
    async fn subscribing_to_terminal_job_yields_exactly_one_snapshot() {
        let store = idle_store();
        let job = store.create_job(JobType::Script, json!({}));
        store.update_job(&job.id, JobPatch::processing(10));
        store.update_job(&job.id, JobPatch::completed(json!({"script": "hi"})));

        let mut sub = store.subscribe(&job.id).unwrap();
        let first = sub.recv().await.unwrap();
        assert_eq!(first.status, JobStatus::Completed);

        // A late update attempt must not produce another notification.
        store.update_job(&job.id, JobPatch::progress(10));
        assert!(sub.recv().await.is_none());
    }

    #[tokio::test]
    async fn unsubscribe_stops_delivery_and_is_idempotent() {
        let store = idle_store();
        let job = store.create_job(JobType::Script, json!({}));
        let mut sub = store.subscribe(&job.id).unwrap();
        assert_eq!(store.subscriber_count(&job.id), 1);

        store.update_job(&job.id, JobPatch::processing(10));
        sub.unsubscribe();
        sub.unsubscribe();
        store.update_job(&job.id, JobPatch::progress(40));

        assert_eq!(store.subscriber_count(&job.id), 0);
        assert!(sub.try_recv().is_none());
        assert!(sub.recv().await.is_none());
    }

    #[tokio::test]
    async fn dropping_subscription_unregisters_it() {
        let store = idle_store();
        let job = store.create_job(JobType::Script, json!({}));
        let sub = store.subscribe(&job.id).unwrap();
        drop(sub);

        assert_eq!(store.subscriber_count(&job.id), 0);
    }

    #[tokio::test]
    async fn watch_returns_snapshot_without_subscription_for_terminal_job() {
        let store = idle_store();
        let job = store.create_job(JobType::Video, json!({}));
        store.update_job(&job.id, JobPatch::failed("no audio"));

        let (snapshot, sub) = store.watch(&job.id).unwrap();
        assert_eq!(snapshot.status, JobStatus::Failed);
        assert!(sub.is_none());
    }

    #[tokio::test]
    async fn run_and_await_resolves_with_completed_job() {
        let store = JobStore::new(Arc::new(StepExecutor));
        let job = store
            .run_and_await(JobType::Script, json!({"idea": "x"}))
            .await
            .unwrap();

        assert_eq!(job.status, JobStatus::Completed);
        assert_eq!(job.progress, 100);
        assert_eq!(job.result, Some(json!({"done": true})));
    }

    #[tokio::test]
    async fn await_completion_reports_failure() {
        let store = idle_store();
        let job = store.create_job(JobType::Audio, json!({}));
        let waiter = {
            let store = store.clone();
            let id = job.id.clone();
            tokio::spawn(async move { store.await_completion(&id).await })
        };
        tokio::task::yield_now().await;
        store.update_job(&job.id, JobPatch::failed("Voice preset is required"));

        let result = waiter.await.unwrap();
        assert_matches!(result, Err(JobError::Failed { error, .. }) if error == "Voice preset is required");
    }

    #[tokio::test]
    async fn await_completion_of_unknown_job_is_not_found() {
        let store = idle_store();
        assert_matches!(
            store.await_completion("job_nope").await,
            Err(JobError::NotFound(_))
        );
    }

    #[tokio::test]
    async fn executor_that_quits_early_leaves_job_failed() {
        let store = JobStore::new(Arc::new(QuitterExecutor));
        let job = store.create_job(JobType::Video, json!({}));

        let result = store.await_completion(&job.id).await;
        assert_matches!(result, Err(JobError::Failed { .. }));
        assert_eq!(store.get_job(&job.id).unwrap().status, JobStatus::Failed);
    }

    #[tokio::test]
    async fn progress_observed_by_subscriber_is_monotonic() {
        let store = JobStore::new(Arc::new(StepExecutor));
        let job = store.create_job(JobType::Audio, json!({}));
        let mut sub = store.subscribe(&job.id).unwrap();

        let mut last = 0;
        let mut final_status = None;
        while let Some(snapshot) = sub.recv().await {
            assert!(snapshot.progress >= last);
            assert_eq!(snapshot.progress == 100, snapshot.status == JobStatus::Completed);
            last = snapshot.progress;
            final_status = Some(snapshot.status);
        }
        assert_eq!(final_status, Some(JobStatus::Completed));
    }
}
