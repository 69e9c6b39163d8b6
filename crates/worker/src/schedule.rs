use std::time::Duration;

use avstudio_core::job::{JobPatch, INITIAL_PROCESSING_PROGRESS};
use avstudio_events::JobStore;

/// Progress milestones used when no demo schedule applies.
pub(crate) const DEFAULT_STEPS: [u8; 5] = [20, 40, 60, 80, 90];

/// Reports progress for one job.
pub(crate) struct Reporter<'a> {
    store: &'a JobStore,
    job_id: &'a str,
}

impl<'a> Reporter<'a> {
    pub(crate) fn new(store: &'a JobStore, job_id: &'a str) -> Self {
        Self { store, job_id }
    }

    pub(crate) fn job_id(&self) -> &str {
        self.job_id
    }

    pub(crate) fn start(&self) {
        self.store
            .update_job(self.job_id, JobPatch::processing(INITIAL_PROCESSING_PROGRESS));
    }

    /// Walk `steps`, pausing `interval` before each one.
    pub(crate) async fn walk(&self, steps: &[u8], interval: Duration) {
        for &progress in steps {
            pause(interval).await;
            self.store.update_job(self.job_id, JobPatch::progress(progress));
        }
    }

    pub(crate) fn complete(&self, result: serde_json::Value) {
        self.store.update_job(self.job_id, JobPatch::completed(result));
    }

    pub(crate) fn fail(&self, error: &str) {
        self.store.update_job(self.job_id, JobPatch::failed(error));
    }
}

pub(crate) async fn pause(interval: Duration) {
    if interval.is_zero() {
        tokio::task::yield_now().await;
    } else {
        tokio::time::sleep(interval).await;
    }
}
