use std::sync::Arc;

use avstudio_backends::GenerationBackend;
use avstudio_core::job::{Job, JobType};
use avstudio_events::{JobExecutor, JobStore};

use crate::config::ExecutorConfig;
use crate::schedule::Reporter;
use crate::strategy;

/// Runs every job type against one generation backend.
pub struct PipelineExecutor {
    backend: Arc<dyn GenerationBackend>,
    config: ExecutorConfig,
}

impl PipelineExecutor {
    pub fn new(backend: Arc<dyn GenerationBackend>, config: ExecutorConfig) -> Self {
        Self { backend, config }
    }
}

#[async_trait::async_trait]
impl JobExecutor for PipelineExecutor {
    async fn execute(&self, store: JobStore, job: Job) {
        let reporter = Reporter::new(&store, &job.id);
        let backend = self.backend.as_ref();
        tracing::debug!(job_id = %job.id, job_type = %job.job_type, "Executing job");

        let outcome = match job.job_type {
            JobType::Script => strategy::script::run(backend, &self.config, &reporter, &job.input).await,
            JobType::Audio => strategy::audio::run(backend, &self.config, &reporter, &job.input).await,
            JobType::Video => strategy::video::run(backend, &self.config, &reporter, &job.input).await,
        };

        match outcome {
            Ok(result) => reporter.complete(result),
            Err(failure) => {
                tracing::warn!(
                    job_id = %job.id,
                    job_type = %job.job_type,
                    error = %failure,
                    "Job rejected",
                );
                reporter.fail(&failure.0);
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
