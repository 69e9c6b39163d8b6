//! Feeds a video job's progress back into the orchestrator.

use avstudio_core::job::{JobStatus, COMPLETE_PROGRESS};
use avstudio_events::{JobStore, JobStream, StreamEvent};
use tokio_util::sync::CancellationToken;

use crate::machine::{PipelineEvent, VIDEO_FAILED_MESSAGE, VIDEO_READY_MESSAGE};
use crate::orchestrator::OrchestratorHandle;

/// Follow `job_id` until its `completed` event or until `cancel` fires.
///
/// Cancellation only stops dispatching. The job keeps running.
pub async fn track_video_job(
    store: JobStore,
    orchestrator: OrchestratorHandle,
    job_id: String,
    cancel: CancellationToken,
) {
    let mut stream = match JobStream::open(&store, &job_id) {
        Ok(stream) => stream,
        Err(e) => {
            tracing::warn!(job_id = %job_id, error = %e, "Unable to follow video job");
            let _ = orchestrator.dispatch(PipelineEvent::VideoJobStatus {
                job_id,
                status: JobStatus::Failed,
                progress: 0,
                message: Some(e.to_string()),
            });
            return;
        }
    };

    let mut last_progress = 0;
    loop {
        let event = tokio::select! {
            _ = cancel.cancelled() => {
                tracing::debug!(job_id = %job_id, "Video job tracking superseded");
                stream.close();
                return;
            }
            event = stream.next_event() => event,
        };
        let Some(event) = event else { return };

        let dispatched = match event {
            StreamEvent::Connected(_) => Ok(()),
            StreamEvent::Status(status) => {
                last_progress = status.progress;
                if status.state.is_terminal() {
                    Ok(())
                } else {
                    orchestrator.dispatch(PipelineEvent::VideoJobStatus {
                        job_id: job_id.clone(),
                        status: status.state,
                        progress: status.progress,
                        message: Some(status.message),
                    })
                }
            }
            StreamEvent::Completed(done) => {
                finish(&orchestrator, &job_id, last_progress, done.result, done.error);
                return;
            }
        };
        if dispatched.is_err() {
            tracing::debug!(job_id = %job_id, "Orchestrator stopped; video job tracking ends");
            stream.close();
            return;
        }
    }
}

fn finish(
    orchestrator: &OrchestratorHandle,
    job_id: &str,
    last_progress: u8,
    result: Option<serde_json::Value>,
    error: Option<String>,
) {
    let result_field = |key: &str| {
        result
            .as_ref()
            .and_then(|r| r.get(key))
            .and_then(|v| v.as_str())
            .map(str::to_string)
    };

    if let Some(error) = error {
        let _ = orchestrator.dispatch(PipelineEvent::VideoJobStatus {
            job_id: job_id.to_string(),
            status: JobStatus::Failed,
            progress: last_progress,
            message: Some(if error.is_empty() {
                VIDEO_FAILED_MESSAGE.to_string()
            } else {
                error
            }),
        });
        return;
    }

    let _ = orchestrator.dispatch(PipelineEvent::VideoJobStatus {
        job_id: job_id.to_string(),
        status: JobStatus::Completed,
        progress: COMPLETE_PROGRESS,
        message: Some(result_field("message").unwrap_or_else(|| VIDEO_READY_MESSAGE.to_string())),
    });
    if let Some(video_url) = result_field("videoUrl") {
        let _ = orchestrator.dispatch(PipelineEvent::VideoReady { video_url });
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use super::*;
    use crate::machine::{PipelineStep, VideoJobStatus};
    use crate::orchestrator::Orchestrator;
    use avstudio_core::job::{Job, JobPatch, JobType};
    use avstudio_events::JobExecutor;
    use serde_json::json;

    struct IdleExecutor;

    #[async_trait::async_trait]
    impl JobExecutor for IdleExecutor {
        async fn execute(&self, _store: JobStore, _job: Job) {
            std::future::pending::<()>().await;
        }
    }

    /// Orchestrator parked in `videoGenerating`.
    async fn generating() -> OrchestratorHandle {
        let (handle, _task) = Orchestrator::spawn(CancellationToken::new());
        let events = [
            PipelineEvent::SetIdea { idea: "x".into() },
            PipelineEvent::EditScript {
                script: "Script.".into(),
            },
            PipelineEvent::ConfirmScript,
            PipelineEvent::GenerateAudio,
            PipelineEvent::AudioReady {
                audio_url: "/a.wav".into(),
                audio_path: None,
                job_id: None,
            },
            PipelineEvent::ConfirmAudio,
            PipelineEvent::GenerateVideo,
        ];
        for event in events {
            handle.dispatch_and_wait(event).await.unwrap();
        }
        assert_eq!(handle.snapshot().step, PipelineStep::VideoGenerating);
        handle
    }

    async fn settle(handle: &OrchestratorHandle) {
        // A rejected round trip drains everything queued before it.
        handle
            .dispatch_and_wait(PipelineEvent::GoBackToStep {
                step: PipelineStep::Idle,
            })
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn completed_job_drives_pipeline_to_video_ready() {
        let store = JobStore::new(Arc::new(IdleExecutor));
        let handle = generating().await;
        let job = store.create_job(JobType::Video, json!({}));

        let tracker = tokio::spawn(track_video_job(
            store.clone(),
            handle.clone(),
            job.id.clone(),
            CancellationToken::new(),
        ));
        tokio::task::yield_now().await;
        store.update_job(&job.id, JobPatch::processing(40));
        store.update_job(
            &job.id,
            JobPatch::completed(json!({"videoUrl": "/v.mp4", "message": "Video ready."})),
        );
        tracker.await.unwrap();
        settle(&handle).await;

        let snapshot = handle.snapshot();
        assert_eq!(snapshot.step, PipelineStep::VideoReady);
        assert_eq!(snapshot.context.video_url.as_deref(), Some("/v.mp4"));
        assert_eq!(snapshot.context.job_ids.video.as_deref(), Some(job.id.as_str()));
        assert_eq!(snapshot.context.video_job.progress, 100);
    }

    #[tokio::test]
    async fn failed_job_returns_pipeline_to_audio_ready() {
        let store = JobStore::new(Arc::new(IdleExecutor));
        let handle = generating().await;
        let job = store.create_job(JobType::Video, json!({}));
        store.update_job(&job.id, JobPatch::failed("Renderer crashed"));

        track_video_job(store, handle.clone(), job.id, CancellationToken::new()).await;
        settle(&handle).await;

        let snapshot = handle.snapshot();
        assert_eq!(snapshot.step, PipelineStep::AudioReady);
        assert!(snapshot.context.stale_flags.video);
        assert_eq!(snapshot.context.video_job.status, VideoJobStatus::Failed);
        assert_eq!(
            snapshot.context.video_job.message.as_deref(),
            Some("Renderer crashed")
        );
    }

    #[tokio::test]
    async fn unknown_job_reports_failure() {
        let store = JobStore::new(Arc::new(IdleExecutor));
        let handle = generating().await;

        track_video_job(store, handle.clone(), "job_video_missing".into(), CancellationToken::new())
            .await;
        settle(&handle).await;

        assert_eq!(handle.snapshot().step, PipelineStep::AudioReady);
    }

    #[tokio::test]
    async fn cancelled_tracker_stops_dispatching_and_releases_stream() {
        let store = JobStore::new(Arc::new(IdleExecutor));
        let handle = generating().await;
        let job = store.create_job(JobType::Video, json!({}));
        let cancel = CancellationToken::new();

        let tracker = tokio::spawn(track_video_job(
            store.clone(),
            handle.clone(),
            job.id.clone(),
            cancel.clone(),
        ));
        tokio::time::timeout(Duration::from_secs(1), async {
            while store.subscriber_count(&job.id) == 0 {
                tokio::task::yield_now().await;
            }
        })
        .await
        .unwrap();

        cancel.cancel();
        tracker.await.unwrap();
        store.update_job(&job.id, JobPatch::failed("late"));
        settle(&handle).await;

        assert_eq!(store.subscriber_count(&job.id), 0);
        assert_eq!(handle.snapshot().step, PipelineStep::VideoGenerating);
    }
}
