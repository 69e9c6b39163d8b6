//! Integration tests for `GET /api/v1/jobs/{id}/events`.

mod common;

use avstudio_backends::testing::ScriptedBackend;
use avstudio_core::job::{JobPatch, JobType};
use axum::http::StatusCode;
use common::{body_text, get, parse_sse};
use serde_json::json;

#[tokio::test]
async fn finished_job_replays_and_closes() {
    let (app, state) = common::build_test_app(ScriptedBackend::new());
    let job = state
        .jobs
        .run_and_await(JobType::Script, json!({"idea": "rain"}))
        .await
        .unwrap();

    let response = get(&app, &format!("/api/v1/jobs/{}/events", job.id)).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()["content-type"].to_str().unwrap(),
        "text/event-stream"
    );
    assert_eq!(response.headers()["x-accel-buffering"], "no");

    let frames = parse_sse(&body_text(response).await);
    let names: Vec<&str> = frames.iter().map(|f| f.event.as_str()).collect();
    assert_eq!(names, vec!["connected", "status", "completed"]);
    assert_eq!(frames[0].data["currentStatus"], "completed");
    assert_eq!(frames[1].data["message"], "Job completed!");
    assert!(frames[2].data["result"]["script"].is_string());
}

#[tokio::test]
async fn failing_job_stream_ends_with_error() {
    let (app, state) = common::build_test_app(ScriptedBackend::new());
    let job = state.jobs.create_job(JobType::Audio, json!({}));

    let response = get(&app, &format!("/api/v1/jobs/{}/events", job.id)).await;
    let frames = parse_sse(&body_text(response).await);

    assert_eq!(frames.first().unwrap().event, "connected");
    let last = frames.last().unwrap();
    assert_eq!(last.event, "completed");
    assert_eq!(last.data["error"], "Script is required");
    assert_eq!(state.jobs.subscriber_count(&job.id), 0);

    // Updates after the terminal state are ignored.
    state.jobs.update_job(&job.id, JobPatch::processing(50));
    assert!(state.jobs.get_job(&job.id).unwrap().is_terminal());
}

#[tokio::test]
async fn unknown_job_stream_returns_404() {
    let (app, _) = common::build_test_app(ScriptedBackend::new());
    let response = get(&app, "/api/v1/jobs/job_video_missing/events").await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
