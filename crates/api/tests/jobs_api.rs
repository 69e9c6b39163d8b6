//! Integration tests for the `/jobs` resource.

mod common;

use avstudio_backends::testing::{Reply, ScriptedBackend};
use axum::http::StatusCode;
use common::{body_json, get, post_expect, post_json};
use serde_json::json;

#[tokio::test]
async fn create_job_returns_202_with_queued_job() {
    let (app, _) = common::build_test_app(ScriptedBackend::new());

    let json = post_expect(
        &app,
        "/api/v1/jobs",
        json!({"type": "script", "input": {"idea": "tides"}}),
        StatusCode::ACCEPTED,
    )
    .await;

    let id = json["data"]["id"].as_str().unwrap();
    assert!(id.starts_with("job_script_"));
    assert_eq!(json["data"]["status"], "queued");
    assert_eq!(json["data"]["progress"], 0);
}

#[tokio::test]
async fn get_job_returns_completed_record() {
    let (app, state) = common::build_test_app(
        ScriptedBackend::new().with_text(Reply::Ok("Moonlight on the water.".into())),
    );
    let created = post_expect(
        &app,
        "/api/v1/jobs",
        json!({"type": "script", "input": {"idea": "moon"}}),
        StatusCode::ACCEPTED,
    )
    .await;
    let id = created["data"]["id"].as_str().unwrap().to_string();
    state.jobs.await_completion(&id).await.unwrap();

    let response = get(&app, &format!("/api/v1/jobs/{id}")).await;
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    let job = &json["data"];
    assert_eq!(job["type"], "script");
    assert_eq!(job["status"], "completed");
    assert_eq!(job["progress"], 100);
    assert_eq!(job["result"]["script"], "Moonlight on the water.");
    assert!(job["createdAt"].is_string());
}

#[tokio::test]
async fn invalid_input_fails_the_job_not_the_request() {
    let (app, state) = common::build_test_app(ScriptedBackend::new());
    let created = post_expect(
        &app,
        "/api/v1/jobs",
        json!({"type": "audio", "input": {"script": "Hi."}}),
        StatusCode::ACCEPTED,
    )
    .await;
    let id = created["data"]["id"].as_str().unwrap().to_string();
    assert!(state.jobs.await_completion(&id).await.is_err());

    let json = body_json(get(&app, &format!("/api/v1/jobs/{id}")).await).await;
    assert_eq!(json["data"]["status"], "failed");
    assert_eq!(json["data"]["error"], "Voice preset is required");
}

#[tokio::test]
async fn unknown_job_returns_404() {
    let (app, _) = common::build_test_app(ScriptedBackend::new());
    let response = get(&app, "/api/v1/jobs/job_script_missing").await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let json = body_json(response).await;
    assert_eq!(json["code"], "NOT_FOUND");
}

#[tokio::test]
async fn unknown_job_type_is_rejected() {
    let (app, state) = common::build_test_app(ScriptedBackend::new());
    let response = post_json(&app, "/api/v1/jobs", json!({"type": "music", "input": {}})).await;

    assert!(response.status().is_client_error());
    assert_eq!(state.jobs.job_count(), 0);
}
