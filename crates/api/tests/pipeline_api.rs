//! Integration tests for the `/pipeline` resource.

mod common;

use std::time::Duration;

use avstudio_backends::testing::{Reply, ScriptedBackend};
use avstudio_pipeline::PipelineStep;
use axum::http::StatusCode;
use common::{body_json, get, post_expect};
use serde_json::json;

async fn state_json(app: &axum::Router) -> serde_json::Value {
    body_json(get(app, "/api/v1/pipeline").await).await["data"].clone()
}

/// Poll the pipeline until it reaches `step`.
async fn wait_for_step(state: &avstudio_api::state::AppState, step: PipelineStep) {
    let mut updates = state.session.orchestrator().subscribe();
    tokio::time::timeout(Duration::from_secs(5), async {
        while updates.borrow_and_update().step != step {
            updates.changed().await.unwrap();
        }
    })
    .await
    .unwrap();
}

#[tokio::test]
async fn fresh_pipeline_is_idle() {
    let (app, _) = common::build_test_app(ScriptedBackend::new());

    let data = state_json(&app).await;

    assert_eq!(data["step"], "idle");
    assert_eq!(data["revision"], 0);
    assert_eq!(data["context"]["script"], "");
    assert!(data["context"]["audioUrl"].is_null());
    assert_eq!(data["view"]["canGenerateAudio"], false);
}

#[tokio::test]
async fn dispatched_events_report_their_disposition() {
    let (app, _) = common::build_test_app(ScriptedBackend::new());

    let applied = post_expect(
        &app,
        "/api/v1/pipeline/events",
        json!({"type": "SET_IDEA", "idea": "paper boats"}),
        StatusCode::OK,
    )
    .await;
    assert_eq!(applied["data"]["disposition"], "applied");
    assert_eq!(applied["data"]["step"], "ideaInput");

    let ignored = post_expect(
        &app,
        "/api/v1/pipeline/events",
        json!({"type": "CONFIRM_AUDIO"}),
        StatusCode::OK,
    )
    .await;
    assert_eq!(ignored["data"]["disposition"], "unhandled");
    assert_eq!(ignored["data"]["revision"], 1);

    post_expect(
        &app,
        "/api/v1/pipeline/events",
        json!({"type": "EDIT_SCRIPT", "script": "   "}),
        StatusCode::OK,
    )
    .await;
    let rejected = post_expect(
        &app,
        "/api/v1/pipeline/events",
        json!({"type": "CONFIRM_SCRIPT"}),
        StatusCode::OK,
    )
    .await;
    assert_eq!(rejected["data"]["disposition"], "guardRejected");
    assert_eq!(rejected["data"]["context"]["scriptConfirmed"], false);
}

#[tokio::test]
async fn audio_without_preset_is_a_validation_error() {
    let (app, state) = common::build_test_app(ScriptedBackend::new());
    post_expect(&app, "/api/v1/pipeline/script", json!({"idea": "x"}), StatusCode::OK).await;
    wait_for_step(&state, PipelineStep::ScriptReady).await;

    let json = post_expect(&app, "/api/v1/pipeline/audio", json!({}), StatusCode::BAD_REQUEST).await;
    assert_eq!(json["code"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn video_before_audio_is_rejected() {
    let (app, _) = common::build_test_app(ScriptedBackend::new());

    let json = post_expect(&app, "/api/v1/pipeline/video", json!({}), StatusCode::BAD_REQUEST).await;

    assert_eq!(json["error"], "Generate audio before rendering video");
}

#[tokio::test]
async fn out_of_order_session_call_is_a_conflict() {
    let (app, _) = common::build_test_app(ScriptedBackend::new());

    let json = post_expect(&app, "/api/v1/pipeline/audio", json!({}), StatusCode::CONFLICT).await;

    assert_eq!(json["code"], "CONFLICT");
    assert!(json["error"].as_str().unwrap().contains("CONFIRM_SCRIPT"));
}

#[tokio::test]
async fn session_endpoints_drive_pipeline_to_video_ready() {
    let (app, state) = common::build_test_app(
        ScriptedBackend::new()
            .with_text(Reply::Ok("The tide comes in.".into()))
            .with_speech(Reply::Ok("/srv/audio/tide.wav".into()))
            .with_video(Reply::Ok("/srv/video/tide.mp4".into())),
    );

    let script = post_expect(
        &app,
        "/api/v1/pipeline/script",
        json!({"idea": "tides"}),
        StatusCode::OK,
    )
    .await;
    assert_eq!(script["data"]["script"], "The tide comes in.");
    wait_for_step(&state, PipelineStep::ScriptReady).await;

    post_expect(
        &app,
        "/api/v1/pipeline/events",
        json!({"type": "SELECT_VOICE_PRESET", "preset": "en_woman"}),
        StatusCode::OK,
    )
    .await;

    let audio = post_expect(&app, "/api/v1/pipeline/audio", json!({}), StatusCode::OK).await;
    assert_eq!(audio["data"]["audioUrl"], "/media/audio/tide.wav");
    wait_for_step(&state, PipelineStep::AudioReady).await;

    let video = post_expect(&app, "/api/v1/pipeline/video", json!({}), StatusCode::ACCEPTED).await;
    assert!(video["data"]["jobId"].as_str().unwrap().starts_with("job_video_"));

    wait_for_step(&state, PipelineStep::VideoReady).await;
    let data = state_json(&app).await;
    assert_eq!(data["context"]["videoUrl"], "/media/video/tide.mp4");
    assert_eq!(data["context"]["videoJob"]["status"], "completed");
    assert_eq!(data["view"]["canGenerateVideo"], true);
    assert_eq!(data["view"]["isProcessing"], false);
}
