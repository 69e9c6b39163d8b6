use avstudio_backends::GenerationBackend;
use avstudio_core::job::JobType;
use avstudio_core::payload::{Fallback, VideoInput, VideoResult, VIDEO_FORMAT};
use avstudio_core::preset::validate_preset;

use super::{fallback_for, non_blank, parse_input, to_result, Failure};
use crate::config::ExecutorConfig;
use crate::demo::{self, DemoMedia, DEMO_VIDEO_DURATION, DEMO_VIDEO_STEPS};
use crate::media::media_url;
use crate::schedule::{pause, Reporter, DEFAULT_STEPS};

const READY_MESSAGE: &str = "Video ready.";

/// Render an avatar video driven by an existing narration track.
pub(crate) async fn run(
    backend: &dyn GenerationBackend,
    config: &ExecutorConfig,
    reporter: &Reporter<'_>,
    input: &serde_json::Value,
) -> Result<serde_json::Value, Failure> {
    let input: VideoInput = parse_input(input)?;
    let (audio_url, audio_path) = match (non_blank(input.audio_url), non_blank(input.audio_path)) {
        (Some(url), path) => {
            let path = path.unwrap_or_else(|| url.clone());
            (url, path)
        }
        (None, Some(path)) => (path.clone(), path),
        (None, None) => return Err(Failure::new("Audio URL is required")),
    };
    let preset = non_blank(input.preset)
        .map(|p| validate_preset(&p))
        .transpose()?;

    if config.demo_mode {
        if let Some(media) = demo::for_audio_url(&audio_url) {
            return run_demo(reporter, media, audio_url).await;
        }
    }

    let delay = config.step_delay(JobType::Video);
    reporter.start();

    let render = async {
        match preset {
            Some(preset) => backend
                .render_video(preset, &audio_path)
                .await
                .map_err(|e| fallback_for(reporter.job_id(), JobType::Video, &e)),
            None => {
                tracing::debug!(job_id = %reporter.job_id(), "No preset on video job, using fallback artifact");
                Err(Fallback::because(
                    "No voice preset supplied for avatar rendering",
                ))
            }
        }
    };
    let (rendered, ()) = tokio::join!(render, reporter.walk(&DEFAULT_STEPS, delay));
    pause(delay).await;

    let result = match rendered {
        Ok(path) => VideoResult {
            video_url: media_url(&config.media_url_prefix, "video", &path),
            video_path: Some(path),
            duration: None,
            format: VIDEO_FORMAT.to_string(),
            audio_url,
            message: READY_MESSAGE.to_string(),
            updated_at: chrono::Utc::now(),
            fallback: Fallback::none(),
        },
        Err(fallback) => VideoResult {
            video_url: demo::FALLBACK_VIDEO_URL.to_string(),
            video_path: None,
            duration: Some(demo::FALLBACK_VIDEO_DURATION),
            format: VIDEO_FORMAT.to_string(),
            audio_url,
            message: READY_MESSAGE.to_string(),
            updated_at: chrono::Utc::now(),
            fallback,
        },
    };
    to_result(&result)
}

async fn run_demo(
    reporter: &Reporter<'_>,
    media: &DemoMedia,
    audio_url: String,
) -> Result<serde_json::Value, Failure> {
    tracing::debug!(job_id = %reporter.job_id(), preset = media.preset, "Serving demo video");
    let interval = demo::step_interval(DEMO_VIDEO_DURATION, DEMO_VIDEO_STEPS.len());
    reporter.start();
    reporter.walk(&DEMO_VIDEO_STEPS, interval).await;
    pause(interval).await;

    to_result(&VideoResult {
        video_url: media.video_url.to_string(),
        video_path: None,
        duration: Some(media.video_duration),
        format: VIDEO_FORMAT.to_string(),
        audio_url,
        message: format!("Video ready. Served from {}.", media.video_url),
        updated_at: chrono::Utc::now(),
        fallback: Fallback::none(),
    })
}
