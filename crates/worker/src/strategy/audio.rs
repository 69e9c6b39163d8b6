use avstudio_backends::GenerationBackend;
use avstudio_core::job::JobType;
use avstudio_core::payload::{AudioInput, AudioResult, Fallback};
use avstudio_core::preset::{validate_preset, VoicePreset};
use avstudio_core::script::{estimated_duration_secs, word_count};

use super::{fallback_for, non_blank, parse_input, to_result, Failure};
use crate::config::ExecutorConfig;
use crate::demo::{self, DemoMedia, DEMO_AUDIO_DURATION, DEMO_AUDIO_STEPS};
use crate::media::media_url;
use crate::schedule::{pause, Reporter, DEFAULT_STEPS};

/// Narrate a script with a voice preset.
pub(crate) async fn run(
    backend: &dyn GenerationBackend,
    config: &ExecutorConfig,
    reporter: &Reporter<'_>,
    input: &serde_json::Value,
) -> Result<serde_json::Value, Failure> {
    let input: AudioInput = parse_input(input)?;
    let script = non_blank(input.script).ok_or_else(|| Failure::new("Script is required"))?;
    let preset_name =
        non_blank(input.preset).ok_or_else(|| Failure::new("Voice preset is required"))?;
    let preset = validate_preset(&preset_name)?;

    if config.demo_mode {
        if let Some(media) = demo::for_preset(preset.as_str()) {
            return run_demo(reporter, media, preset, script).await;
        }
    }

    let delay = config.step_delay(JobType::Audio);
    reporter.start();

    let (synthesized, ()) = tokio::join!(
        backend.synthesize_speech(preset, &script),
        reporter.walk(&DEFAULT_STEPS, delay),
    );
    pause(delay).await;

    let result = match synthesized {
        Ok(path) => AudioResult {
            audio_url: media_url(&config.media_url_prefix, "audio", &path),
            audio_path: path,
            duration: f64::from(estimated_duration_secs(word_count(&script))),
            preset,
            script,
            updated_at: chrono::Utc::now(),
            fallback: Fallback::none(),
        },
        Err(e) => AudioResult {
            audio_url: demo::FALLBACK_AUDIO_URL.to_string(),
            audio_path: demo::FALLBACK_AUDIO_URL.to_string(),
            duration: demo::FALLBACK_AUDIO_DURATION,
            preset,
            script,
            updated_at: chrono::Utc::now(),
            fallback: fallback_for(reporter.job_id(), JobType::Audio, &e),
        },
    };
    to_result(&result)
}

async fn run_demo(
    reporter: &Reporter<'_>,
    media: &DemoMedia,
    preset: VoicePreset,
    script: String,
) -> Result<serde_json::Value, Failure> {
    tracing::debug!(job_id = %reporter.job_id(), preset = %preset, "Serving demo narration");
    let interval = demo::step_interval(DEMO_AUDIO_DURATION, DEMO_AUDIO_STEPS.len());
    reporter.start();
    reporter.walk(&DEMO_AUDIO_STEPS, interval).await;
    pause(interval).await;

    to_result(&AudioResult {
        audio_url: media.audio_url.to_string(),
        audio_path: media.audio_url.to_string(),
        duration: media.audio_duration,
        preset,
        script,
        updated_at: chrono::Utc::now(),
        fallback: Fallback::none(),
    })
}
