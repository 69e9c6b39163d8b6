//! Canned media: the demo clips served in demo mode and the fallback
//! artifacts used when a generation backend is unavailable.

use std::time::Duration;

/// Total simulated processing time for a demo audio job.
pub const DEMO_AUDIO_DURATION: Duration = Duration::from_secs(10);

/// Total simulated processing time for a demo video job.
pub const DEMO_VIDEO_DURATION: Duration = Duration::from_secs(15);

pub const DEMO_AUDIO_STEPS: [u8; 4] = [30, 55, 75, 90];
pub const DEMO_VIDEO_STEPS: [u8; 4] = [25, 45, 65, 85];

/// Lower bound on the pause between demo progress steps.
const MIN_DEMO_INTERVAL: Duration = Duration::from_millis(500);

pub const FALLBACK_AUDIO_URL: &str = "/samples/demo-audio.wav";
pub const FALLBACK_AUDIO_DURATION: f64 = 14.24;
pub const FALLBACK_VIDEO_URL: &str = "/samples/demo-video.mp4";
pub const FALLBACK_VIDEO_DURATION: f64 = 10.0;

/// Pre-rendered narration and avatar clip for one preset.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DemoMedia {
    pub preset: &'static str,
    pub audio_url: &'static str,
    pub audio_duration: f64,
    pub video_url: &'static str,
    pub video_duration: f64,
}

pub const DEMO_MEDIA: [DemoMedia; 2] = [
    DemoMedia {
        preset: "belinda",
        audio_url: "/demo/audio/LLM_belinda.wav",
        audio_duration: 16.0,
        video_url: "/demo/video/LLM_belinda.mp4",
        video_duration: 30.0,
    },
    DemoMedia {
        preset: "broom_salesman",
        audio_url: "/demo/audio/LLM_broom_salesman.wav",
        audio_duration: 14.0,
        video_url: "/demo/video/LLM_broom_salesman.mp4",
        video_duration: 27.0,
    },
];

/// Demo clip for a preset name, case-insensitive.
pub fn for_preset(preset: &str) -> Option<&'static DemoMedia> {
    let preset = preset.trim().to_ascii_lowercase();
    DEMO_MEDIA.iter().find(|m| m.preset == preset)
}

/// Demo clip whose narration lives at `audio_url`.
pub fn for_audio_url(audio_url: &str) -> Option<&'static DemoMedia> {
    DEMO_MEDIA.iter().find(|m| m.audio_url == audio_url)
}

/// Pause between demo progress steps: `max(500ms, total / (steps + 1))`.
pub fn step_interval(total: Duration, steps: usize) -> Duration {
    let slots = u32::try_from(steps + 1).unwrap_or(u32::MAX);
    (total / slots).max(MIN_DEMO_INTERVAL)
}
