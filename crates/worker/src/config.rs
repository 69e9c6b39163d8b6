use std::time::Duration;

use avstudio_core::config::{flag, parse_or, var_or, ConfigError};
use avstudio_core::job::JobType;

/// Executor settings loaded from environment variables.
#[derive(Debug, Clone)]
pub struct ExecutorConfig {
    pub script_step_delay: Duration,
    pub audio_step_delay: Duration,
    pub video_step_delay: Duration,
    /// Serve the canned demo media for the presets that have it.
    pub demo_mode: bool,
    /// Prefix that turns backend artifact file names into client URLs.
    pub media_url_prefix: String,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            script_step_delay: Duration::from_millis(400),
            audio_step_delay: Duration::from_millis(600),
            video_step_delay: Duration::from_millis(1000),
            demo_mode: false,
            media_url_prefix: "/media".to_string(),
        }
    }
}

impl ExecutorConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                | Default  |
    /// |------------------------|----------|
    /// | `SCRIPT_STEP_DELAY_MS` | `400`    |
    /// | `AUDIO_STEP_DELAY_MS`  | `600`    |
    /// | `VIDEO_STEP_DELAY_MS`  | `1000`   |
    /// | `DEMO_PIPELINE`        | `false`  |
    /// | `MEDIA_URL_PREFIX`     | `/media` |
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();
        let millis = |var: &'static str, default: Duration| -> Result<Duration, ConfigError> {
            let default = u64::try_from(default.as_millis()).unwrap_or(u64::MAX);
            parse_or(var, default, "milliseconds").map(Duration::from_millis)
        };

        Ok(Self {
            script_step_delay: millis("SCRIPT_STEP_DELAY_MS", defaults.script_step_delay)?,
            audio_step_delay: millis("AUDIO_STEP_DELAY_MS", defaults.audio_step_delay)?,
            video_step_delay: millis("VIDEO_STEP_DELAY_MS", defaults.video_step_delay)?,
            demo_mode: flag("DEMO_PIPELINE")?,
            media_url_prefix: var_or("MEDIA_URL_PREFIX", &defaults.media_url_prefix)
                .trim_end_matches('/')
                .to_string(),
        })
    }

    /// No waiting between progress steps. Demo media keeps its own pacing.
    pub fn immediate() -> Self {
        Self {
            script_step_delay: Duration::ZERO,
            audio_step_delay: Duration::ZERO,
            video_step_delay: Duration::ZERO,
            ..Self::default()
        }
    }

    pub fn step_delay(&self, job_type: JobType) -> Duration {
        match job_type {
            JobType::Script => self.script_step_delay,
            JobType::Audio => self.audio_step_delay,
            JobType::Video => self.video_step_delay,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_per_type_pacing() {
        let config = ExecutorConfig::default();
        assert_eq!(config.step_delay(JobType::Script), Duration::from_millis(400));
        assert_eq!(config.step_delay(JobType::Audio), Duration::from_millis(600));
        assert_eq!(config.step_delay(JobType::Video), Duration::from_millis(1000));
        assert!(!config.demo_mode);
    }

    #[test]
    fn immediate_has_no_delays() {
        let config = ExecutorConfig::immediate();
        for job_type in JobType::ALL {
            assert_eq!(config.step_delay(job_type), Duration::ZERO);
        }
    }
}
