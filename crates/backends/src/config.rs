//! Backend configuration loaded from environment variables.

use std::time::Duration;

use avstudio_core::config::{parse_or, ConfigError};

/// Default timeout for a single backend call.
const DEFAULT_TIMEOUT_SECS: u64 = 120;

/// Credentials for an Azure OpenAI chat-completions deployment.
#[derive(Clone)]
pub struct AzureConfig {
    pub api_key: String,
    pub endpoint: String,
    pub api_version: String,
    pub deployment: String,
}

impl std::fmt::Debug for AzureConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AzureConfig")
            .field("api_key", &"<redacted>")
            .field("endpoint", &self.endpoint)
            .field("api_version", &self.api_version)
            .field("deployment", &self.deployment)
            .finish()
    }
}

impl AzureConfig {
    /// Load Azure settings from the environment.
    ///
    /// Returns `None` unless all four variables are set and non-empty.
    ///
    /// | Variable            | Required |
    /// |---------------------|----------|
    /// | `AZURE_OPENAI_KEY`  | yes      |
    /// | `AZURE_ENDPOINT`    | yes      |
    /// | `AZURE_API_VERSION` | yes      |
    /// | `AZURE_MODEL`       | yes      |
    pub fn from_env() -> Option<Self> {
        Some(Self {
            api_key: non_empty_var("AZURE_OPENAI_KEY")?,
            endpoint: non_empty_var("AZURE_ENDPOINT")?,
            api_version: non_empty_var("AZURE_API_VERSION")?,
            deployment: non_empty_var("AZURE_MODEL")?,
        })
    }
}

/// Connection settings for every generation backend.
#[derive(Debug, Clone)]
pub struct BackendConfig {
    /// Text completion; `None` disables it.
    pub azure: Option<AzureConfig>,
    /// Base URL of the media generation service; `None` disables speech
    /// synthesis and avatar rendering.
    pub generation_url: Option<String>,
    /// Per-request timeout.
    pub timeout: Duration,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            azure: None,
            generation_url: None,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }
}

impl BackendConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                  | Default  |
    /// |--------------------------|----------|
    /// | `GENERATION_BACKEND_URL` | unset    |
    /// | `BACKEND_TIMEOUT_SECS`   | `120`    |
    ///
    /// plus the Azure variables read by [`AzureConfig::from_env`].
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            azure: AzureConfig::from_env(),
            generation_url: non_empty_var("GENERATION_BACKEND_URL")
                .map(|url| url.trim_end_matches('/').to_string()),
            timeout: Duration::from_secs(parse_or(
                "BACKEND_TIMEOUT_SECS",
                DEFAULT_TIMEOUT_SECS,
                "seconds",
            )?),
        })
    }
}

fn non_empty_var(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_disables_every_backend() {
        let config = BackendConfig::default();
        assert!(config.azure.is_none());
        assert!(config.generation_url.is_none());
        assert_eq!(config.timeout, Duration::from_secs(120));
    }

    #[test]
    fn azure_debug_redacts_key() {
        let config = AzureConfig {
            api_key: "secret-key".into(),
            endpoint: "https://example.openai.azure.com".into(),
            api_version: "2024-06-01".into(),
            deployment: "gpt-4o".into(),
        };
        let rendered = format!("{config:?}");
        assert!(!rendered.contains("secret-key"));
        assert!(rendered.contains("gpt-4o"));
    }
}
