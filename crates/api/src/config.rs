use avstudio_core::config::{parse_or, var_or, ConfigError};

/// Server configuration loaded from environment variables.
///
/// All fields have sensible defaults suitable for local development.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `3000`).
    pub port: u16,
    /// Allowed CORS origins, parsed from comma-separated `CORS_ORIGINS` env var.
    pub cors_origins: Vec<String>,
    /// HTTP request timeout in seconds (default: `30`).
    pub request_timeout_secs: u64,
    /// Time allowed for background tasks to stop after the server has
    /// drained (default: `10`).
    pub shutdown_timeout_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            cors_origins: vec!["http://localhost:3000".to_string()],
            request_timeout_secs: 30,
            shutdown_timeout_secs: 10,
        }
    }
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                | Default                    |
    /// |------------------------|----------------------------|
    /// | `HOST`                 | `0.0.0.0`                  |
    /// | `PORT`                 | `3000`                     |
    /// | `CORS_ORIGINS`         | `http://localhost:3000`    |
    /// | `REQUEST_TIMEOUT_SECS` | `30`                       |
    /// | `SHUTDOWN_TIMEOUT_SECS`| `10`                       |
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let cors_origins: Vec<String> = var_or("CORS_ORIGINS", &defaults.cors_origins.join(","))
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        Ok(Self {
            host: var_or("HOST", &defaults.host),
            port: parse_or("PORT", defaults.port, "a port number")?,
            cors_origins,
            request_timeout_secs: parse_or(
                "REQUEST_TIMEOUT_SECS",
                defaults.request_timeout_secs,
                "seconds",
            )?,
            shutdown_timeout_secs: parse_or(
                "SHUTDOWN_TIMEOUT_SECS",
                defaults.shutdown_timeout_secs,
                "seconds",
            )?,
        })
    }
}
