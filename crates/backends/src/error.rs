/// Errors from the generation backends.
#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    /// The capability has no endpoint or credentials configured.
    #[error("{0} backend is not configured")]
    NotConfigured(&'static str),

    /// The HTTP request itself failed (network, DNS, TLS, timeout).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The backend returned a non-2xx status code.
    #[error("Backend API error ({status}): {body}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Raw response body for debugging.
        body: String,
    },

    /// The backend answered successfully but the payload was unusable.
    #[error("Invalid backend response: {0}")]
    InvalidResponse(String),
}

impl BackendError {
    /// Whether the failure came from missing configuration rather than a
    /// call that was actually attempted.
    pub fn is_not_configured(&self) -> bool {
        matches!(self, BackendError::NotConfigured(_))
    }
}
