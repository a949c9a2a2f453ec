use thiserror::Error;

/// Top-level error type for the `remotegen-api` crate.
///
/// Covers every failure mode of the configuration service client:
/// transport, HTTP status, payload decoding, and authorization.
/// `remotegen-core` maps these into generation-level errors.
#[derive(Debug, Error)]
pub enum Error {
    // ── Transport ───────────────────────────────────────────────────
    /// HTTP transport error (connection refused, DNS failure, etc.)
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// URL parsing error.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// Request timed out.
    #[error("Request timed out after {timeout_secs}s")]
    Timeout { timeout_secs: u64 },

    /// TLS handshake or certificate error.
    #[error("TLS error: {0}")]
    Tls(String),

    // ── Service ─────────────────────────────────────────────────────
    /// The service rejected the bearer token.
    #[error("Unauthorized -- check the configuration service token")]
    Unauthorized,

    /// The requested device (or its groups) is unknown to the service.
    #[error("Not found: {resource}")]
    NotFound { resource: String },

    /// Non-success status with the service's error message, if any.
    #[error("Configuration service error (HTTP {status}): {message}")]
    Service { status: u16, message: String },

    // ── Data ────────────────────────────────────────────────────────
    /// JSON deserialization failed, with the raw body for debugging.
    #[error("Deserialization error: {message}")]
    Deserialization { message: String, body: String },
}

impl Error {
    /// Returns `true` if this is a transient error worth retrying.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Transport(e) => e.is_timeout() || e.is_connect(),
            Self::Timeout { .. } => true,
            Self::Service { status, .. } => *status >= 500,
            _ => false,
        }
    }

    /// Returns `true` if this is a "not found" error.
    pub fn is_not_found(&self) -> bool {
        match self {
            Self::NotFound { .. } => true,
            Self::Transport(e) => e.status() == Some(reqwest::StatusCode::NOT_FOUND),
            Self::Service { status: 404, .. } => true,
            _ => false,
        }
    }
}
