// Provider errors
//
// Front ends match on these instead of on HTTP details. A failed re-login
// keeps its own variant so it can be told apart from a rejected first login.

use thiserror::Error;

/// What went wrong, phrased for whoever drives the provider.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Reaching and logging in ──────────────────────────────────────
    #[error("Cannot connect to controller at {url}: {reason}")]
    ConnectionFailed { url: String, reason: String },

    #[error("Authentication failed: {message}")]
    AuthenticationFailed { message: String },

    /// The session expired and logging in again did not work.
    #[error("Session expired and re-authentication failed: {message}")]
    ReauthenticationFailed { message: String },

    #[error("Request timed out")]
    Timeout,

    #[error("Operation cancelled")]
    Cancelled,

    // ── Per-call outcomes ────────────────────────────────────────────
    #[error("Not found: {identifier}")]
    NotFound { identifier: String },

    #[error("Permission denied: {message}")]
    PermissionDenied { message: String },

    #[error("Validation failed: {message}")]
    ValidationFailed { message: String },

    // ── Anything else the controller said ───────────────────────────
    #[error("API error: {message}")]
    Api {
        message: String,
        /// Set when the failure came with a status code.
        status: Option<u16>,
    },

    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Internal error: {0}")]
    Internal(String),
}

// ── From the API crate ───────────────────────────────────────────────

impl From<unifra_api::Error> for CoreError {
    fn from(err: unifra_api::Error) -> Self {
        match err {
            unifra_api::Error::Authentication { message } => {
                CoreError::AuthenticationFailed { message }
            }
            unifra_api::Error::SessionExpired => CoreError::AuthenticationFailed {
                message: "Session expired -- re-authentication required".into(),
            },
            unifra_api::Error::ReauthenticationFailed { source } => {
                CoreError::ReauthenticationFailed {
                    message: source.to_string(),
                }
            }
            unifra_api::Error::Cancelled => CoreError::Cancelled,
            unifra_api::Error::Transport(ref e) => {
                if e.is_timeout() {
                    CoreError::Timeout
                } else if e.is_connect() {
                    CoreError::ConnectionFailed {
                        url: e
                            .url()
                            .map_or_else(|| "<unknown>".into(), ToString::to_string),
                        reason: e.to_string(),
                    }
                } else {
                    CoreError::Api {
                        message: e.to_string(),
                        status: e.status().map(|s| s.as_u16()),
                    }
                }
            }
            unifra_api::Error::InvalidUrl(e) => CoreError::Config {
                message: format!("Invalid URL: {e}"),
            },
            unifra_api::Error::Tls(msg) => CoreError::ConnectionFailed {
                url: String::new(),
                reason: format!("TLS error: {msg}"),
            },
            unifra_api::Error::RateLimited { retry_after_secs } => CoreError::Api {
                message: format!("Rate limited -- retry after {retry_after_secs}s"),
                status: Some(429),
            },
            unifra_api::Error::Forbidden { message } => CoreError::PermissionDenied { message },
            unifra_api::Error::NotFound { path } => CoreError::NotFound { identifier: path },
            unifra_api::Error::LegacyApi { message } => CoreError::Api {
                message,
                status: None,
            },
            unifra_api::Error::Deserialization { message, body: _ } => {
                CoreError::Internal(format!("Deserialization error: {message}"))
            }
        }
    }
}
