use thiserror::Error;

/// Everything the legacy client and the session guard can fail with.
///
/// The set is closed; `unifra-core` translates it for users.
#[derive(Debug, Error)]
pub enum Error {
    // ── Session ─────────────────────────────────────────────────────
    /// The controller rejected a login (bad password, locked account).
    #[error("Authentication failed: {message}")]
    Authentication { message: String },

    /// The session cookie is no longer accepted. The only kind
    /// `SessionGuard` recovers from.
    #[error("Session expired -- re-authentication required")]
    SessionExpired,

    /// The session guard tried to log in again after an expired session
    /// and the login itself failed. The original operation was not retried.
    #[error("Re-authentication failed: {source}")]
    ReauthenticationFailed {
        #[source]
        source: Box<Error>,
    },

    /// The caller's cancellation token fired before the call completed.
    #[error("Operation cancelled")]
    Cancelled,

    // ── Transport ───────────────────────────────────────────────────
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// CA file or client-builder failure.
    #[error("TLS error: {0}")]
    Tls(String),

    /// HTTP 429; `Retry-After` or 1 s.
    #[error("Rate limited -- retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    // ── Controller answers ──────────────────────────────────────────
    /// HTTP 403: logged in, but the role may not do this.
    #[error("Insufficient permissions: {message}")]
    Forbidden { message: String },

    /// HTTP 404 on `path`, or a REST id the controller does not know.
    #[error("Not found: {path}")]
    NotFound { path: String },

    /// `meta.rc != "ok"`, a UniFi OS error object, or another non-2xx.
    #[error("Legacy API error: {message}")]
    LegacyApi { message: String },

    /// The body was not the JSON we expected. `body` is kept whole.
    #[error("Deserialization error: {message}")]
    Deserialization { message: String, body: String },
}

impl Error {
    /// Returns `true` if the session has expired and a fresh login
    /// might resolve it.
    ///
    /// A rejected login (`Authentication`) does not count.
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, Self::SessionExpired)
    }

    /// Timeouts, refused connections and throttling.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Transport(e) => e.is_timeout() || e.is_connect(),
            Self::RateLimited { .. } => true,
            _ => false,
        }
    }

    /// The object is gone. Controllers say so with a 404 or with an
    /// `IdInvalid` / `NotFound` envelope message.
    pub fn is_not_found(&self) -> bool {
        match self {
            Self::Transport(e) => e.status() == Some(reqwest::StatusCode::NOT_FOUND),
            Self::NotFound { .. } => true,
            Self::LegacyApi { message } => {
                message.contains("api.err.IdInvalid") || message.contains("api.err.NotFound")
            }
            _ => false,
        }
    }
}
