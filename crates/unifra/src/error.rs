//! CLI error types with miette diagnostics.
//!
//! Maps `CoreError` and `ConfigError` into user-facing errors with
//! actionable help text and a process exit code.

use miette::Diagnostic;
use thiserror::Error;

use unifra_config::ConfigError;
use unifra_core::CoreError;

pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const AUTH: i32 = 3;
    pub const NOT_FOUND: i32 = 4;
    pub const PERMISSION: i32 = 5;
    pub const CONNECTION: i32 = 7;
    pub const TIMEOUT: i32 = 8;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Connection ───────────────────────────────────────────────────
    #[error("Could not connect to controller at {url}: {reason}")]
    #[diagnostic(
        code(unifra::connection_failed),
        help(
            "Check that the controller is running and reachable.\n\
             Self-signed certificate? Retry with --insecure (-k)."
        )
    )]
    ConnectionFailed { url: String, reason: String },

    #[error("Request timed out")]
    #[diagnostic(
        code(unifra::timeout),
        help("Increase the timeout with --timeout or check controller responsiveness.")
    )]
    Timeout,

    // ── Authentication ───────────────────────────────────────────────
    #[error("Authentication failed: {message}")]
    #[diagnostic(
        code(unifra::auth_failed),
        help("Verify the username and password (UNIFI_PASSWORD, keyring, or profile).")
    )]
    AuthFailed { message: String },

    #[error("Session expired and logging in again failed: {message}")]
    #[diagnostic(
        code(unifra::reauth_failed),
        help("The stored credentials may have changed since the session started.")
    )]
    ReauthFailed { message: String },

    #[error("No credentials configured for profile '{profile}'")]
    #[diagnostic(
        code(unifra::no_credentials),
        help(
            "Set username in the profile (or pass --username) and provide a password via\n\
             UNIFI_PASSWORD or the keyring entry unifra/{profile}/password."
        )
    )]
    NoCredentials { profile: String },

    // ── Resources ────────────────────────────────────────────────────
    #[error("Not found: {identifier}")]
    #[diagnostic(code(unifra::not_found))]
    NotFound { identifier: String },

    #[error("Permission denied: {message}")]
    #[diagnostic(
        code(unifra::permission_denied),
        help("The account needs an admin role with write access on this site.")
    )]
    PermissionDenied { message: String },

    // ── API ──────────────────────────────────────────────────────────
    #[error("API error: {message}")]
    #[diagnostic(code(unifra::api_error))]
    Api { message: String },

    #[error("Operation cancelled")]
    #[diagnostic(code(unifra::cancelled))]
    Cancelled,

    // ── Validation ───────────────────────────────────────────────────
    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(unifra::validation))]
    Validation { field: String, reason: String },

    // ── Configuration ────────────────────────────────────────────────
    #[error("Profile '{name}' not found in {path}")]
    #[diagnostic(
        code(unifra::profile_not_found),
        help("Add a [profiles.{name}] table to the config file.")
    )]
    ProfileNotFound { name: String, path: String },

    #[error("No controller configured")]
    #[diagnostic(
        code(unifra::no_config),
        help(
            "Pass --controller, or create a profile.\n\
             Expected config at: {path}"
        )
    )]
    NoConfig { path: String },

    #[error("Configuration error: {message}")]
    #[diagnostic(code(unifra::config))]
    Config { message: String },

    // ── IO ───────────────────────────────────────────────────────────
    #[error(transparent)]
    #[diagnostic(code(unifra::io))]
    Io(#[from] std::io::Error),
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::ConnectionFailed { .. } => exit_code::CONNECTION,
            Self::Timeout => exit_code::TIMEOUT,
            Self::AuthFailed { .. } | Self::ReauthFailed { .. } | Self::NoCredentials { .. } => {
                exit_code::AUTH
            }
            Self::NotFound { .. } => exit_code::NOT_FOUND,
            Self::PermissionDenied { .. } => exit_code::PERMISSION,
            Self::Validation { .. } => exit_code::USAGE,
            _ => exit_code::GENERAL,
        }
    }
}

// ── CoreError → CliError mapping ─────────────────────────────────────

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::ConnectionFailed { url, reason } => Self::ConnectionFailed { url, reason },
            CoreError::AuthenticationFailed { message } => Self::AuthFailed { message },
            CoreError::ReauthenticationFailed { message } => Self::ReauthFailed { message },
            CoreError::Timeout => Self::Timeout,
            CoreError::Cancelled => Self::Cancelled,
            CoreError::NotFound { identifier } => Self::NotFound { identifier },
            CoreError::PermissionDenied { message } => Self::PermissionDenied { message },
            CoreError::ValidationFailed { message } => Self::Validation {
                field: "body".into(),
                reason: message,
            },
            CoreError::Api { message, status } => Self::Api {
                message: match status {
                    Some(code) => format!("{message} (HTTP {code})"),
                    None => message,
                },
            },
            CoreError::Config { message } => Self::Config { message },
            CoreError::Internal(message) => Self::Api { message },
        }
    }
}

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::Validation { field, reason } => Self::Validation { field, reason },
            ConfigError::NoCredentials { profile } => Self::NoCredentials { profile },
            ConfigError::UnknownProfile { profile, path } => Self::ProfileNotFound {
                name: profile,
                path,
            },
            ConfigError::Figment(e) => Self::Config {
                message: e.to_string(),
            },
        }
    }
}
