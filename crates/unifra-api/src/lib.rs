//! Async client for the UniFi controller's legacy REST API.
//!
//! - **[`LegacyClient`]** -- cookie-session HTTP client: login/logout,
//!   CSRF handling, envelope unwrapping, and resource CRUD on the
//!   controller's `rest/` collections ([`RestResource`]).
//! - **[`SessionGuard`]** -- wraps any [`Relogin`] delegate and replays a
//!   call once after transparently logging in again when the controller
//!   reports an expired session. Concurrent failures share one re-login,
//!   and re-logins are spaced at least [`MIN_REAUTH_INTERVAL`] apart.
//! - **[`Error`]** -- closed error taxonomy; [`Error::is_unauthorized`]
//!   is the only kind the guard reacts to.

pub mod auth;
pub mod error;
pub mod legacy;
pub mod session;
pub mod transport;

pub use auth::{ControllerPlatform, LoginCredentials};
pub use error::Error;
pub use legacy::{LegacyClient, RestResource};
pub use legacy::models::{LegacySite, SubsystemHealth};
pub use session::{MIN_REAUTH_INTERVAL, Relogin, SessionGuard};
pub use transport::{TlsMode, TransportConfig};

// Callers pass tokens into `SessionGuard::execute_cancellable`.
pub use tokio_util::sync::CancellationToken;
