//! Provider layer between `unifra-api` and front ends (CLI, plugin hosts).
//!
//! - **[`Provider`]** -- one configured controller connection. Every call
//!   (sites, health, resource CRUD) goes through the API crate's
//!   `SessionGuard`, so an expired controller session is renewed once and
//!   the call replayed without the caller noticing.
//! - **[`ControllerConfig`]** -- how to reach and authenticate with a
//!   controller; built by `unifra-config` or directly by embedders.
//! - **[`CoreError`]** -- user-facing error taxonomy.

pub mod config;
pub mod error;
pub mod provider;

pub use config::{ControllerConfig, PlatformHint, TlsVerification};
pub use error::CoreError;
pub use provider::{ControllerSession, Provider};

pub use unifra_api::{ControllerPlatform, RestResource};
