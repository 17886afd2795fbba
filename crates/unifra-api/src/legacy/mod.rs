// Legacy API client modules
//
// Hand-written client for the UniFi controller's legacy (non-OpenAPI)
// endpoints, wrapped in the standard `{ meta: { rc, msg }, data: [...] }`
// envelope.

pub mod auth;
pub mod client;
pub mod models;
pub mod rest;
pub mod status;

pub use client::LegacyClient;
pub use rest::RestResource;
