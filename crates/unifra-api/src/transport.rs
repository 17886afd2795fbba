// HTTP client construction
//
// Platform detection and `LegacyClient` must agree on TLS, timeout and
// cookies, so both build their `reqwest::Client` from one `TransportConfig`.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use reqwest::cookie::Jar;

use crate::error::Error;

const USER_AGENT: &str = concat!("unifra/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Clone)]
pub enum TlsMode {
    /// Platform trust store.
    System,
    /// Trust the PEM bundle at this path in addition to the defaults.
    CustomCa(PathBuf),
    /// No certificate checks. Most local controllers ship self-signed certs.
    DangerAcceptInvalid,
}

#[derive(Debug, Clone)]
pub struct TransportConfig {
    pub tls: TlsMode,
    /// Whole-request timeout.
    pub timeout: Duration,
    /// Shared so the session cookie survives client rebuilds.
    pub cookie_jar: Option<Arc<Jar>>,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self::new(TlsMode::DangerAcceptInvalid, Duration::from_secs(30))
    }
}

impl TransportConfig {
    /// No cookie jar; add one with [`with_cookie_jar`](Self::with_cookie_jar).
    pub fn new(tls: TlsMode, timeout: Duration) -> Self {
        Self {
            tls,
            timeout,
            cookie_jar: None,
        }
    }

    /// Attach a fresh, empty cookie jar.
    pub fn with_cookie_jar(mut self) -> Self {
        self.cookie_jar = Some(Arc::new(Jar::default()));
        self
    }

    pub fn build_client(&self) -> Result<reqwest::Client, Error> {
        let builder = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(self.timeout);

        let builder = match &self.tls {
            TlsMode::System => builder,
            TlsMode::CustomCa(path) => {
                let pem = std::fs::read(path).map_err(|e| {
                    Error::Tls(format!("failed to read CA cert {}: {e}", path.display()))
                })?;
                let cert = reqwest::Certificate::from_pem(&pem)
                    .map_err(|e| Error::Tls(format!("invalid CA cert: {e}")))?;
                builder.add_root_certificate(cert)
            }
            TlsMode::DangerAcceptInvalid => builder.danger_accept_invalid_certs(true),
        };

        let builder = match &self.cookie_jar {
            Some(jar) => builder.cookie_provider(Arc::clone(jar)),
            None => builder,
        };

        builder
            .build()
            .map_err(|e| Error::Tls(format!("failed to build HTTP client: {e}")))
    }
}
