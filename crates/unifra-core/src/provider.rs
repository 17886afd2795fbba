// ── Provider ──
//
// One configured controller connection. Owns the legacy client behind a
// `SessionGuard`, so every resource call recovers from an expired session
// the same way. Resource bodies are forwarded as JSON objects.

use std::future::Future;

use async_trait::async_trait;
use serde_json::Value;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use unifra_api::transport::{TlsMode, TransportConfig};
use unifra_api::{
    ControllerPlatform, LegacyClient, LegacySite, LoginCredentials, Relogin, RestResource,
    SessionGuard, SubsystemHealth,
};

use crate::config::{ControllerConfig, PlatformHint, TlsVerification};
use crate::error::CoreError;

/// Legacy client plus the credentials needed to log it in again.
pub struct ControllerSession {
    client: LegacyClient,
    credentials: LoginCredentials,
}

impl ControllerSession {
    pub fn new(client: LegacyClient, credentials: LoginCredentials) -> Self {
        Self {
            client,
            credentials,
        }
    }

    pub fn client(&self) -> &LegacyClient {
        &self.client
    }
}

#[async_trait]
impl Relogin for ControllerSession {
    async fn relogin(&self) -> Result<(), unifra_api::Error> {
        self.client.login(&self.credentials).await
    }
}

/// Session-safe access to one controller.
///
/// Every method routes its single SDK call through the session guard and
/// honours [`stop`](Self::stop).
pub struct Provider {
    guard: SessionGuard<ControllerSession>,
    cancel: CancellationToken,
}

impl Provider {
    /// Detect the platform if needed, log in, and wrap the session.
    ///
    /// The initial login is a plain login: it does not count as a
    /// re-authentication and does not start the re-login spacing window.
    pub async fn connect(config: ControllerConfig) -> Result<Self, CoreError> {
        let transport =
            TransportConfig::new(tls_mode(&config.tls), config.timeout).with_cookie_jar();

        let platform = match config.platform {
            PlatformHint::Fixed(platform) => platform,
            PlatformHint::Auto => {
                let platform = LegacyClient::detect_platform(&config.url, &transport).await?;
                debug!(?platform, "detected controller platform");
                platform
            }
        };

        let client = LegacyClient::new(config.url.clone(), config.site, platform, &transport)?;
        let credentials = LoginCredentials::new(config.username, config.password);
        client.login(&credentials).await?;
        info!(url = %config.url, ?platform, "connected to controller");

        Ok(Self::with_session(ControllerSession::new(client, credentials)))
    }

    /// Wrap an already-authenticated session without logging in.
    pub fn with_session(session: ControllerSession) -> Self {
        Self {
            guard: SessionGuard::new(session),
            cancel: CancellationToken::new(),
        }
    }

    fn client(&self) -> &LegacyClient {
        self.guard.delegate().client()
    }

    pub fn site(&self) -> &str {
        self.client().site()
    }

    pub fn platform(&self) -> ControllerPlatform {
        self.client().platform()
    }

    /// Run one SDK call through the session guard.
    async fn call<T, F, Fut>(&self, operation: F) -> Result<T, CoreError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, unifra_api::Error>>,
    {
        self.guard
            .execute_cancellable(&self.cancel, operation)
            .await
            .map_err(CoreError::from)
    }

    // ── Controller-level reads ───────────────────────────────────────

    pub async fn sites(&self) -> Result<Vec<LegacySite>, CoreError> {
        let client = self.client();
        self.call(|| client.list_sites()).await
    }

    pub async fn sysinfo(&self) -> Result<Value, CoreError> {
        let client = self.client();
        self.call(|| client.get_sysinfo()).await
    }

    pub async fn health(&self) -> Result<Vec<SubsystemHealth>, CoreError> {
        let client = self.client();
        self.call(|| client.get_health()).await
    }

    // ── Resource CRUD ────────────────────────────────────────────────

    pub async fn list(&self, kind: RestResource) -> Result<Vec<Value>, CoreError> {
        let client = self.client();
        self.call(|| client.list_rest(kind)).await
    }

    /// Read one resource. `Ok(None)` means it no longer exists on the
    /// controller and should be dropped from state.
    pub async fn read(&self, kind: RestResource, id: &str) -> Result<Option<Value>, CoreError> {
        let client = self.client();
        match self.call(|| client.get_rest(kind, id)).await {
            Ok(value) => Ok(Some(value)),
            Err(CoreError::NotFound { .. }) => {
                debug!(%kind, id, "resource gone");
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    pub async fn create(&self, kind: RestResource, body: &Value) -> Result<Value, CoreError> {
        require_object(kind, body)?;
        let client = self.client();
        self.call(|| client.create_rest(kind, body)).await
    }

    pub async fn update(
        &self,
        kind: RestResource,
        id: &str,
        body: &Value,
    ) -> Result<Value, CoreError> {
        require_object(kind, body)?;
        let client = self.client();
        self.call(|| client.update_rest(kind, id, body)).await
    }

    /// Delete one resource. Deleting something already gone succeeds.
    pub async fn delete(&self, kind: RestResource, id: &str) -> Result<(), CoreError> {
        let client = self.client();
        match self.call(|| client.delete_rest(kind, id)).await {
            Err(CoreError::NotFound { .. }) => {
                debug!(%kind, id, "already deleted");
                Ok(())
            }
            other => other,
        }
    }

    // ── Lifecycle ────────────────────────────────────────────────────

    /// Abort in-flight and future calls with `CoreError::Cancelled`.
    pub fn stop(&self) {
        self.cancel.cancel();
    }

    /// End the controller session. Failures are logged, not returned.
    pub async fn disconnect(&self) {
        self.stop();
        if let Err(e) = self.client().logout().await {
            warn!(error = %e, "logout failed (non-fatal)");
        }
    }
}

fn tls_mode(tls: &TlsVerification) -> TlsMode {
    match tls {
        TlsVerification::SystemDefaults => TlsMode::System,
        TlsVerification::CustomCa(path) => TlsMode::CustomCa(path.clone()),
        TlsVerification::DangerAcceptInvalid => TlsMode::DangerAcceptInvalid,
    }
}

fn require_object(kind: RestResource, body: &Value) -> Result<(), CoreError> {
    if body.is_object() {
        Ok(())
    } else {
        Err(CoreError::ValidationFailed {
            message: format!("{kind} body must be a JSON object"),
        })
    }
}
