// Session login, logout, and platform detection
//
// A successful login leaves a session cookie in the client's jar; every
// later request rides on it until the controller drops it. The login
// response is not enveloped, so it bypasses `classify`.

use reqwest::StatusCode;
use secrecy::ExposeSecret;
use serde_json::json;
use tracing::debug;
use url::Url;

use crate::auth::{ControllerPlatform, LoginCredentials};
use crate::error::Error;
use crate::legacy::client::{CSRF_HEADER, LegacyClient};
use crate::transport::TransportConfig;

impl LegacyClient {
    /// Log in and keep the session cookie (plus the CSRF token on UniFi OS).
    ///
    /// Any non-2xx answer is `Error::Authentication`. Calling this on a
    /// live session simply replaces it.
    pub async fn login(&self, credentials: &LoginCredentials) -> Result<(), Error> {
        let url = self.root_url(self.platform().login_path())?;
        debug!(username = %credentials.username, %url, "login");

        let resp = self
            .http()
            .post(url)
            .json(&json!({
                "username": credentials.username,
                "password": credentials.password.expose_secret(),
                "remember": true,
            }))
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(Error::Authentication {
                message: format!("login failed (HTTP {status}): {body}"),
            });
        }

        let csrf = resp
            .headers()
            .get(CSRF_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::to_owned);
        self.set_csrf_token(csrf);
        Ok(())
    }

    /// End the session. The status code is ignored; the controller may
    /// already have forgotten us.
    pub async fn logout(&self) -> Result<(), Error> {
        let url = self.root_url(self.platform().logout_path())?;
        debug!(%url, "logout");
        self.http().post(url).send().await?;
        self.set_csrf_token(None);
        Ok(())
    }

    /// Probe which login flavour the controller speaks.
    ///
    /// UniFi OS answers `GET /api/auth/login` with 401 or 405; a classic
    /// controller has no such route and answers 404. If the classic login
    /// route is unreachable too, that transport error is returned.
    pub async fn detect_platform(
        base_url: &Url,
        transport: &TransportConfig,
    ) -> Result<ControllerPlatform, Error> {
        let http = transport.build_client()?;
        let root = base_url.as_str().trim_end_matches('/');

        let probe = Url::parse(&format!("{root}{}", ControllerPlatform::UnifiOs.login_path()))?;
        match http.get(probe).send().await {
            Ok(resp) if resp.status() != StatusCode::NOT_FOUND => {
                debug!(status = %resp.status(), "UniFi OS login route present");
                return Ok(ControllerPlatform::UnifiOs);
            }
            Ok(_) => {}
            Err(e) => debug!(error = %e, "UniFi OS probe failed"),
        }

        let classic = Url::parse(&format!(
            "{root}{}",
            ControllerPlatform::ClassicController.login_path()
        ))?;
        http.get(classic).send().await?;
        debug!("classic controller");
        Ok(ControllerPlatform::ClassicController)
    }
}
