// Controller HTTP plumbing
//
// Legacy endpoints answer with a `{ meta, data }` envelope, but failures
// also arrive as bare status codes from the proxy or as UniFi OS error
// objects delivered with HTTP 200. `classify` folds all of them into
// `Error` so the endpoint files (`auth`, `status`, `rest`) only see `data`.

use std::sync::{PoisonError, RwLock};

use reqwest::header::{HeaderMap, RETRY_AFTER};
use reqwest::{RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};
use url::Url;

use crate::auth::ControllerPlatform;
use crate::error::Error;
use crate::legacy::models::LegacyResponse;
use crate::transport::TransportConfig;

const LOGIN_REQUIRED: &str = "api.err.LoginRequired";
pub(crate) const CSRF_HEADER: &str = "X-CSRF-Token";
const CSRF_ROTATED_HEADER: &str = "X-Updated-CSRF-Token";
const BODY_PREVIEW: usize = 200;

/// `{"error": {"code": 401, "message": "..."}}`, sent by UniFi OS with HTTP 200.
#[derive(Deserialize)]
struct OsErrorBody {
    error: Option<OsError>,
}

#[derive(Deserialize)]
struct OsError {
    code: u16,
    message: Option<String>,
}

/// Session-cookie client for one site of one controller.
pub struct LegacyClient {
    http: reqwest::Client,
    base_url: Url,
    site: String,
    platform: ControllerPlatform,
    /// UniFi OS rejects mutating proxy requests without it.
    csrf_token: RwLock<Option<String>>,
}

impl LegacyClient {
    /// Build the HTTP client from `transport`, adding a cookie jar if the
    /// transport has none. `base_url` is the controller root
    /// (`https://192.168.1.1`, `https://controller:8443`).
    pub fn new(
        base_url: Url,
        site: String,
        platform: ControllerPlatform,
        transport: &TransportConfig,
    ) -> Result<Self, Error> {
        let http = match transport.cookie_jar {
            Some(_) => transport.build_client()?,
            None => transport.clone().with_cookie_jar().build_client()?,
        };
        Ok(Self::with_client(http, base_url, site, platform))
    }

    /// Use a caller-built `reqwest::Client`. It needs a cookie store for
    /// login to stick.
    pub fn with_client(
        http: reqwest::Client,
        base_url: Url,
        site: String,
        platform: ControllerPlatform,
    ) -> Self {
        Self {
            http,
            base_url,
            site,
            platform,
            csrf_token: RwLock::new(None),
        }
    }

    pub fn site(&self) -> &str {
        &self.site
    }

    pub fn platform(&self) -> ControllerPlatform {
        self.platform
    }

    pub(crate) fn http(&self) -> &reqwest::Client {
        &self.http
    }

    // ── CSRF ─────────────────────────────────────────────────────────

    pub(crate) fn set_csrf_token(&self, token: Option<String>) {
        debug!(present = token.is_some(), "storing CSRF token");
        self.store_csrf(token);
    }

    fn store_csrf(&self, token: Option<String>) {
        *self
            .csrf_token
            .write()
            .unwrap_or_else(PoisonError::into_inner) = token;
    }

    fn rotate_csrf(&self, headers: &HeaderMap) {
        if let Some(token) = header_str(headers, CSRF_ROTATED_HEADER) {
            trace!("CSRF token rotated");
            self.store_csrf(Some(token.to_owned()));
        }
    }

    fn with_csrf(&self, request: RequestBuilder) -> RequestBuilder {
        let token = self
            .csrf_token
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        match token {
            Some(token) => request.header(CSRF_HEADER, token),
            None => request,
        }
    }

    // ── URLs ─────────────────────────────────────────────────────────

    /// `{base}{path}` for root-relative paths such as `/api/login`. A path
    /// prefix on the base URL (reverse proxies) is kept.
    pub(crate) fn root_url(&self, path: &str) -> Result<Url, Error> {
        let base = self.base_url.as_str().trim_end_matches('/');
        Ok(Url::parse(&format!("{base}{path}"))?)
    }

    /// `{base}{prefix}/api/{path}`, with `/proxy/network` as prefix on UniFi OS.
    pub(crate) fn api_url(&self, path: &str) -> Result<Url, Error> {
        self.root_url(&format!("{}/api/{path}", self.platform.legacy_prefix()))
    }

    /// `{base}{prefix}/api/s/{site}/{path}`
    pub(crate) fn site_url(&self, path: &str) -> Result<Url, Error> {
        self.api_url(&format!("s/{}/{path}", self.site))
    }

    // ── Requests ─────────────────────────────────────────────────────

    pub(crate) async fn get<T: DeserializeOwned>(&self, url: Url) -> Result<Vec<T>, Error> {
        self.send(self.http.get(url)).await
    }

    pub(crate) async fn post<T: DeserializeOwned>(
        &self,
        url: Url,
        body: &(impl Serialize + Sync),
    ) -> Result<Vec<T>, Error> {
        self.send(self.with_csrf(self.http.post(url).json(body))).await
    }

    pub(crate) async fn put<T: DeserializeOwned>(
        &self,
        url: Url,
        body: &(impl Serialize + Sync),
    ) -> Result<Vec<T>, Error> {
        self.send(self.with_csrf(self.http.put(url).json(body))).await
    }

    pub(crate) async fn delete<T: DeserializeOwned>(&self, url: Url) -> Result<Vec<T>, Error> {
        self.send(self.with_csrf(self.http.delete(url))).await
    }

    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<Vec<T>, Error> {
        let resp = request.send().await?;
        let status = resp.status();
        let path = resp.url().path().to_owned();
        debug!(%status, path = %path, "legacy response");

        self.rotate_csrf(resp.headers());
        let retry_after = header_str(resp.headers(), RETRY_AFTER.as_str())
            .and_then(|v| v.parse().ok());
        let body = resp.text().await?;

        classify(status, &path, retry_after, &body)
    }
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}

/// Map one finished response to its `data` rows or an `Error`.
///
/// Session loss shows up three ways and always becomes `SessionExpired`:
/// HTTP 401, a UniFi OS error object with code 401, and an envelope with
/// `msg = api.err.LoginRequired`.
fn classify<T: DeserializeOwned>(
    status: StatusCode,
    path: &str,
    retry_after: Option<u64>,
    body: &str,
) -> Result<Vec<T>, Error> {
    match status {
        StatusCode::UNAUTHORIZED => return Err(Error::SessionExpired),
        StatusCode::FORBIDDEN => {
            return Err(Error::Forbidden {
                message: format!("HTTP 403 on {path}"),
            });
        }
        StatusCode::NOT_FOUND => return Err(Error::NotFound { path: path.into() }),
        StatusCode::TOO_MANY_REQUESTS => {
            return Err(Error::RateLimited {
                retry_after_secs: retry_after.unwrap_or(1),
            });
        }
        s if !s.is_success() => {
            return Err(Error::LegacyApi {
                message: format!("HTTP {s}: {}", preview(body)),
            });
        }
        _ => {}
    }

    if let Ok(OsErrorBody { error: Some(err) }) = serde_json::from_str::<OsErrorBody>(body) {
        return Err(match err.code {
            401 => Error::SessionExpired,
            code => Error::LegacyApi {
                message: format!(
                    "UniFi OS error {code}: {}",
                    err.message.unwrap_or_default()
                ),
            },
        });
    }

    let envelope: LegacyResponse<T> =
        serde_json::from_str(body).map_err(|e| Error::Deserialization {
            message: format!("{e} (body preview: {:?})", preview(body)),
            body: body.to_owned(),
        })?;

    if envelope.meta.is_ok() {
        return Ok(envelope.data);
    }
    Err(match envelope.meta.msg {
        Some(msg) if msg == LOGIN_REQUIRED => Error::SessionExpired,
        Some(msg) => Error::LegacyApi { message: msg },
        None => Error::LegacyApi {
            message: format!("rc={}", envelope.meta.rc),
        },
    })
}

fn preview(body: &str) -> &str {
    if body.len() <= BODY_PREVIEW {
        return body;
    }
    let mut end = BODY_PREVIEW;
    while !body.is_char_boundary(end) {
        end -= 1;
    }
    &body[..end]
}
