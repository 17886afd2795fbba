// Connection settings handed to `Provider::connect`.
//
// Built in memory by `unifra-config` or by an embedding host; nothing here
// reads files or the environment.

use std::time::Duration;

use secrecy::SecretString;
use url::Url;

use unifra_api::ControllerPlatform;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum TlsVerification {
    SystemDefaults,
    /// Additionally trust this PEM file.
    CustomCa(std::path::PathBuf),
    /// Accept any certificate. This is the default; pick another variant
    /// to verify the controller's certificate.
    #[default]
    DangerAcceptInvalid,
}

/// Which controller flavour to talk to.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PlatformHint {
    /// Probe the controller's login endpoints at connect time.
    #[default]
    Auto,
    /// Skip detection and use the given platform.
    Fixed(ControllerPlatform),
}

/// One controller, one site, one account.
#[derive(Debug, Clone)]
pub struct ControllerConfig {
    /// Controller root, e.g. `https://192.168.1.1` or `https://unifi:8443`.
    pub url: Url,
    pub username: String,
    pub password: SecretString,
    /// Short site name as used in URLs, not the display name.
    pub site: String,
    pub platform: PlatformHint,
    pub tls: TlsVerification,
    /// Per-request timeout.
    pub timeout: Duration,
}

impl ControllerConfig {
    pub fn new(url: Url, username: impl Into<String>, password: SecretString) -> Self {
        Self {
            url,
            username: username.into(),
            password,
            site: "default".into(),
            platform: PlatformHint::Auto,
            tls: TlsVerification::default(),
            timeout: Duration::from_secs(30),
        }
    }
}
