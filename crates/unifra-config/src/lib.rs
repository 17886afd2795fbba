//! Profile configuration for unifra.
//!
//! TOML profiles, credential resolution (env + keyring + plaintext),
//! and translation to `unifra_core::ControllerConfig`.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use unifra_core::{ControllerConfig, ControllerPlatform, PlatformHint, TlsVerification};

/// Keyring service name; entries are keyed `{profile}/password`.
const KEYRING_SERVICE: &str = "unifra";

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("no credentials configured for profile '{profile}'")]
    NoCredentials { profile: String },

    #[error("profile '{profile}' not found in {path}")]
    UnknownProfile { profile: String, path: String },

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

// ── TOML config structs ─────────────────────────────────────────────

/// Top-level TOML configuration.
#[derive(Debug, Deserialize, Serialize)]
pub struct Config {
    /// Default profile name.
    pub default_profile: Option<String>,

    /// Global defaults.
    #[serde(default)]
    pub defaults: Defaults,

    /// Named controller profiles.
    #[serde(default)]
    pub profiles: HashMap<String, Profile>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_profile: Some("default".into()),
            defaults: Defaults::default(),
            profiles: HashMap::new(),
        }
    }
}

#[derive(Debug, Deserialize, Serialize)]
pub struct Defaults {
    #[serde(default)]
    pub insecure: bool,

    #[serde(default = "default_timeout")]
    pub timeout: u64,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            insecure: false,
            timeout: default_timeout(),
        }
    }
}

fn default_timeout() -> u64 {
    30
}

/// A named controller profile.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Profile {
    /// Controller base URL (e.g., "https://192.168.1.1").
    pub controller: String,

    #[serde(default = "default_site")]
    pub site: String,

    /// "auto", "unifi-os", or "classic".
    #[serde(default = "default_platform")]
    pub platform: String,

    /// Username for session login (falls back to `UNIFI_USERNAME`).
    pub username: Option<String>,

    /// Password (plaintext -- prefer keyring or `UNIFI_PASSWORD`).
    pub password: Option<String>,

    /// Path to custom CA certificate.
    pub ca_cert: Option<PathBuf>,

    /// Override the global insecure TLS setting.
    pub insecure: Option<bool>,

    /// Override the global timeout (seconds).
    pub timeout: Option<u64>,
}

fn default_site() -> String {
    "default".into()
}
fn default_platform() -> String {
    "auto".into()
}

// ── Config file path ────────────────────────────────────────────────

/// Resolve the config file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    ProjectDirs::from("dev", "unifra", "unifra").map_or_else(
        || {
            let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
            p.push(".config");
            p.push("unifra");
            p.push("config.toml");
            p
        },
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

// ── Config loading ──────────────────────────────────────────────────

/// Load the full Config from the canonical file + environment.
pub fn load_config() -> Result<Config, ConfigError> {
    load_config_from(&config_path())
}

/// Load config from `path`, layered over defaults and under
/// `UNIFRA_`-prefixed environment variables (`__` separates nesting,
/// e.g. `UNIFRA_DEFAULTS__TIMEOUT=10`).
pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    debug!(path = %path.display(), "loading config");
    let figment = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed("UNIFRA_").split("__"));

    Ok(figment.extract()?)
}

/// Pick the requested profile, else the configured default, else `"default"`.
pub fn select_profile<'a>(
    config: &'a Config,
    requested: Option<&str>,
) -> Result<(String, &'a Profile), ConfigError> {
    let name = requested
        .map(str::to_owned)
        .or_else(|| config.default_profile.clone())
        .unwrap_or_else(|| "default".into());

    config
        .profiles
        .get(&name)
        .map(|profile| (name.clone(), profile))
        .ok_or_else(|| ConfigError::UnknownProfile {
            profile: name,
            path: config_path().display().to_string(),
        })
}

// ── Credential resolution ───────────────────────────────────────────

/// Where secrets come from besides the profile itself.
pub trait SecretLookup {
    fn env(&self, key: &str) -> Option<String>;
    fn keyring_password(&self, profile_name: &str) -> Option<String>;
}

/// Process environment + the OS keyring.
pub struct SystemSecrets;

impl SecretLookup for SystemSecrets {
    fn env(&self, key: &str) -> Option<String> {
        std::env::var(key).ok()
    }

    fn keyring_password(&self, profile_name: &str) -> Option<String> {
        keyring::Entry::new(KEYRING_SERVICE, &format!("{profile_name}/password"))
            .and_then(|entry| entry.get_password())
            .ok()
    }
}

/// Resolve username + password.
///
/// Username: profile, then `UNIFI_USERNAME`. Password: `UNIFI_PASSWORD`,
/// then the keyring, then plaintext in the profile.
pub fn resolve_credentials(
    profile: &Profile,
    profile_name: &str,
    secrets: &impl SecretLookup,
) -> Result<(String, SecretString), ConfigError> {
    let no_credentials = || ConfigError::NoCredentials {
        profile: profile_name.into(),
    };

    let username = profile
        .username
        .clone()
        .or_else(|| secrets.env("UNIFI_USERNAME"))
        .ok_or_else(no_credentials)?;

    let password = secrets
        .env("UNIFI_PASSWORD")
        .or_else(|| secrets.keyring_password(profile_name))
        .or_else(|| profile.password.clone())
        .ok_or_else(no_credentials)?;

    Ok((username, SecretString::from(password)))
}

fn parse_platform(value: &str) -> Result<PlatformHint, ConfigError> {
    match value {
        "auto" => Ok(PlatformHint::Auto),
        "unifi-os" => Ok(PlatformHint::Fixed(ControllerPlatform::UnifiOs)),
        "classic" => Ok(PlatformHint::Fixed(ControllerPlatform::ClassicController)),
        other => Err(ConfigError::Validation {
            field: "platform".into(),
            reason: format!("expected 'auto', 'unifi-os', or 'classic', got '{other}'"),
        }),
    }
}

/// Build a `ControllerConfig` from a profile and the global defaults.
pub fn profile_to_controller_config(
    profile: &Profile,
    profile_name: &str,
    defaults: &Defaults,
    secrets: &impl SecretLookup,
) -> Result<ControllerConfig, ConfigError> {
    let url: url::Url = profile
        .controller
        .parse()
        .map_err(|_| ConfigError::Validation {
            field: "controller".into(),
            reason: format!("invalid URL: {}", profile.controller),
        })?;

    let platform = parse_platform(&profile.platform)?;
    let (username, password) = resolve_credentials(profile, profile_name, secrets)?;

    let tls = if profile.insecure.unwrap_or(defaults.insecure) {
        TlsVerification::DangerAcceptInvalid
    } else if let Some(ref ca_path) = profile.ca_cert {
        TlsVerification::CustomCa(ca_path.clone())
    } else {
        TlsVerification::SystemDefaults
    };

    let mut config = ControllerConfig::new(url, username, password);
    config.site.clone_from(&profile.site);
    config.platform = platform;
    config.tls = tls;
    config.timeout = Duration::from_secs(profile.timeout.unwrap_or(defaults.timeout));
    Ok(config)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::io::Write;

    use pretty_assertions::assert_eq;
    use secrecy::ExposeSecret;

    use super::*;

    #[derive(Default)]
    struct FakeSecrets {
        env: HashMap<&'static str, &'static str>,
        keyring: Option<&'static str>,
    }

    impl SecretLookup for FakeSecrets {
        fn env(&self, key: &str) -> Option<String> {
            self.env.get(key).map(|v| (*v).to_owned())
        }

        fn keyring_password(&self, _profile_name: &str) -> Option<String> {
            self.keyring.map(str::to_owned)
        }
    }

    fn profile(controller: &str) -> Profile {
        Profile {
            controller: controller.into(),
            site: default_site(),
            platform: default_platform(),
            username: Some("terraform".into()),
            password: Some("from-file".into()),
            ca_cert: None,
            insecure: None,
            timeout: None,
        }
    }

    #[test]
    fn loads_profiles_from_toml() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"
default_profile = "lab"

[defaults]
insecure = true
timeout = 12

[profiles.lab]
controller = "https://10.0.0.1"
platform = "unifi-os"
username = "terraform"
site = "branch"
"#
        )
        .unwrap();

        let config = load_config_from(file.path()).unwrap();
        let (name, lab) = select_profile(&config, None).unwrap();

        assert_eq!(name, "lab");
        assert_eq!(lab.site, "branch");
        assert_eq!(lab.platform, "unifi-os");
        assert!(config.defaults.insecure);
        assert_eq!(config.defaults.timeout, 12);
    }

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = load_config_from(&dir.path().join("absent.toml")).unwrap();

        assert!(config.profiles.is_empty());
        assert_eq!(config.default_profile.as_deref(), Some("default"));
        assert_eq!(config.defaults.timeout, 30);
    }

    #[test]
    fn unknown_profile_is_an_error() {
        let config = Config::default();
        let err = select_profile(&config, Some("prod")).unwrap_err();
        assert!(matches!(err, ConfigError::UnknownProfile { ref profile, .. } if profile == "prod"));
    }

    #[test]
    fn password_precedence_is_env_then_keyring_then_file() {
        let p = profile("https://10.0.0.1");

        let env = FakeSecrets {
            env: HashMap::from([("UNIFI_PASSWORD", "from-env")]),
            keyring: Some("from-keyring"),
        };
        let keyring = FakeSecrets {
            keyring: Some("from-keyring"),
            ..FakeSecrets::default()
        };

        let (_, pw) = resolve_credentials(&p, "lab", &env).unwrap();
        assert_eq!(pw.expose_secret(), "from-env");
        let (_, pw) = resolve_credentials(&p, "lab", &keyring).unwrap();
        assert_eq!(pw.expose_secret(), "from-keyring");
        let (_, pw) = resolve_credentials(&p, "lab", &FakeSecrets::default()).unwrap();
        assert_eq!(pw.expose_secret(), "from-file");
    }

    #[test]
    fn username_falls_back_to_env() {
        let mut p = profile("https://10.0.0.1");
        p.username = None;

        let err = resolve_credentials(&p, "lab", &FakeSecrets::default()).unwrap_err();
        assert!(matches!(err, ConfigError::NoCredentials { .. }));

        let secrets = FakeSecrets {
            env: HashMap::from([("UNIFI_USERNAME", "ops")]),
            ..FakeSecrets::default()
        };
        let (user, _) = resolve_credentials(&p, "lab", &secrets).unwrap();
        assert_eq!(user, "ops");
    }

    #[test]
    fn builds_controller_config() {
        let mut p = profile("https://10.0.0.1");
        p.platform = "classic".into();
        p.timeout = Some(5);
        p.ca_cert = Some(PathBuf::from("/etc/unifi/ca.pem"));

        let config =
            profile_to_controller_config(&p, "lab", &Defaults::default(), &FakeSecrets::default())
                .unwrap();

        assert_eq!(config.url.as_str(), "https://10.0.0.1/");
        assert_eq!(
            config.platform,
            PlatformHint::Fixed(ControllerPlatform::ClassicController)
        );
        assert_eq!(
            config.tls,
            TlsVerification::CustomCa(PathBuf::from("/etc/unifi/ca.pem"))
        );
        assert_eq!(config.timeout, Duration::from_secs(5));
        assert_eq!(config.username, "terraform");
    }

    #[test]
    fn insecure_wins_over_ca_cert() {
        let mut p = profile("https://10.0.0.1");
        p.ca_cert = Some(PathBuf::from("/etc/unifi/ca.pem"));
        let defaults = Defaults {
            insecure: true,
            ..Defaults::default()
        };

        let config =
            profile_to_controller_config(&p, "lab", &defaults, &FakeSecrets::default()).unwrap();
        assert_eq!(config.tls, TlsVerification::DangerAcceptInvalid);
    }

    #[test]
    fn rejects_bad_url_and_platform() {
        let secrets = FakeSecrets::default();
        let bad_url = profile("not a url");
        let err = profile_to_controller_config(&bad_url, "lab", &Defaults::default(), &secrets)
            .unwrap_err();
        assert!(matches!(err, ConfigError::Validation { ref field, .. } if field == "controller"));

        let mut bad_platform = profile("https://10.0.0.1");
        bad_platform.platform = "cloud".into();
        let err =
            profile_to_controller_config(&bad_platform, "lab", &Defaults::default(), &secrets)
                .unwrap_err();
        assert!(matches!(err, ConfigError::Validation { ref field, .. } if field == "platform"));
    }
}
