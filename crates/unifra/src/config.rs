//! Turns the config file, the selected profile, and CLI flags into a
//! `ControllerConfig`.

use unifra_config::{Config, Profile, SystemSecrets};
use unifra_core::ControllerConfig;

use crate::cli::GlobalOpts;
use crate::error::CliError;

/// Build a `ControllerConfig` from the config file, profile, and CLI overrides.
pub fn build_controller_config(global: &GlobalOpts) -> Result<ControllerConfig, CliError> {
    let path = global
        .config
        .clone()
        .unwrap_or_else(unifra_config::config_path);
    let cfg = unifra_config::load_config_from(&path)?;

    let (name, mut profile) = base_profile(&cfg, global)?;
    apply_overrides(&mut profile, global);

    Ok(unifra_config::profile_to_controller_config(
        &profile,
        &name,
        &cfg.defaults,
        &SystemSecrets,
    )?)
}

/// The profile to start from. An explicit `--profile` must exist; otherwise
/// the default profile is used if present, else `--controller` alone.
fn base_profile(cfg: &Config, global: &GlobalOpts) -> Result<(String, Profile), CliError> {
    if global.profile.is_some() || global.controller.is_none() {
        return match unifra_config::select_profile(cfg, global.profile.as_deref()) {
            Ok((name, profile)) => Ok((name, profile.clone())),
            Err(_) if global.profile.is_none() => Err(CliError::NoConfig {
                path: global
                    .config
                    .clone()
                    .unwrap_or_else(unifra_config::config_path)
                    .display()
                    .to_string(),
            }),
            Err(e) => Err(e.into()),
        };
    }

    let name = cfg
        .default_profile
        .clone()
        .unwrap_or_else(|| "default".into());
    if let Some(profile) = cfg.profiles.get(&name) {
        return Ok((name, profile.clone()));
    }

    Ok((
        "cli".into(),
        Profile {
            controller: String::new(),
            site: "default".into(),
            platform: "auto".into(),
            username: None,
            password: None,
            ca_cert: None,
            insecure: None,
            timeout: None,
        },
    ))
}

fn apply_overrides(profile: &mut Profile, global: &GlobalOpts) {
    if let Some(ref controller) = global.controller {
        profile.controller.clone_from(controller);
    }
    if let Some(ref site) = global.site {
        profile.site.clone_from(site);
    }
    if let Some(ref platform) = global.platform {
        profile.platform.clone_from(platform);
    }
    if global.username.is_some() {
        profile.username.clone_from(&global.username);
    }
    if global.insecure {
        profile.insecure = Some(true);
    }
    if global.timeout.is_some() {
        profile.timeout = global.timeout;
    }
}
