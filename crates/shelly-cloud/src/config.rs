//! CLI-facing configuration: re-exports the shared config crate and adds
//! `GlobalOpts`-aware profile resolution.

use std::time::Duration;

pub use shelly_cloud_config::{
    Config, Profile, config_path, load_config_or_default, resolve_password, save_config,
    store_password,
};

use shelly_cloud_core::BridgeConfig;

use crate::cli::GlobalOpts;
use crate::error::CliError;

/// Resolve the active profile name from CLI flags and config.
pub fn active_profile_name(global: &GlobalOpts, config: &Config) -> String {
    global
        .profile
        .clone()
        .unwrap_or_else(|| config.active_profile_name().to_owned())
}

/// Translate the active profile + global flags into a `BridgeConfig`.
///
/// Without a config file, `--username` and `SHELLY_PASSWORD` alone are
/// enough. A profile named with `--profile` must exist.
pub fn resolve_bridge_config(global: &GlobalOpts) -> Result<BridgeConfig, CliError> {
    let cfg = load_config_or_default();
    let profile_name = active_profile_name(global, &cfg);

    let fallback = Profile::default();
    let profile = match cfg.profiles.get(&profile_name) {
        Some(profile) => profile,
        None if global.profile.is_some() => {
            return Err(CliError::ProfileNotFound {
                name: profile_name,
                available: available_profiles(&cfg),
            });
        }
        None => &fallback,
    };

    // 1. Username (flag > env > profile)
    let username = global
        .username
        .clone()
        .or_else(|| profile.username.clone())
        .ok_or_else(|| CliError::NoCredentials {
            profile: profile_name.clone(),
        })?;

    // 2. Password (profile env > SHELLY_PASSWORD > keyring > plaintext)
    let password = resolve_password(profile, &profile_name)?;

    // 3. Everything else from the profile, then flag overrides
    let mut bridge = shelly_cloud_config::build_bridge_config(
        profile,
        &cfg.defaults,
        username,
        password,
    )?;
    if let Some(secs) = global.timeout {
        bridge.timeout = Duration::from_secs(secs);
    }
    Ok(bridge)
}

/// Comma-separated profile names for help text.
pub fn available_profiles(cfg: &Config) -> String {
    if cfg.profiles.is_empty() {
        "(none)".into()
    } else {
        cfg.profiles.keys().cloned().collect::<Vec<_>>().join(", ")
    }
}
