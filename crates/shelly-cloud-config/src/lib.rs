//! Shared configuration for the Shelly Cloud CLI.
//!
//! TOML profiles, credential resolution (env + keyring + plaintext),
//! and translation to `shelly_cloud_core::BridgeConfig`. The CLI adds
//! flag-aware wrappers on top.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

use shelly_cloud_core::config::{DEFAULT_AUTH_URL, DEFAULT_DISCOVERY_INTERVAL, DEFAULT_STATUS_INTERVAL};
use shelly_cloud_core::{BridgeConfig, TlsVerification, WritePolicy};

/// Keyring service name; entries are keyed `<profile>/password`.
pub const KEYRING_SERVICE: &str = "shelly-cloud";

/// Generic password variable consulted after the profile's own.
pub const PASSWORD_ENV: &str = "SHELLY_PASSWORD";

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("no credentials configured for profile '{profile}'")]
    NoCredentials { profile: String },

    #[error("profile '{name}' not found in config")]
    UnknownProfile { name: String },

    #[error("keyring error: {0}")]
    Keyring(#[from] keyring::Error),

    #[error("failed to serialize config: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

// ── TOML config structs ─────────────────────────────────────────────

/// Top-level TOML configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    /// Default profile name.
    pub default_profile: Option<String>,

    /// Global defaults.
    #[serde(default)]
    pub defaults: Defaults,

    /// Named account profiles.
    #[serde(default)]
    pub profiles: BTreeMap<String, Profile>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_profile: Some("default".into()),
            defaults: Defaults::default(),
            profiles: BTreeMap::new(),
        }
    }
}

impl Config {
    /// The profile to use when none is named explicitly.
    pub fn active_profile_name(&self) -> &str {
        self.default_profile.as_deref().unwrap_or("default")
    }

    pub fn profile(&self, name: &str) -> Result<&Profile, ConfigError> {
        self.profiles
            .get(name)
            .ok_or_else(|| ConfigError::UnknownProfile { name: name.into() })
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Defaults {
    /// Request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout: u64,

    /// Status poll period, e.g. `"10s"`.
    #[serde(default = "default_status_interval")]
    pub status_interval: String,

    /// Device-list poll period, e.g. `"15m"`.
    #[serde(default = "default_discovery_interval")]
    pub discovery_interval: String,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            timeout: default_timeout(),
            status_interval: default_status_interval(),
            discovery_interval: default_discovery_interval(),
        }
    }
}

fn default_timeout() -> u64 {
    30
}
fn default_status_interval() -> String {
    humantime::format_duration(DEFAULT_STATUS_INTERVAL).to_string()
}
fn default_discovery_interval() -> String {
    humantime::format_duration(DEFAULT_DISCOVERY_INTERVAL).to_string()
}

/// A named Shelly Cloud account.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Profile {
    /// Account e-mail.
    pub username: Option<String>,

    /// Password (plaintext, prefer keyring or env var).
    pub password: Option<String>,

    /// Environment variable name containing the password.
    pub password_env: Option<String>,

    /// Login host override.
    pub auth_url: Option<String>,

    /// Cache behaviour of relay commands.
    #[serde(default)]
    pub write_policy: WritePolicy,

    /// Path to a custom CA certificate.
    pub ca_cert: Option<PathBuf>,

    /// Override request timeout (seconds).
    pub timeout: Option<u64>,

    pub status_interval: Option<String>,

    pub discovery_interval: Option<String>,
}

// ── Config file path ────────────────────────────────────────────────

/// Resolve the config file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    ProjectDirs::from("cloud", "shelly", "shelly-cloud").map_or_else(
        || {
            let mut p = dirs_fallback();
            p.push("config.toml");
            p
        },
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

fn dirs_fallback() -> PathBuf {
    let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
    p.push(".config");
    p.push("shelly-cloud");
    p
}

// ── Config loading ──────────────────────────────────────────────────

/// Load the full Config from the canonical file + environment.
pub fn load_config() -> Result<Config, ConfigError> {
    load_config_from(&config_path())
}

/// Load from a specific file + environment. A missing file is not an error.
///
/// Environment overrides use `__` as the nesting separator, e.g.
/// `SHELLY_DEFAULTS__TIMEOUT=10`.
pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    let figment = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed("SHELLY_").split("__"));

    let config: Config = figment.extract()?;
    Ok(config)
}

/// Load config, returning a default if it can't be read.
pub fn load_config_or_default() -> Config {
    load_config().unwrap_or_default()
}

// ── Config saving ───────────────────────────────────────────────────

/// Serialize config to TOML and write to the canonical config path.
pub fn save_config(cfg: &Config) -> Result<(), ConfigError> {
    save_config_to(cfg, &config_path())
}

pub fn save_config_to(cfg: &Config, path: &Path) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let toml_str = toml::to_string_pretty(cfg)?;
    std::fs::write(path, toml_str)?;
    Ok(())
}

// ── Durations ───────────────────────────────────────────────────────

/// Parse a humantime interval such as `"10s"` or `"15m"`.
pub fn parse_interval(field: &str, raw: &str) -> Result<Duration, ConfigError> {
    humantime::parse_duration(raw.trim()).map_err(|e| ConfigError::Validation {
        field: field.into(),
        reason: format!("'{raw}': {e}"),
    })
}

// ── Credential resolution ───────────────────────────────────────────

/// Resolve the account password without CLI flags.
///
/// Order: the profile's `password_env` variable, `SHELLY_PASSWORD`, the
/// system keyring, then plaintext `password` in the profile.
pub fn resolve_password(profile: &Profile, profile_name: &str) -> Result<SecretString, ConfigError> {
    resolve_password_with(
        profile,
        profile_name,
        |name| std::env::var(name).ok(),
        |name| keyring_password(name).ok().flatten(),
    )
}

fn resolve_password_with(
    profile: &Profile,
    profile_name: &str,
    env: impl Fn(&str) -> Option<String>,
    keyring: impl Fn(&str) -> Option<String>,
) -> Result<SecretString, ConfigError> {
    // 1. Profile's password_env → env var lookup
    if let Some(pw) = profile.password_env.as_deref().and_then(&env) {
        return Ok(SecretString::from(pw));
    }

    // 2. Generic env var
    if let Some(pw) = env(PASSWORD_ENV) {
        return Ok(SecretString::from(pw));
    }

    // 3. System keyring
    if let Some(pw) = keyring(profile_name) {
        return Ok(SecretString::from(pw));
    }

    // 4. Plaintext in config
    if let Some(ref pw) = profile.password {
        return Ok(SecretString::from(pw.clone()));
    }

    Err(ConfigError::NoCredentials {
        profile: profile_name.into(),
    })
}

fn keyring_entry(profile_name: &str) -> Result<keyring::Entry, ConfigError> {
    Ok(keyring::Entry::new(
        KEYRING_SERVICE,
        &format!("{profile_name}/password"),
    )?)
}

/// Read the stored password for a profile. `Ok(None)` when nothing is stored.
pub fn keyring_password(profile_name: &str) -> Result<Option<String>, ConfigError> {
    match keyring_entry(profile_name)?.get_password() {
        Ok(pw) => Ok(Some(pw)),
        Err(keyring::Error::NoEntry) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// Store a profile's password in the system keyring.
pub fn store_password(profile_name: &str, password: &SecretString) -> Result<(), ConfigError> {
    keyring_entry(profile_name)?.set_password(password.expose_secret())?;
    Ok(())
}

// ── Profile → BridgeConfig ──────────────────────────────────────────

/// Build a `BridgeConfig` from a profile with no CLI overrides.
pub fn profile_to_bridge_config(
    profile: &Profile,
    profile_name: &str,
    defaults: &Defaults,
) -> Result<BridgeConfig, ConfigError> {
    let username = profile
        .username
        .clone()
        .ok_or_else(|| ConfigError::NoCredentials {
            profile: profile_name.into(),
        })?;
    let password = resolve_password(profile, profile_name)?;
    build_bridge_config(profile, defaults, username, password)
}

/// Assemble a `BridgeConfig` from already-resolved credentials.
pub fn build_bridge_config(
    profile: &Profile,
    defaults: &Defaults,
    username: String,
    password: SecretString,
) -> Result<BridgeConfig, ConfigError> {
    let raw_url = profile.auth_url.as_deref().unwrap_or(DEFAULT_AUTH_URL);
    let auth_url: Url = raw_url.parse().map_err(|_| ConfigError::Validation {
        field: "auth_url".into(),
        reason: format!("invalid URL: {raw_url}"),
    })?;

    let status_interval = parse_interval(
        "status_interval",
        profile
            .status_interval
            .as_deref()
            .unwrap_or(&defaults.status_interval),
    )?;
    let discovery_interval = parse_interval(
        "discovery_interval",
        profile
            .discovery_interval
            .as_deref()
            .unwrap_or(&defaults.discovery_interval),
    )?;

    let mut config = BridgeConfig::new(username, password, auth_url);
    config.timeout = Duration::from_secs(profile.timeout.unwrap_or(defaults.timeout));
    config.status_interval = status_interval;
    config.discovery_interval = discovery_interval;
    config.write_policy = profile.write_policy;
    if let Some(ref ca) = profile.ca_cert {
        config.tls = TlsVerification::CustomCa(ca.clone());
    }
    Ok(config)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use pretty_assertions::assert_eq;
    use secrecy::ExposeSecret;

    use super::*;

    const SAMPLE: &str = r#"
default_profile = "home"

[defaults]
timeout = 20
status_interval = "5s"

[profiles.home]
username = "me@example.com"
password_env = "HOME_SHELLY_PASSWORD"
write_policy = "on-success"

[profiles.cabin]
username = "cabin@example.com"
password = "plain"
auth_url = "https://shelly-eu.example"
discovery_interval = "1h"
"#;

    fn sample_config() -> Config {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, SAMPLE).unwrap();
        load_config_from(&path).unwrap()
    }

    #[test]
    fn loads_profiles_and_keeps_missing_defaults() {
        let config = sample_config();

        assert_eq!(config.active_profile_name(), "home");
        assert_eq!(config.defaults.timeout, 20);
        assert_eq!(config.defaults.status_interval, "5s");
        assert_eq!(config.defaults.discovery_interval, "15m");
        assert_eq!(
            config.profile("home").unwrap().write_policy,
            WritePolicy::OnSuccess
        );
        assert!(matches!(
            config.profile("office"),
            Err(ConfigError::UnknownProfile { .. })
        ));
    }

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = load_config_from(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(config.active_profile_name(), "default");
        assert!(config.profiles.is_empty());
    }

    #[test]
    fn intervals_parse_as_humantime() {
        assert_eq!(parse_interval("x", "10s").unwrap(), Duration::from_secs(10));
        assert_eq!(parse_interval("x", " 15m ").unwrap(), Duration::from_secs(900));
        assert!(matches!(
            parse_interval("status_interval", "soon"),
            Err(ConfigError::Validation { .. })
        ));
    }

    #[test]
    fn profile_overrides_defaults_in_bridge_config() {
        let config = sample_config();
        let cabin = config.profile("cabin").unwrap();

        let bridge = build_bridge_config(
            cabin,
            &config.defaults,
            "cabin@example.com".into(),
            SecretString::from("plain"),
        )
        .unwrap();

        assert_eq!(bridge.auth_url.as_str(), "https://shelly-eu.example/");
        assert_eq!(bridge.timeout, Duration::from_secs(20));
        assert_eq!(bridge.status_interval, Duration::from_secs(5));
        assert_eq!(bridge.discovery_interval, Duration::from_secs(3600));
        assert_eq!(bridge.write_policy, WritePolicy::Always);
    }

    #[test]
    fn bad_auth_url_is_rejected() {
        let profile = Profile {
            auth_url: Some("not a url".into()),
            ..Profile::default()
        };
        let err = build_bridge_config(
            &profile,
            &Defaults::default(),
            "me".into(),
            SecretString::from("pw"),
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::Validation { ref field, .. } if field == "auth_url"));
    }

    #[test]
    fn password_resolution_order() {
        let profile = Profile {
            password_env: Some("HOME_PW".into()),
            password: Some("plain".into()),
            ..Profile::default()
        };
        let no_keyring = |_: &str| None;

        let env_all = |name: &str| match name {
            "HOME_PW" => Some("from-profile-env".to_string()),
            PASSWORD_ENV => Some("from-generic-env".to_string()),
            _ => None,
        };
        let pw = resolve_password_with(&profile, "home", env_all, no_keyring).unwrap();
        assert_eq!(pw.expose_secret(), "from-profile-env");

        let env_generic = |name: &str| (name == PASSWORD_ENV).then(|| "from-generic-env".to_string());
        let pw = resolve_password_with(&profile, "home", env_generic, no_keyring).unwrap();
        assert_eq!(pw.expose_secret(), "from-generic-env");

        let no_env = |_: &str| None;
        let keyring = |name: &str| (name == "home").then(|| "from-keyring".to_string());
        let pw = resolve_password_with(&profile, "home", no_env, keyring).unwrap();
        assert_eq!(pw.expose_secret(), "from-keyring");

        let pw = resolve_password_with(&profile, "home", no_env, no_keyring).unwrap();
        assert_eq!(pw.expose_secret(), "plain");

        let bare = Profile::default();
        assert!(matches!(
            resolve_password_with(&bare, "home", no_env, no_keyring),
            Err(ConfigError::NoCredentials { .. })
        ));
    }
}
