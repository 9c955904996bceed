// ── Runtime bridge configuration ──
//
// These types describe *how* to talk to Shelly Cloud: credentials, polling
// cadence and write behaviour. They never touch disk; the CLI builds a
// `BridgeConfig` from its profile and hands it in.

use std::path::PathBuf;
use std::time::Duration;

use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use url::Url;

pub const DEFAULT_AUTH_URL: &str = shelly_cloud_api::CloudClient::DEFAULT_AUTH_URL;

pub const DEFAULT_STATUS_INTERVAL: Duration = Duration::from_secs(10);
pub const DEFAULT_DISCOVERY_INTERVAL: Duration = Duration::from_secs(15 * 60);
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Account login. The password is hashed before it leaves the process.
#[derive(Debug, Clone)]
pub struct Credentials {
    pub username: String,
    pub password: SecretString,
}

/// What a relay command does to the cached relay state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum WritePolicy {
    /// Patch the cache with the requested state whatever the cloud answered.
    #[default]
    Always,
    /// Patch the cache only when the cloud accepted the command.
    OnSuccess,
}

/// TLS verification strategy.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum TlsVerification {
    /// System CA store.
    #[default]
    SystemDefaults,
    /// Additionally trust a custom CA certificate file.
    CustomCa(PathBuf),
}

/// Configuration for one bridge instance.
#[derive(Debug, Clone)]
pub struct BridgeConfig {
    pub credentials: Credentials,
    /// Login host; the per-user API host comes back from the login call.
    pub auth_url: Url,
    pub tls: TlsVerification,
    /// Per-request timeout.
    pub timeout: Duration,
    /// Period of the status poll. Zero disables the periodic task.
    pub status_interval: Duration,
    /// Period of the device-list poll. Zero disables the periodic task.
    pub discovery_interval: Duration,
    pub write_policy: WritePolicy,
}

impl BridgeConfig {
    /// Config with default endpoints and intervals for the given account.
    pub fn new(username: impl Into<String>, password: SecretString, auth_url: Url) -> Self {
        Self {
            credentials: Credentials {
                username: username.into(),
                password,
            },
            auth_url,
            tls: TlsVerification::default(),
            timeout: DEFAULT_TIMEOUT,
            status_interval: DEFAULT_STATUS_INTERVAL,
            discovery_interval: DEFAULT_DISCOVERY_INTERVAL,
            write_policy: WritePolicy::default(),
        }
    }
}
