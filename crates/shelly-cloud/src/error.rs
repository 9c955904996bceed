//! CLI error types with miette diagnostics.
//!
//! Maps `CoreError` and `ConfigError` variants into user-facing errors with
//! actionable help text.

use miette::Diagnostic;
use thiserror::Error;

use shelly_cloud_config::ConfigError;
use shelly_cloud_core::CoreError;

/// Process exit codes.
pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const AUTH: i32 = 3;
    pub const NOT_FOUND: i32 = 4;
    pub const CONNECTION: i32 = 7;
    pub const TIMEOUT: i32 = 8;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Connection ───────────────────────────────────────────────────
    #[error("Could not connect to Shelly Cloud at {url}")]
    #[diagnostic(
        code(shelly::connection_failed),
        help(
            "Check your network connection and the profile's auth_url.\n\
             URL: {url}"
        )
    )]
    ConnectionFailed {
        url: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("Request to Shelly Cloud timed out")]
    #[diagnostic(
        code(shelly::timeout),
        help("Increase the timeout with --timeout or in the profile.")
    )]
    Timeout,

    // ── Authentication ───────────────────────────────────────────────
    #[error("Authentication failed: {message}")]
    #[diagnostic(
        code(shelly::auth_failed),
        help(
            "Verify the account e-mail and password.\n\
             Run: shelly-cloud config set-password"
        )
    )]
    AuthFailed { message: String },

    #[error("Shelly Cloud session expired")]
    #[diagnostic(code(shelly::session_expired), help("Run the command again to log in."))]
    SessionExpired,

    #[error("No credentials configured for profile '{profile}'")]
    #[diagnostic(
        code(shelly::no_credentials),
        help(
            "Configure credentials with: shelly-cloud config init\n\
             Or set SHELLY_USERNAME and SHELLY_PASSWORD."
        )
    )]
    NoCredentials { profile: String },

    // ── Resources ────────────────────────────────────────────────────
    #[error("{resource_type} '{identifier}' not found")]
    #[diagnostic(
        code(shelly::not_found),
        help("Run: shelly-cloud {list_command} to see available {resource_type}s")
    )]
    NotFound {
        resource_type: String,
        identifier: String,
        list_command: String,
    },

    // ── Commands ─────────────────────────────────────────────────────
    #[error("Shelly Cloud refused to switch {device} channel {channel} {turn}")]
    #[diagnostic(
        code(shelly::command_rejected),
        help("Run with -v to see the cloud's error messages.")
    )]
    CommandRejected {
        device: String,
        channel: u32,
        turn: String,
    },

    // ── API ──────────────────────────────────────────────────────────
    #[error("API error: {message}")]
    #[diagnostic(code(shelly::api_error))]
    ApiError { message: String },

    // ── Validation ───────────────────────────────────────────────────
    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(shelly::validation))]
    Validation { field: String, reason: String },

    // ── Configuration ────────────────────────────────────────────────
    #[error("Profile '{name}' not found in configuration")]
    #[diagnostic(
        code(shelly::profile_not_found),
        help(
            "Available profiles: {available}\n\
             Create one with: shelly-cloud config init"
        )
    )]
    ProfileNotFound { name: String, available: String },

    #[error("Configuration error: {message}")]
    #[diagnostic(code(shelly::config))]
    Config { message: String },

    // ── IO ───────────────────────────────────────────────────────────
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::ConnectionFailed { .. } => exit_code::CONNECTION,
            Self::Timeout => exit_code::TIMEOUT,
            Self::AuthFailed { .. } | Self::SessionExpired | Self::NoCredentials { .. } => {
                exit_code::AUTH
            }
            Self::NotFound { .. } | Self::ProfileNotFound { .. } => exit_code::NOT_FOUND,
            Self::Validation { .. } => exit_code::USAGE,
            _ => exit_code::GENERAL,
        }
    }
}

// ── CoreError → CliError mapping ─────────────────────────────────────

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::ConnectionFailed { url, reason } => CliError::ConnectionFailed {
                url,
                source: reason.into(),
            },

            CoreError::Timeout => CliError::Timeout,

            CoreError::AuthenticationFailed { message } => CliError::AuthFailed { message },

            CoreError::Unauthenticated => CliError::AuthFailed {
                message: "not logged in".into(),
            },

            CoreError::SessionExpired => CliError::SessionExpired,

            CoreError::Api { message, errors: _ } => CliError::ApiError { message },

            CoreError::Config { message } => CliError::Config { message },

            CoreError::Internal(message) => CliError::ApiError { message },
        }
    }
}

// ── ConfigError → CliError mapping ───────────────────────────────────

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::NoCredentials { profile } => CliError::NoCredentials { profile },
            ConfigError::UnknownProfile { name } => CliError::ProfileNotFound {
                name,
                available: "(see: shelly-cloud config profiles)".into(),
            },
            ConfigError::Validation { field, reason } => CliError::Validation { field, reason },
            ConfigError::Io(e) => CliError::Io(e),
            other => CliError::Config {
                message: other.to_string(),
            },
        }
    }
}
