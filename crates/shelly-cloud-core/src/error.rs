// ── Core error types ──
//
// Errors surfaced by the bridge. Consumers never see HTTP status codes or
// JSON failures directly: the `From<shelly_cloud_api::Error>` impl folds
// transport-layer errors into domain variants.

use shelly_cloud_api::ApiErrors;
use thiserror::Error;

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Session errors ───────────────────────────────────────────────
    #[error("Authentication failed: {message}")]
    AuthenticationFailed { message: String },

    #[error("Not logged in to Shelly Cloud")]
    Unauthenticated,

    #[error("Shelly Cloud session expired -- re-authentication required")]
    SessionExpired,

    // ── Connection errors ────────────────────────────────────────────
    #[error("Cannot connect to Shelly Cloud at {url}: {reason}")]
    ConnectionFailed { url: String, reason: String },

    #[error("Shelly Cloud request timed out")]
    Timeout,

    // ── API errors ───────────────────────────────────────────────────
    #[error("Shelly Cloud rejected the request: {message}")]
    Api { message: String, errors: ApiErrors },

    // ── Configuration errors ─────────────────────────────────────────
    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Internal error: {0}")]
    Internal(String),
}

impl CoreError {
    /// Errors that only a fresh login can clear.
    pub fn needs_login(&self) -> bool {
        matches!(
            self,
            Self::Unauthenticated | Self::SessionExpired | Self::AuthenticationFailed { .. }
        )
    }
}

// ── Conversion from transport-layer errors ───────────────────────────

impl From<shelly_cloud_api::Error> for CoreError {
    fn from(err: shelly_cloud_api::Error) -> Self {
        use shelly_cloud_api::Error as Api;

        match err {
            Api::Authentication { errors } => CoreError::AuthenticationFailed {
                message: errors.to_string(),
            },
            Api::Unauthorized => CoreError::SessionExpired,
            Api::Transport(ref e) => {
                if e.is_timeout() {
                    CoreError::Timeout
                } else if e.is_connect() {
                    CoreError::ConnectionFailed {
                        url: e
                            .url()
                            .map(ToString::to_string)
                            .unwrap_or_else(|| "<unknown>".into()),
                        reason: e.to_string(),
                    }
                } else {
                    CoreError::Api {
                        message: e.to_string(),
                        errors: ApiErrors::default(),
                    }
                }
            }
            Api::InvalidUrl(e) => CoreError::Config {
                message: format!("Invalid URL: {e}"),
            },
            Api::Tls(msg) => CoreError::ConnectionFailed {
                url: String::new(),
                reason: format!("TLS error: {msg}"),
            },
            Api::Api { errors } => CoreError::Api {
                message: errors.to_string(),
                errors,
            },
            Api::Deserialization { message, body: _ } => {
                CoreError::Internal(format!("Deserialization error: {message}"))
            }
        }
    }
}
