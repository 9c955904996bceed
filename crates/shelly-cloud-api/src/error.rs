use std::fmt;

use indexmap::IndexMap;
use serde_json::Value;
use thiserror::Error;

/// Top-level error type for the `shelly-cloud-api` crate.
///
/// Covers every failure mode of the cloud endpoints: authentication,
/// transport, the `{isok, errors}` envelope, and malformed bodies.
/// `shelly-cloud-core` maps these into bridge-level diagnostics.
#[derive(Debug, Error)]
pub enum Error {
    // ── Authentication ──────────────────────────────────────────────
    /// Login rejected (`isok: false` from `/auth/login`).
    #[error("Authentication failed: {errors}")]
    Authentication { errors: ApiErrors },

    /// HTTP 401 on a session-scoped call (token expired or revoked).
    #[error("Unauthorized -- re-authentication required")]
    Unauthorized,

    // ── Transport ───────────────────────────────────────────────────
    /// HTTP transport error (connection refused, DNS failure, timeout, etc.)
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// URL parsing error.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// TLS setup or certificate error.
    #[error("TLS error: {0}")]
    Tls(String),

    // ── Cloud API ───────────────────────────────────────────────────
    /// `isok: false` envelope on a session-scoped call.
    #[error("Cloud API error: {errors}")]
    Api { errors: ApiErrors },

    // ── Data ────────────────────────────────────────────────────────
    /// JSON deserialization failed, with the raw body for debugging.
    #[error("Deserialization error: {message}")]
    Deserialization { message: String, body: String },
}

impl Error {
    /// Returns `true` if the session is no longer valid and a new login
    /// might resolve it.
    pub fn is_auth_expired(&self) -> bool {
        matches!(self, Self::Unauthorized)
    }

    /// Returns `true` if this is a transient network error.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Transport(e) => e.is_timeout() || e.is_connect(),
            _ => false,
        }
    }

    /// The structured `title -> message` pairs, if the cloud sent any.
    pub fn api_errors(&self) -> Option<&ApiErrors> {
        match self {
            Self::Authentication { errors } | Self::Api { errors } => Some(errors),
            _ => None,
        }
    }
}

// ── ApiErrors ───────────────────────────────────────────────────────

/// The `errors` mapping of a failed envelope, in wire order.
///
/// ```json
/// { "isok": false, "errors": { "bad_channel": "out of range" } }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ApiErrors(Vec<(String, String)>);

impl ApiErrors {
    pub fn new(pairs: Vec<(String, String)>) -> Self {
        Self(pairs)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Iterate `(title, message)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(t, m)| (t.as_str(), m.as_str()))
    }

    pub fn contains(&self, title: &str) -> bool {
        self.0.iter().any(|(t, _)| t == title)
    }

    /// One `"<title> : <message>"` line per pair, the form used in logs.
    pub fn lines(&self) -> impl Iterator<Item = String> + '_ {
        self.0.iter().map(|(t, m)| format!("{t} : {m}"))
    }
}

impl From<IndexMap<String, Value>> for ApiErrors {
    fn from(map: IndexMap<String, Value>) -> Self {
        Self(
            map.into_iter()
                .map(|(title, message)| {
                    let message = match message {
                        Value::String(s) => s,
                        other => other.to_string(),
                    };
                    (title, message)
                })
                .collect(),
        )
    }
}

impl fmt::Display for ApiErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            return f.write_str("no error details");
        }
        for (i, line) in self.lines().enumerate() {
            if i > 0 {
                f.write_str("; ")?;
            }
            f.write_str(&line)?;
        }
        Ok(())
    }
}
