// Shelly Cloud authentication
//
// One form POST to `{auth_url}/auth/login` with the SHA-1 of the password.
// The response carries the bearer token and the per-account API host that
// every other endpoint is served from.

use secrecy::{ExposeSecret, SecretString};
use sha1::{Digest, Sha1};
use tracing::debug;
use url::Url;

use crate::client::{CloudClient, missing_data};
use crate::error::Error;
use crate::models::LoginData;

/// An authenticated account session.
///
/// Immutable once created; a new login produces a new `Session`.
/// The token is redacted from `Debug` output.
#[derive(Debug, Clone)]
pub struct Session {
    token: SecretString,
    api_base_url: Url,
    notifications_urls: Vec<String>,
}

impl Session {
    pub fn new(token: SecretString, api_base_url: Url, notifications_urls: Vec<String>) -> Self {
        Self {
            token,
            api_base_url,
            notifications_urls,
        }
    }

    /// Bearer token for session-scoped calls.
    pub fn token(&self) -> &SecretString {
        &self.token
    }

    /// Per-account API host (`user_api_url`).
    pub fn api_base_url(&self) -> &Url {
        &self.api_base_url
    }

    pub fn notifications_urls(&self) -> &[String] {
        &self.notifications_urls
    }
}

/// Lowercase hex SHA-1 digest, the password form the login endpoint expects.
pub fn sha1_hex(input: &str) -> String {
    let mut hasher = Sha1::new();
    hasher.update(input.as_bytes());
    hex::encode(hasher.finalize())
}

impl CloudClient {
    /// Authenticate with email and password.
    ///
    /// `POST {auth_url}/auth/login` with form `{email, password: sha1-hex}`.
    /// A rejected login returns [`Error::Authentication`] with the error
    /// pairs from the response body.
    pub async fn login(&self, email: &str, password: &SecretString) -> Result<Session, Error> {
        let url = self.auth_endpoint("auth/login")?;
        let hashed = sha1_hex(password.expose_secret());
        let form = [("email", email), ("password", hashed.as_str())];

        debug!(email, "logging in");

        let data: LoginData = match self.post_form(url, &form, None).await {
            Ok(data) => data.ok_or_else(|| missing_data("auth/login"))?,
            Err(Error::Api { errors }) => return Err(Error::Authentication { errors }),
            Err(e) => return Err(e),
        };

        let api_base_url = Url::parse(&data.user_api_url)?;
        debug!(api = %api_base_url, "login successful");

        Ok(Session::new(
            SecretString::from(data.token),
            api_base_url,
            data.notifications_urls,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sha1_hex_matches_known_digest() {
        assert_eq!(sha1_hex("password"), "5baa61e4c9b93f3f0682250b6cf8331b7ee68fd8");
    }

    #[test]
    fn session_debug_redacts_token() {
        let session = Session::new(
            SecretString::from("super-secret-token".to_string()),
            Url::parse("https://shelly-2-eu.shelly.cloud").expect("url"),
            Vec::new(),
        );
        let rendered = format!("{session:?}");
        assert!(!rendered.contains("super-secret-token"));
        assert_eq!(session.token().expose_secret(), "super-secret-token");
    }
}
