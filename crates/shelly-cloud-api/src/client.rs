// Shelly Cloud HTTP client
//
// Wraps `reqwest::Client` with Shelly-specific URL construction, bearer
// auth, and envelope unwrapping. Endpoint groups (auth, devices, relay)
// are implemented as inherent methods in separate files to keep this
// module focused on transport mechanics.

use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::debug;
use url::Url;

use crate::auth::Session;
use crate::error::{ApiErrors, Error};
use crate::models::CloudResponse;
use crate::transport::TransportConfig;

/// Raw HTTP client for the Shelly Cloud REST API.
///
/// Handles the `{ isok, data | errors }` envelope and per-account URL
/// construction. All methods return unwrapped `data` payloads; the
/// envelope is stripped before the caller sees it.
pub struct CloudClient {
    http: reqwest::Client,
    auth_url: Url,
}

impl CloudClient {
    /// Host serving `/auth/login` for every account.
    pub const DEFAULT_AUTH_URL: &'static str = "https://api.shelly.cloud";

    /// Create a new client from a `TransportConfig`.
    ///
    /// `auth_url` is the login host (normally [`Self::DEFAULT_AUTH_URL`]);
    /// device endpoints live on the per-account host returned by login.
    pub fn new(auth_url: Url, transport: &TransportConfig) -> Result<Self, Error> {
        let http = transport.build_client()?;
        Ok(Self { http, auth_url })
    }

    /// Create a client with a pre-built `reqwest::Client`.
    pub fn with_client(http: reqwest::Client, auth_url: Url) -> Self {
        Self { http, auth_url }
    }

    // ── URL builders ─────────────────────────────────────────────────

    /// `{auth_url}/{path}`
    pub(crate) fn auth_endpoint(&self, path: &str) -> Result<Url, Error> {
        join(&self.auth_url, path)
    }

    /// `{user_api_url}/{path}` for the session's account.
    pub(crate) fn session_url(session: &Session, path: &str) -> Result<Url, Error> {
        join(session.api_base_url(), path)
    }

    // ── Request helpers ──────────────────────────────────────────────

    /// POST a form body, optionally with a bearer token, and unwrap the envelope.
    pub(crate) async fn post_form<T: DeserializeOwned>(
        &self,
        url: Url,
        form: &impl Serialize,
        token: Option<&SecretString>,
    ) -> Result<Option<T>, Error> {
        debug!("POST {}", url);

        let mut req = self.http.post(url).form(form);
        if let Some(token) = token {
            req = req.bearer_auth(token.expose_secret());
        }
        let resp = req.send().await.map_err(Error::Transport)?;

        Self::parse_envelope(resp).await
    }

    /// GET with query parameters and a bearer token, and unwrap the envelope.
    pub(crate) async fn get<T: DeserializeOwned>(
        &self,
        url: Url,
        query: &[(&str, String)],
        token: &SecretString,
    ) -> Result<Option<T>, Error> {
        debug!("GET {}", url);

        let resp = self
            .http
            .get(url)
            .query(query)
            .bearer_auth(token.expose_secret())
            .send()
            .await
            .map_err(Error::Transport)?;

        Self::parse_envelope(resp).await
    }

    /// Parse the `{ isok, data, errors }` envelope, returning `data` on
    /// success or an `Error::Api` carrying the error pairs otherwise.
    async fn parse_envelope<T: DeserializeOwned>(
        resp: reqwest::Response,
    ) -> Result<Option<T>, Error> {
        if resp.status() == reqwest::StatusCode::UNAUTHORIZED {
            return Err(Error::Unauthorized);
        }

        let body = resp.text().await.map_err(Error::Transport)?;

        let envelope: CloudResponse<T> =
            serde_json::from_str(&body).map_err(|e| Error::Deserialization {
                message: e.to_string(),
                body: body.clone(),
            })?;

        if envelope.isok {
            Ok(envelope.data)
        } else {
            Err(Error::Api {
                errors: envelope.errors.map(ApiErrors::from).unwrap_or_default(),
            })
        }
    }
}

/// Data was required but the envelope carried none.
pub(crate) fn missing_data(endpoint: &str) -> Error {
    Error::Deserialization {
        message: format!("{endpoint}: response has isok=true but no data"),
        body: String::new(),
    }
}

fn join(base: &Url, path: &str) -> Result<Url, Error> {
    let full = format!("{}/{}", base.as_str().trim_end_matches('/'), path);
    Ok(Url::parse(&full)?)
}
