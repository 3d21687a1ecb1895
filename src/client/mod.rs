//! Thin typed client for the Bitwarden Secrets Manager API.
//!
//! Mirrors the vendor SDK's client shape: one [`BitwardenClient`] handle with
//! sub-client accessors ([`BitwardenClient::auth`], [`BitwardenClient::secrets`])
//! for the slices of the API this provider uses. Login installs a bearer
//! session on the handle; the data calls present it on every request.
//!
//! The client performs no retries and applies no timeouts beyond reqwest's
//! connection defaults; failures surface immediately as [`ProviderError`]
//! values. Secret values cross the wire exactly as the API returns them.

pub mod auth;
pub mod secrets;

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use tokio::sync::RwLock;
use url::Url;

use crate::config::{DEFAULT_API_URL, DEFAULT_IDENTITY_URL};
use crate::errors::{ProviderError, Result};

pub use auth::{AuthClient, LoginState};
pub use secrets::{SecretIdentifierResponse, SecretIdentifiersResponse, SecretResponse, SecretsApi};

/// Connection settings for [`BitwardenClient`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BitwardenSettings {
    /// Base URL of the secrets API.
    pub api_url: String,
    /// Base URL of the identity service used for machine account login.
    pub identity_url: String,
}

impl Default for BitwardenSettings {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            identity_url: DEFAULT_IDENTITY_URL.to_string(),
        }
    }
}

/// Bearer session installed by a successful login.
pub(crate) struct Session {
    pub bearer: String,
    pub expires_at: DateTime<Utc>,
}

/// Handle to the Bitwarden Secrets Manager service.
pub struct BitwardenClient {
    http: reqwest::Client,
    api_url: Url,
    identity_url: Url,
    session: RwLock<Option<Session>>,
}

impl BitwardenClient {
    /// Build an unauthenticated client from connection settings.
    pub fn new(settings: BitwardenSettings) -> Result<Self> {
        let api_url = parse_base_url(&settings.api_url)?;
        let identity_url = parse_base_url(&settings.identity_url)?;

        let http = reqwest::Client::builder()
            .user_agent(concat!("bitwarden-secret-provider/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| ProviderError::config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self { http, api_url, identity_url, session: RwLock::new(None) })
    }

    /// Access the auth API.
    pub fn auth(&self) -> AuthClient<'_> {
        AuthClient::new(self)
    }

    /// Access the secrets API.
    pub fn secrets(&self) -> SecretsApi<'_> {
        SecretsApi::new(self)
    }

    pub(crate) fn http(&self) -> &reqwest::Client {
        &self.http
    }

    pub(crate) fn identity_url(&self) -> &Url {
        &self.identity_url
    }

    pub(crate) async fn install_session(&self, session: Session) {
        *self.session.write().await = Some(session);
    }

    pub(crate) async fn bearer(&self) -> Result<String> {
        let guard = self.session.read().await;
        let session =
            guard.as_ref().ok_or_else(|| ProviderError::auth("Client is not logged in"))?;
        if session.expires_at <= Utc::now() {
            return Err(ProviderError::auth("Session bearer token has expired"));
        }
        Ok(session.bearer.clone())
    }

    /// Resolve a path relative to the API base URL.
    pub(crate) fn api_endpoint(&self, path: &str) -> Result<Url> {
        self.api_url.join(path).map_err(|e| {
            ProviderError::config(format!("Invalid API endpoint path '{}': {}", path, e))
        })
    }

    /// Bearer-authenticated GET returning a decoded JSON body.
    pub(crate) async fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<T> {
        let bearer = self.bearer().await?;

        let response = self
            .http
            .get(url.clone())
            .bearer_auth(bearer)
            .send()
            .await
            .map_err(|e| ProviderError::upstream(format!("Request to {} failed: {}", url, e)))?;

        let response = check_status(&url, response).await?;

        response.json().await.map_err(|e| {
            ProviderError::upstream(format!("Invalid response body from {}: {}", url, e))
        })
    }
}

impl std::fmt::Debug for BitwardenClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BitwardenClient")
            .field("api_url", &self.api_url.as_str())
            .field("identity_url", &self.identity_url.as_str())
            .field("session", &"[REDACTED]")
            .finish()
    }
}

/// Parse a base URL, normalizing the path so joins append below it.
fn parse_base_url(raw: &str) -> Result<Url> {
    let mut url = Url::parse(raw)
        .map_err(|e| ProviderError::config(format!("Invalid base URL '{}': {}", raw, e)))?;

    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }

    Ok(url)
}

/// Map non-success statuses onto the provider error kinds.
pub(crate) async fn check_status(
    url: &Url,
    response: reqwest::Response,
) -> Result<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    let snippet: String = body.chars().take(200).collect();

    match status.as_u16() {
        401 | 403 => Err(ProviderError::auth(format!("{} returned {}: {}", url, status, snippet))),
        _ => Err(ProviderError::upstream(format!("{} returned {}: {}", url, status, snippet))),
    }
}
