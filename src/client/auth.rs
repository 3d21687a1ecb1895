//! Machine account login against the Bitwarden identity service.
//!
//! Access tokens have the form `0.<client_id>.<client_secret>:<base64 key>`.
//! The credential pair is exchanged at `connect/token` for a bearer token
//! scoped to the secrets API; the login call also persists a state record to
//! the path the caller supplies, which is part of its signature contract.

use base64::Engine;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{debug, info};
use uuid::Uuid;
use zeroize::{Zeroize, ZeroizeOnDrop};

use super::{BitwardenClient, Session};
use crate::errors::{ProviderError, Result};

/// OAuth scope requested for secrets API access.
const SECRETS_SCOPE: &str = "api.secrets";

/// Parsed machine account access token.
#[derive(Zeroize, ZeroizeOnDrop)]
pub(crate) struct AccessToken {
    #[zeroize(skip)]
    pub client_id: Uuid,
    pub client_secret: String,
    pub encryption_key: String,
}

impl AccessToken {
    /// Parse and structurally validate a raw access token.
    pub fn parse(raw: &str) -> Result<Self> {
        let (credentials, key) = raw.split_once(':').ok_or_else(|| {
            ProviderError::auth("Invalid access token: missing encryption key separator")
        })?;

        let parts: Vec<&str> = credentials.split('.').collect();
        if parts.len() != 3 {
            return Err(ProviderError::auth(
                "Invalid access token: expected version, client id and client secret",
            ));
        }

        if parts[0] != "0" {
            return Err(ProviderError::auth(format!(
                "Invalid access token: unsupported version '{}'",
                parts[0]
            )));
        }

        let client_id = Uuid::parse_str(parts[1]).map_err(|_| {
            ProviderError::auth("Invalid access token: client id is not a valid UUID")
        })?;

        if key.is_empty()
            || base64::engine::general_purpose::STANDARD.decode(key).is_err()
        {
            return Err(ProviderError::auth(
                "Invalid access token: encryption key is not valid base64",
            ));
        }

        Ok(Self {
            client_id,
            client_secret: parts[2].to_string(),
            encryption_key: key.to_string(),
        })
    }
}

impl std::fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccessToken")
            .field("client_id", &self.client_id)
            .field("client_secret", &"[REDACTED]")
            .field("encryption_key", &"[REDACTED]")
            .finish()
    }
}

/// Token grant returned by the identity service.
#[derive(Debug, Deserialize)]
struct IdentityTokenResponse {
    access_token: String,
    expires_in: u64,
    #[serde(default)]
    token_type: String,
    #[serde(default)]
    scope: String,
}

/// Login metadata persisted to the caller-supplied state file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginState {
    pub client_id: Uuid,
    pub token_type: String,
    pub scope: String,
    pub expires_at: DateTime<Utc>,
}

/// Auth sub-client.
pub struct AuthClient<'a> {
    client: &'a BitwardenClient,
}

impl<'a> AuthClient<'a> {
    pub(crate) fn new(client: &'a BitwardenClient) -> Self {
        Self { client }
    }

    /// Log in with a machine account access token.
    ///
    /// Exchanges the token's credential pair for a bearer session and writes
    /// the login state to `state_file`. The session lives on the client handle
    /// until it is dropped. Malformed tokens and identity rejections surface
    /// as [`ProviderError::Auth`]; unreachable identity hosts surface as
    /// [`ProviderError::Upstream`].
    pub async fn login_access_token(&self, access_token: &str, state_file: &Path) -> Result<()> {
        let token = AccessToken::parse(access_token)?;

        let url = self.client.identity_url().join("connect/token").map_err(|e| {
            ProviderError::config(format!("Invalid identity endpoint: {}", e))
        })?;

        debug!(client_id = %token.client_id, url = %url, "Requesting machine account token grant");

        let client_id = token.client_id.to_string();
        let response = self
            .client
            .http()
            .post(url.clone())
            .form(&[
                ("grant_type", "client_credentials"),
                ("scope", SECRETS_SCOPE),
                ("client_id", client_id.as_str()),
                ("client_secret", token.client_secret.as_str()),
            ])
            .send()
            .await
            .map_err(|e| ProviderError::upstream(format!("Request to {} failed: {}", url, e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let snippet: String = body.chars().take(200).collect();
            return Err(ProviderError::auth(format!(
                "Identity service rejected the access token ({}): {}",
                status, snippet
            )));
        }

        let grant: IdentityTokenResponse = response.json().await.map_err(|e| {
            ProviderError::upstream(format!("Invalid response body from {}: {}", url, e))
        })?;

        let expires_at = i64::try_from(grant.expires_in)
            .ok()
            .and_then(Duration::try_seconds)
            .and_then(|lifetime| Utc::now().checked_add_signed(lifetime))
            .ok_or_else(|| {
                ProviderError::upstream(format!(
                    "Identity service returned an invalid token lifetime: {} seconds",
                    grant.expires_in
                ))
            })?;

        let state = LoginState {
            client_id: token.client_id,
            token_type: if grant.token_type.is_empty() {
                "Bearer".to_string()
            } else {
                grant.token_type.clone()
            },
            scope: if grant.scope.is_empty() {
                SECRETS_SCOPE.to_string()
            } else {
                grant.scope.clone()
            },
            expires_at,
        };
        tokio::fs::write(state_file, serde_json::to_vec(&state)?).await?;

        self.client
            .install_session(Session { bearer: grant.access_token, expires_at })
            .await;

        info!(
            client_id = %token.client_id,
            expires_at = %expires_at,
            "Logged in to Bitwarden identity service"
        );

        Ok(())
    }
}
