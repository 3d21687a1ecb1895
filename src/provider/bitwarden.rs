//! Bitwarden Secrets Manager provider.
//!
//! Wraps a [`BitwardenClient`] behind the [`SecretProvider`] contract. The
//! provider keeps no secret cache: every `list` and `read` call fetches the
//! organization's secret catalog fresh from the vendor API, so a value changed
//! in Bitwarden is observed on the very next read. A `read` therefore costs
//! two round trips, one to resolve the name to a secret id and one to fetch
//! the value.

use std::collections::HashMap;

use tempfile::NamedTempFile;
use tokio::sync::RwLock;
use tracing::{debug, info};
use uuid::Uuid;

use crate::client::{BitwardenClient, BitwardenSettings, SecretIdentifierResponse};
use crate::config::BitwardenProviderResource;
use crate::errors::{ProviderError, Result};
use crate::provider::{ProviderContext, SecretProvider};
use crate::services::Plaintext;

use async_trait::async_trait;

/// Name to id mapping built from one listing call, never reused across calls.
#[derive(Debug, Default)]
struct SecretCatalog {
    /// Secret names in vendor listing order, duplicates collapsed.
    order: Vec<String>,
    index: HashMap<String, Uuid>,
}

impl SecretCatalog {
    /// Duplicate names collapse to a single entry; the last row wins the id.
    fn from_identifiers(rows: Vec<SecretIdentifierResponse>) -> Self {
        let mut order = Vec::with_capacity(rows.len());
        let mut index = HashMap::with_capacity(rows.len());
        for row in rows {
            if !index.contains_key(&row.key) {
                order.push(row.key.clone());
            }
            index.insert(row.key, row.id);
        }
        Self { order, index }
    }

    fn names(&self) -> Vec<String> {
        self.order.clone()
    }

    fn resolve(&self, name: &str) -> Option<Uuid> {
        self.index.get(name).copied()
    }

    fn len(&self) -> usize {
        self.order.len()
    }
}

/// Live vendor connection held between startup and shutdown.
///
/// The login state file must outlive the client session, so the temp file
/// handle rides along and is unlinked when the session drops.
struct ProviderSession {
    client: BitwardenClient,
    #[allow(dead_code)]
    state_file: NamedTempFile,
}

/// Secret provider backed by the Bitwarden Secrets Manager API.
pub struct BitwardenSecretProvider {
    name: String,
    settings: BitwardenProviderResource,
    organization_id: Uuid,
    context: ProviderContext,
    session: RwLock<Option<ProviderSession>>,
}

impl BitwardenSecretProvider {
    /// Build a provider instance from validated settings.
    ///
    /// Settings problems (missing access token, malformed organization id)
    /// surface here so a broken instance never reaches `startup`.
    pub fn new(
        name: impl Into<String>,
        context: ProviderContext,
        settings: BitwardenProviderResource,
    ) -> Result<Self> {
        settings.validate()?;
        let organization_id = settings.organization_uuid()?;

        Ok(Self {
            name: name.into(),
            settings,
            organization_id,
            context,
            session: RwLock::new(None),
        })
    }

    async fn fetch_catalog(
        client: &BitwardenClient,
        organization_id: Uuid,
    ) -> Result<SecretCatalog> {
        let listing = client.secrets().list(organization_id).await?;
        Ok(SecretCatalog::from_identifiers(listing.data))
    }
}

#[async_trait]
impl SecretProvider for BitwardenSecretProvider {
    fn name(&self) -> &str {
        &self.name
    }

    async fn startup(&self) -> Result<()> {
        info!(provider = %self.name, "Starting Bitwarden secret provider");

        let encrypted = self.settings.access_token.as_ref().ok_or_else(|| {
            ProviderError::startup("Access token is not configured for this provider")
        })?;
        let access_token = self
            .context
            .encryption()
            .decrypt(encrypted)
            .map_err(|e| ProviderError::startup(format!("Failed to decrypt access token: {}", e)))?;

        // The vendor login call persists machine account state to a file path,
        // so every session gets a private temp file for it.
        let state_file = NamedTempFile::new().map_err(|e| {
            ProviderError::startup(format!("Failed to create login state file: {}", e))
        })?;

        let client = BitwardenClient::new(BitwardenSettings {
            api_url: self.settings.api_url.clone(),
            identity_url: self.settings.identity_url.clone(),
        })
        .map_err(|e| ProviderError::startup(format!("Failed to build Bitwarden client: {}", e)))?;

        client
            .auth()
            .login_access_token(access_token.expose(), state_file.path())
            .await
            .map_err(|e| ProviderError::startup(format!("Bitwarden login failed: {}", e)))?;

        *self.session.write().await = Some(ProviderSession { client, state_file });
        info!(
            provider = %self.name,
            organization_id = %self.organization_id,
            "Bitwarden secret provider ready"
        );
        Ok(())
    }

    async fn shutdown(&self) -> Result<()> {
        match self.session.write().await.take() {
            Some(_session) => {
                info!(provider = %self.name, "Bitwarden secret provider shut down");
            }
            None => {
                debug!(provider = %self.name, "Shutdown called with no active session");
            }
        }
        Ok(())
    }

    async fn list(&self) -> Result<Vec<String>> {
        let guard = self.session.read().await;
        let session = guard.as_ref().ok_or(ProviderError::NotStarted)?;

        let catalog = Self::fetch_catalog(&session.client, self.organization_id).await?;
        debug!(provider = %self.name, count = catalog.len(), "Listed secret names");
        Ok(catalog.names())
    }

    async fn read(&self, name: &str) -> Result<Plaintext> {
        if name.is_empty() {
            return Err(ProviderError::invalid_name("secret name must not be empty"));
        }

        let guard = self.session.read().await;
        let session = guard.as_ref().ok_or(ProviderError::NotStarted)?;

        let catalog = Self::fetch_catalog(&session.client, self.organization_id).await?;
        let secret_id = catalog
            .resolve(name)
            .ok_or_else(|| ProviderError::not_found(name))?;

        let secret = session.client.secrets().get(secret_id).await?;
        debug!(
            provider = %self.name,
            name = %name,
            secret_id = %secret_id,
            "Read secret value"
        );
        Ok(Plaintext::new(secret.value))
    }
}

impl std::fmt::Debug for BitwardenSecretProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BitwardenSecretProvider")
            .field("name", &self.name)
            .field("api_url", &self.settings.api_url)
            .field("organization_id", &self.organization_id)
            .finish()
    }
}
