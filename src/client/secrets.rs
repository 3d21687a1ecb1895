//! Secrets API calls used by the provider.
//!
//! Two calls cover the whole provider surface: list the identifiers of every
//! secret in an organization, and fetch a single secret by id. Identifier rows
//! keep the vendor's response order; nothing here paginates or filters.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use super::BitwardenClient;
use crate::errors::Result;

/// One row in an organization's secret identifier listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SecretIdentifierResponse {
    pub id: Uuid,
    pub organization_id: Uuid,
    /// Human-readable secret name.
    pub key: String,
}

/// Listing of all secret identifiers in an organization.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecretIdentifiersResponse {
    /// Identifier rows in vendor response order.
    #[serde(rename = "secrets")]
    pub data: Vec<SecretIdentifierResponse>,
}

/// Full secret record, value included.
#[derive(Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SecretResponse {
    pub id: Uuid,
    pub organization_id: Uuid,
    #[serde(default)]
    pub project_id: Option<Uuid>,
    pub key: String,
    pub value: String,
    #[serde(default)]
    pub note: String,
    pub creation_date: DateTime<Utc>,
    pub revision_date: DateTime<Utc>,
}

impl std::fmt::Debug for SecretResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SecretResponse")
            .field("id", &self.id)
            .field("organization_id", &self.organization_id)
            .field("project_id", &self.project_id)
            .field("key", &self.key)
            .field("value", &"[REDACTED]")
            .field("revision_date", &self.revision_date)
            .finish()
    }
}

/// Secrets sub-client.
pub struct SecretsApi<'a> {
    client: &'a BitwardenClient,
}

impl<'a> SecretsApi<'a> {
    pub(crate) fn new(client: &'a BitwardenClient) -> Self {
        Self { client }
    }

    /// List every secret identifier in the organization.
    pub async fn list(&self, organization_id: Uuid) -> Result<SecretIdentifiersResponse> {
        let url =
            self.client.api_endpoint(&format!("organizations/{}/secrets", organization_id))?;

        debug!(organization_id = %organization_id, "Listing secret identifiers");
        self.client.get_json(url).await
    }

    /// Fetch one secret by id, value included.
    pub async fn get(&self, id: Uuid) -> Result<SecretResponse> {
        let url = self.client.api_endpoint(&format!("secrets/{}", id))?;

        debug!(secret_id = %id, "Fetching secret");
        self.client.get_json(url).await
    }
}
