//! Provider settings resource.
//!
//! The gateway persists one [`BitwardenProviderResource`] per configured
//! provider instance and hands it back to the extension point when the
//! provider is created. Blank URL fields are replaced with the Bitwarden cloud
//! defaults at every construction point, matching what the settings form
//! advertises; all other fields pass through untouched.

use serde::{Deserialize, Deserializer, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::errors::{ProviderError, Result};
use crate::services::EncryptedSecret;

/// Bitwarden cloud API base URL, used when the resource leaves the field blank.
pub const DEFAULT_API_URL: &str = "https://api.bitwarden.com";

/// Bitwarden cloud identity base URL, used when the resource leaves the field blank.
pub const DEFAULT_IDENTITY_URL: &str = "https://identity.bitwarden.com";

/// Resource type id under which provider settings are persisted by the host.
pub const RESOURCE_TYPE: &str = "bitwarden-secret-provider";

/// Category name shown for this provider in the host UI.
pub const CATEGORY_NAME: &str = "Bitwarden Secrets Manager";

/// Form category all provider fields render under.
pub const FORM_CATEGORY: &str = "CUSTOM SETTINGS";

fn default_api_url() -> String {
    DEFAULT_API_URL.to_string()
}

fn default_identity_url() -> String {
    DEFAULT_IDENTITY_URL.to_string()
}

fn de_api_url<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = String::deserialize(deserializer)?;
    Ok(if value.trim().is_empty() { default_api_url() } else { value })
}

fn de_identity_url<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = String::deserialize(deserializer)?;
    Ok(if value.trim().is_empty() { default_identity_url() } else { value })
}

/// Persisted settings for one Bitwarden secret provider instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BitwardenProviderResource {
    /// Bitwarden API base URL.
    #[serde(default = "default_api_url", deserialize_with = "de_api_url")]
    #[validate(url(message = "apiUrl must be a valid URL"))]
    pub api_url: String,

    /// Bitwarden identity base URL used for machine account login.
    #[serde(default = "default_identity_url", deserialize_with = "de_identity_url")]
    #[validate(url(message = "identityUrl must be a valid URL"))]
    pub identity_url: String,

    /// Machine account access token, encrypted at rest by the host.
    #[serde(default)]
    pub access_token: Option<EncryptedSecret>,

    /// Organization whose secrets this provider exposes.
    #[serde(default)]
    #[validate(length(min = 1, message = "organizationId cannot be empty"))]
    pub organization_id: String,

    /// Project scope. Accepted and persisted, but not applied to lookups yet.
    #[serde(default)]
    pub project_id: String,
}

impl Default for BitwardenProviderResource {
    fn default() -> Self {
        Self {
            api_url: default_api_url(),
            identity_url: default_identity_url(),
            access_token: None,
            organization_id: String::new(),
            project_id: String::new(),
        }
    }
}

impl BitwardenProviderResource {
    /// Builds a resource, replacing blank URL fields with the cloud defaults.
    pub fn new(
        api_url: impl Into<String>,
        identity_url: impl Into<String>,
        access_token: Option<EncryptedSecret>,
        organization_id: impl Into<String>,
        project_id: impl Into<String>,
    ) -> Self {
        let api_url = api_url.into();
        let identity_url = identity_url.into();
        Self {
            api_url: if api_url.trim().is_empty() { default_api_url() } else { api_url },
            identity_url: if identity_url.trim().is_empty() {
                default_identity_url()
            } else {
                identity_url
            },
            access_token,
            organization_id: organization_id.into(),
            project_id: project_id.into(),
        }
    }

    /// Validate the resource before a provider is built from it.
    pub fn validate(&self) -> Result<()> {
        Validate::validate(self)
            .map_err(|e| ProviderError::config(format!("Invalid provider settings: {}", e)))?;
        self.validate_custom()
    }

    /// Checks the validator crate cannot express.
    fn validate_custom(&self) -> Result<()> {
        Uuid::parse_str(&self.organization_id).map_err(|e| {
            ProviderError::config(format!(
                "organizationId '{}' is not a valid UUID: {}",
                self.organization_id, e
            ))
        })?;

        if !self.project_id.trim().is_empty() {
            Uuid::parse_str(&self.project_id).map_err(|e| {
                ProviderError::config(format!(
                    "projectId '{}' is not a valid UUID: {}",
                    self.project_id, e
                ))
            })?;
        }

        if self.access_token.is_none() {
            return Err(ProviderError::config("accessToken is not configured"));
        }

        Ok(())
    }

    /// Organization id as a UUID.
    pub fn organization_uuid(&self) -> Result<Uuid> {
        Uuid::parse_str(&self.organization_id).map_err(|e| {
            ProviderError::config(format!(
                "organizationId '{}' is not a valid UUID: {}",
                self.organization_id, e
            ))
        })
    }

    /// Field descriptors for the host settings form.
    pub fn form_fields() -> Vec<FormField> {
        vec![
            FormField {
                name: "apiUrl".to_string(),
                label: "API URL".to_string(),
                description: "The Bitwarden API URL.".to_string(),
                category: FORM_CATEGORY.to_string(),
                kind: FormFieldKind::Text,
                default_value: Some(DEFAULT_API_URL.to_string()),
                required: true,
            },
            FormField {
                name: "identityUrl".to_string(),
                label: "Identity URL".to_string(),
                description: "The Bitwarden identity URL used for machine account login.".to_string(),
                category: FORM_CATEGORY.to_string(),
                kind: FormFieldKind::Text,
                default_value: Some(DEFAULT_IDENTITY_URL.to_string()),
                required: true,
            },
            FormField {
                name: "accessToken".to_string(),
                label: "Access Token".to_string(),
                description: "The machine account access token to authenticate with.".to_string(),
                category: FORM_CATEGORY.to_string(),
                kind: FormFieldKind::Secret,
                default_value: None,
                required: true,
            },
            FormField {
                name: "organizationId".to_string(),
                label: "Organization ID".to_string(),
                description: "The ID of the organization whose secrets are exposed.".to_string(),
                category: FORM_CATEGORY.to_string(),
                kind: FormFieldKind::Text,
                default_value: None,
                required: false,
            },
            FormField {
                name: "projectId".to_string(),
                label: "Project ID".to_string(),
                description: "The ID of the project containing the secrets.".to_string(),
                category: FORM_CATEGORY.to_string(),
                kind: FormFieldKind::Text,
                default_value: None,
                required: false,
            },
        ]
    }
}

/// Rendering kind for a settings form field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum FormFieldKind {
    /// Plain text input.
    Text,
    /// Write-only secret input; the host encrypts the value before persisting.
    Secret,
}

/// One field descriptor in the host settings form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FormField {
    pub name: String,
    pub label: String,
    pub description: String,
    pub category: String,
    pub kind: FormFieldKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_value: Option<String>,
    pub required: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn token() -> EncryptedSecret {
        EncryptedSecret {
            ciphertext: "Y2lwaGVydGV4dA==".to_string(),
            nonce: "bm9uY2Vub25jZQ==".to_string(),
            key_version: "test".to_string(),
        }
    }

    #[test]
    fn test_default_resource_uses_cloud_urls() {
        let resource = BitwardenProviderResource::default();
        assert_eq!(resource.api_url, DEFAULT_API_URL);
        assert_eq!(resource.identity_url, DEFAULT_IDENTITY_URL);
        assert!(resource.access_token.is_none());
        assert!(resource.organization_id.is_empty());
    }

    #[test]
    fn test_new_replaces_blank_urls() {
        let resource = BitwardenProviderResource::new(
            "   ",
            "",
            None,
            "f0e4c2f7-6c4a-4c9f-9f6a-3f1c2d8e9b01",
            "",
        );
        assert_eq!(resource.api_url, DEFAULT_API_URL);
        assert_eq!(resource.identity_url, DEFAULT_IDENTITY_URL);
    }

    #[test]
    fn test_new_keeps_explicit_urls() {
        let resource = BitwardenProviderResource::new(
            "https://bw.example.com",
            "https://id.example.com",
            None,
            "f0e4c2f7-6c4a-4c9f-9f6a-3f1c2d8e9b01",
            "",
        );
        assert_eq!(resource.api_url, "https://bw.example.com");
        assert_eq!(resource.identity_url, "https://id.example.com");
    }

    #[test]
    fn test_deserialize_missing_urls_applies_defaults() {
        let resource: BitwardenProviderResource =
            serde_json::from_str(r#"{"organizationId": "abc"}"#).unwrap();
        assert_eq!(resource.api_url, DEFAULT_API_URL);
        assert_eq!(resource.identity_url, DEFAULT_IDENTITY_URL);
        assert_eq!(resource.organization_id, "abc");
    }

    #[test]
    fn test_deserialize_blank_urls_applies_defaults() {
        let json = r#"{"apiUrl": "  ", "identityUrl": "", "organizationId": "abc"}"#;
        let resource: BitwardenProviderResource = serde_json::from_str(json).unwrap();
        assert_eq!(resource.api_url, DEFAULT_API_URL);
        assert_eq!(resource.identity_url, DEFAULT_IDENTITY_URL);
    }

    #[test]
    fn test_deserialize_explicit_urls_pass_through() {
        let json = r#"{"apiUrl": "https://bw.example.com", "identityUrl": "https://id.example.com"}"#;
        let resource: BitwardenProviderResource = serde_json::from_str(json).unwrap();
        assert_eq!(resource.api_url, "https://bw.example.com");
        assert_eq!(resource.identity_url, "https://id.example.com");
    }

    #[test]
    fn test_serialize_uses_camel_case() {
        let resource = BitwardenProviderResource::default();
        let json = serde_json::to_string(&resource).unwrap();
        assert!(json.contains("\"apiUrl\""));
        assert!(json.contains("\"identityUrl\""));
        assert!(json.contains("\"organizationId\""));
        assert!(json.contains("\"projectId\""));
    }

    #[test]
    fn test_validate_requires_access_token() {
        let resource = BitwardenProviderResource::new(
            "",
            "",
            None,
            "f0e4c2f7-6c4a-4c9f-9f6a-3f1c2d8e9b01",
            "",
        );
        let err = resource.validate().unwrap_err();
        assert!(err.to_string().contains("accessToken"));
    }

    #[test]
    fn test_validate_rejects_bad_organization_id() {
        let resource =
            BitwardenProviderResource::new("", "", Some(token()), "not-a-uuid", "");
        let err = resource.validate().unwrap_err();
        assert!(err.to_string().contains("organizationId"));
    }

    #[test]
    fn test_validate_rejects_bad_project_id() {
        let resource = BitwardenProviderResource::new(
            "",
            "",
            Some(token()),
            "f0e4c2f7-6c4a-4c9f-9f6a-3f1c2d8e9b01",
            "not-a-uuid",
        );
        let err = resource.validate().unwrap_err();
        assert!(err.to_string().contains("projectId"));
    }

    #[test]
    fn test_validate_accepts_complete_resource() {
        let resource = BitwardenProviderResource::new(
            "",
            "",
            Some(token()),
            "f0e4c2f7-6c4a-4c9f-9f6a-3f1c2d8e9b01",
            "",
        );
        assert!(resource.validate().is_ok());
        assert_eq!(
            resource.organization_uuid().unwrap().to_string(),
            "f0e4c2f7-6c4a-4c9f-9f6a-3f1c2d8e9b01"
        );
    }

    #[test]
    fn test_form_fields_cover_all_settings() {
        let fields = BitwardenProviderResource::form_fields();
        assert_eq!(fields.len(), 5);

        let names: Vec<&str> = fields.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, ["apiUrl", "identityUrl", "accessToken", "organizationId", "projectId"]);

        let token_field = fields.iter().find(|f| f.name == "accessToken").unwrap();
        assert_eq!(token_field.kind, FormFieldKind::Secret);
        assert!(token_field.required);

        assert!(fields.iter().all(|f| f.category == FORM_CATEGORY));
    }
}
