//! Provider type registration.
//!
//! The host discovers provider types through a [`SecretProviderRegistry`].
//! Each [`SecretProviderType`] describes one extension point: its stable type
//! id, the settings form it renders, and how to turn a persisted settings
//! record into a running [`SecretProvider`].

use std::collections::HashMap;
use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, info};
use utoipa::openapi::{RefOr, Schema};
use utoipa::PartialSchema;

use crate::config::{BitwardenProviderResource, FormField, CATEGORY_NAME, RESOURCE_TYPE};
use crate::errors::{ProviderError, Result};
use crate::provider::bitwarden::BitwardenSecretProvider;
use crate::provider::{ProviderContext, SecretProvider};

/// Extension point type id of the Bitwarden provider.
pub const BITWARDEN_TYPE_ID: &str = "BITWARDEN";

/// One installable secret provider type.
pub trait SecretProviderType: Send + Sync + std::fmt::Debug {
    /// Stable extension point identifier.
    fn type_id(&self) -> &'static str;

    /// Category name shown in the host UI.
    fn category_name(&self) -> &'static str;

    /// Resource type id under which instance settings are persisted.
    fn resource_type(&self) -> &'static str;

    /// Settings record written when an instance is first created.
    fn default_settings(&self) -> Result<Value>;

    /// Field descriptors for the host settings form.
    fn form_fields(&self) -> Vec<FormField>;

    /// JSON schema of the settings record.
    fn settings_schema(&self) -> RefOr<Schema>;

    /// Validation hook the host runs before persisting instance settings.
    fn validate(&self, settings: &Value) -> Result<()>;

    /// Build a provider instance from its persisted settings record.
    fn create_provider(
        &self,
        name: &str,
        context: &ProviderContext,
        settings: Option<&Value>,
    ) -> Result<Arc<dyn SecretProvider>>;
}

/// Extension point for the Bitwarden Secrets Manager provider.
#[derive(Debug, Default, Clone, Copy)]
pub struct BitwardenProviderType;

impl BitwardenProviderType {
    fn decode_settings(&self, settings: &Value) -> Result<BitwardenProviderResource> {
        serde_json::from_value(settings.clone())
            .map_err(|e| ProviderError::config(format!("Invalid provider settings: {}", e)))
    }
}

impl SecretProviderType for BitwardenProviderType {
    fn type_id(&self) -> &'static str {
        BITWARDEN_TYPE_ID
    }

    fn category_name(&self) -> &'static str {
        CATEGORY_NAME
    }

    fn resource_type(&self) -> &'static str {
        RESOURCE_TYPE
    }

    fn default_settings(&self) -> Result<Value> {
        Ok(serde_json::to_value(BitwardenProviderResource::default())?)
    }

    fn form_fields(&self) -> Vec<FormField> {
        BitwardenProviderResource::form_fields()
    }

    fn settings_schema(&self) -> RefOr<Schema> {
        BitwardenProviderResource::schema()
    }

    fn validate(&self, settings: &Value) -> Result<()> {
        self.decode_settings(settings)?.validate()
    }

    fn create_provider(
        &self,
        name: &str,
        context: &ProviderContext,
        settings: Option<&Value>,
    ) -> Result<Arc<dyn SecretProvider>> {
        let value = settings.ok_or_else(|| {
            ProviderError::config(format!(
                "Secret provider configuration missing for: {}",
                name
            ))
        })?;
        let resource = self.decode_settings(value)?;
        let provider = BitwardenSecretProvider::new(name, context.clone(), resource)?;

        debug!(provider = %name, provider_type = %self.type_id(), "Created secret provider");
        Ok(Arc::new(provider))
    }
}

/// Registry of the provider types available to the host.
pub struct SecretProviderRegistry {
    types: HashMap<&'static str, Arc<dyn SecretProviderType>>,
}

impl SecretProviderRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self { types: HashMap::new() }
    }

    /// Create a registry with every built-in provider type registered.
    pub fn with_builtin_types() -> Self {
        let mut registry = Self::new();
        registry.register(Arc::new(BitwardenProviderType));
        registry
    }

    /// Register a provider type, replacing any previous entry for its id.
    pub fn register(&mut self, provider_type: Arc<dyn SecretProviderType>) {
        info!(provider_type = %provider_type.type_id(), "Registering secret provider type");
        self.types.insert(provider_type.type_id(), provider_type);
    }

    /// Look up a provider type by id.
    pub fn get(&self, type_id: &str) -> Option<Arc<dyn SecretProviderType>> {
        self.types.get(type_id).cloned()
    }

    /// Whether a provider type is registered.
    pub fn has_type(&self, type_id: &str) -> bool {
        self.types.contains_key(type_id)
    }

    /// Registered type ids, sorted.
    pub fn registered_types(&self) -> Vec<&'static str> {
        let mut types: Vec<&'static str> = self.types.keys().copied().collect();
        types.sort_unstable();
        types
    }

    /// Build a provider instance through its registered type.
    pub fn create_provider(
        &self,
        type_id: &str,
        name: &str,
        context: &ProviderContext,
        settings: Option<&Value>,
    ) -> Result<Arc<dyn SecretProvider>> {
        let provider_type = self.get(type_id).ok_or_else(|| {
            ProviderError::config(format!("Secret provider type '{}' is not registered", type_id))
        })?;
        provider_type.create_provider(name, context, settings)
    }
}

impl Default for SecretProviderRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl Clone for SecretProviderRegistry {
    fn clone(&self) -> Self {
        Self { types: self.types.clone() }
    }
}

impl std::fmt::Debug for SecretProviderRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SecretProviderRegistry")
            .field("types", &self.registered_types())
            .finish()
    }
}
