//! Integration tests for the extension point registry.
//!
//! Exercises the path a host takes: discover the provider type by id, render
//! its settings form, validate a persisted record, and build a running
//! provider from it.

mod common;

use bitwarden_secret_provider::config::{
    FormFieldKind, DEFAULT_API_URL, DEFAULT_IDENTITY_URL,
};
use bitwarden_secret_provider::{
    BitwardenProviderResource, ProviderContext, ProviderError, SecretProviderRegistry,
    BITWARDEN_TYPE_ID,
};
use serde_json::json;

use common::{settings_value, test_encryption, MockBitwarden, DB_SECRET_ID, ORG_ID};

#[tokio::test]
async fn test_registry_builds_working_provider() {
    let mock = MockBitwarden::start().await;
    mock.mount_secret_list(&[(DB_SECRET_ID, "db-password")]).await;
    mock.mount_secret_value(DB_SECRET_ID, "db-password", "hunter2").await;

    let registry = SecretProviderRegistry::with_builtin_types();
    let encryption = test_encryption();
    let context = ProviderContext::new(encryption.clone());
    let settings = settings_value(&mock, &encryption);

    let provider = registry
        .create_provider(BITWARDEN_TYPE_ID, "production", &context, Some(&settings))
        .unwrap();
    assert_eq!(provider.name(), "production");

    provider.startup().await.unwrap();
    assert_eq!(provider.list().await.unwrap(), vec!["db-password"]);
    assert_eq!(
        provider.read("db-password").await.unwrap().expose(),
        "hunter2"
    );
    provider.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_missing_settings_yield_config_error() {
    let registry = SecretProviderRegistry::with_builtin_types();
    let context = ProviderContext::new(test_encryption());

    let err = registry
        .create_provider(BITWARDEN_TYPE_ID, "production", &context, None)
        .unwrap_err();

    assert!(matches!(err, ProviderError::Config { .. }));
    assert!(err
        .to_string()
        .contains("Secret provider configuration missing for: production"));
}

#[tokio::test]
async fn test_unknown_type_is_rejected() {
    let registry = SecretProviderRegistry::with_builtin_types();
    let context = ProviderContext::new(test_encryption());

    let err = registry
        .create_provider("HASHICORP", "production", &context, None)
        .unwrap_err();
    assert!(err.to_string().contains("not registered"));
}

#[test]
fn test_blank_urls_default_to_cloud_endpoints() {
    let settings = json!({
        "apiUrl": "",
        "identityUrl": "   ",
        "organizationId": ORG_ID
    });

    let resource: BitwardenProviderResource = serde_json::from_value(settings).unwrap();
    assert_eq!(resource.api_url, DEFAULT_API_URL);
    assert_eq!(resource.identity_url, DEFAULT_IDENTITY_URL);
}

#[test]
fn test_settings_validation_through_extension_point() {
    let registry = SecretProviderRegistry::with_builtin_types();
    let provider_type = registry.get(BITWARDEN_TYPE_ID).unwrap();

    // No access token configured.
    let err = provider_type
        .validate(&json!({ "organizationId": ORG_ID }))
        .unwrap_err();
    assert!(matches!(err, ProviderError::Config { .. }));

    let encryption = test_encryption();
    let token = encryption.encrypt("0.client.secret:key").unwrap();
    let complete = json!({
        "accessToken": token,
        "organizationId": ORG_ID
    });
    assert!(provider_type.validate(&complete).is_ok());
}

#[test]
fn test_form_fields_mirror_settings_record() {
    let registry = SecretProviderRegistry::with_builtin_types();
    let provider_type = registry.get(BITWARDEN_TYPE_ID).unwrap();

    let fields = provider_type.form_fields();
    let labels: Vec<&str> = fields.iter().map(|f| f.label.as_str()).collect();
    assert_eq!(
        labels,
        ["API URL", "Identity URL", "Access Token", "Organization ID", "Project ID"]
    );

    let token_field = fields.iter().find(|f| f.name == "accessToken").unwrap();
    assert_eq!(token_field.kind, FormFieldKind::Secret);
    assert!(token_field.required);
}
