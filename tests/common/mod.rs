//! Shared infrastructure for provider integration tests.
//!
//! Provides wiremock-based stand-ins for the two Bitwarden endpoints the
//! provider talks to:
//! - identity service (`POST /connect/token` machine account login)
//! - secrets API (organization listing and secret fetch)

#![allow(dead_code)]
#![allow(clippy::duplicate_mod)]

use std::sync::Arc;

use serde_json::json;
use wiremock::matchers::{body_string_contains, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use bitwarden_secret_provider::{
    BitwardenProviderType, ProviderContext, SecretProvider, SecretProviderType, SystemEncryption,
    SystemEncryptionConfig,
};

/// Organization every test secret belongs to.
pub const ORG_ID: &str = "f0e4c2f7-6c4a-4c9f-9f6a-3f1c2d8e9b01";

/// Machine account access token in the vendor's `0.<id>.<secret>:<key>` shape.
pub const ACCESS_TOKEN: &str =
    "0.ec2c1d46-6a4b-4751-a310-af9601317f2d.C2IgxjjLF7qSshsbwe8JGcbM075YXw:X8vbvA0bduihIDe/qrzIQQ==";

/// Bearer token the identity mock hands out.
pub const BEARER: &str = "test-bearer-token";

pub const DB_SECRET_ID: &str = "11111111-1111-4111-8111-111111111111";
pub const API_SECRET_ID: &str = "22222222-2222-4222-8222-222222222222";

/// Mock Bitwarden endpoints for one test.
pub struct MockBitwarden {
    /// Secrets API server.
    pub api: MockServer,
    /// Identity (login) server.
    pub identity: MockServer,
}

impl MockBitwarden {
    /// Start both servers with a passing login endpoint.
    ///
    /// The login mock only matches the client credentials grant the provider
    /// is expected to send, so a malformed login request fails the test.
    pub async fn start() -> Self {
        let api = MockServer::start().await;
        let identity = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/connect/token"))
            .and(body_string_contains("grant_type=client_credentials"))
            .and(body_string_contains("scope=api.secrets"))
            .and(body_string_contains("client_id=ec2c1d46-6a4b-4751-a310-af9601317f2d"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "access_token": BEARER,
                "expires_in": 3600,
                "token_type": "Bearer",
                "scope": "api.secrets"
            })))
            .mount(&identity)
            .await;

        Self { api, identity }
    }

    /// Start both servers with an identity endpoint that rejects every login.
    pub async fn start_with_rejected_login() -> Self {
        let api = MockServer::start().await;
        let identity = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/connect/token"))
            .respond_with(
                ResponseTemplate::new(400).set_body_json(json!({ "error": "invalid_client" })),
            )
            .mount(&identity)
            .await;

        Self { api, identity }
    }

    /// Start both servers with a login grant carrying the given lifetime.
    pub async fn start_with_grant_lifetime(expires_in: u64) -> Self {
        let api = MockServer::start().await;
        let identity = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/connect/token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "access_token": BEARER,
                "expires_in": expires_in,
                "token_type": "Bearer",
                "scope": "api.secrets"
            })))
            .mount(&identity)
            .await;

        Self { api, identity }
    }

    /// Mount the organization secrets listing, in the given order.
    pub async fn mount_secret_list(&self, secrets: &[(&str, &str)]) {
        let rows: Vec<serde_json::Value> = secrets
            .iter()
            .map(|(id, key)| {
                json!({
                    "id": id,
                    "organizationId": ORG_ID,
                    "key": key,
                })
            })
            .collect();

        Mock::given(method("GET"))
            .and(path(format!("/organizations/{}/secrets", ORG_ID)))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "secrets": rows,
                "projects": [],
                "object": "list"
            })))
            .mount(&self.api)
            .await;
    }

    /// Mount an unlimited secret fetch endpoint for one secret.
    pub async fn mount_secret_value(&self, id: &str, key: &str, value: &str) {
        Mock::given(method("GET"))
            .and(path(format!("/secrets/{}", id)))
            .respond_with(ResponseTemplate::new(200).set_body_json(secret_body(id, key, value)))
            .mount(&self.api)
            .await;
    }

    /// Mount a secret fetch endpoint that serves the value exactly once.
    ///
    /// After the single response the mock expires, letting a later mounted
    /// mock for the same secret take over. Tests use this to simulate a value
    /// rotated between two reads.
    pub async fn mount_secret_value_once(&self, id: &str, key: &str, value: &str) {
        Mock::given(method("GET"))
            .and(path(format!("/secrets/{}", id)))
            .respond_with(ResponseTemplate::new(200).set_body_json(secret_body(id, key, value)))
            .up_to_n_times(1)
            .mount(&self.api)
            .await;
    }

    /// Mount a failing secrets API answering every request with `status`.
    pub async fn mount_api_failure(&self, status: u16) {
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(status).set_body_json(json!({ "message": "test failure" })),
            )
            .mount(&self.api)
            .await;
    }

    /// Requests the secrets API has received so far.
    pub async fn api_requests(&self) -> Vec<wiremock::Request> {
        self.api.received_requests().await.unwrap_or_default()
    }
}

fn secret_body(id: &str, key: &str, value: &str) -> serde_json::Value {
    json!({
        "id": id,
        "organizationId": ORG_ID,
        "projectId": null,
        "key": key,
        "value": value,
        "note": "",
        "creationDate": "2024-05-01T12:00:00Z",
        "revisionDate": "2024-05-14T08:30:00Z",
        "object": "secret"
    })
}

/// Encryption service with a fixed key, shared by provider and test.
pub fn test_encryption() -> Arc<SystemEncryption> {
    let config = SystemEncryptionConfig {
        master_key_base64: "QkJCQkJCQkJCQkJCQkJCQkJCQkJCQkJCQkJCQkJCQkI=".to_string(),
        key_version: "test".to_string(),
    };
    Arc::new(SystemEncryption::new(&config).unwrap())
}

/// Settings record the host would persist for a provider pointed at `mock`.
pub fn settings_value(mock: &MockBitwarden, encryption: &SystemEncryption) -> serde_json::Value {
    let token = encryption.encrypt(ACCESS_TOKEN).unwrap();
    json!({
        "apiUrl": mock.api.uri(),
        "identityUrl": mock.identity.uri(),
        "accessToken": token,
        "organizationId": ORG_ID,
        "projectId": ""
    })
}

/// Create a provider against `mock` and run its startup.
pub async fn ready_provider(mock: &MockBitwarden) -> Arc<dyn SecretProvider> {
    let encryption = test_encryption();
    let context = ProviderContext::new(encryption.clone());
    let settings = settings_value(mock, &encryption);

    let provider = BitwardenProviderType
        .create_provider("production", &context, Some(&settings))
        .unwrap();
    provider.startup().await.unwrap();
    provider
}
