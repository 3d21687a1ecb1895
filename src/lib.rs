//! # Bitwarden Secret Provider
//!
//! Secret provider module that exposes Bitwarden Secrets Manager machine
//! account secrets to an automation gateway. The gateway discovers the
//! provider through an extension point registry, persists its settings as a
//! resource record, and reads secrets by name through a small async contract.
//!
//! ## Architecture
//!
//! ```text
//! Gateway Extension Point → Secret Provider → Bitwarden Client → Bitwarden Cloud
//!          ↓                       ↓                  ↓
//!   Settings Resource       Host Encryption     Identity Login
//! ```
//!
//! ## Core Components
//!
//! - **Provider**: [`provider::BitwardenSecretProvider`] implements the
//!   host-facing [`provider::SecretProvider`] contract
//! - **Registry**: [`provider::SecretProviderRegistry`] maps extension point
//!   type ids to provider factories
//! - **Client**: [`client::BitwardenClient`] speaks the vendor identity and
//!   secrets APIs over HTTPS
//! - **Encryption**: [`services::SystemEncryption`] decrypts the access token
//!   the host stored in the settings record
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use bitwarden_secret_provider::{
//!     BitwardenProviderType, ProviderContext, Result, SecretProvider, SecretProviderType,
//! };
//! use serde_json::json;
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let context = ProviderContext::from_env()?;
//!     let settings = json!({
//!         "accessToken": {
//!             "ciphertext": "...",
//!             "nonce": "...",
//!             "keyVersion": "default"
//!         },
//!         "organizationId": "f0e4c2f7-6c4a-4c9f-9f6a-3f1c2d8e9b01"
//!     });
//!
//!     let provider =
//!         BitwardenProviderType.create_provider("production", &context, Some(&settings))?;
//!     provider.startup().await?;
//!     for name in provider.list().await? {
//!         println!("{name}");
//!     }
//!     provider.shutdown().await?;
//!     Ok(())
//! }
//! ```

pub mod client;
pub mod config;
pub mod errors;
pub mod observability;
pub mod provider;
pub mod services;

// Re-export commonly used types and traits
pub use config::BitwardenProviderResource;
pub use errors::{ProviderError, Result};
pub use provider::{
    BitwardenProviderType, BitwardenSecretProvider, ProviderContext, SecretProvider,
    SecretProviderRegistry, SecretProviderType, BITWARDEN_TYPE_ID,
};
pub use services::{EncryptedSecret, Plaintext, SystemEncryption, SystemEncryptionConfig};

/// Module version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Module name from Cargo.toml
pub const APP_NAME: &str = env!("CARGO_PKG_NAME");
