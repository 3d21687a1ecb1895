//! Secret provider contract and the Bitwarden implementation.
//!
//! The host programs against [`SecretProvider`]: a named instance with a
//! startup/shutdown lifecycle and two data calls, `list` and `read`. Instances
//! are built by a [`registry::SecretProviderType`] from persisted settings and
//! a [`ProviderContext`] carrying the host capabilities they may use.

pub mod bitwarden;
pub mod registry;

use async_trait::async_trait;
use std::sync::Arc;

use crate::errors::Result;
use crate::services::{Plaintext, SystemEncryption, SystemEncryptionConfig};

pub use bitwarden::BitwardenSecretProvider;
pub use registry::{
    BitwardenProviderType, SecretProviderRegistry, SecretProviderType, BITWARDEN_TYPE_ID,
};

/// Host capabilities handed to a provider at construction time.
#[derive(Debug, Clone)]
pub struct ProviderContext {
    encryption: Arc<SystemEncryption>,
}

impl ProviderContext {
    /// Build a context around an existing encryption service.
    pub fn new(encryption: Arc<SystemEncryption>) -> Self {
        Self { encryption }
    }

    /// Build a context from environment configuration.
    pub fn from_env() -> Result<Self> {
        let config = SystemEncryptionConfig::from_env()?;
        Ok(Self::new(Arc::new(SystemEncryption::new(&config)?)))
    }

    /// The host's encryption service.
    pub fn encryption(&self) -> &SystemEncryption {
        &self.encryption
    }
}

/// Contract every secret provider implements for the host.
///
/// Lifecycle: the host calls [`SecretProvider::startup`] once after
/// construction and [`SecretProvider::shutdown`] when the instance is removed
/// or the gateway stops. Data calls are only valid in between; outside that
/// window they fail with [`crate::errors::ProviderError::NotStarted`]. The
/// host serializes calls per instance, so implementations need no internal
/// ordering discipline beyond making `&self` access safe.
#[async_trait]
pub trait SecretProvider: Send + Sync + std::fmt::Debug {
    /// Provider instance name as configured in the host.
    fn name(&self) -> &str;

    /// Prepare the provider for data calls.
    async fn startup(&self) -> Result<()>;

    /// Release the provider's resources. Safe to call again after success.
    async fn shutdown(&self) -> Result<()>;

    /// Names of every secret currently visible to this provider.
    async fn list(&self) -> Result<Vec<String>>;

    /// Decrypted value of the named secret.
    async fn read(&self, name: &str) -> Result<Plaintext>;
}
