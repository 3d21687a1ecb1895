//! Host encryption capability, AES-256-GCM.
//!
//! The gateway persists provider settings as plain records; secret fields such
//! as the Bitwarden access token are stored as [`EncryptedSecret`] references
//! produced by this service and only decrypted into a [`Plaintext`] scope when
//! the provider starts up.
//!
//! ## Configuration
//!
//! The master key is loaded from the environment:
//! `BWSP_SECRET_ENCRYPTION_KEY` - Base64-encoded 32-byte key
//! `BWSP_SECRET_KEY_VERSION` - optional version tag for rotation tracking

use crate::errors::{ProviderError, Result};
use crate::services::plaintext::Plaintext;
use base64::Engine;
use ring::aead::{self, Aad, BoundKey, Nonce, NonceSequence, UnboundKey, AES_256_GCM};
use ring::rand::{SecureRandom, SystemRandom};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, error, instrument, warn};
use utoipa::ToSchema;

/// Size of AES-256-GCM nonce in bytes
const NONCE_SIZE: usize = 12;

/// Size of AES-256-GCM tag in bytes
const TAG_SIZE: usize = 16;

/// Opaque reference to a secret encrypted at rest.
///
/// This is the form in which the access token lives inside a persisted
/// provider resource. The ciphertext carries the authentication tag; both
/// ciphertext and nonce are base64 so the record serializes cleanly.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct EncryptedSecret {
    /// Base64 ciphertext with the GCM tag appended.
    pub ciphertext: String,
    /// Base64 12-byte nonce used for this secret.
    pub nonce: String,
    /// Version of the master key that produced this record.
    pub key_version: String,
}

/// Configuration for the system encryption service
#[derive(Debug, Clone)]
pub struct SystemEncryptionConfig {
    /// Base64-encoded 32-byte master encryption key
    pub master_key_base64: String,
    /// Key version for rotation tracking
    pub key_version: String,
}

impl SystemEncryptionConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        let master_key_base64 = std::env::var("BWSP_SECRET_ENCRYPTION_KEY").map_err(|_| {
            ProviderError::config(
                "BWSP_SECRET_ENCRYPTION_KEY environment variable not set. \
                 Generate a key with: openssl rand -base64 32",
            )
        })?;

        let key_version =
            std::env::var("BWSP_SECRET_KEY_VERSION").unwrap_or_else(|_| "default".to_string());

        Ok(Self { master_key_base64, key_version })
    }

    /// Fixed-key configuration for tests.
    #[cfg(test)]
    pub fn for_testing() -> Self {
        let test_key = [0x42u8; 32];
        Self {
            master_key_base64: base64::engine::general_purpose::STANDARD.encode(test_key),
            key_version: "test".to_string(),
        }
    }
}

/// Single-use nonce sequence for AES-GCM
struct SingleNonce {
    nonce: Option<[u8; NONCE_SIZE]>,
}

impl SingleNonce {
    fn new(nonce_bytes: [u8; NONCE_SIZE]) -> Self {
        Self { nonce: Some(nonce_bytes) }
    }
}

impl NonceSequence for SingleNonce {
    fn advance(&mut self) -> std::result::Result<Nonce, ring::error::Unspecified> {
        self.nonce.take().map(Nonce::assume_unique_for_key).ok_or(ring::error::Unspecified)
    }
}

/// System encryption service handed to providers through their context.
#[derive(Clone)]
pub struct SystemEncryption {
    key_bytes: Arc<[u8; 32]>,
    key_version: String,
    rng: Arc<SystemRandom>,
}

impl SystemEncryption {
    /// Create a new encryption service from configuration
    pub fn new(config: &SystemEncryptionConfig) -> Result<Self> {
        let key_bytes = base64::engine::general_purpose::STANDARD
            .decode(&config.master_key_base64)
            .map_err(|e| {
                ProviderError::config(format!(
                    "Invalid base64 in BWSP_SECRET_ENCRYPTION_KEY: {}",
                    e
                ))
            })?;

        if key_bytes.len() != 32 {
            return Err(ProviderError::config(format!(
                "BWSP_SECRET_ENCRYPTION_KEY must be 32 bytes (256 bits), got {} bytes",
                key_bytes.len()
            )));
        }

        let mut key_array = [0u8; 32];
        key_array.copy_from_slice(&key_bytes);

        debug!(key_version = %config.key_version, "System encryption service initialized");

        Ok(Self {
            key_bytes: Arc::new(key_array),
            key_version: config.key_version.clone(),
            rng: Arc::new(SystemRandom::new()),
        })
    }

    /// Get the current key version
    pub fn key_version(&self) -> &str {
        &self.key_version
    }

    /// Encrypt a secret value into a persistable record with a fresh nonce.
    #[instrument(skip(self, value))]
    pub fn encrypt(&self, value: &str) -> Result<EncryptedSecret> {
        let mut nonce_bytes = [0u8; NONCE_SIZE];
        self.rng.fill(&mut nonce_bytes).map_err(|_| {
            error!("Failed to generate random nonce");
            ProviderError::crypto("Failed to generate random nonce for encryption")
        })?;

        let unbound_key = UnboundKey::new(&AES_256_GCM, &*self.key_bytes).map_err(|_| {
            error!("Failed to create encryption key");
            ProviderError::crypto("Failed to create encryption key")
        })?;

        let nonce_sequence = SingleNonce::new(nonce_bytes);
        let mut sealing_key = aead::SealingKey::new(unbound_key, nonce_sequence);

        let mut ciphertext = value.as_bytes().to_vec();
        ciphertext.reserve(TAG_SIZE);

        sealing_key.seal_in_place_append_tag(Aad::empty(), &mut ciphertext).map_err(|_| {
            error!("Encryption failed");
            ProviderError::crypto("Failed to encrypt secret value")
        })?;

        let engine = &base64::engine::general_purpose::STANDARD;
        debug!(ciphertext_len = ciphertext.len(), "Encrypted secret value");

        Ok(EncryptedSecret {
            ciphertext: engine.encode(&ciphertext),
            nonce: engine.encode(nonce_bytes),
            key_version: self.key_version.clone(),
        })
    }

    /// Decrypt a persisted record into a scoped [`Plaintext`].
    ///
    /// The plaintext buffer is zeroed when the returned value drops, so the
    /// decrypted secret does not outlive its use site.
    #[instrument(skip(self, secret), fields(key_version = %secret.key_version))]
    pub fn decrypt(&self, secret: &EncryptedSecret) -> Result<Plaintext> {
        if secret.key_version != self.key_version {
            warn!(
                record_version = %secret.key_version,
                active_version = %self.key_version,
                "Encrypted secret was produced by a different key version"
            );
        }

        let engine = &base64::engine::general_purpose::STANDARD;
        let ciphertext = engine
            .decode(&secret.ciphertext)
            .map_err(|e| ProviderError::crypto(format!("Invalid ciphertext base64: {}", e)))?;
        let nonce = engine
            .decode(&secret.nonce)
            .map_err(|e| ProviderError::crypto(format!("Invalid nonce base64: {}", e)))?;

        if nonce.len() != NONCE_SIZE {
            return Err(ProviderError::crypto(format!(
                "Invalid nonce length: expected {} bytes, got {} bytes",
                NONCE_SIZE,
                nonce.len()
            )));
        }

        if ciphertext.len() < TAG_SIZE {
            return Err(ProviderError::crypto(
                "Ciphertext too short (missing authentication tag)",
            ));
        }

        let mut nonce_bytes = [0u8; NONCE_SIZE];
        nonce_bytes.copy_from_slice(&nonce);

        let unbound_key = UnboundKey::new(&AES_256_GCM, &*self.key_bytes).map_err(|_| {
            error!("Failed to create decryption key");
            ProviderError::crypto("Failed to create decryption key")
        })?;

        let nonce_sequence = SingleNonce::new(nonce_bytes);
        let mut opening_key = aead::OpeningKey::new(unbound_key, nonce_sequence);

        let mut buffer = ciphertext;
        let decrypted = opening_key.open_in_place(Aad::empty(), &mut buffer).map_err(|_| {
            error!("Decryption failed - possible tampering or wrong key");
            ProviderError::crypto("Failed to decrypt secret value - authentication failed")
        })?;

        let value = String::from_utf8(decrypted.to_vec())
            .map_err(|_| ProviderError::crypto("Decrypted secret is not valid UTF-8"))?;

        debug!(plaintext_len = value.len(), "Decrypted secret value");

        Ok(Plaintext::new(value))
    }
}

impl std::fmt::Debug for SystemEncryption {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SystemEncryption")
            .field("key_version", &self.key_version)
            .field("key_bytes", &"[REDACTED]")
            .finish()
    }
}
