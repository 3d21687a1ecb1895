//! Error types for secret provider operations.

use thiserror::Error;

/// Result type for provider operations.
pub type Result<T> = std::result::Result<T, ProviderError>;

/// Errors surfaced to the host by the provider and its collaborators.
#[derive(Error, Debug)]
pub enum ProviderError {
    /// Requested secret name is absent from the organization's catalog.
    #[error("Secret not found: {name}")]
    NotFound { name: String },

    /// Secret name rejected before any vendor call is attempted.
    #[error("Invalid secret name: {reason}")]
    InvalidName { reason: String },

    /// Provider settings missing or invalid at creation time.
    #[error("Provider configuration error: {message}")]
    Config { message: String },

    /// Startup sequence failed; no session was installed.
    #[error("Provider startup failed: {message}")]
    Startup { message: String },

    /// Data call issued before a successful startup.
    #[error("Provider not started")]
    NotStarted,

    /// Vendor rejected the presented credentials.
    #[error("Authentication failed: {message}")]
    Auth { message: String },

    /// Vendor API failure, surfaced without retry or translation.
    #[error("Vendor API error: {message}")]
    Upstream { message: String },

    /// Host encryption service failure.
    #[error("Encryption error: {message}")]
    Crypto { message: String },

    /// Serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl ProviderError {
    /// Create a not found error.
    pub fn not_found(name: impl Into<String>) -> Self {
        Self::NotFound { name: name.into() }
    }

    /// Create an invalid name error.
    pub fn invalid_name(reason: impl Into<String>) -> Self {
        Self::InvalidName { reason: reason.into() }
    }

    /// Create a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config { message: message.into() }
    }

    /// Create a startup error.
    pub fn startup(message: impl Into<String>) -> Self {
        Self::Startup { message: message.into() }
    }

    /// Create an authentication error.
    pub fn auth(message: impl Into<String>) -> Self {
        Self::Auth { message: message.into() }
    }

    /// Create an upstream error.
    pub fn upstream(message: impl Into<String>) -> Self {
        Self::Upstream { message: message.into() }
    }

    /// Create an encryption error.
    pub fn crypto(message: impl Into<String>) -> Self {
        Self::Crypto { message: message.into() }
    }
}
