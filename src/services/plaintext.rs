//! Scoped plaintext secret material.
//!
//! The host hands decrypted secret values to consumers wrapped in [`Plaintext`]
//! so the value cannot leak through logging or serialization and is wiped from
//! memory when the scope ends.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Decrypted secret value with a bounded lifetime.
///
/// Debug, Display and serialization all print `[REDACTED]`; the value is only
/// reachable through [`Plaintext::expose`]. The backing buffer is overwritten
/// with zeros on drop, on every exit path, so decrypted tokens and secret
/// values do not linger in memory after use.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct Plaintext(String);

impl Plaintext {
    /// Wraps a decrypted value.
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Exposes the underlying value. Never log or print the result.
    pub fn expose(&self) -> &str {
        &self.0
    }

    /// Consumes the wrapper and returns the inner value. The caller takes over
    /// responsibility for the plaintext's lifetime; prefer [`Plaintext::expose`]
    /// when a reference suffices.
    pub fn into_string(mut self) -> String {
        std::mem::take(&mut self.0)
    }

    /// Length of the value without exposing it.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// True if the value is empty.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Serialize for Plaintext {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        // Never serialize the actual value.
        serializer.serialize_str("[REDACTED]")
    }
}

impl<'de> Deserialize<'de> for Plaintext {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = String::deserialize(deserializer)?;
        Ok(Plaintext(value))
    }
}

impl fmt::Debug for Plaintext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Plaintext([REDACTED])")
    }
}

impl fmt::Display for Plaintext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[REDACTED]")
    }
}

impl PartialEq for Plaintext {
    fn eq(&self, other: &Self) -> bool {
        self.0 == other.0
    }
}

impl Eq for Plaintext {}

impl From<String> for Plaintext {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

impl From<&str> for Plaintext {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}
