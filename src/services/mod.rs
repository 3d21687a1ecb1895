//! Host-side services the provider depends on.
//!
//! The gateway owns secret storage at rest and the scoped handling of
//! decrypted material; providers only see these capabilities through their
//! construction context.

pub mod encryption;
pub mod plaintext;

pub use encryption::{EncryptedSecret, SystemEncryption, SystemEncryptionConfig};
pub use plaintext::Plaintext;
