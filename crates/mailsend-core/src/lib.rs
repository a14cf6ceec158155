//! # mailsend-core
//!
//! Credential models and encrypted-at-rest configuration storage for the
//! mailsend toolkit.
//!
//! This crate provides:
//! - Provider credential models (Microsoft Graph, Gmail API)
//! - Declarative key policy (keyring vs. user-supplied passphrase)
//! - Authenticated encryption of configuration files (AES-256-GCM)
//! - The [`SecureConfig`] store that ties these together
//!
//! Everything here is synchronous: the only blocking waits are OS keyring
//! access and (intentionally slow) passphrase key derivation. Secret key
//! material is held in [`zeroize`]d buffers scoped to a single save or
//! load call and is never written to disk or logs.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

pub mod credential;
mod error;
pub mod paths;
pub mod secure;

pub use credential::{
    Authority, CredentialConfig, GoogleApiConfig, MsGraphConfig, ProviderKind, TokenRecord,
    ValidationError, ValidationResult, validate_config,
};
pub use error::{Error, FormatError, Result};
pub use secure::{
    KeyOrigin, KeyPolicy, KeyStrategy, KeyringStore, MemoryKeyring, SecureConfig, SystemKeyring,
};
