//! Error types for the core library.

use thiserror::Error;

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in secure configuration operations.
///
/// No variant ever carries key material, passphrases, or decrypted
/// configuration content.
#[derive(Debug, Error)]
pub enum Error {
    /// No permitted key strategy could be resolved for the operation.
    #[error("no permitted key strategy could be resolved under the current policy")]
    PolicyUnsatisfiable,

    /// The keyring strategy was selected but the system keyring is
    /// inaccessible or holds no key for this credential.
    #[error("system keyring is unavailable or holds no key for this credential")]
    KeyringUnavailable,

    /// The user-supplied strategy was selected but no passphrase or raw
    /// key material was provided by the caller.
    #[error("user key material is required but was not provided")]
    MissingUserKey,

    /// Decryption's integrity check failed: wrong key, corrupted or
    /// tampered file. No partial plaintext is ever returned.
    #[error("decryption failed: wrong key or corrupted data")]
    AuthenticationFailure,

    /// The encrypted blob or serialized payload is malformed.
    #[error("invalid encrypted config: {0}")]
    Format(#[from] FormatError),

    /// Keyring backend operation failed.
    #[error("keyring error: {0}")]
    Keyring(#[from] keyring::Error),

    /// Underlying storage read/write failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Structural errors in the on-disk blob or the serialized payload.
#[derive(Debug, Error)]
pub enum FormatError {
    /// Blob carries a format version this build does not understand.
    #[error("unsupported blob format version: {0}")]
    UnsupportedVersion(u8),

    /// Blob carries an unknown algorithm identifier.
    #[error("unknown algorithm id: {0}")]
    UnknownAlgorithm(u8),

    /// Blob is shorter than its fixed-length header requires.
    #[error("encrypted blob truncated: need at least {expected} bytes, got {actual}")]
    Truncated {
        /// Minimum byte count the header demands.
        expected: usize,
        /// Byte count actually present.
        actual: usize,
    },

    /// Serialized payload carries an unknown envelope version.
    #[error("unsupported payload version: {0}")]
    UnsupportedPayloadVersion(u32),

    /// Decrypted payload does not parse as a credential config.
    #[error("malformed payload: {0}")]
    Payload(#[from] serde_json::Error),

    /// Payload decodes to a different provider than the caller asked for.
    #[error("provider mismatch: expected {expected}, found {found}")]
    ProviderMismatch {
        /// Provider the caller requested.
        expected: &'static str,
        /// Provider found in the payload.
        found: &'static str,
    },

    /// Keyring entry exists but does not decode to raw key bytes.
    #[error("keyring entry is not a valid encoded key")]
    InvalidKeyEncoding,
}
