//! On-disk encrypted blob codec.
//!
//! Layout, in order:
//!
//! ```text
//! [format_version: 1 byte]
//! [algorithm_id:   1 byte]
//! [salt:           16 bytes, only when the key was passphrase-derived]
//! [nonce:          12 bytes]
//! [ciphertext || auth_tag]
//! ```
//!
//! The blob never contains or references the encryption key. The
//! algorithm id pins both the cipher and the key source, so a load can
//! tell which strategy wrote the file before resolving a key.

use crate::error::FormatError;
use crate::secure::encryptor::{NONCE_LEN, TAG_LEN};
use crate::secure::resolver::SALT_LEN;

/// Current blob format version.
pub const FORMAT_VERSION: u8 = 1;

/// Cipher + key-source combination, pinned in the blob header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Algorithm {
    /// AES-256-GCM with a keyring-stored random key. No salt field.
    Aes256GcmKeyring = 1,
    /// AES-256-GCM with a PBKDF2-derived key. Salt field present.
    Aes256GcmDerived = 2,
}

impl Algorithm {
    fn from_id(id: u8) -> Result<Self, FormatError> {
        match id {
            1 => Ok(Self::Aes256GcmKeyring),
            2 => Ok(Self::Aes256GcmDerived),
            other => Err(FormatError::UnknownAlgorithm(other)),
        }
    }

    const fn salt_len(self) -> usize {
        match self {
            Self::Aes256GcmKeyring => 0,
            Self::Aes256GcmDerived => SALT_LEN,
        }
    }
}

/// A parsed encrypted blob.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncryptedBlob {
    algorithm: Algorithm,
    salt: Option<[u8; SALT_LEN]>,
    nonce: [u8; NONCE_LEN],
    ciphertext: Vec<u8>,
}

impl EncryptedBlob {
    /// Blob for a keyring-key encryption (no salt).
    pub const fn keyring(nonce: [u8; NONCE_LEN], ciphertext: Vec<u8>) -> Self {
        Self {
            algorithm: Algorithm::Aes256GcmKeyring,
            salt: None,
            nonce,
            ciphertext,
        }
    }

    /// Blob for a passphrase-derived-key encryption.
    pub const fn derived(
        salt: [u8; SALT_LEN],
        nonce: [u8; NONCE_LEN],
        ciphertext: Vec<u8>,
    ) -> Self {
        Self {
            algorithm: Algorithm::Aes256GcmDerived,
            salt: Some(salt),
            nonce,
            ciphertext,
        }
    }

    /// Cipher + key-source combination this blob was written with.
    pub const fn algorithm(&self) -> Algorithm {
        self.algorithm
    }

    /// Stored salt, present only for derived-key blobs.
    pub const fn salt(&self) -> Option<[u8; SALT_LEN]> {
        self.salt
    }

    /// Nonce used for this encryption.
    pub const fn nonce(&self) -> &[u8; NONCE_LEN] {
        &self.nonce
    }

    /// Ciphertext with the authentication tag appended.
    pub fn ciphertext(&self) -> &[u8] {
        &self.ciphertext
    }

    /// Serializes the blob into its on-disk byte layout.
    pub fn encode(&self) -> Vec<u8> {
        let salt_len = self.salt.map_or(0, |s| s.len());
        let mut out = Vec::with_capacity(2 + salt_len + NONCE_LEN + self.ciphertext.len());
        out.push(FORMAT_VERSION);
        out.push(self.algorithm as u8);
        if let Some(salt) = self.salt {
            out.extend_from_slice(&salt);
        }
        out.extend_from_slice(&self.nonce);
        out.extend_from_slice(&self.ciphertext);
        out
    }

    /// Parses a blob from its on-disk byte layout.
    ///
    /// # Errors
    ///
    /// Returns a [`FormatError`] on unknown version or algorithm, or on
    /// a blob too short to hold its declared header and tag.
    pub fn decode(bytes: &[u8]) -> Result<Self, FormatError> {
        if bytes.len() < 2 {
            return Err(FormatError::Truncated {
                expected: 2,
                actual: bytes.len(),
            });
        }
        if bytes[0] != FORMAT_VERSION {
            return Err(FormatError::UnsupportedVersion(bytes[0]));
        }
        let algorithm = Algorithm::from_id(bytes[1])?;

        let header_len = 2 + algorithm.salt_len() + NONCE_LEN;
        let min_len = header_len + TAG_LEN;
        if bytes.len() < min_len {
            return Err(FormatError::Truncated {
                expected: min_len,
                actual: bytes.len(),
            });
        }

        let mut offset = 2;
        let salt = match algorithm {
            Algorithm::Aes256GcmKeyring => None,
            Algorithm::Aes256GcmDerived => {
                let mut salt = [0u8; SALT_LEN];
                salt.copy_from_slice(&bytes[offset..offset + SALT_LEN]);
                offset += SALT_LEN;
                Some(salt)
            }
        };

        let mut nonce = [0u8; NONCE_LEN];
        nonce.copy_from_slice(&bytes[offset..offset + NONCE_LEN]);
        offset += NONCE_LEN;

        Ok(Self {
            algorithm,
            salt,
            nonce,
            ciphertext: bytes[offset..].to_vec(),
        })
    }
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::redundant_clone,
    clippy::manual_string_new,
    clippy::needless_collect,
    clippy::unreadable_literal,
    clippy::used_underscore_items,
    clippy::similar_names
)]
mod tests {
    use super::*;

    fn sample_ciphertext() -> Vec<u8> {
        vec![0xAB; 40]
    }

    #[test]
    fn keyring_blob_round_trip() {
        let blob = EncryptedBlob::keyring([1u8; NONCE_LEN], sample_ciphertext());
        let encoded = blob.encode();
        assert_eq!(encoded[0], FORMAT_VERSION);
        assert_eq!(encoded[1], Algorithm::Aes256GcmKeyring as u8);
        assert_eq!(encoded.len(), 2 + NONCE_LEN + 40);

        let decoded = EncryptedBlob::decode(&encoded).unwrap();
        assert_eq!(decoded, blob);
        assert_eq!(decoded.salt(), None);
    }

    #[test]
    fn derived_blob_round_trip() {
        let blob = EncryptedBlob::derived([2u8; SALT_LEN], [1u8; NONCE_LEN], sample_ciphertext());
        let encoded = blob.encode();
        assert_eq!(encoded[1], Algorithm::Aes256GcmDerived as u8);
        assert_eq!(encoded.len(), 2 + SALT_LEN + NONCE_LEN + 40);

        let decoded = EncryptedBlob::decode(&encoded).unwrap();
        assert_eq!(decoded, blob);
        assert_eq!(decoded.salt(), Some([2u8; SALT_LEN]));
    }

    #[test]
    fn unknown_version_rejected() {
        let mut encoded = EncryptedBlob::keyring([0u8; NONCE_LEN], sample_ciphertext()).encode();
        encoded[0] = 9;
        assert!(matches!(
            EncryptedBlob::decode(&encoded),
            Err(FormatError::UnsupportedVersion(9))
        ));
    }

    #[test]
    fn unknown_algorithm_rejected() {
        let mut encoded = EncryptedBlob::keyring([0u8; NONCE_LEN], sample_ciphertext()).encode();
        encoded[1] = 0;
        assert!(matches!(
            EncryptedBlob::decode(&encoded),
            Err(FormatError::UnknownAlgorithm(0))
        ));
    }

    #[test]
    fn truncated_blob_rejected() {
        let encoded = EncryptedBlob::derived([0u8; SALT_LEN], [0u8; NONCE_LEN], sample_ciphertext())
            .encode();
        for len in 0..(2 + SALT_LEN + NONCE_LEN + TAG_LEN) {
            assert!(
                matches!(
                    EncryptedBlob::decode(&encoded[..len]),
                    Err(FormatError::Truncated { .. })
                        | Err(FormatError::UnsupportedVersion(_))
                        | Err(FormatError::UnknownAlgorithm(_))
                ),
                "prefix of length {len} should not decode"
            );
        }
    }

    #[test]
    fn blob_never_contains_key_material() {
        // The codec has no key input at all; this pins the header size so
        // a key field cannot be added without breaking the format tests.
        let encoded = EncryptedBlob::keyring([0u8; NONCE_LEN], vec![0u8; TAG_LEN]).encode();
        assert_eq!(encoded.len(), 2 + NONCE_LEN + TAG_LEN);
    }
}
