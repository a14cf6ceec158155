//! Authenticated encryption primitive.
//!
//! AES-256-GCM with a fresh random nonce generated inside every encrypt
//! call. There is no caller-supplied-nonce path, so nonce reuse for a
//! given key cannot be expressed.

use aes_gcm::{
    Aes256Gcm, Key, Nonce,
    aead::{Aead, AeadCore, KeyInit, OsRng},
};

use crate::error::{Error, Result};

/// Symmetric key length in bytes (256 bits).
pub const KEY_LEN: usize = 32;

/// Nonce length in bytes (96 bits, standard for GCM).
pub const NONCE_LEN: usize = 12;

/// Authentication tag length in bytes.
pub const TAG_LEN: usize = 16;

/// Encrypts `plaintext`, returning the generated nonce and the
/// ciphertext with the authentication tag appended.
///
/// # Errors
///
/// Returns [`Error::AuthenticationFailure`] if the cipher rejects the
/// input.
pub fn encrypt(key: &[u8; KEY_LEN], plaintext: &[u8]) -> Result<([u8; NONCE_LEN], Vec<u8>)> {
    let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(key));
    let nonce = Aes256Gcm::generate_nonce(&mut OsRng);
    let ciphertext = cipher
        .encrypt(&nonce, plaintext)
        .map_err(|_| Error::AuthenticationFailure)?;
    Ok((nonce.into(), ciphertext))
}

/// Decrypts `ciphertext` (which carries the authentication tag).
///
/// # Errors
///
/// Returns [`Error::AuthenticationFailure`] on any tampering,
/// truncation, or wrong key. Never returns partial plaintext.
pub fn decrypt(key: &[u8; KEY_LEN], nonce: &[u8; NONCE_LEN], ciphertext: &[u8]) -> Result<Vec<u8>> {
    let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(key));
    cipher
        .decrypt(Nonce::from_slice(nonce), ciphertext)
        .map_err(|_| Error::AuthenticationFailure)
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

    const KEY: [u8; KEY_LEN] = [7u8; KEY_LEN];

    #[test]
    fn encrypt_decrypt_round_trip() {
        let plaintext = b"cached token material";
        let (nonce, ciphertext) = encrypt(&KEY, plaintext).unwrap();
        assert_ne!(&ciphertext[..], &plaintext[..]);
        assert_eq!(ciphertext.len(), plaintext.len() + TAG_LEN);

        let decrypted = decrypt(&KEY, &nonce, &ciphertext).unwrap();
        assert_eq!(decrypted, plaintext);
    }

    #[test]
    fn nonces_are_unique_per_call() {
        let plaintext = b"same plaintext";
        let (nonce1, ct1) = encrypt(&KEY, plaintext).unwrap();
        let (nonce2, ct2) = encrypt(&KEY, plaintext).unwrap();

        assert_ne!(nonce1, nonce2);
        assert_ne!(ct1, ct2);
        assert_eq!(decrypt(&KEY, &nonce1, &ct1).unwrap(), plaintext);
        assert_eq!(decrypt(&KEY, &nonce2, &ct2).unwrap(), plaintext);
    }

    #[test]
    fn wrong_key_fails() {
        let (nonce, ciphertext) = encrypt(&KEY, b"secret").unwrap();
        let wrong = [8u8; KEY_LEN];
        assert!(matches!(
            decrypt(&wrong, &nonce, &ciphertext),
            Err(Error::AuthenticationFailure)
        ));
    }

    #[test]
    fn tampered_ciphertext_fails() {
        let (nonce, mut ciphertext) = encrypt(&KEY, b"secret").unwrap();
        for i in 0..ciphertext.len() {
            ciphertext[i] ^= 0x01;
            assert!(matches!(
                decrypt(&KEY, &nonce, &ciphertext),
                Err(Error::AuthenticationFailure)
            ));
            ciphertext[i] ^= 0x01;
        }
    }

    #[test]
    fn truncated_ciphertext_fails() {
        let (nonce, ciphertext) = encrypt(&KEY, b"secret").unwrap();
        assert!(matches!(
            decrypt(&KEY, &nonce, &ciphertext[..ciphertext.len() - 1]),
            Err(Error::AuthenticationFailure)
        ));
        assert!(matches!(
            decrypt(&KEY, &nonce, &[]),
            Err(Error::AuthenticationFailure)
        ));
    }
}
