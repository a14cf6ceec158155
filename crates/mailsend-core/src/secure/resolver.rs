//! Key resolution.
//!
//! Produces exactly one [`ResolvedKey`] for a save or load call, or
//! fails. There is no implicit fallback between strategies beyond the
//! policy's explicit preference order, and no key material survives the
//! call that resolved it.

use pbkdf2::pbkdf2_hmac;
use rand::RngCore;
use rand::rngs::OsRng;
use sha2::Sha256;
use tracing::{debug, warn};
use zeroize::{Zeroize, Zeroizing};

use crate::error::{Error, FormatError, Result};
use crate::secure::encryptor::KEY_LEN;
use crate::secure::keyring::KeyringStore;
use crate::secure::policy::{KeyPolicy, KeyStrategy};

/// Salt length in bytes for passphrase-derived keys.
pub const SALT_LEN: usize = 16;

/// PBKDF2-HMAC-SHA256 iteration count.
const PBKDF2_ROUNDS: u32 = 390_000;

/// Where a resolved key came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyOrigin {
    /// Random key held in the OS keyring.
    Keyring,
    /// Key derived from caller-supplied passphrase material.
    UserSupplied {
        /// Salt the derivation used; stored alongside the blob.
        salt: [u8; SALT_LEN],
    },
}

/// Transient symmetric key for exactly one encrypt or decrypt.
///
/// Never persisted, never cached across store calls; the buffer is
/// zeroed on drop.
pub(crate) struct ResolvedKey {
    key: Zeroizing<[u8; KEY_LEN]>,
    origin: KeyOrigin,
}

impl ResolvedKey {
    pub(crate) fn bytes(&self) -> &[u8; KEY_LEN] {
        &self.key
    }

    pub(crate) const fn origin(&self) -> KeyOrigin {
        self.origin
    }
}

impl std::fmt::Debug for ResolvedKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Key bytes must never reach logs or error messages.
        f.debug_struct("ResolvedKey")
            .field("origin", &self.origin)
            .finish_non_exhaustive()
    }
}

fn derive_key(user_key: &[u8], salt: &[u8; SALT_LEN]) -> Zeroizing<[u8; KEY_LEN]> {
    let mut key = Zeroizing::new([0u8; KEY_LEN]);
    pbkdf2_hmac::<Sha256>(user_key, salt, PBKDF2_ROUNDS, &mut *key);
    key
}

fn keyring_key_from_bytes(mut bytes: Vec<u8>) -> Result<Zeroizing<[u8; KEY_LEN]>> {
    if bytes.len() != KEY_LEN {
        bytes.zeroize();
        return Err(Error::Format(FormatError::InvalidKeyEncoding));
    }
    let mut key = Zeroizing::new([0u8; KEY_LEN]);
    key.copy_from_slice(&bytes);
    bytes.zeroize();
    Ok(key)
}

/// Resolves a key for a save.
///
/// Strategies are tried in the policy's preference order. For the
/// keyring strategy an existing key is reused so earlier blobs written
/// under the same identifier stay readable; otherwise a fresh random
/// key is generated and stored. Keyring failure moves on to the next
/// permitted strategy only; it never implies a downgrade the policy did
/// not already allow.
///
/// # Errors
///
/// [`Error::PolicyUnsatisfiable`] when the policy permits nothing,
/// [`Error::KeyringUnavailable`] when only the keyring was permitted and
/// it failed, [`Error::MissingUserKey`] when the user-supplied strategy
/// was selected without key material.
pub(crate) fn resolve_for_save<K: KeyringStore>(
    policy: &KeyPolicy,
    keyring: &K,
    credential_id: &str,
    user_key: Option<&[u8]>,
) -> Result<ResolvedKey> {
    let strategies = policy.permitted_strategies();
    if strategies.is_empty() {
        return Err(Error::PolicyUnsatisfiable);
    }

    let mut keyring_failed = false;
    for strategy in strategies {
        match strategy {
            KeyStrategy::Keyring => match try_keyring_save(keyring, credential_id) {
                Ok(key) => {
                    return Ok(ResolvedKey {
                        key,
                        origin: KeyOrigin::Keyring,
                    });
                }
                Err(Error::KeyringUnavailable | Error::Keyring(_)) => {
                    keyring_failed = true;
                }
                Err(e) => return Err(e),
            },
            KeyStrategy::UserSupplied => {
                let user_key = user_key.ok_or(Error::MissingUserKey)?;
                let mut salt = [0u8; SALT_LEN];
                OsRng.fill_bytes(&mut salt);
                debug!("derived config key from user-supplied material");
                return Ok(ResolvedKey {
                    key: derive_key(user_key, &salt),
                    origin: KeyOrigin::UserSupplied { salt },
                });
            }
        }
    }

    Err(if keyring_failed {
        Error::KeyringUnavailable
    } else {
        Error::PolicyUnsatisfiable
    })
}

fn try_keyring_save<K: KeyringStore>(
    keyring: &K,
    credential_id: &str,
) -> Result<Zeroizing<[u8; KEY_LEN]>> {
    if !keyring.is_available() {
        warn!("keyring unavailable for save");
        return Err(Error::KeyringUnavailable);
    }
    if let Some(existing) = keyring.get_key(credential_id)? {
        debug!("reusing keyring key for {credential_id}");
        return keyring_key_from_bytes(existing);
    }

    let mut key = Zeroizing::new([0u8; KEY_LEN]);
    OsRng.fill_bytes(&mut *key);
    keyring.set_key(credential_id, &*key)?;
    debug!("generated new keyring key for {credential_id}");
    Ok(key)
}

/// Resolves the key a previously written blob was encrypted with.
///
/// The blob's stored salt pins which strategy wrote it: a salt means a
/// passphrase-derived key, no salt means a keyring key. The policy must
/// still permit that strategy, otherwise the load fails closed.
///
/// # Errors
///
/// [`Error::PolicyUnsatisfiable`] when the writing strategy is not
/// permitted, [`Error::KeyringUnavailable`] when the keyring is
/// inaccessible or holds no key, [`Error::MissingUserKey`] when a
/// passphrase is needed but absent.
pub(crate) fn resolve_for_load<K: KeyringStore>(
    policy: &KeyPolicy,
    keyring: &K,
    credential_id: &str,
    user_key: Option<&[u8]>,
    stored_salt: Option<[u8; SALT_LEN]>,
) -> Result<ResolvedKey> {
    match stored_salt {
        None => {
            if !policy.permits(KeyStrategy::Keyring) {
                return Err(Error::PolicyUnsatisfiable);
            }
            if !keyring.is_available() {
                return Err(Error::KeyringUnavailable);
            }
            match keyring.get_key(credential_id)? {
                Some(bytes) => Ok(ResolvedKey {
                    key: keyring_key_from_bytes(bytes)?,
                    origin: KeyOrigin::Keyring,
                }),
                None => {
                    warn!("no keyring key found for {credential_id}");
                    Err(Error::KeyringUnavailable)
                }
            }
        }
        Some(salt) => {
            if !policy.permits(KeyStrategy::UserSupplied) {
                return Err(Error::PolicyUnsatisfiable);
            }
            let user_key = user_key.ok_or(Error::MissingUserKey)?;
            Ok(ResolvedKey {
                key: derive_key(user_key, &salt),
                origin: KeyOrigin::UserSupplied { salt },
            })
        }
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
    use crate::secure::keyring::MemoryKeyring;

    const ID: &str = "config_key_ms_graph";

    #[test]
    fn save_generates_and_stores_keyring_key() {
        let keyring = MemoryKeyring::new();
        let policy = KeyPolicy::default();

        let resolved = resolve_for_save(&policy, &keyring, ID, None).unwrap();
        assert_eq!(resolved.origin(), KeyOrigin::Keyring);
        assert_eq!(
            keyring.get_key(ID).unwrap().as_deref(),
            Some(&resolved.bytes()[..])
        );
    }

    #[test]
    fn save_reuses_existing_keyring_key() {
        let keyring = MemoryKeyring::new();
        let policy = KeyPolicy::default();

        let first = resolve_for_save(&policy, &keyring, ID, None).unwrap();
        let second = resolve_for_save(&policy, &keyring, ID, None).unwrap();
        assert_eq!(first.bytes(), second.bytes());
        assert_eq!(keyring.len(), 1);
    }

    #[test]
    fn load_fetches_stored_keyring_key() {
        let keyring = MemoryKeyring::new();
        let policy = KeyPolicy::default();

        let saved = resolve_for_save(&policy, &keyring, ID, None).unwrap();
        let loaded = resolve_for_load(&policy, &keyring, ID, None, None).unwrap();
        assert_eq!(saved.bytes(), loaded.bytes());
    }

    #[test]
    fn load_without_keyring_entry_fails() {
        let keyring = MemoryKeyring::new();
        let policy = KeyPolicy::default();
        assert!(matches!(
            resolve_for_load(&policy, &keyring, ID, None, None),
            Err(Error::KeyringUnavailable)
        ));
    }

    #[test]
    fn unavailable_keyring_without_fallback_fails_without_side_effects() {
        let keyring = MemoryKeyring::unavailable();
        let policy = KeyPolicy::new(true, false);

        assert!(matches!(
            resolve_for_save(&policy, &keyring, ID, None),
            Err(Error::KeyringUnavailable)
        ));
        keyring.set_available(true);
        assert!(keyring.is_empty());
    }

    #[test]
    fn unavailable_keyring_falls_back_only_when_permitted() {
        let keyring = MemoryKeyring::unavailable();
        let policy = KeyPolicy::new(true, true);

        let resolved = resolve_for_save(&policy, &keyring, ID, Some(b"passphrase")).unwrap();
        assert!(matches!(
            resolved.origin(),
            KeyOrigin::UserSupplied { .. }
        ));
        keyring.set_available(true);
        assert!(keyring.is_empty());
    }

    #[test]
    fn empty_policy_is_unsatisfiable() {
        let keyring = MemoryKeyring::new();
        let policy = KeyPolicy::new(false, false);
        assert!(matches!(
            resolve_for_save(&policy, &keyring, ID, Some(b"passphrase")),
            Err(Error::PolicyUnsatisfiable)
        ));
        assert!(matches!(
            resolve_for_load(&policy, &keyring, ID, Some(b"passphrase"), None),
            Err(Error::PolicyUnsatisfiable)
        ));
    }

    #[test]
    fn user_supplied_requires_material() {
        let keyring = MemoryKeyring::new();
        let policy = KeyPolicy::new(false, true);
        assert!(matches!(
            resolve_for_save(&policy, &keyring, ID, None),
            Err(Error::MissingUserKey)
        ));
        assert!(matches!(
            resolve_for_load(&policy, &keyring, ID, None, Some([0u8; SALT_LEN])),
            Err(Error::MissingUserKey)
        ));
    }

    #[test]
    fn user_supplied_save_never_touches_keyring() {
        let keyring = MemoryKeyring::new();
        let policy = KeyPolicy::new(false, true);

        let resolved = resolve_for_save(&policy, &keyring, ID, Some(b"passphrase")).unwrap();
        assert!(matches!(resolved.origin(), KeyOrigin::UserSupplied { .. }));
        assert!(keyring.is_empty());
    }

    #[test]
    fn same_passphrase_and_salt_rederive_same_key() {
        let keyring = MemoryKeyring::new();
        let policy = KeyPolicy::new(false, true);

        let saved = resolve_for_save(&policy, &keyring, ID, Some(b"passphrase")).unwrap();
        let KeyOrigin::UserSupplied { salt } = saved.origin() else {
            panic!("expected user-supplied origin");
        };

        let loaded =
            resolve_for_load(&policy, &keyring, ID, Some(b"passphrase"), Some(salt)).unwrap();
        assert_eq!(saved.bytes(), loaded.bytes());

        let wrong =
            resolve_for_load(&policy, &keyring, ID, Some(b"wrong-passphrase"), Some(salt))
                .unwrap();
        assert_ne!(saved.bytes(), wrong.bytes());
    }

    #[test]
    fn salts_are_random_per_save() {
        let keyring = MemoryKeyring::new();
        let policy = KeyPolicy::new(false, true);

        let first = resolve_for_save(&policy, &keyring, ID, Some(b"passphrase")).unwrap();
        let second = resolve_for_save(&policy, &keyring, ID, Some(b"passphrase")).unwrap();
        let (KeyOrigin::UserSupplied { salt: s1 }, KeyOrigin::UserSupplied { salt: s2 }) =
            (first.origin(), second.origin())
        else {
            panic!("expected user-supplied origins");
        };
        assert_ne!(s1, s2);
        assert_ne!(first.bytes(), second.bytes());
    }

    #[test]
    fn load_pinned_strategy_must_be_permitted() {
        let keyring = MemoryKeyring::new();

        // Derived blob under a keyring-only policy.
        let keyring_only = KeyPolicy::new(true, false);
        assert!(matches!(
            resolve_for_load(
                &keyring_only,
                &keyring,
                ID,
                Some(b"passphrase"),
                Some([0u8; SALT_LEN])
            ),
            Err(Error::PolicyUnsatisfiable)
        ));

        // Keyring blob under a user-key-only policy.
        let user_only = KeyPolicy::new(false, true);
        assert!(matches!(
            resolve_for_load(&user_only, &keyring, ID, Some(b"passphrase"), None),
            Err(Error::PolicyUnsatisfiable)
        ));
    }

    #[test]
    fn debug_never_prints_key_bytes() {
        let keyring = MemoryKeyring::new();
        let resolved =
            resolve_for_save(&KeyPolicy::default(), &keyring, ID, None).unwrap();
        let rendered = format!("{resolved:?}");
        assert!(rendered.contains("origin"));
        assert!(!rendered.contains("key:"));
    }
}
