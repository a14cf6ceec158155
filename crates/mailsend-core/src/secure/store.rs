//! Secure config store.
//!
//! Composes the serializer, key resolver, and encryptor into the two
//! operations callers see: `save` and `load`. Writes are atomic
//! (sibling temp file + rename), directories are never created
//! implicitly, and resolved key material lives only for the duration of
//! one call.

use std::fs;
use std::io;
use std::path::Path;

use tracing::debug;
use zeroize::Zeroize;

use crate::credential::{CredentialConfig, ProviderKind};
use crate::error::{FormatError, Result};
use crate::secure::blob::EncryptedBlob;
use crate::secure::keyring::{KeyringStore, SystemKeyring};
use crate::secure::policy::KeyPolicy;
use crate::secure::resolver::KeyOrigin;
use crate::secure::{encryptor, resolver, serializer};

/// Keyring entry prefix; one entry per provider kind.
const KEYRING_KEY_PREFIX: &str = "mailsend_config_key";

fn credential_key(kind: ProviderKind) -> String {
    format!("{KEYRING_KEY_PREFIX}_{kind}")
}

/// Encrypted-at-rest credential configuration store.
///
/// Holds a [`KeyPolicy`] and a keyring capability; key material itself
/// is resolved per call and discarded afterwards.
#[derive(Debug)]
pub struct SecureConfig<K = SystemKeyring> {
    policy: KeyPolicy,
    keyring: K,
}

impl SecureConfig<SystemKeyring> {
    /// Creates a store over the platform keyring.
    #[must_use]
    pub const fn new(policy: KeyPolicy) -> Self {
        Self::with_keyring(policy, SystemKeyring::new())
    }
}

impl<K: KeyringStore> SecureConfig<K> {
    /// Creates a store over an injected keyring capability.
    #[must_use]
    pub const fn with_keyring(policy: KeyPolicy, keyring: K) -> Self {
        Self { policy, keyring }
    }

    /// The policy this store operates under.
    #[must_use]
    pub const fn policy(&self) -> &KeyPolicy {
        &self.policy
    }

    /// Encrypts `config` and writes it to `path`.
    ///
    /// The write is all-or-nothing: the blob lands under a sibling
    /// temporary name first and is renamed into place, so a failure at
    /// any stage leaves whatever was at `path` untouched. The parent
    /// directory must already exist.
    ///
    /// Returns which key strategy protected the file.
    ///
    /// # Errors
    ///
    /// Fails when the policy yields no usable strategy, required user
    /// key material is missing, or storage I/O fails. No file is
    /// written or modified on any failure.
    pub fn save(
        &self,
        config: &CredentialConfig,
        path: &Path,
        user_key: Option<&[u8]>,
    ) -> Result<KeyOrigin> {
        let mut payload = serializer::serialize(config)?;
        let resolved = resolver::resolve_for_save(
            &self.policy,
            &self.keyring,
            &credential_key(config.kind()),
            user_key,
        );
        let resolved = match resolved {
            Ok(resolved) => resolved,
            Err(e) => {
                payload.zeroize();
                return Err(e);
            }
        };

        let encrypted = encryptor::encrypt(resolved.bytes(), &payload);
        payload.zeroize();
        let (nonce, ciphertext) = encrypted?;

        let blob = match resolved.origin() {
            KeyOrigin::Keyring => EncryptedBlob::keyring(nonce, ciphertext),
            KeyOrigin::UserSupplied { salt } => EncryptedBlob::derived(salt, nonce, ciphertext),
        };
        write_atomic(path, &blob.encode())?;
        debug!("saved encrypted {} config to {}", config.kind(), path.display());
        Ok(resolved.origin())
    }

    /// Reads, decrypts, and decodes the config at `path`.
    ///
    /// # Errors
    ///
    /// Fails when the path does not exist, the blob is malformed, the
    /// resolved key does not authenticate, the policy does not permit
    /// the strategy that wrote the blob, or the payload belongs to a
    /// different provider than requested.
    pub fn load(
        &self,
        kind: ProviderKind,
        path: &Path,
        user_key: Option<&[u8]>,
    ) -> Result<CredentialConfig> {
        let bytes = fs::read(path)?;
        let blob = EncryptedBlob::decode(&bytes)?;
        let resolved = resolver::resolve_for_load(
            &self.policy,
            &self.keyring,
            &credential_key(kind),
            user_key,
            blob.salt(),
        )?;

        let mut plaintext = encryptor::decrypt(resolved.bytes(), blob.nonce(), blob.ciphertext())?;
        let decoded = serializer::deserialize(&plaintext);
        plaintext.zeroize();
        let config = decoded?;

        if config.kind() != kind {
            return Err(FormatError::ProviderMismatch {
                expected: kind.as_str(),
                found: config.kind().as_str(),
            }
            .into());
        }
        debug!("loaded encrypted {kind} config from {}", path.display());
        Ok(config)
    }
}

/// Writes `bytes` to `path` via a sibling temp file and atomic rename.
fn write_atomic(path: &Path, bytes: &[u8]) -> io::Result<()> {
    let Some(file_name) = path.file_name() else {
        return Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            "config path has no file name",
        ));
    };
    let mut tmp_name = file_name.to_os_string();
    tmp_name.push(".tmp");
    let tmp = path.with_file_name(tmp_name);

    if let Err(e) = fs::write(&tmp, bytes) {
        let _ = fs::remove_file(&tmp);
        return Err(e);
    }
    if let Err(e) = fs::rename(&tmp, path) {
        let _ = fs::remove_file(&tmp);
        return Err(e);
    }
    Ok(())
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
    use crate::credential::{GoogleApiConfig, MsGraphConfig, TokenRecord};
    use crate::error::Error;
    use crate::secure::keyring::MemoryKeyring;
    use chrono::{TimeZone, Utc};
    use tempfile::TempDir;

    fn sample_config() -> CredentialConfig {
        MsGraphConfig::new("a@example.com")
            .with_client_id("abc")
            .into()
    }

    fn store(policy: KeyPolicy) -> SecureConfig<MemoryKeyring> {
        SecureConfig::with_keyring(policy, MemoryKeyring::new())
    }

    #[test]
    fn keyring_round_trip_returns_identical_model() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("ms_graph.enc");
        let store = store(KeyPolicy::new(true, false));
        let config = sample_config();

        let origin = store.save(&config, &path, None).unwrap();
        assert_eq!(origin, KeyOrigin::Keyring);

        let loaded = store.load(ProviderKind::MsGraph, &path, None).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn user_key_round_trip_and_wrong_passphrase() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("ms_graph.enc");
        let store = store(KeyPolicy::new(false, true));
        let config = sample_config();

        let origin = store
            .save(&config, &path, Some(b"correct-passphrase"))
            .unwrap();
        assert!(matches!(origin, KeyOrigin::UserSupplied { .. }));

        let loaded = store
            .load(ProviderKind::MsGraph, &path, Some(b"correct-passphrase"))
            .unwrap();
        assert_eq!(loaded, config);

        assert!(matches!(
            store.load(ProviderKind::MsGraph, &path, Some(b"wrong-passphrase")),
            Err(Error::AuthenticationFailure)
        ));
    }

    #[test]
    fn round_trip_preserves_cached_token_state() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("google_api.enc");
        let store = store(KeyPolicy::new(true, false));

        let mut google = GoogleApiConfig::new("b@example.com");
        google.apply_token(
            &TokenRecord::new("cached-token", None),
            Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap(),
        );
        let config: CredentialConfig = google.into();

        store.save(&config, &path, None).unwrap();
        let loaded = store.load(ProviderKind::GoogleApi, &path, None).unwrap();
        assert_eq!(loaded, config);
        assert_eq!(loaded.cached_token(), Some("cached-token"));
    }

    #[test]
    fn unavailable_keyring_without_fallback_writes_nothing() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("ms_graph.enc");
        let store =
            SecureConfig::with_keyring(KeyPolicy::new(true, false), MemoryKeyring::unavailable());

        assert!(matches!(
            store.save(&sample_config(), &path, None),
            Err(Error::KeyringUnavailable)
        ));
        assert!(!path.exists());
    }

    #[test]
    fn fail_closed_policy_rejects_everything() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("ms_graph.enc");
        let fail_closed = store(KeyPolicy::new(false, false));

        assert!(matches!(
            fail_closed.save(&sample_config(), &path, Some(b"passphrase")),
            Err(Error::PolicyUnsatisfiable)
        ));
        assert!(!path.exists());

        // Even with a valid blob on disk (written under a permissive
        // policy), a fail-closed policy cannot load it.
        let writer = store(KeyPolicy::new(false, true));
        writer
            .save(&sample_config(), &path, Some(b"passphrase"))
            .unwrap();
        let closed = store(KeyPolicy::new(false, false));
        assert!(matches!(
            closed.load(ProviderKind::MsGraph, &path, Some(b"passphrase")),
            Err(Error::PolicyUnsatisfiable)
        ));
    }

    #[test]
    fn tampering_with_any_blob_byte_fails_authentication() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("ms_graph.enc");
        let store = store(KeyPolicy::new(true, false));
        store.save(&sample_config(), &path, None).unwrap();

        let original = fs::read(&path).unwrap();
        // Skip the two header bytes; flipping those is a format error,
        // not an authentication failure.
        for i in 2..original.len() {
            let mut tampered = original.clone();
            tampered[i] ^= 0x01;
            fs::write(&path, &tampered).unwrap();
            assert!(
                matches!(
                    store.load(ProviderKind::MsGraph, &path, None),
                    Err(Error::AuthenticationFailure)
                ),
                "flipping byte {i} must fail authentication"
            );
        }
    }

    #[test]
    fn header_tampering_is_a_format_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("ms_graph.enc");
        let store = store(KeyPolicy::new(true, false));
        store.save(&sample_config(), &path, None).unwrap();

        let mut tampered = fs::read(&path).unwrap();
        tampered[0] = 0xFF;
        fs::write(&path, &tampered).unwrap();
        assert!(matches!(
            store.load(ProviderKind::MsGraph, &path, None),
            Err(Error::Format(FormatError::UnsupportedVersion(0xFF)))
        ));
    }

    #[test]
    fn load_missing_file_is_io_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("absent.enc");
        let store = store(KeyPolicy::default());
        match store.load(ProviderKind::MsGraph, &path, None) {
            Err(Error::Io(e)) => assert_eq!(e.kind(), io::ErrorKind::NotFound),
            other => panic!("expected NotFound I/O error, got {other:?}"),
        }
    }

    #[test]
    fn save_never_creates_directories() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("missing-subdir").join("ms_graph.enc");
        let store = store(KeyPolicy::new(false, true));
        assert!(matches!(
            store.save(&sample_config(), &path, Some(b"passphrase")),
            Err(Error::Io(_))
        ));
        assert!(!path.parent().unwrap().exists());
    }

    #[test]
    fn user_supplied_save_leaves_keyring_empty() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("ms_graph.enc");
        let keyring = MemoryKeyring::new();
        let store = SecureConfig::with_keyring(KeyPolicy::new(false, true), keyring);

        store
            .save(&sample_config(), &path, Some(b"passphrase"))
            .unwrap();
        assert!(store.keyring.is_empty());

        // The blob carries a salt but no key; the passphrase is nowhere
        // on disk.
        let blob = EncryptedBlob::decode(&fs::read(&path).unwrap()).unwrap();
        assert!(blob.salt().is_some());
    }

    #[test]
    fn repeated_saves_produce_distinct_nonces_and_ciphertexts() {
        let dir = TempDir::new().unwrap();
        let path_a = dir.path().join("a.enc");
        let path_b = dir.path().join("b.enc");
        let store = store(KeyPolicy::new(true, false));
        let config = sample_config();

        store.save(&config, &path_a, None).unwrap();
        store.save(&config, &path_b, None).unwrap();

        let blob_a = EncryptedBlob::decode(&fs::read(&path_a).unwrap()).unwrap();
        let blob_b = EncryptedBlob::decode(&fs::read(&path_b).unwrap()).unwrap();
        assert_ne!(blob_a.nonce(), blob_b.nonce());
        assert_ne!(blob_a.ciphertext(), blob_b.ciphertext());
    }

    #[test]
    fn provider_mismatch_is_rejected() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("google_api.enc");
        let store = store(KeyPolicy::new(true, false));
        let config: CredentialConfig = GoogleApiConfig::new("b@example.com").into();
        store.save(&config, &path, None).unwrap();

        // Same keyring entry prefix scheme, wrong requested kind: the
        // keyring holds no ms_graph key, so resolution fails before any
        // payload is inspected.
        assert!(store.load(ProviderKind::MsGraph, &path, None).is_err());
    }

    #[cfg(unix)]
    #[test]
    fn interrupted_write_preserves_existing_file() {
        use std::os::unix::fs::PermissionsExt;

        let dir = TempDir::new().unwrap();
        let path = dir.path().join("ms_graph.enc");
        let store = store(KeyPolicy::new(true, false));
        let config = sample_config();
        store.save(&config, &path, None).unwrap();
        let original_bytes = fs::read(&path).unwrap();

        // Make the directory read-only so the temp-file write fails.
        let mut perms = fs::metadata(dir.path()).unwrap().permissions();
        perms.set_mode(0o555);
        fs::set_permissions(dir.path(), perms).unwrap();

        let updated: CredentialConfig = MsGraphConfig::new("changed@example.com").into();
        assert!(matches!(
            store.save(&updated, &path, None),
            Err(Error::Io(_))
        ));

        let mut perms = fs::metadata(dir.path()).unwrap().permissions();
        perms.set_mode(0o755);
        fs::set_permissions(dir.path(), perms).unwrap();

        assert_eq!(fs::read(&path).unwrap(), original_bytes);
        let loaded = store.load(ProviderKind::MsGraph, &path, None).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn atomic_write_rejects_bare_root_path() {
        let store = store(KeyPolicy::new(false, true));
        let err = store
            .save(&sample_config(), Path::new("/"), Some(b"passphrase"))
            .unwrap_err();
        assert!(matches!(err, Error::Io(_)));
    }
}
