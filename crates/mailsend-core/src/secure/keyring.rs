//! Keyring capability.
//!
//! The OS keyring is modeled as an injected capability so the store can
//! be exercised in tests without touching real OS state:
//! - Linux: Secret Service (GNOME Keyring, `KWallet` via D-Bus)
//! - macOS: Keychain
//! - Windows: Credential Manager

use base64::{Engine, engine::general_purpose::STANDARD as BASE64};
use keyring::Entry;
use tracing::{debug, warn};

use crate::error::{Error, FormatError, Result};

/// Service name used for keyring entries.
const SERVICE_NAME: &str = "mailsend";

/// Entry probed to decide whether a usable keyring backend exists.
const PROBE_ENTRY: &str = "mailsend_probe";

/// Access to a keyring-like store of raw key bytes.
///
/// One entry per credential identifier; the value is the raw random key,
/// no other metadata.
pub trait KeyringStore {
    /// Whether a usable backend is present and accessible.
    fn is_available(&self) -> bool;

    /// Fetches the key stored under `id`, or `None` if absent.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend fails or the entry is corrupt.
    fn get_key(&self, id: &str) -> Result<Option<Vec<u8>>>;

    /// Stores `key` under `id`, replacing any previous value.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend refuses the write.
    fn set_key(&self, id: &str, key: &[u8]) -> Result<()>;
}

/// The platform keyring.
///
/// Key bytes are base64-encoded into the entry's password slot since
/// keyring values are strings.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemKeyring;

impl SystemKeyring {
    /// Creates a handle to the platform keyring.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl KeyringStore for SystemKeyring {
    fn is_available(&self) -> bool {
        match Entry::new(SERVICE_NAME, PROBE_ENTRY) {
            Ok(entry) => match entry.get_password() {
                Ok(_) | Err(keyring::Error::NoEntry) => true,
                Err(e) => {
                    warn!("keyring backend unavailable: {e}");
                    false
                }
            },
            Err(e) => {
                warn!("keyring backend unavailable: {e}");
                false
            }
        }
    }

    fn get_key(&self, id: &str) -> Result<Option<Vec<u8>>> {
        let entry = Entry::new(SERVICE_NAME, id)?;
        match entry.get_password() {
            Ok(stored) => {
                let key = BASE64
                    .decode(stored)
                    .map_err(|_| Error::Format(FormatError::InvalidKeyEncoding))?;
                debug!("loaded key from keyring entry {id}");
                Ok(Some(key))
            }
            Err(keyring::Error::NoEntry) => {
                debug!("no key in keyring entry {id}");
                Ok(None)
            }
            Err(e) => Err(e.into()),
        }
    }

    fn set_key(&self, id: &str, key: &[u8]) -> Result<()> {
        let entry = Entry::new(SERVICE_NAME, id)?;
        entry.set_password(&BASE64.encode(key))?;
        debug!("stored key in keyring entry {id}");
        Ok(())
    }
}

/// In-memory keyring fake for tests.
///
/// Behaves like a real backend, including an availability toggle so
/// keyring-outage paths can be exercised deterministically.
#[derive(Debug, Default)]
pub struct MemoryKeyring {
    entries: std::sync::Mutex<std::collections::HashMap<String, Vec<u8>>>,
    available: std::sync::atomic::AtomicBool,
}

impl MemoryKeyring {
    /// Creates an available, empty fake keyring.
    #[must_use]
    pub fn new() -> Self {
        let store = Self::default();
        store
            .available
            .store(true, std::sync::atomic::Ordering::SeqCst);
        store
    }

    /// Creates a fake keyring that reports itself unavailable.
    #[must_use]
    pub fn unavailable() -> Self {
        Self::default()
    }

    /// Toggles availability.
    pub fn set_available(&self, available: bool) {
        self.available
            .store(available, std::sync::atomic::Ordering::SeqCst);
    }

    /// Number of entries currently stored.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    #[must_use]
    #[allow(clippy::unwrap_used)]
    pub fn len(&self) -> usize {
        self.entries.lock().unwrap().len()
    }

    /// Whether no entries are stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[allow(clippy::unwrap_used)]
impl KeyringStore for MemoryKeyring {
    fn is_available(&self) -> bool {
        self.available.load(std::sync::atomic::Ordering::SeqCst)
    }

    fn get_key(&self, id: &str) -> Result<Option<Vec<u8>>> {
        if !self.is_available() {
            return Err(Error::KeyringUnavailable);
        }
        Ok(self.entries.lock().unwrap().get(id).cloned())
    }

    fn set_key(&self, id: &str, key: &[u8]) -> Result<()> {
        if !self.is_available() {
            return Err(Error::KeyringUnavailable);
        }
        self.entries
            .lock()
            .unwrap()
            .insert(id.to_string(), key.to_vec());
        Ok(())
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

    #[test]
    fn memory_keyring_round_trip() {
        let store = MemoryKeyring::new();
        assert!(store.is_available());
        assert_eq!(store.get_key("id").unwrap(), None);

        store.set_key("id", &[1, 2, 3]).unwrap();
        assert_eq!(store.get_key("id").unwrap(), Some(vec![1, 2, 3]));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn memory_keyring_overwrites() {
        let store = MemoryKeyring::new();
        store.set_key("id", &[1]).unwrap();
        store.set_key("id", &[2]).unwrap();
        assert_eq!(store.get_key("id").unwrap(), Some(vec![2]));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn unavailable_keyring_refuses_access() {
        let store = MemoryKeyring::unavailable();
        assert!(!store.is_available());
        assert!(matches!(
            store.get_key("id"),
            Err(Error::KeyringUnavailable)
        ));
        assert!(matches!(
            store.set_key("id", &[1]),
            Err(Error::KeyringUnavailable)
        ));
    }

    #[test]
    fn availability_toggle() {
        let store = MemoryKeyring::new();
        store.set_available(false);
        assert!(!store.is_available());
        store.set_available(true);
        assert!(store.is_available());
    }
}
