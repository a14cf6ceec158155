//! Key retrieval policy.
//!
//! A [`KeyPolicy`] is a declarative rule set stating which key-retrieval
//! strategies are permitted for a credential. It carries no key material
//! and performs no I/O; turning an empty strategy list into a failure is
//! the resolver's job.

use serde::{Deserialize, Serialize};

/// A key-retrieval strategy the resolver may attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyStrategy {
    /// Random key stored in the OS keyring.
    Keyring,
    /// Key derived from caller-supplied passphrase material.
    UserSupplied,
}

/// Declarative rule set for key retrieval.
///
/// A policy with both flags false is valid, but any save or load under
/// it always fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyPolicy {
    /// Try an OS-keyring-backed random key first.
    pub prefer_keyring: bool,
    /// Permit falling back to a caller-supplied passphrase-derived key.
    pub allow_user_key: bool,
}

impl Default for KeyPolicy {
    fn default() -> Self {
        Self {
            prefer_keyring: true,
            allow_user_key: false,
        }
    }
}

impl KeyPolicy {
    /// Creates a policy from explicit flags.
    #[must_use]
    pub const fn new(prefer_keyring: bool, allow_user_key: bool) -> Self {
        Self {
            prefer_keyring,
            allow_user_key,
        }
    }

    /// Permitted strategies in preference order.
    ///
    /// Keyring first if preferred, then user-supplied if allowed. An
    /// empty result is a valid output, not an error.
    #[must_use]
    pub fn permitted_strategies(&self) -> Vec<KeyStrategy> {
        let mut strategies = Vec::with_capacity(2);
        if self.prefer_keyring {
            strategies.push(KeyStrategy::Keyring);
        }
        if self.allow_user_key {
            strategies.push(KeyStrategy::UserSupplied);
        }
        strategies
    }

    /// Whether the given strategy is permitted at all.
    #[must_use]
    pub const fn permits(&self, strategy: KeyStrategy) -> bool {
        match strategy {
            KeyStrategy::Keyring => self.prefer_keyring,
            KeyStrategy::UserSupplied => self.allow_user_key,
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

    #[test]
    fn default_prefers_keyring_only() {
        let policy = KeyPolicy::default();
        assert!(policy.prefer_keyring);
        assert!(!policy.allow_user_key);
        assert_eq!(policy.permitted_strategies(), vec![KeyStrategy::Keyring]);
    }

    #[test]
    fn both_flags_yield_keyring_first() {
        let policy = KeyPolicy::new(true, true);
        assert_eq!(
            policy.permitted_strategies(),
            vec![KeyStrategy::Keyring, KeyStrategy::UserSupplied]
        );
    }

    #[test]
    fn user_key_only() {
        let policy = KeyPolicy::new(false, true);
        assert_eq!(
            policy.permitted_strategies(),
            vec![KeyStrategy::UserSupplied]
        );
    }

    #[test]
    fn both_false_is_valid_and_empty() {
        let policy = KeyPolicy::new(false, false);
        assert!(policy.permitted_strategies().is_empty());
    }

    #[test]
    fn permits_matches_flags() {
        let policy = KeyPolicy::new(true, false);
        assert!(policy.permits(KeyStrategy::Keyring));
        assert!(!policy.permits(KeyStrategy::UserSupplied));
    }

    #[test]
    fn serde_round_trip() {
        let policy = KeyPolicy::new(false, true);
        let json = serde_json::to_string(&policy).unwrap();
        let back: KeyPolicy = serde_json::from_str(&json).unwrap();
        assert_eq!(policy, back);
    }
}
