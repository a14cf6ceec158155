//! Storage location resolution.
//!
//! Resolves the user-scoped directory that encrypted configs live in.
//! The secure store itself only ever takes already-resolved file paths
//! and never creates directories; callers that want the default layout
//! use these helpers and create the directory themselves.

use std::path::{Path, PathBuf};

use crate::credential::ProviderKind;

/// Application directory name under the platform config root.
pub const APP_DIR_NAME: &str = "mailsend";

/// Platform config directory for this application.
///
/// Linux: `~/.config/mailsend`, macOS:
/// `~/Library/Application Support/mailsend`, Windows:
/// `%APPDATA%\mailsend`. `None` when the platform has no config root.
#[must_use]
pub fn config_dir() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join(APP_DIR_NAME))
}

/// Encrypted config file path for a provider inside `dir`.
#[must_use]
pub fn encrypted_config_path(dir: &Path, kind: ProviderKind) -> PathBuf {
    dir.join(format!("{kind}.enc"))
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
    fn encrypted_paths_are_per_provider() {
        let dir = Path::new("/tmp/mailsend");
        assert_eq!(
            encrypted_config_path(dir, ProviderKind::MsGraph),
            Path::new("/tmp/mailsend/ms_graph.enc")
        );
        assert_eq!(
            encrypted_config_path(dir, ProviderKind::GoogleApi),
            Path::new("/tmp/mailsend/google_api.enc")
        );
    }

    #[test]
    fn config_dir_ends_with_app_name() {
        if let Some(dir) = config_dir() {
            assert!(dir.ends_with(APP_DIR_NAME));
        }
    }
}
