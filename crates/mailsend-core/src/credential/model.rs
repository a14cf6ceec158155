//! Credential model types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Default Gmail API host.
pub const GMAIL_API_HOST: &str = "gmail.googleapis.com";

/// Default Gmail API port.
pub const GMAIL_API_PORT: u16 = 443;

/// Microsoft identity tenant class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Authority {
    /// Work or school accounts (Entra ID tenants).
    #[default]
    Organization,
    /// Personal Microsoft accounts.
    Consumer,
}

impl Authority {
    /// Tenant segment used in login endpoint URLs.
    #[must_use]
    pub const fn tenant(&self) -> &'static str {
        match self {
            Self::Organization => "organizations",
            Self::Consumer => "consumers",
        }
    }
}

impl std::fmt::Display for Authority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.tenant())
    }
}

/// Microsoft Graph account configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MsGraphConfig {
    /// Sending account's email address.
    pub email_address: String,
    /// Application (client) ID registered for device-code auth.
    pub client_id: Option<String>,
    /// Tenant class used when building login endpoints.
    pub authority: Authority,
    /// Legacy SMTP host, kept for accounts migrated from SMTP submission.
    pub smtp_host: Option<String>,
    /// Legacy SMTP port.
    pub smtp_port: Option<u16>,
    /// Legacy SMTP STARTTLS flag.
    pub smtp_starttls: Option<bool>,
    /// Cached access token, if one has been acquired.
    pub token_value: Option<String>,
    /// When the cached token was acquired.
    pub token_timestamp: Option<DateTime<Utc>>,
}

impl MsGraphConfig {
    /// Creates a config for the given account address.
    #[must_use]
    pub fn new(email_address: impl Into<String>) -> Self {
        Self {
            email_address: email_address.into(),
            client_id: None,
            authority: Authority::default(),
            smtp_host: None,
            smtp_port: None,
            smtp_starttls: None,
            token_value: None,
            token_timestamp: None,
        }
    }

    /// Sets the application (client) ID.
    #[must_use]
    pub fn with_client_id(mut self, client_id: impl Into<String>) -> Self {
        self.client_id = Some(client_id.into());
        self
    }

    /// Sets the tenant class.
    #[must_use]
    pub const fn with_authority(mut self, authority: Authority) -> Self {
        self.authority = authority;
        self
    }

    /// Replaces the cached token state.
    pub fn apply_token(&mut self, record: &TokenRecord, acquired_at: DateTime<Utc>) {
        self.token_value = Some(record.access_token.clone());
        self.token_timestamp = Some(acquired_at);
    }

    /// Whether a cached access token is present.
    #[must_use]
    pub const fn has_cached_token(&self) -> bool {
        self.token_value.is_some()
    }
}

/// Gmail API account configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GoogleApiConfig {
    /// Gmail API host.
    pub host: String,
    /// Gmail API port.
    pub port: u16,
    /// Sending account's email address.
    pub email_address: String,
    /// OAuth client ID registered for device-code auth.
    pub client_id: Option<String>,
    /// OAuth client secret; Google requires it at the token endpoint
    /// even for installed apps.
    pub client_secret: Option<String>,
    /// OAuth scopes to request; provider defaults when absent.
    pub scopes: Option<Vec<String>>,
    /// Cached access token, if one has been acquired.
    pub token_value: Option<String>,
    /// When the cached token was acquired.
    pub token_timestamp: Option<DateTime<Utc>>,
}

impl GoogleApiConfig {
    /// Creates a config for the given account address with default
    /// Gmail API endpoint settings.
    #[must_use]
    pub fn new(email_address: impl Into<String>) -> Self {
        Self {
            host: GMAIL_API_HOST.to_string(),
            port: GMAIL_API_PORT,
            email_address: email_address.into(),
            client_id: None,
            client_secret: None,
            scopes: None,
            token_value: None,
            token_timestamp: None,
        }
    }

    /// Sets the OAuth client ID.
    #[must_use]
    pub fn with_client_id(mut self, client_id: impl Into<String>) -> Self {
        self.client_id = Some(client_id.into());
        self
    }

    /// Sets the OAuth client secret.
    #[must_use]
    pub fn with_client_secret(mut self, client_secret: impl Into<String>) -> Self {
        self.client_secret = Some(client_secret.into());
        self
    }

    /// Sets the OAuth scopes to request.
    #[must_use]
    pub fn with_scopes(mut self, scopes: Vec<String>) -> Self {
        self.scopes = Some(scopes);
        self
    }

    /// Replaces the cached token state.
    pub fn apply_token(&mut self, record: &TokenRecord, acquired_at: DateTime<Utc>) {
        self.token_value = Some(record.access_token.clone());
        self.token_timestamp = Some(acquired_at);
    }

    /// Whether a cached access token is present.
    #[must_use]
    pub const fn has_cached_token(&self) -> bool {
        self.token_value.is_some()
    }
}

/// Access token handed over by a device-code auth provider.
///
/// The store keeps these values opaque: it persists them inside a
/// credential config and never interprets them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenRecord {
    /// Bearer token string.
    pub access_token: String,
    /// Expiry reported by the authorization server, if any.
    pub expires_at: Option<DateTime<Utc>>,
}

impl TokenRecord {
    /// Creates a token record.
    #[must_use]
    pub fn new(access_token: impl Into<String>, expires_at: Option<DateTime<Utc>>) -> Self {
        Self {
            access_token: access_token.into(),
            expires_at,
        }
    }
}

/// Identifies which provider a credential config belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderKind {
    /// Microsoft Graph.
    MsGraph,
    /// Gmail API.
    GoogleApi,
}

impl ProviderKind {
    /// Stable identifier used in file names and keyring entries.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::MsGraph => "ms_graph",
            Self::GoogleApi => "google_api",
        }
    }
}

impl std::fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One provider's credential configuration.
///
/// The closed set of provider variants the serializer and the secure
/// store operate on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "provider", content = "config", rename_all = "snake_case")]
pub enum CredentialConfig {
    /// Microsoft Graph account.
    MsGraph(MsGraphConfig),
    /// Gmail API account.
    GoogleApi(GoogleApiConfig),
}

impl CredentialConfig {
    /// Which provider this config belongs to.
    #[must_use]
    pub const fn kind(&self) -> ProviderKind {
        match self {
            Self::MsGraph(_) => ProviderKind::MsGraph,
            Self::GoogleApi(_) => ProviderKind::GoogleApi,
        }
    }

    /// Sending account's email address.
    #[must_use]
    pub fn email_address(&self) -> &str {
        match self {
            Self::MsGraph(cfg) => &cfg.email_address,
            Self::GoogleApi(cfg) => &cfg.email_address,
        }
    }

    /// Cached access token, if one has been acquired.
    #[must_use]
    pub fn cached_token(&self) -> Option<&str> {
        match self {
            Self::MsGraph(cfg) => cfg.token_value.as_deref(),
            Self::GoogleApi(cfg) => cfg.token_value.as_deref(),
        }
    }
}

impl From<MsGraphConfig> for CredentialConfig {
    fn from(cfg: MsGraphConfig) -> Self {
        Self::MsGraph(cfg)
    }
}

impl From<GoogleApiConfig> for CredentialConfig {
    fn from(cfg: GoogleApiConfig) -> Self {
        Self::GoogleApi(cfg)
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

    mod authority_tests {
        use super::*;

        #[test]
        fn default_is_organization() {
            assert_eq!(Authority::default(), Authority::Organization);
        }

        #[test]
        fn tenant_segments() {
            assert_eq!(Authority::Organization.tenant(), "organizations");
            assert_eq!(Authority::Consumer.tenant(), "consumers");
        }
    }

    mod ms_graph_config_tests {
        use super::*;

        #[test]
        fn new_has_no_cached_token() {
            let cfg = MsGraphConfig::new("a@example.com");
            assert_eq!(cfg.email_address, "a@example.com");
            assert!(cfg.client_id.is_none());
            assert!(!cfg.has_cached_token());
        }

        #[test]
        fn builder_setters() {
            let cfg = MsGraphConfig::new("a@example.com")
                .with_client_id("abc")
                .with_authority(Authority::Consumer);
            assert_eq!(cfg.client_id.as_deref(), Some("abc"));
            assert_eq!(cfg.authority, Authority::Consumer);
        }

        #[test]
        fn apply_token_sets_cached_state() {
            let mut cfg = MsGraphConfig::new("a@example.com");
            let now = Utc::now();
            cfg.apply_token(&TokenRecord::new("tok", None), now);
            assert_eq!(cfg.token_value.as_deref(), Some("tok"));
            assert_eq!(cfg.token_timestamp, Some(now));
        }
    }

    mod google_api_config_tests {
        use super::*;

        #[test]
        fn new_uses_gmail_defaults() {
            let cfg = GoogleApiConfig::new("a@example.com");
            assert_eq!(cfg.host, GMAIL_API_HOST);
            assert_eq!(cfg.port, GMAIL_API_PORT);
            assert!(cfg.scopes.is_none());
        }

        #[test]
        fn with_scopes() {
            let cfg = GoogleApiConfig::new("a@example.com")
                .with_scopes(vec!["https://www.googleapis.com/auth/gmail.send".into()]);
            assert_eq!(cfg.scopes.as_ref().map(Vec::len), Some(1));
        }
    }

    mod credential_config_tests {
        use super::*;

        #[test]
        fn kind_and_email() {
            let ms: CredentialConfig = MsGraphConfig::new("a@example.com").into();
            assert_eq!(ms.kind(), ProviderKind::MsGraph);
            assert_eq!(ms.email_address(), "a@example.com");

            let google: CredentialConfig = GoogleApiConfig::new("b@example.com").into();
            assert_eq!(google.kind(), ProviderKind::GoogleApi);
            assert_eq!(google.email_address(), "b@example.com");
        }

        #[test]
        fn cached_token_passthrough() {
            let mut cfg = MsGraphConfig::new("a@example.com");
            assert_eq!(CredentialConfig::from(cfg.clone()).cached_token(), None);
            cfg.apply_token(&TokenRecord::new("tok", None), Utc::now());
            assert_eq!(
                CredentialConfig::from(cfg).cached_token(),
                Some("tok")
            );
        }

        #[test]
        fn provider_kind_identifiers() {
            assert_eq!(ProviderKind::MsGraph.as_str(), "ms_graph");
            assert_eq!(ProviderKind::GoogleApi.as_str(), "google_api");
            assert_eq!(format!("{}", ProviderKind::MsGraph), "ms_graph");
        }
    }
}
