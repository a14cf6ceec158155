//! `OAuth2` provider configurations.

use crate::error::{Error, Result};
use url::Url;

const MS_LOGIN_BASE: &str = "https://login.microsoftonline.com";

/// `OAuth2` provider configuration.
#[derive(Debug, Clone)]
pub struct Provider {
    /// Provider name (e.g., "Google").
    pub name: String,
    /// Token endpoint URL.
    pub token_url: Url,
    /// Device authorization endpoint (if supported).
    pub device_auth_url: Option<Url>,
    /// Default scopes.
    pub default_scopes: Vec<String>,
}

impl Provider {
    /// Creates a new provider configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL is invalid.
    pub fn new(name: impl Into<String>, token_url: impl AsRef<str>) -> Result<Self> {
        Ok(Self {
            name: name.into(),
            token_url: Url::parse(token_url.as_ref())?,
            device_auth_url: None,
            default_scopes: Vec::new(),
        })
    }

    /// Sets the device authorization URL.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL is invalid.
    pub fn with_device_auth_url(mut self, url: impl AsRef<str>) -> Result<Self> {
        self.device_auth_url = Some(Url::parse(url.as_ref())?);
        Ok(self)
    }

    /// Sets the default scopes.
    #[must_use]
    pub fn with_default_scopes(mut self, scopes: Vec<String>) -> Self {
        self.default_scopes = scopes;
        self
    }

    /// Microsoft `OAuth2` provider configuration for sending mail via
    /// Graph.
    ///
    /// `tenant` selects the account class: `organizations` for work or
    /// school accounts, `consumers` for personal accounts, or a
    /// concrete tenant ID.
    ///
    /// Scopes:
    /// - `https://graph.microsoft.com/Mail.Send` - send as the signed-in user
    /// - `offline_access` - refresh token
    ///
    /// # Errors
    ///
    /// Returns an error if `tenant` does not form valid endpoint URLs.
    pub fn microsoft(tenant: &str) -> Result<Self> {
        if tenant.is_empty() {
            return Err(Error::InvalidConfig("tenant must not be empty".into()));
        }
        Ok(Self::new(
            "Microsoft",
            format!("{MS_LOGIN_BASE}/{tenant}/oauth2/v2.0/token"),
        )?
        .with_device_auth_url(format!("{MS_LOGIN_BASE}/{tenant}/oauth2/v2.0/devicecode"))?
        .with_default_scopes(vec![
            "https://graph.microsoft.com/Mail.Send".to_string(),
            "offline_access".to_string(),
        ]))
    }

    /// Google `OAuth2` provider configuration for sending mail via the
    /// Gmail API.
    ///
    /// Scopes:
    /// - `https://www.googleapis.com/auth/gmail.send` - send-only Gmail access
    ///
    /// Google's device flow requires the client secret when polling the
    /// token endpoint; set it on the [`crate::OAuthClient`].
    ///
    /// # Errors
    ///
    /// Returns an error if URL parsing fails.
    pub fn google() -> Result<Self> {
        Ok(Self::new("Google", "https://oauth2.googleapis.com/token")?
            .with_device_auth_url("https://oauth2.googleapis.com/device/code")?
            .with_default_scopes(vec![
                "https://www.googleapis.com/auth/gmail.send".to_string(),
            ]))
    }

    /// Validates that required endpoints are set.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration is invalid.
    pub fn validate(&self) -> Result<()> {
        if self.token_url.as_str().is_empty() {
            return Err(Error::InvalidConfig("token_url is empty".into()));
        }
        if self.device_auth_url.is_none() {
            return Err(Error::InvalidConfig(format!(
                "provider {} has no device authorization endpoint",
                self.name
            )));
        }
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
    fn microsoft_provider_is_tenant_aware() {
        let org = Provider::microsoft("organizations").unwrap();
        assert_eq!(org.name, "Microsoft");
        assert!(org.token_url.as_str().contains("/organizations/"));
        assert!(
            org.device_auth_url
                .as_ref()
                .unwrap()
                .as_str()
                .ends_with("/devicecode")
        );
        org.validate().unwrap();

        let consumer = Provider::microsoft("consumers").unwrap();
        assert!(consumer.token_url.as_str().contains("/consumers/"));
    }

    #[test]
    fn microsoft_scopes_cover_mail_send() {
        let provider = Provider::microsoft("organizations").unwrap();
        assert!(
            provider
                .default_scopes
                .iter()
                .any(|s| s.ends_with("Mail.Send"))
        );
        assert!(provider.default_scopes.iter().any(|s| s == "offline_access"));
    }

    #[test]
    fn empty_tenant_rejected() {
        assert!(matches!(
            Provider::microsoft(""),
            Err(Error::InvalidConfig(_))
        ));
    }

    #[test]
    fn google_provider() {
        let provider = Provider::google().unwrap();
        assert_eq!(provider.name, "Google");
        assert!(provider.device_auth_url.is_some());
        assert_eq!(
            provider.default_scopes,
            vec!["https://www.googleapis.com/auth/gmail.send".to_string()]
        );
        provider.validate().unwrap();
    }

    #[test]
    fn custom_provider_without_device_endpoint_fails_validation() {
        let provider = Provider::new("Custom", "https://auth.example.com/token").unwrap();
        assert!(matches!(
            provider.validate(),
            Err(Error::InvalidConfig(_))
        ));
    }
}
