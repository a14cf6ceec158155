//! Email client facade.
//!
//! Composes credential storage, device-code authorization, and the
//! transports into one entry point. The client owns the *where* of
//! persistence (it resolves and creates the config directory); the
//! secure store underneath never creates directories itself.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, bail};
use chrono::Utc;
use tracing::{debug, info};
use zeroize::Zeroizing;

use mailsend_core::{
    CredentialConfig, GoogleApiConfig, KeyPolicy, MsGraphConfig, ProviderKind, SecureConfig,
    TokenRecord, paths, validate_config,
};
use mailsend_mime::OutgoingMessage;
use mailsend_oauth::flow::DeviceAuthorization;
use mailsend_oauth::{DeviceFlow, OAuthClient, Provider};
use mailsend_transport::{
    Backend, DryRunTransport, GmailTransport, GraphTransport, Transport,
};

/// Mail-sending client over encrypted provider credentials.
///
/// Configure provider settings and a key policy, authorize once via the
/// device-code flow, then send. Cached tokens round-trip through the
/// encrypted config store; nothing secret is kept in plaintext files.
pub struct EmailClient {
    ms_graph: Option<MsGraphConfig>,
    google_api: Option<GoogleApiConfig>,
    backend: Option<Backend>,
    store: SecureConfig,
    config_dir: PathBuf,
    user_key: Option<Zeroizing<Vec<u8>>>,
    dry_run_dir: Option<PathBuf>,
}

impl EmailClient {
    /// Creates a client over the platform config directory.
    ///
    /// # Errors
    ///
    /// Returns an error when the platform has no user config directory.
    pub fn new() -> anyhow::Result<Self> {
        let config_dir =
            paths::config_dir().context("no user config directory on this platform")?;
        Ok(Self::with_config_dir(config_dir))
    }

    /// Creates a client storing encrypted configs under `config_dir`.
    #[must_use]
    pub fn with_config_dir(config_dir: impl Into<PathBuf>) -> Self {
        Self {
            ms_graph: None,
            google_api: None,
            backend: None,
            store: SecureConfig::new(KeyPolicy::default()),
            config_dir: config_dir.into(),
            user_key: None,
            dry_run_dir: None,
        }
    }

    /// Replaces the key policy for subsequent save/load operations.
    #[must_use]
    pub fn key_policy(mut self, policy: KeyPolicy) -> Self {
        self.store = SecureConfig::new(policy);
        self
    }

    /// Supplies passphrase material for the user-supplied key strategy.
    ///
    /// Held zeroized in memory; never persisted.
    #[must_use]
    pub fn passphrase(mut self, passphrase: impl Into<Vec<u8>>) -> Self {
        self.user_key = Some(Zeroizing::new(passphrase.into()));
        self
    }

    /// Sets the Microsoft Graph account configuration.
    #[must_use]
    pub fn ms_graph(mut self, config: MsGraphConfig) -> Self {
        self.ms_graph = Some(config);
        self
    }

    /// Sets the Gmail API account configuration.
    #[must_use]
    pub fn google_api(mut self, config: GoogleApiConfig) -> Self {
        self.google_api = Some(config);
        self
    }

    /// Selects the sending backend.
    #[must_use]
    pub const fn backend(mut self, backend: Backend) -> Self {
        self.backend = Some(backend);
        self
    }

    /// Directory dry-run sends are captured into.
    ///
    /// Defaults to `mailsend/dry_run` under the system temp directory.
    #[must_use]
    pub fn dry_run_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.dry_run_dir = Some(dir.into());
        self
    }

    /// Current Microsoft Graph configuration, if any.
    #[must_use]
    pub const fn ms_graph_config(&self) -> Option<&MsGraphConfig> {
        self.ms_graph.as_ref()
    }

    /// Current Gmail API configuration, if any.
    #[must_use]
    pub const fn google_api_config(&self) -> Option<&GoogleApiConfig> {
        self.google_api.as_ref()
    }

    /// Path of the encrypted config file for a provider.
    #[must_use]
    pub fn config_path(&self, kind: ProviderKind) -> PathBuf {
        paths::encrypted_config_path(&self.config_dir, kind)
    }

    /// Encrypts and stores every configured provider.
    ///
    /// Creates the config directory if needed, then saves each present
    /// config to its per-provider file. Returns the written paths.
    ///
    /// # Errors
    ///
    /// Returns an error when nothing is configured, a config fails
    /// validation, or the secure store rejects the save.
    pub fn store_config(&self) -> anyhow::Result<Vec<PathBuf>> {
        if self.ms_graph.is_none() && self.google_api.is_none() {
            bail!("no configuration available to store");
        }
        std::fs::create_dir_all(&self.config_dir).with_context(|| {
            format!("creating config directory {}", self.config_dir.display())
        })?;

        let mut written = Vec::new();
        if let Some(cfg) = &self.ms_graph {
            written.push(self.save_one(CredentialConfig::MsGraph(cfg.clone()))?);
        }
        if let Some(cfg) = &self.google_api {
            written.push(self.save_one(CredentialConfig::GoogleApi(cfg.clone()))?);
        }
        Ok(written)
    }

    fn save_one(&self, config: CredentialConfig) -> anyhow::Result<PathBuf> {
        if let Err(errors) = validate_config(&config) {
            let joined = errors
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join(", ");
            bail!("invalid {} config: {joined}", config.kind());
        }

        let path = self.config_path(config.kind());
        let origin = self
            .store
            .save(&config, &path, self.user_key())
            .with_context(|| format!("saving {} config", config.kind()))?;
        debug!("stored {} config ({origin:?} key)", config.kind());
        Ok(path)
    }

    /// Loads a provider's encrypted config into the client.
    ///
    /// # Errors
    ///
    /// Returns an error when the file is missing, the key cannot be
    /// resolved under the policy, or decryption fails.
    pub fn load_config(&mut self, kind: ProviderKind) -> anyhow::Result<()> {
        let path = self.config_path(kind);
        let config = self
            .store
            .load(kind, &path, self.user_key())
            .with_context(|| format!("loading {kind} config from {}", path.display()))?;
        match config {
            CredentialConfig::MsGraph(cfg) => self.ms_graph = Some(cfg),
            CredentialConfig::GoogleApi(cfg) => self.google_api = Some(cfg),
        }
        Ok(())
    }

    /// Merges a freshly acquired token into a provider's cached state.
    ///
    /// # Errors
    ///
    /// Returns an error when that provider is not configured.
    pub fn apply_token(&mut self, kind: ProviderKind, record: &TokenRecord) -> anyhow::Result<()> {
        match kind {
            ProviderKind::MsGraph => self
                .ms_graph
                .as_mut()
                .context("no Microsoft Graph config to apply token to")?
                .apply_token(record, Utc::now()),
            ProviderKind::GoogleApi => self
                .google_api
                .as_mut()
                .context("no Gmail API config to apply token to")?
                .apply_token(record, Utc::now()),
        }
        Ok(())
    }

    /// Runs the device-code flow for a provider and returns the token.
    ///
    /// `on_prompt` receives the user code and verification URI to
    /// display; this client never prompts or prints on its own.
    ///
    /// # Errors
    ///
    /// Returns an error when the provider is not configured, the user
    /// denies access, or the device code expires unapproved.
    pub async fn acquire_token<F>(
        &self,
        kind: ProviderKind,
        on_prompt: F,
    ) -> anyhow::Result<TokenRecord>
    where
        F: FnOnce(&DeviceAuthorization),
    {
        let (client, scopes) = self.oauth_client(kind)?;
        let flow = DeviceFlow::new(client);

        let auth = flow.request_device_authorization(scopes.as_deref()).await?;
        on_prompt(&auth);

        let mut interval = Duration::from_secs(u64::from(auth.interval));
        let max_attempts = (auth.expires_in / auth.interval.max(1)) as usize + 1;
        let mut attempts = 0usize;
        loop {
            if attempts >= max_attempts {
                bail!("device authorization expired before approval");
            }
            match flow.poll_for_token(&auth.device_code, interval).await {
                Ok(token) => {
                    return Ok(TokenRecord::new(token.access_token, token.expires_at));
                }
                Err(mailsend_oauth::Error::OAuth { ref error, .. })
                    if error == "authorization_pending" =>
                {
                    attempts += 1;
                }
                Err(mailsend_oauth::Error::OAuth { ref error, .. }) if error == "slow_down" => {
                    interval += Duration::from_secs(5);
                    attempts += 1;
                }
                Err(e) => return Err(e.into()),
            }
        }
    }

    /// Acquires a token, caches it in the config, and stores the
    /// encrypted config.
    ///
    /// # Errors
    ///
    /// Returns an error when authorization or persistence fails.
    pub async fn authorize<F>(&mut self, kind: ProviderKind, on_prompt: F) -> anyhow::Result<()>
    where
        F: FnOnce(&DeviceAuthorization),
    {
        let record = self.acquire_token(kind, on_prompt).await?;
        self.apply_token(kind, &record)?;
        self.store_config()?;
        info!("authorized {kind} and stored encrypted config");
        Ok(())
    }

    /// Sends a message through the selected backend using the cached
    /// access token.
    ///
    /// # Errors
    ///
    /// Returns an error when no backend is selected, the backend's
    /// provider has no cached token, or delivery fails.
    pub async fn send(&self, message: &OutgoingMessage) -> anyhow::Result<()> {
        let backend = self.backend.context("no backend configured")?;
        let transport = self.transport(backend)?;
        transport
            .send(message)
            .await
            .with_context(|| format!("sending via {backend}"))?;
        Ok(())
    }

    fn transport(&self, backend: Backend) -> anyhow::Result<Transport> {
        match backend {
            Backend::MsGraph => {
                let cfg = self
                    .ms_graph
                    .as_ref()
                    .context("Microsoft Graph backend selected but not configured")?;
                let token = cfg.token_value.as_deref().context(
                    "no cached Microsoft Graph access token; run device authorization first",
                )?;
                Ok(Transport::Graph(GraphTransport::new(
                    token,
                    &cfg.email_address,
                )))
            }
            Backend::GoogleApi => {
                let cfg = self
                    .google_api
                    .as_ref()
                    .context("Gmail API backend selected but not configured")?;
                let token = cfg
                    .token_value
                    .as_deref()
                    .context("no cached Gmail access token; run device authorization first")?;
                let host = if cfg.port == 443 {
                    cfg.host.clone()
                } else {
                    format!("{}:{}", cfg.host, cfg.port)
                };
                Ok(Transport::Gmail(
                    GmailTransport::new(token, &cfg.email_address).with_host(host),
                ))
            }
            Backend::DryRun => {
                let dir = self.dry_run_dir.clone().unwrap_or_else(|| {
                    std::env::temp_dir().join("mailsend").join("dry_run")
                });
                Ok(Transport::DryRun(DryRunTransport::new(dir)?))
            }
        }
    }

    fn oauth_client(&self, kind: ProviderKind) -> anyhow::Result<(OAuthClient, Option<Vec<String>>)> {
        match kind {
            ProviderKind::MsGraph => {
                let cfg = self
                    .ms_graph
                    .as_ref()
                    .context("no Microsoft Graph config")?;
                let client_id = cfg
                    .client_id
                    .as_deref()
                    .context("Microsoft Graph config has no client_id")?;
                let provider = Provider::microsoft(cfg.authority.tenant())?;
                Ok((OAuthClient::new(client_id, provider), None))
            }
            ProviderKind::GoogleApi => {
                let cfg = self.google_api.as_ref().context("no Gmail API config")?;
                let client_id = cfg
                    .client_id
                    .as_deref()
                    .context("Gmail API config has no client_id")?;
                let provider = Provider::google()?;
                let mut client = OAuthClient::new(client_id, provider);
                if let Some(secret) = &cfg.client_secret {
                    client = client.with_client_secret(secret);
                }
                Ok((client, cfg.scopes.clone()))
            }
        }
    }

    fn user_key(&self) -> Option<&[u8]> {
        self.user_key.as_ref().map(|key| key.as_slice())
    }

    /// The directory encrypted configs live in.
    #[must_use]
    pub fn config_dir(&self) -> &Path {
        &self.config_dir
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
    use mailsend_mime::MessageBuilder;
    use tempfile::TempDir;

    fn passphrase_client(dir: &Path) -> EmailClient {
        EmailClient::with_config_dir(dir)
            .key_policy(KeyPolicy::new(false, true))
            .passphrase("correct-horse")
    }

    #[test]
    fn store_and_load_round_trip_with_passphrase() {
        let dir = TempDir::new().unwrap();
        let cfg_dir = dir.path().join("cfg");

        let client = passphrase_client(&cfg_dir)
            .ms_graph(MsGraphConfig::new("a@example.com").with_client_id("abc"));
        let written = client.store_config().unwrap();
        assert_eq!(written.len(), 1);
        assert!(written[0].ends_with("ms_graph.enc"));

        let mut fresh = passphrase_client(&cfg_dir);
        fresh.load_config(ProviderKind::MsGraph).unwrap();
        let loaded = fresh.ms_graph_config().unwrap();
        assert_eq!(loaded.email_address, "a@example.com");
        assert_eq!(loaded.client_id.as_deref(), Some("abc"));
    }

    #[test]
    fn wrong_passphrase_fails_to_load() {
        let dir = TempDir::new().unwrap();
        let cfg_dir = dir.path().join("cfg");

        passphrase_client(&cfg_dir)
            .ms_graph(MsGraphConfig::new("a@example.com"))
            .store_config()
            .unwrap();

        let mut wrong = EmailClient::with_config_dir(&cfg_dir)
            .key_policy(KeyPolicy::new(false, true))
            .passphrase("wrong-horse");
        assert!(wrong.load_config(ProviderKind::MsGraph).is_err());
    }

    #[test]
    fn store_without_config_is_an_error() {
        let dir = TempDir::new().unwrap();
        let client = passphrase_client(dir.path());
        assert!(client.store_config().is_err());
    }

    #[test]
    fn invalid_config_is_rejected_before_writing() {
        let dir = TempDir::new().unwrap();
        let cfg_dir = dir.path().join("cfg");
        let client = passphrase_client(&cfg_dir).ms_graph(MsGraphConfig::new("not-an-address"));
        assert!(client.store_config().is_err());
        assert!(!client.config_path(ProviderKind::MsGraph).exists());
    }

    #[test]
    fn both_providers_store_to_separate_files() {
        let dir = TempDir::new().unwrap();
        let client = passphrase_client(dir.path())
            .ms_graph(MsGraphConfig::new("a@example.com"))
            .google_api(GoogleApiConfig::new("b@example.com"));

        let written = client.store_config().unwrap();
        assert_eq!(written.len(), 2);
        assert!(client.config_path(ProviderKind::MsGraph).exists());
        assert!(client.config_path(ProviderKind::GoogleApi).exists());
    }

    #[test]
    fn applied_token_survives_the_encrypted_round_trip() {
        let dir = TempDir::new().unwrap();
        let cfg_dir = dir.path().join("cfg");

        let mut client =
            passphrase_client(&cfg_dir).google_api(GoogleApiConfig::new("b@example.com"));
        client
            .apply_token(
                ProviderKind::GoogleApi,
                &TokenRecord::new("fresh-token", None),
            )
            .unwrap();
        client.store_config().unwrap();

        let mut fresh = passphrase_client(&cfg_dir);
        fresh.load_config(ProviderKind::GoogleApi).unwrap();
        assert_eq!(
            fresh.google_api_config().unwrap().token_value.as_deref(),
            Some("fresh-token")
        );
        assert!(fresh.google_api_config().unwrap().token_timestamp.is_some());
    }

    #[test]
    fn apply_token_without_config_fails() {
        let dir = TempDir::new().unwrap();
        let mut client = passphrase_client(dir.path());
        assert!(
            client
                .apply_token(ProviderKind::MsGraph, &TokenRecord::new("t", None))
                .is_err()
        );
    }

    #[tokio::test]
    async fn dry_run_send_captures_message() {
        let dir = TempDir::new().unwrap();
        let out_dir = dir.path().join("captures");
        let client = EmailClient::with_config_dir(dir.path())
            .backend(Backend::DryRun)
            .dry_run_dir(&out_dir);

        let message = MessageBuilder::new()
            .from("a@example.com")
            .unwrap()
            .to("b@example.com")
            .unwrap()
            .subject("Dry")
            .text_body("run")
            .build()
            .unwrap();
        client.send(&message).await.unwrap();

        let eml_count = std::fs::read_dir(&out_dir)
            .unwrap()
            .filter(|entry| {
                entry
                    .as_ref()
                    .unwrap()
                    .path()
                    .extension()
                    .is_some_and(|ext| ext == "eml")
            })
            .count();
        assert_eq!(eml_count, 1);
    }

    #[tokio::test]
    async fn send_without_backend_fails() {
        let dir = TempDir::new().unwrap();
        let client = EmailClient::with_config_dir(dir.path());
        let message = MessageBuilder::new()
            .from("a@example.com")
            .unwrap()
            .to("b@example.com")
            .unwrap()
            .text_body("x")
            .build()
            .unwrap();
        assert!(client.send(&message).await.is_err());
    }

    #[tokio::test]
    async fn graph_send_requires_cached_token() {
        let dir = TempDir::new().unwrap();
        let client = EmailClient::with_config_dir(dir.path())
            .ms_graph(MsGraphConfig::new("a@example.com"))
            .backend(Backend::MsGraph);
        let message = MessageBuilder::new()
            .from("a@example.com")
            .unwrap()
            .to("b@example.com")
            .unwrap()
            .text_body("x")
            .build()
            .unwrap();
        let err = client.send(&message).await.unwrap_err();
        assert!(format!("{err:#}").contains("no cached Microsoft Graph access token"));
    }

    #[test]
    #[ignore = "Interacts with system keyring"]
    fn keyring_backed_round_trip() {
        let dir = TempDir::new().unwrap();
        let cfg_dir = dir.path().join("cfg");

        let client = EmailClient::with_config_dir(&cfg_dir)
            .key_policy(KeyPolicy::new(true, false))
            .ms_graph(MsGraphConfig::new("keyring-test@example.com"));
        client.store_config().unwrap();

        let mut fresh =
            EmailClient::with_config_dir(&cfg_dir).key_policy(KeyPolicy::new(true, false));
        fresh.load_config(ProviderKind::MsGraph).unwrap();
        assert_eq!(
            fresh.ms_graph_config().unwrap().email_address,
            "keyring-test@example.com"
        );
    }
}
