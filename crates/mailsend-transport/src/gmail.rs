//! Gmail API raw-send transport.

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE;
use mailsend_mime::OutgoingMessage;
use reqwest::{Client, StatusCode};
use serde_json::json;
use tracing::{debug, info};

use crate::error::{Error, Result};

/// Gmail API send path for the authorized user.
const SEND_PATH: &str = "/gmail/v1/users/me/messages/send";

/// Default Gmail API host.
const DEFAULT_HOST: &str = "gmail.googleapis.com";

/// Sends mail via the Gmail API using an OAuth access token.
///
/// The whole RFC 5322 message is base64url-encoded into the `raw`
/// field; Gmail derives the envelope from the message headers
/// (including Bcc, which it strips before delivery).
#[derive(Debug)]
pub struct GmailTransport {
    access_token: String,
    from_address: String,
    send_url: String,
    client: Client,
}

impl GmailTransport {
    /// Creates a transport for the given bearer token and sender.
    #[must_use]
    pub fn new(access_token: impl Into<String>, from_address: impl Into<String>) -> Self {
        Self {
            access_token: access_token.into(),
            from_address: from_address.into(),
            send_url: format!("https://{DEFAULT_HOST}{SEND_PATH}"),
            client: Client::new(),
        }
    }

    /// Overrides the API host (private endpoints, tests).
    #[must_use]
    pub fn with_host(mut self, host: impl AsRef<str>) -> Self {
        self.send_url = format!("https://{}{SEND_PATH}", host.as_ref());
        self
    }

    /// Sends one message.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the API answers with
    /// anything other than 200/202.
    pub async fn send(&self, message: &OutgoingMessage) -> Result<()> {
        let raw = URL_SAFE.encode(message.to_rfc5322());
        debug!("posting Gmail raw send for {}", self.from_address);

        let response = self
            .client
            .post(&self.send_url)
            .bearer_auth(&self.access_token)
            .json(&json!({ "raw": raw }))
            .send()
            .await?;

        let status = response.status();
        if status != StatusCode::OK && status != StatusCode::ACCEPTED {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Api {
                status: status.as_u16(),
                body,
            });
        }
        info!("Gmail accepted message from {}", self.from_address);
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
    fn default_url_targets_gmail_api() {
        let transport = GmailTransport::new("token", "a@example.com");
        assert_eq!(
            transport.send_url,
            "https://gmail.googleapis.com/gmail/v1/users/me/messages/send"
        );
    }

    #[test]
    fn host_override_keeps_path() {
        let transport = GmailTransport::new("token", "a@example.com").with_host("localhost:9999");
        assert_eq!(
            transport.send_url,
            "https://localhost:9999/gmail/v1/users/me/messages/send"
        );
    }

    #[test]
    fn raw_encoding_is_base64url() {
        // '>' in a display name and multi-byte UTF-8 both produce
        // bytes whose standard-base64 encoding contains '+' or '/';
        // URL_SAFE must never emit those.
        let bytes = "Grüße <<<>>> ?????".as_bytes();
        let encoded = URL_SAFE.encode(bytes);
        assert!(!encoded.contains('+'));
        assert!(!encoded.contains('/'));
    }
}
