//! Microsoft Graph `sendMail` transport.

use mailsend_mime::{Mailbox, OutgoingMessage};
use reqwest::{Client, StatusCode};
use serde_json::{Value, json};
use tracing::{debug, info};

use crate::error::{Error, Result};

/// Graph `sendMail` endpoint for the signed-in user.
const GRAPH_SENDMAIL_URL: &str = "https://graph.microsoft.com/v1.0/me/sendMail";

/// Sends mail via Microsoft Graph using an OAuth access token.
#[derive(Debug)]
pub struct GraphTransport {
    access_token: String,
    from_address: String,
    endpoint: String,
    client: Client,
}

impl GraphTransport {
    /// Creates a transport for the given bearer token and sender.
    #[must_use]
    pub fn new(access_token: impl Into<String>, from_address: impl Into<String>) -> Self {
        Self {
            access_token: access_token.into(),
            from_address: from_address.into(),
            endpoint: GRAPH_SENDMAIL_URL.to_string(),
            client: Client::new(),
        }
    }

    /// Overrides the `sendMail` endpoint (sovereign clouds, tests).
    #[must_use]
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    /// Sends one message.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or Graph answers with
    /// anything other than 200/202.
    pub async fn send(&self, message: &OutgoingMessage) -> Result<()> {
        let payload = build_payload(message, &self.from_address);
        debug!("posting sendMail for {}", self.from_address);

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.access_token)
            .json(&payload)
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
        info!("Graph accepted message from {}", self.from_address);
        Ok(())
    }
}

fn recipient_list(mailboxes: &[Mailbox]) -> Vec<Value> {
    mailboxes
        .iter()
        .map(|mailbox| json!({ "emailAddress": { "address": mailbox.address.as_str() } }))
        .collect()
}

/// Converts a message into the Graph `sendMail` JSON payload.
///
/// The plain part is preferred for the body; HTML is used when no
/// plain part exists, and a multipart message without either sends an
/// empty text body.
fn build_payload(message: &OutgoingMessage, from_address: &str) -> Value {
    let (content_type, content) = match (&message.text_body, &message.html_body) {
        (Some(text), _) => ("Text", text.as_str()),
        (None, Some(html)) => ("HTML", html.as_str()),
        (None, None) => ("Text", ""),
    };

    let mut msg = json!({
        "subject": message.subject.as_deref().unwrap_or(""),
        "body": {
            "contentType": content_type,
            "content": content,
        },
        "from": { "emailAddress": { "address": from_address } },
        "toRecipients": recipient_list(&message.to),
    });

    if !message.cc.is_empty() {
        msg["ccRecipients"] = Value::Array(recipient_list(&message.cc));
    }
    if !message.bcc.is_empty() {
        msg["bccRecipients"] = Value::Array(recipient_list(&message.bcc));
    }

    if !message.attachments.is_empty() {
        let attachments: Vec<Value> = message
            .attachments
            .iter()
            .map(|attachment| {
                json!({
                    "@odata.type": "#microsoft.graph.fileAttachment",
                    "name": attachment.filename,
                    "contentType": attachment.content_type,
                    "contentBytes": mailsend_mime::encoding::encode_base64(&attachment.content),
                })
            })
            .collect();
        msg["attachments"] = Value::Array(attachments);
    }

    json!({ "message": msg })
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
    use mailsend_mime::{Attachment, MessageBuilder};

    fn message() -> MessageBuilder {
        MessageBuilder::new()
            .from("sender@example.com")
            .unwrap()
            .to("to@example.com")
            .unwrap()
    }

    #[test]
    fn payload_prefers_text_body() {
        let built = message()
            .subject("Hi")
            .text_body("plain")
            .html_body("<b>rich</b>")
            .build()
            .unwrap();
        let payload = build_payload(&built, "sender@example.com");

        assert_eq!(payload["message"]["subject"], "Hi");
        assert_eq!(payload["message"]["body"]["contentType"], "Text");
        assert_eq!(payload["message"]["body"]["content"], "plain");
    }

    #[test]
    fn payload_uses_html_when_no_text() {
        let built = message().html_body("<b>rich</b>").build().unwrap();
        let payload = build_payload(&built, "sender@example.com");
        assert_eq!(payload["message"]["body"]["contentType"], "HTML");
        assert_eq!(payload["message"]["body"]["content"], "<b>rich</b>");
    }

    #[test]
    fn payload_empty_body_without_content() {
        let built = message()
            .attachment(Attachment::from_bytes(vec![1], "a.bin", None).unwrap())
            .build()
            .unwrap();
        let payload = build_payload(&built, "sender@example.com");
        assert_eq!(payload["message"]["body"]["contentType"], "Text");
        assert_eq!(payload["message"]["body"]["content"], "");
    }

    #[test]
    fn payload_recipients_and_from() {
        let built = message()
            .cc("cc@example.com")
            .unwrap()
            .bcc("bcc@example.com")
            .unwrap()
            .text_body("x")
            .build()
            .unwrap();
        let payload = build_payload(&built, "sender@example.com");
        let msg = &payload["message"];

        assert_eq!(
            msg["from"]["emailAddress"]["address"],
            "sender@example.com"
        );
        assert_eq!(
            msg["toRecipients"][0]["emailAddress"]["address"],
            "to@example.com"
        );
        assert_eq!(
            msg["ccRecipients"][0]["emailAddress"]["address"],
            "cc@example.com"
        );
        assert_eq!(
            msg["bccRecipients"][0]["emailAddress"]["address"],
            "bcc@example.com"
        );
    }

    #[test]
    fn payload_omits_empty_recipient_lists() {
        let built = message().text_body("x").build().unwrap();
        let payload = build_payload(&built, "sender@example.com");
        assert!(payload["message"].get("ccRecipients").is_none());
        assert!(payload["message"].get("bccRecipients").is_none());
    }

    #[test]
    fn payload_encodes_attachments() {
        let built = message()
            .text_body("see attached")
            .attachment(
                Attachment::from_bytes(b"content".to_vec(), "file.txt", Some("text/plain"))
                    .unwrap(),
            )
            .build()
            .unwrap();
        let payload = build_payload(&built, "sender@example.com");
        let attachment = &payload["message"]["attachments"][0];

        assert_eq!(attachment["@odata.type"], "#microsoft.graph.fileAttachment");
        assert_eq!(attachment["name"], "file.txt");
        assert_eq!(attachment["contentType"], "text/plain");
        assert_eq!(
            attachment["contentBytes"],
            mailsend_mime::encoding::encode_base64(b"content")
        );
    }
}
