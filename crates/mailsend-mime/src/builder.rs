//! Structured builder for outgoing messages.

use std::collections::HashSet;
use std::path::Path;

use chrono::{DateTime, Utc};

use crate::address::Mailbox;
use crate::attachment::Attachment;
use crate::error::{Error, Result};
use crate::message::OutgoingMessage;

/// Headers the builder manages itself; setting them manually is an
/// error.
const RESERVED_HEADERS: [&str; 9] = [
    "from",
    "to",
    "cc",
    "bcc",
    "subject",
    "date",
    "mime-version",
    "content-type",
    "content-transfer-encoding",
];

/// Structured builder for [`OutgoingMessage`] instances.
///
/// The builder normalizes addresses, deduplicates recipients
/// case-insensitively per list, and validates required fields at
/// [`build`](Self::build) time.
#[derive(Debug, Default)]
pub struct MessageBuilder {
    from: Option<Mailbox>,
    to: Vec<Mailbox>,
    cc: Vec<Mailbox>,
    bcc: Vec<Mailbox>,
    to_seen: HashSet<String>,
    cc_seen: HashSet<String>,
    bcc_seen: HashSet<String>,
    subject: Option<String>,
    text_body: Option<String>,
    html_body: Option<String>,
    attachments: Vec<Attachment>,
    headers: Vec<(String, String)>,
    date: Option<DateTime<Utc>>,
}

impl MessageBuilder {
    /// Creates an empty builder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the From address (`Name <addr>` or bare addr).
    ///
    /// # Errors
    ///
    /// Returns an error if the address is invalid.
    pub fn from(mut self, address: &str) -> Result<Self> {
        self.from = Some(Mailbox::parse(address)?);
        Ok(self)
    }

    /// Adds a To recipient. Duplicate addresses are ignored.
    ///
    /// # Errors
    ///
    /// Returns an error if the address is invalid.
    pub fn to(mut self, address: &str) -> Result<Self> {
        let mailbox = Mailbox::parse(address)?;
        if self.to_seen.insert(mailbox.address.dedup_key()) {
            self.to.push(mailbox);
        }
        Ok(self)
    }

    /// Adds a Cc recipient. Duplicate addresses are ignored.
    ///
    /// # Errors
    ///
    /// Returns an error if the address is invalid.
    pub fn cc(mut self, address: &str) -> Result<Self> {
        let mailbox = Mailbox::parse(address)?;
        if self.cc_seen.insert(mailbox.address.dedup_key()) {
            self.cc.push(mailbox);
        }
        Ok(self)
    }

    /// Adds a Bcc recipient. Duplicate addresses are ignored.
    ///
    /// # Errors
    ///
    /// Returns an error if the address is invalid.
    pub fn bcc(mut self, address: &str) -> Result<Self> {
        let mailbox = Mailbox::parse(address)?;
        if self.bcc_seen.insert(mailbox.address.dedup_key()) {
            self.bcc.push(mailbox);
        }
        Ok(self)
    }

    /// Sets the subject.
    #[must_use]
    pub fn subject(mut self, subject: impl Into<String>) -> Self {
        self.subject = Some(subject.into().trim().to_string());
        self
    }

    /// Sets the plain text body.
    #[must_use]
    pub fn text_body(mut self, body: impl Into<String>) -> Self {
        self.text_body = Some(body.into());
        self
    }

    /// Sets the HTML body.
    #[must_use]
    pub fn html_body(mut self, body: impl Into<String>) -> Self {
        self.html_body = Some(body.into());
        self
    }

    /// Adds a prepared attachment.
    #[must_use]
    pub fn attachment(mut self, attachment: Attachment) -> Self {
        self.attachments.push(attachment);
        self
    }

    /// Reads a file from disk and attaches it.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read.
    pub fn attachment_path(self, path: impl AsRef<Path>) -> Result<Self> {
        let attachment = Attachment::from_path(path, None, None)?;
        Ok(self.attachment(attachment))
    }

    /// Adds an extra header.
    ///
    /// # Errors
    ///
    /// Returns an error if the name is reserved or malformed.
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Result<Self> {
        let name = name.into();
        if name.is_empty()
            || !name.is_ascii()
            || name.contains(':')
            || name.chars().any(char::is_whitespace)
        {
            return Err(Error::InvalidHeaderName(name));
        }
        if RESERVED_HEADERS.contains(&name.to_ascii_lowercase().as_str()) {
            return Err(Error::ReservedHeader(name));
        }
        self.headers.push((name, value.into()));
        Ok(self)
    }

    /// Pins the Date header; defaults to build time.
    #[must_use]
    pub const fn date(mut self, date: DateTime<Utc>) -> Self {
        self.date = Some(date);
        self
    }

    /// Validates and produces the outgoing message.
    ///
    /// # Errors
    ///
    /// Returns an error if the From address is missing, there is no
    /// recipient, or the message has neither a body nor an attachment.
    pub fn build(self) -> Result<OutgoingMessage> {
        let from = self.from.ok_or(Error::MissingFrom)?;

        if self.to.is_empty() && self.cc.is_empty() && self.bcc.is_empty() {
            return Err(Error::NoRecipients);
        }

        if self.text_body.is_none() && self.html_body.is_none() && self.attachments.is_empty() {
            return Err(Error::EmptyContent);
        }

        Ok(OutgoingMessage {
            from,
            to: self.to,
            cc: self.cc,
            bcc: self.bcc,
            subject: self.subject,
            text_body: self.text_body,
            html_body: self.html_body,
            attachments: self.attachments,
            headers: self.headers,
            date: self.date.unwrap_or_else(Utc::now),
        })
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
    fn minimal_text_message() {
        let message = MessageBuilder::new()
            .from("a@example.com")
            .unwrap()
            .to("b@example.com")
            .unwrap()
            .text_body("hi")
            .build()
            .unwrap();
        assert_eq!(message.from.address.as_str(), "a@example.com");
        assert_eq!(message.to.len(), 1);
        assert_eq!(message.text_body.as_deref(), Some("hi"));
    }

    #[test]
    fn missing_from_rejected() {
        let result = MessageBuilder::new()
            .to("b@example.com")
            .unwrap()
            .text_body("hi")
            .build();
        assert!(matches!(result, Err(Error::MissingFrom)));
    }

    #[test]
    fn no_recipients_rejected() {
        let result = MessageBuilder::new()
            .from("a@example.com")
            .unwrap()
            .text_body("hi")
            .build();
        assert!(matches!(result, Err(Error::NoRecipients)));
    }

    #[test]
    fn bcc_only_recipient_is_enough() {
        let message = MessageBuilder::new()
            .from("a@example.com")
            .unwrap()
            .bcc("hidden@example.com")
            .unwrap()
            .text_body("hi")
            .build()
            .unwrap();
        assert_eq!(message.bcc.len(), 1);
    }

    #[test]
    fn empty_content_rejected() {
        let result = MessageBuilder::new()
            .from("a@example.com")
            .unwrap()
            .to("b@example.com")
            .unwrap()
            .build();
        assert!(matches!(result, Err(Error::EmptyContent)));
    }

    #[test]
    fn attachment_only_content_is_enough() {
        let message = MessageBuilder::new()
            .from("a@example.com")
            .unwrap()
            .to("b@example.com")
            .unwrap()
            .attachment(Attachment::from_bytes(vec![1], "a.bin", None).unwrap())
            .build()
            .unwrap();
        assert_eq!(message.attachments.len(), 1);
    }

    #[test]
    fn recipients_dedup_case_insensitively() {
        let message = MessageBuilder::new()
            .from("a@example.com")
            .unwrap()
            .to("B@example.com")
            .unwrap()
            .to("b@example.com")
            .unwrap()
            .to("c@example.com")
            .unwrap()
            .text_body("hi")
            .build()
            .unwrap();
        assert_eq!(message.to.len(), 2);
    }

    #[test]
    fn dedup_is_per_list() {
        let message = MessageBuilder::new()
            .from("a@example.com")
            .unwrap()
            .to("b@example.com")
            .unwrap()
            .cc("b@example.com")
            .unwrap()
            .text_body("hi")
            .build()
            .unwrap();
        assert_eq!(message.to.len(), 1);
        assert_eq!(message.cc.len(), 1);
    }

    #[test]
    fn named_recipient_parsed() {
        let message = MessageBuilder::new()
            .from("Sender <a@example.com>")
            .unwrap()
            .to("Jane Doe <jane@example.com>")
            .unwrap()
            .text_body("hi")
            .build()
            .unwrap();
        assert_eq!(message.from.name.as_deref(), Some("Sender"));
        assert_eq!(message.to[0].name.as_deref(), Some("Jane Doe"));
    }

    #[test]
    fn reserved_headers_rejected() {
        for name in ["From", "subject", "MIME-Version", "content-type"] {
            let result = MessageBuilder::new().header(name, "x");
            assert!(
                matches!(result, Err(Error::ReservedHeader(_))),
                "{name} should be reserved"
            );
        }
    }

    #[test]
    fn malformed_header_names_rejected() {
        for name in ["", "X Header", "X:Header", "Hëader"] {
            let result = MessageBuilder::new().header(name, "x");
            assert!(
                matches!(result, Err(Error::InvalidHeaderName(_))),
                "{name:?} should be invalid"
            );
        }
    }

    #[test]
    fn custom_header_accepted() {
        let message = MessageBuilder::new()
            .from("a@example.com")
            .unwrap()
            .to("b@example.com")
            .unwrap()
            .text_body("hi")
            .header("X-Mailer", "mailsend")
            .unwrap()
            .build()
            .unwrap();
        assert_eq!(
            message.headers,
            vec![("X-Mailer".to_string(), "mailsend".to_string())]
        );
    }

    #[test]
    fn subject_is_trimmed() {
        let message = MessageBuilder::new()
            .from("a@example.com")
            .unwrap()
            .to("b@example.com")
            .unwrap()
            .subject("  hello  ")
            .text_body("hi")
            .build()
            .unwrap();
        assert_eq!(message.subject.as_deref(), Some("hello"));
    }
}
