//! Outgoing message model and wire rendering.

use std::fmt::Write as _;
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{DateTime, Utc};

use crate::address::Mailbox;
use crate::attachment::Attachment;
use crate::encoding::{encode_base64_wrapped, encode_header_value, encode_quoted_printable};

/// Monotonic counter keeping multipart boundaries unique per process.
static BOUNDARY_COUNTER: AtomicU64 = AtomicU64::new(0);

/// A fully built outgoing email message.
///
/// Produced by [`crate::MessageBuilder`]; transports either read the
/// structured fields (Graph) or render the whole message with
/// [`to_rfc5322`](Self::to_rfc5322) (Gmail raw send, dry-run `.eml`
/// files).
#[derive(Debug, Clone)]
pub struct OutgoingMessage {
    /// Sender mailbox.
    pub from: Mailbox,
    /// To recipients.
    pub to: Vec<Mailbox>,
    /// Cc recipients.
    pub cc: Vec<Mailbox>,
    /// Bcc recipients.
    pub bcc: Vec<Mailbox>,
    /// Subject line.
    pub subject: Option<String>,
    /// Plain text body.
    pub text_body: Option<String>,
    /// HTML body.
    pub html_body: Option<String>,
    /// File attachments.
    pub attachments: Vec<Attachment>,
    /// Extra headers beyond the builder-managed set.
    pub headers: Vec<(String, String)>,
    /// Date header value.
    pub date: DateTime<Utc>,
}

impl OutgoingMessage {
    /// All recipients across To, Cc, and Bcc.
    pub fn recipients(&self) -> impl Iterator<Item = &Mailbox> {
        self.to.iter().chain(self.cc.iter()).chain(self.bcc.iter())
    }

    /// Renders the message as RFC 5322 bytes with CRLF line endings.
    ///
    /// Text bodies are quoted-printable encoded, attachments base64
    /// encoded; text+HTML becomes `multipart/alternative`, attachments
    /// wrap everything in `multipart/mixed`.
    #[must_use]
    pub fn to_rfc5322(&self) -> Vec<u8> {
        let mut out = String::new();

        let _ = write!(out, "From: {}\r\n", self.from.to_header_value());
        Self::write_address_header(&mut out, "To", &self.to);
        Self::write_address_header(&mut out, "Cc", &self.cc);
        Self::write_address_header(&mut out, "Bcc", &self.bcc);
        if let Some(subject) = &self.subject {
            let _ = write!(out, "Subject: {}\r\n", encode_header_value(subject));
        }
        let _ = write!(out, "Date: {}\r\n", self.date.to_rfc2822());
        for (name, value) in &self.headers {
            let _ = write!(out, "{name}: {value}\r\n");
        }
        out.push_str("MIME-Version: 1.0\r\n");

        if self.attachments.is_empty() {
            self.write_body(&mut out);
        } else {
            self.write_mixed(&mut out);
        }

        out.into_bytes()
    }

    fn write_address_header(out: &mut String, name: &str, mailboxes: &[Mailbox]) {
        if mailboxes.is_empty() {
            return;
        }
        let joined = mailboxes
            .iter()
            .map(Mailbox::to_header_value)
            .collect::<Vec<_>>()
            .join(", ");
        let _ = write!(out, "{name}: {joined}\r\n");
    }

    /// Writes the body without attachments: a single part, or
    /// `multipart/alternative` when both text and HTML are present.
    fn write_body(&self, out: &mut String) {
        match (&self.text_body, &self.html_body) {
            (Some(text), None) => Self::write_text_part(out, "text/plain", text),
            (None, Some(html)) => Self::write_text_part(out, "text/html", html),
            (Some(text), Some(html)) => {
                let boundary = next_boundary();
                let _ = write!(
                    out,
                    "Content-Type: multipart/alternative; boundary=\"{boundary}\"\r\n\r\n"
                );
                let _ = write!(out, "--{boundary}\r\n");
                Self::write_text_part(out, "text/plain", text);
                let _ = write!(out, "--{boundary}\r\n");
                Self::write_text_part(out, "text/html", html);
                let _ = write!(out, "--{boundary}--\r\n");
            }
            // Attachment-only messages get an empty text part so every
            // message has a body section.
            (None, None) => Self::write_text_part(out, "text/plain", ""),
        }
    }

    /// Writes a `multipart/mixed` body: the text/HTML section followed
    /// by each attachment.
    fn write_mixed(&self, out: &mut String) {
        let boundary = next_boundary();
        let _ = write!(
            out,
            "Content-Type: multipart/mixed; boundary=\"{boundary}\"\r\n\r\n"
        );

        let _ = write!(out, "--{boundary}\r\n");
        self.write_body(out);

        for attachment in &self.attachments {
            let _ = write!(out, "--{boundary}\r\n");
            let _ = write!(
                out,
                "Content-Type: {}; name=\"{}\"\r\n",
                attachment.content_type, attachment.filename
            );
            out.push_str("Content-Transfer-Encoding: base64\r\n");
            let _ = write!(
                out,
                "Content-Disposition: attachment; filename=\"{}\"\r\n\r\n",
                attachment.filename
            );
            out.push_str(&encode_base64_wrapped(&attachment.content));
        }
        let _ = write!(out, "--{boundary}--\r\n");
    }

    fn write_text_part(out: &mut String, content_type: &str, body: &str) {
        let _ = write!(out, "Content-Type: {content_type}; charset=utf-8\r\n");
        out.push_str("Content-Transfer-Encoding: quoted-printable\r\n\r\n");
        out.push_str(&encode_quoted_printable(body));
        out.push_str("\r\n");
    }
}

fn next_boundary() -> String {
    format!(
        "=_mailsend_{:08x}",
        BOUNDARY_COUNTER.fetch_add(1, Ordering::Relaxed)
    )
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
    use crate::builder::MessageBuilder;
    use chrono::TimeZone;

    fn rendered(message: &OutgoingMessage) -> String {
        String::from_utf8(message.to_rfc5322()).unwrap()
    }

    fn base() -> MessageBuilder {
        MessageBuilder::new()
            .from("Sender <sender@example.com>")
            .unwrap()
            .to("recipient@example.com")
            .unwrap()
            .date(Utc.with_ymd_and_hms(2026, 2, 3, 4, 5, 6).unwrap())
    }

    #[test]
    fn simple_text_message_layout() {
        let message = base()
            .subject("Hello")
            .text_body("Plain body")
            .build()
            .unwrap();
        let text = rendered(&message);

        assert!(text.starts_with("From: Sender <sender@example.com>\r\n"));
        assert!(text.contains("To: recipient@example.com\r\n"));
        assert!(text.contains("Subject: Hello\r\n"));
        assert!(text.contains("Date: Tue, 3 Feb 2026 04:05:06 +0000\r\n"));
        assert!(text.contains("MIME-Version: 1.0\r\n"));
        assert!(text.contains("Content-Type: text/plain; charset=utf-8\r\n"));
        assert!(text.contains("Content-Transfer-Encoding: quoted-printable\r\n"));
        assert!(text.contains("Plain body"));
        assert!(!text.contains("multipart"));
    }

    #[test]
    fn all_lines_are_crlf_terminated() {
        let message = base().text_body("line1\nline2").build().unwrap();
        let text = rendered(&message);
        assert!(!text.replace("\r\n", "").contains('\r'));
    }

    #[test]
    fn non_ascii_subject_is_rfc2047_encoded() {
        let message = base().subject("Grüße").text_body("x").build().unwrap();
        let text = rendered(&message);
        assert!(text.contains("Subject: =?UTF-8?B?"));
    }

    #[test]
    fn non_ascii_body_is_quoted_printable() {
        let message = base().text_body("héllo").build().unwrap();
        let text = rendered(&message);
        assert!(text.contains("h=C3=A9llo"));
    }

    #[test]
    fn text_and_html_become_alternative() {
        let message = base()
            .text_body("plain")
            .html_body("<b>rich</b>")
            .build()
            .unwrap();
        let text = rendered(&message);

        assert!(text.contains("Content-Type: multipart/alternative; boundary="));
        assert!(text.contains("Content-Type: text/plain; charset=utf-8"));
        assert!(text.contains("Content-Type: text/html; charset=utf-8"));
        assert!(text.contains("plain"));
        assert!(text.contains("<b>rich</b>"));

        // Text part comes before the HTML part.
        let plain_at = text.find("Content-Type: text/plain").unwrap();
        let html_at = text.find("Content-Type: text/html").unwrap();
        assert!(plain_at < html_at);
    }

    #[test]
    fn attachments_wrap_in_mixed() {
        let message = base()
            .text_body("see attached")
            .attachment(
                Attachment::from_bytes(b"%PDF-1.4 fake".to_vec(), "invoice.pdf", None).unwrap(),
            )
            .build()
            .unwrap();
        let text = rendered(&message);

        assert!(text.contains("Content-Type: multipart/mixed; boundary="));
        assert!(text.contains("Content-Type: application/pdf; name=\"invoice.pdf\""));
        assert!(text.contains("Content-Disposition: attachment; filename=\"invoice.pdf\""));
        assert!(text.contains("Content-Transfer-Encoding: base64"));
        assert!(text.contains(&crate::encoding::encode_base64(b"%PDF-1.4 fake")));
        assert!(text.trim_end().ends_with("--"));
    }

    #[test]
    fn attachment_only_message_has_empty_text_part() {
        let message = base()
            .attachment(Attachment::from_bytes(vec![1, 2], "data.bin", None).unwrap())
            .build()
            .unwrap();
        let text = rendered(&message);
        assert!(text.contains("Content-Type: multipart/mixed"));
        assert!(text.contains("Content-Type: text/plain; charset=utf-8"));
    }

    #[test]
    fn boundaries_are_unique_across_messages() {
        let first = base().text_body("a").html_body("b").build().unwrap();
        let second = base().text_body("a").html_body("b").build().unwrap();

        let boundary_of = |text: &str| {
            let start = text.find("boundary=\"").unwrap() + "boundary=\"".len();
            let end = text[start..].find('"').unwrap();
            text[start..start + end].to_string()
        };
        assert_ne!(
            boundary_of(&rendered(&first)),
            boundary_of(&rendered(&second))
        );
    }

    #[test]
    fn bcc_header_is_rendered_for_raw_transports() {
        let message = base()
            .bcc("hidden@example.com")
            .unwrap()
            .text_body("x")
            .build()
            .unwrap();
        assert!(rendered(&message).contains("Bcc: hidden@example.com\r\n"));
    }

    #[test]
    fn recipients_iterates_all_lists() {
        let message = base()
            .cc("c@example.com")
            .unwrap()
            .bcc("b@example.com")
            .unwrap()
            .text_body("x")
            .build()
            .unwrap();
        let addresses: Vec<&str> = message
            .recipients()
            .map(|m| m.address.as_str())
            .collect();
        assert_eq!(
            addresses,
            vec!["recipient@example.com", "c@example.com", "b@example.com"]
        );
    }

    #[test]
    fn extra_headers_are_rendered() {
        let message = base()
            .text_body("x")
            .header("X-Mailer", "mailsend")
            .unwrap()
            .build()
            .unwrap();
        assert!(rendered(&message).contains("X-Mailer: mailsend\r\n"));
    }
}
