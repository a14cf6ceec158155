//! Dry-run transport.
//!
//! Records messages to disk instead of sending them: a `.eml` file with
//! the full MIME message and, optionally, a JSON metadata sidecar. No
//! network calls, no message mutation.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{SecondsFormat, Utc};
use mailsend_mime::{Mailbox, OutgoingMessage};
use serde_json::json;
use tracing::info;

use crate::error::Result;

/// Where a dry-run send landed on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DryRunReceipt {
    /// Path of the written `.eml` file.
    pub eml_path: PathBuf,
    /// Path of the metadata sidecar, when enabled.
    pub metadata_path: Option<PathBuf>,
}

/// A no-op transport that captures messages to a directory.
#[derive(Debug)]
pub struct DryRunTransport {
    out_dir: PathBuf,
    write_metadata: bool,
}

impl DryRunTransport {
    /// Creates the transport, creating `out_dir` if needed.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created.
    pub fn new(out_dir: impl Into<PathBuf>) -> Result<Self> {
        let out_dir = out_dir.into();
        fs::create_dir_all(&out_dir)?;
        Ok(Self {
            out_dir,
            write_metadata: true,
        })
    }

    /// Disables or enables the JSON metadata sidecar.
    #[must_use]
    pub const fn with_metadata(mut self, write_metadata: bool) -> Self {
        self.write_metadata = write_metadata;
        self
    }

    /// Writes the message to disk and returns where it landed.
    ///
    /// # Errors
    ///
    /// Returns an error if a file write fails.
    pub fn send(&self, message: &OutgoingMessage) -> Result<DryRunReceipt> {
        let timestamp = Utc::now();
        let stem = format!(
            "{}_{:016x}",
            timestamp.format("%Y-%m-%dT%H-%M-%S"),
            rand::random::<u64>()
        );

        let eml_path = self.out_dir.join(format!("{stem}.eml"));
        fs::write(&eml_path, message.to_rfc5322())?;

        let metadata_path = if self.write_metadata {
            let path = self.out_dir.join(format!("{stem}.json"));
            let metadata = json!({
                "backend": "dry_run",
                "timestamp": timestamp.to_rfc3339_opts(SecondsFormat::Secs, true),
                "from": message.from.to_header_value(),
                "to": address_list(&message.to),
                "cc": address_list(&message.cc),
                "bcc": address_list(&message.bcc),
                "subject": message.subject,
                "attachment_count": message.attachments.len(),
                "attachments": message.attachments.iter().map(|attachment| {
                    json!({
                        "filename": attachment.filename,
                        "content_type": attachment.content_type,
                        "size": attachment.content.len(),
                    })
                }).collect::<Vec<_>>(),
            });
            fs::write(&path, serde_json::to_vec_pretty(&metadata)?)?;
            Some(path)
        } else {
            None
        };

        info!(
            "DRY RUN: wrote email to {} (to={:?}, subject={:?})",
            eml_path.display(),
            address_list(&message.to),
            message.subject
        );

        Ok(DryRunReceipt {
            eml_path,
            metadata_path,
        })
    }

    /// The directory messages are captured into.
    #[must_use]
    pub fn out_dir(&self) -> &Path {
        &self.out_dir
    }
}

fn address_list(mailboxes: &[Mailbox]) -> Vec<String> {
    mailboxes
        .iter()
        .map(|mailbox| mailbox.address.as_str().to_string())
        .collect()
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
    use tempfile::TempDir;

    fn message() -> OutgoingMessage {
        MessageBuilder::new()
            .from("sender@example.com")
            .unwrap()
            .to("to@example.com")
            .unwrap()
            .cc("cc@example.com")
            .unwrap()
            .subject("Dry run")
            .text_body("body")
            .attachment(Attachment::from_bytes(vec![0u8; 64], "data.bin", None).unwrap())
            .build()
            .unwrap()
    }

    #[test]
    fn writes_eml_and_metadata() {
        let dir = TempDir::new().unwrap();
        let transport = DryRunTransport::new(dir.path().join("out")).unwrap();

        let receipt = transport.send(&message()).unwrap();
        assert!(receipt.eml_path.exists());
        let metadata_path = receipt.metadata_path.unwrap();
        assert!(metadata_path.exists());

        let eml = fs::read_to_string(&receipt.eml_path).unwrap();
        assert!(eml.starts_with("From: sender@example.com\r\n"));

        let metadata: serde_json::Value =
            serde_json::from_slice(&fs::read(&metadata_path).unwrap()).unwrap();
        assert_eq!(metadata["backend"], "dry_run");
        assert_eq!(metadata["to"][0], "to@example.com");
        assert_eq!(metadata["cc"][0], "cc@example.com");
        assert_eq!(metadata["subject"], "Dry run");
        assert_eq!(metadata["attachment_count"], 1);
        assert_eq!(metadata["attachments"][0]["filename"], "data.bin");
        assert_eq!(metadata["attachments"][0]["size"], 64);
    }

    #[test]
    fn metadata_can_be_disabled() {
        let dir = TempDir::new().unwrap();
        let transport = DryRunTransport::new(dir.path()).unwrap().with_metadata(false);

        let receipt = transport.send(&message()).unwrap();
        assert!(receipt.eml_path.exists());
        assert!(receipt.metadata_path.is_none());
        let json_files: Vec<_> = fs::read_dir(dir.path())
            .unwrap()
            .filter(|entry| {
                entry.as_ref().unwrap().path().extension().is_some_and(|e| e == "json")
            })
            .collect();
        assert!(json_files.is_empty());
    }

    #[test]
    fn repeated_sends_get_distinct_files() {
        let dir = TempDir::new().unwrap();
        let transport = DryRunTransport::new(dir.path()).unwrap();
        let msg = message();

        let first = transport.send(&msg).unwrap();
        let second = transport.send(&msg).unwrap();
        assert_ne!(first.eml_path, second.eml_path);
    }

    #[test]
    fn creates_missing_out_dir() {
        let dir = TempDir::new().unwrap();
        let nested = dir.path().join("a").join("b");
        let transport = DryRunTransport::new(&nested).unwrap();
        assert!(nested.exists());
        assert_eq!(transport.out_dir(), nested.as_path());
    }
}
