//! File attachments.

use std::fs;
use std::path::Path;

use crate::error::{Error, Result};

/// Fallback content type when nothing better is known.
const OCTET_STREAM: &str = "application/octet-stream";

/// A file attachment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attachment {
    /// File name presented to the recipient.
    pub filename: String,
    /// Raw file content.
    pub content: Vec<u8>,
    /// MIME content type (e.g. `application/pdf`).
    pub content_type: String,
}

impl Attachment {
    /// Reads an attachment from disk.
    ///
    /// The content type is guessed from the file extension when not
    /// given, falling back to `application/octet-stream`.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read.
    pub fn from_path(
        path: impl AsRef<Path>,
        filename: Option<&str>,
        content_type: Option<&str>,
    ) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read(path)?;
        let name = filename
            .map(ToString::to_string)
            .or_else(|| {
                path.file_name()
                    .map(|name| name.to_string_lossy().into_owned())
            })
            .ok_or(Error::MissingAttachmentFilename)?;
        let content_type = content_type
            .map_or_else(|| guess_content_type(&name).to_string(), ToString::to_string);

        Ok(Self {
            filename: name,
            content,
            content_type,
        })
    }

    /// Wraps raw bytes as an attachment.
    ///
    /// # Errors
    ///
    /// Returns an error if `filename` is empty.
    pub fn from_bytes(
        content: Vec<u8>,
        filename: impl Into<String>,
        content_type: Option<&str>,
    ) -> Result<Self> {
        let filename = filename.into();
        if filename.is_empty() {
            return Err(Error::MissingAttachmentFilename);
        }
        let content_type = content_type.map_or(OCTET_STREAM, |ct| ct).to_string();
        Ok(Self {
            filename,
            content,
            content_type,
        })
    }
}

/// Guesses a MIME content type from a file name's extension.
fn guess_content_type(filename: &str) -> &'static str {
    let extension = filename
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase());
    match extension.as_deref() {
        Some("txt") => "text/plain",
        Some("html" | "htm") => "text/html",
        Some("css") => "text/css",
        Some("csv") => "text/csv",
        Some("json") => "application/json",
        Some("xml") => "application/xml",
        Some("pdf") => "application/pdf",
        Some("zip") => "application/zip",
        Some("gz") => "application/gzip",
        Some("png") => "image/png",
        Some("jpg" | "jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("svg") => "image/svg+xml",
        Some("ics") => "text/calendar",
        Some("doc") => "application/msword",
        Some("docx") => {
            "application/vnd.openxmlformats-officedocument.wordprocessingml.document"
        }
        Some("xls") => "application/vnd.ms-excel",
        Some("xlsx") => "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
        _ => OCTET_STREAM,
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
    fn from_bytes_with_explicit_type() {
        let attachment =
            Attachment::from_bytes(vec![1, 2, 3], "report.bin", Some("application/x-custom"))
                .unwrap();
        assert_eq!(attachment.filename, "report.bin");
        assert_eq!(attachment.content_type, "application/x-custom");
    }

    #[test]
    fn from_bytes_defaults_to_octet_stream() {
        let attachment = Attachment::from_bytes(vec![], "blob", None).unwrap();
        assert_eq!(attachment.content_type, OCTET_STREAM);
    }

    #[test]
    fn from_bytes_requires_filename() {
        assert!(matches!(
            Attachment::from_bytes(vec![1], "", None),
            Err(Error::MissingAttachmentFilename)
        ));
    }

    #[test]
    fn from_path_reads_and_guesses_type() {
        let dir = std::env::temp_dir();
        let path = dir.join("mailsend_mime_attachment_test.csv");
        fs::write(&path, b"a,b\n1,2\n").unwrap();

        let attachment = Attachment::from_path(&path, None, None).unwrap();
        assert_eq!(attachment.filename, "mailsend_mime_attachment_test.csv");
        assert_eq!(attachment.content_type, "text/csv");
        assert_eq!(attachment.content, b"a,b\n1,2\n");

        fs::remove_file(&path).unwrap();
    }

    #[test]
    fn from_path_missing_file_is_io_error() {
        assert!(matches!(
            Attachment::from_path("/nonexistent/file.pdf", None, None),
            Err(Error::Io(_))
        ));
    }

    #[test]
    fn content_type_guessing() {
        assert_eq!(guess_content_type("a.PDF"), "application/pdf");
        assert_eq!(guess_content_type("a.jpeg"), "image/jpeg");
        assert_eq!(guess_content_type("archive.tar.gz"), "application/gzip");
        assert_eq!(guess_content_type("noext"), OCTET_STREAM);
        assert_eq!(guess_content_type("weird.xyz"), OCTET_STREAM);
    }
}
