//! Error types for message construction.

/// Result type alias for message construction.
pub type Result<T> = std::result::Result<T, Error>;

/// Message construction error types.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Invalid email address.
    #[error("Invalid email address: {0}")]
    InvalidAddress(String),

    /// From address missing at build time.
    #[error("From address must be set before building a message")]
    MissingFrom,

    /// No recipient in To, Cc, or Bcc.
    #[error("At least one recipient (To, Cc, or Bcc) is required")]
    NoRecipients,

    /// Neither a body nor an attachment was provided.
    #[error("Message content is empty: provide a text or HTML body, or an attachment")]
    EmptyContent,

    /// Header is managed by the builder and cannot be set manually.
    #[error("Header '{0}' is managed by the builder and cannot be set manually")]
    ReservedHeader(String),

    /// Header name is empty or contains illegal characters.
    #[error("Invalid header name: {0:?}")]
    InvalidHeaderName(String),

    /// Attachment filename missing for raw bytes.
    #[error("Attachment filename is required when providing raw bytes")]
    MissingAttachmentFilename,

    /// Attachment file could not be read.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
