//! # mailsend-mime
//!
//! Outbound RFC 5322 message construction for mailsend.
//!
//! This crate provides:
//! - **Address handling**: validation, `Name <addr>` parsing, dedup
//! - **Attachments**: from disk (MIME type guessed from the extension)
//!   or raw bytes
//! - **[`MessageBuilder`]**: from/to/cc/bcc, text and HTML bodies,
//!   attachments, extra headers
//! - **[`OutgoingMessage`]**: wire rendering with quoted-printable
//!   bodies, base64 attachments, and multipart structure
//!
//! ## Quick start
//!
//! ```
//! use mailsend_mime::MessageBuilder;
//!
//! let message = MessageBuilder::new()
//!     .from("sender@example.com")?
//!     .to("recipient@example.com")?
//!     .subject("Hello")
//!     .text_body("Plain text body")
//!     .build()?;
//!
//! let bytes = message.to_rfc5322();
//! assert!(bytes.starts_with(b"From: sender@example.com\r\n"));
//! # Ok::<(), mailsend_mime::Error>(())
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

mod address;
mod attachment;
mod builder;
pub mod encoding;
mod error;
mod message;

pub use address::{Address, Mailbox};
pub use attachment::Attachment;
pub use builder::MessageBuilder;
pub use error::{Error, Result};
pub use message::OutgoingMessage;
