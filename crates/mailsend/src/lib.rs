//! # mailsend
//!
//! A small mail-sending toolkit: device-code OAuth against Microsoft
//! and Google, encrypted-at-rest credential storage, message building,
//! and HTTP transports (Microsoft Graph, Gmail API, local dry-run).
//!
//! [`EmailClient`] is the facade tying the pieces together:
//!
//! ```ignore
//! use mailsend::{Backend, EmailClient, KeyPolicy, MessageBuilder, MsGraphConfig};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let mut client = EmailClient::new()?
//!         .ms_graph(MsGraphConfig::new("me@example.com").with_client_id("app-id"))
//!         .backend(Backend::MsGraph);
//!
//!     // One-time interactive authorization; the token lands in the
//!     // encrypted config store.
//!     client
//!         .authorize(mailsend::ProviderKind::MsGraph, |auth| {
//!             println!("Visit {} and enter {}", auth.verification_uri, auth.user_code);
//!         })
//!         .await?;
//!
//!     let message = MessageBuilder::new()
//!         .from("me@example.com")?
//!         .to("you@example.com")?
//!         .subject("Hello")
//!         .text_body("Sent via Graph")
//!         .build()?;
//!     client.send(&message).await?;
//!     Ok(())
//! }
//! ```
//!
//! The individual layers are usable on their own through the
//! re-exported crates: [`mailsend_core`] (credential models + secure
//! store), [`mailsend_oauth`] (device flow), [`mailsend_mime`]
//! (message building), [`mailsend_transport`] (delivery).

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

mod client;

pub use client::EmailClient;

pub use mailsend_core::{
    Authority, CredentialConfig, GoogleApiConfig, KeyPolicy, MsGraphConfig, ProviderKind,
    SecureConfig, TokenRecord,
};
pub use mailsend_mime::{Attachment, MessageBuilder, OutgoingMessage};
pub use mailsend_oauth::flow::DeviceAuthorization;
pub use mailsend_transport::Backend;
