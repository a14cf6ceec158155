//! # mailsend-oauth
//!
//! Device-code `OAuth2` flows (RFC 8628) for mail-sending APIs.
//!
//! Device flow suits CLI tools and headless hosts: the library hands
//! back a user code and verification URI for the caller to display,
//! then polls the token endpoint until the user approves on another
//! device. Nothing here persists tokens; the resulting access token is
//! returned to the caller, which stores it however it sees fit (in
//! mailsend, inside an encrypted credential config).
//!
//! ## Quick start
//!
//! ```ignore
//! use mailsend_oauth::{DeviceFlow, OAuthClient, Provider};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let provider = Provider::microsoft("organizations")?;
//!     let client = OAuthClient::new("your_client_id", provider);
//!     let flow = DeviceFlow::new(client);
//!
//!     let auth = flow.request_device_authorization(None).await?;
//!     println!("Visit: {}", auth.verification_uri);
//!     println!("Enter code: {}", auth.user_code);
//!
//!     let (_, token) = flow.authorize(None, 120).await?;
//!     println!("Authorized as bearer of {} token", token.token_type);
//!     Ok(())
//! }
//! ```
//!
//! ## Provider support
//!
//! - **Microsoft** - Graph `Mail.Send` scope, tenant-aware endpoints
//! - **Google** - Gmail `gmail.send` scope (client secret required at
//!   the token endpoint for installed apps)
//! - **Custom** - any `OAuth2` provider with a device endpoint

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

mod error;
pub mod flow;
pub mod provider;
pub mod token;

pub use error::{Error, Result};
pub use flow::{DeviceFlow, OAuthClient};
pub use provider::Provider;
pub use token::Token;
