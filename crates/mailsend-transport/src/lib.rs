//! # mailsend-transport
//!
//! HTTP mail transports for mailsend.
//!
//! Three ways to hand off an [`mailsend_mime::OutgoingMessage`]:
//! - [`GraphTransport`] - Microsoft Graph `sendMail` with a bearer token
//! - [`GmailTransport`] - Gmail API raw send (base64url RFC 5322 bytes)
//! - [`DryRunTransport`] - writes `.eml` files plus JSON metadata to a
//!   directory, no network
//!
//! Transports are dumb pipes: they receive an access token and a built
//! message, and never read or write credential storage.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

mod dry_run;
mod error;
mod gmail;
mod graph;

pub use dry_run::{DryRunReceipt, DryRunTransport};
pub use error::{Error, Result};
pub use gmail::GmailTransport;
pub use graph::GraphTransport;

use mailsend_mime::OutgoingMessage;
use serde::{Deserialize, Serialize};

/// Which sending backend to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Backend {
    /// Microsoft Graph `sendMail`.
    MsGraph,
    /// Gmail API raw send.
    GoogleApi,
    /// Local `.eml` capture, no network.
    DryRun,
}

impl Backend {
    /// Stable identifier used in config files.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::MsGraph => "ms_graph",
            Self::GoogleApi => "google_api",
            Self::DryRun => "dry_run",
        }
    }
}

impl std::fmt::Display for Backend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Backend {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "ms_graph" => Ok(Self::MsGraph),
            "google_api" => Ok(Self::GoogleApi),
            "dry_run" => Ok(Self::DryRun),
            other => Err(Error::UnknownBackend(other.to_string())),
        }
    }
}

/// A ready-to-use transport for one backend.
#[derive(Debug)]
pub enum Transport {
    /// Microsoft Graph.
    Graph(GraphTransport),
    /// Gmail API.
    Gmail(GmailTransport),
    /// Local dry-run capture.
    DryRun(DryRunTransport),
}

impl Transport {
    /// The backend this transport serves.
    #[must_use]
    pub const fn backend(&self) -> Backend {
        match self {
            Self::Graph(_) => Backend::MsGraph,
            Self::Gmail(_) => Backend::GoogleApi,
            Self::DryRun(_) => Backend::DryRun,
        }
    }

    /// Sends one message through this transport.
    ///
    /// # Errors
    ///
    /// Returns an error if the network call or local write fails.
    pub async fn send(&self, message: &OutgoingMessage) -> Result<()> {
        match self {
            Self::Graph(transport) => transport.send(message).await,
            Self::Gmail(transport) => transport.send(message).await,
            Self::DryRun(transport) => {
                transport.send(message)?;
                Ok(())
            }
        }
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
    fn backend_identifiers_round_trip() {
        for backend in [Backend::MsGraph, Backend::GoogleApi, Backend::DryRun] {
            let parsed: Backend = backend.as_str().parse().unwrap();
            assert_eq!(parsed, backend);
        }
    }

    #[test]
    fn unknown_backend_rejected() {
        let result: Result<Backend> = "smtp".parse();
        assert!(matches!(result, Err(Error::UnknownBackend(_))));
    }

    #[test]
    fn backend_serde_uses_snake_case() {
        assert_eq!(
            serde_json::to_string(&Backend::MsGraph).unwrap(),
            "\"ms_graph\""
        );
    }

    #[tokio::test]
    async fn transport_enum_dispatches_dry_run() {
        let dir = tempfile::TempDir::new().unwrap();
        let transport =
            Transport::DryRun(DryRunTransport::new(dir.path()).unwrap().with_metadata(false));
        assert_eq!(transport.backend(), Backend::DryRun);

        let message = mailsend_mime::MessageBuilder::new()
            .from("a@example.com")
            .unwrap()
            .to("b@example.com")
            .unwrap()
            .text_body("x")
            .build()
            .unwrap();
        transport.send(&message).await.unwrap();
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
    }
}
