//! Error types for mail transports.

/// Result type alias for transport operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Transport error types.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// HTTP request error.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Provider API rejected the send.
    #[error("API error: status {status}: {body}")]
    Api {
        /// HTTP status code returned.
        status: u16,
        /// Response body, for diagnostics.
        body: String,
    },

    /// JSON encoding error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Local file write failed (dry-run).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Backend string did not match any known backend.
    #[error("Unknown backend: {0}")]
    UnknownBackend(String),
}
