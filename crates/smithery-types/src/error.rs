//! Error hierarchy for smithery-rs.

use thiserror::Error;

use crate::util::redact;

/// Errors surfaced by the registry client and the session connector.
#[derive(Debug, Error)]
pub enum SmitheryError {
    /// A base URL, server URL or header value could not be parsed.
    #[error("invalid url: {0}")]
    Url(String),

    /// The connection config is not representable as JSON.
    #[error("failed to encode config: {0}")]
    Encode(String),

    #[error("http error {status} ({body})")]
    Http { status: u16, body: String },

    #[error("transport error: {0}")]
    Transport(String),

    #[error("protocol error: {0}")]
    Protocol(String),

    #[error("failed to decode response: {0}")]
    Decode(String),

    #[error("configuration error: {0}")]
    Config(String),
}

impl SmitheryError {
    /// Mask every occurrence of `secret` in this error's payload, keeping its kind.
    pub fn redact(self, secret: &str) -> Self {
        match self {
            Self::Url(msg) => Self::Url(redact(&msg, secret)),
            Self::Encode(msg) => Self::Encode(redact(&msg, secret)),
            Self::Http { status, body } => Self::Http {
                status,
                body: redact(&body, secret),
            },
            Self::Transport(msg) => Self::Transport(redact(&msg, secret)),
            Self::Protocol(msg) => Self::Protocol(redact(&msg, secret)),
            Self::Decode(msg) => Self::Decode(redact(&msg, secret)),
            Self::Config(msg) => Self::Config(redact(&msg, secret)),
        }
    }
}

impl From<serde_json::Error> for SmitheryError {
    fn from(e: serde_json::Error) -> Self {
        Self::Decode(e.to_string())
    }
}
