//! Error types for MCP session operations.

use smithery_types::SmitheryError;
use thiserror::Error;

/// Errors from an MCP session.
///
/// Transport errors never carry the endpoint URL. Other messages may echo
/// server-supplied text, so callers holding a secret still redact.
#[derive(Debug, Error)]
pub enum McpError {
    #[error("MCP transport error: {0}")]
    Transport(String),

    #[error("http error {status} ({body})")]
    Http { status: u16, body: String },

    #[error("JSON-RPC error (code {code}): {message}")]
    JsonRpc { code: i64, message: String },

    #[error("MCP protocol error: {0}")]
    Protocol(String),

    #[error("MCP session is closed")]
    Closed,

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl From<reqwest::Error> for McpError {
    fn from(e: reqwest::Error) -> Self {
        // The URL carries the API token in its query
        Self::Transport(e.without_url().to_string())
    }
}

impl From<McpError> for SmitheryError {
    fn from(e: McpError) -> Self {
        match e {
            McpError::Transport(msg) => SmitheryError::Transport(msg),
            McpError::Http { status, body } => SmitheryError::Http { status, body },
            other => SmitheryError::Protocol(other.to_string()),
        }
    }
}
