//! Smithery client: registry queries and token-safe MCP session establishment.
//!
//! [`Client`] holds the API token. Registry lookups send it as a bearer
//! header; MCP connections carry it in the endpoint's query string. Every
//! error leaving this crate has the token masked.

mod client;
mod connector;
mod session;

pub use client::{CLIENT_NAME, Client, DEFAULT_SERVER_HOST, client_info};
pub use session::Session;

pub use smithery_api::{DEFAULT_REGISTRY_URL, ListServersOptions};
pub use smithery_mcp::{
    BoxFuture, CallToolResult, Implementation, InitializeResult, ListToolsParams, ListToolsResult,
    McpError, McpSession, SessionOpener, Tool, ToolContent,
};
pub use smithery_types::{
    ConnectionInfo, ConnectionType, Pagination, ServerDetail, ServerSummary, ServersPage,
    SmitheryError, redact,
};
