//! MCP (Model Context Protocol) session collaborator for smithery-rs.
//!
//! Provides the capability traits the connector is written against
//! ([`SessionOpener`], [`McpSession`]) and one implementation of them over
//! Streamable HTTP: JSON-RPC 2.0 messages POSTed to the endpoint, replies as
//! JSON or as an SSE stream.

pub mod error;
pub mod jsonrpc;
pub mod protocol;
pub mod session;
mod sse;
mod transport;

pub use error::McpError;
pub use protocol::{
    CallToolResult, Implementation, InitializeResult, LATEST_PROTOCOL_VERSION, ListToolsParams,
    ListToolsResult, Tool, ToolContent,
};
pub use session::{BoxFuture, HttpSession, McpSession, SessionOpener, StreamableHttpOpener};
