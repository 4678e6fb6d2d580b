//! Session capabilities and the Streamable HTTP implementation.
//!
//! The connector only talks to [`SessionOpener`] and [`McpSession`], so the
//! concrete protocol engine can be swapped without touching URL building or
//! secret handling.

use std::future::Future;
use std::pin::Pin;

use serde_json::{Map, Value};
use url::Url;

use crate::error::McpError;
use crate::protocol::{
    CallToolResult, Implementation, InitializeResult, LATEST_PROTOCOL_VERSION, ListToolsParams,
    ListToolsResult, SUPPORTED_PROTOCOL_VERSIONS,
};
use crate::transport::StreamableHttpTransport;

/// A boxed, sendable future borrowed from its receiver.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Opens a transport to an MCP endpoint and completes the handshake.
///
/// Dyn-compatible so the client can hold an `Arc<dyn SessionOpener>`.
pub trait SessionOpener: Send + Sync {
    fn open<'a>(
        &'a self,
        url: &'a Url,
        client_info: &'a Implementation,
    ) -> BoxFuture<'a, Result<Box<dyn McpSession>, McpError>>;
}

/// A live, initialized MCP session.
pub trait McpSession: Send + Sync {
    /// The server's handshake acknowledgment.
    fn initialize_result(&self) -> &InitializeResult;

    fn list_tools(&self, params: ListToolsParams) -> BoxFuture<'_, Result<ListToolsResult, McpError>>;

    fn call_tool<'a>(
        &'a self,
        name: &'a str,
        arguments: Map<String, Value>,
    ) -> BoxFuture<'a, Result<CallToolResult, McpError>>;

    /// Release the connection. Later calls must fail rather than hang.
    fn close(&self) -> BoxFuture<'_, Result<(), McpError>>;
}

/// Opens [`HttpSession`]s on a shared HTTP client.
#[derive(Clone)]
pub struct StreamableHttpOpener {
    http: reqwest::Client,
}

impl StreamableHttpOpener {
    pub fn new(http: reqwest::Client) -> Self {
        Self { http }
    }
}

impl SessionOpener for StreamableHttpOpener {
    fn open<'a>(
        &'a self,
        url: &'a Url,
        client_info: &'a Implementation,
    ) -> BoxFuture<'a, Result<Box<dyn McpSession>, McpError>> {
        Box::pin(async move {
            let session = HttpSession::connect(self.http.clone(), url.clone(), client_info).await?;
            Ok(Box::new(session) as Box<dyn McpSession>)
        })
    }
}

/// MCP session over Streamable HTTP.
pub struct HttpSession {
    transport: StreamableHttpTransport,
    initialize_result: InitializeResult,
}

impl HttpSession {
    /// Send `initialize`, check the negotiated revision, then send
    /// `notifications/initialized`.
    pub async fn connect(
        http: reqwest::Client,
        url: Url,
        client_info: &Implementation,
    ) -> Result<Self, McpError> {
        let transport = StreamableHttpTransport::new(http, url);
        match handshake(&transport, client_info).await {
            Ok(initialize_result) => Ok(Self {
                transport,
                initialize_result,
            }),
            Err(e) => {
                // The server may already hold a session for us
                if let Err(close_err) = transport.close().await {
                    tracing::debug!("closing half-open MCP session failed: {close_err}");
                }
                Err(e)
            }
        }
    }
}

async fn handshake(
    transport: &StreamableHttpTransport,
    client_info: &Implementation,
) -> Result<InitializeResult, McpError> {
    let params = serde_json::json!({
        "protocolVersion": LATEST_PROTOCOL_VERSION,
        "capabilities": {},
        "clientInfo": client_info,
    });
    let result = transport.request("initialize", Some(params)).await?;
    let init: InitializeResult = serde_json::from_value(result)
        .map_err(|e| McpError::Protocol(format!("Failed to parse initialize result: {e}")))?;

    if !SUPPORTED_PROTOCOL_VERSIONS.contains(&init.protocol_version.as_str()) {
        return Err(McpError::Protocol(format!(
            "server negotiated unsupported protocol version {}",
            init.protocol_version
        )));
    }
    transport.set_protocol_version(init.protocol_version.clone());

    transport
        .notify("notifications/initialized", None)
        .await?;

    tracing::debug!(
        "MCP handshake complete with '{}' (protocol {})",
        init.server_info.name,
        init.protocol_version
    );
    Ok(init)
}

impl McpSession for HttpSession {
    fn initialize_result(&self) -> &InitializeResult {
        &self.initialize_result
    }

    fn list_tools(&self, params: ListToolsParams) -> BoxFuture<'_, Result<ListToolsResult, McpError>> {
        Box::pin(async move {
            let params = serde_json::to_value(params)?;
            let result = self.transport.request("tools/list", Some(params)).await?;
            serde_json::from_value(result).map_err(|e| {
                McpError::Protocol(format!("Failed to parse tools/list response: {e}"))
            })
        })
    }

    fn call_tool<'a>(
        &'a self,
        name: &'a str,
        arguments: Map<String, Value>,
    ) -> BoxFuture<'a, Result<CallToolResult, McpError>> {
        Box::pin(async move {
            let params = serde_json::json!({
                "name": name,
                "arguments": arguments,
            });
            let result = self.transport.request("tools/call", Some(params)).await?;
            serde_json::from_value(result)
                .map_err(|e| McpError::Protocol(format!("Failed to parse tools/call result: {e}")))
        })
    }

    fn close(&self) -> BoxFuture<'_, Result<(), McpError>> {
        Box::pin(self.transport.close())
    }
}
