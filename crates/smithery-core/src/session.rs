//! An established MCP session whose errors never carry the API token.

use std::collections::HashSet;

use serde_json::{Map, Value};
use smithery_mcp::{
    CallToolResult, InitializeResult, ListToolsParams, ListToolsResult, McpError, McpSession, Tool,
};
use smithery_types::{REDACTION_MASK, SmitheryError};

/// A live session returned by [`Client::connect_with_profile`] or
/// [`Client::connect_manually`].
///
/// Callers own the session and should [`close`](Session::close) it when done.
///
/// [`Client::connect_with_profile`]: crate::Client::connect_with_profile
/// [`Client::connect_manually`]: crate::Client::connect_manually
pub struct Session {
    inner: Box<dyn McpSession>,
    api_key: String,
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("server", &self.inner.initialize_result().server_info.name)
            .field("api_key", &REDACTION_MASK)
            .finish_non_exhaustive()
    }
}

impl Session {
    pub(crate) fn new(inner: Box<dyn McpSession>, api_key: impl Into<String>) -> Self {
        Self {
            inner,
            api_key: api_key.into(),
        }
    }

    pub fn initialize_result(&self) -> &InitializeResult {
        self.inner.initialize_result()
    }

    /// Fetch one page of the server's tools.
    pub async fn list_tools(
        &self,
        params: ListToolsParams,
    ) -> Result<ListToolsResult, SmitheryError> {
        self.inner
            .list_tools(params)
            .await
            .map_err(|e| self.scrub(e))
    }

    /// Fetch every tool, following `nextCursor` until the server stops
    /// returning one or hands back a cursor it already served.
    pub async fn list_all_tools(&self) -> Result<Vec<Tool>, SmitheryError> {
        let mut tools = Vec::new();
        let mut seen = HashSet::new();
        let mut cursor: Option<String> = None;
        loop {
            let page = self
                .list_tools(ListToolsParams {
                    cursor: cursor.clone(),
                })
                .await?;
            tools.extend(page.tools);
            match page.next_cursor {
                Some(next) if seen.insert(next.clone()) => cursor = Some(next),
                Some(next) => {
                    tracing::warn!("server repeated tools/list cursor {next}; stopping");
                    break;
                }
                None => break,
            }
        }
        Ok(tools)
    }

    /// Invoke a tool by name.
    pub async fn call_tool(
        &self,
        name: &str,
        arguments: Map<String, Value>,
    ) -> Result<CallToolResult, SmitheryError> {
        self.inner
            .call_tool(name, arguments)
            .await
            .map_err(|e| self.scrub(e))
    }

    /// Release the session. Closing twice is harmless; other calls fail
    /// after close.
    pub async fn close(&self) -> Result<(), SmitheryError> {
        self.inner.close().await.map_err(|e| self.scrub(e))
    }

    fn scrub(&self, err: McpError) -> SmitheryError {
        SmitheryError::from(err).redact(&self.api_key)
    }
}
