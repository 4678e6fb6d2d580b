//! Streamable HTTP transport for MCP sessions.
//!
//! Every JSON-RPC message is POSTed to the endpoint URL. The server answers
//! with a JSON body, an SSE stream carrying the response, or `202 Accepted`
//! for notifications. The session id the server hands out on `initialize` is
//! echoed on every later request and used to terminate the session on close.

use std::sync::OnceLock;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use reqwest::StatusCode;
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use tokio::sync::Mutex;
use url::Url;

use crate::error::McpError;
use crate::jsonrpc::{JsonRpcNotification, JsonRpcRequest, JsonRpcResponse};
use crate::sse::SseParser;

const SESSION_ID_HEADER: &str = "mcp-session-id";
const PROTOCOL_VERSION_HEADER: &str = "mcp-protocol-version";
const ACCEPT_JSON_OR_SSE: &str = "application/json, text/event-stream";

/// One logical MCP connection over HTTP.
pub struct StreamableHttpTransport {
    http: reqwest::Client,
    url: Url,
    next_id: AtomicU64,
    session_id: Mutex<Option<String>>,
    protocol_version: OnceLock<String>,
    closed: AtomicBool,
}

impl StreamableHttpTransport {
    /// Bind a transport to `url`. Nothing is sent until the first request.
    pub fn new(http: reqwest::Client, url: Url) -> Self {
        Self {
            http,
            url,
            next_id: AtomicU64::new(1),
            session_id: Mutex::new(None),
            protocol_version: OnceLock::new(),
            closed: AtomicBool::new(false),
        }
    }

    /// The session id assigned by the server, once `initialize` succeeded.
    pub async fn session_id(&self) -> Option<String> {
        self.session_id.lock().await.clone()
    }

    /// Record the negotiated revision; sent as a header on every later request.
    pub fn set_protocol_version(&self, version: impl Into<String>) {
        let _ = self.protocol_version.set(version.into());
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    /// Send a JSON-RPC request and wait for its response payload.
    pub async fn request(
        &self,
        method: &str,
        params: Option<serde_json::Value>,
    ) -> Result<serde_json::Value, McpError> {
        self.ensure_open()?;
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let response = self.post(&JsonRpcRequest::new(id, method, params)).await?;

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("")
            .to_ascii_lowercase();

        let message = if content_type.starts_with("text/event-stream") {
            read_event_stream_reply(response, id).await?
        } else {
            let body = response.bytes().await?;
            let message: JsonRpcResponse = serde_json::from_slice(&body).map_err(|e| {
                McpError::Protocol(format!("invalid JSON-RPC reply to {method}: {e}"))
            })?;
            if !message.answers(id) {
                return Err(McpError::Protocol(format!(
                    "reply to {method} does not match request id {id}"
                )));
            }
            message
        };

        message.into_result()
    }

    /// Send a JSON-RPC notification; the server acknowledges without a body.
    pub async fn notify(
        &self,
        method: &str,
        params: Option<serde_json::Value>,
    ) -> Result<(), McpError> {
        self.ensure_open()?;
        self.post(&JsonRpcNotification::new(method, params)).await?;
        Ok(())
    }

    /// Mark the transport closed and terminate the server-side session.
    ///
    /// Closing twice is a no-op. Servers that do not support explicit
    /// termination (405) or already forgot the session (404) are fine.
    pub async fn close(&self) -> Result<(), McpError> {
        if self.closed.swap(true, Ordering::SeqCst) {
            return Ok(());
        }
        let Some(session_id) = self.session_id.lock().await.take() else {
            return Ok(());
        };

        let status = self
            .http
            .delete(self.url.clone())
            .header(SESSION_ID_HEADER, session_id)
            .send()
            .await?
            .status();
        if !status.is_success()
            && status != StatusCode::METHOD_NOT_ALLOWED
            && status != StatusCode::NOT_FOUND
        {
            tracing::warn!("MCP session termination answered with status {status}");
        }
        Ok(())
    }

    fn ensure_open(&self) -> Result<(), McpError> {
        if self.is_closed() {
            Err(McpError::Closed)
        } else {
            Ok(())
        }
    }

    async fn post<T: serde::Serialize>(&self, message: &T) -> Result<reqwest::Response, McpError> {
        let mut req = self
            .http
            .post(self.url.clone())
            .header(ACCEPT, ACCEPT_JSON_OR_SSE)
            .json(message);
        if let Some(session_id) = self.session_id.lock().await.clone() {
            req = req.header(SESSION_ID_HEADER, session_id);
        }
        if let Some(version) = self.protocol_version.get() {
            req = req.header(PROTOCOL_VERSION_HEADER, version.as_str());
        }

        let response = req.send().await?;

        if let Some(assigned) = response
            .headers()
            .get(SESSION_ID_HEADER)
            .and_then(|v| v.to_str().ok())
        {
            let mut guard = self.session_id.lock().await;
            if guard.as_deref() != Some(assigned) {
                *guard = Some(assigned.to_string());
            }
        }

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(McpError::Http {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response)
    }
}

/// Read SSE events until the response to request `id` shows up.
///
/// Server notifications and server-to-client requests on the same stream are
/// skipped.
async fn read_event_stream_reply(
    mut response: reqwest::Response,
    id: u64,
) -> Result<JsonRpcResponse, McpError> {
    let mut parser = SseParser::new();
    let mut pending: Vec<u8> = Vec::new();

    while let Some(chunk) = response.chunk().await? {
        pending.extend_from_slice(&chunk);
        let text = take_utf8(&mut pending);

        for event in parser.feed(&text) {
            if !event.is_message() {
                continue;
            }
            match serde_json::from_str::<JsonRpcResponse>(&event.data) {
                Ok(message) if message.answers(id) => return Ok(message),
                Ok(message) => {
                    tracing::debug!(
                        "skipping unrelated MCP message {}",
                        message.method.as_deref().unwrap_or("(response)")
                    );
                }
                Err(e) => tracing::warn!("Failed to parse MCP event data: {e}"),
            }
        }
    }

    Err(McpError::Protocol(format!(
        "event stream ended before the response to request {id}"
    )))
}

/// Decode as much of `pending` as possible, leaving an incomplete trailing
/// character for the next chunk. Invalid sequences become U+FFFD.
fn take_utf8(pending: &mut Vec<u8>) -> String {
    let mut text = String::new();
    loop {
        match std::str::from_utf8(pending.as_slice()) {
            Ok(valid) => {
                text.push_str(valid);
                pending.clear();
                return text;
            }
            Err(e) => {
                let valid = e.valid_up_to();
                text.push_str(&String::from_utf8_lossy(&pending[..valid]));
                match e.error_len() {
                    Some(len) => {
                        text.push(char::REPLACEMENT_CHARACTER);
                        pending.drain(..valid + len);
                    }
                    None => {
                        pending.drain(..valid);
                        return text;
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn transport() -> StreamableHttpTransport {
        StreamableHttpTransport::new(
            reqwest::Client::new(),
            Url::parse("http://127.0.0.1:9/mcp").unwrap(),
        )
    }

    #[tokio::test]
    async fn new_transport_has_no_session() {
        let t = transport();
        assert!(t.session_id().await.is_none());
        assert!(!t.is_closed());
    }

    #[tokio::test]
    async fn close_without_session_sends_nothing() {
        // Port 9 (discard) is never contacted: no session id means no DELETE.
        let t = transport();
        t.close().await.unwrap();
        assert!(t.is_closed());
    }

    #[tokio::test]
    async fn requests_after_close_fail_fast() {
        let t = transport();
        t.close().await.unwrap();
        assert!(matches!(t.request("tools/list", None).await, Err(McpError::Closed)));
        assert!(matches!(
            t.notify("notifications/initialized", None).await,
            Err(McpError::Closed)
        ));
    }

    #[tokio::test]
    async fn second_close_is_a_noop() {
        let t = transport();
        t.close().await.unwrap();
        t.close().await.unwrap();
    }

    #[test]
    fn protocol_version_is_set_once() {
        let t = transport();
        t.set_protocol_version("2025-06-18");
        t.set_protocol_version("2024-11-05");
        assert_eq!(t.protocol_version.get().map(String::as_str), Some("2025-06-18"));
    }

    #[test]
    fn utf8_split_after_invalid_byte_survives() {
        let mut pending = b"a\xffb".to_vec();
        pending.push("\u{e9}".as_bytes()[0]);
        assert_eq!(take_utf8(&mut pending), "a\u{FFFD}b");
        assert_eq!(pending, ["\u{e9}".as_bytes()[0]]);

        pending.push("\u{e9}".as_bytes()[1]);
        pending.extend_from_slice(b"\n");
        assert_eq!(take_utf8(&mut pending), "\u{e9}\n");
        assert!(pending.is_empty());
    }
}
