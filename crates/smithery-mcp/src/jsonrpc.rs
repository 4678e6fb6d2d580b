//! JSON-RPC 2.0 envelopes carried over the Streamable HTTP transport.

use serde::{Deserialize, Serialize};

use crate::error::McpError;

/// A JSON-RPC 2.0 request.
#[derive(Debug, Clone, Serialize)]
pub struct JsonRpcRequest {
    pub jsonrpc: &'static str,
    pub id: u64,
    pub method: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub params: Option<serde_json::Value>,
}

impl JsonRpcRequest {
    pub fn new(id: u64, method: impl Into<String>, params: Option<serde_json::Value>) -> Self {
        Self {
            jsonrpc: "2.0",
            id,
            method: method.into(),
            params,
        }
    }
}

/// Any message a server may send back: a response, or a request/notification of its own.
///
/// Server-initiated messages carry `method` and are not answers to our requests.
#[derive(Debug, Clone, Deserialize)]
pub struct JsonRpcResponse {
    #[serde(default)]
    pub id: Option<serde_json::Value>,
    #[serde(default)]
    pub method: Option<String>,
    pub result: Option<serde_json::Value>,
    pub error: Option<JsonRpcError>,
}

impl JsonRpcResponse {
    /// Whether this message answers the request with numeric id `id`.
    pub fn answers(&self, id: u64) -> bool {
        if self.method.is_some() {
            return false;
        }
        match &self.id {
            Some(serde_json::Value::Number(n)) => n.as_u64() == Some(id),
            Some(serde_json::Value::String(s)) => s.parse::<u64>().ok() == Some(id),
            _ => false,
        }
    }

    /// Split into the `result` payload or a typed error.
    pub fn into_result(self) -> Result<serde_json::Value, McpError> {
        if let Some(err) = self.error {
            return Err(McpError::JsonRpc {
                code: err.code,
                message: err.message,
            });
        }
        self.result.ok_or_else(|| {
            McpError::Protocol("response has neither result nor error".to_string())
        })
    }
}

/// A JSON-RPC 2.0 error object.
#[derive(Debug, Clone, Deserialize)]
pub struct JsonRpcError {
    pub code: i64,
    pub message: String,
    pub data: Option<serde_json::Value>,
}

/// A JSON-RPC 2.0 notification (no id, no response expected).
#[derive(Debug, Clone, Serialize)]
pub struct JsonRpcNotification {
    pub jsonrpc: &'static str,
    pub method: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub params: Option<serde_json::Value>,
}

impl JsonRpcNotification {
    pub fn new(method: impl Into<String>, params: Option<serde_json::Value>) -> Self {
        Self {
            jsonrpc: "2.0",
            method: method.into(),
            params,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serialize_request_with_params() {
        let req = JsonRpcRequest::new(
            1,
            "tools/call",
            Some(serde_json::json!({"name": "search", "arguments": {"query": "rust"}})),
        );
        let json = serde_json::to_value(&req).unwrap();
        assert_eq!(json["jsonrpc"], "2.0");
        assert_eq!(json["id"], 1);
        assert_eq!(json["method"], "tools/call");
        assert_eq!(json["params"]["arguments"]["query"], "rust");
    }

    #[test]
    fn serialize_request_without_params() {
        let req = JsonRpcRequest::new(2, "tools/list", None);
        let json = serde_json::to_value(&req).unwrap();
        assert!(json.get("params").is_none());
    }

    #[test]
    fn response_answers_matching_id() {
        let resp: JsonRpcResponse =
            serde_json::from_str(r#"{"jsonrpc":"2.0","id":7,"result":{}}"#).unwrap();
        assert!(resp.answers(7));
        assert!(!resp.answers(8));
    }

    #[test]
    fn response_answers_string_id() {
        let resp: JsonRpcResponse =
            serde_json::from_str(r#"{"jsonrpc":"2.0","id":"3","result":{}}"#).unwrap();
        assert!(resp.answers(3));
    }

    #[test]
    fn server_request_is_not_an_answer() {
        let msg: JsonRpcResponse = serde_json::from_str(
            r#"{"jsonrpc":"2.0","id":1,"method":"roots/list","params":{}}"#,
        )
        .unwrap();
        assert!(!msg.answers(1));
    }

    #[test]
    fn notification_is_not_an_answer() {
        let msg: JsonRpcResponse = serde_json::from_str(
            r#"{"jsonrpc":"2.0","method":"notifications/progress","params":{"progress":1}}"#,
        )
        .unwrap();
        assert!(!msg.answers(1));
    }

    #[test]
    fn into_result_returns_payload() {
        let resp: JsonRpcResponse =
            serde_json::from_str(r#"{"jsonrpc":"2.0","id":1,"result":{"tools":[]}}"#).unwrap();
        assert_eq!(resp.into_result().unwrap(), serde_json::json!({"tools": []}));
    }

    #[test]
    fn into_result_surfaces_error_object() {
        let resp: JsonRpcResponse = serde_json::from_str(
            r#"{"jsonrpc":"2.0","id":1,"error":{"code":-32602,"message":"Unknown tool","data":"x"}}"#,
        )
        .unwrap();
        match resp.into_result() {
            Err(McpError::JsonRpc { code, message }) => {
                assert_eq!(code, -32602);
                assert_eq!(message, "Unknown tool");
            }
            other => panic!("Expected JsonRpc error, got {other:?}"),
        }
    }

    #[test]
    fn into_result_rejects_empty_response() {
        let resp: JsonRpcResponse = serde_json::from_str(r#"{"jsonrpc":"2.0","id":1}"#).unwrap();
        assert!(matches!(resp.into_result(), Err(McpError::Protocol(_))));
    }

    #[test]
    fn serialize_notification_without_params() {
        let notif = JsonRpcNotification::new("notifications/initialized", None);
        let json = serde_json::to_value(&notif).unwrap();
        assert_eq!(json["method"], "notifications/initialized");
        assert!(json.get("id").is_none());
        assert!(json.get("params").is_none());
    }
}
