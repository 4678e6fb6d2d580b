//! MCP message payloads used by the handshake and the tool calls.

use serde::{Deserialize, Serialize};

/// Newest protocol revision this client speaks; offered during `initialize`.
pub const LATEST_PROTOCOL_VERSION: &str = "2025-06-18";

/// Revisions a server may answer `initialize` with.
pub const SUPPORTED_PROTOCOL_VERSIONS: &[&str] = &["2025-06-18", "2025-03-26", "2024-11-05"];

/// Name and version of a client or server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Implementation {
    pub name: String,
    pub version: String,
}

/// The server's acknowledgment of `initialize`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InitializeResult {
    pub protocol_version: String,
    #[serde(default)]
    pub capabilities: serde_json::Value,
    pub server_info: Implementation,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instructions: Option<String>,
}

/// Parameters for `tools/list`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ListToolsParams {
    /// Opaque cursor from a previous page's `next_cursor`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cursor: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListToolsResult {
    pub tools: Vec<Tool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_cursor: Option<String>,
}

/// A tool exposed by a live session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tool {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default = "default_schema")]
    pub input_schema: serde_json::Value,
}

fn default_schema() -> serde_json::Value {
    serde_json::json!({"type": "object", "properties": {}})
}

/// Result of `tools/call`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CallToolResult {
    #[serde(default)]
    pub content: Vec<ToolContent>,
    #[serde(default)]
    pub is_error: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub structured_content: Option<serde_json::Value>,
}

impl CallToolResult {
    /// All text items joined by newlines.
    pub fn text(&self) -> String {
        self.content
            .iter()
            .filter_map(|c| match c {
                ToolContent::Text { text } => Some(text.as_str()),
                _ => None,
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// A content item in a tool result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ToolContent {
    Text {
        text: String,
    },
    Image {
        data: String,
        #[serde(rename = "mimeType")]
        mime_type: String,
    },
    Audio {
        data: String,
        #[serde(rename = "mimeType")]
        mime_type: String,
    },
    Resource {
        resource: serde_json::Value,
    },
    #[serde(other)]
    Other,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserialize_initialize_result() {
        let json = r#"{
            "protocolVersion": "2025-06-18",
            "capabilities": {"tools": {"listChanged": true}},
            "serverInfo": {"name": "exa-search", "version": "1.2.0"},
            "instructions": "Use search for web queries"
        }"#;
        let init: InitializeResult = serde_json::from_str(json).unwrap();
        assert_eq!(init.protocol_version, "2025-06-18");
        assert_eq!(init.server_info.name, "exa-search");
        assert_eq!(init.capabilities["tools"]["listChanged"], true);
        assert_eq!(init.instructions.as_deref(), Some("Use search for web queries"));
    }

    #[test]
    fn list_tools_params_omit_missing_cursor() {
        let json = serde_json::to_value(ListToolsParams::default()).unwrap();
        assert_eq!(json, serde_json::json!({}));
        let json = serde_json::to_value(ListToolsParams {
            cursor: Some("page-2".into()),
        })
        .unwrap();
        assert_eq!(json, serde_json::json!({"cursor": "page-2"}));
    }

    #[test]
    fn deserialize_tools_list_result() {
        let json = r#"{
            "tools": [
                {"name": "web_search_exa", "description": "Search the web", "inputSchema": {"type": "object"}},
                {"name": "bare"}
            ],
            "nextCursor": "abc"
        }"#;
        let result: ListToolsResult = serde_json::from_str(json).unwrap();
        assert_eq!(result.tools.len(), 2);
        assert_eq!(result.tools[0].description.as_deref(), Some("Search the web"));
        assert!(result.tools[1].description.is_none());
        assert_eq!(result.tools[1].input_schema["type"], "object");
        assert_eq!(result.next_cursor.as_deref(), Some("abc"));
    }

    #[test]
    fn deserialize_call_tool_result_mixed_content() {
        let json = r#"{
            "content": [
                {"type": "text", "text": "first"},
                {"type": "image", "data": "aGVsbG8=", "mimeType": "image/png"},
                {"type": "resource_link", "uri": "file:///x", "name": "x"},
                {"type": "text", "text": "second"}
            ],
            "isError": false
        }"#;
        let result: CallToolResult = serde_json::from_str(json).unwrap();
        assert_eq!(result.content.len(), 4);
        assert!(!result.is_error);
        assert_eq!(result.content[2], ToolContent::Other);
        assert_eq!(result.text(), "first\nsecond");
        match &result.content[1] {
            ToolContent::Image { mime_type, .. } => assert_eq!(mime_type, "image/png"),
            other => panic!("Expected image content, got {other:?}"),
        }
    }

    #[test]
    fn deserialize_call_tool_error_result() {
        let json = r#"{"content": [{"type": "text", "text": "rate limited"}], "isError": true}"#;
        let result: CallToolResult = serde_json::from_str(json).unwrap();
        assert!(result.is_error);
        assert!(result.structured_content.is_none());
    }
}
