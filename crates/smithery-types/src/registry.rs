//! Response models for the Smithery registry API.

use serde::{Deserialize, Serialize};

/// One page of servers returned by `GET /servers`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ServersPage {
    #[serde(default)]
    pub servers: Vec<ServerSummary>,
    #[serde(default)]
    pub pagination: Pagination,
}

/// A server entry in a [`ServersPage`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ServerSummary {
    pub qualified_name: String,
    pub display_name: String,
    pub description: String,
    pub homepage: String,
    pub icon_url: Option<String>,
    pub use_count: u64,
    pub is_deployed: bool,
    pub remote: bool,
    pub created_at: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Pagination {
    pub current_page: u64,
    pub page_size: u64,
    pub total_pages: u64,
    pub total_count: u64,
}

/// Full detail for one server, returned by `GET /servers/{qualifiedName}`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerDetail {
    pub qualified_name: String,
    #[serde(default)]
    pub display_name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon_url: Option<String>,
    #[serde(default)]
    pub remote: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deployment_url: Option<String>,
    #[serde(default)]
    pub connections: Vec<ConnectionInfo>,
    #[serde(default)]
    pub security: Security,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tools: Vec<ToolSpec>,
}

impl ServerDetail {
    /// The first advertised HTTP connection, if any.
    pub fn http_connection(&self) -> Option<&ConnectionInfo> {
        self.connections
            .iter()
            .find(|c| c.connection_type == ConnectionType::Http)
    }
}

/// How a server can be reached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionType {
    Http,
    Stdio,
    #[serde(other)]
    Other,
}

/// A connection descriptor advertised by a server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionInfo {
    #[serde(rename = "type")]
    pub connection_type: ConnectionType,
    /// Only present for [`ConnectionType::Http`].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default)]
    pub config_schema: serde_json::Value,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Security {
    #[serde(default)]
    pub scan_passed: bool,
}

/// A tool as described by the registry (not the live session).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolSpec {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub input_schema: serde_json::Value,
}
