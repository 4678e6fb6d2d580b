//! Read-only client for the Smithery registry.

use serde::de::DeserializeOwned;
use smithery_types::{ServerDetail, ServersPage, SmitheryError};

use crate::diag::Diagnostics;
use crate::http::{build_get_request, execute, shared_client};

/// The public Smithery registry.
pub const DEFAULT_REGISTRY_URL: &str = "https://registry.smithery.ai";

/// Filters and paging for [`RegistryClient::list_servers`].
///
/// Only the fields that were set are sent as query parameters.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListServersOptions {
    query: Option<String>,
    page: Option<u32>,
    page_size: Option<u32>,
}

impl ListServersOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Search text, e.g. `"is:verified web search"`.
    pub fn query(mut self, query: impl Into<String>) -> Self {
        self.query = Some(query.into());
        self
    }

    pub fn page(mut self, page: u32) -> Self {
        self.page = Some(page);
        self
    }

    pub fn page_size(mut self, page_size: u32) -> Self {
        self.page_size = Some(page_size);
        self
    }

    fn query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();
        if let Some(query) = &self.query {
            pairs.push(("q", query.clone()));
        }
        if let Some(page) = self.page {
            pairs.push(("page", page.to_string()));
        }
        if let Some(page_size) = self.page_size {
            pairs.push(("pageSize", page_size.to_string()));
        }
        pairs
    }
}

/// Client for the registry's `/servers` endpoints.
///
/// Every error it returns has the API token masked.
#[derive(Clone)]
pub struct RegistryClient {
    api_key: String,
    base_url: String,
    diag: Diagnostics,
}

impl std::fmt::Debug for RegistryClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegistryClient")
            .field("api_key", &smithery_types::REDACTION_MASK)
            .field("base_url", &self.base_url)
            .field("diag", &self.diag)
            .finish()
    }
}

impl RegistryClient {
    pub fn new(api_key: impl Into<String>, base_url: impl Into<String>, diag: Diagnostics) -> Self {
        let base_url: String = base_url.into();
        Self {
            api_key: api_key.into(),
            base_url: base_url.trim_end_matches('/').to_string(),
            diag,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// List servers, optionally filtered and paged.
    pub async fn list_servers(
        &self,
        options: &ListServersOptions,
    ) -> Result<ServersPage, SmitheryError> {
        let url = format!("{}/servers", self.base_url);
        self.fetch(&url, &options.query_pairs())
            .await
            .map_err(|e| e.redact(&self.api_key))
    }

    /// Fetch the full record of one server, e.g. `"@smithery/toolbox"`.
    pub async fn get_server(&self, qualified_name: &str) -> Result<ServerDetail, SmitheryError> {
        let url = format!("{}/servers/{qualified_name}", self.base_url);
        self.fetch(&url, &[])
            .await
            .map_err(|e| e.redact(&self.api_key))
    }

    async fn fetch<T: DeserializeOwned>(
        &self,
        url: &str,
        query: &[(&str, String)],
    ) -> Result<T, SmitheryError> {
        let http = shared_client()?;
        let request = build_get_request(http, &self.api_key, url, query)?;
        let body = execute(http, request, &self.diag).await?;
        Ok(serde_json::from_slice(&body)?)
    }
}
