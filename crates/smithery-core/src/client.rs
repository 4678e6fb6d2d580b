//! The top-level Smithery client.

use std::sync::Arc;

use smithery_api::{
    DEFAULT_REGISTRY_URL, Diagnostics, ListServersOptions, RegistryClient, shared_client,
};
use smithery_mcp::{Implementation, SessionOpener, StreamableHttpOpener};
use smithery_types::{REDACTION_MASK, ServerDetail, ServersPage, SmitheryError};

/// Host behind the `https://server.<host>/<server>/mcp` endpoints.
pub const DEFAULT_SERVER_HOST: &str = "smithery.ai";

/// Name advertised to MCP servers during the handshake.
pub const CLIENT_NAME: &str = "smithery-rs";

/// Identity advertised during the handshake: crate version plus OS and arch.
pub fn client_info() -> Implementation {
    Implementation {
        name: CLIENT_NAME.to_string(),
        version: format!(
            "{} ({}/{})",
            env!("CARGO_PKG_VERSION"),
            std::env::consts::OS,
            std::env::consts::ARCH
        ),
    }
}

/// Client for the Smithery registry and for MCP servers hosted behind it.
///
/// The API token is fixed for the client's lifetime and never printed by
/// `Debug`. All network I/O goes through one process-wide HTTP client.
#[derive(Clone)]
pub struct Client {
    api_key: String,
    diag: Diagnostics,
    registry: RegistryClient,
    server_host: String,
    opener: Option<Arc<dyn SessionOpener>>,
}

impl std::fmt::Debug for Client {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Client")
            .field("api_key", &REDACTION_MASK)
            .field("verbose", &self.diag.is_enabled())
            .field("registry_url", &self.registry.base_url())
            .field("server_host", &self.server_host)
            .finish_non_exhaustive()
    }
}

impl Client {
    pub fn new(api_key: impl Into<String>) -> Self {
        let api_key = api_key.into();
        let diag = Diagnostics::default();
        Self {
            registry: RegistryClient::new(api_key.clone(), DEFAULT_REGISTRY_URL, diag),
            api_key,
            diag,
            server_host: DEFAULT_SERVER_HOST.to_string(),
            opener: None,
        }
    }

    /// Dump full requests and responses to stderr.
    ///
    /// Dumps are not redacted: they contain the bearer header and the
    /// connection URLs with `api_key`.
    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.diag = Diagnostics::new(verbose);
        self.registry = RegistryClient::new(
            self.api_key.clone(),
            self.registry.base_url().to_string(),
            self.diag,
        );
        self
    }

    /// Point registry lookups at another registry deployment.
    pub fn with_registry_url(mut self, registry_url: impl Into<String>) -> Self {
        self.registry = RegistryClient::new(self.api_key.clone(), registry_url, self.diag);
        self
    }

    /// Host used to build profile connection URLs.
    pub fn with_server_host(mut self, host: impl Into<String>) -> Self {
        self.server_host = host.into();
        self
    }

    /// Replace the Streamable HTTP session engine.
    pub fn with_session_opener(mut self, opener: Arc<dyn SessionOpener>) -> Self {
        self.opener = Some(opener);
        self
    }

    pub fn is_verbose(&self) -> bool {
        self.diag.is_enabled()
    }

    /// List servers in the registry.
    pub async fn list_servers(
        &self,
        options: &ListServersOptions,
    ) -> Result<ServersPage, SmitheryError> {
        self.registry.list_servers(options).await
    }

    /// Fetch one server's full registry record.
    pub async fn get_server(&self, qualified_name: &str) -> Result<ServerDetail, SmitheryError> {
        self.registry.get_server(qualified_name).await
    }

    pub(crate) fn api_key(&self) -> &str {
        &self.api_key
    }

    pub(crate) fn diag(&self) -> &Diagnostics {
        &self.diag
    }

    pub(crate) fn server_host(&self) -> &str {
        &self.server_host
    }

    pub(crate) fn session_opener(&self) -> Result<Arc<dyn SessionOpener>, SmitheryError> {
        match &self.opener {
            Some(opener) => Ok(Arc::clone(opener)),
            None => Ok(Arc::new(StreamableHttpOpener::new(shared_client()?.clone()))),
        }
    }
}
