//! Connection URL construction and session establishment.
//!
//! The API token travels as the `api_key` query parameter, so every URL
//! built here is a secret. It is only ever logged after redaction.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde::Serialize;
use smithery_api::{prettify, replace_query};
use smithery_types::{SmitheryError, redact};
use url::Url;

use crate::client::{Client, client_info};
use crate::session::Session;

impl Client {
    /// Connect to a registry server using a saved Smithery profile.
    ///
    /// The endpoint is `https://server.<host>/<server_name>/mcp`.
    pub async fn connect_with_profile(
        &self,
        profile_id: &str,
        server_name: &str,
    ) -> Result<Session, SmitheryError> {
        let url = self
            .profile_url(profile_id, server_name)
            .map_err(|e| e.redact(self.api_key()))?;
        self.connect(url).await
    }

    /// Connect to an arbitrary MCP endpoint, passing `config` inline.
    ///
    /// The configuration is serialized to JSON, base64-encoded and sent as
    /// the `config` query parameter. Any query already on `server_url` is
    /// replaced.
    pub async fn connect_manually<C>(
        &self,
        server_url: &str,
        config: &C,
    ) -> Result<Session, SmitheryError>
    where
        C: Serialize + ?Sized,
    {
        let url = self
            .manual_url(server_url, config)
            .map_err(|e| e.redact(self.api_key()))?;
        self.connect(url).await
    }

    pub(crate) fn profile_url(
        &self,
        profile_id: &str,
        server_name: &str,
    ) -> Result<Url, SmitheryError> {
        let raw = format!("https://server.{}/{}/mcp", self.server_host(), server_name);
        let url = Url::parse(&raw).map_err(|e| SmitheryError::Url(format!("{raw}: {e}")))?;
        Ok(replace_query(
            url,
            [("api_key", self.api_key()), ("profile", profile_id)],
        ))
    }

    pub(crate) fn manual_url<C>(&self, server_url: &str, config: &C) -> Result<Url, SmitheryError>
    where
        C: Serialize + ?Sized,
    {
        let json =
            serde_json::to_vec(config).map_err(|e| SmitheryError::Encode(e.to_string()))?;
        let encoded = STANDARD.encode(json);
        let url = Url::parse(server_url)
            .map_err(|e| SmitheryError::Url(format!("{server_url}: {e}")))?;
        Ok(replace_query(
            url,
            [("api_key", self.api_key()), ("config", encoded.as_str())],
        ))
    }

    async fn connect(&self, url: Url) -> Result<Session, SmitheryError> {
        let api_key = self.api_key();
        tracing::info!("connecting to MCP server at {}", redact(url.as_str(), api_key));
        self.diag().verbose(&format!("Connection URL: {url}"));

        let opener = self.session_opener().map_err(|e| e.redact(api_key))?;
        let inner = opener
            .open(&url, &client_info())
            .await
            .map_err(|e| SmitheryError::from(e).redact(api_key))?;

        if self.diag().is_enabled() {
            self.diag()
                .dump("initialize result", &prettify(inner.initialize_result()));
        }
        tracing::debug!(
            "connected to '{}' (protocol {})",
            inner.initialize_result().server_info.name,
            inner.initialize_result().protocol_version
        );
        Ok(Session::new(inner, api_key))
    }
}
