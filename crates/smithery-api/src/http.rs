//! Shared HTTP transport, request builder and response reader.

use std::fmt::Write as _;
use std::sync::OnceLock;
use std::time::Duration;

use bytes::Bytes;
use reqwest::StatusCode;
use reqwest::header::{ACCEPT, AUTHORIZATION, HeaderMap, HeaderValue};
use smithery_types::SmitheryError;
use url::Url;

use crate::diag::Diagnostics;

/// Overall deadline for a single request, including reading the body.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);
/// How long an idle pooled connection is kept around.
const DEFAULT_IDLE_TIMEOUT: Duration = Duration::from_secs(90);
/// TCP connect plus TLS handshake.
const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(5);
/// Maximum silence while waiting for response headers or body bytes.
const DEFAULT_READ_TIMEOUT: Duration = Duration::from_secs(30);

static SHARED_CLIENT: OnceLock<Result<reqwest::Client, String>> = OnceLock::new();

/// The process-wide pooled HTTP client, built on first use and never rebuilt.
///
/// Used for registry requests and for every MCP session.
pub fn shared_client() -> Result<&'static reqwest::Client, SmitheryError> {
    SHARED_CLIENT
        .get_or_init(|| {
            reqwest::Client::builder()
                .timeout(DEFAULT_TIMEOUT)
                .pool_idle_timeout(DEFAULT_IDLE_TIMEOUT)
                .connect_timeout(DEFAULT_CONNECT_TIMEOUT)
                .read_timeout(DEFAULT_READ_TIMEOUT)
                .build()
                .map_err(|e| e.to_string())
        })
        .as_ref()
        .map_err(|e| SmitheryError::Transport(format!("failed to build http client: {e}")))
}

/// Replace the query string of `url` with the form-encoded `pairs`.
///
/// An empty `pairs` leaves the URL without a query at all.
pub fn replace_query<'a, I>(mut url: Url, pairs: I) -> Url
where
    I: IntoIterator<Item = (&'a str, &'a str)>,
{
    url.set_query(None);
    let mut pairs = pairs.into_iter().peekable();
    if pairs.peek().is_some() {
        url.query_pairs_mut().extend_pairs(pairs);
    }
    url
}

/// Build an authenticated `GET` request for a registry endpoint.
pub fn build_get_request(
    http: &reqwest::Client,
    api_key: &str,
    base_url: &str,
    query: &[(&str, String)],
) -> Result<reqwest::Request, SmitheryError> {
    let url = Url::parse(base_url).map_err(|e| SmitheryError::Url(format!("{base_url}: {e}")))?;
    let url = replace_query(url, query.iter().map(|(k, v)| (*k, v.as_str())));

    let mut auth = HeaderValue::from_str(&format!("Bearer {api_key}")).map_err(|_| {
        SmitheryError::Config("API token is not a valid HTTP header value".to_string())
    })?;
    auth.set_sensitive(true);

    http.get(url)
        .header(AUTHORIZATION, auth)
        .header(ACCEPT, HeaderValue::from_static("application/json"))
        .build()
        .map_err(|e| SmitheryError::Url(e.to_string()))
}

/// Send `request` on `http` and return the body of a `200 OK` response.
///
/// Any other status becomes [`SmitheryError::Http`] carrying whatever body
/// could be read.
pub async fn execute(
    http: &reqwest::Client,
    request: reqwest::Request,
    diag: &Diagnostics,
) -> Result<Bytes, SmitheryError> {
    if diag.is_enabled() {
        diag.dump("request", &format_request(&request));
    }
    tracing::debug!("{} {}", request.method(), request.url().path());

    let response = http
        .execute(request)
        .await
        .map_err(|e| SmitheryError::Transport(e.to_string()))?;

    let status = response.status();
    let head = diag
        .is_enabled()
        .then(|| format_response_head(status, response.version(), response.headers()));

    if status == StatusCode::OK {
        let body = response
            .bytes()
            .await
            .map_err(|e| SmitheryError::Transport(e.to_string()))?;
        if let Some(head) = head {
            diag.dump("response", &format!("{head}{}", String::from_utf8_lossy(&body)));
        }
        return Ok(body);
    }

    let body = response.bytes().await.unwrap_or_default();
    let body = String::from_utf8_lossy(&body).into_owned();
    if let Some(head) = head {
        diag.dump("response", &format!("{head}{body}"));
    }
    tracing::debug!("registry responded with status {status}");
    Err(SmitheryError::Http {
        status: status.as_u16(),
        body,
    })
}

/// Render a request as it goes on the wire: request line, host, headers, body.
fn format_request(request: &reqwest::Request) -> String {
    let url = request.url();
    let mut target = url.path().to_string();
    if let Some(query) = url.query() {
        target.push('?');
        target.push_str(query);
    }

    let mut out = format!(
        "{} {} {:?}\r\n",
        request.method(),
        target,
        request.version()
    );
    if let Some(host) = url.host_str() {
        match url.port() {
            Some(port) => {
                let _ = write!(out, "Host: {host}:{port}\r\n");
            }
            None => {
                let _ = write!(out, "Host: {host}\r\n");
            }
        }
    }
    write_headers(&mut out, request.headers());
    out.push_str("\r\n");
    if let Some(body) = request.body().and_then(|b| b.as_bytes()) {
        out.push_str(&String::from_utf8_lossy(body));
    }
    out
}

fn format_response_head(status: StatusCode, version: reqwest::Version, headers: &HeaderMap) -> String {
    let mut out = format!("{version:?} {status}\r\n");
    write_headers(&mut out, headers);
    out.push_str("\r\n");
    out
}

fn write_headers(out: &mut String, headers: &HeaderMap) {
    for (name, value) in headers {
        let value = value.to_str().unwrap_or("<binary>");
        let _ = write!(out, "{name}: {value}\r\n");
    }
}
