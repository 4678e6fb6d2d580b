//! Smithery registry HTTP client with a shared transport and verbose wire dumps.

mod diag;
mod http;
mod registry;

pub use diag::{Diagnostics, prettify};
pub use http::{build_get_request, execute, replace_query, shared_client};
pub use registry::{DEFAULT_REGISTRY_URL, ListServersOptions, RegistryClient};
