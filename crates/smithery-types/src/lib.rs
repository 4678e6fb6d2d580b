//! Shared registry models, error hierarchy and secret redaction for smithery-rs.

pub mod error;
pub mod registry;
pub mod util;

pub use error::SmitheryError;
pub use registry::*;
pub use util::{REDACTION_MASK, redact};
