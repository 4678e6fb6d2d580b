//! Verbose diagnostic output written to stderr.
//!
//! Diagnostics are opt-in. When enabled, wire dumps are printed verbatim,
//! including bearer headers and connection URLs, so never enable verbose mode
//! where stderr ends up in shared logs.

use crossterm::style::{Color, SetForegroundColor};
use serde::Serialize;
use std::io::{IsTerminal, Write};

/// Gate and sink for verbose diagnostics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Diagnostics {
    enabled: bool,
}

impl Diagnostics {
    pub fn new(enabled: bool) -> Self {
        Self { enabled }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Print an informational message, highlighted when stderr is a terminal.
    pub fn verbose(&self, message: &str) {
        if !self.enabled {
            return;
        }
        let mut stderr = std::io::stderr().lock();
        let result = if std::io::stderr().is_terminal() {
            writeln!(
                stderr,
                "{}{}{}",
                SetForegroundColor(Color::Yellow),
                message.trim_end(),
                SetForegroundColor(Color::Reset)
            )
        } else {
            writeln!(stderr, "{}", message.trim_end())
        };
        // Rendering is best-effort
        let _ = result;
    }

    /// Print a full wire dump under a `>>> dump of <label>:` banner.
    pub fn dump(&self, label: &str, text: &str) {
        if !self.enabled {
            return;
        }
        let mut stderr = std::io::stderr().lock();
        let _ = writeln!(stderr, ">>> dump of {label}:\n\n{text}");
    }
}

/// Render any serializable value as indented JSON for diagnostics.
pub fn prettify<T: Serialize + ?Sized>(value: &T) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|e| format!("<unprintable: {e}>"))
}
