//! JSON output helpers.

use anyhow::{Context, Result};
use nodefleet_common::Node;

/// Machine-readable renderer for `--json` code paths.
pub struct JsonRenderer;

impl JsonRenderer {
    /// Print the node records as a pretty JSON array.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn render_nodes(&self, nodes: &[Node]) -> Result<()> {
        println!("{}", format_nodes(nodes)?);
        Ok(())
    }
}

/// Serialize node records as a pretty JSON array.
///
/// # Errors
///
/// Returns an error if serialization fails.
pub fn format_nodes(nodes: &[Node]) -> Result<String> {
    serde_json::to_string_pretty(nodes).context("JSON serialization failed")
}

/// Format a JSON error object:
///
/// ```json
/// {
///   "error": true,
///   "message": "...",
///   "code": "..."
/// }
/// ```
///
/// # Errors
///
/// Returns an error if JSON serialization fails.
pub fn format_error(message: &str, code: &str) -> Result<String> {
    let obj = serde_json::json!({
        "error": true,
        "message": message,
        "code": code,
    });
    serde_json::to_string_pretty(&obj).context("JSON serialization failed")
}
