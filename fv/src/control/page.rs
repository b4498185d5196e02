//! Control page
//!
//! Compiled into the binary from templates/ at build time.

use eyre::{Result, eyre};
use handlebars::Handlebars;
use serde_json::json;
use tracing::debug;

/// Control UI template
pub const INDEX: &str = include_str!("../../templates/index.hbs");

/// Render the control page for a device
///
/// The device name is HTML-escaped.
pub fn render_page(device_name: &str) -> Result<String> {
    debug!(%device_name, "render_page: called");
    Handlebars::new()
        .render_template(INDEX, &json!({ "device": device_name }))
        .map_err(|e| eyre!("Failed to render control page: {}", e))
}
