//! Tolerant loader for the `mcpServers` configuration file.
//!
//! A missing or unparseable file degrades to an empty server set; the chat
//! loop still starts. A malformed entry is logged and skipped without
//! aborting the rest.

use std::path::Path;

use tracing::{debug, info, warn};

use super::schema::ServerSpec;

/// The loaded tool-server configuration.
///
/// Entries keep a deterministic order (`mcpServers` keys sorted); this is
/// also the registration and release order used by the driver.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct McpConfig {
    pub servers: Vec<(String, ServerSpec)>,
}

/// Load tool-server definitions from a JSON config file.
pub fn load_mcp_config(path: &Path) -> McpConfig {
    if !path.exists() {
        warn!(path = %path.display(), "config file not found, starting without tool servers");
        return McpConfig::default();
    }

    debug!(path = %path.display(), "loading tool server config");

    let content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) => {
            warn!(path = %path.display(), error = %e, "failed to read config file");
            return McpConfig::default();
        }
    };

    parse_mcp_config(&content)
}

/// Parse a config document, skipping malformed entries.
pub fn parse_mcp_config(content: &str) -> McpConfig {
    let raw: serde_json::Value = match serde_json::from_str(content) {
        Ok(value) => value,
        Err(e) => {
            warn!(error = %e, "failed to parse config JSON");
            return McpConfig::default();
        }
    };

    let entries = match raw.get("mcpServers").and_then(|v| v.as_object()) {
        Some(entries) => entries,
        None => {
            warn!("config has no mcpServers mapping");
            return McpConfig::default();
        }
    };

    let mut servers = Vec::new();
    for (name, value) in entries {
        match serde_json::from_value::<ServerSpec>(value.clone()) {
            Ok(spec) => {
                debug!(server = %name, command = %spec.command, "tool server entry loaded");
                servers.push((name.clone(), spec));
            }
            Err(e) => {
                warn!(server = %name, error = %e, "skipping malformed tool server entry");
            }
        }
    }

    info!(loaded = servers.len(), configured = entries.len(), "tool server config loaded");
    McpConfig { servers }
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────
