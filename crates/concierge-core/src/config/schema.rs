//! Schema for one `mcpServers` entry.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Environment key whose value is normalized by a JSON round trip.
pub const OPENAPI_HEADERS_KEY: &str = "OPENAPI_MCP_HEADERS";

/// One tool-server definition from `config.json`.
///
/// Identity is the entry's key under `mcpServers`; the entry itself only
/// carries how to launch the subprocess.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ServerSpec {
    /// Executable to launch.
    pub command: String,
    /// Arguments, in order.
    #[serde(default)]
    pub args: Vec<String>,
    /// Extra environment for the subprocess.
    #[serde(default)]
    pub env: HashMap<String, String>,
}

impl ServerSpec {
    /// The environment to launch the subprocess with.
    ///
    /// `OPENAPI_MCP_HEADERS` values that parse as JSON are re-serialized
    /// compactly; anything else passes through verbatim.
    pub fn normalized_env(&self) -> HashMap<String, String> {
        self.env
            .iter()
            .map(|(key, value)| {
                let value = if key == OPENAPI_HEADERS_KEY {
                    normalize_headers_value(value)
                } else {
                    value.clone()
                };
                (key.clone(), value)
            })
            .collect()
    }
}

fn normalize_headers_value(value: &str) -> String {
    match serde_json::from_str::<serde_json::Value>(value) {
        Ok(parsed) => serde_json::to_string(&parsed).unwrap_or_else(|_| value.to_string()),
        Err(_) => value.to_string(),
    }
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn spec_with_env(key: &str, value: &str) -> ServerSpec {
        ServerSpec {
            command: "npx".into(),
            args: vec!["-y".into(), "some-server".into()],
            env: HashMap::from([(key.to_string(), value.to_string())]),
        }
    }

    #[test]
    fn test_deserialize_minimal_entry() {
        let spec: ServerSpec = serde_json::from_str(r#"{"command": "uvx"}"#).unwrap();
        assert_eq!(spec.command, "uvx");
        assert!(spec.args.is_empty());
        assert!(spec.env.is_empty());
    }

    #[test]
    fn test_deserialize_full_entry() {
        let spec: ServerSpec = serde_json::from_str(
            r#"{
                "command": "npx",
                "args": ["-y", "@modelcontextprotocol/server-filesystem", "."],
                "env": {"LOG_LEVEL": "debug"}
            }"#,
        )
        .unwrap();
        assert_eq!(spec.args.len(), 3);
        assert_eq!(spec.env["LOG_LEVEL"], "debug");
    }

    #[test]
    fn test_missing_command_is_an_error() {
        let result = serde_json::from_str::<ServerSpec>(r#"{"args": ["x"]}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_headers_value_recompacted() {
        let spec = spec_with_env(
            OPENAPI_HEADERS_KEY,
            "{\n  \"Authorization\": \"Bearer abc\"\n}",
        );
        let env = spec.normalized_env();
        assert_eq!(env[OPENAPI_HEADERS_KEY], r#"{"Authorization":"Bearer abc"}"#);
    }

    #[test]
    fn test_headers_value_invalid_json_passes_through() {
        let spec = spec_with_env(OPENAPI_HEADERS_KEY, "not json");
        let env = spec.normalized_env();
        assert_eq!(env[OPENAPI_HEADERS_KEY], "not json");
    }

    #[test]
    fn test_other_env_keys_untouched() {
        let spec = spec_with_env("API_TOKEN", "{ \"looks\": \"like json\" }");
        let env = spec.normalized_env();
        assert_eq!(env["API_TOKEN"], "{ \"looks\": \"like json\" }");
    }
}
