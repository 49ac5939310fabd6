//! Tool-server configuration — schema and tolerant loading.
//!
//! # Usage
//! ```no_run
//! use std::path::Path;
//! use concierge_core::config;
//!
//! let cfg = config::load_mcp_config(Path::new("config.json"));
//! println!("{} tool servers configured", cfg.servers.len());
//! ```

pub mod loader;
pub mod schema;

pub use loader::{load_mcp_config, McpConfig};
pub use schema::ServerSpec;
