//! Concierge core — session state, run telemetry, and tool-server config.
//!
//! This crate contains:
//! - **types**: exchanges, run outcomes, and debug telemetry records
//! - **session**: `ChatSession` — bounded history + debug log + JSON dumps
//! - **config**: the `mcpServers` schema and its tolerant loader
//! - **utils**: timestamps, session ids, and string helpers

pub mod config;
pub mod session;
pub mod types;
pub mod utils;

pub use session::ChatSession;
pub use types::{DebugEntry, Exchange, RunItem, RunOutcome, ToolArgs, ToolCallRecord, UsageInfo};
