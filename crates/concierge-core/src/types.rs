//! Core types for Concierge — typed exchanges, run outcomes, and debug
//! telemetry records.
//!
//! The agent runner populates [`RunOutcome`] once per invocation; everything
//! the session extracts from a run goes through that struct instead of
//! probing an opaque framework object.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

// ─────────────────────────────────────────────
// Exchange
// ─────────────────────────────────────────────

/// One user-message/agent-response pair in conversation history.
///
/// Serializes as a two-element array, matching the flat JSON dump format:
/// `["user text", "agent text"]`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(from = "(String, String)", into = "(String, String)")]
pub struct Exchange {
    pub user: String,
    pub response: String,
}

impl Exchange {
    pub fn new(user: impl Into<String>, response: impl Into<String>) -> Self {
        Exchange {
            user: user.into(),
            response: response.into(),
        }
    }
}

impl From<(String, String)> for Exchange {
    fn from((user, response): (String, String)) -> Self {
        Exchange { user, response }
    }
}

impl From<Exchange> for (String, String) {
    fn from(exchange: Exchange) -> Self {
        (exchange.user, exchange.response)
    }
}

// ─────────────────────────────────────────────
// Usage
// ─────────────────────────────────────────────

/// Token usage accumulated over one agent run.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct UsageInfo {
    pub input_tokens: u64,
    pub output_tokens: u64,
    pub total_tokens: u64,
    pub requests: u64,
}

// ─────────────────────────────────────────────
// Run outcome (the runner boundary)
// ─────────────────────────────────────────────

/// An ordered event from one agent run.
///
/// Timestamps are stamped by the runner at event time, so a call's `at` is
/// strictly before its output's `at`.
#[derive(Clone, Debug, PartialEq)]
pub enum RunItem {
    /// The agent requested a tool invocation.
    ToolCall {
        tool: String,
        arguments: String,
        at: DateTime<Utc>,
    },
    /// A tool invocation produced output.
    ToolOutput { output: String, at: DateTime<Utc> },
}

impl RunItem {
    /// A tool-call item stamped now.
    pub fn tool_call(tool: impl Into<String>, arguments: impl Into<String>) -> Self {
        RunItem::ToolCall {
            tool: tool.into(),
            arguments: arguments.into(),
            at: Utc::now(),
        }
    }

    /// A tool-output item stamped now.
    pub fn tool_output(output: impl Into<String>) -> Self {
        RunItem::ToolOutput {
            output: output.into(),
            at: Utc::now(),
        }
    }
}

/// The result of one agent invocation.
///
/// The agent integration is required to populate every field; consumers never
/// probe for optional attributes.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RunOutcome {
    /// Final response text shown to the user.
    pub final_output: String,
    /// Token usage across all model round trips of the run.
    pub usage: UsageInfo,
    /// Ordered tool-call and tool-output events.
    pub items: Vec<RunItem>,
}

// ─────────────────────────────────────────────
// Debug telemetry
// ─────────────────────────────────────────────

/// Parsed tool-call arguments.
///
/// A valid JSON object becomes a key/value map; anything else is kept as the
/// raw argument string. Serializes untagged: the map as an object, the
/// fallback as a plain string.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ToolArgs {
    Parsed(serde_json::Map<String, Value>),
    Raw(String),
}

impl ToolArgs {
    /// Parse a tool-call argument string, falling back to the raw text when
    /// it is not a JSON object.
    pub fn parse(arguments: &str) -> Self {
        match serde_json::from_str::<serde_json::Map<String, Value>>(arguments) {
            Ok(map) => ToolArgs::Parsed(map),
            Err(_) => ToolArgs::Raw(arguments.to_string()),
        }
    }
}

/// One tool invocation observed during an agent run.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ToolCallRecord {
    pub tool: String,
    pub args: ToolArgs,
    pub timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_timestamp: Option<DateTime<Utc>>,
}

/// Telemetry for one completed agent run.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DebugEntry {
    pub timestamp: DateTime<Utc>,
    pub usage: UsageInfo,
    pub tool_calls: Vec<ToolCallRecord>,
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────
