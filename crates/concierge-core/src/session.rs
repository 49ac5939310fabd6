//! Chat session state — bounded conversation memory and run telemetry.
//!
//! One `ChatSession` lives for the whole interactive session. Exchanges are
//! hard-capped at `max_history` (oldest evicted first); the debug log is
//! unbounded. Both logs can be dumped to pretty-printed JSON files whose
//! default names embed the session id.

use std::io;
use std::path::{Path, PathBuf};

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::types::{DebugEntry, Exchange, RunItem, RunOutcome, ToolArgs, ToolCallRecord};
use crate::utils;

/// Default number of retained exchanges.
pub const DEFAULT_MAX_HISTORY: usize = 10;

/// Exchanges included in the context summary.
const SUMMARY_EXCHANGES: usize = 5;

/// Per-message character clip in the context summary.
const SUMMARY_CLIP: usize = 100;

// ─────────────────────────────────────────────
// Dump payloads
// ─────────────────────────────────────────────

#[derive(Serialize, Deserialize)]
struct HistoryDump {
    session_id: String,
    timestamp: String,
    history: Vec<Exchange>,
}

#[derive(Serialize, Deserialize)]
struct DebugDump {
    session_id: String,
    timestamp: String,
    debug_history: Vec<DebugEntry>,
}

// ─────────────────────────────────────────────
// ChatSession
// ─────────────────────────────────────────────

/// Conversation memory and per-run telemetry for one interactive session.
pub struct ChatSession {
    history: Vec<Exchange>,
    debug_history: Vec<DebugEntry>,
    max_history: usize,
    session_id: String,
}

impl Default for ChatSession {
    fn default() -> Self {
        Self::new()
    }
}

impl ChatSession {
    /// Create a session with the default history cap.
    pub fn new() -> Self {
        Self::with_max_history(DEFAULT_MAX_HISTORY)
    }

    /// Create a session retaining at most `max_history` exchanges.
    pub fn with_max_history(max_history: usize) -> Self {
        ChatSession {
            history: Vec::new(),
            debug_history: Vec::new(),
            max_history,
            session_id: utils::new_session_id(),
        }
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    pub fn max_history(&self) -> usize {
        self.max_history
    }

    pub fn history(&self) -> &[Exchange] {
        &self.history
    }

    pub fn debug_history(&self) -> &[DebugEntry] {
        &self.debug_history
    }

    /// Append a user/agent exchange, evicting the oldest entries once the
    /// cap is exceeded.
    pub fn add_exchange(&mut self, user: impl Into<String>, response: impl Into<String>) {
        self.history.push(Exchange::new(user, response));
        if self.history.len() > self.max_history {
            let excess = self.history.len() - self.max_history;
            self.history.drain(..excess);
        }
    }

    /// Record telemetry for one completed agent run.
    ///
    /// Walks the run items in order: each tool call opens a record, each
    /// output closes the most recently opened record that has none yet.
    /// Outputs with no open record are dropped rather than failing the entry.
    pub fn add_debug_info(&mut self, outcome: &RunOutcome) {
        let mut tool_calls: Vec<ToolCallRecord> = Vec::new();

        for item in &outcome.items {
            match item {
                RunItem::ToolCall {
                    tool,
                    arguments,
                    at,
                } => {
                    tool_calls.push(ToolCallRecord {
                        tool: tool.clone(),
                        args: ToolArgs::parse(arguments),
                        timestamp: *at,
                        output: None,
                        output_timestamp: None,
                    });
                }
                RunItem::ToolOutput { output, at } => {
                    if let Some(open) = tool_calls.iter_mut().rev().find(|r| r.output.is_none()) {
                        open.output = Some(output.clone());
                        open.output_timestamp = Some(*at);
                    }
                }
            }
        }

        self.debug_history.push(DebugEntry {
            timestamp: Utc::now(),
            usage: outcome.usage.clone(),
            tool_calls,
        });
    }

    /// Render the recent-context block spliced into the agent instructions.
    ///
    /// Empty history yields an empty string. Otherwise covers at most the
    /// last five exchanges, each message clipped to 100 characters.
    pub fn get_context_summary(&self) -> String {
        if self.history.is_empty() {
            return String::new();
        }

        let mut lines = vec!["## Recent Conversation Context:".to_string()];
        let start = self.history.len().saturating_sub(SUMMARY_EXCHANGES);
        for (i, exchange) in self.history[start..].iter().enumerate() {
            lines.push(format!("**Exchange {}:**", i + 1));
            lines.push(format!(
                "User: {}",
                utils::clip_chars(&exchange.user, SUMMARY_CLIP)
            ));
            lines.push(format!(
                "Assistant: {}",
                utils::clip_chars(&exchange.response, SUMMARY_CLIP)
            ));
            lines.push(String::new());
        }

        lines.join("\n")
    }

    /// Write the conversation history as pretty-printed JSON.
    ///
    /// Defaults to `chat_history_<session_id>.json` in the current
    /// directory; overwrites any existing file. Returns the path written.
    pub fn save_history(&self, path: Option<&Path>) -> io::Result<PathBuf> {
        let path = path.map(PathBuf::from).unwrap_or_else(|| {
            PathBuf::from(format!("chat_history_{}.json", self.session_id))
        });

        let dump = HistoryDump {
            session_id: self.session_id.clone(),
            timestamp: utils::timestamp(),
            history: self.history.clone(),
        };
        write_pretty_json(&path, &dump)?;

        debug!(path = %path.display(), exchanges = self.history.len(), "chat history saved");
        Ok(path)
    }

    /// Write the debug log as pretty-printed JSON.
    ///
    /// Defaults to `debug_history_<session_id>.json`; overwrites any
    /// existing file. Returns the path written.
    pub fn save_debug_history(&self, path: Option<&Path>) -> io::Result<PathBuf> {
        let path = path.map(PathBuf::from).unwrap_or_else(|| {
            PathBuf::from(format!("debug_history_{}.json", self.session_id))
        });

        let dump = DebugDump {
            session_id: self.session_id.clone(),
            timestamp: utils::timestamp(),
            debug_history: self.debug_history.clone(),
        };
        write_pretty_json(&path, &dump)?;

        debug!(path = %path.display(), entries = self.debug_history.len(), "debug history saved");
        Ok(path)
    }

    /// Empty both the exchange history and the debug log.
    ///
    /// Files already written stay on disk.
    pub fn clear(&mut self) {
        self.history.clear();
        self.debug_history.clear();
    }
}

fn write_pretty_json<T: Serialize>(path: &Path, value: &T) -> io::Result<()> {
    let json = serde_json::to_string_pretty(value)
        .map_err(|e| io::Error::new(io::ErrorKind::Other, e))?;
    std::fs::write(path, json)
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::UsageInfo;
    use chrono::{DateTime, Utc};

    fn ts(s: &str) -> DateTime<Utc> {
        s.parse().unwrap()
    }

    #[test]
    fn test_add_exchange_under_cap() {
        let mut session = ChatSession::new();
        session.add_exchange("hi", "hello");
        assert_eq!(session.history().len(), 1);
        assert_eq!(session.history()[0].user, "hi");
    }

    #[test]
    fn test_history_cap_evicts_oldest() {
        let mut session = ChatSession::with_max_history(10);
        for i in 0..11 {
            session.add_exchange(format!("q{}", i), format!("a{}", i));
        }

        assert_eq!(session.history().len(), 10);
        // Oldest evicted; the rest keep their original order.
        assert_eq!(session.history()[0].user, "q1");
        assert_eq!(session.history()[9].user, "q10");
    }

    #[test]
    fn test_history_cap_holds_for_many_appends() {
        let mut session = ChatSession::with_max_history(3);
        for i in 0..50 {
            session.add_exchange(format!("q{}", i), format!("a{}", i));
            assert!(session.history().len() <= 3);
        }
        let users: Vec<&str> = session.history().iter().map(|e| e.user.as_str()).collect();
        assert_eq!(users, vec!["q47", "q48", "q49"]);
    }

    #[test]
    fn test_summary_empty_history() {
        let session = ChatSession::new();
        assert_eq!(session.get_context_summary(), "");
    }

    #[test]
    fn test_summary_covers_last_five() {
        let mut session = ChatSession::new();
        for i in 0..8 {
            session.add_exchange(format!("question {}", i), format!("answer {}", i));
        }

        let summary = session.get_context_summary();
        assert!(summary.starts_with("## Recent Conversation Context:"));
        assert_eq!(summary.matches("**Exchange").count(), 5);
        // Oldest three are absent.
        assert!(!summary.contains("question 2"));
        assert!(summary.contains("question 3"));
        assert!(summary.contains("answer 7"));
    }

    #[test]
    fn test_summary_clips_long_messages() {
        let mut session = ChatSession::new();
        let long = "x".repeat(250);
        session.add_exchange(&long, "short");

        let summary = session.get_context_summary();
        for line in summary.lines() {
            if let Some(rest) = line.strip_prefix("User: ") {
                assert_eq!(rest.chars().count(), 103); // 100 chars + "..."
                assert!(rest.ends_with("..."));
            }
        }
        assert!(summary.contains("Assistant: short"));
    }

    #[test]
    fn test_clear_empties_both_logs() {
        let mut session = ChatSession::new();
        session.add_exchange("hi", "hello");
        session.add_debug_info(&RunOutcome::default());

        session.clear();

        assert!(session.history().is_empty());
        assert!(session.debug_history().is_empty());
    }

    // ── add_debug_info ──

    #[test]
    fn test_debug_info_call_output_pairing() {
        let mut session = ChatSession::new();
        let outcome = RunOutcome {
            final_output: "done".into(),
            usage: UsageInfo {
                input_tokens: 100,
                output_tokens: 20,
                total_tokens: 120,
                requests: 2,
            },
            items: vec![
                RunItem::ToolCall {
                    tool: "list_files".into(),
                    arguments: r#"{"path": "."}"#.into(),
                    at: ts("2025-06-01T10:00:00Z"),
                },
                RunItem::ToolOutput {
                    output: "README.md".into(),
                    at: ts("2025-06-01T10:00:01Z"),
                },
            ],
        };

        session.add_debug_info(&outcome);

        assert_eq!(session.debug_history().len(), 1);
        let entry = &session.debug_history()[0];
        assert_eq!(entry.usage.total_tokens, 120);
        assert_eq!(entry.tool_calls.len(), 1);

        let record = &entry.tool_calls[0];
        assert_eq!(record.tool, "list_files");
        assert_eq!(record.output.as_deref(), Some("README.md"));
        assert!(record.timestamp < record.output_timestamp.unwrap());
    }

    #[test]
    fn test_debug_info_output_closes_most_recent_open_call() {
        let mut session = ChatSession::new();
        let outcome = RunOutcome {
            final_output: String::new(),
            usage: UsageInfo::default(),
            items: vec![
                RunItem::ToolCall {
                    tool: "first".into(),
                    arguments: "{}".into(),
                    at: ts("2025-06-01T10:00:00Z"),
                },
                RunItem::ToolOutput {
                    output: "one".into(),
                    at: ts("2025-06-01T10:00:01Z"),
                },
                RunItem::ToolCall {
                    tool: "second".into(),
                    arguments: "{}".into(),
                    at: ts("2025-06-01T10:00:02Z"),
                },
                RunItem::ToolOutput {
                    output: "two".into(),
                    at: ts("2025-06-01T10:00:03Z"),
                },
            ],
        };

        session.add_debug_info(&outcome);

        let records = &session.debug_history()[0].tool_calls;
        assert_eq!(records[0].output.as_deref(), Some("one"));
        assert_eq!(records[1].output.as_deref(), Some("two"));
    }

    #[test]
    fn test_debug_info_stray_output_is_dropped() {
        let mut session = ChatSession::new();
        let outcome = RunOutcome {
            items: vec![RunItem::ToolOutput {
                output: "orphan".into(),
                at: ts("2025-06-01T10:00:00Z"),
            }],
            ..Default::default()
        };

        session.add_debug_info(&outcome);

        let entry = &session.debug_history()[0];
        assert!(entry.tool_calls.is_empty());
    }

    #[test]
    fn test_debug_info_unparseable_args_kept_raw() {
        let mut session = ChatSession::new();
        let outcome = RunOutcome {
            items: vec![RunItem::ToolCall {
                tool: "search".into(),
                arguments: "{broken".into(),
                at: ts("2025-06-01T10:00:00Z"),
            }],
            ..Default::default()
        };

        session.add_debug_info(&outcome);

        let record = &session.debug_history()[0].tool_calls[0];
        assert_eq!(record.args, ToolArgs::Raw("{broken".into()));
    }

    // ── Persistence ──

    #[test]
    fn test_save_history_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("history.json");

        let mut session = ChatSession::new();
        session.add_exchange("plan a trip", "where to?");
        session.add_exchange("kyoto", "great choice");

        session.save_history(Some(&path)).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        let dump: HistoryDump = serde_json::from_str(&content).unwrap();
        assert_eq!(dump.session_id, session.session_id());
        assert_eq!(dump.history, session.history());
        chrono::DateTime::parse_from_rfc3339(&dump.timestamp).unwrap();
    }

    #[test]
    fn test_save_history_default_filename_embeds_session_id() {
        let dir = tempfile::tempdir().unwrap();
        let session = ChatSession::new();

        let default_name = format!("chat_history_{}.json", session.session_id());
        let path = dir.path().join(&default_name);
        session.save_history(Some(&path)).unwrap();
        assert!(path.exists());
    }

    #[test]
    fn test_save_debug_history_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("debug.json");

        let mut session = ChatSession::new();
        let outcome = RunOutcome {
            final_output: "ok".into(),
            usage: UsageInfo {
                input_tokens: 1,
                output_tokens: 2,
                total_tokens: 3,
                requests: 1,
            },
            items: vec![
                RunItem::ToolCall {
                    tool: "get_time".into(),
                    arguments: "{}".into(),
                    at: ts("2025-06-01T10:00:00Z"),
                },
                RunItem::ToolOutput {
                    output: "noon".into(),
                    at: ts("2025-06-01T10:00:01Z"),
                },
            ],
        };
        session.add_debug_info(&outcome);

        session.save_debug_history(Some(&path)).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        let dump: DebugDump = serde_json::from_str(&content).unwrap();
        assert_eq!(dump.session_id, session.session_id());
        assert_eq!(dump.debug_history, session.debug_history());
    }

    #[test]
    fn test_save_to_unwritable_path_is_an_error() {
        let session = ChatSession::new();
        let result = session.save_history(Some(Path::new("/nonexistent/dir/out.json")));
        assert!(result.is_err());
    }

    #[test]
    fn test_save_overwrites_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("history.json");
        std::fs::write(&path, "stale").unwrap();

        let mut session = ChatSession::new();
        session.add_exchange("hi", "hello");
        session.save_history(Some(&path)).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.contains("\"hi\""));
        assert!(!content.contains("stale"));
    }
}
