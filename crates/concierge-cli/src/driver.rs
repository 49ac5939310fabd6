//! The demo driver — per-turn dispatch, tool-server lifecycle, shutdown.
//!
//! One driver lives for the whole interactive session. Each turn either hits
//! the slash-command table or builds a fresh agent (instructions + context
//! summary + provider model) and hands it to the runner. Loop control flows
//! through [`TurnOutcome`]; command handling never unwinds the loop.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{info, warn};

use concierge_agent::prompt;
use concierge_agent::provider::Integration;
use concierge_agent::runner::{AgentRunner, AgentSpec};
use concierge_agent::server::ToolServer;
use concierge_core::config::load_mcp_config;
use concierge_core::session::ChatSession;
use concierge_core::utils;

use crate::helpers;

/// Per-run cap on internal tool-call iterations.
pub const MAX_AGENT_TURNS: u32 = 20;

const HELP_TEXT: &str = "\
Available commands:
  /help         Show this help message
  /clear        Clear conversation and debug history
  /history      Show recent conversation history
  /save         Save conversation history to a file
  /debug        Save debug history (tool calls, usage) to a file
  /tools        List active tool servers
  /quit, /exit  Exit the chat

Any other message is sent to the assistant.";

/// What the loop should do after a processed turn.
#[derive(Clone, Debug, PartialEq)]
pub enum TurnOutcome {
    /// Show the text and read the next line.
    Reply(String),
    /// Show the text, then leave the loop and shut down.
    Exit(String),
}

impl TurnOutcome {
    pub fn text(&self) -> &str {
        match self {
            TurnOutcome::Reply(text) | TurnOutcome::Exit(text) => text,
        }
    }
}

// ─────────────────────────────────────────────
// Driver
// ─────────────────────────────────────────────

/// Drives the interactive session: servers, session state, turn dispatch.
pub struct Driver {
    config_path: PathBuf,
    integration: Integration,
    runner: Arc<dyn AgentRunner>,
    servers: Vec<ToolServer>,
    session: ChatSession,
    shutting_down: bool,
}

impl Driver {
    pub fn new(
        config_path: impl Into<PathBuf>,
        integration: Integration,
        runner: Arc<dyn AgentRunner>,
    ) -> Self {
        Driver {
            config_path: config_path.into(),
            integration,
            runner,
            servers: Vec::new(),
            session: ChatSession::new(),
            shutting_down: false,
        }
    }

    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    pub fn session(&self) -> &ChatSession {
        &self.session
    }

    pub fn server_count(&self) -> usize {
        self.servers.len()
    }

    /// Load the config and spawn one handle per well-formed entry.
    ///
    /// A missing or unparseable config, or a single entry failing to spawn,
    /// degrades to fewer servers, never an error. Returns the number of
    /// active handles.
    pub fn load_tool_servers(&mut self) -> usize {
        let config = load_mcp_config(&self.config_path);

        for (name, spec) in &config.servers {
            match ToolServer::spawn(name, spec) {
                Ok(server) => self.servers.push(server),
                Err(e) => warn!(server = %name, error = %e, "failed to start tool server"),
            }
        }

        info!(active = self.servers.len(), "tool servers ready");
        self.servers.len()
    }

    /// Process one line of user input.
    pub async fn process_turn(&mut self, input: &str) -> TurnOutcome {
        let input = input.trim();
        if input.starts_with('/') {
            return self.handle_command(input);
        }
        TurnOutcome::Reply(self.run_agent_turn(input).await)
    }

    /// Build a fresh agent and run it on one message.
    ///
    /// Any runner failure becomes visible error text that is still recorded
    /// as an exchange, so the error shows up in `/history`.
    async fn run_agent_turn(&mut self, input: &str) -> String {
        let agent = self.build_agent();

        match self.runner.run(&agent, input, MAX_AGENT_TURNS).await {
            Ok(outcome) => {
                helpers::print_usage(&outcome.usage);
                self.session.add_debug_info(&outcome);
                self.session.add_exchange(input, &outcome.final_output);
                outcome.final_output
            }
            Err(e) => {
                warn!(error = %e, "agent run failed");
                let message = format!("Error processing request: {e:#}");
                self.session.add_exchange(input, &message);
                message
            }
        }
    }

    /// Per-turn agent construction: static instructions plus the current
    /// context summary.
    fn build_agent(&self) -> AgentSpec {
        let mut instructions = prompt::concierge_instructions();
        let summary = self.session.get_context_summary();
        if !summary.is_empty() {
            instructions.push_str("\n\n");
            instructions.push_str(&summary);
        }

        AgentSpec {
            name: prompt::AGENT_NAME.to_string(),
            model: self.integration.get_model(),
            instructions,
        }
    }

    /// Dispatch a slash command. Unknown commands point at `/help`.
    fn handle_command(&mut self, command: &str) -> TurnOutcome {
        let cmd = command.trim().to_lowercase();

        match cmd.as_str() {
            "/help" => TurnOutcome::Reply(HELP_TEXT.to_string()),

            "/clear" => {
                self.session.clear();
                TurnOutcome::Reply("Conversation and debug history cleared.".to_string())
            }

            "/history" => TurnOutcome::Reply(self.render_history()),

            "/save" => TurnOutcome::Reply(match self.session.save_history(None) {
                Ok(path) => format!("Conversation history saved to {}", path.display()),
                Err(e) => format!("Failed to save conversation history: {e}"),
            }),

            "/debug" => TurnOutcome::Reply(match self.session.save_debug_history(None) {
                Ok(path) => format!("Debug history saved to {}", path.display()),
                Err(e) => format!("Failed to save debug history: {e}"),
            }),

            "/tools" => TurnOutcome::Reply(self.render_tools()),

            "/quit" | "/exit" => {
                if self.shutting_down {
                    // Repeat quits are a no-op acknowledgment.
                    TurnOutcome::Reply("Already shutting down.".to_string())
                } else {
                    self.shutting_down = true;
                    TurnOutcome::Exit("Exiting chat...".to_string())
                }
            }

            _ => TurnOutcome::Reply(format!(
                "Unknown command: {command}. Type /help for available commands."
            )),
        }
    }

    fn render_history(&self) -> String {
        if self.session.history().is_empty() {
            return "No conversation history yet.".to_string();
        }

        let mut lines = vec!["Recent conversation history:".to_string(), String::new()];
        for (i, exchange) in self.session.history().iter().enumerate() {
            lines.push(format!("{}. User: {}", i + 1, exchange.user));
            lines.push(format!(
                "   Assistant: {}",
                utils::clip_chars(&exchange.response, 200)
            ));
        }
        lines.join("\n")
    }

    fn render_tools(&self) -> String {
        if self.servers.is_empty() {
            return "No tool servers loaded.".to_string();
        }

        let mut lines = vec!["Active tool servers:".to_string()];
        for (i, server) in self.servers.iter().enumerate() {
            lines.push(format!(
                "  {}. {} — {}",
                i + 1,
                server.name(),
                server.command_line()
            ));
        }
        lines.join("\n")
    }

    /// Release every tool server in registration order, then perform the
    /// end-of-session save. Failures are logged per handle and never block
    /// the remaining releases.
    pub async fn shutdown(&mut self) {
        if !self.servers.is_empty() {
            info!(count = self.servers.len(), "releasing tool servers");
            for server in &mut self.servers {
                if let Err(e) = server.shutdown().await {
                    warn!(server = %server.name(), error = %e, "tool server release failed");
                }
            }
            self.servers.clear();
        }

        if !self.session.history().is_empty() {
            match self.session.save_history(None) {
                Ok(path) => info!(path = %path.display(), "conversation saved on exit"),
                Err(e) => warn!(error = %e, "failed to save conversation on exit"),
            }
        }
    }
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────
