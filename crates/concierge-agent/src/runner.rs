//! The agent-runner boundary.
//!
//! Model calls and tool orchestration belong to an external integration;
//! this trait is the narrow interface it must satisfy. The returned
//! [`RunOutcome`] is fully populated by the implementation, so callers never
//! probe for optional attributes.

use anyhow::Result;
use async_trait::async_trait;

use concierge_core::types::RunOutcome;

/// Everything a per-turn agent is built from.
#[derive(Clone, Debug, PartialEq)]
pub struct AgentSpec {
    /// Agent identity.
    pub name: String,
    /// Provider-qualified model identifier, e.g. `"openai/gpt-4o-mini"`.
    pub model: String,
    /// Complete instruction text, including any spliced context summary.
    pub instructions: String,
}

/// An integration that runs one agent turn to completion.
#[async_trait]
pub trait AgentRunner: Send + Sync {
    /// Run the agent on one user message.
    ///
    /// `max_turns` caps the internal tool-call iterations; implementations
    /// must terminate once it is reached and surface whatever partial
    /// result exists.
    async fn run(&self, agent: &AgentSpec, input: &str, max_turns: u32) -> Result<RunOutcome>;

    /// Display name for logging.
    fn display_name(&self) -> &str;
}
