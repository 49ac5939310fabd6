//! Concierge agent layer — provider selection and the external-agent boundary.
//!
//! This crate contains:
//! - **provider**: mutually-exclusive provider flags, credential validation,
//!   and the `Integration` handed to the driver
//! - **prompt**: the static instruction builder
//! - **runner**: the narrow `AgentRunner` interface the agent integration
//!   must satisfy
//! - **http_runner**: the default runner speaking the OpenAI-compatible
//!   chat-completions wire format
//! - **server**: tool-server subprocess handles (spawn + scoped release)

pub mod http_runner;
pub mod prompt;
pub mod provider;
pub mod runner;
pub mod server;

pub use http_runner::HttpRunner;
pub use provider::{Integration, ProviderError, ProviderFlags, ProviderKind};
pub use runner::{AgentRunner, AgentSpec};
pub use server::ToolServer;
