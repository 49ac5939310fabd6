//! Concierge CLI — entry point.
//!
//! Startup order matters: provider selection and credential validation are
//! fatal and happen before any interactive state exists (non-zero exit);
//! config problems only degrade the tool-server set, and the loop starts
//! regardless.

mod driver;
mod helpers;
mod repl;

use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use tracing::info;

use concierge_agent::http_runner::HttpRunner;
use concierge_agent::provider::{Integration, ProviderFlags, ProviderKind};

use crate::driver::Driver;

/// Tool-server configuration file, read from the working directory.
const CONFIG_PATH: &str = "config.json";

/// 🧳 Concierge — an MCP-tooled travel-planning chat agent
#[derive(Parser)]
#[command(name = "concierge", version, about, long_about = None)]
struct Cli {}

#[tokio::main]
async fn main() -> Result<()> {
    let _cli = Cli::parse();
    init_logging();

    // Resolve the provider once; everything downstream receives it
    // explicitly. Both failures here name what to fix and exit non-zero
    // before the loop starts.
    let flags = ProviderFlags::from_env();
    let kind = ProviderKind::resolve(&flags)?;
    let integration = Integration::validate(kind)?;
    integration.print_integration_info();

    info!(provider = integration.display_name(), model = %integration.get_model(), "provider ready");

    let runner = Arc::new(HttpRunner::from_integration(&integration));
    let mut driver = Driver::new(CONFIG_PATH, integration, runner);
    driver.load_tool_servers();

    repl::run(driver).await
}

/// Initialize tracing/logging.
fn init_logging() {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new("warn,concierge_core=info,concierge_agent=info,concierge_cli=info")
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .init();
}
