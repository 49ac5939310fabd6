//! Shared CLI helpers — banner, response and usage rendering, data paths.

use std::path::{Path, PathBuf};

use colored::Colorize;

use concierge_core::types::UsageInfo;

/// The Concierge data directory (`~/.concierge/`).
pub fn data_path() -> PathBuf {
    dirs_next::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".concierge")
}

/// Print the banner shown at loop start.
pub fn print_banner(config_path: &Path, server_count: usize, max_history: usize) {
    let version = env!("CARGO_PKG_VERSION");
    println!();
    println!("{}  v{}", "🧳 Concierge".cyan().bold(), version.dimmed());
    println!("  {:<14} {}", "Config:".bold(), config_path.display());
    println!("  {:<14} {} loaded", "Tool servers:".bold(), server_count);
    println!("  {:<14} {} exchanges", "Memory:".bold(), max_history);
    println!();
    println!(
        "{}",
        "Type /help for commands, or just start chatting.".dimmed()
    );
    println!();
}

/// Print an agent response to stdout.
pub fn print_response(response: &str) {
    println!();
    println!("{}", "🧳 Concierge".cyan().bold());
    if response.is_empty() {
        println!("{}", "(no response)".dimmed());
    } else {
        println!("{response}");
    }
    println!();
}

/// Print the token-usage block for one agent run.
pub fn print_usage(usage: &UsageInfo) {
    println!();
    println!("{}", "📊 Token usage".bold());
    println!("  {} {}", "Input tokens:".dimmed(), usage.input_tokens);
    println!("  {} {}", "Output tokens:".dimmed(), usage.output_tokens);
    println!("  {} {}", "Total tokens:".dimmed(), usage.total_tokens);
    println!("  {} {}", "Requests:".dimmed(), usage.requests);
}

/// Print a "thinking" placeholder while a run is in flight.
pub fn print_thinking() {
    eprint!("{}", "⠿ thinking...".dimmed());
}

/// Clear the "thinking" placeholder.
pub fn clear_thinking() {
    eprint!("\r{}\r", " ".repeat(40));
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────
