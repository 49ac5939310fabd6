//! Interactive chat loop.
//!
//! `rustyline` for readline-style editing with persistent input history.
//! Ctrl-C and Ctrl-D leave the loop; shutdown always runs afterwards.

use anyhow::Result;
use rustyline::config::Configurer;
use rustyline::history::DefaultHistory;
use rustyline::{DefaultEditor, Editor};
use tracing::debug;

use crate::driver::{Driver, TurnOutcome};
use crate::helpers;

/// Run the interactive loop until exit, then shut the driver down.
pub async fn run(mut driver: Driver) -> Result<()> {
    helpers::print_banner(
        driver.config_path(),
        driver.server_count(),
        driver.session().max_history(),
    );

    let mut editor = create_editor()?;

    loop {
        let line = match editor.readline("You: ") {
            Ok(line) => line,
            Err(rustyline::error::ReadlineError::Interrupted) => {
                // Ctrl-C — exit cleanly
                break;
            }
            Err(rustyline::error::ReadlineError::Eof) => {
                // Ctrl-D — exit cleanly
                break;
            }
            Err(e) => {
                eprintln!("Input error: {e}");
                break;
            }
        };

        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }

        let _ = editor.add_history_entry(&line);

        debug!(input = trimmed, "processing input");
        helpers::print_thinking();
        let outcome = driver.process_turn(trimmed).await;
        helpers::clear_thinking();

        match outcome {
            TurnOutcome::Reply(text) => helpers::print_response(&text),
            TurnOutcome::Exit(text) => {
                helpers::print_response(&text);
                break;
            }
        }
    }

    save_input_history(&mut editor);
    driver.shutdown().await;

    println!("\nGoodbye! 👋");
    Ok(())
}

/// Create a rustyline editor with persistent history.
fn create_editor() -> Result<Editor<(), DefaultHistory>> {
    let mut editor = DefaultEditor::new()?;
    editor.set_max_history_size(1000)?;

    let history_path = input_history_path();
    if history_path.exists() {
        let _ = editor.load_history(&history_path);
        debug!("loaded input history from {}", history_path.display());
    }

    Ok(editor)
}

/// Save the line-editor history to disk.
fn save_input_history(editor: &mut Editor<(), DefaultHistory>) {
    let path = input_history_path();
    if let Some(parent) = path.parent() {
        let _ = std::fs::create_dir_all(parent);
    }
    if let Err(e) = editor.save_history(&path) {
        debug!("failed to save input history: {e}");
    }
}

/// Path to the line-editor history file.
fn input_history_path() -> std::path::PathBuf {
    helpers::data_path().join("history").join("cli_history")
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn input_history_path_under_data_dir() {
        let path = input_history_path();
        assert!(path.to_string_lossy().contains(".concierge"));
        assert!(path.to_string_lossy().contains("cli_history"));
    }
}
