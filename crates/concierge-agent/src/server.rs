//! Tool-server subprocess handles.
//!
//! Each configured entry launches one long-lived child process whose piped
//! stdio is the side channel the agent integration speaks over; the protocol
//! itself is opaque here. `kill_on_drop` guarantees release on every exit
//! path, and [`ToolServer::shutdown`] performs the explicit, ordered release
//! during teardown.

use std::process::Stdio;

use anyhow::{Context, Result};
use tokio::process::{Child, Command};
use tracing::{debug, info};

use concierge_core::config::ServerSpec;

/// A running tool-server subprocess.
#[derive(Debug)]
pub struct ToolServer {
    name: String,
    command_line: String,
    child: Child,
}

impl ToolServer {
    /// Launch the configured command with piped stdio and normalized env.
    pub fn spawn(name: &str, spec: &ServerSpec) -> Result<Self> {
        let child = Command::new(&spec.command)
            .args(&spec.args)
            .envs(spec.normalized_env())
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .with_context(|| {
                format!("failed to start tool server '{name}' ({})", spec.command)
            })?;

        info!(server = name, command = %spec.command, "tool server started");

        let command_line = if spec.args.is_empty() {
            spec.command.clone()
        } else {
            format!("{} {}", spec.command, spec.args.join(" "))
        };

        Ok(ToolServer {
            name: name.to_string(),
            command_line,
            child,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// The launch command line, for `/tools` listings and logs.
    pub fn command_line(&self) -> &str {
        &self.command_line
    }

    /// Stop the subprocess and reap it. Best-effort; an error here must not
    /// block releasing the remaining handles.
    pub async fn shutdown(&mut self) -> Result<()> {
        match self.child.start_kill() {
            Ok(()) => {}
            // InvalidInput means the child already exited.
            Err(e) if e.kind() == std::io::ErrorKind::InvalidInput => {}
            Err(e) => {
                return Err(e)
                    .with_context(|| format!("failed to stop tool server '{}'", self.name));
            }
        }

        let status = self
            .child
            .wait()
            .await
            .with_context(|| format!("failed to reap tool server '{}'", self.name))?;
        debug!(server = %self.name, %status, "tool server stopped");
        Ok(())
    }
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────
