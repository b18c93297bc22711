//! Executor that performs an action by running a configured shell command.
//!
//! The command runs through `sh -c` with the action kind in
//! `CHANGEGATE_ACTION` and the payload JSON in `CHANGEGATE_PAYLOAD`. A zero
//! exit status is success; anything else is a failure carrying stderr.

use crate::executor::{ActionExecutor, BackendProbe};
use crate::registry::ActionKind;
use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use serde_json::Value;
use std::path::PathBuf;
use tokio::process::Command;

/// Output of one command run.
#[derive(Debug)]
pub struct CommandOutput {
    pub stdout: String,
    pub stderr: String,
    pub exit_code: i32,
}

impl CommandOutput {
    /// First non-empty line of stdout, or the exit code.
    pub fn summary(&self) -> String {
        self.stdout
            .lines()
            .map(str::trim)
            .find(|l| !l.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| format!("(exit code: {})", self.exit_code))
    }

    fn failure_message(&self) -> String {
        let stderr = self.stderr.trim();
        if stderr.is_empty() {
            format!("command exited with code {}", self.exit_code)
        } else {
            format!("command exited with code {}: {}", self.exit_code, stderr)
        }
    }
}

/// Runs `command` for every action routed to it.
#[derive(Debug, Clone)]
pub struct CommandExecutor {
    command: String,
    working_dir: Option<PathBuf>,
}

impl CommandExecutor {
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            working_dir: None,
        }
    }

    pub fn in_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_dir = Some(dir.into());
        self
    }

    pub fn command(&self) -> &str {
        &self.command
    }
}

#[async_trait]
impl ActionExecutor for CommandExecutor {
    async fn execute(&self, kind: ActionKind, payload: &Value) -> Result<String> {
        let payload_json = serde_json::to_string(payload).context("Failed to serialize payload")?;
        let output = run_command(
            &self.command,
            self.working_dir.as_ref(),
            &[
                ("CHANGEGATE_ACTION", kind.as_str()),
                ("CHANGEGATE_PAYLOAD", payload_json.as_str()),
            ],
        )
        .await?;

        if output.exit_code != 0 {
            bail!(output.failure_message());
        }
        Ok(output.summary())
    }
}

/// Backend probe that runs a health-check command before a batch.
#[derive(Debug, Clone)]
pub struct CommandProbe {
    command: String,
}

impl CommandProbe {
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
        }
    }
}

#[async_trait]
impl BackendProbe for CommandProbe {
    async fn check(&self) -> Result<()> {
        let output = run_command(&self.command, None, &[]).await?;
        if output.exit_code != 0 {
            bail!("preflight check failed: {}", output.failure_message());
        }
        Ok(())
    }
}

async fn run_command(
    command: &str,
    working_dir: Option<&PathBuf>,
    env: &[(&str, &str)],
) -> Result<CommandOutput> {
    tracing::debug!("Running: {}", command);

    let mut cmd = Command::new("sh");
    cmd.arg("-c").arg(command).kill_on_drop(true);
    if let Some(dir) = working_dir {
        cmd.current_dir(dir);
    }
    for (key, value) in env {
        cmd.env(key, value);
    }

    let output = cmd
        .output()
        .await
        .with_context(|| format!("Failed to execute command: {}", command))?;

    Ok(CommandOutput {
        stdout: String::from_utf8_lossy(&output.stdout).to_string(),
        stderr: String::from_utf8_lossy(&output.stderr).to_string(),
        exit_code: output.status.code().unwrap_or(-1),
    })
}
