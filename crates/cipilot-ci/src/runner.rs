//! Test command execution with captured, color-stripped output.

use crate::stage::StageConfig;
use cipilot_core::{strip_ansi, CipilotError, Result};
use std::path::Path;
use std::process::Stdio;
use std::time::Instant;
use tokio::process::Command;
use tracing::debug;

/// Result of one test-command execution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestResult {
    /// Whether the command exited with code 0.
    pub passed: bool,

    /// Exit code (-1 when terminated by a signal).
    pub exit_code: i32,

    /// Stdout followed by stderr, ANSI sequences removed.
    pub combined_output: String,

    /// Duration in milliseconds.
    pub duration_ms: u64,
}

/// Runs the configured test command.
pub struct TestRunner;

impl TestRunner {
    /// Execute `config` in `workdir` and capture its output.
    ///
    /// A non-zero exit is a normal failed result. Only failing to spawn the
    /// command (or hitting a configured timeout) is an error.
    pub async fn run(config: &StageConfig, workdir: &Path) -> Result<TestResult> {
        let start = Instant::now();

        let (exe, args) = config.command.split_first().ok_or_else(|| CipilotError::Command {
            command: config.name.clone(),
            reason: "empty command".to_string(),
        })?;

        debug!(stage = %config.name, command = %config.display_command(), "Spawning test command");

        let child = Command::new(exe)
            .args(args)
            .current_dir(workdir)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| CipilotError::Command {
                command: config.display_command(),
                reason: e.to_string(),
            })?;

        let output = if config.timeout_secs > 0 {
            tokio::time::timeout(
                std::time::Duration::from_secs(config.timeout_secs),
                child.wait_with_output(),
            )
            .await
            .map_err(|_| CipilotError::Command {
                command: config.display_command(),
                reason: format!("timed out after {} seconds", config.timeout_secs),
            })??
        } else {
            child.wait_with_output().await?
        };

        let duration_ms = start.elapsed().as_millis() as u64;
        let mut combined = String::from_utf8_lossy(&output.stdout).into_owned();
        combined.push_str(&String::from_utf8_lossy(&output.stderr));

        Ok(TestResult {
            passed: output.status.success(),
            exit_code: output.status.code().unwrap_or(-1),
            combined_output: strip_ansi(&combined),
            duration_ms,
        })
    }
}
