//! Command execution and external-execution tracking.

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::{Duration, Instant};

use serde::Deserialize;
use tracing::info;

use cronman_types::{ExecutionRecord, ExecutionSource, ExecutionStatus};

use crate::log::{append_record, derive_task_id, now_stamp, round_duration, truncate_output};
use crate::{ExecError, Result};

/// Exit code reserved for "process failed to start" (and for a timed-out
/// run); distinct from anything a command itself can return.
pub const SPAWN_FAILURE_EXIT_CODE: i32 = -1;

/// What a manual run returns to its caller.
#[derive(Debug, Clone)]
pub struct ExecutionResult {
    pub exit_code: i32,
    /// Seconds, 3 decimals.
    pub duration: f64,
    pub output: String,
    pub error: String,
    pub success: bool,
}

/// Caller-supplied payload from the out-of-process wrapper script.
/// `task_id`, `command`, `status` and `duration` are required.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ExternalExecution {
    pub task_id: Option<String>,
    pub command: Option<String>,
    /// `"success"` or `"failed"`.
    pub status: Option<String>,
    pub exit_code: Option<i32>,
    pub duration: Option<f64>,
    #[serde(default)]
    pub output: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

/// Runs commands and appends their execution records.
pub struct Executor {
    log_path: PathBuf,
    timeout: Option<Duration>,
}

impl Executor {
    pub fn new(log_path: &Path) -> Self {
        Self {
            log_path: log_path.to_path_buf(),
            timeout: None,
        }
    }

    /// Bound a run's wall-clock time. Without this, a misbehaving command
    /// blocks its caller indefinitely.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Run a shell command, capture its output, and append one execution
    /// record regardless of outcome. Success means exit code 0.
    pub async fn run(&self, command: &str) -> Result<ExecutionResult> {
        let start = Instant::now();

        let mut cmd = tokio::process::Command::new("sh");
        cmd.arg("-c")
            .arg(command)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        let outcome = match self.timeout {
            Some(timeout) => tokio::time::timeout(timeout, cmd.output())
                .await
                .map_err(|_| timeout),
            None => Ok(cmd.output().await),
        };

        let (exit_code, output, error) = match outcome {
            Ok(Ok(out)) => (
                out.status.code().unwrap_or(SPAWN_FAILURE_EXIT_CODE),
                String::from_utf8_lossy(&out.stdout).into_owned(),
                String::from_utf8_lossy(&out.stderr).into_owned(),
            ),
            Ok(Err(e)) => (
                SPAWN_FAILURE_EXIT_CODE,
                String::new(),
                format!("Failed to start process: {e}"),
            ),
            Err(timeout) => (
                SPAWN_FAILURE_EXIT_CODE,
                String::new(),
                format!("Command timed out after {}s", timeout.as_secs()),
            ),
        };

        let duration = round_duration(start.elapsed().as_secs_f64());
        let record = ExecutionRecord {
            timestamp: now_stamp(),
            task_id: derive_task_id(command),
            command: command.to_string(),
            exit_code,
            duration,
            output: truncate_output(&output),
            error: truncate_output(&error),
            status: ExecutionStatus::from_exit_code(exit_code),
            source: ExecutionSource::Manual,
        };
        append_record(&self.log_path, &record)?;

        info!(exit_code, duration, "Executed command: {command}");
        Ok(ExecutionResult {
            exit_code,
            duration,
            output,
            error,
            success: exit_code == 0,
        })
    }

    /// Record an execution reported by the wrapper script. Missing required
    /// fields fail validation and append nothing.
    pub fn track_external(&self, payload: &ExternalExecution) -> Result<ExecutionRecord> {
        let task_id = require(payload.task_id.as_deref(), "task_id")?;
        let command = require(payload.command.as_deref(), "command")?;
        let status = require(payload.status.as_deref(), "status")?;
        let duration = payload
            .duration
            .ok_or(ExecError::Validation("duration"))?;

        let exit_code = if status == "success" {
            0
        } else {
            payload.exit_code.unwrap_or(1)
        };

        let record = ExecutionRecord {
            timestamp: now_stamp(),
            task_id: task_id.to_string(),
            command: command.to_string(),
            exit_code,
            duration: round_duration(duration),
            output: truncate_output(payload.output.as_deref().unwrap_or_default()),
            error: truncate_output(payload.error.as_deref().unwrap_or_default()),
            status: ExecutionStatus::from_exit_code(exit_code),
            source: ExecutionSource::External,
        };
        append_record(&self.log_path, &record)?;
        Ok(record)
    }
}

fn require<'a>(value: Option<&'a str>, field: &'static str) -> Result<&'a str> {
    value
        .filter(|v| !v.is_empty())
        .ok_or(ExecError::Validation(field))
}
