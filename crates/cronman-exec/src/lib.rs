//! cronman-exec: command execution, execution-history tracking, and
//! statistics.
//!
//! The [`Executor`](runner::Executor) runs a shell command synchronously
//! from the caller's point of view, captures stdout/stderr/exit code and
//! wall-clock duration, and unconditionally appends one structured record
//! to the newline-delimited JSON execution log. The history module derives
//! windowed statistics from the accumulated records. The apikey/wrapper
//! modules serve the out-of-process tracking collaborator.

pub mod apikey;
pub mod history;
pub mod log;
pub mod runner;
pub mod wrapper;

pub use history::statistics;
pub use log::{append_record, read_records};
pub use runner::{ExecutionResult, Executor, ExternalExecution};

#[derive(Debug, thiserror::Error)]
pub enum ExecError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("missing required field: {0}")]
    Validation(&'static str),
    #[error("record serialization failed: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, ExecError>;
