//! Execution log: newline-delimited JSON, append-only.

use std::fs::OpenOptions;
use std::io::{ErrorKind, Write};
use std::path::Path;

use fs2::FileExt;
use sha2::{Digest, Sha256};

use cronman_types::ExecutionRecord;

use crate::Result;

/// Output and error text cap per record, in characters.
pub const OUTPUT_CAP: usize = 1000;

/// How many trailing log records a statistics pass scans at most.
pub const SCAN_WINDOW: usize = 1000;

/// Append one record as a single JSON line. The write happens as one call
/// under an exclusive lock so concurrent executors never interleave a
/// record.
pub fn append_record(log_path: &Path, record: &ExecutionRecord) -> Result<()> {
    if let Some(parent) = log_path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let mut line = serde_json::to_string(record)?;
    line.push('\n');

    let file = OpenOptions::new().create(true).append(true).open(log_path)?;
    file.lock_exclusive()?;
    (&file).write_all(line.as_bytes())?;
    Ok(())
}

/// The last `limit` records, most recent first. Blank and unparsable lines
/// are skipped, never an error — partial history beats no history.
pub fn read_records(log_path: &Path, limit: usize) -> Result<Vec<ExecutionRecord>> {
    let content = match std::fs::read_to_string(log_path) {
        Ok(content) => content,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(e.into()),
    };

    let lines: Vec<&str> = content.lines().collect();
    let start = lines.len().saturating_sub(limit);
    Ok(lines[start..]
        .iter()
        .rev()
        .filter_map(|line| serde_json::from_str(line).ok())
        .collect())
}

/// Truncate captured output to the per-record cap.
pub fn truncate_output(text: &str) -> String {
    text.chars().take(OUTPUT_CAP).collect()
}

/// Deterministic task ID for records without a caller-supplied one:
/// derived from the command and the current unix second.
pub fn derive_task_id(command: &str) -> String {
    let now = chrono::Local::now().timestamp();
    let digest = Sha256::digest(format!("{command}{now}"));
    hex::encode(digest)[..32].to_string()
}

/// Current local time in the record wire format.
pub fn now_stamp() -> String {
    chrono::Local::now().format("%Y-%m-%d %H:%M:%S").to_string()
}

/// Round a duration to the 3-decimal wire precision.
pub fn round_duration(seconds: f64) -> f64 {
    (seconds * 1000.0).round() / 1000.0
}
