//! Windowed statistics over the execution log.

use std::collections::BTreeMap;
use std::path::Path;

use chrono::NaiveDateTime;

use cronman_types::{ExecutionStats, ExecutionStatus};

use crate::Result;
use crate::log::{SCAN_WINDOW, read_records, round_duration};

/// How many recent failures a statistics result carries at most.
pub const RECENT_FAILURES_CAP: usize = 10;

/// Aggregate the last [`SCAN_WINDOW`] records into windowed statistics,
/// discarding records older than `window_days`. Records with unparsable
/// timestamps are skipped. Every ratio is 0 when its denominator is 0.
pub fn statistics(log_path: &Path, window_days: i64) -> Result<ExecutionStats> {
    statistics_at(log_path, window_days, chrono::Local::now().naive_local())
}

/// Same as [`statistics`] with an explicit "now", for deterministic tests.
pub fn statistics_at(
    log_path: &Path,
    window_days: i64,
    now: NaiveDateTime,
) -> Result<ExecutionStats> {
    let records = read_records(log_path, SCAN_WINDOW)?;
    let cutoff = now - chrono::Duration::days(window_days);

    let mut stats = ExecutionStats::default();
    let mut total_duration = 0.0;
    let mut command_durations: BTreeMap<String, f64> = BTreeMap::new();

    // Records arrive most recent first, so the first failures seen are the
    // most recent ones.
    for record in &records {
        let Ok(timestamp) = NaiveDateTime::parse_from_str(&record.timestamp, "%Y-%m-%d %H:%M:%S")
        else {
            continue;
        };
        if timestamp < cutoff {
            continue;
        }

        stats.total_executions += 1;
        total_duration += record.duration;

        let success = record.status == ExecutionStatus::Success;
        if success {
            stats.successful_executions += 1;
        } else {
            stats.failed_executions += 1;
            if stats.recent_failures.len() < RECENT_FAILURES_CAP {
                stats.recent_failures.push(record.clone());
            }
        }

        let command = stats.commands.entry(record.command.clone()).or_default();
        command.total += 1;
        if success {
            command.success += 1;
        } else {
            command.failed += 1;
        }
        *command_durations.entry(record.command.clone()).or_insert(0.0) += record.duration;

        let day = stats
            .execution_trend
            .entry(timestamp.date().format("%Y-%m-%d").to_string())
            .or_default();
        day.total += 1;
        if success {
            day.success += 1;
        } else {
            day.failed += 1;
        }
    }

    if stats.total_executions > 0 {
        let total = stats.total_executions as f64;
        stats.average_duration = round_duration(total_duration / total);
        stats.success_rate = round_percent(stats.successful_executions as f64 * 100.0 / total);
    }
    for (command, command_stats) in &mut stats.commands {
        let total = command_stats.total as f64;
        command_stats.avg_duration =
            round_duration(command_durations.get(command).copied().unwrap_or(0.0) / total);
        command_stats.success_rate = round_percent(command_stats.success as f64 * 100.0 / total);
    }

    Ok(stats)
}

/// Round a percentage to the 1-decimal wire precision.
fn round_percent(percent: f64) -> f64 {
    (percent * 10.0).round() / 10.0
}
