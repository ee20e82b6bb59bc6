use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

// ──────────────────── Task Types ────────────────────

/// The five raw schedule fields of a cron entry.
///
/// Fields are kept as the raw expression strings (`*`, `*/5`, `1-5`, `0,30`,
/// plain numbers); validation lives in the schedule crate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Schedule {
    pub minute: String,
    pub hour: String,
    pub day: String,
    pub month: String,
    pub weekday: String,
}

impl Schedule {
    pub fn new(
        minute: impl Into<String>,
        hour: impl Into<String>,
        day: impl Into<String>,
        month: impl Into<String>,
        weekday: impl Into<String>,
    ) -> Self {
        Self {
            minute: minute.into(),
            hour: hour.into(),
            day: day.into(),
            month: month.into(),
            weekday: weekday.into(),
        }
    }

    /// The five fields in positional order (minute first).
    pub fn fields(&self) -> [&str; 5] {
        [
            &self.minute,
            &self.hour,
            &self.day,
            &self.month,
            &self.weekday,
        ]
    }
}

impl fmt::Display for Schedule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {} {} {}",
            self.minute, self.hour, self.day, self.month, self.weekday
        )
    }
}

/// Reconciliation status of a live table entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    /// Command text matches an entry already present in the local table.
    Known,
    /// Present in the live table, absent from the local table.
    Unknown,
}

/// One scheduled job, parsed from a table line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    /// 0-based line position at parse time. This is the identity handle for
    /// update/delete and is NOT stable across any operation that changes
    /// line count or ordering.
    pub index: usize,
    pub schedule: Schedule,
    /// Raw shell command, with the ownership marker stripped.
    pub command: String,
    /// Human-readable rendering of the schedule; regenerated on every parse,
    /// never persisted.
    pub description: String,
    /// Set only by the reconciler when tagging live entries.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<TaskStatus>,
}

// ──────────────────── Execution Types ────────────────────

/// Outcome of one command run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ExecutionStatus {
    Success,
    Failed,
}

impl ExecutionStatus {
    pub fn from_exit_code(exit_code: i32) -> Self {
        if exit_code == 0 {
            Self::Success
        } else {
            Self::Failed
        }
    }
}

/// How an execution record entered the log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExecutionSource {
    /// Run directly through the executor.
    Manual,
    /// Reported by the out-of-process wrapper script.
    External,
}

/// Result of one command run, one JSON object per execution-log line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionRecord {
    /// Local time, `%Y-%m-%d %H:%M:%S` wire format.
    pub timestamp: String,
    pub task_id: String,
    pub command: String,
    pub exit_code: i32,
    /// Seconds, rounded to 3 decimals.
    pub duration: f64,
    /// Captured stdout, truncated to 1000 characters.
    pub output: String,
    /// Captured stderr, truncated to 1000 characters.
    pub error: String,
    pub status: ExecutionStatus,
    pub source: ExecutionSource,
}

// ──────────────────── Statistics Types ────────────────────

/// Per-command execution breakdown.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CommandStats {
    pub total: u64,
    pub success: u64,
    pub failed: u64,
    pub avg_duration: f64,
    pub success_rate: f64,
}

/// Per-day execution counts for the trend map.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DayTrend {
    pub total: u64,
    pub success: u64,
    pub failed: u64,
}

/// Windowed statistics over the execution log.
///
/// All percentage/average fields are `0` when their denominator is zero.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExecutionStats {
    pub total_executions: u64,
    pub successful_executions: u64,
    pub failed_executions: u64,
    /// Percent, one decimal.
    pub success_rate: f64,
    /// Seconds, three decimals.
    pub average_duration: f64,
    pub commands: BTreeMap<String, CommandStats>,
    /// Most recent failures in the window, capped at 10.
    pub recent_failures: Vec<ExecutionRecord>,
    /// Keyed by calendar date (`YYYY-MM-DD`) of the record timestamp.
    pub execution_trend: BTreeMap<String, DayTrend>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schedule_display() {
        let s = Schedule::new("*/5", "*", "1", "*", "0");
        assert_eq!(s.to_string(), "*/5 * 1 * 0");
        assert_eq!(s.fields(), ["*/5", "*", "1", "*", "0"]);
    }

    #[test]
    fn test_execution_status_wire_format() {
        assert_eq!(
            serde_json::to_string(&ExecutionStatus::Success).unwrap(),
            "\"SUCCESS\""
        );
        assert_eq!(
            serde_json::to_string(&ExecutionStatus::Failed).unwrap(),
            "\"FAILED\""
        );
        assert_eq!(ExecutionStatus::from_exit_code(0), ExecutionStatus::Success);
        assert_eq!(ExecutionStatus::from_exit_code(3), ExecutionStatus::Failed);
        assert_eq!(ExecutionStatus::from_exit_code(-1), ExecutionStatus::Failed);
    }

    #[test]
    fn test_execution_record_serde() {
        let record = ExecutionRecord {
            timestamp: "2024-05-01 12:00:00".into(),
            task_id: "abc123".into(),
            command: "echo hi".into(),
            exit_code: 0,
            duration: 0.123,
            output: "hi\n".into(),
            error: String::new(),
            status: ExecutionStatus::Success,
            source: ExecutionSource::Manual,
        };
        let json = serde_json::to_string(&record).unwrap();
        assert!(json.contains("\"status\":\"SUCCESS\""));
        assert!(json.contains("\"source\":\"manual\""));
        let parsed: ExecutionRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, record);
    }

    #[test]
    fn test_task_status_omitted_outside_reconciliation() {
        let task = Task {
            index: 0,
            schedule: Schedule::new("*", "*", "*", "*", "*"),
            command: "echo hi".into(),
            description: "every minute".into(),
            status: None,
        };
        let json = serde_json::to_string(&task).unwrap();
        assert!(!json.contains("status"));

        let tagged = Task {
            status: Some(TaskStatus::Unknown),
            ..task
        };
        let json = serde_json::to_string(&tagged).unwrap();
        assert!(json.contains("\"status\":\"unknown\""));
    }

    #[test]
    fn test_stats_default_is_zeroed() {
        let stats = ExecutionStats::default();
        assert_eq!(stats.total_executions, 0);
        assert_eq!(stats.success_rate, 0.0);
        assert_eq!(stats.average_duration, 0.0);
        assert!(stats.commands.is_empty());
        assert!(stats.execution_trend.is_empty());
    }
}
