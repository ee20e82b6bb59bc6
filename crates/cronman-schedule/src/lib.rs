//! cronman-schedule: cron schedule validation and task-line codec.
//!
//! Pure string processing: validates the five schedule fields, parses raw
//! crontab lines into [`Task`] records, serializes tasks back to lines with
//! the ownership marker, and renders human-readable schedule descriptions.

pub mod field;
pub mod line;

pub use field::{FIELD_RANGES, validate_field, validate_schedule};
pub use line::{
    OWNERSHIP_MARKER, describe, ensure_marker, parse_line, parse_table, serialize_line,
    strip_marker,
};
