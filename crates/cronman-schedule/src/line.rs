//! Task line codec: crontab line ↔ [`Task`], plus the schedule description
//! generator and ownership-marker handling.

use cronman_types::{Schedule, Task};

/// Trailing comment tag identifying lines this system manages.
pub const OWNERSHIP_MARKER: &str = "# cronmanager";

const DAY_NAMES: [&str; 7] = ["Sun", "Mon", "Tue", "Wed", "Thu", "Fri", "Sat"];

/// Parse one raw table line into a [`Task`].
///
/// Returns `None` for blank lines, comment lines, and lines with fewer than
/// six whitespace-delimited tokens (5 schedule fields + command). The
/// command is the untouched remainder of the line, never re-split, with the
/// ownership marker stripped.
pub fn parse_line(line: &str, index: usize) -> Option<Task> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return None;
    }

    let mut fields = [""; 5];
    let mut rest = line;
    for slot in &mut fields {
        rest = rest.trim_start();
        let end = rest.find(char::is_whitespace)?;
        *slot = &rest[..end];
        rest = &rest[end..];
    }
    let command = strip_marker(rest.trim());
    if command.is_empty() {
        return None;
    }

    let schedule = Schedule::new(fields[0], fields[1], fields[2], fields[3], fields[4]);
    let description = describe(&schedule);
    Some(Task {
        index,
        schedule,
        command: command.to_string(),
        description,
        status: None,
    })
}

/// Parse a full table snapshot into tasks.
///
/// Task indices are raw 0-based line numbers, so they stay usable as
/// update/delete handles against the same snapshot. Unparsable lines are
/// dropped silently.
pub fn parse_table(content: &str) -> Vec<Task> {
    content
        .lines()
        .enumerate()
        .filter_map(|(i, line)| parse_line(line, i))
        .collect()
}

/// Serialize a schedule + command into a table line carrying the ownership
/// marker. A marker already present in the command is not duplicated.
pub fn serialize_line(schedule: &Schedule, command: &str) -> String {
    let command = command.trim();
    if command.contains(OWNERSHIP_MARKER) {
        format!("{schedule} {command}")
    } else {
        format!("{schedule} {command} {OWNERSHIP_MARKER}")
    }
}

/// Strip a trailing ownership marker from a command string.
pub fn strip_marker(command: &str) -> &str {
    match command.strip_suffix(OWNERSHIP_MARKER) {
        Some(head) => head.trim_end(),
        None => command,
    }
}

/// Append the ownership marker to a line unless it already carries one.
pub fn ensure_marker(line: &str) -> String {
    let line = line.trim();
    if line.contains(OWNERSHIP_MARKER) {
        line.to_string()
    } else {
        format!("{line} {OWNERSHIP_MARKER}")
    }
}

/// Render a deterministic natural-language description of a schedule,
/// e.g. `"every 5 minutes, at hour 3, on Mon"`.
pub fn describe(schedule: &Schedule) -> String {
    let mut parts = Vec::new();

    let minute = schedule.minute.as_str();
    if minute == "*" {
        parts.push("every minute".to_string());
    } else if let Some((_, step)) = minute.split_once('/') {
        parts.push(format!("every {step} minutes"));
    } else {
        parts.push(format!("at minute {minute}"));
    }

    let hour = schedule.hour.as_str();
    if hour != "*" {
        if let Some((_, step)) = hour.split_once('/') {
            parts.push(format!("every {step} hours"));
        } else {
            parts.push(format!("at hour {hour}"));
        }
    }

    if schedule.day != "*" {
        parts.push(format!("on day {}", schedule.day));
    }

    if schedule.month != "*" {
        parts.push(format!("in month {}", schedule.month));
    }

    let weekday = schedule.weekday.as_str();
    if weekday != "*" {
        let name = match weekday.parse::<usize>() {
            Ok(n) => DAY_NAMES
                .get(n)
                .map_or_else(|| format!("day {n}"), ToString::to_string),
            Err(_) => weekday.to_string(),
        };
        parts.push(format!("on {name}"));
    }

    parts.join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_basic_line() {
        let task = parse_line("*/5 * * * * echo hi", 3).unwrap();
        assert_eq!(task.index, 3);
        assert_eq!(task.schedule.minute, "*/5");
        assert_eq!(task.command, "echo hi");
        assert_eq!(task.description, "every 5 minutes");
        assert!(task.status.is_none());
    }

    #[test]
    fn test_parse_skips_blanks_and_comments() {
        assert!(parse_line("", 0).is_none());
        assert!(parse_line("   ", 0).is_none());
        assert!(parse_line("# MAILTO=root", 0).is_none());
        assert!(parse_line("  # indented comment", 0).is_none());
    }

    #[test]
    fn test_parse_requires_six_tokens() {
        assert!(parse_line("* * * * *", 0).is_none());
        assert!(parse_line("* * *", 0).is_none());
    }

    #[test]
    fn test_command_never_resplit() {
        let task = parse_line("0 0 * * * /bin/sh -c 'echo  two  spaces'", 0).unwrap();
        assert_eq!(task.command, "/bin/sh -c 'echo  two  spaces'");
    }

    #[test]
    fn test_parse_strips_marker() {
        let task = parse_line("* * * * * echo a # cronmanager", 0).unwrap();
        assert_eq!(task.command, "echo a");
    }

    #[test]
    fn test_roundtrip_modulo_marker() {
        let line = "0,30 9-17 * * 1-5 /usr/local/bin/backup.sh --fast";
        let task = parse_line(line, 0).unwrap();
        let serialized = serialize_line(&task.schedule, &task.command);
        assert_eq!(serialized, format!("{line} {OWNERSHIP_MARKER}"));
        // Parsing the serialized form yields identical fields and command.
        let reparsed = parse_line(&serialized, 0).unwrap();
        assert_eq!(reparsed.schedule, task.schedule);
        assert_eq!(reparsed.command, task.command);
    }

    #[test]
    fn test_serialize_does_not_duplicate_marker() {
        let schedule = Schedule::new("*", "*", "*", "*", "*");
        let line = serialize_line(&schedule, "echo a # cronmanager");
        assert_eq!(line.matches(OWNERSHIP_MARKER).count(), 1);
    }

    #[test]
    fn test_ensure_marker() {
        assert_eq!(ensure_marker("* * * * * echo a"), "* * * * * echo a # cronmanager");
        assert_eq!(
            ensure_marker("* * * * * echo a # cronmanager"),
            "* * * * * echo a # cronmanager"
        );
    }

    #[test]
    fn test_parse_table_indices_are_line_numbers() {
        let content = "# header\n* * * * * echo a\n\n0 0 * * * echo b\nnot a cron line\n";
        let tasks = parse_table(content);
        assert_eq!(tasks.len(), 2);
        assert_eq!(tasks[0].index, 1);
        assert_eq!(tasks[1].index, 3);
    }

    #[test]
    fn test_describe_fragments() {
        let every = Schedule::new("*", "*", "*", "*", "*");
        assert_eq!(describe(&every), "every minute");

        let s = Schedule::new("30", "*/2", "1", "6", "5");
        assert_eq!(
            describe(&s),
            "at minute 30, every 2 hours, on day 1, in month 6, on Fri"
        );

        let sunday = Schedule::new("0", "0", "*", "*", "0");
        assert_eq!(describe(&sunday), "at minute 0, at hour 0, on Sun");

        // Weekday 7 has no short-name mapping and falls back to the literal.
        let seven = Schedule::new("0", "0", "*", "*", "7");
        assert_eq!(describe(&seven), "at minute 0, at hour 0, on day 7");

        let named = Schedule::new("0", "0", "*", "*", "mon");
        assert_eq!(describe(&named), "at minute 0, at hour 0, on mon");
    }
}
