//! Schedule field validation.

/// Inclusive ranges for the five positional fields: minute, hour,
/// day-of-month, month, weekday (0 and 7 both denote Sunday).
pub const FIELD_RANGES: [(u32, u32); 5] = [(0, 59), (0, 23), (1, 31), (1, 12), (0, 7)];

/// Validate a single schedule field expression against an inclusive range.
///
/// Grammar (recursive): `*` is always valid; `a-b` requires numeric bounds
/// with `min <= a <= b <= max`; `a,b,...` requires every part to validate;
/// `expr/n` requires `expr` to validate and `n` to be numeric (the step is
/// not range-checked); a plain number must fall inside the range.
pub fn validate_field(field: &str, min: u32, max: u32) -> bool {
    if field == "*" {
        return true;
    }

    if let Some((expr, step)) = field.split_once('/') {
        if step.contains('/') {
            return false;
        }
        return validate_field(expr, min, max) && step.parse::<u32>().is_ok();
    }

    if let Some((lo, hi)) = field.split_once('-') {
        let (Ok(lo), Ok(hi)) = (lo.parse::<u32>(), hi.parse::<u32>()) else {
            return false;
        };
        return lo >= min && hi <= max && lo <= hi;
    }

    if field.contains(',') {
        return field
            .split(',')
            .all(|part| validate_field(part.trim(), min, max));
    }

    field.parse::<u32>().is_ok_and(|n| n >= min && n <= max)
}

/// Validate a full 5-field schedule expression.
pub fn validate_schedule(schedule: &str) -> bool {
    let parts: Vec<&str> = schedule.split_whitespace().collect();
    if parts.len() != 5 {
        return false;
    }

    parts
        .iter()
        .zip(FIELD_RANGES)
        .all(|(part, (min, max))| validate_field(part, min, max))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wildcard_always_valid() {
        assert!(validate_field("*", 0, 59));
        assert!(validate_field("*", 1, 12));
    }

    #[test]
    fn test_plain_number_range() {
        assert!(validate_field("0", 0, 59));
        assert!(validate_field("59", 0, 59));
        assert!(!validate_field("60", 0, 59));
        assert!(!validate_field("25", 0, 23));
        assert!(!validate_field("0", 1, 31));
        assert!(!validate_field("-1", 0, 59));
        assert!(!validate_field("abc", 0, 59));
    }

    #[test]
    fn test_range_expression() {
        assert!(validate_field("1-5", 0, 7));
        assert!(validate_field("0-59", 0, 59));
        assert!(!validate_field("5-1", 0, 59));
        assert!(!validate_field("0-60", 0, 59));
        assert!(!validate_field("1-2-3", 0, 59));
        assert!(!validate_field("a-b", 0, 59));
    }

    #[test]
    fn test_list_expression() {
        assert!(validate_field("1,2,3", 0, 59));
        assert!(validate_field("0, 30", 0, 59));
        assert!(!validate_field("1,99", 0, 59));
        assert!(!validate_field("1,,2", 0, 59));
    }

    #[test]
    fn test_step_expression() {
        assert!(validate_field("*/5", 0, 59));
        assert!(validate_field("0-30/5", 0, 59));
        // Step size itself is not range-checked.
        assert!(validate_field("*/120", 0, 59));
        assert!(!validate_field("*/x", 0, 59));
        assert!(!validate_field("*/5/2", 0, 59));
    }

    #[test]
    fn test_full_schedule() {
        assert!(validate_schedule("* * * * *"));
        assert!(validate_schedule("*/5 0 1 1 0"));
        assert!(validate_schedule("0,30 9-17 * * 1-5"));
        // Both 0 and 7 denote Sunday.
        assert!(validate_schedule("0 0 * * 7"));
        assert!(!validate_schedule("* * * *"));
        assert!(!validate_schedule("* * * * * *"));
        assert!(!validate_schedule("60 * * * *"));
        assert!(!validate_schedule("* 25 * * *"));
        assert!(!validate_schedule("* * 0 * *"));
        assert!(!validate_schedule("* * * 13 *"));
        assert!(!validate_schedule("* * * * 8"));
    }
}
