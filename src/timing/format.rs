//! Display and range helpers for times measured in seconds.

use std::sync::LazyLock;

use regex::Regex;

static MM_SS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d+):(\d{1,2})$").expect("valid regex"));

/// Formats seconds as `MM:SS`, truncating fractions.
///
/// Minutes are not wrapped into hours. Invalid input formats as `00:00`.
///
/// ```
/// use lxcore::timing::format_time;
///
/// assert_eq!(format_time(75.9), "01:15");
/// assert_eq!(format_time(-3.0), "00:00");
/// ```
#[must_use]
#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    reason = "input is finite and non-negative; `as` saturates"
)]
pub fn format_time(seconds: f64) -> String {
    if !seconds.is_finite() || seconds < 0.0 {
        return "00:00".to_string();
    }

    let total = seconds.floor() as u64;
    format!("{:02}:{:02}", total / 60, total % 60)
}

/// Parses an `MM:SS` string into seconds.
///
/// Returns `None` unless both parts are non-negative integers, the seconds
/// part is below 60 and the total fits in a `u64`.
#[must_use]
#[allow(
    clippy::cast_precision_loss,
    reason = "times beyond 2^53 seconds are not meaningful"
)]
pub fn parse_time(text: &str) -> Option<f64> {
    let captures = MM_SS.captures(text.trim())?;
    let minutes: u64 = captures[1].parse().ok()?;
    let seconds: u64 = captures[2].parse().ok()?;

    if seconds >= 60 {
        return None;
    }

    let total = minutes.checked_mul(60)?.checked_add(seconds)?;
    Some(total as f64)
}

/// Formats a duration as hours, minutes and seconds, e.g. `1h 30m 45s`.
///
/// Zero components are omitted; a zero or invalid duration formats as `0s`.
#[must_use]
#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    reason = "input is finite and non-negative; `as` saturates"
)]
pub fn format_duration(seconds: f64) -> String {
    if !seconds.is_finite() || seconds < 0.0 {
        return "0s".to_string();
    }

    let total = seconds.floor() as u64;
    let (hours, minutes, secs) = (total / 3600, (total % 3600) / 60, total % 60);

    let mut parts = Vec::with_capacity(3);
    if hours > 0 {
        parts.push(format!("{hours}h"));
    }
    if minutes > 0 {
        parts.push(format!("{minutes}m"));
    }
    if secs > 0 || parts.is_empty() {
        parts.push(format!("{secs}s"));
    }

    parts.join(" ")
}

/// Whether `start..end` is a non-empty range of non-negative finite times.
#[must_use]
pub const fn is_valid_time_range(start: f64, end: f64) -> bool {
    start.is_finite() && end.is_finite() && start >= 0.0 && end > start
}

/// Length of `start..end`, or `0` if the range is not valid.
#[must_use]
pub const fn calculate_duration(start: f64, end: f64) -> f64 {
    if is_valid_time_range(start, end) {
        end - start
    } else {
        0.0
    }
}

/// Rounds a time to the given number of decimal places.
#[must_use]
pub fn round_time(seconds: f64, decimals: i32) -> f64 {
    let factor = 10_f64.powi(decimals);
    (seconds * factor).round() / factor
}

/// Whether two half-open time ranges overlap.
#[must_use]
pub const fn time_ranges_overlap(a: (f64, f64), b: (f64, f64)) -> bool {
    a.0 < b.1 && b.0 < a.1
}

/// Clamps a time to `min` and, if given, `max`.
#[must_use]
pub fn clamp_time(time: f64, min: f64, max: Option<f64>) -> f64 {
    let lower = time.max(min);
    max.map_or(lower, |max| lower.min(max))
}

#[cfg(test)]
mod tests {
    use test_case::test_case;

    use super::*;

    #[test_case(0.0, "00:00"; "zero")]
    #[test_case(59.99, "00:59"; "truncates")]
    #[test_case(61.0, "01:01"; "over a minute")]
    #[test_case(3725.0, "62:05"; "minutes do not wrap")]
    #[test_case(f64::NAN, "00:00"; "nan")]
    #[test_case(f64::INFINITY, "00:00"; "infinite")]
    fn format_time_cases(seconds: f64, expected: &str) {
        assert_eq!(format_time(seconds), expected);
    }

    #[test_case("01:30", Some(90.0); "minutes and seconds")]
    #[test_case("0:05", Some(5.0); "single digit minutes")]
    #[test_case("120:00", Some(7200.0); "many minutes")]
    #[test_case("01:60", None; "seconds out of range")]
    #[test_case("1:2:3", None; "too many parts")]
    #[test_case("-1:30", None; "negative")]
    #[test_case("ab:cd", None; "not numbers")]
    #[test_case("", None; "empty")]
    #[test_case("307445734561825861:00", None; "minutes overflow")]
    #[test_case("18446744073709551615:00", None; "minutes at u64 max")]
    fn parse_time_cases(text: &str, expected: Option<f64>) {
        assert_eq!(parse_time(text), expected);
    }

    #[test_case(0.0, "0s"; "zero")]
    #[test_case(135.0, "2m 15s"; "minutes")]
    #[test_case(5445.0, "1h 30m 45s"; "hours")]
    #[test_case(3600.0, "1h"; "exact hour")]
    #[test_case(-1.0, "0s"; "negative")]
    fn format_duration_cases(seconds: f64, expected: &str) {
        assert_eq!(format_duration(seconds), expected);
    }

    #[test]
    fn ranges() {
        assert!(is_valid_time_range(1.0, 3.0));
        assert!(!is_valid_time_range(3.0, 3.0));
        assert!(!is_valid_time_range(-1.0, 3.0));
        assert!(!is_valid_time_range(f64::NAN, 3.0));

        assert_eq!(calculate_duration(1.0, 3.0), 2.0);
        assert_eq!(calculate_duration(3.0, 1.0), 0.0);

        assert!(time_ranges_overlap((0.0, 2.0), (1.0, 3.0)));
        assert!(!time_ranges_overlap((0.0, 1.0), (1.0, 2.0)));
    }

    #[test]
    fn rounding_and_clamping() {
        assert_eq!(round_time(1.26, 1), 1.3);
        assert_eq!(round_time(1.24, 1), 1.2);
        assert_eq!(round_time(7.5, 0), 8.0);

        assert_eq!(clamp_time(-2.0, 0.0, None), 0.0);
        assert_eq!(clamp_time(12.0, 0.0, Some(10.0)), 10.0);
        assert_eq!(clamp_time(4.0, 0.0, Some(10.0)), 4.0);
    }
}
