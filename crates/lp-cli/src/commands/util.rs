//! Shared utilities for CLI commands.

use std::sync::LazyLock;

use anyhow::Context;
use chrono::{Duration, NaiveDate, NaiveDateTime};
use regex::Regex;

/// Pre-compiled regex for relative date parsing.
static RELATIVE_DATE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d+)\s+(day|week)s?\s+(ago|ahead)$").unwrap());

/// Conservative bounds for relative date parsing (~1000 years in days).
const MAX_RELATIVE_DAYS: i64 = 1000 * 365;

/// Parse a date string as ISO 8601, a named day, or a relative offset from `today`.
///
/// Supports:
/// - ISO 8601: "2024-01-15"
/// - Named: "today", "tomorrow", "yesterday"
/// - Relative: "3 days ago", "2 weeks ahead"
pub fn parse_date(s: &str, today: NaiveDate) -> anyhow::Result<NaiveDate> {
    let normalized = s.trim().to_ascii_lowercase();
    match normalized.as_str() {
        "today" => return Ok(today),
        "tomorrow" => return Ok(today + Duration::days(1)),
        "yesterday" => return Ok(today - Duration::days(1)),
        _ => {}
    }

    if let Ok(date) = NaiveDate::parse_from_str(&normalized, "%Y-%m-%d") {
        return Ok(date);
    }

    let Some(caps) = RELATIVE_DATE_RE.captures(&normalized) else {
        anyhow::bail!(
            "Invalid date: {s}. Use YYYY-MM-DD, today, tomorrow, yesterday, or relative (e.g., '3 days ago', '2 weeks ahead')"
        );
    };

    let n: i64 = caps[1]
        .parse()
        .context("failed to parse number in relative date")?;

    let (max_for_unit, days_per_unit) = match &caps[2] {
        "day" => (MAX_RELATIVE_DAYS, 1),
        "week" => (MAX_RELATIVE_DAYS / 7, 7),
        unit => anyhow::bail!("Unknown date unit: {unit}"),
    };

    if n > max_for_unit {
        anyhow::bail!("Relative date value too large: {n} {}", &caps[2]);
    }

    let offset = Duration::days(n * days_per_unit);
    let shifted = if &caps[3] == "ago" {
        today.checked_sub_signed(offset)
    } else {
        today.checked_add_signed(offset)
    };
    shifted.with_context(|| format!("date out of range: {s}"))
}

/// Parse a datetime string into a wall-clock instant.
///
/// Supports:
/// - ISO 8601 without offset: "2024-01-15T10:30", "2024-01-15T10:30:00"
/// - RFC 3339: "2024-01-15T10:30:00Z" (the offset is dropped, not converted)
pub fn parse_datetime(s: &str) -> anyhow::Result<NaiveDateTime> {
    lp_core::parse_instant(s).map_err(|_| {
        anyhow::anyhow!(
            "Invalid datetime: {s}. Use ISO 8601 (e.g., 2024-01-15T10:30) or RFC 3339 (e.g., 2024-01-15T10:30:00Z)"
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn parse_date_named_days() {
        let today = date(2024, 3, 1);
        assert_eq!(parse_date("today", today).unwrap(), today);
        assert_eq!(parse_date("Tomorrow", today).unwrap(), date(2024, 3, 2));
        assert_eq!(parse_date(" yesterday ", today).unwrap(), date(2024, 2, 29));
    }

    #[test]
    fn parse_date_iso() {
        let today = date(2024, 3, 1);
        assert_eq!(parse_date("2024-01-15", today).unwrap(), date(2024, 1, 15));
    }

    #[test]
    fn parse_date_relative() {
        let today = date(2024, 3, 1);
        assert_eq!(parse_date("3 days ago", today).unwrap(), date(2024, 2, 27));
        assert_eq!(parse_date("1 day ahead", today).unwrap(), date(2024, 3, 2));
        assert_eq!(parse_date("2 weeks ahead", today).unwrap(), date(2024, 3, 15));
    }

    #[test]
    fn parse_date_rejects_garbage() {
        let err = parse_date("next-ish", date(2024, 3, 1)).unwrap_err();
        assert!(err.to_string().contains("Invalid date: next-ish"));
    }

    #[test]
    fn parse_date_rejects_huge_offsets() {
        let err = parse_date("999999999 weeks ago", date(2024, 3, 1)).unwrap_err();
        assert!(err.to_string().contains("too large"));
    }

    #[test]
    fn parse_datetime_keeps_wall_clock() {
        let expected = date(2024, 1, 15).and_hms_opt(10, 30, 0).unwrap();
        assert_eq!(parse_datetime("2024-01-15T10:30").unwrap(), expected);
        assert_eq!(parse_datetime("2024-01-15T10:30:00+05:00").unwrap(), expected);
    }

    #[test]
    fn parse_datetime_rejects_garbage() {
        let err = parse_datetime("half past ten").unwrap_err();
        assert!(err.to_string().contains("Invalid datetime"));
    }
}
