//! Lenient date parsing for imported string fields.

use chrono::{DateTime, NaiveDate, NaiveTime, TimeZone, Utc};

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%d/%m/%Y", "%Y/%m/%d"];

/// Parse an ISO date, an RFC 3339 timestamp, or a `dd/mm/yyyy` date.
///
/// Returns `None` for empty or unparseable input.
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.with_timezone(&Utc).date_naive());
    }
    // "2024-03-01T10:00:00" and similar without offset: keep the date part.
    let date_part = raw.split(['T', ' ']).next().unwrap_or(raw);
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(date_part, fmt).ok())
}

/// Parse an optional field, see [`parse_date`].
pub fn parse_opt_date(raw: Option<&str>) -> Option<NaiveDate> {
    raw.and_then(parse_date)
}

/// Whole days from `from` to `to` (negative when `to` is earlier).
pub fn days_between(from: NaiveDate, to: NaiveDate) -> i64 {
    (to - from).num_days()
}

/// Midnight UTC of `date`.
pub fn start_of_day(date: NaiveDate) -> DateTime<Utc> {
    Utc.from_utc_datetime(&date.and_time(NaiveTime::MIN))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn parses_common_formats() {
        assert_eq!(parse_date("2024-03-15"), Some(d(2024, 3, 15)));
        assert_eq!(parse_date("15/03/2024"), Some(d(2024, 3, 15)));
        assert_eq!(parse_date("2024-03-15T08:30:00Z"), Some(d(2024, 3, 15)));
        assert_eq!(parse_date("2024-03-15T08:30:00"), Some(d(2024, 3, 15)));
        assert_eq!(parse_date(" 2024-03-15 "), Some(d(2024, 3, 15)));
    }

    #[test]
    fn rejects_garbage() {
        assert_eq!(parse_date(""), None);
        assert_eq!(parse_date("bientôt"), None);
        assert_eq!(parse_date("2024-13-45"), None);
        assert_eq!(parse_opt_date(None), None);
    }

    #[test]
    fn day_arithmetic() {
        assert_eq!(days_between(d(2024, 1, 1), d(2024, 3, 1)), 60);
        assert_eq!(days_between(d(2024, 3, 1), d(2024, 1, 1)), -60);
        assert_eq!(start_of_day(d(2024, 1, 1)).to_rfc3339(), "2024-01-01T00:00:00+00:00");
    }
}
