//! Time utilities: "today" in a configured timezone and lenient due-date parsing.

use anyhow::Result;
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use chrono_tz::Tz;

/// Calendar date of `now` in an IANA tz like "America/Chicago".
pub fn date_in_tz(now: DateTime<Utc>, tz: &str) -> Result<NaiveDate> {
    let tz: Tz = tz
        .parse()
        .map_err(|_| anyhow::anyhow!("invalid timezone: {tz}"))?;
    Ok(now.with_timezone(&tz).date_naive())
}

/// Today's date in `tz`.
pub fn today_in(tz: &str) -> Result<NaiveDate> {
    date_in_tz(Utc::now(), tz)
}

/// Parse a stored or user-supplied due date.
///
/// Accepts `YYYY-MM-DD`, `YYYY-MM-DDTHH:MM[:SS]`, `YYYY-MM-DD HH:MM[:SS]` and
/// RFC 3339. The time component, if any, is dropped.
pub fn parse_due_date(raw: &str) -> Option<NaiveDate> {
    let s = raw.trim();
    if let Ok(d) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return Some(d);
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.date_naive());
    }
    const FORMATS: [&str; 4] = [
        "%Y-%m-%dT%H:%M:%S",
        "%Y-%m-%dT%H:%M",
        "%Y-%m-%d %H:%M:%S",
        "%Y-%m-%d %H:%M",
    ];
    FORMATS
        .iter()
        .find_map(|f| NaiveDateTime::parse_from_str(s, f).ok())
        .map(|ndt| ndt.date())
}

/// Whole days from `today` until `due` (negative when overdue).
pub fn days_until(due: NaiveDate, today: NaiveDate) -> i64 {
    (due - today).num_days()
}

/// Days until a raw due date, or `None` when it is absent or unparseable.
pub fn days_until_raw(raw: Option<&str>, today: NaiveDate) -> Option<i64> {
    raw.and_then(parse_due_date).map(|due| days_until(due, today))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_date_in_chicago_lags_utc() {
        // 03:00 UTC on Feb 21 is still Feb 20 in CST (UTC-6)
        let now = Utc.with_ymd_and_hms(2026, 2, 21, 3, 0, 0).unwrap();
        let d = date_in_tz(now, "America/Chicago").unwrap();
        assert_eq!(d, NaiveDate::from_ymd_opt(2026, 2, 20).unwrap());
    }

    #[test]
    fn test_invalid_timezone() {
        assert!(date_in_tz(Utc::now(), "Mars/Olympus").is_err());
    }

    #[test]
    fn test_parse_due_date_formats() {
        let want = NaiveDate::from_ymd_opt(2026, 5, 4).unwrap();
        assert_eq!(parse_due_date("2026-05-04"), Some(want));
        assert_eq!(parse_due_date(" 2026-05-04 "), Some(want));
        assert_eq!(parse_due_date("2026-05-04T09:30:00"), Some(want));
        assert_eq!(parse_due_date("2026-05-04 09:30"), Some(want));
        assert_eq!(parse_due_date("2026-05-04T09:30:00+02:00"), Some(want));
        assert_eq!(parse_due_date("next tuesday"), None);
        assert_eq!(parse_due_date("2026-13-40"), None);
    }

    #[test]
    fn test_days_until() {
        let today = NaiveDate::from_ymd_opt(2026, 2, 27).unwrap();
        assert_eq!(days_until_raw(Some("2026-03-01"), today), Some(2));
        assert_eq!(days_until_raw(Some("2026-02-20"), today), Some(-7));
        assert_eq!(days_until_raw(Some("garbage"), today), None);
        assert_eq!(days_until_raw(None, today), None);
    }
}
