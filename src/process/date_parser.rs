use chrono::{DateTime, NaiveDate, NaiveDateTime};

use crate::process::utils::clean_str;

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y"];

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y/%m/%d %H:%M:%S",
    "%m/%d/%Y %H:%M:%S",
];

/// Parse a date cell into a calendar date.
///
/// Returns `None` for anything that is not one of the accepted layouts or
/// names an impossible day; callers treat that as a per-row soft failure.
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let s = clean_str(raw);
    if s.is_empty() {
        return None;
    }

    if let Some(d) = parse_compact(s) {
        return Some(d);
    }
    for fmt in DATE_FORMATS {
        if let Ok(d) = NaiveDate::parse_from_str(s, fmt) {
            return Some(d);
        }
    }
    for fmt in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(dt.date());
        }
    }
    // offset-aware stamps keep their local calendar day
    DateTime::parse_from_rfc3339(s)
        .ok()
        .map(|dt| dt.naive_local().date())
}

/// `YYYY`, `YYYY-MM` and `YYYYMMDD`.
fn parse_compact(s: &str) -> Option<NaiveDate> {
    if !s.is_ascii() {
        return None;
    }
    let digits = |t: &str| t.bytes().all(|b| b.is_ascii_digit());
    match s.len() {
        4 if digits(s) => NaiveDate::from_ymd_opt(s.parse().ok()?, 1, 1),
        7 if &s[4..5] == "-" && digits(&s[..4]) && digits(&s[5..]) => {
            NaiveDate::from_ymd_opt(s[..4].parse().ok()?, s[5..].parse().ok()?, 1)
        }
        8 if digits(s) => NaiveDate::from_ymd_opt(
            s[0..4].parse().ok()?,
            s[4..6].parse().ok()?,
            s[6..8].parse().ok()?,
        ),
        _ => None,
    }
}
