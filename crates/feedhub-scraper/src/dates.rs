//! Best-effort parsing of item publish dates.
//!
//! Real feeds carry far more than RFC 2822 and RFC 3339: named zones other
//! than GMT, missing weekdays, full month names, 12-hour clocks, Go's
//! `time.String()` output, slash dates, epoch seconds, naive timestamps and
//! bare dates. Naive values are taken as UTC; bare dates as UTC midnight.
//! Slash dates are read month-first unless that is impossible.

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, Utc};

const OFFSET_FORMATS: &[&str] = &[
    "%d %b %Y %H:%M:%S %z",
    "%d %b %Y %H:%M %z",
    "%d %B %Y %H:%M:%S %z",
    "%d %B %Y %H:%M %z",
    "%b %d %Y %H:%M:%S %z",
    "%B %d, %Y %H:%M:%S %z",
    "%b %d, %Y %I:%M %p %z",
    "%b %d, %Y %I:%M:%S %p %z",
    "%B %d, %Y %I:%M %p %z",
    "%B %d, %Y %I:%M:%S %p %z",
    "%Y-%m-%dT%H:%M:%S%.f%z",
    "%Y-%m-%dT%H:%M:%S%z",
    "%Y-%m-%dT%H:%M:%S%.f%:z",
    "%Y-%m-%dT%H:%M:%S%:z",
    "%Y-%m-%d %H:%M:%S %z",
    "%Y-%m-%d %H:%M:%S%.f %z",
    "%Y-%m-%d %H:%M:%S%z",
    "%Y-%m-%d %H:%M:%S%:z",
];

const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%d %b %Y %H:%M:%S",
    "%d %B %Y %H:%M:%S",
    "%Y/%m/%d %H:%M:%S",
    "%b %d, %Y %I:%M %p",
    "%b %d, %Y %I:%M:%S %p",
    "%B %d, %Y %I:%M %p",
    "%B %d, %Y %I:%M:%S %p",
    "%m/%d/%Y %H:%M:%S",
    "%m/%d/%Y %I:%M:%S %p",
    "%m/%d/%Y %I:%M %p",
    "%d/%m/%Y %H:%M:%S",
];

const DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d",
    "%Y/%m/%d",
    "%d %b %Y",
    "%d %B %Y",
    "%b %d, %Y",
    "%B %d, %Y",
    "%m/%d/%Y",
    "%d/%m/%Y",
];

/// Named zones seen in the wild, with their numeric offsets.
const ZONES: &[(&str, &str)] = &[
    ("UT", "+0000"),
    ("UTC", "+0000"),
    ("GMT", "+0000"),
    ("Z", "+0000"),
    ("EST", "-0500"),
    ("EDT", "-0400"),
    ("CST", "-0600"),
    ("CDT", "-0500"),
    ("MST", "-0700"),
    ("MDT", "-0600"),
    ("PST", "-0800"),
    ("PDT", "-0700"),
    ("BST", "+0100"),
    ("CET", "+0100"),
    ("CEST", "+0200"),
    ("EET", "+0200"),
    ("EEST", "+0300"),
    ("IST", "+0530"),
    ("JST", "+0900"),
    ("KST", "+0900"),
    ("AEST", "+1000"),
    ("AEDT", "+1100"),
];

/// Parses a feed date string, returning `None` when no known format matches.
#[must_use]
pub fn parse_published(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc2822(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Some(dt) = parse_epoch(raw) {
        return Some(dt);
    }

    let normalized = normalize(raw);
    let s = normalized.as_str();

    if let Some(dt) = OFFSET_FORMATS
        .iter()
        .find_map(|fmt| DateTime::<FixedOffset>::parse_from_str(s, fmt).ok())
    {
        return Some(dt.with_timezone(&Utc));
    }
    if let Some(dt) = NAIVE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
    {
        return Some(dt.and_utc());
    }
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(s, fmt).ok())
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc())
}

/// Unix seconds (9 or 10 digits) or milliseconds (12 or 13 digits).
fn parse_epoch(raw: &str) -> Option<DateTime<Utc>> {
    if !raw.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let value: i64 = raw.parse().ok()?;
    match raw.len() {
        9 | 10 => DateTime::from_timestamp(value, 0),
        12 | 13 => DateTime::from_timestamp_millis(value),
        _ => None,
    }
}

fn is_numeric_offset(token: &str) -> bool {
    let Some(rest) = token.strip_prefix(['+', '-']) else {
        return false;
    };
    let digits: String = rest.chars().filter(|c| *c != ':').collect();
    digits.len() == 4 && digits.bytes().all(|b| b.is_ascii_digit())
}

/// Drops a leading weekday and trailing `(comment)`, collapses whitespace and
/// swaps a trailing zone name for its numeric offset. A zone name that merely
/// repeats a numeric offset (`+0000 UTC`) is dropped, as is Go's monotonic
/// clock reading (`m=+0.001`).
fn normalize(raw: &str) -> String {
    let mut s = raw;
    if let Some(open) = s.rfind('(') {
        if s.ends_with(')') {
            s = s[..open].trim_end();
        }
    }
    if let Some((head, rest)) = s.split_once(',') {
        if !head.is_empty() && head.chars().all(char::is_alphabetic) {
            s = rest;
        }
    }

    let mut parts: Vec<&str> = s.split_whitespace().collect();
    if parts.last().is_some_and(|last| last.starts_with("m=")) {
        parts.pop();
    }
    if parts.len() >= 2 && is_numeric_offset(parts[parts.len() - 2]) {
        let last = parts[parts.len() - 1];
        if last.chars().all(char::is_alphabetic) {
            parts.pop();
            return parts.join(" ");
        }
    }
    if let Some(last) = parts.last_mut() {
        let zone: &str = *last;
        if let Some(&(_, offset)) = ZONES
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(zone))
        {
            *last = offset;
        }
    }
    parts.join(" ")
}
