//! Cell formatting helpers shared by the accessors

use crate::table::Cell;
use chrono::{NaiveDate, NaiveTime};

pub const UNKNOWN: &str = "Unknown";
pub const UNSPECIFIED: &str = "Unspecified";
pub const INVALID_DATE: &str = "Invalid date";

/// Extended and basic calendar dates
const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y%m%d"];

const TIME_FORMATS: &[&str] = &["%H:%M:%S%.f", "%H:%M", "%H%M%S%.f", "%H%M"];

/// Render an ISO-8601 timestamp as `YYYY-MM-DD`
///
/// The date is taken in the timestamp's own offset. Missing, empty or
/// unparsable input renders as "Invalid date".
pub fn format_last_updated(timestamp: Option<&str>) -> String {
    let Some(raw) = timestamp.map(str::trim).filter(|s| !s.is_empty()) else {
        return INVALID_DATE.to_string();
    };

    parse_date(raw)
        .map(|d| d.format("%Y-%m-%d").to_string())
        .unwrap_or_else(|| INVALID_DATE.to_string())
}

/// The written date of a timestamp, once its time and offset check out.
/// The calendar date is already local to the offset, so no conversion happens.
fn parse_date(raw: &str) -> Option<NaiveDate> {
    let (date, time) = match raw.find(|c: char| c == 'T' || c == ' ') {
        Some(idx) => (&raw[..idx], Some(&raw[idx + 1..])),
        None => (raw, None),
    };

    let date = DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(date, fmt).ok())?;

    match time {
        Some(time) if !is_valid_time(time) => None,
        _ => Some(date),
    }
}

fn is_valid_time(time: &str) -> bool {
    let (clock, offset) = match time.strip_suffix('Z') {
        Some(clock) => (clock, None),
        None => match time.find(|c: char| c == '+' || c == '-') {
            Some(idx) => (&time[..idx], Some(&time[idx + 1..])),
            None => (time, None),
        },
    };

    if offset.is_some_and(|o| !is_valid_offset(o)) {
        return false;
    }

    // chrono needs minutes; an hour-only time means minute zero
    let clock = if clock.len() == 2 {
        format!("{}:00", clock)
    } else {
        clock.to_string()
    };

    TIME_FORMATS
        .iter()
        .any(|fmt| NaiveTime::parse_from_str(&clock, fmt).is_ok())
}

/// `HH`, `HHMM` or `HH:MM`, sign already stripped
fn is_valid_offset(offset: &str) -> bool {
    if !offset.is_ascii() {
        return false;
    }
    let (hours, minutes) = match offset.len() {
        2 => (offset, "00"),
        4 => offset.split_at(2),
        5 if offset.as_bytes()[2] == b':' => (&offset[..2], &offset[3..]),
        _ => return false,
    };
    let in_range = |part: &str, max: u32| {
        part.bytes().all(|b| b.is_ascii_digit()) && part.parse::<u32>().is_ok_and(|n| n < max)
    };
    in_range(hours, 24) && in_range(minutes, 60)
}

/// Name cell, with empty or missing names shown as "Unknown"
pub fn or_unknown(name: Option<&str>) -> Cell {
    match name {
        Some(n) if !n.is_empty() => Cell::Text(n.to_string()),
        _ => Cell::from(UNKNOWN),
    }
}

/// Alert threshold cell; zero counts as unset
pub fn threshold_cell(threshold: Option<i64>) -> Cell {
    match threshold {
        Some(n) if n != 0 => Cell::Text(n.to_string()),
        _ => Cell::from(UNSPECIFIED),
    }
}
