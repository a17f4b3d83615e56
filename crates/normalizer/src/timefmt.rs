//! Timestamp and duration text forms shared by the harvest export and the
//! analysis import.
//!
//! Timestamps are naive: the tracker's offset is dropped, not converted, so
//! the wall-clock reading is kept as published.

use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime};

pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

const SECONDS_PER_DAY: i64 = 86_400;

const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
];

/// Parses a tracker or export timestamp. Returns `None` for anything
/// unrecognised.
pub fn parse_timestamp(text: &str) -> Option<NaiveDateTime> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }
    if let Ok(with_offset) = DateTime::parse_from_rfc3339(text) {
        return Some(with_offset.naive_local());
    }
    if let Some(parsed) = NAIVE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(text, fmt).ok())
    {
        return Some(parsed);
    }
    NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
}

pub fn format_timestamp(ts: &NaiveDateTime) -> String {
    ts.format(TIMESTAMP_FORMAT).to_string()
}

/// Whole days in `duration`, rounded toward negative infinity.
pub fn floor_days(duration: Duration) -> i64 {
    duration.num_seconds().div_euclid(SECONDS_PER_DAY)
}

/// Renders `duration` as `"<days> days HH:MM:SS"`. Negative spans keep a
/// non-negative time part, e.g. `"-1 days +23:00:00"`.
pub fn format_duration(duration: Duration) -> String {
    let total = duration.num_seconds();
    let days = total.div_euclid(SECONDS_PER_DAY);
    let rest = total.rem_euclid(SECONDS_PER_DAY);
    let sign = if days < 0 { "+" } else { "" };
    format!(
        "{days} days {sign}{:02}:{:02}:{:02}",
        rest / 3600,
        (rest % 3600) / 60,
        rest % 60
    )
}

pub fn parse_duration(text: &str) -> Option<Duration> {
    let (days, clock) = text.trim().split_once(" days ")?;
    let days: i64 = days.trim().parse().ok()?;
    let clock = clock.trim().trim_start_matches('+');
    let mut parts = clock.split(':');
    let hours: i64 = parts.next()?.parse().ok()?;
    let minutes: i64 = parts.next()?.parse().ok()?;
    let seconds: f64 = parts.next()?.parse().ok()?;
    if parts.next().is_some() {
        return None;
    }
    Some(
        Duration::days(days)
            + Duration::hours(hours)
            + Duration::minutes(minutes)
            + Duration::seconds(seconds.trunc() as i64),
    )
}

pub(crate) mod serde_timestamp {
    use chrono::NaiveDateTime;
    use serde::Serializer;

    pub fn serialize<S: Serializer>(
        value: &Option<NaiveDateTime>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        match value {
            Some(ts) => serializer.serialize_str(&super::format_timestamp(ts)),
            None => serializer.serialize_str(""),
        }
    }
}

pub(crate) mod serde_duration {
    use chrono::Duration;
    use serde::Serializer;

    pub fn serialize<S: Serializer>(
        value: &Option<Duration>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        match value {
            Some(duration) => serializer.serialize_str(&super::format_duration(*duration)),
            None => serializer.serialize_str(""),
        }
    }
}
