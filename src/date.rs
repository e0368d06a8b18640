//! Timestamp parsing and effective-date reconciliation

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, TimeDelta};

/// A publication date is trusted only when it precedes ingestion by less than this
pub const PUBLICATION_WINDOW_DAYS: i64 = 3;

const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
];

/// Parse a pipeline timestamp.
///
/// Accepts RFC 3339, RFC 2822, ISO-like naive date-times and bare dates.
/// Values carrying an offset are normalized to UTC.
pub fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.naive_utc());
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(raw) {
        return Some(dt.naive_utc());
    }
    for format in NAIVE_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(dt);
        }
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .map(|d| d.and_time(NaiveTime::MIN))
}

/// Choose the calendar day a document is attributed to.
///
/// Defaults to the ingestion day. The publication date wins only if it
/// parses, precedes `time_get`, and lies less than
/// [`PUBLICATION_WINDOW_DAYS`] before it. Unparseable publication dates are
/// ignored.
pub fn reconcile_date(time_get: NaiveDateTime, pub_date: Option<&str>) -> NaiveDate {
    let Some(raw) = pub_date.filter(|raw| !raw.trim().is_empty()) else {
        return time_get.date();
    };
    match parse_timestamp(raw) {
        Some(published)
            if published < time_get
                && time_get - published < TimeDelta::days(PUBLICATION_WINDOW_DAYS) =>
        {
            published.date()
        }
        Some(_) => time_get.date(),
        None => {
            tracing::debug!(pub_date = raw, "ignoring unparseable publication date");
            time_get.date()
        }
    }
}

/// `YYYY-MM-DD`, the persisted form of an effective date
pub fn format_date(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

/// `YYYY-MM-DD HH:MM`, the persisted form of the ingestion timestamp
pub fn format_ingest_time(time_get: NaiveDateTime) -> String {
    time_get.format("%Y-%m-%d %H:%M").to_string()
}
