//! Date-time display formatting for list pages.
//!
//! Timestamps are shown as `YYYY-MM-DD HH:MM:SS`. Offsets are not converted:
//! an RFC 3339 value is shown in the offset it carries.

use time::macros::format_description;
use time::{Date, OffsetDateTime, PrimitiveDateTime, Time};

/// Format `raw` for display. Empty input gives an empty string; so does
/// anything that is not a recognisable date, after logging a warning.
#[must_use]
pub fn format_date_time(raw: &str) -> String {
    let raw = raw.trim();
    if raw.is_empty() {
        return String::new();
    }

    let display = format_description!("[year]-[month]-[day] [hour]:[minute]:[second]");
    if PrimitiveDateTime::parse(raw, display).is_ok() {
        return raw.to_owned();
    }

    match parse_loose(raw) {
        Some(dt) => dt.format(display).unwrap_or_default(),
        None => {
            tracing::warn!(value = raw, "invalid date");
            String::new()
        }
    }
}

fn parse_loose(raw: &str) -> Option<PrimitiveDateTime> {
    if let Ok(dt) = OffsetDateTime::parse(raw, &time::format_description::well_known::Rfc3339) {
        return Some(PrimitiveDateTime::new(dt.date(), dt.time()));
    }
    let naive = format_description!("[year]-[month]-[day]T[hour]:[minute]:[second]");
    if let Ok(dt) = PrimitiveDateTime::parse(raw, naive) {
        return Some(dt);
    }
    let naive_fraction = format_description!("[year]-[month]-[day]T[hour]:[minute]:[second].[subsecond]");
    if let Ok(dt) = PrimitiveDateTime::parse(raw, naive_fraction) {
        return Some(dt);
    }
    let date_only = format_description!("[year]-[month]-[day]");
    Date::parse(raw, date_only)
        .ok()
        .map(|d| PrimitiveDateTime::new(d, Time::MIDNIGHT))
}

#[cfg(test)]
#[path = "format_test.rs"]
mod tests;
