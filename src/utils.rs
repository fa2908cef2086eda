//! Small time-formatting helpers for the notification feed.

use chrono::{DateTime, Datelike, Utc};

/// Format a feeding timestamp for display, e.g. "January 2nd 2026, 3:04 pm".
pub fn format_event_time(ts: DateTime<Utc>) -> String {
    let day = ts.day();
    format!(
        "{} {}{} {}, {}",
        ts.format("%B"),
        day,
        ordinal_suffix(day),
        ts.format("%Y"),
        ts.format("%-I:%M %P")
    )
}

/// Coarse relative time for the synthetic "Last fed" line, e.g.
/// "12 minutes ago". A timestamp at or ahead of `now` reads as
/// "a few seconds ago"; clock skew between device and client is expected.
pub fn format_relative(then: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let secs = (now - then).num_seconds().max(0);
    let mins = secs / 60;
    let hours = mins / 60;
    let days = hours / 24;

    if secs < 45 {
        "a few seconds ago".to_string()
    } else if secs < 90 {
        "a minute ago".to_string()
    } else if mins < 45 {
        format!("{} minutes ago", mins)
    } else if mins < 90 {
        "an hour ago".to_string()
    } else if hours < 22 {
        format!("{} hours ago", hours)
    } else if hours < 36 {
        "a day ago".to_string()
    } else {
        format!("{} days ago", days)
    }
}

fn ordinal_suffix(day: u32) -> &'static str {
    match day % 100 {
        11..=13 => "th",
        _ => match day % 10 {
            1 => "st",
            2 => "nd",
            3 => "rd",
            _ => "th",
        },
    }
}
