use chrono::{TimeZone, Timelike};

use crate::models::{HOUR_MS, MINUTE_MS, SECOND_MS};

/// Human-readable duration. Negative input renders as zero.
pub fn format_duration(duration_ms: i64) -> String {
    let duration_ms = duration_ms.max(0);
    let hours = duration_ms / HOUR_MS;
    let minutes = (duration_ms % HOUR_MS) / MINUTE_MS;
    let seconds = (duration_ms % MINUTE_MS) / SECOND_MS;

    if hours > 0 {
        format!("{hours}h {minutes}m")
    } else if minutes > 0 && seconds > 0 {
        format!("{minutes}m {seconds}s")
    } else if minutes > 0 {
        format!("{minutes}m")
    } else {
        format!("{seconds}s")
    }
}

/// `HH:MM` label of `instant_ms` in `tz`.
pub fn format_hour_minute<Tz: TimeZone>(instant_ms: i64, tz: &Tz) -> String {
    match tz.timestamp_millis_opt(instant_ms).earliest() {
        Some(moment) => format!("{:02}:{:02}", moment.hour(), moment.minute()),
        None => String::new(),
    }
}

/// `HH:MM:SS` label of `instant_ms` in `tz`.
pub fn format_clock<Tz: TimeZone>(instant_ms: i64, tz: &Tz) -> String {
    match tz.timestamp_millis_opt(instant_ms).earliest() {
        Some(moment) => format!(
            "{:02}:{:02}:{:02}",
            moment.hour(),
            moment.minute(),
            moment.second()
        ),
        None => String::new(),
    }
}
