use chrono::{DateTime, Duration, Local, Utc};

/// Elapsed time as `HH:MM:SS` for live status display.
pub fn clock_duration(v: Duration) -> String {
    let s = v.num_seconds().max(0);
    format!("{:02}:{:02}:{:02}", s / 3600, (s % 3600) / 60, s % 60)
}

/// Compact `Xh Ym` used by dashboard totals.
pub fn short_duration(ms: i64) -> String {
    let total_sec = ms.max(0) / 1000;
    format!("{}h {}m", total_sec / 3600, (total_sec % 3600) / 60)
}

/// Timestamp rendered in the host's local calendar.
pub fn local_timestamp(v: DateTime<Utc>) -> String {
    v.with_timezone(&Local).format("%x %H:%M:%S").to_string()
}
