//! Pure aggregation over the session log. Everything is recomputed from
//! `(log, in_progress, now)` on each query; nothing here caches or persists.

use chrono::{DateTime, Datelike, Duration, Local, Utc};
use now::DateTimeNow;

use crate::store::entities::{Session, StatusRecord};

/// A derived label/value pair consumed by charts and dashboard output.
#[derive(Debug, Clone, PartialEq)]
pub struct Bucket {
    pub label: String,
    pub value: f64,
}

/// Fixed status legend order, preserved regardless of input scan order.
pub const STATUS_LABELS: [&str; 3] = ["Pending", "Approved", "Rejected"];

pub const WEEKDAY_LABELS: [&str; 7] = ["Sun", "Mon", "Tue", "Wed", "Thu", "Fri", "Sat"];

/// Length of the trend window in days.
pub const TREND_DAYS: usize = 30;

const MS_IN_DAY: i64 = 24 * 3600 * 1000;

/// Milliseconds of tracked time inside the three calendar windows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CalendarTotals {
    pub today_ms: i64,
    pub week_ms: i64,
    pub month_ms: i64,
}

/// Sums `(effective_end - start)` over sessions whose start falls on or after
/// each window boundary. Boundaries come from the local calendar: midnight of
/// today, midnight of the past Sunday, midnight of the 1st. The in-progress
/// session contributes with `now` as provisional end, so totals visibly grow
/// while a session is active.
pub fn totals_by_calendar_window(
    log: &[Session],
    in_progress: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
) -> CalendarTotals {
    let local_now = now.with_timezone(&Local);
    let start_of_day = local_now.beginning_of_day();
    let start_of_week =
        start_of_day - Duration::days(local_now.weekday().num_days_from_sunday() as i64);
    let start_of_month = local_now.beginning_of_month();

    let mut totals = CalendarTotals::default();
    {
        let mut add = |start: DateTime<Utc>, end: DateTime<Utc>| {
            let start_local = start.with_timezone(&Local);
            let duration = (end - start).num_milliseconds();
            if start_local >= start_of_day {
                totals.today_ms += duration;
            }
            if start_local >= start_of_week {
                totals.week_ms += duration;
            }
            if start_local >= start_of_month {
                totals.month_ms += duration;
            }
        };

        for session in log {
            add(session.start, session.effective_end(now));
        }
        if let Some(start) = in_progress {
            add(start, now);
        }
    }
    totals
}

/// Counts items per label in the fixed order of `labels`, so chart legends
/// stay stable across renders. Matching is exact and case-sensitive.
pub fn counts_by_label(items: &[StatusRecord], labels: &[&str]) -> Vec<Bucket> {
    labels
        .iter()
        .map(|label| Bucket {
            label: label.to_string(),
            value: items.iter().filter(|v| v.status == *label).count() as f64,
        })
        .collect()
}

/// Hours worked per day over a trailing window, most recent day last. A
/// session's whole duration is attributed to its start day even when it spans
/// midnight; sessions older than the window are silently dropped.
pub fn trend_series(
    log: &[Session],
    in_progress: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
    days: usize,
) -> Vec<f64> {
    let mut series = vec![0.0; days];
    {
        let mut add = |start: DateTime<Utc>, end: DateTime<Utc>| {
            let age_days = (now - start).num_milliseconds().div_euclid(MS_IN_DAY);
            let pos = days as i64 - 1 - age_days;
            if (0..days as i64).contains(&pos) {
                series[pos as usize] += (end - start).num_milliseconds() as f64 / 3_600_000.0;
            }
        };

        for session in log {
            add(session.start, session.effective_end(now));
        }
        if let Some(start) = in_progress {
            add(start, now);
        }
    }
    series
}

/// One count per finalized session, indexed by the local weekday of its start
/// (Sunday first).
pub fn weekday_histogram(log: &[Session]) -> [u32; 7] {
    let mut counts = [0u32; 7];
    for session in log {
        let weekday = session.start.with_timezone(&Local).weekday().num_days_from_sunday();
        counts[weekday as usize] += 1;
    }
    counts
}
