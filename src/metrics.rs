//! Read model consumed by the dashboard and chart commands. Performs no
//! persistence; callers recompute the snapshot after any mutation.

use anyhow::Result;
use chrono::{DateTime, Utc};

use crate::{
    aggregate::{
        counts_by_label, totals_by_calendar_window, trend_series, weekday_histogram, Bucket,
        CalendarTotals, STATUS_LABELS, TREND_DAYS,
    },
    store::{
        entities::{Session, StatusRecord},
        kv::KvStore,
        session_store::{SessionStore, CLAIMS_KEY, LEAVES_KEY},
    },
    utils::format::local_timestamp,
};

/// How many log entries the recent-activity list shows.
pub const RECENT_ACTIVITY_LIMIT: usize = 3;

/// Everything the presentation surfaces need, computed in one pass.
#[derive(Debug, Clone, PartialEq)]
pub struct MetricsSnapshot {
    pub totals: CalendarTotals,
    pub leaves_by_status: Vec<Bucket>,
    pub claims_by_status: Vec<Bucket>,
    pub trend_hours: Vec<f64>,
    pub weekday_counts: [u32; 7],
    /// `(local start, entry kind)` tuples for the newest log entries.
    pub recent_activity: Vec<(String, String)>,
}

impl MetricsSnapshot {
    pub fn compute(
        log: &[Session],
        in_progress: Option<DateTime<Utc>>,
        leaves: &[StatusRecord],
        claims: &[StatusRecord],
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            totals: totals_by_calendar_window(log, in_progress, now),
            leaves_by_status: counts_by_label(leaves, &STATUS_LABELS),
            claims_by_status: counts_by_label(claims, &STATUS_LABELS),
            trend_hours: trend_series(log, in_progress, now, TREND_DAYS),
            weekday_counts: weekday_histogram(log),
            recent_activity: log
                .iter()
                .take(RECENT_ACTIVITY_LIMIT)
                .map(|s| (local_timestamp(s.start), "Timesheet".to_string()))
                .collect(),
        }
    }

    /// Convenience for the CLI: pulls every input collection from the store.
    pub fn from_store<S: KvStore>(store: &SessionStore<S>, now: DateTime<Utc>) -> Result<Self> {
        Ok(Self::compute(
            &store.load_log()?,
            store.in_progress()?,
            &store.load_status_records(LEAVES_KEY)?,
            &store.load_status_records(CLAIMS_KEY)?,
            now,
        ))
    }
}
