use anyhow::Result;
use chrono::{DateTime, SecondsFormat, Utc};
use tracing::warn;

use super::{
    entities::{parse_or_default, Session, StatusRecord},
    kv::KvStore,
};

pub const LOG_KEY: &str = "timesheet:logs";
pub const IN_PROGRESS_KEY: &str = "timesheet:inprogress";
pub const LEAVES_KEY: &str = "timesheet:leaves";
pub const CLAIMS_KEY: &str = "timesheet:claims";

/// Number of finalized sessions the log retains.
pub const LOG_RETENTION: usize = 50;

/// Append-only log of finalized sessions plus the at-most-one in-progress
/// marker. The marker lives under its own key so a full-log rewrite can never
/// corrupt the active punch. The log is ground truth whenever the two disagree.
pub struct SessionStore<S: KvStore> {
    kv: S,
}

impl<S: KvStore> SessionStore<S> {
    pub fn new(kv: S) -> Self {
        Self { kv }
    }

    /// Prepends a completed session and persists the log truncated to the
    /// retention cap.
    pub fn append_finished(&self, session: Session) -> Result<()> {
        let mut log = self.load_log()?;
        log.insert(0, session);
        log.truncate(LOG_RETENTION);
        self.kv.set(LOG_KEY, &serde_json::to_string(&log)?)
    }

    /// Finalized sessions, newest first. Absent or malformed storage yields an
    /// empty log; individual unreadable records are skipped rather than
    /// aborting the whole read.
    pub fn load_log(&self) -> Result<Vec<Session>> {
        let values: Vec<serde_json::Value> = parse_or_default(self.kv.get(LOG_KEY)?, Vec::new());
        Ok(values
            .into_iter()
            .filter_map(|v| match serde_json::from_value::<Session>(v) {
                Ok(v) => Some(v),
                Err(e) => {
                    // ignore illegal values. Might happen after shutdowns
                    warn!("Skipping malformed session record: {e}");
                    None
                }
            })
            .collect())
    }

    /// Persists the start of the open session. Written before any log mutation
    /// so a crash right after punch-in still resumes the session on reload.
    pub fn set_in_progress(&self, start: DateTime<Utc>) -> Result<()> {
        let raw = serde_json::to_string(&start.to_rfc3339_opts(SecondsFormat::Millis, true))?;
        self.kv.set(IN_PROGRESS_KEY, &raw)
    }

    pub fn clear_in_progress(&self) -> Result<()> {
        self.kv.set(IN_PROGRESS_KEY, "null")
    }

    pub fn in_progress(&self) -> Result<Option<DateTime<Utc>>> {
        let raw: Option<String> = parse_or_default(self.kv.get(IN_PROGRESS_KEY)?, None);
        Ok(raw.and_then(|s| match DateTime::parse_from_rfc3339(&s) {
            Ok(v) => Some(v.with_timezone(&Utc)),
            Err(e) => {
                warn!("In-progress marker {s} is not a valid timestamp: {e}");
                None
            }
        }))
    }

    /// Read-only view of a status-bearing collection (leaves, claims) written
    /// by external tools under `key`.
    pub fn load_status_records(&self, key: &str) -> Result<Vec<StatusRecord>> {
        let values: Vec<serde_json::Value> = parse_or_default(self.kv.get(key)?, Vec::new());
        Ok(values
            .into_iter()
            .filter_map(|v| match serde_json::from_value::<StatusRecord>(v) {
                Ok(v) => Some(v),
                Err(e) => {
                    warn!("Skipping malformed status record: {e}");
                    None
                }
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use anyhow::Result;
    use chrono::{Duration, TimeZone, Utc};

    use crate::store::{
        entities::Session,
        kv::{KvStore, MemoryKvStore},
        session_store::{SessionStore, LEAVES_KEY, LOG_KEY, LOG_RETENTION},
    };

    fn store() -> SessionStore<MemoryKvStore> {
        SessionStore::new(MemoryKvStore::new())
    }

    fn session(offset_hours: i64) -> Session {
        let start = Utc.with_ymd_and_hms(2024, 3, 1, 8, 0, 0).unwrap() + Duration::hours(offset_hours);
        Session::finished(start, start + Duration::hours(1))
    }

    #[test]
    fn appends_newest_first() -> Result<()> {
        let store = store();
        store.append_finished(session(0))?;
        store.append_finished(session(2))?;

        let log = store.load_log()?;
        assert_eq!(log.len(), 2);
        assert_eq!(log[0], session(2));
        assert_eq!(log[1], session(0));
        Ok(())
    }

    #[test]
    fn truncates_at_retention_cap() -> Result<()> {
        let store = store();
        for i in 0..(LOG_RETENTION as i64 + 10) {
            store.append_finished(session(i))?;
        }

        let log = store.load_log()?;
        assert_eq!(log.len(), LOG_RETENTION);
        // newest survives, oldest entries fall off the end
        assert_eq!(log[0], session(LOG_RETENTION as i64 + 9));
        Ok(())
    }

    #[test]
    fn malformed_log_reads_as_empty() -> Result<()> {
        let kv = MemoryKvStore::new();
        kv.set(LOG_KEY, "{ not json")?;
        let store = SessionStore::new(kv);

        assert_eq!(store.load_log()?, vec![]);
        Ok(())
    }

    #[test]
    fn bad_records_are_skipped_individually() -> Result<()> {
        let kv = MemoryKvStore::new();
        kv.set(
            LOG_KEY,
            r#"[{"start":"2024-03-01T08:00:00.000Z"},{"start":"yesterday-ish"},42]"#,
        )?;
        let store = SessionStore::new(kv);

        let log = store.load_log()?;
        assert_eq!(log.len(), 1);
        assert_eq!(log[0].end, None);
        Ok(())
    }

    #[test]
    fn marker_roundtrip_and_clear() -> Result<()> {
        let store = store();
        assert_eq!(store.in_progress()?, None);

        let start = Utc.with_ymd_and_hms(2024, 3, 1, 8, 30, 0).unwrap();
        store.set_in_progress(start)?;
        assert_eq!(store.in_progress()?, Some(start));

        store.clear_in_progress()?;
        assert_eq!(store.in_progress()?, None);
        Ok(())
    }

    #[test]
    fn corrupt_marker_reads_as_absent() -> Result<()> {
        let kv = MemoryKvStore::new();
        kv.set("timesheet:inprogress", "\"around noon\"")?;
        let store = SessionStore::new(kv);

        assert_eq!(store.in_progress()?, None);
        Ok(())
    }

    #[test]
    fn status_records_keep_only_parseable_entries() -> Result<()> {
        let kv = MemoryKvStore::new();
        kv.set(
            LEAVES_KEY,
            r#"[{"status":"Pending","from":"2024-03-01"},{"status":"Approved"},"oops"]"#,
        )?;
        let store = SessionStore::new(kv);

        let records = store.load_status_records(LEAVES_KEY)?;
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].status, "Pending");
        assert_eq!(records[1].status, "Approved");
        Ok(())
    }
}
