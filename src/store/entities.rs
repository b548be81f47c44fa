use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde::Serialize;
use tracing::warn;

/// One sign-in/sign-out interval. `end` is absent while the session is still
/// open, and at most one open session exists system-wide. Finalized sessions
/// are immutable and append-only.
#[derive(PartialEq, Eq, PartialOrd, Ord, Debug, Serialize, Deserialize, Clone)]
pub struct Session {
    #[serde(with = "iso_millis")]
    pub start: DateTime<Utc>,
    #[serde(
        default,
        with = "iso_millis_opt",
        skip_serializing_if = "Option::is_none"
    )]
    pub end: Option<DateTime<Utc>>,
}

impl Session {
    pub fn finished(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self { start, end: Some(end) }
    }

    /// The session's end, or `now` for a still-open session so totals grow
    /// while a session is active.
    pub fn effective_end(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        self.end.unwrap_or(now)
    }
}

/// Stored timestamps are ISO-8601 strings with millisecond precision.
mod iso_millis {
    use chrono::{DateTime, SecondsFormat, Utc};
    use serde::{self, Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(v: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&v.to_rfc3339_opts(SecondsFormat::Millis, true))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        DateTime::parse_from_rfc3339(&raw)
            .map(|v| v.with_timezone(&Utc))
            .map_err(serde::de::Error::custom)
    }
}

mod iso_millis_opt {
    use chrono::{DateTime, SecondsFormat, Utc};
    use serde::{self, Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(v: &Option<DateTime<Utc>>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match v {
            Some(v) => serializer.serialize_str(&v.to_rfc3339_opts(SecondsFormat::Millis, true)),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
    where
        D: Deserializer<'de>,
    {
        match Option::<String>::deserialize(deserializer)? {
            Some(raw) => DateTime::parse_from_rfc3339(&raw)
                .map(|v| Some(v.with_timezone(&Utc)))
                .map_err(serde::de::Error::custom),
            None => Ok(None),
        }
    }
}

/// Record shape shared by the leave and claim collections. Their CRUD lives in
/// external tools; only the status field matters for aggregation, the rest of
/// each record is ignored.
#[derive(PartialEq, Eq, Debug, Serialize, Deserialize, Clone)]
pub struct StatusRecord {
    #[serde(default)]
    pub status: String,
}

/// Lenient boundary parser. A corrupted value is logged and replaced with the
/// fallback so stale history never blocks new punches.
pub fn parse_or_default<T: DeserializeOwned>(raw: Option<String>, fallback: T) -> T {
    let Some(raw) = raw else { return fallback };
    match serde_json::from_str(&raw) {
        Ok(v) => v,
        Err(e) => {
            warn!("During parsing found illegal json string {raw}: {e}");
            fallback
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::{DateTime, TimeZone, Utc};

    use super::{parse_or_default, Session};

    fn stamp(s: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(s).unwrap().with_timezone(&Utc)
    }

    #[test]
    fn session_serializes_iso_millis() {
        let session = Session::finished(
            stamp("2024-01-01T09:00:00Z"),
            stamp("2024-01-01T17:00:00.250Z"),
        );
        assert_eq!(
            serde_json::to_string(&session).unwrap(),
            r#"{"start":"2024-01-01T09:00:00.000Z","end":"2024-01-01T17:00:00.250Z"}"#
        );
    }

    #[test]
    fn open_session_omits_end() {
        let session = Session {
            start: Utc.with_ymd_and_hms(2024, 1, 1, 9, 0, 0).unwrap(),
            end: None,
        };
        let raw = serde_json::to_string(&session).unwrap();
        assert_eq!(raw, r#"{"start":"2024-01-01T09:00:00.000Z"}"#);

        let back: Session = serde_json::from_str(&raw).unwrap();
        assert_eq!(back, session);
    }

    #[test]
    fn parse_or_default_recovers_from_garbage() {
        assert_eq!(parse_or_default::<Vec<i32>>(Some("not json".into()), vec![]), Vec::<i32>::new());
        assert_eq!(parse_or_default(None, 7), 7);
        assert_eq!(parse_or_default(Some("[1,2]".into()), Vec::<i32>::new()), vec![1, 2]);
    }
}
