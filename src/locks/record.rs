//! Lock record structure and utilities.

use crate::error::{Result, SyncError};
use chrono::{DateTime, Duration, SubsecRound, Utc};
use serde::{Deserialize, Serialize};

/// Body of the `server.lock` object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LockRecord {
    /// Host that acquired the lock.
    #[serde(default = "unknown_hostname")]
    pub hostname: String,

    /// When the lock was acquired.
    #[serde(default, with = "timestamp", skip_serializing_if = "LockTime::is_missing")]
    pub timestamp: LockTime,

    /// Process id of the acquiring invocation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pid: Option<u32>,
}

/// Acquisition time as found in a lock record.
///
/// Records written by other tooling may carry no timestamp or one that is
/// not ISO-8601; those are kept so the holder can still be reported.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum LockTime {
    At(DateTime<Utc>),
    /// Present but not a recognizable time; kept verbatim.
    Unparsed(String),
    #[default]
    Missing,
}

impl LockTime {
    fn is_missing(&self) -> bool {
        matches!(self, LockTime::Missing)
    }
}

impl From<DateTime<Utc>> for LockTime {
    fn from(value: DateTime<Utc>) -> Self {
        LockTime::At(value)
    }
}

impl LockRecord {
    /// Create a record for this process on `hostname`, stamped now.
    ///
    /// The timestamp is truncated to whole seconds so a record survives a
    /// serialize/parse cycle unchanged.
    pub fn new(hostname: &str) -> Self {
        Self {
            hostname: hostname.to_string(),
            timestamp: LockTime::At(Utc::now().trunc_subsecs(0)),
            pid: Some(std::process::id()),
        }
    }

    /// Parse a record from an object body.
    pub fn from_slice(body: &[u8]) -> Result<Self> {
        serde_json::from_slice(body).map_err(|e| {
            SyncError::InvalidLock(format!(
                "failed to parse lock record: {} (delete the lock object to recover)",
                e
            ))
        })
    }

    /// Serialize the record to a pretty-printed JSON string.
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self)
            .map_err(|e| SyncError::InvalidLock(format!("failed to serialize lock record: {}", e)))
    }

    /// Acquisition time in the wire format, or `unknown`.
    pub fn since(&self) -> String {
        match &self.timestamp {
            LockTime::At(at) => timestamp::format(at),
            LockTime::Unparsed(raw) => raw.clone(),
            LockTime::Missing => "unknown".to_string(),
        }
    }

    /// Calculate the age of the lock, if its acquisition time is known.
    pub fn age(&self) -> Option<Duration> {
        match &self.timestamp {
            LockTime::At(at) => Some(Utc::now().signed_duration_since(*at)),
            LockTime::Unparsed(_) | LockTime::Missing => None,
        }
    }

    /// Format the age as a human-readable string.
    pub fn age_string(&self) -> Option<String> {
        let age = self.age()?;
        let minutes = age.num_minutes().max(0);
        let hours = age.num_hours().max(0);
        let days = age.num_days().max(0);

        Some(if days > 0 {
            format!("{}d {}h", days, hours % 24)
        } else if hours > 0 {
            format!("{}h {}m", hours, minutes % 60)
        } else {
            format!("{}m", minutes)
        })
    }
}

fn unknown_hostname() -> String {
    "unknown".to_string()
}

/// Hostname of this machine, or `unknown` if it cannot be read.
pub fn local_hostname() -> String {
    hostname::get()
        .map(|h| h.to_string_lossy().to_string())
        .unwrap_or_else(|_| unknown_hostname())
}

/// ISO-8601 timestamps: written as UTC with a `Z` suffix, read either with an
/// offset or as a naive UTC time. Anything else is kept as written.
mod timestamp {
    use super::LockTime;
    use chrono::{DateTime, NaiveDateTime, SecondsFormat, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    pub(super) fn format(value: &DateTime<Utc>) -> String {
        value.to_rfc3339_opts(SecondsFormat::AutoSi, true)
    }

    pub(super) fn serialize<S: Serializer>(value: &LockTime, s: S) -> Result<S::Ok, S::Error> {
        match value {
            LockTime::At(at) => s.serialize_str(&format(at)),
            LockTime::Unparsed(raw) => s.serialize_str(raw),
            LockTime::Missing => s.serialize_none(),
        }
    }

    pub(super) fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<LockTime, D::Error> {
        let value = serde_json::Value::deserialize(d)?;
        Ok(match value {
            serde_json::Value::Null => LockTime::Missing,
            serde_json::Value::String(raw) => match parse(&raw) {
                Some(at) => LockTime::At(at),
                None => LockTime::Unparsed(raw),
            },
            other => LockTime::Unparsed(other.to_string()),
        })
    }

    pub(crate) fn parse(raw: &str) -> Option<DateTime<Utc>> {
        if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
            return Some(dt.with_timezone(&Utc));
        }
        NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
            .ok()
            .map(|naive| naive.and_utc())
    }
}

#[cfg(test)]
pub(super) use timestamp::parse as parse_timestamp;
