//! Wire timestamps.
//!
//! The API sends instants either as RFC3339 strings or as bare integers.
//! Integers are Unix seconds unless that reading lands after year 3000, in
//! which case the same integer is read as Unix milliseconds.

use std::fmt;

use chrono::{DateTime, Datelike, FixedOffset, SecondsFormat, Utc};
use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Last calendar year an integer is still read as seconds.
const MAX_SECONDS_YEAR: i32 = 3000;

/// A timezone-aware instant. Equality and ordering compare instants only,
/// so `12:00Z` equals `14:00+02:00`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Timestamp(DateTime<FixedOffset>);

impl Timestamp {
    pub fn now() -> Self {
        Self(Utc::now().fixed_offset())
    }

    /// Interpret an integer as Unix seconds, falling back to milliseconds.
    pub fn from_unix(value: i64) -> Option<Self> {
        match DateTime::from_timestamp(value, 0) {
            Some(dt) if dt.year() <= MAX_SECONDS_YEAR => Some(Self(dt.fixed_offset())),
            _ => DateTime::from_timestamp_millis(value).map(|dt| Self(dt.fixed_offset())),
        }
    }

    pub fn parse_rfc3339(s: &str) -> Result<Self, chrono::ParseError> {
        DateTime::parse_from_rfc3339(s).map(Self)
    }

    pub fn as_datetime(&self) -> &DateTime<FixedOffset> {
        &self.0
    }

    pub fn to_utc(&self) -> DateTime<Utc> {
        self.0.with_timezone(&Utc)
    }

    pub fn unix_seconds(&self) -> i64 {
        self.0.timestamp()
    }

    /// `None` when the result falls outside the representable range.
    pub(crate) fn plus_seconds(&self, seconds: i64) -> Option<Self> {
        let delta = chrono::TimeDelta::try_seconds(seconds)?;
        self.0.checked_add_signed(delta).map(Self)
    }
}

impl From<DateTime<Utc>> for Timestamp {
    fn from(dt: DateTime<Utc>) -> Self {
        Self(dt.fixed_offset())
    }
}

impl From<DateTime<FixedOffset>> for Timestamp {
    fn from(dt: DateTime<FixedOffset>) -> Self {
        Self(dt)
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0.to_rfc3339_opts(SecondsFormat::AutoSi, true))
    }
}

impl Serialize for Timestamp {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Timestamp {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(TimestampVisitor)
    }
}

struct TimestampVisitor;

impl<'de> Visitor<'de> for TimestampVisitor {
    type Value = Timestamp;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("an integer Unix timestamp or an RFC3339 string")
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<Timestamp, E> {
        Timestamp::from_unix(v).ok_or_else(|| E::custom(format!("timestamp {v} is out of range")))
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<Timestamp, E> {
        let v = i64::try_from(v).map_err(|_| E::custom(format!("timestamp {v} is out of range")))?;
        self.visit_i64(v)
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Timestamp, E> {
        Timestamp::parse_rfc3339(v).map_err(|e| E::custom(format!("invalid RFC3339 timestamp {v:?}: {e}")))
    }
}
