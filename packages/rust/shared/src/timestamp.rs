//! `HH:MM:SS` timestamps and the offset arithmetic applied to list entries.
//!
//! Parsing is deliberately lenient about field ranges: `00:75:00` is accepted
//! and normalises to `01:15:00` when formatted. Only the shape (three
//! `:`-separated digit runs) is enforced.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{ClipBatchError, Result};

const SECS_PER_MINUTE: u64 = 60;
const SECS_PER_HOUR: u64 = 3600;

/// A non-negative point or span of time with one-second resolution.
///
/// Stored as a total second count, so two timestamps that format the same
/// compare equal regardless of how they were written in the list file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Timestamp {
    total_secs: u64,
}

impl Timestamp {
    /// `00:00:00`.
    pub const ZERO: Timestamp = Timestamp { total_secs: 0 };

    /// Build a timestamp from a total number of seconds.
    pub const fn from_secs(total_secs: u64) -> Self {
        Self { total_secs }
    }

    /// Total length in seconds.
    pub const fn as_secs(&self) -> u64 {
        self.total_secs
    }

    pub const fn hours(&self) -> u64 {
        self.total_secs / SECS_PER_HOUR
    }

    pub const fn minutes(&self) -> u64 {
        (self.total_secs % SECS_PER_HOUR) / SECS_PER_MINUTE
    }

    pub const fn seconds(&self) -> u64 {
        self.total_secs % SECS_PER_MINUTE
    }

    /// Advance by `seconds`, carrying into minutes and hours. Hours grow
    /// without wrapping at 24.
    pub fn add(self, seconds: u64) -> Self {
        Self::from_secs(self.total_secs.saturating_add(seconds))
    }

    /// Move back by `seconds`. Clamps at [`Timestamp::ZERO`] instead of
    /// going negative.
    pub fn subtract(self, seconds: u64) -> Self {
        Self::from_secs(self.total_secs.saturating_sub(seconds))
    }

    /// Parse `H:M:S` where each field is any run of ASCII digits.
    pub fn parse(s: &str) -> Result<Self> {
        let mut fields = s.split(':');
        let (Some(h), Some(m), Some(sec), None) =
            (fields.next(), fields.next(), fields.next(), fields.next())
        else {
            return Err(ClipBatchError::timestamp(s, "expected three ':'-separated fields"));
        };

        let hours = parse_field(s, h)?;
        let minutes = parse_field(s, m)?;
        let seconds = parse_field(s, sec)?;

        hours
            .checked_mul(SECS_PER_HOUR)
            .and_then(|h| minutes.checked_mul(SECS_PER_MINUTE).and_then(|m| h.checked_add(m)))
            .and_then(|hm| hm.checked_add(seconds))
            .map(Self::from_secs)
            .ok_or_else(|| ClipBatchError::timestamp(s, "value out of range"))
    }
}

fn parse_field(input: &str, field: &str) -> Result<u64> {
    if field.is_empty() || !field.bytes().all(|b| b.is_ascii_digit()) {
        return Err(ClipBatchError::timestamp(input, "fields must be non-negative integers"));
    }
    field
        .parse::<u64>()
        .map_err(|_| ClipBatchError::timestamp(input, "value out of range"))
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}:{:02}", self.hours(), self.minutes(), self.seconds())
    }
}

impl FromStr for Timestamp {
    type Err = ClipBatchError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Serialize for Timestamp {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Timestamp {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::parse(&s).map_err(serde::de::Error::custom)
    }
}
