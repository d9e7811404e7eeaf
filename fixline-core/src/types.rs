/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 27/1/26
******************************************************************************/

//! Core types for FIX session handling.
//!
//! - [`SeqNum`]: Outbound sequence number wrapper
//! - [`Timestamp`]: SendingTime values in FIX UTC format
//! - [`CompId`]: Component identifier (SenderCompID, TargetCompID)

use arrayvec::ArrayString;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Maximum length for CompID strings in bytes.
pub const COMP_ID_MAX_LEN: usize = 32;

/// FIX message sequence number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[repr(transparent)]
#[serde(transparent)]
pub struct SeqNum(u64);

impl SeqNum {
    /// Creates a new sequence number.
    #[inline]
    #[must_use]
    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    /// Returns the raw sequence number value.
    #[inline]
    #[must_use]
    pub const fn value(self) -> u64 {
        self.0
    }

    /// Returns the next sequence number.
    #[inline]
    #[must_use]
    pub const fn next(self) -> Self {
        Self(self.0 + 1)
    }
}

impl Default for SeqNum {
    fn default() -> Self {
        Self(1)
    }
}

impl From<u64> for SeqNum {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

impl fmt::Display for SeqNum {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// UTC timestamp rendered in FIX `UTCTimestamp` format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Timestamp(DateTime<Utc>);

impl Timestamp {
    /// Returns the current UTC timestamp.
    #[inline]
    #[must_use]
    pub fn now() -> Self {
        Self(Utc::now())
    }

    /// Formats the timestamp with millisecond precision.
    ///
    /// Format: `YYYYMMDD-HH:MM:SS.sss`
    #[must_use]
    pub fn format_millis(self) -> ArrayString<21> {
        let mut buf = ArrayString::new();
        let _ = std::fmt::write(
            &mut buf,
            format_args!("{}", self.0.format("%Y%m%d-%H:%M:%S%.3f")),
        );
        buf
    }
}

impl From<DateTime<Utc>> for Timestamp {
    fn from(dt: DateTime<Utc>) -> Self {
        Self(dt)
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.format_millis())
    }
}

/// Component identifier for FIX sessions.
///
/// Used for SenderCompID (tag 49) and TargetCompID (tag 56). Limited to
/// 32 bytes and never empty.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[repr(transparent)]
#[serde(transparent)]
pub struct CompId(ArrayString<COMP_ID_MAX_LEN>);

impl CompId {
    /// Creates a new CompId, or `None` if `s` is empty or too long.
    #[must_use]
    pub fn new(s: &str) -> Option<Self> {
        if s.is_empty() {
            return None;
        }
        ArrayString::from(s).ok().map(Self)
    }

    /// Returns the CompId as a string slice.
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl AsRef<str> for CompId {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl fmt::Display for CompId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A CompID string that is empty or longer than [`COMP_ID_MAX_LEN`] bytes.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
#[error("comp id must be 1 to {COMP_ID_MAX_LEN} bytes, got {len}")]
pub struct InvalidCompId {
    /// Length of the rejected value in bytes.
    pub len: usize,
}

impl FromStr for CompId {
    type Err = InvalidCompId;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s).ok_or(InvalidCompId { len: s.len() })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_seq_num() {
        let seq = SeqNum::default();
        assert_eq!(seq.value(), 1);
        assert_eq!(seq.next().value(), 2);
        assert_eq!(SeqNum::from(42).to_string(), "42");
    }

    #[test]
    fn test_timestamp_format() {
        let dt = Utc.with_ymd_and_hms(2026, 1, 27, 9, 30, 5).unwrap();
        let ts = Timestamp::from(dt);
        assert_eq!(ts.format_millis().as_str(), "20260127-09:30:05.000");
    }

    #[test]
    fn test_comp_id() {
        let id = CompId::new("CLIENT").unwrap();
        assert_eq!(id.as_str(), "CLIENT");
        assert!(CompId::new("").is_none());
        assert!(CompId::new(&"X".repeat(33)).is_none());
        assert!("SERVER".parse::<CompId>().is_ok());
    }

    #[test]
    fn test_comp_id_parse_error() {
        assert_eq!("".parse::<CompId>(), Err(InvalidCompId { len: 0 }));
        let err = "X".repeat(33).parse::<CompId>().unwrap_err();
        assert_eq!(err, InvalidCompId { len: 33 });
        assert_eq!(err.to_string(), "comp id must be 1 to 32 bytes, got 33");
    }
}
