//! Bar timestamps and their mapping onto the canonical UTC calendar.
//!
//! Sources deliver daily bars stamped in one of three shapes: a bare calendar
//! date, a naive date-time, or an offset-aware date-time. Naive values are taken
//! to be UTC; aware values are converted to UTC before the calendar day is read.

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, Utc};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BarTimestamp {
    Date(NaiveDate),
    Naive(NaiveDateTime),
    Aware(DateTime<FixedOffset>),
}

impl BarTimestamp {
    pub fn to_utc(&self) -> DateTime<Utc> {
        match self {
            BarTimestamp::Date(d) => midnight_utc(*d),
            BarTimestamp::Naive(dt) => dt.and_utc(),
            BarTimestamp::Aware(dt) => dt.with_timezone(&Utc),
        }
    }

    /// Calendar day of this timestamp on the UTC calendar.
    pub fn utc_date(&self) -> NaiveDate {
        self.to_utc().date_naive()
    }
}

impl From<NaiveDate> for BarTimestamp {
    fn from(date: NaiveDate) -> Self {
        BarTimestamp::Date(date)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unrecognised timestamp: {0:?}")]
pub struct TimestampParseError(pub String);

impl FromStr for BarTimestamp {
    type Err = TimestampParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if let Ok(d) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
            return Ok(BarTimestamp::Date(d));
        }
        if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
            return Ok(BarTimestamp::Aware(dt));
        }
        for fmt in ["%Y-%m-%d %H:%M:%S%:z", "%Y-%m-%d %H:%M:%S%z"] {
            if let Ok(dt) = DateTime::parse_from_str(s, fmt) {
                return Ok(BarTimestamp::Aware(dt));
            }
        }
        for fmt in ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M"] {
            if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
                return Ok(BarTimestamp::Naive(dt));
            }
        }
        Err(TimestampParseError(s.to_string()))
    }
}

impl fmt::Display for BarTimestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BarTimestamp::Date(d) => write!(f, "{}", d.format("%Y-%m-%d")),
            BarTimestamp::Naive(dt) => write!(f, "{}", dt.format("%Y-%m-%d %H:%M:%S")),
            BarTimestamp::Aware(dt) => write!(f, "{}", dt.to_rfc3339()),
        }
    }
}

/// Midnight UTC at the start of `date`.
pub fn midnight_utc(date: NaiveDate) -> DateTime<Utc> {
    date.and_hms_opt(0, 0, 0)
        .unwrap_or_default()
        .and_utc()
}
