//! Period tokens ("1d", "6m", "1y", ...) and their lookback start instants.
//!
//! Offsets are fixed day counts, not calendar-month aware. Unknown tokens fall
//! back to one day.

use crate::domain::timestamp::midnight_utc;
use chrono::{DateTime, Duration, NaiveDate, Utc};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Period {
    OneDay,
    OneWeek,
    SevenDays,
    OneMonth,
    ThreeMonths,
    SixMonths,
    OneYear,
    TwoYears,
    ThreeYears,
    FourYears,
    FiveYears,
}

impl Period {
    /// Case-insensitive lookup of a recognised token.
    pub fn from_token(token: &str) -> Option<Period> {
        let period = match token.trim().to_lowercase().as_str() {
            "1d" => Period::OneDay,
            "1w" => Period::OneWeek,
            "7d" => Period::SevenDays,
            "1m" => Period::OneMonth,
            "3m" => Period::ThreeMonths,
            "6m" => Period::SixMonths,
            "1y" => Period::OneYear,
            "2y" => Period::TwoYears,
            "3y" => Period::ThreeYears,
            "4y" => Period::FourYears,
            "5y" => Period::FiveYears,
            _ => return None,
        };
        Some(period)
    }

    /// Like [`Period::from_token`], but unknown tokens mean one day.
    pub fn parse(token: &str) -> Period {
        Period::from_token(token).unwrap_or(Period::OneDay)
    }

    pub fn days(self) -> i64 {
        match self {
            Period::OneDay => 1,
            Period::OneWeek | Period::SevenDays => 7,
            Period::OneMonth => 30,
            Period::ThreeMonths => 91,
            Period::SixMonths => 182,
            Period::OneYear => 365,
            Period::TwoYears => 365 * 2,
            Period::ThreeYears => 365 * 3,
            Period::FourYears => 365 * 4,
            Period::FiveYears => 365 * 5,
        }
    }

    pub fn token(self) -> &'static str {
        match self {
            Period::OneDay => "1d",
            Period::OneWeek => "1w",
            Period::SevenDays => "7d",
            Period::OneMonth => "1m",
            Period::ThreeMonths => "3m",
            Period::SixMonths => "6m",
            Period::OneYear => "1y",
            Period::TwoYears => "2y",
            Period::ThreeYears => "3y",
            Period::FourYears => "4y",
            Period::FiveYears => "5y",
        }
    }

    pub fn start_from(self, reference: DateTime<Utc>) -> DateTime<Utc> {
        reference - Duration::days(self.days())
    }

    /// Start instant measured back from midnight UTC of `date`.
    pub fn start_from_date(self, date: NaiveDate) -> DateTime<Utc> {
        self.start_from(midnight_utc(date))
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.token())
    }
}

/// Resolves `token` against `reference` (now, when `None`).
pub fn start_date_from_period(token: &str, reference: Option<DateTime<Utc>>) -> DateTime<Utc> {
    Period::parse(token).start_from(reference.unwrap_or_else(Utc::now))
}
