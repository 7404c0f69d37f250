//! Price performance analytics: period change, cumulative return, drawdown.
//!
//! Every window here is measured back from a reference instant with
//! [`Period`]; a dated point belongs to a window when midnight UTC of its date
//! is at or after the window start.

use crate::domain::ohlcv::PricePoint;
use crate::domain::period::Period;
use crate::domain::timestamp::midnight_utc;
use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;

/// Parallel date/value arrays, always the same length.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct History {
    pub dates: Vec<NaiveDate>,
    pub values: Vec<f64>,
}

impl History {
    /// Pairs `dates` with `values`, or an empty history when the counts differ.
    pub fn aligned(dates: Vec<NaiveDate>, values: Vec<f64>) -> Self {
        if dates.len() != values.len() {
            return Self::default();
        }
        Self { dates, values }
    }

    /// Values rounded to two decimals.
    pub fn from_points(points: &[PricePoint]) -> Self {
        Self {
            dates: points.iter().map(|p| p.date).collect(),
            values: points.iter().map(|p| round2(p.price)).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.dates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }
}

/// Two decimals, exact halves to even.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round_ties_even() / 100.0
}

pub fn in_window(date: NaiveDate, start: DateTime<Utc>) -> bool {
    midnight_utc(date) >= start
}

/// Points on or after `start`.
pub fn window(points: &[PricePoint], start: DateTime<Utc>) -> &[PricePoint] {
    let first = points.partition_point(|p| !in_window(p.date, start));
    &points[first..]
}

/// Percentage change from the price at the start of `period` to the latest price.
///
/// The window is anchored at the series' own latest date. The reference price is
/// the last point at or before the start, falling back to the earliest point.
/// Returns 0 when the change cannot be computed.
pub fn period_change(closes: &[PricePoint], period: Period) -> f64 {
    if closes.len() < 2 {
        return 0.0;
    }
    let Some(latest) = closes.last() else {
        return 0.0;
    };
    let start = period.start_from_date(latest.date);

    let historical = closes
        .iter()
        .rev()
        .find(|p| midnight_utc(p.date) <= start)
        .unwrap_or(&closes[0])
        .price;

    if historical == 0.0 || !historical.is_finite() || !latest.price.is_finite() {
        return 0.0;
    }
    (latest.price - historical) / historical * 100.0
}

/// Cumulative return (%) of every point in the trailing `period`, rebased to the
/// window's first price. Unrounded.
pub fn cumulative_return(closes: &[PricePoint], period: Period) -> Vec<PricePoint> {
    if closes.len() < 2 {
        return Vec::new();
    }
    let Some(latest) = closes.last() else {
        return Vec::new();
    };
    let in_period = window(closes, period.start_from_date(latest.date));
    let Some(first) = in_period.first() else {
        return Vec::new();
    };
    let base = first.price;

    in_period
        .iter()
        .map(|p| PricePoint {
            date: p.date,
            price: (p.price / base - 1.0) * 100.0,
        })
        .filter(|p| p.price.is_finite())
        .collect()
}

/// Decline (%) of the series' latest price from the highest price on or after
/// `start`.
///
/// The peak comes from the window but the latest price is always the series'
/// last point, even when that point falls outside the window.
pub fn drawdown_from_peak(closes: &[PricePoint], start: DateTime<Utc>) -> Option<f64> {
    let latest = closes.last()?.price;
    let in_period = window(closes, start);
    if in_period.is_empty() {
        return None;
    }
    let peak = in_period
        .iter()
        .map(|p| p.price)
        .fold(f64::NEG_INFINITY, f64::max);
    if peak == 0.0 || !peak.is_finite() {
        return None;
    }
    Some((latest - peak) / peak * 100.0)
}

/// Running-peak drawdown (%) of every point on or after `start`, rounded to two
/// decimals. Needs at least two points in the window.
pub fn drawdown_history(closes: &[PricePoint], start: DateTime<Utc>) -> History {
    let in_period = window(closes, start);
    if in_period.len() < 2 {
        return History::default();
    }

    let mut running_peak = f64::NEG_INFINITY;
    let mut dates = Vec::with_capacity(in_period.len());
    let mut values = Vec::with_capacity(in_period.len());

    for p in in_period {
        running_peak = running_peak.max(p.price);
        let dd = if running_peak == 0.0 {
            0.0
        } else {
            (p.price - running_peak) / running_peak * 100.0
        };
        dates.push(p.date);
        if dd.is_finite() {
            values.push(round2(dd));
        }
    }

    History::aligned(dates, values)
}

/// Asset minus benchmark change, when both are known.
pub fn relative_performance(asset_change: Option<f64>, benchmark_change: Option<f64>) -> Option<f64> {
    match (asset_change, benchmark_change) {
        (Some(a), Some(b)) => Some(a - b),
        _ => None,
    }
}
