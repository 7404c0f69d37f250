//! Last-crossover detection between two moving averages on a shared calendar.

use chrono::NaiveDate;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CrossDirection {
    /// Short moves strictly above long from at-or-below.
    Bullish,
    /// Short moves strictly below long from at-or-above.
    Bearish,
}

/// Latest date at which `short` crossed `long` in `direction`.
///
/// Both slices are indexed by the same dates. Dates where either side is
/// undefined are dropped before comparing neighbours; fewer than two remaining
/// dates means no crossover.
pub fn last_crossover(
    dates: &[NaiveDate],
    short: &[Option<f64>],
    long: &[Option<f64>],
    direction: CrossDirection,
) -> Option<NaiveDate> {
    let paired: Vec<(NaiveDate, f64, f64)> = dates
        .iter()
        .zip(short.iter().zip(long.iter()))
        .filter_map(|(&d, (s, l))| match (s, l) {
            (Some(s), Some(l)) if s.is_finite() && l.is_finite() => Some((d, *s, *l)),
            _ => None,
        })
        .collect();

    if paired.len() < 2 {
        return None;
    }

    paired
        .windows(2)
        .rev()
        .find(|w| {
            let (_, prev_s, prev_l) = w[0];
            let (_, s, l) = w[1];
            match direction {
                CrossDirection::Bullish => s > l && prev_s <= prev_l,
                CrossDirection::Bearish => s < l && prev_s >= prev_l,
            }
        })
        .map(|w| w[1].0)
}

pub fn last_bullish_crossover(
    dates: &[NaiveDate],
    short: &[Option<f64>],
    long: &[Option<f64>],
) -> Option<NaiveDate> {
    last_crossover(dates, short, long, CrossDirection::Bullish)
}

pub fn last_bearish_crossover(
    dates: &[NaiveDate],
    short: &[Option<f64>],
    long: &[Option<f64>],
) -> Option<NaiveDate> {
    last_crossover(dates, short, long, CrossDirection::Bearish)
}
