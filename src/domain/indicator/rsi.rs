//! RSI (Relative Strength Index) indicator implementation.
//!
//! Gains and losses are smoothed with an exponential average of α = 1/n
//! (Wilder's smoothing, centre of mass n-1), seeded with the first change.
//! The first bar has no change and counts as zero gain and zero loss.
//!
//! Formula: RSI = 100 - (100 / (1 + avg_gain / avg_loss))
//! If avg_loss == 0 and avg_gain > 0: RSI = 100
//! If both averages are zero (no movement yet): RSI = 50

use crate::domain::indicator::ema::exponential_average;
use crate::domain::indicator::{IndicatorPoint, IndicatorSeries, IndicatorType};
use crate::domain::ohlcv::PricePoint;

pub const NEUTRAL_RSI: f64 = 50.0;

pub fn calculate_rsi(closes: &[PricePoint], period: usize) -> IndicatorSeries {
    if period == 0 || closes.is_empty() {
        return IndicatorSeries {
            indicator_type: IndicatorType::Rsi(period),
            values: Vec::new(),
        };
    }

    let mut gains = Vec::with_capacity(closes.len());
    let mut losses = Vec::with_capacity(closes.len());
    gains.push(0.0);
    losses.push(0.0);
    for w in closes.windows(2) {
        let change = w[1].price - w[0].price;
        gains.push(if change > 0.0 { change } else { 0.0 });
        losses.push(if change < 0.0 { -change } else { 0.0 });
    }

    let alpha = 1.0 / period as f64;
    let avg_gains = exponential_average(&gains, alpha);
    let avg_losses = exponential_average(&losses, alpha);

    let values = closes
        .iter()
        .zip(avg_gains.iter().zip(avg_losses.iter()))
        .map(|(p, (&avg_gain, &avg_loss))| IndicatorPoint {
            date: p.date,
            value: rsi_from_averages(avg_gain, avg_loss),
        })
        .collect();

    IndicatorSeries {
        indicator_type: IndicatorType::Rsi(period),
        values,
    }
}

fn rsi_from_averages(avg_gain: f64, avg_loss: f64) -> f64 {
    let rsi = if avg_loss == 0.0 {
        if avg_gain > 0.0 { 100.0 } else { NEUTRAL_RSI }
    } else {
        100.0 - (100.0 / (1.0 + avg_gain / avg_loss))
    };
    if rsi.is_finite() { rsi } else { NEUTRAL_RSI }
}
